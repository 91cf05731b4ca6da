use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamScopeError {
    #[error("Invalid sample points: {0}")]
    InvalidSamplePoints(String),

    #[error("Sampling aborted after {completed} of {total} points")]
    Aborted { completed: usize, total: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ParamScopeError {
    /// Store failures may succeed on retry; every other kind is terminal for the call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ParamScopeError::Storage(_))
    }
}

impl From<rusqlite::Error> for ParamScopeError {
    fn from(err: rusqlite::Error) -> Self {
        ParamScopeError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ParamScopeError {
    fn from(err: serde_json::Error) -> Self {
        ParamScopeError::Serialization(err.to_string())
    }
}

impl From<ParamScopeError> for String {
    fn from(err: ParamScopeError) -> Self {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, ParamScopeError>;
