pub mod analyzer;
pub mod cache;
pub mod classifier;
pub mod error;
pub mod mapper;
pub mod profile;
pub mod sampler;

pub use analyzer::{AnalysisReport, ParameterAnalyzer};
pub use cache::{MemoryProfileStore, ProfileCache, ProfileStore, SqliteProfileStore};
pub use classifier::{classify, Classification, ParameterType, ScalingType};
pub use error::{ParamScopeError, Result};
pub use mapper::ValueMapper;
pub use profile::{OwnerIdentity, ParameterId, ParameterProfile, ParameterSample};
pub use sampler::{sample_parameter, CancelToken, FormattedValueSource, SamplePlan};

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if the host already installed a global subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
