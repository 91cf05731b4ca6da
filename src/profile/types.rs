use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classifier::{Classification, ParameterType};
use crate::sampler::ParameterSample;

/// Identifies the plugin that exposes a set of parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerIdentity {
    /// Plugin name as reported by the host (e.g. "ReaComp")
    pub plugin_name: String,
    /// Plugin format (e.g. "VST3", "AU", "JS")
    pub plugin_format: String,
}

impl OwnerIdentity {
    pub fn new(plugin_name: impl Into<String>, plugin_format: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            plugin_format: plugin_format.into(),
        }
    }
}

impl fmt::Display for OwnerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.plugin_name, self.plugin_format)
    }
}

/// Identifies one parameter of one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterId {
    pub owner: OwnerIdentity,
    pub index: u32,
}

impl ParameterId {
    pub fn new(owner: OwnerIdentity, index: u32) -> Self {
        Self { owner, index }
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.owner, self.index)
    }
}

/// The stored result of analyzing one parameter.
///
/// Profiles are replaced as a whole when a parameter is re-analyzed; they
/// are never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterProfile {
    pub id: ParameterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_name: Option<String>,
    pub classification: Classification,
    /// Ordered by normalized value
    pub samples: Vec<ParameterSample>,
    /// Distinct formatted values in order of first appearance (enumerated only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub min_formatted: String,
    pub max_formatted: String,
    /// RFC 3339 time of analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<String>,
}

impl ParameterProfile {
    pub fn param_type(&self) -> ParameterType {
        self.classification.param_type
    }

    pub fn confidence(&self) -> f64 {
        self.classification.confidence
    }

    pub fn is_confident(&self, min_confidence: f64) -> bool {
        self.classification.is_confident(min_confidence)
    }

    /// Smallest and largest numeric sample values, if any sample is numeric.
    pub fn numeric_range(&self) -> Option<(f64, f64)> {
        self.samples
            .iter()
            .filter_map(|s| s.numeric())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
