//! Tunable heuristic thresholds.
//!
//! Provides two loading methods:
//! - `default_thresholds()` - Loads the embedded defaults compiled into the binary
//! - `load_thresholds(path)` - Loads overrides from a TOML file
//!
//! Every key is optional in a TOML file; missing keys fall back to the
//! constants below.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Maximum distinct formatted values for a binary parameter.
pub const BINARY_MAX_DISTINCT: usize = 2;
pub const BINARY_CONFIDENCE: f64 = 0.95;
/// Maximum distinct formatted values for an enumerated parameter.
pub const ENUM_MAX_DISTINCT: usize = 10;
pub const ENUM_CONFIDENCE: f64 = 0.90;
/// Confidence assigned when only a unit substring identifies the scaling.
pub const UNIT_HINT_CONFIDENCE: f64 = 0.70;

/// A scaling candidate must score strictly above this to be reported.
pub const MIN_SCALING_CONFIDENCE: f64 = 0.5;
pub const LINEAR_MIN_SAMPLES: usize = 3;
pub const LINEAR_MIN_PAIRS: usize = 2;
/// Keeps the rate-variance ratio finite when the mean rate is near zero.
pub const LINEAR_EPSILON: f64 = 0.0001;
pub const CURVE_MIN_NUMERIC: usize = 4;
pub const FIRST_QUARTER: f64 = 0.25;
pub const LAST_QUARTER: f64 = 0.75;
/// Share of the total change a quarter must exceed to suggest curvature.
pub const QUARTER_SHARE_CUTOFF: f64 = 0.4;
pub const QUARTER_SHARE_SCALE: f64 = 2.0;
/// Ceiling for every curvature and inversion score.
pub const CONFIDENCE_CAP: f64 = 0.9;

/// Default minimum confidence for consumers that only want trusted profiles.
pub const MIN_TRUSTED_CONFIDENCE: f64 = 0.75;
pub const MAX_STEP_POINTS: usize = 1024;

const DEFAULT_THRESHOLDS: &str = include_str!("../../config/thresholds.toml");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default, rename = "type")]
    pub types: TypeThresholds,
    #[serde(default)]
    pub scaling: ScalingThresholds,
    #[serde(default)]
    pub profile: ProfileThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeThresholds {
    pub binary_max_distinct: usize,
    pub binary_confidence: f64,
    pub enum_max_distinct: usize,
    pub enum_confidence: f64,
    pub unit_hint_confidence: f64,
}

impl Default for TypeThresholds {
    fn default() -> Self {
        Self {
            binary_max_distinct: BINARY_MAX_DISTINCT,
            binary_confidence: BINARY_CONFIDENCE,
            enum_max_distinct: ENUM_MAX_DISTINCT,
            enum_confidence: ENUM_CONFIDENCE,
            unit_hint_confidence: UNIT_HINT_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingThresholds {
    pub min_confidence: f64,
    pub linear_min_samples: usize,
    pub linear_min_pairs: usize,
    pub linear_epsilon: f64,
    pub curve_min_numeric: usize,
    pub first_quarter: f64,
    pub last_quarter: f64,
    pub quarter_share_cutoff: f64,
    pub quarter_share_scale: f64,
    pub confidence_cap: f64,
}

impl Default for ScalingThresholds {
    fn default() -> Self {
        Self {
            min_confidence: MIN_SCALING_CONFIDENCE,
            linear_min_samples: LINEAR_MIN_SAMPLES,
            linear_min_pairs: LINEAR_MIN_PAIRS,
            linear_epsilon: LINEAR_EPSILON,
            curve_min_numeric: CURVE_MIN_NUMERIC,
            first_quarter: FIRST_QUARTER,
            last_quarter: LAST_QUARTER,
            quarter_share_cutoff: QUARTER_SHARE_CUTOFF,
            quarter_share_scale: QUARTER_SHARE_SCALE,
            confidence_cap: CONFIDENCE_CAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileThresholds {
    pub min_trusted_confidence: f64,
    pub max_step_points: usize,
}

impl Default for ProfileThresholds {
    fn default() -> Self {
        Self {
            min_trusted_confidence: MIN_TRUSTED_CONFIDENCE,
            max_step_points: MAX_STEP_POINTS,
        }
    }
}

/// Parse thresholds from TOML text.
pub fn parse_thresholds(content: &str) -> Result<Thresholds> {
    let thresholds: Thresholds = toml::from_str(content).context("invalid thresholds TOML")?;
    Ok(thresholds)
}

/// Load thresholds from a TOML file at the given path.
///
/// # Example
/// ```ignore
/// let thresholds = load_thresholds(Path::new("/path/to/thresholds.toml"))?;
/// ```
pub fn load_thresholds(path: &Path) -> Result<Thresholds> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read thresholds from {:?}", path))?;
    parse_thresholds(&content)
}

/// Get the default thresholds embedded in the binary.
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a compile-time bug).
pub fn default_thresholds() -> Thresholds {
    parse_thresholds(DEFAULT_THRESHOLDS).expect("embedded thresholds.toml must be valid TOML")
}
