//! Type definitions for parameter classification.
//!
//! Serialized spellings (`"BINARY"`, `"LOGARITHMIC"`, ...) are the labels
//! stored in the profile database and shown in analysis reports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterType {
    /// Two distinct formatted values (e.g. Off/On)
    Binary,
    /// A small set of named choices
    Enumerated,
    /// A numeric range
    Continuous,
    Unknown,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::Binary => "BINARY",
            ParameterType::Enumerated => "ENUMERATED",
            ParameterType::Continuous => "CONTINUOUS",
            ParameterType::Unknown => "UNKNOWN",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "BINARY" => ParameterType::Binary,
            "ENUMERATED" => ParameterType::Enumerated,
            "CONTINUOUS" => ParameterType::Continuous,
            _ => ParameterType::Unknown,
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the normalized -> numeric relationship of a continuous parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalingType {
    Linear,
    Logarithmic,
    Exponential,
    /// Numeric value falls as the normalized value rises
    Inverted,
    Unknown,
}

impl ScalingType {
    /// Tie-break order used when candidates score equally.
    pub const PRIORITY: [ScalingType; 4] = [
        ScalingType::Linear,
        ScalingType::Logarithmic,
        ScalingType::Exponential,
        ScalingType::Inverted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingType::Linear => "LINEAR",
            ScalingType::Logarithmic => "LOGARITHMIC",
            ScalingType::Exponential => "EXPONENTIAL",
            ScalingType::Inverted => "INVERTED",
            ScalingType::Unknown => "UNKNOWN",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "LINEAR" => ScalingType::Linear,
            "LOGARITHMIC" => ScalingType::Logarithmic,
            "EXPONENTIAL" => ScalingType::Exponential,
            "INVERTED" => ScalingType::Inverted,
            _ => ScalingType::Unknown,
        }
    }
}

impl fmt::Display for ScalingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a sampled parameter.
///
/// `confidence` is a calibrated score, not a probability. Values below 0.5
/// mean the classification should not be relied on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub param_type: ParameterType,
    /// Present only for continuous parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<ScalingType>,
    pub confidence: f64,
}

impl Classification {
    pub fn unknown() -> Self {
        Self {
            param_type: ParameterType::Unknown,
            scaling: None,
            confidence: 0.0,
        }
    }

    pub fn binary(confidence: f64) -> Self {
        Self {
            param_type: ParameterType::Binary,
            scaling: None,
            confidence,
        }
    }

    pub fn enumerated(confidence: f64) -> Self {
        Self {
            param_type: ParameterType::Enumerated,
            scaling: None,
            confidence,
        }
    }

    pub fn continuous(scaling: ScalingType, confidence: f64) -> Self {
        Self {
            param_type: ParameterType::Continuous,
            scaling: Some(scaling),
            confidence,
        }
    }

    /// Flat label: the scaling for continuous parameters, the type otherwise.
    pub fn label(&self) -> &'static str {
        match (self.param_type, self.scaling) {
            (ParameterType::Continuous, Some(scaling)) => scaling.as_str(),
            (param_type, _) => param_type.as_str(),
        }
    }

    pub fn is_confident(&self, min_confidence: f64) -> bool {
        self.confidence >= min_confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_type_serde() {
        let json = serde_json::to_string(&ParameterType::Enumerated).unwrap();
        assert_eq!(json, "\"ENUMERATED\"");
        let back: ParameterType = serde_json::from_str("\"BINARY\"").unwrap();
        assert_eq!(back, ParameterType::Binary);
    }

    #[test]
    fn test_scaling_from_str() {
        assert_eq!(ScalingType::from_str("logarithmic"), ScalingType::Logarithmic);
        assert_eq!(ScalingType::from_str(" INVERTED "), ScalingType::Inverted);
        assert_eq!(ScalingType::from_str("sigmoid"), ScalingType::Unknown);
        assert_eq!(ParameterType::from_str("continuous"), ParameterType::Continuous);
    }

    #[test]
    fn test_classification_label() {
        assert_eq!(Classification::binary(0.95).label(), "BINARY");
        assert_eq!(
            Classification::continuous(ScalingType::Logarithmic, 0.7).label(),
            "LOGARITHMIC"
        );
        assert_eq!(Classification::unknown().label(), "UNKNOWN");
    }

    #[test]
    fn test_classification_omits_missing_scaling() {
        let json = serde_json::to_string(&Classification::enumerated(0.9)).unwrap();
        assert!(!json.contains("scaling"));

        let back: Classification =
            serde_json::from_str(r#"{"param_type":"CONTINUOUS","scaling":"LINEAR","confidence":0.93}"#)
                .unwrap();
        assert_eq!(back, Classification::continuous(ScalingType::Linear, 0.93));
    }
}
