//! Parameter type classification from sampled formatted values.
//!
//! # Architecture
//!
//! - **Cardinality first**: binary and enumerated checks only count distinct
//!   formatted strings, so they run before any numeric analysis
//! - **Scaling**: majority-numeric parameters are continuous; their shape
//!   comes from the [`ScalingAnalyzer`]
//! - **Unit hints**: when numeric evidence is too thin, unit substrings in
//!   the formatted text decide the scaling
//!
//! Classification is a pure function of the sample array and never fails.
//!
//! # Example
//!
//! ```ignore
//! use paramscope::classifier::{Classifier, ParameterType};
//!
//! let classification = Classifier::default().classify(&samples);
//! if classification.param_type == ParameterType::Continuous {
//!     println!("{} ({:.2})", classification.label(), classification.confidence);
//! }
//! ```

pub mod scaling;
pub mod thresholds;
mod types;

use std::collections::HashSet;

use tracing::debug;

use crate::sampler::ParameterSample;

pub use scaling::{analyze_scaling, ScalingAnalyzer, ScalingResult, ScalingScores};
pub use thresholds::{default_thresholds, load_thresholds, Thresholds};
pub use types::*;

/// Classifies sample arrays into binary, enumerated or continuous parameters.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    thresholds: Thresholds,
}

impl Classifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Classify a parameter from its samples.
    ///
    /// Checks run in a fixed order and the first match wins:
    /// binary, enumerated, continuous, unit hint, unknown.
    pub fn classify(&self, samples: &[ParameterSample]) -> Classification {
        let t = &self.thresholds.types;
        if samples.is_empty() {
            return Classification::unknown();
        }

        // Gaps carry no value, so they do not count as a distinct value
        let distinct: HashSet<&str> = samples
            .iter()
            .filter(|s| !s.is_gap())
            .map(|s| s.formatted_value.as_str())
            .collect();
        if distinct.is_empty() {
            debug!("All {} samples are empty, classification unknown", samples.len());
            return Classification::unknown();
        }

        if distinct.len() <= t.binary_max_distinct {
            return Classification::binary(t.binary_confidence);
        }

        if distinct.len() <= t.enum_max_distinct && distinct.len() < samples.len() / 2 {
            return Classification::enumerated(t.enum_confidence);
        }

        let numeric = samples.iter().filter(|s| s.is_numeric).count();
        if numeric > samples.len() / 2 {
            let result = ScalingAnalyzer::new(self.thresholds.scaling.clone()).analyze(samples);
            if result.scaling != ScalingType::Unknown {
                return Classification::continuous(result.scaling, result.confidence);
            }
            if let Some(scaling) = unit_hint(samples) {
                return Classification::continuous(scaling, t.unit_hint_confidence);
            }
            debug!(
                "{} of {} samples numeric but no scaling fits",
                numeric,
                samples.len()
            );
            return Classification::continuous(ScalingType::Unknown, result.confidence);
        }

        if let Some(scaling) = unit_hint(samples) {
            return Classification::continuous(scaling, t.unit_hint_confidence);
        }

        Classification::unknown()
    }
}

/// Classify with the default thresholds.
pub fn classify(samples: &[ParameterSample]) -> Classification {
    Classifier::default().classify(samples)
}

/// Guess scaling from unit substrings of the first non-empty formatted value.
fn unit_hint(samples: &[ParameterSample]) -> Option<ScalingType> {
    let text = samples.iter().find(|s| !s.is_gap())?.formatted_value.to_lowercase();

    // Frequency ("hz" also matches "khz") and time units
    if ["hz", "ms", "sec"].iter().any(|unit| text.contains(unit)) {
        Some(ScalingType::Logarithmic)
    } else if text.contains("db") {
        Some(ScalingType::Linear)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::DEFAULT_SAMPLE_POINTS;

    fn samples_from(values: &[&str]) -> Vec<ParameterSample> {
        DEFAULT_SAMPLE_POINTS
            .iter()
            .zip(values)
            .map(|(&x, v)| {
                if v.is_empty() {
                    ParameterSample::gap(x)
                } else {
                    ParameterSample::capture(x, *v)
                }
            })
            .collect()
    }

    fn sweep(f: impl Fn(f64) -> String) -> Vec<ParameterSample> {
        DEFAULT_SAMPLE_POINTS
            .iter()
            .map(|&x| ParameterSample::capture(x, f(x)))
            .collect()
    }

    #[test]
    fn test_empty_samples_unknown() {
        assert_eq!(classify(&[]), Classification::unknown());
    }

    #[test]
    fn test_all_gaps_unknown() {
        let samples: Vec<_> = DEFAULT_SAMPLE_POINTS
            .iter()
            .map(|&x| ParameterSample::gap(x))
            .collect();
        assert_eq!(classify(&samples), Classification::unknown());
    }

    #[test]
    fn test_binary() {
        let samples = sweep(|x| if x < 0.5 { "Off".into() } else { "On".into() });
        let c = classify(&samples);
        assert_eq!(c.param_type, ParameterType::Binary);
        assert_eq!(c.confidence, 0.95);
        assert!(c.scaling.is_none());
    }

    #[test]
    fn test_binary_ignores_gaps() {
        let samples = samples_from(&[
            "Off", "Off", "", "Off", "Off", "Off", "Off", "On", "", "On", "On", "On", "On", "On",
            "On",
        ]);
        assert_eq!(classify(&samples).param_type, ParameterType::Binary);
    }

    #[test]
    fn test_enumerated() {
        let names = ["Sine", "Triangle", "Saw", "Square"];
        let samples = sweep(|x| names[((x * 3.999) as usize).min(3)].to_string());
        let c = classify(&samples);
        assert_eq!(c.param_type, ParameterType::Enumerated);
        assert_eq!(c.confidence, 0.90);
    }

    #[test]
    fn test_too_many_distinct_for_enum() {
        // 7 distinct values against 15 / 2 = 7 in integer division
        let samples = samples_from(&[
            "A", "A", "B", "B", "C", "C", "D", "D", "E", "E", "F", "F", "G", "G", "G",
        ]);
        assert_eq!(classify(&samples), Classification::unknown());
    }

    #[test]
    fn test_continuous_linear() {
        let c = classify(&sweep(|x| format!("{:.2} dB", x * 12.0)));
        assert_eq!(c.param_type, ParameterType::Continuous);
        assert_eq!(c.scaling, Some(ScalingType::Linear));
        assert!(c.confidence > 0.9);
    }

    #[test]
    fn test_continuous_without_shape_uses_unit_hint() {
        let values = [5.0, 1.0, 9.0, 2.0, 8.0, 3.0, 7.0, 4.0, 6.0, 2.5, 9.5, 1.5, 8.5, 3.5, 5.0];
        let samples = sweep(|x| {
            let i = DEFAULT_SAMPLE_POINTS.iter().position(|p| *p == x).unwrap();
            format!("{} ms", values[i])
        });
        assert_eq!(
            classify(&samples),
            Classification::continuous(ScalingType::Logarithmic, 0.7)
        );
    }

    #[test]
    fn test_continuous_without_shape_or_hint() {
        let values = [5.0, 1.0, 9.0, 2.0, 8.0, 3.0, 7.0, 4.0, 6.0, 2.5, 9.5, 1.5, 8.5, 3.5, 5.0];
        let samples = sweep(|x| {
            let i = DEFAULT_SAMPLE_POINTS.iter().position(|p| *p == x).unwrap();
            format!("{}", values[i])
        });
        let c = classify(&samples);
        assert_eq!(c.param_type, ParameterType::Continuous);
        assert_eq!(c.scaling, Some(ScalingType::Unknown));
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn test_unit_hint_fallback_for_sparse_numbers() {
        // Few labels: cardinality wins before any unit hint
        let samples = samples_from(&[
            "Lo Hz", "Lo Hz", "Lo Hz", "Mid Hz", "Mid Hz", "Hi Hz", "Hi Hz", "Hi Hz", "Air Hz",
            "Air Hz", "Air Hz", "20 kHz", "Max Hz", "Max Hz", "Max Hz",
        ]);
        assert_eq!(classify(&samples).param_type, ParameterType::Enumerated);

        // Many labels, none numeric
        let samples = samples_from(&[
            "a Hz", "b Hz", "c Hz", "d Hz", "e Hz", "f Hz", "g Hz", "h Hz", "i Hz", "j Hz",
            "k Hz", "l Hz", "m Hz", "n Hz", "o Hz",
        ]);
        assert_eq!(
            classify(&samples),
            Classification::continuous(ScalingType::Logarithmic, 0.7)
        );
    }

    #[test]
    fn test_unit_hint_db_is_linear() {
        let samples = samples_from(&[
            "a dB", "b dB", "c dB", "d dB", "e dB", "f dB", "g dB", "h dB", "i dB", "j dB",
            "k dB", "l dB", "m dB", "n dB", "o dB",
        ]);
        assert_eq!(
            classify(&samples),
            Classification::continuous(ScalingType::Linear, 0.7)
        );
    }

    #[test]
    fn test_custom_enum_ceiling() {
        let mut thresholds = Thresholds::default();
        thresholds.types.enum_max_distinct = 3;
        let names = ["Sine", "Triangle", "Saw", "Square"];
        let samples = sweep(|x| names[((x * 3.999) as usize).min(3)].to_string());

        let c = Classifier::new(thresholds).classify(&samples);
        assert_eq!(c, Classification::unknown());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let samples = sweep(|x| format!("{:.1} Hz", 20.0 * 1000f64.powf(x)));
        let first = classify(&samples);
        let second = classify(&samples);
        assert_eq!(first.param_type, second.param_type);
        assert_eq!(first.scaling, second.scaling);
        assert_eq!(first.confidence.to_bits(), second.confidence.to_bits());
    }
}
