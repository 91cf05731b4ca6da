//! Parameter identities and the profiles built from sampled parameters.

pub mod types;

use chrono::Utc;

use crate::classifier::{Classification, ParameterType};
use crate::sampler::extract_unit;

pub use crate::sampler::ParameterSample;
pub use types::{OwnerIdentity, ParameterId, ParameterProfile};

impl ParameterProfile {
    /// Assemble a profile from samples and their classification.
    ///
    /// Derives the enum value list, unit and boundary strings from the samples.
    /// Samples are sorted by normalized value if they are not already.
    pub fn from_samples(
        id: ParameterId,
        param_name: Option<String>,
        mut samples: Vec<ParameterSample>,
        classification: Classification,
    ) -> Self {
        samples.sort_by(|a, b| a.normalized_value.total_cmp(&b.normalized_value));

        let enum_values = (classification.param_type == ParameterType::Enumerated)
            .then(|| distinct_in_order(&samples));
        let unit = samples
            .iter()
            .filter(|s| s.is_numeric)
            .find_map(|s| extract_unit(&s.formatted_value));
        let min_formatted = samples
            .first()
            .map(|s| s.formatted_value.clone())
            .unwrap_or_default();
        let max_formatted = samples
            .last()
            .map(|s| s.formatted_value.clone())
            .unwrap_or_default();

        Self {
            id,
            param_name,
            classification,
            samples,
            enum_values,
            unit,
            min_formatted,
            max_formatted,
            analyzed_at: Some(Utc::now().to_rfc3339()),
        }
    }
}

fn distinct_in_order(samples: &[ParameterSample]) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for sample in samples.iter().filter(|s| !s.is_gap()) {
        if !values.contains(&sample.formatted_value) {
            values.push(sample.formatted_value.clone());
        }
    }
    values
}
