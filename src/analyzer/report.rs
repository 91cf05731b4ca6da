use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::profile::{OwnerIdentity, ParameterProfile};

/// Count of profiles sharing one classification label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    pub label: String,
    pub count: usize,
    /// Share of analyzed parameters, 0-100
    pub percent: f64,
}

/// A parameter that could not be analyzed or stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisFailure {
    pub index: u32,
    pub error: String,
}

/// Outcome of analyzing every parameter of one plugin.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub owner: OwnerIdentity,
    pub profiles: Vec<ParameterProfile>,
    pub failures: Vec<AnalysisFailure>,
    pub elapsed: Duration,
}

impl AnalysisReport {
    pub fn new(owner: OwnerIdentity) -> Self {
        Self {
            owner,
            profiles: Vec::new(),
            failures: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn record(&mut self, profile: ParameterProfile) {
        self.profiles.push(profile);
    }

    pub fn record_failure(&mut self, index: u32, error: impl ToString) {
        self.failures.push(AnalysisFailure {
            index,
            error: error.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profiles per label, most common first; equal counts sort by label.
    pub fn type_distribution(&self) -> Vec<TypeCount> {
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for profile in &self.profiles {
            *counts.entry(profile.classification.label()).or_insert(0) += 1;
        }

        let total = self.profiles.len() as f64;
        let mut distribution: Vec<TypeCount> = counts
            .into_iter()
            .map(|(label, count)| TypeCount {
                label: label.to_string(),
                count,
                percent: count as f64 / total * 100.0,
            })
            .collect();
        distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        distribution
    }

    /// One-line summary, e.g.
    /// `Analyzed 4 parameters of ReaComp (VST3): LINEAR 2 (50.0%), BINARY 1 (25.0%), ...`
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Analyzed {} parameters of {}",
            self.profiles.len(),
            self.owner
        );

        let distribution = self.type_distribution();
        if !distribution.is_empty() {
            let parts: Vec<String> = distribution
                .iter()
                .map(|t| format!("{} {} ({:.1}%)", t.label, t.count, t.percent))
                .collect();
            summary.push_str(": ");
            summary.push_str(&parts.join(", "));
        }
        if !self.failures.is_empty() {
            summary.push_str(&format!(" [{} failed]", self.failures.len()));
        }
        summary
    }
}
