//! Scaling analysis for continuous parameters.
//!
//! Each candidate shape gets an independent score in [0,1]. The analyzer
//! reports the best-scoring candidate above the minimum confidence, breaking
//! ties in the order Linear > Logarithmic > Exponential > Inverted.

use serde::Serialize;
use tracing::debug;

use crate::sampler::ParameterSample;

use super::thresholds::ScalingThresholds;
use super::types::ScalingType;

/// Independent score of every scaling candidate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScalingScores {
    pub linear: f64,
    pub logarithmic: f64,
    pub exponential: f64,
    pub inverted: f64,
}

impl ScalingScores {
    pub fn score(&self, scaling: ScalingType) -> f64 {
        match scaling {
            ScalingType::Linear => self.linear,
            ScalingType::Logarithmic => self.logarithmic,
            ScalingType::Exponential => self.exponential,
            ScalingType::Inverted => self.inverted,
            ScalingType::Unknown => 0.0,
        }
    }
}

/// Outcome of scaling analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalingResult {
    pub scaling: ScalingType,
    pub confidence: f64,
    pub scores: ScalingScores,
}

/// Scores the four scaling candidates over a sample array.
#[derive(Debug, Clone, Default)]
pub struct ScalingAnalyzer {
    thresholds: ScalingThresholds,
}

impl ScalingAnalyzer {
    pub fn new(thresholds: ScalingThresholds) -> Self {
        Self { thresholds }
    }

    pub fn analyze(&self, samples: &[ParameterSample]) -> ScalingResult {
        let scores = ScalingScores {
            linear: self.linear_confidence(samples),
            logarithmic: self.logarithmic_confidence(samples),
            exponential: self.exponential_confidence(samples),
            inverted: self.inverted_confidence(samples),
        };

        let mut best = ScalingType::Unknown;
        let mut best_confidence = self.thresholds.min_confidence;
        for candidate in ScalingType::PRIORITY {
            let score = scores.score(candidate);
            if score > best_confidence {
                best = candidate;
                best_confidence = score;
            }
        }

        debug!(
            "Scaling scores: linear={:.3} log={:.3} exp={:.3} inv={:.3} -> {}",
            scores.linear, scores.logarithmic, scores.exponential, scores.inverted, best
        );

        let confidence = if best == ScalingType::Unknown {
            0.0
        } else {
            best_confidence
        };
        ScalingResult {
            scaling: best,
            confidence,
            scores,
        }
    }

    /// High when Δnumeric/Δnormalized is nearly constant and positive.
    ///
    /// Falling relationships score 0.0 here; they belong to the inverted
    /// candidate.
    pub fn linear_confidence(&self, samples: &[ParameterSample]) -> f64 {
        if samples.len() < self.thresholds.linear_min_samples {
            return 0.0;
        }
        let pairs = consecutive_numeric_pairs(samples, Some);
        if pairs.len() < self.thresholds.linear_min_pairs {
            return 0.0;
        }
        match rate_consistency(&pairs, self.thresholds.linear_epsilon) {
            Some((mean, confidence)) if mean > 0.0 => confidence,
            _ => 0.0,
        }
    }

    /// Max of two tests: a large share of the total change in the first
    /// quarter, or a constant rate of change of `ln|numeric|` (a geometric
    /// sweep such as 20 Hz..20 kHz). The second only counts when the log
    /// domain is steadier than the raw values.
    pub fn logarithmic_confidence(&self, samples: &[ParameterSample]) -> f64 {
        self.first_quarter_share(samples)
            .max(self.geometric_rate(samples))
    }

    /// A large share of the total change in the last quarter.
    pub fn exponential_confidence(&self, samples: &[ParameterSample]) -> f64 {
        let t = &self.thresholds;
        let Some((start, end)) = self.curve_bounds(samples) else {
            return 0.0;
        };
        let Some(anchor) = samples
            .iter()
            .rev()
            .filter(|s| s.is_numeric)
            .find(|s| s.normalized_value <= t.last_quarter)
        else {
            return 0.0;
        };

        let ratio = (end - anchor.numeric_value).abs() / (end - start).abs();
        self.share_score(ratio)
    }

    /// Fires only when the value at 1.0 is below the value at 0.0.
    pub fn inverted_confidence(&self, samples: &[ParameterSample]) -> f64 {
        let Some((start, end)) = boundary_values(samples) else {
            return 0.0;
        };
        if end >= start {
            return 0.0;
        }

        let magnitude = start.abs().max(end.abs());
        if magnitude > 0.0 {
            ((start - end).abs() / magnitude).min(self.thresholds.confidence_cap)
        } else {
            0.0
        }
    }

    fn first_quarter_share(&self, samples: &[ParameterSample]) -> f64 {
        let t = &self.thresholds;
        let Some((start, end)) = self.curve_bounds(samples) else {
            return 0.0;
        };
        let Some(anchor) = samples
            .iter()
            .filter(|s| s.is_numeric)
            .find(|s| s.normalized_value >= t.first_quarter)
        else {
            return 0.0;
        };

        let ratio = (anchor.numeric_value - start).abs() / (end - start).abs();
        self.share_score(ratio)
    }

    fn geometric_rate(&self, samples: &[ParameterSample]) -> f64 {
        if self.curve_bounds(samples).is_none() {
            return 0.0;
        }

        let numeric: Vec<f64> = samples.iter().filter_map(|s| s.numeric()).collect();
        let all_positive = numeric.iter().all(|v| *v > 0.0);
        let all_negative = numeric.iter().all(|v| *v < 0.0);
        if !(all_positive || all_negative) {
            return 0.0;
        }

        let log_pairs = consecutive_numeric_pairs(samples, |y| Some(y.abs().ln()));
        if log_pairs.len() < self.thresholds.linear_min_pairs {
            return 0.0;
        }
        let epsilon = self.thresholds.linear_epsilon;
        let Some((_, log_consistency)) = rate_consistency(&log_pairs, epsilon) else {
            return 0.0;
        };
        // A straight ramp, rising or falling, is at least as steady in the raw domain
        let raw_consistency = rate_consistency(&consecutive_numeric_pairs(samples, Some), epsilon)
            .map_or(0.0, |(_, confidence)| confidence);
        if log_consistency <= raw_consistency {
            return 0.0;
        }
        log_consistency.min(self.thresholds.confidence_cap)
    }

    /// Boundary values for the quarter-share tests, or `None` when there are
    /// too few numeric samples or no total change.
    fn curve_bounds(&self, samples: &[ParameterSample]) -> Option<(f64, f64)> {
        let numeric = samples.iter().filter(|s| s.is_numeric).count();
        if numeric < self.thresholds.curve_min_numeric {
            return None;
        }
        let (start, end) = boundary_values(samples)?;
        (end != start).then_some((start, end))
    }

    fn share_score(&self, ratio: f64) -> f64 {
        let t = &self.thresholds;
        if ratio > t.quarter_share_cutoff {
            ((ratio - t.quarter_share_cutoff) * t.quarter_share_scale).min(t.confidence_cap)
        } else {
            0.0
        }
    }
}

/// Analyze scaling with the default thresholds.
pub fn analyze_scaling(samples: &[ParameterSample]) -> (ScalingType, f64) {
    let result = ScalingAnalyzer::default().analyze(samples);
    (result.scaling, result.confidence)
}

fn boundary_values(samples: &[ParameterSample]) -> Option<(f64, f64)> {
    let start = samples.first()?.numeric()?;
    let end = samples.last()?.numeric()?;
    Some((start, end))
}

/// (Δx, Δy) for each pair of adjacent samples that are both numeric, with
/// `y` transformed by `map`.
fn consecutive_numeric_pairs(
    samples: &[ParameterSample],
    map: impl Fn(f64) -> Option<f64>,
) -> Vec<(f64, f64)> {
    samples
        .windows(2)
        .filter_map(|w| {
            let y0 = map(w[0].numeric()?)?;
            let y1 = map(w[1].numeric()?)?;
            Some((w[1].normalized_value - w[0].normalized_value, y1 - y0))
        })
        .collect()
}

/// Mean rate of change and `1 - min(1, variance / (mean² + ε))`.
fn rate_consistency(pairs: &[(f64, f64)], epsilon: f64) -> Option<(f64, f64)> {
    let rates: Vec<f64> = pairs
        .iter()
        .filter(|(dx, _)| *dx != 0.0)
        .map(|(dx, dy)| dy / dx)
        .collect();
    if rates.is_empty() {
        return None;
    }

    let n = rates.len() as f64;
    let mean = rates.iter().sum::<f64>() / n;
    let variance = rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let normalized_variance = variance / (mean * mean + epsilon);
    Some((mean, 1.0 - normalized_variance.min(1.0)))
}
