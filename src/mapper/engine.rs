//! Lookup tables behind the value mapper.
//!
//! `ValueMapper` picks one table per parameter type when it is built and
//! never changes it afterwards.

use tracing::debug;

use crate::classifier::ParameterType;
use crate::profile::{ParameterProfile, ParameterSample};
use crate::sampler::extract_numeric_value;

/// Number of decimals kept when rendering an interpolated value.
const INTERPOLATED_DECIMALS: usize = 4;

/// Bidirectional converter between normalized and formatted values.
///
/// Built once from a profile. Both directions are pure lookups over the
/// profile's samples; the host is never queried.
#[derive(Debug, Clone)]
pub struct ValueMapper {
    param_type: ParameterType,
    lookup: Lookup,
}

#[derive(Debug, Clone)]
enum Lookup {
    /// Binary and enumerated parameters
    Discrete(SampleTable),
    Continuous(ContinuousTable),
    /// Parameters that could not be classified
    Nearest(SampleTable),
}

impl ValueMapper {
    pub fn new(profile: &ParameterProfile) -> Self {
        let param_type = profile.param_type();
        let lookup = match param_type {
            ParameterType::Binary | ParameterType::Enumerated => {
                Lookup::Discrete(SampleTable::new(&profile.samples))
            }
            ParameterType::Continuous => {
                Lookup::Continuous(ContinuousTable::new(&profile.samples))
            }
            ParameterType::Unknown => Lookup::Nearest(SampleTable::new(&profile.samples)),
        };
        debug!(
            "Built {} mapper for {} from {} samples",
            param_type,
            profile.id,
            profile.samples.len()
        );
        Self { param_type, lookup }
    }

    pub fn param_type(&self) -> ParameterType {
        self.param_type
    }

    /// Formatted value the host would display at `normalized`.
    ///
    /// Inputs outside [0, 1] are clamped. Returns an empty string when the
    /// profile holds no usable samples or the input is NaN.
    pub fn to_formatted(&self, normalized: f64) -> String {
        if normalized.is_nan() {
            return String::new();
        }
        let x = normalized.clamp(0.0, 1.0);
        match &self.lookup {
            Lookup::Discrete(table) | Lookup::Nearest(table) => table.nearest_formatted(x),
            Lookup::Continuous(table) => table.to_formatted(x),
        }
    }

    /// Normalized position that produces `formatted`, if one can be found.
    ///
    /// `None` means the string is unknown, unparseable or outside the
    /// sampled range. Callers should keep their current value in that case.
    pub fn to_normalized(&self, formatted: &str) -> Option<f64> {
        match &self.lookup {
            Lookup::Discrete(table) => table.band_position(formatted),
            Lookup::Continuous(table) => table.to_normalized(formatted),
            Lookup::Nearest(table) => table.first_match(formatted),
        }
    }
}

impl From<&ParameterProfile> for ValueMapper {
    fn from(profile: &ParameterProfile) -> Self {
        Self::new(profile)
    }
}

// =============================================================================
// SAMPLE TABLE
// =============================================================================

/// Non-empty samples as (normalized, formatted) pairs, sorted by position.
#[derive(Debug, Clone)]
struct SampleTable {
    entries: Vec<(f64, String)>,
}

impl SampleTable {
    fn new(samples: &[ParameterSample]) -> Self {
        let mut entries: Vec<(f64, String)> = samples
            .iter()
            .filter(|s| !s.is_gap())
            .map(|s| (s.normalized_value, s.formatted_value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { entries }
    }

    /// Formatted value of the sampled point closest to `x` (ties to the lower one).
    fn nearest_formatted(&self, x: f64) -> String {
        nearest_index(self.entries.iter().map(|(nx, _)| *nx), x)
            .map(|i| self.entries[i].1.clone())
            .unwrap_or_default()
    }

    fn first_match(&self, formatted: &str) -> Option<f64> {
        let wanted = formatted.trim();
        self.entries
            .iter()
            .find(|(_, f)| f.trim() == wanted)
            .map(|(x, _)| *x)
    }

    /// Position for a discrete label.
    ///
    /// A label whose band of positions reaches 0.0 or 1.0 maps to that
    /// boundary; otherwise to the sampled point nearest the band's centre.
    fn band_position(&self, formatted: &str) -> Option<f64> {
        let wanted = formatted.trim();
        let positions: Vec<f64> = self
            .entries
            .iter()
            .filter(|(_, f)| f.trim() == wanted)
            .map(|(x, _)| *x)
            .collect();
        let (&low, &high) = (positions.first()?, positions.last()?);

        if low <= 0.0 {
            return Some(0.0);
        }
        if high >= 1.0 {
            return Some(1.0);
        }
        let centre = (low + high) / 2.0;
        nearest_index(positions.iter().copied(), centre).map(|i| positions[i])
    }
}

// =============================================================================
// CONTINUOUS TABLE
// =============================================================================

#[derive(Debug, Clone)]
struct ContinuousTable {
    strings: SampleTable,
    /// Numeric samples as (normalized, numeric), sorted by position
    points: Vec<(f64, f64)>,
    monotonic: bool,
}

impl ContinuousTable {
    fn new(samples: &[ParameterSample]) -> Self {
        let mut points: Vec<(f64, f64)> = samples
            .iter()
            .filter_map(|s| s.numeric().map(|v| (s.normalized_value, v)))
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let rising = points.windows(2).all(|w| w[1].1 >= w[0].1);
        let falling = points.windows(2).all(|w| w[1].1 <= w[0].1);

        Self {
            strings: SampleTable::new(samples),
            points,
            monotonic: rising || falling,
        }
    }

    fn to_formatted(&self, x: f64) -> String {
        // Captured points return exactly what the host displayed
        if let Some((_, formatted)) = self.strings.entries.iter().find(|(nx, _)| *nx == x) {
            return formatted.clone();
        }

        let below = self
            .points
            .partition_point(|(nx, _)| *nx <= x)
            .checked_sub(1)
            .map(|i| &self.points[i]);
        let above = self.points.get(self.points.partition_point(|(nx, _)| *nx < x));
        match (below, above) {
            (Some(&(x0, v0)), Some(&(x1, v1))) => {
                let value = if x1 > x0 {
                    v0 + (v1 - v0) * (x - x0) / (x1 - x0)
                } else {
                    v0
                };
                format_number(value)
            }
            _ => self.strings.nearest_formatted(x),
        }
    }

    fn to_normalized(&self, formatted: &str) -> Option<f64> {
        if let Some(x) = self.strings.first_match(formatted) {
            return Some(x);
        }

        let value = extract_numeric_value(formatted)?;
        let (low, high) = self
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, v)| {
                (lo.min(*v), hi.max(*v))
            });
        if self.points.is_empty() || value < low || value > high {
            debug!("Value {} outside sampled range [{}, {}]", value, low, high);
            return None;
        }

        if !self.monotonic {
            return nearest_index(self.points.iter().map(|(_, v)| *v), value)
                .map(|i| self.points[i].0);
        }

        // Bracketing segment by binary search over the monotonic values
        let rising = self.points.first().map(|p| p.1) <= self.points.last().map(|p| p.1);
        let i = if rising {
            self.points.partition_point(|(_, v)| *v < value)
        } else {
            self.points.partition_point(|(_, v)| *v > value)
        };
        let (x1, v1) = *self.points.get(i)?;
        let Some(&(x0, v0)) = i.checked_sub(1).map(|j| &self.points[j]) else {
            return Some(x1);
        };
        if v1 == v0 {
            return Some(x0);
        }
        Some(x0 + (x1 - x0) * (value - v0) / (v1 - v0))
    }
}

/// Index of the value closest to `target`; the earliest wins ties.
fn nearest_index(values: impl Iterator<Item = f64>, target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.enumerate() {
        let distance = (v - target).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
}

/// Render an interpolated number with trailing zeros removed.
fn format_number(value: f64) -> String {
    let text = format!("{:.*}", INTERPOLATED_DECIMALS, value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
