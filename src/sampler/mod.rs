//! Sampling of opaque parameters through the host's formatting primitive.
//!
//! The sampler walks an ordered set of normalized points, asks the host for
//! the formatted string at each one, and records what came back. Failed or
//! empty points become gap samples instead of errors. Sampling is blocking
//! and strictly sequential because host formatting APIs are generally not
//! thread-safe.

pub mod numeric;

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ParamScopeError, Result};
use crate::profile::ParameterId;

pub use numeric::{extract_numeric_value, extract_unit};

/// Recommended sample points, denser near the boundaries.
pub const DEFAULT_SAMPLE_POINTS: [f64; 15] = [
    0.0, 0.01, 0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 0.95, 0.99, 1.0,
];

/// Upper bound on points generated from a host-reported step size.
pub const DEFAULT_MAX_STEP_POINTS: usize = 1024;

// =============================================================================
// SAMPLES
// =============================================================================

/// One observation of a parameter at a normalized position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSample {
    pub normalized_value: f64,
    /// Empty when the host failed to format this point.
    pub formatted_value: String,
    /// Meaningful only when `is_numeric` is true.
    pub numeric_value: f64,
    pub is_numeric: bool,
}

impl ParameterSample {
    /// Build a sample from a host-formatted string, parsing its number if any.
    pub fn capture(normalized_value: f64, formatted_value: impl Into<String>) -> Self {
        let formatted_value = formatted_value.into();
        let numeric = extract_numeric_value(&formatted_value);
        Self {
            normalized_value,
            formatted_value,
            numeric_value: numeric.unwrap_or(0.0),
            is_numeric: numeric.is_some(),
        }
    }

    /// A sample for a point the host could not format.
    pub fn gap(normalized_value: f64) -> Self {
        Self {
            normalized_value,
            formatted_value: String::new(),
            numeric_value: 0.0,
            is_numeric: false,
        }
    }

    pub fn is_gap(&self) -> bool {
        self.formatted_value.is_empty()
    }

    pub fn numeric(&self) -> Option<f64> {
        self.is_numeric.then_some(self.numeric_value)
    }
}

// =============================================================================
// HOST SEAM
// =============================================================================

/// Step metadata some hosts report for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub is_toggle: bool,
    /// Smallest normalized increment; zero when the host does not define one.
    pub small_step: f64,
}

/// The host-provided primitive that formats a parameter at a normalized value.
///
/// Implementations must not change the parameter's live value and must be
/// safe to call repeatedly with increasing normalized values.
pub trait FormattedValueSource {
    fn formatted_value(&self, id: &ParameterId, normalized: f64) -> anyhow::Result<String>;

    fn parameter_name(&self, _id: &ParameterId) -> Option<String> {
        None
    }

    fn step_info(&self, _id: &ParameterId) -> Option<StepInfo> {
        None
    }
}

impl<F> FormattedValueSource for F
where
    F: Fn(&ParameterId, f64) -> anyhow::Result<String>,
{
    fn formatted_value(&self, id: &ParameterId, normalized: f64) -> anyhow::Result<String> {
        self(id, normalized)
    }
}

// =============================================================================
// CANCELLATION
// =============================================================================

/// Abort signal checked between sample points. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// =============================================================================
// SAMPLE PLANS
// =============================================================================

/// A validated, ordered set of normalized sample points.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePlan {
    points: Vec<f64>,
}

impl SamplePlan {
    /// Validate caller-supplied points.
    pub fn new(points: Vec<f64>) -> Result<Self> {
        validate_points(&points)?;
        Ok(Self { points })
    }

    pub fn default_points() -> Self {
        Self {
            points: DEFAULT_SAMPLE_POINTS.to_vec(),
        }
    }

    /// Dense distribution for parameters without step metadata.
    pub fn dense() -> Self {
        let mut points = vec![0.0];
        points.extend((1..10).map(|i| i as f64 / 100.0));
        points.extend((2..20).map(|i| i as f64 * 5.0 / 100.0));
        points.extend((96..100).map(|i| i as f64 / 100.0));
        points.push(1.0);
        Self { points }
    }

    /// Choose points from host step metadata.
    ///
    /// Toggles need only the two boundaries. A positive step is walked
    /// exactly unless it would produce more than `max_points`, in which case
    /// the dense distribution is used instead.
    pub fn from_step_info(info: StepInfo, max_points: usize) -> Self {
        if info.is_toggle {
            return Self {
                points: vec![0.0, 1.0],
            };
        }

        let step = info.small_step;
        if !(step.is_finite() && step > 0.0) {
            return Self::dense();
        }

        let inner = (1.0 / step).ceil() as usize;
        let needed = inner.saturating_add(1);
        if needed > max_points {
            debug!(
                "Step {} would need {} points (max {}), using dense plan",
                step, needed, max_points
            );
            return Self::dense();
        }

        let mut points = vec![0.0];
        points.extend(
            (1..=inner)
                .map(|i| i as f64 * step)
                .take_while(|p| *p < 1.0),
        );
        points.push(1.0);
        Self { points }
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for SamplePlan {
    fn default() -> Self {
        Self::default_points()
    }
}

/// Check that points are non-empty, finite, strictly increasing, within
/// [0,1], and start at 0.0 and end at 1.0.
pub fn validate_points(points: &[f64]) -> Result<()> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(ParamScopeError::InvalidSamplePoints(
                "no sample points given".to_string(),
            ))
        }
    };

    if let Some(bad) = points.iter().find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0) {
        return Err(ParamScopeError::InvalidSamplePoints(format!(
            "point {} is outside [0, 1]",
            bad
        )));
    }
    if first != 0.0 || last != 1.0 {
        return Err(ParamScopeError::InvalidSamplePoints(format!(
            "points must start at 0.0 and end at 1.0 (got {} .. {})",
            first, last
        )));
    }
    if let Some(pair) = points.windows(2).find(|w| w[1] <= w[0]) {
        return Err(ParamScopeError::InvalidSamplePoints(format!(
            "points must be strictly increasing ({} followed by {})",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

// =============================================================================
// SAMPLING
// =============================================================================

/// Sample a parameter by calling `query` once per point, in order.
///
/// A failing or empty query result produces a gap sample. Cancellation is
/// checked before each point; an aborted run returns `Aborted` and drops
/// everything collected so far.
pub fn sample_parameter<F, E>(
    mut query: F,
    points: &[f64],
    cancel: &CancelToken,
) -> Result<Vec<ParameterSample>>
where
    F: FnMut(f64) -> std::result::Result<String, E>,
    E: Display,
{
    validate_points(points)?;

    let mut samples = Vec::with_capacity(points.len());
    for (i, &point) in points.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(ParamScopeError::Aborted {
                completed: i,
                total: points.len(),
            });
        }

        let sample = match query(point) {
            Ok(formatted) if !formatted.is_empty() => ParameterSample::capture(point, formatted),
            Ok(_) => {
                debug!("Empty formatted value at {:.4}", point);
                ParameterSample::gap(point)
            }
            Err(e) => {
                warn!("Failed to get formatted value for point {:.4}: {}", point, e);
                ParameterSample::gap(point)
            }
        };
        samples.push(sample);
    }

    Ok(samples)
}

/// Sample one parameter of a host-side plugin with the given plan.
pub fn sample_from_source<S>(
    source: &S,
    id: &ParameterId,
    plan: &SamplePlan,
    cancel: &CancelToken,
) -> Result<Vec<ParameterSample>>
where
    S: FormattedValueSource + ?Sized,
{
    sample_parameter(
        |point| source.formatted_value(id, point),
        plan.points(),
        cancel,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::OwnerIdentity;
    use std::cell::RefCell;

    fn format_tenths(x: f64) -> std::result::Result<String, String> {
        Ok(format!("{:.1} dB", x * 10.0))
    }

    #[test]
    fn test_sample_records_every_point() {
        let samples =
            sample_parameter(format_tenths, &DEFAULT_SAMPLE_POINTS, &CancelToken::new()).unwrap();

        assert_eq!(samples.len(), 15);
        assert_eq!(samples[0].formatted_value, "0.0 dB");
        assert!(samples.iter().all(|s| s.is_numeric));
        assert_eq!(samples[7].normalized_value, 0.5);
        assert_eq!(samples[7].numeric_value, 5.0);
    }

    #[test]
    fn test_failed_and_empty_points_become_gaps() {
        let query = |x: f64| -> std::result::Result<String, String> {
            if x == 0.5 {
                Err("host busy".to_string())
            } else if x == 0.6 {
                Ok(String::new())
            } else {
                Ok("On".to_string())
            }
        };
        let samples = sample_parameter(query, &DEFAULT_SAMPLE_POINTS, &CancelToken::new()).unwrap();

        assert_eq!(samples.len(), 15);
        assert!(samples[7].is_gap());
        assert!(!samples[7].is_numeric);
        assert!(samples[8].is_gap());
        assert_eq!(samples[9].formatted_value, "On");
    }

    #[test]
    fn test_queries_in_increasing_order() {
        let seen = RefCell::new(Vec::new());
        let query = |x: f64| -> std::result::Result<String, String> {
            seen.borrow_mut().push(x);
            Ok(x.to_string())
        };
        sample_parameter(query, &DEFAULT_SAMPLE_POINTS, &CancelToken::new()).unwrap();
        assert_eq!(seen.into_inner(), DEFAULT_SAMPLE_POINTS.to_vec());
    }

    #[test]
    fn test_cancel_discards_partial_samples() {
        let cancel = CancelToken::new();
        let calls = RefCell::new(0);
        let query = |_x: f64| -> std::result::Result<String, String> {
            *calls.borrow_mut() += 1;
            if *calls.borrow() == 3 {
                cancel.cancel();
            }
            Ok("1".to_string())
        };

        let result = sample_parameter(query, &DEFAULT_SAMPLE_POINTS, &cancel);
        match result {
            Err(ParamScopeError::Aborted { completed, total }) => {
                assert_eq!(completed, 3);
                assert_eq!(total, 15);
            }
            other => panic!("expected Aborted, got {:?}", other),
        }
        assert_eq!(*calls.borrow(), 3);
    }

    #[test]
    fn test_malformed_points_fail_fast() {
        let cancel = CancelToken::new();
        for points in [
            vec![],
            vec![0.0, 0.5],
            vec![0.1, 1.0],
            vec![0.0, 0.6, 0.4, 1.0],
            vec![0.0, 0.5, 0.5, 1.0],
            vec![0.0, 1.5],
            vec![0.0, f64::NAN, 1.0],
        ] {
            let result = sample_parameter(format_tenths, &points, &cancel);
            assert!(
                matches!(result, Err(ParamScopeError::InvalidSamplePoints(_))),
                "points {:?} should be rejected",
                points
            );
        }
    }

    #[test]
    fn test_dense_plan_is_valid() {
        let plan = SamplePlan::dense();
        assert!(validate_points(plan.points()).is_ok());
        assert_eq!(plan.len(), 33);
        assert_eq!(plan.points()[10], 0.1);
        assert_eq!(plan.points()[27], 0.95);
        assert_eq!(plan.points()[28], 0.96);
    }

    #[test]
    fn test_plan_from_toggle() {
        let plan = SamplePlan::from_step_info(
            StepInfo {
                is_toggle: true,
                small_step: 0.0,
            },
            DEFAULT_MAX_STEP_POINTS,
        );
        assert_eq!(plan.points(), &[0.0, 1.0]);
    }

    #[test]
    fn test_plan_from_small_step() {
        let plan = SamplePlan::from_step_info(
            StepInfo {
                is_toggle: false,
                small_step: 0.25,
            },
            DEFAULT_MAX_STEP_POINTS,
        );
        assert_eq!(plan.points(), &[0.0, 0.25, 0.5, 0.75, 1.0]);

        let plan = SamplePlan::from_step_info(
            StepInfo {
                is_toggle: false,
                small_step: 0.3,
            },
            DEFAULT_MAX_STEP_POINTS,
        );
        assert_eq!(plan.len(), 5);
        assert!(validate_points(plan.points()).is_ok());
    }

    #[test]
    fn test_plan_falls_back_to_dense() {
        let tiny = StepInfo {
            is_toggle: false,
            small_step: 1e-6,
        };
        assert_eq!(SamplePlan::from_step_info(tiny, 100), SamplePlan::dense());

        let undefined = StepInfo {
            is_toggle: false,
            small_step: 0.0,
        };
        assert_eq!(
            SamplePlan::from_step_info(undefined, 100),
            SamplePlan::dense()
        );
    }

    #[test]
    fn test_sample_from_source_closure() {
        let owner = OwnerIdentity::new("ReaEQ", "VST");
        let id = ParameterId::new(owner, 2);
        let source = |pid: &ParameterId, x: f64| -> anyhow::Result<String> {
            Ok(format!("{} / {}", pid.index, x))
        };

        let samples =
            sample_from_source(&source, &id, &SamplePlan::default(), &CancelToken::new()).unwrap();
        assert_eq!(samples[0].formatted_value, "2 / 0");
        assert_eq!(samples[0].numeric_value, 2.0);
    }
}
