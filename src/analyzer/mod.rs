//! End-to-end parameter analysis: sample, classify, profile, cache.
//!
//! The analyzer owns its cache and thresholds; hosts construct one and pass
//! it where needed. There is no process-wide instance.

mod report;

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::cache::{ProfileCache, ProfileStore};
use crate::classifier::{default_thresholds, load_thresholds, Classifier, Thresholds};
use crate::error::{ParamScopeError, Result};
use crate::mapper::ValueMapper;
use crate::profile::{OwnerIdentity, ParameterId, ParameterProfile};
use crate::sampler::{sample_from_source, CancelToken, FormattedValueSource, SamplePlan};

pub use report::{AnalysisFailure, AnalysisReport, TypeCount};

pub struct ParameterAnalyzer<S: ProfileStore> {
    cache: ProfileCache<S>,
    classifier: Classifier,
}

impl<S: ProfileStore> ParameterAnalyzer<S> {
    pub fn new(cache: ProfileCache<S>, thresholds: Thresholds) -> Self {
        Self {
            cache,
            classifier: Classifier::new(thresholds),
        }
    }

    /// Analyzer over `store` with the embedded default thresholds.
    pub fn with_store(store: S) -> Self {
        Self::new(ProfileCache::new(store), default_thresholds())
    }

    /// Analyzer over `store` with thresholds read from a TOML file.
    pub fn with_thresholds_file(store: S, path: &Path) -> Result<Self> {
        let thresholds =
            load_thresholds(path).map_err(|e| ParamScopeError::Config(format!("{:#}", e)))?;
        info!("Loaded analysis thresholds from {:?}", path);
        Ok(Self::new(ProfileCache::new(store), thresholds))
    }

    pub fn cache(&self) -> &ProfileCache<S> {
        &self.cache
    }

    pub fn thresholds(&self) -> &Thresholds {
        self.classifier.thresholds()
    }

    /// Sample points for one parameter, from host step metadata when available.
    pub fn plan_for<Src>(&self, source: &Src, id: &ParameterId) -> SamplePlan
    where
        Src: FormattedValueSource + ?Sized,
    {
        match source.step_info(id) {
            Some(info) => {
                SamplePlan::from_step_info(info, self.thresholds().profile.max_step_points)
            }
            None => SamplePlan::default_points(),
        }
    }

    /// Sample and classify one parameter, then replace its cached profile.
    ///
    /// An aborted run returns `Aborted` and leaves the cache untouched.
    pub fn analyze<Src>(
        &self,
        source: &Src,
        id: &ParameterId,
        cancel: &CancelToken,
    ) -> Result<ParameterProfile>
    where
        Src: FormattedValueSource + ?Sized,
    {
        let plan = self.plan_for(source, id);
        debug!("Sampling {} at {} points", id, plan.len());

        let samples = sample_from_source(source, id, &plan, cancel)?;
        let classification = self.classifier.classify(&samples);
        let profile = ParameterProfile::from_samples(
            id.clone(),
            source.parameter_name(id),
            samples,
            classification,
        );

        info!(
            "{}{}: {} (confidence {:.2})",
            id,
            profile
                .param_name
                .as_deref()
                .map(|name| format!(" '{}'", name))
                .unwrap_or_default(),
            profile.classification.label(),
            profile.confidence()
        );

        self.cache.put(&profile)?;
        Ok(profile)
    }

    /// Same as [`ParameterAnalyzer::analyze`]; samples even when a profile is cached.
    pub fn reanalyze<Src>(
        &self,
        source: &Src,
        id: &ParameterId,
        cancel: &CancelToken,
    ) -> Result<ParameterProfile>
    where
        Src: FormattedValueSource + ?Sized,
    {
        self.analyze(source, id, cancel)
    }

    /// Cached profile if present, otherwise a fresh analysis.
    ///
    /// A failed cache read is logged and treated as a miss.
    pub fn profile_for<Src>(
        &self,
        source: &Src,
        id: &ParameterId,
        cancel: &CancelToken,
    ) -> Result<ParameterProfile>
    where
        Src: FormattedValueSource + ?Sized,
    {
        match self.cache.get(id) {
            Ok(Some(profile)) => {
                debug!("Cache hit for {}", id);
                return Ok(profile);
            }
            Ok(None) => debug!("Cache miss for {}, sampling", id),
            Err(e) => warn!("Cache lookup failed for {}: {}, sampling anyway", id, e),
        }
        self.analyze(source, id, cancel)
    }

    /// Analyze parameters `0..param_count` of one plugin.
    ///
    /// Parameters that fail to analyze or store are recorded in the report
    /// and skipped. Cancellation stops the run with `Aborted`; profiles
    /// completed before that stay cached.
    pub fn analyze_owner<Src>(
        &self,
        source: &Src,
        owner: &OwnerIdentity,
        param_count: u32,
        cancel: &CancelToken,
    ) -> Result<AnalysisReport>
    where
        Src: FormattedValueSource + ?Sized,
    {
        let started = Instant::now();
        let mut report = AnalysisReport::new(owner.clone());
        info!("Analyzing {} parameters of {}", param_count, owner);

        for index in 0..param_count {
            let id = ParameterId::new(owner.clone(), index);
            match self.analyze(source, &id, cancel) {
                Ok(profile) => report.record(profile),
                Err(e @ ParamScopeError::Aborted { .. }) => {
                    warn!("Analysis of {} aborted at parameter {}", owner, index);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Failed to analyze {}: {}", id, e);
                    report.record_failure(index, e);
                }
            }
        }

        report.elapsed = started.elapsed();
        info!("{}", report.summary());
        Ok(report)
    }

    /// Value mapper for a cached profile, or `None` if the parameter was never analyzed.
    pub fn mapper_for(&self, id: &ParameterId) -> Result<Option<ValueMapper>> {
        Ok(self.cache.get(id)?.as_ref().map(ValueMapper::new))
    }
}
