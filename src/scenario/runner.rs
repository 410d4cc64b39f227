//! Scenario runs over cached segment artifacts

use super::params::ScenarioParams;
use super::sensitivity::{sensitivity_sweep, SensitivityPoint, SweepRange};
use crate::artifacts::{Algorithm, ArtifactCache, ArtifactKey, Segment, SegmentArtifacts};
use crate::error::Result;
use crate::projection::{
    FeatureSnapshot, ProjectionEngine, ProjectionResult, ScaleMode, TrendOutlook, TrendParams,
    CURRENCY_FEATURE, DEFAULT_INTEREST, INFLATION_FEATURE, INTEREST_FEATURE,
    LAGGED_TARGET_FEATURE, MONTH_FEATURE,
};
use chrono::{Datelike, Local};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Scenario projection next to its flat-trend baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub segment: Segment,
    pub algorithm: Option<Algorithm>,
    pub scale_mode: ScaleMode,
    pub outlook: TrendOutlook,
    pub scenario: ProjectionResult,
    /// Same call with every trend at zero
    pub baseline: ProjectionResult,
    /// Last minus first scenario value, in pp
    pub total_change: f64,
}

impl ScenarioOutcome {
    pub fn scenario_values(&self) -> Vec<f64> {
        self.scenario.predictions()
    }

    pub fn baseline_values(&self) -> Vec<f64> {
        self.baseline.predictions()
    }

    /// Scenario minus baseline at the end of the horizon
    pub fn final_gap(&self) -> f64 {
        match (self.scenario.final_prediction(), self.baseline.final_prediction()) {
            (Some(scenario), Some(baseline)) => scenario - baseline,
            _ => 0.0,
        }
    }
}

/// Build the projector's starting snapshot from persisted last values.
///
/// Interest and inflation come out in percentage points; the lagged target
/// stays in `params.target_units`. `fallback_month` fills a missing `mes`.
pub fn prepare_snapshot(
    last_values: &FeatureSnapshot,
    params: &ScenarioParams,
    scale_mode: ScaleMode,
    fallback_month: u32,
) -> FeatureSnapshot {
    let mut snapshot = last_values.clone();

    if let Some(interest) = snapshot.get(INTEREST_FEATURE) {
        snapshot.set(INTEREST_FEATURE, scale_mode.interest_to_percentage(interest));
    }
    if let Some(inflation) = snapshot.get(INFLATION_FEATURE) {
        snapshot.set(INFLATION_FEATURE, scale_mode.inflation_to_percentage(inflation));
    }

    if let Some(interest) = params.start_interest {
        snapshot.set(INTEREST_FEATURE, interest);
    }
    if let Some(inflation) = params.start_inflation {
        snapshot.set(INFLATION_FEATURE, inflation);
    }
    if let Some(currency) = params.start_currency {
        if snapshot.contains(CURRENCY_FEATURE) {
            snapshot.set(CURRENCY_FEATURE, currency);
        }
    }
    if let Some(target) = params.start_target {
        let autoregressive = params.projection_config().autoregression;
        if snapshot.contains(LAGGED_TARGET_FEATURE) || autoregressive {
            snapshot.set(LAGGED_TARGET_FEATURE, params.target_units.to_native(target));
        }
    }

    if !snapshot.contains(MONTH_FEATURE) {
        snapshot.set(MONTH_FEATURE, f64::from(fallback_month));
    }
    snapshot
}

/// Model scale, judged from the persisted interest rate
fn persisted_scale(artifacts: &SegmentArtifacts) -> ScaleMode {
    ScaleMode::detect(artifacts.last_values.get_or(INTEREST_FEATURE, DEFAULT_INTEREST))
}

/// Project scenario and baseline for already-loaded artifacts
pub fn simulate(artifacts: &SegmentArtifacts, params: &ScenarioParams) -> Result<ScenarioOutcome> {
    simulate_at(artifacts, params, Local::now().month())
}

fn simulate_at(
    artifacts: &SegmentArtifacts,
    params: &ScenarioParams,
    current_month: u32,
) -> Result<ScenarioOutcome> {
    let schema = artifacts.schema()?;
    let scale_mode = persisted_scale(artifacts);
    let snapshot = prepare_snapshot(&artifacts.last_values, params, scale_mode, current_month);

    let config = params.projection_config();
    let engine = ProjectionEngine::new(&artifacts.model, &artifacts.scaler, &schema, config);
    let trends = params.trends();
    let scenario = engine.project(&snapshot, &trends, scale_mode)?;
    let baseline = engine.project(&snapshot, &TrendParams::flat(), scale_mode)?;

    if scenario.clamped_steps() > 0 {
        let clamped = scenario.clamped_steps();
        warn!("{}: {clamped} of {} steps clamped", artifacts.key, scenario.len());
    }

    Ok(ScenarioOutcome {
        segment: artifacts.key.segment,
        algorithm: artifacts.key.algorithm,
        scale_mode,
        outlook: trends.outlook(),
        total_change: scenario.total_change(),
        scenario,
        baseline,
    })
}

/// Runs scenarios against a models directory, caching loaded artifacts
#[derive(Debug)]
pub struct ScenarioRunner {
    cache: ArtifactCache,
}

impl ScenarioRunner {
    pub fn new(cache: ArtifactCache) -> Self {
        Self { cache }
    }

    pub fn with_models_dir(models_dir: impl Into<PathBuf>) -> Self {
        Self::new(ArtifactCache::new(models_dir))
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    fn artifacts(
        &self,
        segment: Segment,
        algorithm: Option<Algorithm>,
    ) -> Result<Arc<SegmentArtifacts>> {
        self.cache.get(&ArtifactKey::new(segment, algorithm))
    }

    pub fn run_segment(
        &self,
        segment: Segment,
        algorithm: Option<Algorithm>,
        params: &ScenarioParams,
    ) -> Result<ScenarioOutcome> {
        let artifacts = self.artifacts(segment, algorithm)?;
        let outcome = simulate(&artifacts, params)?;
        info!(
            "{}: {:.2}% -> {:.2}% over {} months",
            artifacts.key,
            outcome.scenario.rows.first().map_or(0.0, |row| row.prediction),
            outcome.scenario.final_prediction().unwrap_or(0.0),
            outcome.scenario.len()
        );
        Ok(outcome)
    }

    /// Run every segment in parallel; each keeps its own result
    pub fn run_segments(
        &self,
        segments: &[Segment],
        algorithm: Option<Algorithm>,
        params: &ScenarioParams,
    ) -> Vec<(Segment, Result<ScenarioOutcome>)> {
        segments
            .par_iter()
            .map(|&segment| (segment, self.run_segment(segment, algorithm, params)))
            .collect()
    }

    /// Same segment under each algorithm, in parallel
    pub fn run_arena(
        &self,
        segment: Segment,
        algorithms: &[Algorithm],
        params: &ScenarioParams,
    ) -> Vec<(Algorithm, Result<ScenarioOutcome>)> {
        algorithms
            .par_iter()
            .map(|&alg| (alg, self.run_segment(segment, Some(alg), params)))
            .collect()
    }

    /// Single-step interest sensitivity from the prepared snapshot
    pub fn sensitivity(
        &self,
        segment: Segment,
        algorithm: Option<Algorithm>,
        params: &ScenarioParams,
        range: &SweepRange,
    ) -> Result<Vec<SensitivityPoint>> {
        let artifacts = self.artifacts(segment, algorithm)?;
        let schema = artifacts.schema()?;
        let scale_mode = persisted_scale(&artifacts);
        let month = Local::now().month();
        let snapshot = prepare_snapshot(&artifacts.last_values, params, scale_mode, month);

        // Sweep features go straight to the model, so back to native units
        let mut native = snapshot.clone();
        if let Some(inflation) = snapshot.get(INFLATION_FEATURE) {
            native.set(INFLATION_FEATURE, scale_mode.to_native(inflation));
        }

        sensitivity_sweep(
            &artifacts.model,
            &artifacts.scaler,
            &schema,
            &native,
            scale_mode,
            params.target_units,
            range,
        )
    }
}
