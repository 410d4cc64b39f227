//! Recursive projection engine
//!
//! Each month the engine drifts the macro features linearly from the
//! baseline, feeds the previous prediction back as the lagged target,
//! advances the seasonal calendar, reconciles the snapshot against the
//! scaler's schema and predicts. A call either returns every month or fails.

use super::{
    FeatureSchema, FeatureSnapshot, ProjectionResult, ProjectionState, ScaleMode, StepRow,
    TargetUnits, TrendParams, CURRENCY_FEATURE, CURRENCY_FLOOR, DEFAULT_CURRENCY,
    DEFAULT_HORIZON_MONTHS, DEFAULT_INFLATION, DEFAULT_INTEREST, HARDENED_UPPER_BOUND,
    HARVEST_FEATURE, HARVEST_MONTHS, INFLATION_FEATURE, INFLATION_FLOOR, INTEREST_FEATURE,
    INTEREST_FLOOR, INTEREST_MARKER, LAGGED_TARGET_FEATURE, MAX_HORIZON_MONTHS, MONTH_FEATURE,
};
use crate::error::{ModelError, Result, SimulationError};
use crate::model::{coerce_prediction, FeatureScaler, Predictor};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Validity range applied to every reported prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OutputClamp {
    /// Floor at zero only
    Unbounded,
    /// Floor at zero, cap at the given rate (%)
    UpperBound(f64),
}

impl OutputClamp {
    pub fn apply(self, value: f64) -> f64 {
        let floored = value.max(0.0);
        match self {
            Self::Unbounded => floored,
            Self::UpperBound(upper) => floored.min(upper),
        }
    }

    pub fn upper(self) -> Option<f64> {
        match self {
            Self::Unbounded => None,
            Self::UpperBound(upper) => Some(upper),
        }
    }
}

/// Which snapshot columns receive the drifted interest rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestColumns {
    /// Only [`INTEREST_FEATURE`]
    CanonicalOnly,
    /// Every column whose name contains [`INTEREST_MARKER`]
    AllMatching,
}

/// Realistic range for the drifted interest rate, in percentage points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestBand {
    pub min: f64,
    pub max: f64,
}

impl InterestBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// The three rollout flavours, as presets over [`ProjectionConfig`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionVariant {
    /// Static macro drift, no feedback of predictions
    CeterisParibus,
    /// Autoregressive, lower bound only
    Dynamic,
    /// Autoregressive, capped output, every interest column drifted
    #[default]
    Hardened,
}

impl ProjectionVariant {
    pub const ALL: [ProjectionVariant; 3] =
        [Self::CeterisParibus, Self::Dynamic, Self::Hardened];

    pub fn config(self, months: usize) -> ProjectionConfig {
        match self {
            Self::CeterisParibus => ProjectionConfig::ceteris_paribus(months),
            Self::Dynamic => ProjectionConfig::dynamic(months),
            Self::Hardened => ProjectionConfig::hardened(months),
        }
    }
}

impl FromStr for ProjectionVariant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "ceteris_paribus" | "static" => Ok(Self::CeterisParibus),
            "dynamic" => Ok(Self::Dynamic),
            "hardened" => Ok(Self::Hardened),
            other => Err(format!(
                "unknown projection variant '{other}' \
                 (expected ceteris_paribus, dynamic or hardened)"
            )),
        }
    }
}

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Number of months to project
    pub months: usize,
    /// Feed each prediction back as the next month's lagged target
    pub autoregression: bool,
    pub output_clamp: OutputClamp,
    pub interest_columns: InterestColumns,
    /// Optional band for the drifted interest rate
    pub interest_band: Option<InterestBand>,
    pub target_units: TargetUnits,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::hardened(DEFAULT_HORIZON_MONTHS)
    }
}

impl ProjectionConfig {
    pub fn ceteris_paribus(months: usize) -> Self {
        Self {
            months,
            autoregression: false,
            output_clamp: OutputClamp::Unbounded,
            interest_columns: InterestColumns::CanonicalOnly,
            interest_band: None,
            target_units: TargetUnits::Percentage,
        }
    }

    pub fn dynamic(months: usize) -> Self {
        Self {
            autoregression: true,
            ..Self::ceteris_paribus(months)
        }
    }

    pub fn hardened(months: usize) -> Self {
        Self {
            months,
            autoregression: true,
            output_clamp: OutputClamp::UpperBound(HARDENED_UPPER_BOUND),
            interest_columns: InterestColumns::AllMatching,
            interest_band: None,
            target_units: TargetUnits::Percentage,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.months == 0 || self.months > MAX_HORIZON_MONTHS {
            return Err(SimulationError::out_of_range(format!(
                "horizon of {} months outside 1..={MAX_HORIZON_MONTHS}",
                self.months
            )));
        }
        if let Some(upper) = self.output_clamp.upper() {
            if !upper.is_finite() || upper <= 0.0 {
                return Err(SimulationError::out_of_range(format!(
                    "output upper bound {upper} must be positive"
                )));
            }
        }
        if let Some(band) = self.interest_band {
            let finite = band.min.is_finite() && band.max.is_finite();
            // The band may never undercut the interest floor
            if !finite || band.min > band.max || band.max < INTEREST_FLOOR {
                return Err(SimulationError::out_of_range(format!(
                    "interest band [{}, {}] is not a valid range",
                    band.min, band.max
                )));
            }
        }
        Ok(())
    }
}

/// Macro baselines in model-native units
#[derive(Debug, Clone, Copy)]
struct Baseline {
    interest: f64,
    inflation: f64,
    currency: f64,
}

impl Baseline {
    fn extract(snapshot: &FeatureSnapshot, scale_mode: ScaleMode) -> Result<Self> {
        let interest = snapshot.get_or(INTEREST_FEATURE, DEFAULT_INTEREST);
        let inflation = snapshot.get_or(INFLATION_FEATURE, DEFAULT_INFLATION);
        let currency = snapshot.get_or(CURRENCY_FEATURE, DEFAULT_CURRENCY);

        for (name, value) in [
            (INTEREST_FEATURE, interest),
            (INFLATION_FEATURE, inflation),
            (CURRENCY_FEATURE, currency),
        ] {
            if !value.is_finite() {
                return Err(SimulationError::out_of_range(format!(
                    "baseline {name} is not finite"
                )));
            }
        }

        // Currency is always in native units
        Ok(Self {
            interest: scale_mode.to_native(interest),
            inflation: scale_mode.to_native(inflation),
            currency,
        })
    }
}

/// Macro levels reached at one step
#[derive(Debug, Clone, Copy)]
struct MacroLevels {
    interest_pct: f64,
    inflation_pct: f64,
    currency: Option<f64>,
}

fn start_month(snapshot: &FeatureSnapshot) -> Result<u32> {
    let raw = snapshot.get(MONTH_FEATURE).ok_or_else(|| {
        SimulationError::out_of_range(format!("snapshot has no '{MONTH_FEATURE}' feature"))
    })?;
    let month = raw.round();
    if !(1.0..=12.0).contains(&month) {
        return Err(SimulationError::out_of_range(format!("month {raw} outside 1..=12")));
    }
    Ok(month as u32)
}

/// Projection engine over one fitted predictor / scaler pair
pub struct ProjectionEngine<'a> {
    predictor: &'a dyn Predictor,
    scaler: &'a dyn FeatureScaler,
    schema: &'a FeatureSchema,
    config: ProjectionConfig,
}

impl<'a> ProjectionEngine<'a> {
    pub fn new(
        predictor: &'a dyn Predictor,
        scaler: &'a dyn FeatureScaler,
        schema: &'a FeatureSchema,
        config: ProjectionConfig,
    ) -> Self {
        Self { predictor, scaler, schema, config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Project `config.months` months from `snapshot`.
    ///
    /// `snapshot` carries interest and inflation in percentage points and the
    /// lagged target in `config.target_units`; it is never modified.
    pub fn project(
        &self,
        snapshot: &FeatureSnapshot,
        trends: &TrendParams,
        scale_mode: ScaleMode,
    ) -> Result<ProjectionResult> {
        self.config.validate()?;
        trends.validate()?;
        let month = start_month(snapshot)?;
        let baseline = Baseline::extract(snapshot, scale_mode)?;
        self.check_lagged_target(snapshot)?;

        info!(
            "projecting {} months with {} ({:?} scale, autoregression={}, clamp={:?})",
            self.config.months,
            self.predictor.name(),
            scale_mode,
            self.config.autoregression,
            self.config.output_clamp
        );
        let missing = self.schema.missing(snapshot);
        if !missing.is_empty() {
            debug!("features filled with zero: {}", missing.join(", "));
        }
        let extras = self.schema.extras(snapshot);
        if !extras.is_empty() {
            debug!("features not in the schema, dropped: {}", extras.join(", "));
        }

        let mut state = ProjectionState::initial(snapshot.clone(), month);
        let mut previous: Option<f64> = None;
        let mut rows = Vec::with_capacity(self.config.months);

        for step in 0..self.config.months {
            let (next, levels) =
                self.advance(&state, &baseline, trends, scale_mode, step, previous);
            state = next;

            let (raw_prediction, prediction) = self.evaluate(&state, step)?;
            debug!(
                "step {} month {:2}: interest {:.4} inflation {:.4} -> {:.4} (raw {:.4})",
                step,
                state.month(),
                levels.interest_pct,
                levels.inflation_pct,
                prediction,
                raw_prediction
            );

            rows.push(self.step_row(&state, &levels, step, raw_prediction, prediction));

            if self.config.autoregression {
                previous = Some(self.config.target_units.to_native(prediction));
            }
        }

        Ok(ProjectionResult { rows })
    }

    fn check_lagged_target(&self, snapshot: &FeatureSnapshot) -> Result<()> {
        let Some(target) = snapshot.get(LAGGED_TARGET_FEATURE) else {
            return Ok(());
        };
        if !target.is_finite() {
            return Err(SimulationError::out_of_range(format!(
                "{LAGGED_TARGET_FEATURE} is not finite"
            )));
        }
        if self.config.target_units == TargetUnits::Decimal && target.abs() > 1.0 {
            return Err(SimulationError::out_of_range(format!(
                "{LAGGED_TARGET_FEATURE} = {target} looks like a percentage \
                 but target units are decimal"
            )));
        }
        Ok(())
    }

    /// Whether the model can see `name`, through the snapshot or the schema
    fn carries(&self, features: &FeatureSnapshot, name: &str) -> bool {
        features.contains(name) || self.schema.contains(name)
    }

    /// Derive the state for `step` from the previous one.
    fn advance(
        &self,
        state: &ProjectionState,
        baseline: &Baseline,
        trends: &TrendParams,
        scale_mode: ScaleMode,
        step: usize,
        previous: Option<f64>,
    ) -> (ProjectionState, MacroLevels) {
        let mut features = state.features().clone();
        let factor = scale_mode.factor();

        // Slopes are in pp regardless of model scale, so drift in pp space
        let interest_offset = TrendParams::offset(trends.interest, step);
        let mut interest_pct = (baseline.interest * factor + interest_offset).max(INTEREST_FLOOR);
        if let Some(band) = self.config.interest_band {
            interest_pct = band.clamp(interest_pct);
        }
        let inflation_offset = TrendParams::offset(trends.inflation, step);
        let inflation_pct = (baseline.inflation * factor + inflation_offset).max(INFLATION_FLOOR);

        let interest = scale_mode.to_native(interest_pct);
        if self.config.interest_columns == InterestColumns::AllMatching {
            let columns: Vec<String> =
                features.names_containing(INTEREST_MARKER).map(str::to_owned).collect();
            for column in columns {
                features.set(column, interest);
            }
        }
        features.set(INTEREST_FEATURE, interest);
        features.set(INFLATION_FEATURE, scale_mode.to_native(inflation_pct));

        let currency = if self.carries(&features, CURRENCY_FEATURE) {
            let offset = TrendParams::offset(trends.currency, step);
            let value = (baseline.currency + offset).max(CURRENCY_FLOOR);
            features.set(CURRENCY_FEATURE, value);
            Some(value)
        } else {
            None
        };

        if let Some(prediction) = previous {
            if self.carries(&features, LAGGED_TARGET_FEATURE) {
                features.set(LAGGED_TARGET_FEATURE, prediction);
            }
        }

        let month = state.next_month();
        if self.carries(&features, MONTH_FEATURE) {
            features.set(MONTH_FEATURE, f64::from(month));
        }
        if self.carries(&features, HARVEST_FEATURE) {
            let harvest = if HARVEST_MONTHS.contains(&month) { 1.0 } else { 0.0 };
            features.set(HARVEST_FEATURE, harvest);
        }

        let levels = MacroLevels { interest_pct, inflation_pct, currency };
        (ProjectionState { features, month }, levels)
    }

    /// Reconcile, scale and predict; returns (raw, clamped) in percentage points.
    fn evaluate(&self, state: &ProjectionState, step: usize) -> Result<(f64, f64)> {
        let failure = |source: ModelError| SimulationError::PredictionFailure { step, source };

        let row = self.schema.reconcile(state.features());
        let scaled = self.scaler.transform(&row).map_err(failure)?;
        let native = self
            .predictor
            .predict(&scaled)
            .and_then(coerce_prediction)
            .map_err(failure)?;

        let raw = self.config.target_units.to_percentage(native);
        Ok((raw, self.config.output_clamp.apply(raw)))
    }

    fn step_row(
        &self,
        state: &ProjectionState,
        levels: &MacroLevels,
        step: usize,
        raw_prediction: f64,
        prediction: f64,
    ) -> StepRow {
        StepRow {
            projection_month: step as u32 + 1,
            calendar_month: state.month(),
            harvest: HARVEST_MONTHS.contains(&state.month()),
            interest_pct: levels.interest_pct,
            inflation_pct: levels.inflation_pct,
            currency: levels.currency,
            lagged_target_pct: state
                .features()
                .get(LAGGED_TARGET_FEATURE)
                .map(|target| self.config.target_units.to_percentage(target)),
            raw_prediction,
            prediction,
        }
    }
}

/// Project a default-rate trajectory; one value per month of `config.months`.
///
/// `expected_features` is the scaler's fitted feature order. No partial
/// sequence is returned on failure.
pub fn project(
    predictor: &dyn Predictor,
    scaler: &dyn FeatureScaler,
    expected_features: &[String],
    initial: &FeatureSnapshot,
    trends: &TrendParams,
    config: &ProjectionConfig,
    scale_mode: ScaleMode,
) -> Result<Vec<f64>> {
    let schema = FeatureSchema::new(expected_features.to_vec())?;
    let engine = ProjectionEngine::new(predictor, scaler, &schema, config.clone());
    Ok(engine.project(initial, trends, scale_mode)?.predictions())
}
