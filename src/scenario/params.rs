//! User-facing scenario parameters
//!
//! Everything is expressed the way a user thinks about it: interest and
//! inflation in percentage points, the exchange rate in currency units and
//! default rates in percent. Conversion to model units happens downstream.

use crate::projection::{
    InterestBand, OutputClamp, ProjectionConfig, ProjectionVariant, TargetUnits, TrendParams,
    DEFAULT_HORIZON_MONTHS,
};
use serde::{Deserialize, Serialize};

/// Parameters for one scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    /// Months to project
    #[serde(default = "default_months")]
    pub months: usize,

    /// Interest rate slope, pp per month
    #[serde(default)]
    pub trend_interest: f64,

    /// Monthly inflation slope, pp per month
    #[serde(default)]
    pub trend_inflation: f64,

    /// Exchange rate slope, currency units per month
    #[serde(default)]
    pub trend_currency: f64,

    /// Starting interest rate (%), replacing the persisted value
    #[serde(default)]
    pub start_interest: Option<f64>,

    /// Starting monthly inflation (%), replacing the persisted value
    #[serde(default)]
    pub start_inflation: Option<f64>,

    /// Starting exchange rate, used only by segments that model it
    #[serde(default)]
    pub start_currency: Option<f64>,

    /// Starting default rate (%), fed as the first lagged target
    #[serde(default)]
    pub start_target: Option<f64>,

    #[serde(default)]
    pub variant: ProjectionVariant,

    /// Overrides the variant's upper bound on projected default rates
    #[serde(default)]
    pub upper_clamp: Option<f64>,

    #[serde(default)]
    pub interest_band: Option<InterestBand>,

    /// Units the persisted target and model output use
    #[serde(default)]
    pub target_units: TargetUnits,
}

fn default_months() -> usize {
    DEFAULT_HORIZON_MONTHS
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            months: DEFAULT_HORIZON_MONTHS,
            trend_interest: 0.0,
            trend_inflation: 0.0,
            trend_currency: 0.0,
            start_interest: None,
            start_inflation: None,
            start_currency: None,
            start_target: None,
            variant: ProjectionVariant::default(),
            upper_clamp: None,
            interest_band: None,
            target_units: TargetUnits::default(),
        }
    }
}

impl ScenarioParams {
    pub fn trends(&self) -> TrendParams {
        TrendParams::new(self.trend_interest, self.trend_inflation, self.trend_currency)
    }

    /// Projector configuration: the variant preset plus explicit overrides
    pub fn projection_config(&self) -> ProjectionConfig {
        let mut config = self.variant.config(self.months);
        if let Some(upper) = self.upper_clamp {
            config.output_clamp = OutputClamp::UpperBound(upper);
        }
        config.interest_band = self.interest_band;
        config.target_units = self.target_units;
        config
    }
}
