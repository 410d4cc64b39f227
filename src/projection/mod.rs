//! Multi-step recursive scenario projector

mod state;
mod schema;
mod scale;
mod trend;
mod engine;
mod rows;

pub use state::{FeatureSnapshot, ProjectionState};
pub use schema::{reconcile, FeatureSchema};
pub use scale::{ScaleMode, TargetUnits};
pub use trend::{TrendOutlook, TrendParams};
pub use engine::{
    project, InterestBand, InterestColumns, OutputClamp, ProjectionConfig, ProjectionEngine,
    ProjectionVariant,
};
pub use rows::{ProjectionResult, StepRow};

// ============================================================================
// Feature names
// ============================================================================
// Canonical columns the projector evolves. Any other snapshot feature is held
// constant for the whole rollout.

/// Interest rate (Selic) lagged six months
pub const INTEREST_FEATURE: &str = "selic_lag_6";

/// Substring marking every interest-rate column, whatever its lag
pub const INTEREST_MARKER: &str = "selic";

/// Monthly inflation (IPCA) lagged six months
pub const INFLATION_FEATURE: &str = "ipca_lag_6";

/// Exchange rate (USD PTAX) lagged six months
pub const CURRENCY_FEATURE: &str = "dolar_ptax_lag_6";

/// Default rate observed one month earlier
pub const LAGGED_TARGET_FEATURE: &str = "target_lag_1";

/// Calendar month, 1..=12
pub const MONTH_FEATURE: &str = "mes";

/// Harvest-season indicator, 1 during [`HARVEST_MONTHS`]
pub const HARVEST_FEATURE: &str = "periodo_safra";

/// Months treated as the agricultural harvest cycle
pub const HARVEST_MONTHS: [u32; 4] = [2, 3, 4, 5];

// ============================================================================
// Baselines and bounds
// ============================================================================
// Baseline defaults are in percentage / native units, applied when the
// snapshot does not carry the feature.

/// Default interest baseline (10% a.a.)
pub const DEFAULT_INTEREST: f64 = 10.0;

/// Default monthly inflation baseline (0.5% a.m.)
pub const DEFAULT_INFLATION: f64 = 0.5;

/// Default exchange rate baseline (BRL per USD)
pub const DEFAULT_CURRENCY: f64 = 5.0;

/// Drifted interest never goes below zero
pub const INTEREST_FLOOR: f64 = 0.0;

/// Drifted inflation never goes below -1 pp
pub const INFLATION_FLOOR: f64 = -1.0;

/// Exchange rate never goes below a realistic minimum
pub const CURRENCY_FLOOR: f64 = 2.0;

/// Default projection horizon
pub const DEFAULT_HORIZON_MONTHS: usize = 18;

/// Longest horizon accepted
pub const MAX_HORIZON_MONTHS: usize = 240;

/// Upper bound on projected default rates in the hardened variant (%)
pub const HARDENED_UPPER_BOUND: f64 = 20.0;
