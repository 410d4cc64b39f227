//! Scenario runs: parameters, per-segment outcomes and sensitivity sweeps

mod params;
mod runner;
mod sensitivity;

pub use params::ScenarioParams;
pub use runner::{prepare_snapshot, simulate, ScenarioOutcome, ScenarioRunner};
pub use sensitivity::{sensitivity_sweep, SensitivityPoint, SweepRange};
