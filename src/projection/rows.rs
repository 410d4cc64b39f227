//! Per-step output rows and the projection result

use serde::{Deserialize, Serialize};

/// One month of a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRow {
    /// Months ahead of the baseline (1-based)
    pub projection_month: u32,
    /// Calendar month fed to the model, 1..=12
    pub calendar_month: u32,
    /// Harvest-season indicator derived for `calendar_month`
    pub harvest: bool,

    /// Drifted interest rate in percentage points
    pub interest_pct: f64,
    /// Drifted monthly inflation in percentage points
    pub inflation_pct: f64,
    /// Drifted exchange rate, when the segment models it
    pub currency: Option<f64>,
    /// Lagged default rate fed to the model (percentage points)
    pub lagged_target_pct: Option<f64>,

    /// Model output converted to percentage points, before clamping
    pub raw_prediction: f64,
    /// Reported default rate after clamping (percentage points)
    pub prediction: f64,
}

impl StepRow {
    pub fn was_clamped(&self) -> bool {
        self.raw_prediction != self.prediction
    }
}

/// Complete projection: exactly one row per requested month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub rows: Vec<StepRow>,
}

impl ProjectionResult {
    /// Reported default rates, index 0 one month ahead of the baseline
    pub fn predictions(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.prediction).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Last projected value
    pub fn final_prediction(&self) -> Option<f64> {
        self.rows.last().map(|row| row.prediction)
    }

    /// Change from the first to the last projected month, in pp
    pub fn total_change(&self) -> f64 {
        match (self.rows.first(), self.rows.last()) {
            (Some(first), Some(last)) => last.prediction - first.prediction,
            _ => 0.0,
        }
    }

    /// Number of steps whose raw output fell outside the validity range
    pub fn clamped_steps(&self) -> usize {
        self.rows.iter().filter(|row| row.was_clamped()).count()
    }
}
