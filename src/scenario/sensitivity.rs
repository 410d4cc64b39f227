//! Single-step sensitivity of the default rate to the interest rate
//!
//! Every other feature is held at its snapshot value (Ceteris Paribus).

use crate::error::{ModelError, Result, SimulationError};
use crate::model::{coerce_prediction, FeatureScaler, Predictor};
use crate::projection::{
    FeatureSchema, FeatureSnapshot, ScaleMode, TargetUnits, INTEREST_FEATURE, INTEREST_MARKER,
};
use serde::{Deserialize, Serialize};

/// Evenly spaced interest grid, in percentage points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepRange {
    pub from: f64,
    pub to: f64,
    pub points: usize,
}

impl Default for SweepRange {
    fn default() -> Self {
        Self { from: 2.0, to: 20.0, points: 20 }
    }
}

impl SweepRange {
    pub fn new(from: f64, to: f64, points: usize) -> Self {
        Self { from, to, points }
    }

    /// Grid values including both ends
    pub fn values(&self) -> Result<Vec<f64>> {
        if !self.from.is_finite() || !self.to.is_finite() {
            return Err(SimulationError::out_of_range("sweep bounds must be finite"));
        }
        match self.points {
            0 => Err(SimulationError::out_of_range("sweep needs at least one point")),
            1 => Ok(vec![self.from]),
            n => {
                let step = (self.to - self.from) / (n - 1) as f64;
                Ok((0..n).map(|i| self.from + step * i as f64).collect())
            }
        }
    }
}

/// Predicted default rate at one interest level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    /// Interest rate, percentage points
    pub interest: f64,
    /// Default rate, percentage points
    pub prediction: f64,
}

/// Predict once per grid value with every interest column set to that value.
pub fn sensitivity_sweep(
    predictor: &dyn Predictor,
    scaler: &dyn FeatureScaler,
    schema: &FeatureSchema,
    snapshot: &FeatureSnapshot,
    scale_mode: ScaleMode,
    target_units: TargetUnits,
    range: &SweepRange,
) -> Result<Vec<SensitivityPoint>> {
    let grid = range.values()?;
    let columns: Vec<String> =
        snapshot.names_containing(INTEREST_MARKER).map(str::to_owned).collect();

    grid.into_iter()
        .enumerate()
        .map(|(idx, interest)| {
            let failure =
                |source: ModelError| SimulationError::PredictionFailure { step: idx, source };

            let mut features = snapshot.clone();
            let native = scale_mode.to_native(interest);
            for column in &columns {
                features.set(column.as_str(), native);
            }
            features.set(INTEREST_FEATURE, native);

            let scaled = scaler.transform(&schema.reconcile(&features)).map_err(failure)?;
            let raw = predictor.predict(&scaled).and_then(coerce_prediction).map_err(failure)?;
            Ok(SensitivityPoint {
                interest,
                prediction: target_units.to_percentage(raw),
            })
        })
        .collect()
}
