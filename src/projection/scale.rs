//! Translation between user-facing percentages and model-native units

use serde::{Deserialize, Serialize};

/// Units the model was trained on for interest and inflation
///
/// Detected once per segment from persisted data and held fixed for the
/// lifetime of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    /// Fractions: 0.10 means 10%
    Decimal,
    /// Whole percentages: 10.0 means 10%
    Percentage,
}

impl ScaleMode {
    /// Classify from the persisted interest-rate baseline.
    ///
    /// Magnitude below 1.0 means the model saw fractions. The threshold is a
    /// heuristic: a genuine rate under 1% trained as a percentage would be
    /// misread as Decimal. Non-finite input classifies as Percentage.
    pub fn detect(persisted_interest: f64) -> Self {
        if persisted_interest.abs() < 1.0 {
            Self::Decimal
        } else {
            Self::Percentage
        }
    }

    /// Multiplier from native units to percentage points
    pub fn factor(self) -> f64 {
        match self {
            Self::Decimal => 100.0,
            Self::Percentage => 1.0,
        }
    }

    /// Percentage points to model-native units
    pub fn to_native(self, percentage: f64) -> f64 {
        percentage / self.factor()
    }

    /// Persisted interest value as shown to a user
    pub fn interest_to_percentage(self, native: f64) -> f64 {
        native * self.factor()
    }

    /// Persisted inflation value as shown to a user.
    ///
    /// Only magnitudes below one are rescaled; a monthly inflation already
    /// above 1 is taken to be in percentage points.
    pub fn inflation_to_percentage(self, native: f64) -> f64 {
        match self {
            Self::Decimal if native.abs() < 1.0 => native * 100.0,
            _ => native,
        }
    }
}

/// Units of the target variable (`target_lag_1` and the model output)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetUnits {
    /// 3.0 means a 3% default rate
    #[default]
    Percentage,
    /// 0.03 means a 3% default rate
    Decimal,
}

impl TargetUnits {
    /// Raw model output to percentage points
    pub fn to_percentage(self, native: f64) -> f64 {
        match self {
            Self::Percentage => native,
            Self::Decimal => native * 100.0,
        }
    }

    /// Percentage points back to the model's target units
    pub fn to_native(self, percentage: f64) -> f64 {
        match self {
            Self::Percentage => percentage,
            Self::Decimal => percentage / 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(ScaleMode::detect(0.1075), ScaleMode::Decimal);
        assert_eq!(ScaleMode::detect(0.99), ScaleMode::Decimal);
        assert_eq!(ScaleMode::detect(1.0), ScaleMode::Percentage);
        assert_eq!(ScaleMode::detect(10.75), ScaleMode::Percentage);
        assert_eq!(ScaleMode::detect(f64::NAN), ScaleMode::Percentage);
    }

    #[test]
    fn test_display_conversion() {
        assert!((ScaleMode::Decimal.interest_to_percentage(0.1175) - 11.75).abs() < 1e-12);
        assert_eq!(ScaleMode::Percentage.interest_to_percentage(11.75), 11.75);
        assert!((ScaleMode::Decimal.inflation_to_percentage(0.0045) - 0.45).abs() < 1e-12);
        assert_eq!(ScaleMode::Decimal.inflation_to_percentage(1.2), 1.2);
        assert_eq!(ScaleMode::Decimal.to_native(10.0), 0.1);
    }

    #[test]
    fn test_target_units() {
        assert_eq!(TargetUnits::Percentage.to_percentage(3.2), 3.2);
        assert!((TargetUnits::Decimal.to_percentage(0.032) - 3.2).abs() < 1e-12);
        assert!((TargetUnits::Decimal.to_native(3.2) - 0.032).abs() < 1e-12);
    }
}
