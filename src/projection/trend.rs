//! Macroeconomic trend slopes applied over the projection horizon

use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};

/// Largest accepted interest slope, percentage points per month
pub const MAX_INTEREST_TREND: f64 = 5.0;

/// Largest accepted inflation slope, percentage points per month
pub const MAX_INFLATION_TREND: f64 = 2.0;

/// Largest accepted exchange-rate slope, currency units per month
pub const MAX_CURRENCY_TREND: f64 = 5.0;

/// Per-month slopes. Step `i` offsets the original baseline by
/// `slope * (i + 1)`; slopes never compound on the previous step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendParams {
    /// Interest rate, pp per month
    #[serde(default)]
    pub interest: f64,
    /// Monthly inflation, pp per month
    #[serde(default)]
    pub inflation: f64,
    /// Exchange rate, currency units per month
    #[serde(default)]
    pub currency: f64,
}

/// Reading of the interest-rate trend for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendOutlook {
    /// Rates falling: optimistic for defaults
    Easing,
    Stable,
    /// Rates rising: pessimistic for defaults
    Tightening,
}

impl TrendParams {
    pub fn new(interest: f64, inflation: f64, currency: f64) -> Self {
        Self { interest, inflation, currency }
    }

    /// No macro drift at all
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.interest == 0.0 && self.inflation == 0.0 && self.currency == 0.0
    }

    /// Cumulative offset after `step` (0-based) for a slope
    pub fn offset(slope: f64, step: usize) -> f64 {
        slope * (step + 1) as f64
    }

    pub fn outlook(&self) -> TrendOutlook {
        if self.interest < 0.0 {
            TrendOutlook::Easing
        } else if self.interest > 0.0 {
            TrendOutlook::Tightening
        } else {
            TrendOutlook::Stable
        }
    }

    /// Reject non-finite or implausibly steep slopes.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("interest", self.interest, MAX_INTEREST_TREND),
            ("inflation", self.inflation, MAX_INFLATION_TREND),
            ("currency", self.currency, MAX_CURRENCY_TREND),
        ];
        for (name, slope, limit) in checks {
            if !slope.is_finite() {
                return Err(SimulationError::out_of_range(format!("{name} trend is not finite")));
            }
            if slope.abs() > limit {
                return Err(SimulationError::out_of_range(format!(
                    "{name} trend {slope} exceeds ±{limit} per month"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_linear() {
        assert_eq!(TrendParams::offset(0.25, 0), 0.25);
        assert_eq!(TrendParams::offset(0.25, 3), 1.0);
        assert_eq!(TrendParams::offset(-0.5, 17), -9.0);
    }

    #[test]
    fn test_validate() {
        assert!(TrendParams::new(0.5, -0.2, 0.05).validate().is_ok());
        assert!(TrendParams::new(5.5, 0.0, 0.0).validate().is_err());
        assert!(TrendParams::new(0.0, f64::NAN, 0.0).validate().is_err());
        assert!(TrendParams::new(0.0, 0.0, -6.0).validate().is_err());
    }

    #[test]
    fn test_outlook() {
        assert!(TrendParams::flat().is_flat());
        assert_eq!(TrendParams::flat().outlook(), TrendOutlook::Stable);
        assert_eq!(TrendParams::new(-0.1, 0.0, 0.0).outlook(), TrendOutlook::Easing);
        assert_eq!(TrendParams::new(0.1, 0.0, 0.0).outlook(), TrendOutlook::Tightening);
    }
}
