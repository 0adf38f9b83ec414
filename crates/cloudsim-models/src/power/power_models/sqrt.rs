//! Square root power model.

use crate::power::power_model::{normalize_utilization, PowerModel, PowerModelError};

/// A power model where power grows fast at low utilization and saturates near the maximum.
///
/// `P(u) = static + (max - static) * sqrt(u)`
#[derive(Clone)]
pub struct SqrtPowerModel {
    static_power: f64,
    max_power: f64,
}

impl SqrtPowerModel {
    /// Creates a square root power model.
    pub fn new(static_power: f64, max_power: f64) -> Self {
        Self {
            static_power,
            max_power,
        }
    }
}

impl PowerModel for SqrtPowerModel {
    fn get_power(&self, utilization: f64) -> Result<f64, PowerModelError> {
        let u = normalize_utilization(utilization)?;
        Ok(self.static_power + (self.max_power - self.static_power) * u.sqrt())
    }

    fn static_power(&self) -> f64 {
        self.static_power
    }

    fn max_power(&self) -> f64 {
        self.max_power
    }
}
