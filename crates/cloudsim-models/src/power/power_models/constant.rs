//! Constant power model.

use crate::power::power_model::{normalize_utilization, PowerModel, PowerModelError};

/// A power model which returns the same value regardless of utilization.
#[derive(Clone)]
pub struct ConstantPowerModel {
    power: f64,
}

impl ConstantPowerModel {
    /// Creates a constant power model.
    ///
    /// * `power` - The power consumption in Watts.
    pub fn new(power: f64) -> Self {
        Self { power }
    }
}

impl PowerModel for ConstantPowerModel {
    fn get_power(&self, utilization: f64) -> Result<f64, PowerModelError> {
        normalize_utilization(utilization)?;
        Ok(self.power)
    }

    fn static_power(&self) -> f64 {
        self.power
    }

    fn max_power(&self) -> f64 {
        self.power
    }
}
