//! Linear power model.

use crate::power::power_model::{normalize_utilization, PowerModel, PowerModelError};

/// A power model based on linear interpolation between the static and maximum power consumption values.
///
/// `P(u) = static + (max - static) * u`
#[derive(Clone)]
pub struct LinearPowerModel {
    static_power: f64,
    max_power: f64,
    factor: f64,
}

impl LinearPowerModel {
    /// Creates a linear power model.
    ///
    /// * `static_power` - The power consumption in Watts at 0% utilization.
    /// * `max_power` - The power consumption in Watts at 100% utilization.
    pub fn new(static_power: f64, max_power: f64) -> Self {
        Self {
            static_power,
            max_power,
            factor: max_power - static_power,
        }
    }
}

impl PowerModel for LinearPowerModel {
    fn get_power(&self, utilization: f64) -> Result<f64, PowerModelError> {
        let u = normalize_utilization(utilization)?;
        // endpoints are returned as is to avoid rounding errors
        if u == 0. {
            return Ok(self.static_power);
        }
        if u == 1. {
            return Ok(self.max_power);
        }
        Ok(self.static_power + self.factor * u)
    }

    fn static_power(&self) -> f64 {
        self.static_power
    }

    fn max_power(&self) -> f64 {
        self.max_power
    }
}
