//! Square power model.

use crate::power::power_model::{normalize_utilization, PowerModel, PowerModelError};

/// A power model where power grows as a square of utilization.
///
/// `P(u) = static + (max - static) * u^2`
#[derive(Clone)]
pub struct SquarePowerModel {
    static_power: f64,
    max_power: f64,
}

impl SquarePowerModel {
    /// Creates a square power model.
    pub fn new(static_power: f64, max_power: f64) -> Self {
        Self {
            static_power,
            max_power,
        }
    }
}

impl PowerModel for SquarePowerModel {
    fn get_power(&self, utilization: f64) -> Result<f64, PowerModelError> {
        let u = normalize_utilization(utilization)?;
        Ok(self.static_power + (self.max_power - self.static_power) * u.powi(2))
    }

    fn static_power(&self) -> f64 {
        self.static_power
    }

    fn max_power(&self) -> f64 {
        self.max_power
    }
}
