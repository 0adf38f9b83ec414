//! Empirical power model.

use crate::power::power_model::{normalize_utilization, PowerModel, PowerModelError};

/// Number of measurements expected by [`EmpiricalPowerModel`].
pub const MEASUREMENT_COUNT: usize = 11;

/// A power model based on measurements of actual power consumption at different utilization levels.
///
/// The model uses 11 measurements corresponding to power consumption in W at utilization levels from 0% to 100%
/// with step 10%, such as measurements reported by the
/// [SPECpower benchmark](https://www.spec.org/power_ssj2008/results/).
///
/// The power consumption is computed using linear interpolation between the closest measurements.
/// A table of a wrong size or with non-finite values makes every lookup fail.
#[derive(Clone)]
pub struct EmpiricalPowerModel {
    measurements: Vec<f64>,
}

impl EmpiricalPowerModel {
    /// Creates an empirical power model.
    ///
    /// * `measurements` - Power consumption measurements for utilization levels from 0% to 100% with 10% step.
    pub fn new(measurements: Vec<f64>) -> Self {
        Self { measurements }
    }

    /// Empirical power model for HP ProLiant ML110 G4 server (Intel Xeon 3040) based on SPECpower measurements.
    pub fn hp_proliant_ml110_g4() -> Self {
        Self::new(vec![86., 89.4, 92.6, 96., 99.5, 102., 106., 108., 112., 114., 117.])
    }

    /// Empirical power model for HP ProLiant ML110 G5 server (Intel Xeon 3075) based on SPECpower measurements.
    pub fn hp_proliant_ml110_g5() -> Self {
        Self::new(vec![93.7, 97., 101., 105., 110., 116., 121., 125., 129., 133., 135.])
    }

    fn check_table(&self) -> Result<(), PowerModelError> {
        if self.measurements.len() != MEASUREMENT_COUNT {
            return Err(PowerModelError::MalformedTable(format!(
                "expected {} measurements, got {}",
                MEASUREMENT_COUNT,
                self.measurements.len()
            )));
        }
        if let Some(value) = self.measurements.iter().find(|v| !v.is_finite()) {
            return Err(PowerModelError::MalformedTable(format!(
                "measurement {} is not a finite number",
                value
            )));
        }
        Ok(())
    }
}

impl PowerModel for EmpiricalPowerModel {
    fn get_power(&self, utilization: f64) -> Result<f64, PowerModelError> {
        self.check_table()?;
        let u = normalize_utilization(utilization)?;
        let position = u * 10.;
        let floor_idx = position.floor() as usize;
        let ceil_idx = position.ceil() as usize;
        let floor_power = self.measurements[floor_idx];
        if floor_idx == ceil_idx {
            return Ok(floor_power);
        }
        let ceil_power = self.measurements[ceil_idx];
        Ok(floor_power + (ceil_power - floor_power) * (position - floor_idx as f64))
    }

    fn static_power(&self) -> f64 {
        self.measurements.first().copied().unwrap_or(0.)
    }

    fn max_power(&self) -> f64 {
        self.measurements.last().copied().unwrap_or(0.)
    }
}
