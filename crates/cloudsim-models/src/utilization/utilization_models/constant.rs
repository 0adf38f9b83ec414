//! Constant utilization model.

use crate::utilization::utilization_model::UtilizationModel;

/// A cloudlet uses a fixed fraction of the resource for its whole lifetime.
#[derive(Clone)]
pub struct ConstantUtilizationModel {
    utilization: f64,
}

impl ConstantUtilizationModel {
    /// Creates the model, the value is clamped to 0.0-1.0 range and NaN is treated as 0.
    pub fn new(utilization: f64) -> Self {
        let utilization = if utilization.is_nan() { 0. } else { utilization.clamp(0., 1.) };
        Self { utilization }
    }
}

impl UtilizationModel for ConstantUtilizationModel {
    fn get_utilization(&self, _time: f64) -> f64 {
        self.utilization
    }

    fn is_constant_after(&self, _time: f64) -> bool {
        true
    }
}
