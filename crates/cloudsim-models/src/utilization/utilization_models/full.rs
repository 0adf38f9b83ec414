//! Full utilization model.

use crate::utilization::utilization_model::UtilizationModel;

/// A cloudlet always uses all of the resource allocated to it.
#[derive(Clone, Default)]
pub struct UtilizationModelFull;

impl UtilizationModelFull {
    /// Creates the model.
    pub fn new() -> Self {
        Self
    }
}

impl UtilizationModel for UtilizationModelFull {
    fn get_utilization(&self, _time: f64) -> f64 {
        1.
    }

    fn is_constant_after(&self, _time: f64) -> bool {
        true
    }
}
