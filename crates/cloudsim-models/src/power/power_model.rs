//! Power model trait.

use dyn_clone::{clone_trait_object, DynClone};
use thiserror::Error;

/// Errors returned by power models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PowerModelError {
    /// Utilization value is NaN or infinite.
    #[error("utilization {0} is not a finite number")]
    InvalidUtilization(f64),
    /// The model is backed by a measurement table which can not be used for interpolation.
    #[error("power table is malformed: {0}")]
    MalformedTable(String),
}

/// A model for estimating the power consumption of a host based on its CPU utilization.
///
/// For every model `get_power(0.)` returns the static (idle) power and `get_power(1.)` returns the maximum power.
pub trait PowerModel: DynClone {
    /// Returns host power consumption in W.
    ///
    /// Utilization should be passed as a float in 0.0-1.0 range, values outside of it are clamped.
    fn get_power(&self, utilization: f64) -> Result<f64, PowerModelError>;

    /// Returns power consumption of idle host in W.
    fn static_power(&self) -> f64;

    /// Returns power consumption of fully utilized host in W.
    fn max_power(&self) -> f64;
}

clone_trait_object!(PowerModel);

/// Rejects non-finite utilization and clamps the rest to 0.0-1.0 range.
pub fn normalize_utilization(utilization: f64) -> Result<f64, PowerModelError> {
    if !utilization.is_finite() {
        return Err(PowerModelError::InvalidUtilization(utilization));
    }
    Ok(utilization.clamp(0., 1.))
}
