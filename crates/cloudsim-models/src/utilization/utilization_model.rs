//! Utilization model trait.

use dyn_clone::{clone_trait_object, DynClone};

/// A utilization model is a function which defines what fraction of a resource a cloudlet uses at the given time.
///
/// The returned value is expected to be in 0.0-1.0 range.
/// Querying the same time twice must return the same value.
pub trait UtilizationModel: DynClone {
    /// Returns the resource utilization at the given simulation time.
    fn get_utilization(&self, time: f64) -> f64;

    /// Returns `true` if the utilization never changes after the given time.
    ///
    /// Used to stop periodic updates of cloudlets that can no longer make progress.
    fn is_constant_after(&self, _time: f64) -> bool {
        false
    }
}

clone_trait_object!(UtilizationModel);
