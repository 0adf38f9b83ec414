//! Datacenter characteristics.

use serde::{Deserialize, Serialize};

/// Descriptive datacenter properties and resource prices.
///
/// Only `cost_per_second` takes part in the simulation, it is used to compute cloudlet processing cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatacenterCharacteristics {
    pub architecture: String,
    pub os: String,
    pub vmm: String,
    pub time_zone: f64,
    /// Price of using one host PE per second.
    pub cost_per_second: f64,
    /// Price of one MB of memory.
    pub cost_per_memory: f64,
    /// Price of one MB of storage.
    pub cost_per_storage: f64,
    /// Price of one unit of bandwidth.
    pub cost_per_bw: f64,
}

impl Default for DatacenterCharacteristics {
    fn default() -> Self {
        Self {
            architecture: "x86".to_string(),
            os: "Linux".to_string(),
            vmm: "Xen".to_string(),
            time_zone: 10.0,
            cost_per_second: 3.0,
            cost_per_memory: 0.05,
            cost_per_storage: 0.001,
            cost_per_bw: 0.0,
        }
    }
}
