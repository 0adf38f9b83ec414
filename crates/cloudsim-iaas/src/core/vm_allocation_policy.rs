//! VM allocation policies.

use crate::core::common::Allocation;
use crate::core::config::options::parse_config_value;
use crate::core::error::SimulationError;
use crate::core::host::Host;
use crate::core::vm_allocation_policies::best_fit::BestFit;
use crate::core::vm_allocation_policies::first_fit::FirstFit;
use crate::core::vm_allocation_policies::worst_fit::WorstFit;

/// Trait for implementation of VM allocation policies.
///
/// The policy is defined as a function of VM allocation request and current hosts state, which returns an
/// ID of host selected for VM placement or `None` if there is no suitable host.
///
/// Hosts are passed in ascending id order. Policies must be deterministic.
pub trait VmAllocationPolicy {
    fn select_host(&self, alloc: &Allocation, hosts: &[Host]) -> Option<u32>;
}

/// Creates a policy from its config name, e.g. `FirstFit` or `BestFit`.
pub fn allocation_policy_resolver(config_str: &str) -> Result<Box<dyn VmAllocationPolicy>, SimulationError> {
    let (policy_name, _options) = parse_config_value(config_str);
    match policy_name.as_str() {
        "FirstFit" => Ok(Box::new(FirstFit::new())),
        "BestFit" => Ok(Box::new(BestFit::new())),
        "WorstFit" => Ok(Box::new(WorstFit::new())),
        _ => Err(SimulationError::Config(format!("unknown allocation policy: {}", config_str))),
    }
}
