//! First Fit policy.

use crate::core::common::{Allocation, AllocationVerdict};
use crate::core::host::Host;
use crate::core::vm_allocation_policy::VmAllocationPolicy;

/// Uses the first suitable host in id order.
#[derive(Default)]
pub struct FirstFit;

impl FirstFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl VmAllocationPolicy for FirstFit {
    fn select_host(&self, alloc: &Allocation, hosts: &[Host]) -> Option<u32> {
        hosts
            .iter()
            .find(|host| host.can_allocate(alloc) == AllocationVerdict::Success)
            .map(|host| host.id)
    }
}
