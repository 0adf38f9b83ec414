//! Best Fit policy.

use crate::core::common::{Allocation, AllocationVerdict};
use crate::core::host::Host;
use crate::core::vm_allocation_policy::VmAllocationPolicy;

/// Uses the suitable host with the fewest free PEs, ties go to the lower host id.
#[derive(Default)]
pub struct BestFit;

impl BestFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl VmAllocationPolicy for BestFit {
    fn select_host(&self, alloc: &Allocation, hosts: &[Host]) -> Option<u32> {
        let mut result: Option<u32> = None;
        let mut min_free_pes = u32::MAX;

        for host in hosts {
            if host.can_allocate(alloc) == AllocationVerdict::Success && host.free_pes() < min_free_pes {
                min_free_pes = host.free_pes();
                result = Some(host.id);
            }
        }
        result
    }
}
