//! Worst Fit policy.

use crate::core::common::{Allocation, AllocationVerdict};
use crate::core::host::Host;
use crate::core::vm_allocation_policy::VmAllocationPolicy;

/// Uses the suitable host with the most free PEs, ties go to the lower host id.
#[derive(Default)]
pub struct WorstFit;

impl WorstFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl VmAllocationPolicy for WorstFit {
    fn select_host(&self, alloc: &Allocation, hosts: &[Host]) -> Option<u32> {
        let mut result: Option<u32> = None;
        let mut max_free_pes = 0;

        for host in hosts {
            if host.can_allocate(alloc) == AllocationVerdict::Success
                && (result.is_none() || host.free_pes() > max_free_pes)
            {
                max_free_pes = host.free_pes();
                result = Some(host.id);
            }
        }
        result
    }
}
