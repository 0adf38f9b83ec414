use cloudsim_core::Id;

use crate::core::host::{Host, HostSpec, UtilizationMetric};
use crate::core::vm::{VirtualMachine, VmSpec};
use crate::core::vm_allocation_policy::allocation_policy_resolver;

const BROKER: Id = 0;

// host 0 has 1 free PE, host 1 has 4 free PEs, host 2 has 2 free PEs
fn hosts() -> Vec<Host> {
    let mut hosts: Vec<Host> = (0..3)
        .map(|id| Host::new(id, HostSpec::new(4, 1000., 8192, 10000, 100_000), UtilizationMetric::PeCount))
        .collect();
    hosts[0]
        .allocate(VirtualMachine::new(VmSpec::new(100, 1000., 3, 1024, 100, 100), BROKER, 0, 0.))
        .unwrap();
    hosts[2]
        .allocate(VirtualMachine::new(VmSpec::new(101, 1000., 2, 1024, 100, 100), BROKER, 2, 0.))
        .unwrap();
    hosts
}

#[test]
fn test_first_fit() {
    let policy = allocation_policy_resolver("FirstFit").unwrap();
    let hosts = hosts();
    assert_eq!(policy.select_host(&VmSpec::new(0, 1000., 1, 1, 1, 1).allocation(), &hosts), Some(0));
    assert_eq!(policy.select_host(&VmSpec::new(0, 1000., 2, 1, 1, 1).allocation(), &hosts), Some(1));
    assert_eq!(policy.select_host(&VmSpec::new(0, 1000., 5, 1, 1, 1).allocation(), &hosts), None);
}

#[test]
fn test_best_fit() {
    let policy = allocation_policy_resolver("BestFit").unwrap();
    let hosts = hosts();
    assert_eq!(policy.select_host(&VmSpec::new(0, 1000., 1, 1, 1, 1).allocation(), &hosts), Some(0));
    assert_eq!(policy.select_host(&VmSpec::new(0, 1000., 2, 1, 1, 1).allocation(), &hosts), Some(2));
    assert_eq!(policy.select_host(&VmSpec::new(0, 1000., 3, 1, 1, 1).allocation(), &hosts), Some(1));
}

#[test]
fn test_worst_fit() {
    let policy = allocation_policy_resolver("WorstFit").unwrap();
    let hosts = hosts();
    assert_eq!(policy.select_host(&VmSpec::new(0, 1000., 1, 1, 1, 1).allocation(), &hosts), Some(1));
    let empty: Vec<Host> = (0..2)
        .map(|id| Host::new(id, HostSpec::new(2, 1000., 1024, 100, 100), UtilizationMetric::PeCount))
        .collect();
    assert_eq!(policy.select_host(&VmSpec::new(0, 1000., 1, 1, 1, 1).allocation(), &empty), Some(0));
}

#[test]
fn test_unknown_policy() {
    assert!(allocation_policy_resolver("RoundRobin").is_err());
}
