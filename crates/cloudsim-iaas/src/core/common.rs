use serde::Serialize;

/// Resources requested by a VM from a host.
#[derive(Serialize, Clone, Debug)]
pub struct Allocation {
    pub vm_id: u32,
    pub pes: u32,
    pub mips: f64,
    pub ram: u64,
    pub bw: u64,
    pub size: u64,
}

/// Result of checking whether an allocation fits a host.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocationVerdict {
    NotEnoughPes,
    NotEnoughRam,
    NotEnoughBw,
    NotEnoughStorage,
    HostFailed,
    HostNotFound,
    Success,
}

impl std::fmt::Display for AllocationVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AllocationVerdict::NotEnoughPes => write!(f, "not enough free PEs"),
            AllocationVerdict::NotEnoughRam => write!(f, "not enough RAM"),
            AllocationVerdict::NotEnoughBw => write!(f, "not enough bandwidth"),
            AllocationVerdict::NotEnoughStorage => write!(f, "not enough storage"),
            AllocationVerdict::HostFailed => write!(f, "host is failed"),
            AllocationVerdict::HostNotFound => write!(f, "host not found"),
            AllocationVerdict::Success => write!(f, "success"),
        }
    }
}
