//! Virtual machine.

use serde::{Deserialize, Serialize};

use cloudsim_core::Id;

use crate::core::cloudlet_scheduler::{cloudlet_scheduler_resolver, CloudletScheduler, CloudletSchedulerKind};
use crate::core::common::Allocation;
use crate::core::error::SimulationError;

/// VM parameters requested by a broker.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VmSpec {
    pub id: u32,
    /// Requested MIPS of each PE.
    pub mips: f64,
    pub pes: u32,
    /// RAM in MB.
    pub ram: u64,
    pub bw: u64,
    /// Image size in MB, reserved from host storage.
    pub size: u64,
    pub vmm: String,
    pub scheduler: CloudletSchedulerKind,
}

impl VmSpec {
    pub fn new(id: u32, mips: f64, pes: u32, ram: u64, bw: u64, size: u64) -> Self {
        Self {
            id,
            mips,
            pes,
            ram,
            bw,
            size,
            vmm: "Xen".to_string(),
            scheduler: CloudletSchedulerKind::TimeShared,
        }
    }

    pub fn with_scheduler(mut self, scheduler: CloudletSchedulerKind) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let reason = if !(self.mips.is_finite() && self.mips > 0.) {
            "mips must be positive"
        } else if self.pes == 0 {
            "at least one PE is required"
        } else {
            return Ok(());
        };
        Err(SimulationError::InvalidSpec {
            entity: "vm",
            id: self.id,
            reason: reason.to_string(),
        })
    }

    pub fn allocation(&self) -> Allocation {
        Allocation {
            vm_id: self.id,
            pes: self.pes,
            mips: self.mips,
            ram: self.ram,
            bw: self.bw,
            size: self.size,
        }
    }
}

/// Status of a VM as seen by its broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VmStatus {
    Requested,
    Running,
    FailedToAllocate,
    Failed,
    Destroyed,
}

impl std::fmt::Display for VmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            VmStatus::Requested => write!(f, "requested"),
            VmStatus::Running => write!(f, "running"),
            VmStatus::FailedToAllocate => write!(f, "failed_to_allocate"),
            VmStatus::Failed => write!(f, "failed"),
            VmStatus::Destroyed => write!(f, "destroyed"),
        }
    }
}

impl Serialize for VmStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{}", self))
    }
}

/// A VM placed on a host, executes cloudlets with its scheduler.
pub struct VirtualMachine {
    pub spec: VmSpec,
    pub broker_id: Id,
    pub host_id: u32,
    /// PEs of the host reserved by this VM.
    pub pe_ids: Vec<u32>,
    pub created_at: f64,
    scheduler: Box<dyn CloudletScheduler>,
}

impl VirtualMachine {
    pub fn new(spec: VmSpec, broker_id: Id, host_id: u32, created_at: f64) -> Self {
        let scheduler = cloudlet_scheduler_resolver(spec.scheduler, spec.id, spec.mips, spec.pes);
        Self {
            spec,
            broker_id,
            host_id,
            pe_ids: Vec::new(),
            created_at,
            scheduler,
        }
    }

    pub fn id(&self) -> u32 {
        self.spec.id
    }

    pub fn total_mips(&self) -> f64 {
        self.spec.mips * self.spec.pes as f64
    }

    pub fn scheduler(&self) -> &dyn CloudletScheduler {
        self.scheduler.as_ref()
    }

    pub fn scheduler_mut(&mut self) -> &mut dyn CloudletScheduler {
        self.scheduler.as_mut()
    }
}
