//! Simulation errors.

use thiserror::Error;

use cloudsim_core::ScheduleError;
use cloudsim_models::power::power_model::PowerModelError;
use cloudsim_models::utilization::utilization_models::trace::TraceError;

use crate::core::cloudlet::CloudletStatus;
use crate::core::common::AllocationVerdict;

/// Errors raised by the datacenter model.
///
/// Capacity and placement errors are recorded in VM and cloudlet status and never abort a run.
/// Spec and config errors are returned before the run starts.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("vm {vm_id} does not fit host {host_id}: {verdict}")]
    InsufficientCapacity {
        vm_id: u32,
        host_id: u32,
        verdict: AllocationVerdict,
    },
    #[error("no suitable host for vm {vm_id}")]
    NoSuitableHost { vm_id: u32 },
    #[error("cloudlet {cloudlet_id} can not run on vm {vm_id}: {reason}")]
    SchedulingViolation {
        cloudlet_id: u32,
        vm_id: u32,
        reason: String,
    },
    #[error("cloudlet {cloudlet_id} can not move from {from} to {to}")]
    InvalidTransition {
        cloudlet_id: u32,
        from: CloudletStatus,
        to: CloudletStatus,
    },
    #[error("power model of host {host_id} failed, static power is used: {source}")]
    PowerModelLookupFailure {
        host_id: u32,
        #[source]
        source: PowerModelError,
    },
    #[error(transparent)]
    InvalidEventSchedule(#[from] ScheduleError),
    #[error("invalid {entity} {id}: {reason}")]
    InvalidSpec {
        entity: &'static str,
        id: u32,
        reason: String,
    },
    #[error("invalid config: {0}")]
    Config(String),
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// A type alias for results of fallible simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;
