//! Cloudlet, a unit of computation with a fixed length.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use cloudsim_core::Id;
use cloudsim_models::utilization::utilization_model::UtilizationModel;
use cloudsim_models::utilization::utilization_models::full::UtilizationModelFull;

use crate::core::error::SimulationError;

/// Remaining length (in MI) below which a cloudlet is considered complete.
pub const LENGTH_EPSILON: f64 = 1e-6;

/// Cloudlet lifecycle status.
///
/// Statuses only move forward: `Instantiated < Queued < Running/Paused < Finished/Failed/Canceled`.
/// The only way back is `Paused -> Running`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CloudletStatus {
    Instantiated,
    Queued,
    Running,
    Paused,
    Finished,
    Failed,
    Canceled,
}

impl CloudletStatus {
    fn rank(&self) -> u8 {
        match self {
            CloudletStatus::Instantiated => 0,
            CloudletStatus::Queued => 1,
            CloudletStatus::Running | CloudletStatus::Paused => 2,
            CloudletStatus::Finished | CloudletStatus::Failed | CloudletStatus::Canceled => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 3
    }

    pub fn can_transition_to(&self, next: CloudletStatus) -> bool {
        match (self, next) {
            (CloudletStatus::Running, CloudletStatus::Paused) | (CloudletStatus::Paused, CloudletStatus::Running) => {
                true
            }
            (from, CloudletStatus::Finished) => *from == CloudletStatus::Running,
            (from, to) => from.rank() < to.rank(),
        }
    }
}

impl std::fmt::Display for CloudletStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CloudletStatus::Instantiated => write!(f, "INSTANTIATED"),
            CloudletStatus::Queued => write!(f, "QUEUED"),
            CloudletStatus::Running => write!(f, "RUNNING"),
            CloudletStatus::Paused => write!(f, "PAUSED"),
            CloudletStatus::Finished => write!(f, "SUCCESS"),
            CloudletStatus::Failed => write!(f, "FAILED"),
            CloudletStatus::Canceled => write!(f, "CANCELED"),
        }
    }
}

impl Serialize for CloudletStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}", self))
    }
}

/// A task with fixed length in millions of instructions (MI).
///
/// Resource usage over time is described by utilization models for CPU, RAM and bandwidth.
/// The CPU model scales the share of VM PEs requested by the cloudlet.
#[derive(Clone)]
pub struct Cloudlet {
    pub id: u32,
    /// Length in MI per PE.
    pub length: f64,
    pub pes: u32,
    pub file_size: u64,
    pub output_size: u64,
    pub utilization_cpu: Box<dyn UtilizationModel>,
    pub utilization_ram: Box<dyn UtilizationModel>,
    pub utilization_bw: Box<dyn UtilizationModel>,

    pub vm_id: Option<u32>,
    pub broker_id: Option<Id>,
    pub datacenter_id: Option<Id>,
    pub host_id: Option<u32>,

    status: CloudletStatus,
    remaining_length: f64,
    submission_time: Option<f64>,
    start_time: Option<f64>,
    finish_time: Option<f64>,
    cost: f64,
}

impl std::fmt::Debug for Cloudlet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cloudlet")
            .field("id", &self.id)
            .field("length", &self.length)
            .field("pes", &self.pes)
            .field("file_size", &self.file_size)
            .field("output_size", &self.output_size)
            .field("vm_id", &self.vm_id)
            .field("broker_id", &self.broker_id)
            .field("datacenter_id", &self.datacenter_id)
            .field("host_id", &self.host_id)
            .field("status", &self.status)
            .field("remaining_length", &self.remaining_length)
            .field("submission_time", &self.submission_time)
            .field("start_time", &self.start_time)
            .field("finish_time", &self.finish_time)
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl Cloudlet {
    /// Creates a cloudlet with full utilization of all resources.
    pub fn new(id: u32, length: f64, pes: u32, file_size: u64, output_size: u64) -> Self {
        Self::with_models(
            id,
            length,
            pes,
            file_size,
            output_size,
            Box::new(UtilizationModelFull::new()),
            Box::new(UtilizationModelFull::new()),
            Box::new(UtilizationModelFull::new()),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_models(
        id: u32,
        length: f64,
        pes: u32,
        file_size: u64,
        output_size: u64,
        utilization_cpu: Box<dyn UtilizationModel>,
        utilization_ram: Box<dyn UtilizationModel>,
        utilization_bw: Box<dyn UtilizationModel>,
    ) -> Self {
        Self {
            id,
            length,
            pes,
            file_size,
            output_size,
            utilization_cpu,
            utilization_ram,
            utilization_bw,
            vm_id: None,
            broker_id: None,
            datacenter_id: None,
            host_id: None,
            status: CloudletStatus::Instantiated,
            remaining_length: length * pes as f64,
            submission_time: None,
            start_time: None,
            finish_time: None,
            cost: 0.,
        }
    }

    /// Checks that the cloudlet can be executed at all.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let reason = if !(self.length.is_finite() && self.length > 0.) {
            "length must be positive"
        } else if self.pes == 0 {
            "at least one PE is required"
        } else if self.status != CloudletStatus::Instantiated {
            "cloudlet was already submitted"
        } else {
            return Ok(());
        };
        Err(SimulationError::InvalidSpec {
            entity: "cloudlet",
            id: self.id,
            reason: reason.to_string(),
        })
    }

    pub fn status(&self) -> CloudletStatus {
        self.status
    }

    /// Moves the cloudlet to a new status, recording timestamps.
    pub fn set_status(&mut self, status: CloudletStatus, time: f64) -> Result<(), SimulationError> {
        if !self.status.can_transition_to(status) {
            return Err(SimulationError::InvalidTransition {
                cloudlet_id: self.id,
                from: self.status,
                to: status,
            });
        }
        match status {
            CloudletStatus::Queued => {
                self.submission_time = Some(time);
            }
            CloudletStatus::Running => {
                if self.start_time.is_none() {
                    self.start_time = Some(time);
                }
            }
            CloudletStatus::Finished => {
                self.remaining_length = 0.;
                self.finish_time = Some(time);
            }
            CloudletStatus::Failed | CloudletStatus::Canceled => {
                self.finish_time = Some(time);
            }
            CloudletStatus::Instantiated | CloudletStatus::Paused => {}
        }
        self.status = status;
        Ok(())
    }

    /// Total remaining work in MI over all PEs.
    pub fn remaining_length(&self) -> f64 {
        self.remaining_length
    }

    /// Total work in MI over all PEs.
    pub fn total_length(&self) -> f64 {
        self.length * self.pes as f64
    }

    /// Subtracts executed instructions from the remaining length, non-finite or negative amounts are ignored.
    pub fn advance(&mut self, executed: f64) {
        if !executed.is_finite() || executed <= 0. {
            return;
        }
        self.remaining_length = (self.remaining_length - executed).max(0.);
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_length <= LENGTH_EPSILON
    }

    pub fn submission_time(&self) -> Option<f64> {
        self.submission_time
    }

    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn finish_time(&self) -> Option<f64> {
        self.finish_time
    }

    /// Time between the first execution start and the finish.
    pub fn actual_cpu_time(&self) -> f64 {
        match (self.start_time, self.finish_time) {
            (Some(start), Some(finish)) => finish - start,
            _ => 0.,
        }
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn set_cost(&mut self, cost: f64) {
        self.cost = cost;
    }
}

impl Serialize for Cloudlet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Cloudlet", 9)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("length", &self.length)?;
        state.serialize_field("pes", &self.pes)?;
        state.serialize_field("vm_id", &self.vm_id)?;
        state.serialize_field("host_id", &self.host_id)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("remaining_length", &self.remaining_length)?;
        state.serialize_field("start_time", &self.start_time)?;
        state.serialize_field("finish_time", &self.finish_time)?;
        state.end()
    }
}
