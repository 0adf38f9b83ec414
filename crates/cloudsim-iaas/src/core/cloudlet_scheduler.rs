//! Cloudlet schedulers decide how cloudlets share the PEs of a VM.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use cloudsim_models::utilization::utilization_model::UtilizationModel;

use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::cloudlet_schedulers::space_shared::SpaceSharedScheduler;
use crate::core::cloudlet_schedulers::time_shared::TimeSharedScheduler;
use crate::core::error::SimulationError;

/// Trait for implementation of cloudlet scheduling policies inside a VM.
///
/// The datacenter calls [`update_processing`](CloudletScheduler::update_processing) before any other
/// method with the same time, so that the progress made with the previous shares is accounted first.
pub trait CloudletScheduler {
    /// Integrates executed instructions since the last update, completes finished cloudlets
    /// and recomputes shares of the remaining ones.
    fn update_processing(&mut self, time: f64);

    /// Accepts a new cloudlet.
    ///
    /// The cloudlet is rejected if it can never run on this VM.
    fn submit(&mut self, cloudlet: Cloudlet, time: f64) -> Result<(), (Box<Cloudlet>, SimulationError)>;

    /// Removes the cloudlet and returns it in `Canceled` status.
    fn cancel(&mut self, cloudlet_id: u32, time: f64) -> Result<Cloudlet, SimulationError>;

    /// Suspends a running or queued cloudlet, keeping its progress.
    fn pause(&mut self, cloudlet_id: u32, time: f64) -> Result<(), SimulationError>;

    /// Continues a paused cloudlet.
    fn resume(&mut self, cloudlet_id: u32, time: f64) -> Result<(), SimulationError>;

    /// Returns cloudlets finished since the previous call, in ascending id order.
    fn take_finished(&mut self) -> Vec<Cloudlet>;

    /// Removes all unfinished cloudlets and returns them in `Failed` status.
    fn fail_all(&mut self, time: f64) -> Vec<Cloudlet>;

    /// Returns the earliest estimated completion time among running cloudlets.
    fn next_completion_time(&self) -> Option<f64>;

    /// Returns MIPS currently used by running cloudlets.
    fn allocated_mips(&self) -> f64;

    /// Returns the number of cloudlets which are running, waiting or paused.
    fn active_count(&self) -> usize;

    /// Returns `true` if some running cloudlet executes at a positive rate
    /// or may get one later because its CPU utilization still changes after `time`.
    fn is_progressing(&self, time: f64) -> bool;

    /// Returns cloudlets which are running, waiting or paused, in ascending id order.
    fn unfinished(&self) -> Vec<&Cloudlet>;

    /// Returns the share of VM RAM requested by running cloudlets.
    fn ram_utilization(&self, time: f64) -> f64;

    /// Returns the share of VM bandwidth requested by running cloudlets.
    fn bw_utilization(&self, time: f64) -> f64;
}

/// Supported scheduling policies, used in VM specs and configs.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CloudletSchedulerKind {
    #[default]
    TimeShared,
    SpaceShared,
}

/// Creates a scheduler of the given kind for a VM with `pes` PEs of `mips` MIPS each.
pub fn cloudlet_scheduler_resolver(
    kind: CloudletSchedulerKind,
    vm_id: u32,
    mips: f64,
    pes: u32,
) -> Box<dyn CloudletScheduler> {
    match kind {
        CloudletSchedulerKind::TimeShared => Box::new(TimeSharedScheduler::new(vm_id, mips, pes)),
        CloudletSchedulerKind::SpaceShared => Box::new(SpaceSharedScheduler::new(vm_id, mips, pes)),
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Returns the model value at `time` clamped to 0.0-1.0 range, NaN counts as 0.
pub(crate) fn bounded_utilization(model: &dyn UtilizationModel, time: f64) -> f64 {
    let utilization = model.get_utilization(time);
    if utilization.is_nan() {
        0.
    } else {
        utilization.clamp(0., 1.)
    }
}

/// A cloudlet in execution with its current rate.
pub(crate) struct RunningCloudlet {
    pub cloudlet: Cloudlet,
    /// Current execution rate in MIPS summed over all PEs.
    pub mips: f64,
}

/// Bookkeeping shared by scheduling policies: cloudlet lists and progress integration.
pub(crate) struct ExecutionState {
    pub vm_id: u32,
    pub vm_mips: f64,
    pub vm_pes: u32,
    pub running: Vec<RunningCloudlet>,
    pub waiting: VecDeque<Cloudlet>,
    pub paused: Vec<Cloudlet>,
    pub finished: Vec<Cloudlet>,
    pub last_update: f64,
}

impl ExecutionState {
    pub fn new(vm_id: u32, vm_mips: f64, vm_pes: u32) -> Self {
        Self {
            vm_id,
            vm_mips,
            vm_pes,
            running: Vec::new(),
            waiting: VecDeque::new(),
            paused: Vec::new(),
            finished: Vec::new(),
            last_update: 0.,
        }
    }

    /// Advances running cloudlets to `time` with their current rates and moves complete ones to finished list.
    pub fn advance(&mut self, time: f64) {
        let elapsed = (time - self.last_update).max(0.);
        self.last_update = self.last_update.max(time);
        let mut i = 0;
        while i < self.running.len() {
            let entry = &mut self.running[i];
            entry.cloudlet.advance(elapsed * entry.mips);
            let due = entry.mips > 0. && time + entry.cloudlet.remaining_length() / entry.mips <= time;
            if entry.cloudlet.is_complete() || due {
                let mut done = self.running.remove(i).cloudlet;
                // Running -> Finished is always allowed
                let _ = done.set_status(CloudletStatus::Finished, time);
                self.finished.push(done);
            } else {
                i += 1;
            }
        }
        self.finished.sort_by_key(|c| c.id);
    }

    pub fn take_finished(&mut self) -> Vec<Cloudlet> {
        std::mem::take(&mut self.finished)
    }

    pub fn next_completion_time(&self) -> Option<f64> {
        self.running
            .iter()
            .filter(|e| e.mips > 0.)
            .map(|e| self.last_update + e.cloudlet.remaining_length() / e.mips)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn allocated_mips(&self) -> f64 {
        self.running.iter().map(|e| e.mips).sum()
    }

    pub fn active_count(&self) -> usize {
        self.running.len() + self.waiting.len() + self.paused.len()
    }

    pub fn is_progressing(&self, time: f64) -> bool {
        self.running
            .iter()
            .any(|e| e.mips > 0. || !e.cloudlet.utilization_cpu.is_constant_after(time))
    }

    pub fn unfinished(&self) -> Vec<&Cloudlet> {
        let mut cloudlets: Vec<&Cloudlet> = self.running.iter().map(|e| &e.cloudlet).collect();
        cloudlets.extend(self.waiting.iter());
        cloudlets.extend(self.paused.iter());
        cloudlets.sort_by_key(|c| c.id);
        cloudlets
    }

    /// Removes the cloudlet from any list and returns it with its previous status.
    pub fn remove(&mut self, cloudlet_id: u32) -> Option<Cloudlet> {
        if let Some(pos) = self.running.iter().position(|e| e.cloudlet.id == cloudlet_id) {
            return Some(self.running.remove(pos).cloudlet);
        }
        if let Some(pos) = self.waiting.iter().position(|c| c.id == cloudlet_id) {
            return self.waiting.remove(pos);
        }
        if let Some(pos) = self.paused.iter().position(|c| c.id == cloudlet_id) {
            return Some(self.paused.remove(pos));
        }
        None
    }

    pub fn cancel(&mut self, cloudlet_id: u32, time: f64) -> Result<Cloudlet, SimulationError> {
        let mut cloudlet = self.remove(cloudlet_id).ok_or_else(|| self.not_found(cloudlet_id))?;
        cloudlet.set_status(CloudletStatus::Canceled, time)?;
        Ok(cloudlet)
    }

    /// Moves a running or waiting cloudlet to the paused list.
    pub fn pause(&mut self, cloudlet_id: u32, time: f64) -> Result<(), SimulationError> {
        if let Some(pos) = self.running.iter().position(|e| e.cloudlet.id == cloudlet_id) {
            let mut cloudlet = self.running.remove(pos).cloudlet;
            cloudlet.set_status(CloudletStatus::Paused, time)?;
            self.paused.push(cloudlet);
            return Ok(());
        }
        if let Some(pos) = self.waiting.iter().position(|c| c.id == cloudlet_id) {
            let status = self.waiting[pos].status();
            if !status.can_transition_to(CloudletStatus::Paused) {
                return Err(SimulationError::InvalidTransition {
                    cloudlet_id,
                    from: status,
                    to: CloudletStatus::Paused,
                });
            }
            if let Some(mut cloudlet) = self.waiting.remove(pos) {
                cloudlet.set_status(CloudletStatus::Paused, time)?;
                self.paused.push(cloudlet);
            }
            return Ok(());
        }
        Err(self.not_found(cloudlet_id))
    }

    /// Removes a paused cloudlet so that the policy can reschedule it.
    pub fn take_paused(&mut self, cloudlet_id: u32) -> Result<Cloudlet, SimulationError> {
        let pos = self
            .paused
            .iter()
            .position(|c| c.id == cloudlet_id)
            .ok_or_else(|| self.not_found(cloudlet_id))?;
        Ok(self.paused.remove(pos))
    }

    pub fn fail_all(&mut self, time: f64) -> Vec<Cloudlet> {
        let mut failed: Vec<Cloudlet> = self.running.drain(..).map(|e| e.cloudlet).collect();
        failed.extend(self.waiting.drain(..));
        failed.extend(self.paused.drain(..));
        for cloudlet in failed.iter_mut() {
            // unfinished cloudlets can always fail
            let _ = cloudlet.set_status(CloudletStatus::Failed, time);
        }
        failed.sort_by_key(|c| c.id);
        failed
    }

    pub fn ram_utilization(&self, time: f64) -> f64 {
        self.running
            .iter()
            .map(|e| bounded_utilization(e.cloudlet.utilization_ram.as_ref(), time))
            .sum::<f64>()
            .min(1.)
    }

    pub fn bw_utilization(&self, time: f64) -> f64 {
        self.running
            .iter()
            .map(|e| bounded_utilization(e.cloudlet.utilization_bw.as_ref(), time))
            .sum::<f64>()
            .min(1.)
    }

    fn not_found(&self, cloudlet_id: u32) -> SimulationError {
        SimulationError::SchedulingViolation {
            cloudlet_id,
            vm_id: self.vm_id,
            reason: "cloudlet is not active on this vm".to_string(),
        }
    }
}
