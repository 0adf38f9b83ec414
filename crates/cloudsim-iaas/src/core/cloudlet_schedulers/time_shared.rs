//! Time-shared cloudlet scheduler.

use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::cloudlet_scheduler::{bounded_utilization, CloudletScheduler, ExecutionState, RunningCloudlet};
use crate::core::error::SimulationError;

/// All submitted cloudlets run at once and share VM PEs.
///
/// Each cloudlet requests `pes * cpu_utilization(t)` PEs. When the total request exceeds the VM PE count,
/// every request is scaled down by the same factor.
pub struct TimeSharedScheduler {
    state: ExecutionState,
}

impl TimeSharedScheduler {
    pub fn new(vm_id: u32, mips: f64, pes: u32) -> Self {
        Self {
            state: ExecutionState::new(vm_id, mips, pes),
        }
    }

    fn assign_rates(&mut self, time: f64) {
        let demands: Vec<f64> = self
            .state
            .running
            .iter()
            .map(|e| e.cloudlet.pes as f64 * bounded_utilization(e.cloudlet.utilization_cpu.as_ref(), time))
            .collect();
        let total_demand: f64 = demands.iter().sum();
        let capacity = self.state.vm_pes as f64;
        let scale = if total_demand > capacity {
            capacity / total_demand
        } else {
            1.
        };
        let vm_mips = self.state.vm_mips;
        for (entry, demand) in self.state.running.iter_mut().zip(demands) {
            entry.mips = demand * scale * vm_mips;
        }
    }

    fn start(&mut self, mut cloudlet: Cloudlet, time: f64) -> Result<(), (Box<Cloudlet>, SimulationError)> {
        if let Err(e) = cloudlet.set_status(CloudletStatus::Running, time) {
            return Err((Box::new(cloudlet), e));
        }
        self.state.running.push(RunningCloudlet { cloudlet, mips: 0. });
        self.assign_rates(time);
        Ok(())
    }
}

impl CloudletScheduler for TimeSharedScheduler {
    fn update_processing(&mut self, time: f64) {
        self.state.advance(time);
        self.assign_rates(time);
    }

    fn submit(&mut self, mut cloudlet: Cloudlet, time: f64) -> Result<(), (Box<Cloudlet>, SimulationError)> {
        if let Err(e) = cloudlet.set_status(CloudletStatus::Queued, time) {
            return Err((Box::new(cloudlet), e));
        }
        self.start(cloudlet, time)
    }

    fn cancel(&mut self, cloudlet_id: u32, time: f64) -> Result<Cloudlet, SimulationError> {
        let cloudlet = self.state.cancel(cloudlet_id, time)?;
        self.assign_rates(time);
        Ok(cloudlet)
    }

    fn pause(&mut self, cloudlet_id: u32, time: f64) -> Result<(), SimulationError> {
        self.state.pause(cloudlet_id, time)?;
        self.assign_rates(time);
        Ok(())
    }

    fn resume(&mut self, cloudlet_id: u32, time: f64) -> Result<(), SimulationError> {
        let cloudlet = self.state.take_paused(cloudlet_id)?;
        self.start(cloudlet, time).map_err(|(cloudlet, e)| {
            self.state.paused.push(*cloudlet);
            e
        })
    }

    fn take_finished(&mut self) -> Vec<Cloudlet> {
        self.state.take_finished()
    }

    fn fail_all(&mut self, time: f64) -> Vec<Cloudlet> {
        self.state.fail_all(time)
    }

    fn next_completion_time(&self) -> Option<f64> {
        self.state.next_completion_time()
    }

    fn allocated_mips(&self) -> f64 {
        self.state.allocated_mips()
    }

    fn active_count(&self) -> usize {
        self.state.active_count()
    }

    fn is_progressing(&self, time: f64) -> bool {
        self.state.is_progressing(time)
    }

    fn unfinished(&self) -> Vec<&Cloudlet> {
        self.state.unfinished()
    }

    fn ram_utilization(&self, time: f64) -> f64 {
        self.state.ram_utilization(time)
    }

    fn bw_utilization(&self, time: f64) -> f64 {
        self.state.bw_utilization(time)
    }
}
