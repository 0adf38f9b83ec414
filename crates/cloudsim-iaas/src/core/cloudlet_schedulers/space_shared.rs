//! Space-shared cloudlet scheduler.

use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::cloudlet_scheduler::{bounded_utilization, CloudletScheduler, ExecutionState, RunningCloudlet};
use crate::core::error::SimulationError;

/// Each running cloudlet holds its PEs exclusively, the rest wait in a FIFO queue.
///
/// The queue head blocks the cloudlets behind it until enough PEs are free.
pub struct SpaceSharedScheduler {
    state: ExecutionState,
}

impl SpaceSharedScheduler {
    pub fn new(vm_id: u32, mips: f64, pes: u32) -> Self {
        Self {
            state: ExecutionState::new(vm_id, mips, pes),
        }
    }

    fn used_pes(&self) -> u32 {
        self.state.running.iter().map(|e| e.cloudlet.pes).sum()
    }

    pub fn free_pes(&self) -> u32 {
        self.state.vm_pes - self.used_pes()
    }

    pub fn waiting_count(&self) -> usize {
        self.state.waiting.len()
    }

    fn admit(&mut self, time: f64) {
        while let Some(head) = self.state.waiting.front() {
            if head.pes > self.free_pes() {
                break;
            }
            if let Some(mut cloudlet) = self.state.waiting.pop_front() {
                let started = cloudlet.set_status(CloudletStatus::Running, time);
                debug_assert!(started.is_ok());
                self.state.running.push(RunningCloudlet { cloudlet, mips: 0. });
            }
        }
        self.assign_rates(time);
    }

    fn assign_rates(&mut self, time: f64) {
        let vm_mips = self.state.vm_mips;
        for entry in self.state.running.iter_mut() {
            let utilization = bounded_utilization(entry.cloudlet.utilization_cpu.as_ref(), time);
            entry.mips = entry.cloudlet.pes as f64 * vm_mips * utilization;
        }
    }
}

impl CloudletScheduler for SpaceSharedScheduler {
    fn update_processing(&mut self, time: f64) {
        self.state.advance(time);
        self.admit(time);
    }

    fn submit(&mut self, mut cloudlet: Cloudlet, time: f64) -> Result<(), (Box<Cloudlet>, SimulationError)> {
        if cloudlet.pes > self.state.vm_pes {
            let err = SimulationError::SchedulingViolation {
                cloudlet_id: cloudlet.id,
                vm_id: self.state.vm_id,
                reason: format!("requires {} PEs, vm has {}", cloudlet.pes, self.state.vm_pes),
            };
            return Err((Box::new(cloudlet), err));
        }
        if let Err(e) = cloudlet.set_status(CloudletStatus::Queued, time) {
            return Err((Box::new(cloudlet), e));
        }
        self.state.waiting.push_back(cloudlet);
        self.admit(time);
        Ok(())
    }

    fn cancel(&mut self, cloudlet_id: u32, time: f64) -> Result<Cloudlet, SimulationError> {
        let cloudlet = self.state.cancel(cloudlet_id, time)?;
        self.admit(time);
        Ok(cloudlet)
    }

    fn pause(&mut self, cloudlet_id: u32, time: f64) -> Result<(), SimulationError> {
        self.state.pause(cloudlet_id, time)?;
        self.admit(time);
        Ok(())
    }

    fn resume(&mut self, cloudlet_id: u32, time: f64) -> Result<(), SimulationError> {
        let cloudlet = self.state.take_paused(cloudlet_id)?;
        self.state.waiting.push_back(cloudlet);
        self.admit(time);
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    fn cloudlet(id: u32, length: f64, pes: u32) -> Cloudlet {
        Cloudlet::new(id, length, pes, 300, 300)
    }

    #[test]
    // Three single-PE cloudlets of 1000 MI on a 2-PE VM: two run at once, the third starts at 1 s.
    fn test_excess_cloudlets_wait() {
        let mut scheduler = SpaceSharedScheduler::new(0, 1000., 2);
        scheduler.update_processing(0.);
        for id in 0..3 {
            scheduler.submit(cloudlet(id, 1000., 1), 0.).unwrap();
        }
        assert_eq!(scheduler.free_pes(), 0);
        assert_eq!(scheduler.waiting_count(), 1);
        assert_eq!(scheduler.next_completion_time(), Some(1.));

        scheduler.update_processing(1.);
        let finished = scheduler.take_finished();
        assert_eq!(finished.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(scheduler.waiting_count(), 0);
        assert_eq!(scheduler.next_completion_time(), Some(2.));

        scheduler.update_processing(2.);
        let last = scheduler.take_finished();
        assert_eq!(last[0].id, 2);
        assert_eq!(last[0].submission_time(), Some(0.));
        assert_eq!(last[0].start_time(), Some(1.));
        assert_eq!(last[0].actual_cpu_time(), 1.);
    }

    #[test]
    // Queue head needs both PEs and blocks a smaller cloudlet behind it.
    fn test_fifo_queue_is_not_backfilled() {
        let mut scheduler = SpaceSharedScheduler::new(0, 1000., 2);
        scheduler.update_processing(0.);
        scheduler.submit(cloudlet(0, 1000., 1), 0.).unwrap();
        scheduler.submit(cloudlet(1, 1000., 2), 0.).unwrap();
        scheduler.submit(cloudlet(2, 1000., 1), 0.).unwrap();
        assert_eq!(scheduler.free_pes(), 1);
        assert_eq!(scheduler.waiting_count(), 2);

        scheduler.update_processing(1.);
        assert_eq!(scheduler.take_finished().len(), 1);
        assert_eq!(scheduler.free_pes(), 0);
        assert_eq!(scheduler.waiting_count(), 1);
    }

    #[test]
    fn test_too_large_cloudlet_is_rejected() {
        let mut scheduler = SpaceSharedScheduler::new(7, 1000., 2);
        let (rejected, err) = scheduler.submit(cloudlet(0, 1000., 3), 0.).unwrap_err();
        assert_eq!(rejected.id, 0);
        assert!(matches!(err, SimulationError::SchedulingViolation { vm_id: 7, .. }));
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_pause_frees_pes_for_waiting_cloudlet() {
        let mut scheduler = SpaceSharedScheduler::new(0, 1000., 1);
        scheduler.update_processing(0.);
        scheduler.submit(cloudlet(0, 2000., 1), 0.).unwrap();
        scheduler.submit(cloudlet(1, 1000., 1), 0.).unwrap();

        scheduler.update_processing(1.);
        scheduler.pause(0, 1.).unwrap();
        assert_eq!(scheduler.next_completion_time(), Some(2.));

        scheduler.update_processing(2.);
        assert_eq!(scheduler.take_finished()[0].id, 1);
        scheduler.resume(0, 2.).unwrap();
        // 1000 MI left
        assert_eq!(scheduler.next_completion_time(), Some(3.));
    }
}
