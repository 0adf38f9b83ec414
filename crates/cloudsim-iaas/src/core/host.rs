//! Physical host: PEs, memory, bandwidth, storage and the VMs placed on them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cloudsim_models::power::power_model::PowerModel;
use cloudsim_models::power::power_models::linear::LinearPowerModel;

use crate::core::common::{Allocation, AllocationVerdict};
use crate::core::energy_meter::EnergyMeter;
use crate::core::error::SimulationError;
use crate::core::pe::ProcessingElement;
use crate::core::vm::VirtualMachine;

/// How host CPU utilization is computed for power accounting.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UtilizationMetric {
    /// Share of host PEs reserved by resident VMs.
    #[default]
    PeCount,
    /// Share of host MIPS consumed by running cloudlets.
    MipsWeighted,
}

/// Host parameters.
#[derive(Clone)]
pub struct HostSpec {
    /// MIPS of each PE.
    pub pe_mips: Vec<f64>,
    /// RAM in MB.
    pub ram: u64,
    pub bw: u64,
    /// Storage in MB.
    pub storage: u64,
    pub power_model: Box<dyn PowerModel>,
}

impl HostSpec {
    /// Creates a host spec with `pes` identical PEs and a linear 0-1 W power model.
    pub fn new(pes: u32, mips: f64, ram: u64, bw: u64, storage: u64) -> Self {
        Self {
            pe_mips: vec![mips; pes as usize],
            ram,
            bw,
            storage,
            power_model: Box::new(LinearPowerModel::new(0., 1.)),
        }
    }

    pub fn with_power_model(mut self, power_model: Box<dyn PowerModel>) -> Self {
        self.power_model = power_model;
        self
    }

    pub fn validate(&self, id: u32) -> Result<(), SimulationError> {
        let reason = if self.pe_mips.is_empty() {
            "at least one PE is required"
        } else if self.pe_mips.iter().any(|m| !(m.is_finite() && *m >= 0.)) {
            "PE capacity must be a non-negative number"
        } else {
            return Ok(());
        };
        Err(SimulationError::InvalidSpec {
            entity: "host",
            id,
            reason: reason.to_string(),
        })
    }
}

/// Utilization and power of a host recorded at a moment of time.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HostStateSample {
    pub time: f64,
    pub cpu_utilization: f64,
    pub ram_utilization: f64,
    pub bw_utilization: f64,
    pub power: f64,
}

pub struct Host {
    pub id: u32,
    pes: Vec<ProcessingElement>,

    ram_total: u64,
    ram_available: u64,
    bw_total: u64,
    bw_available: u64,
    storage_total: u64,
    storage_available: u64,

    vms: BTreeMap<u32, VirtualMachine>,
    failed: bool,

    power_model: Box<dyn PowerModel>,
    utilization_metric: UtilizationMetric,
    energy_meter: EnergyMeter,
    history: Vec<HostStateSample>,
    power_fallbacks: u64,
}

impl Host {
    pub fn new(id: u32, spec: HostSpec, utilization_metric: UtilizationMetric) -> Self {
        let pes = spec
            .pe_mips
            .iter()
            .enumerate()
            .map(|(i, &mips)| ProcessingElement::new(i as u32, mips))
            .collect();
        Self {
            id,
            pes,
            ram_total: spec.ram,
            ram_available: spec.ram,
            bw_total: spec.bw,
            bw_available: spec.bw,
            storage_total: spec.storage,
            storage_available: spec.storage,
            vms: BTreeMap::new(),
            failed: false,
            power_model: spec.power_model,
            utilization_metric,
            energy_meter: EnergyMeter::new(),
            history: Vec::new(),
            power_fallbacks: 0,
        }
    }

    // Resources -------------------------------------------------------------------------------------------------------

    pub fn can_allocate(&self, alloc: &Allocation) -> AllocationVerdict {
        if self.failed {
            return AllocationVerdict::HostFailed;
        }
        if self.pes.iter().filter(|pe| pe.fits(alloc.mips)).count() < alloc.pes as usize {
            return AllocationVerdict::NotEnoughPes;
        }
        if self.ram_available < alloc.ram {
            return AllocationVerdict::NotEnoughRam;
        }
        if self.bw_available < alloc.bw {
            return AllocationVerdict::NotEnoughBw;
        }
        if self.storage_available < alloc.size {
            return AllocationVerdict::NotEnoughStorage;
        }
        AllocationVerdict::Success
    }

    /// Reserves resources for the VM and places it on the host.
    ///
    /// PEs with the lowest ids are taken first.
    pub fn allocate(&mut self, mut vm: VirtualMachine) -> Result<(), SimulationError> {
        let alloc = vm.spec.allocation();
        let verdict = self.can_allocate(&alloc);
        if verdict != AllocationVerdict::Success {
            return Err(SimulationError::InsufficientCapacity {
                vm_id: alloc.vm_id,
                host_id: self.id,
                verdict,
            });
        }
        vm.pe_ids.clear();
        for pe in self.pes.iter_mut().filter(|pe| pe.fits(alloc.mips)).take(alloc.pes as usize) {
            pe.owner = Some(alloc.vm_id);
            vm.pe_ids.push(pe.id);
        }
        self.ram_available -= alloc.ram;
        self.bw_available -= alloc.bw;
        self.storage_available -= alloc.size;
        vm.host_id = self.id;
        self.vms.insert(alloc.vm_id, vm);
        Ok(())
    }

    /// Removes the VM from the host and returns all of its resources.
    pub fn release(&mut self, vm_id: u32) -> Option<VirtualMachine> {
        let vm = self.vms.remove(&vm_id)?;
        for pe in self.pes.iter_mut().filter(|pe| pe.owner == Some(vm_id)) {
            pe.owner = None;
        }
        self.ram_available += vm.spec.ram;
        self.bw_available += vm.spec.bw;
        self.storage_available += vm.spec.size;
        Some(vm)
    }

    /// Marks the host as failed and evicts all VMs.
    pub fn fail(&mut self) -> Vec<VirtualMachine> {
        let vm_ids: Vec<u32> = self.vms.keys().copied().collect();
        let evicted = vm_ids.into_iter().filter_map(|id| self.release(id)).collect();
        self.failed = true;
        evicted
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn pes(&self) -> &[ProcessingElement] {
        &self.pes
    }

    pub fn total_pes(&self) -> u32 {
        self.pes.len() as u32
    }

    pub fn free_pes(&self) -> u32 {
        self.pes.iter().filter(|pe| pe.is_free()).count() as u32
    }

    pub fn allocated_pes(&self) -> u32 {
        self.total_pes() - self.free_pes()
    }

    pub fn total_mips(&self) -> f64 {
        self.pes.iter().map(|pe| pe.mips).sum()
    }

    pub fn ram_total(&self) -> u64 {
        self.ram_total
    }

    pub fn ram_available(&self) -> u64 {
        self.ram_available
    }

    pub fn bw_available(&self) -> u64 {
        self.bw_available
    }

    pub fn storage_available(&self) -> u64 {
        self.storage_available
    }

    /// Checks that resources reserved by resident VMs match host counters and do not exceed capacity.
    pub fn capacity_consistent(&self) -> bool {
        let ram: u64 = self.vms.values().map(|vm| vm.spec.ram).sum();
        let bw: u64 = self.vms.values().map(|vm| vm.spec.bw).sum();
        let storage: u64 = self.vms.values().map(|vm| vm.spec.size).sum();
        let pes: u32 = self.vms.values().map(|vm| vm.spec.pes).sum();
        ram <= self.ram_total
            && bw <= self.bw_total
            && storage <= self.storage_total
            && pes <= self.total_pes()
            && ram + self.ram_available == self.ram_total
            && bw + self.bw_available == self.bw_total
            && storage + self.storage_available == self.storage_total
            && pes == self.allocated_pes()
    }

    // VMs -------------------------------------------------------------------------------------------------------------

    pub fn vm(&self, vm_id: u32) -> Option<&VirtualMachine> {
        self.vms.get(&vm_id)
    }

    pub fn vm_mut(&mut self, vm_id: u32) -> Option<&mut VirtualMachine> {
        self.vms.get_mut(&vm_id)
    }

    pub fn vms(&self) -> impl Iterator<Item = &VirtualMachine> {
        self.vms.values()
    }

    pub fn vms_mut(&mut self) -> impl Iterator<Item = &mut VirtualMachine> {
        self.vms.values_mut()
    }

    pub fn vm_count(&self) -> usize {
        self.vms.len()
    }

    // Utilization and energy ------------------------------------------------------------------------------------------

    pub fn cpu_utilization(&self) -> f64 {
        if self.failed {
            return 0.;
        }
        match self.utilization_metric {
            UtilizationMetric::PeCount => self.allocated_pes() as f64 / self.total_pes() as f64,
            UtilizationMetric::MipsWeighted => {
                let total = self.total_mips();
                if total == 0. {
                    return 0.;
                }
                let used: f64 = self.vms.values().map(|vm| vm.scheduler().allocated_mips()).sum();
                (used / total).min(1.)
            }
        }
    }

    pub fn ram_utilization(&self, time: f64) -> f64 {
        if self.ram_total == 0 {
            return 0.;
        }
        let used: f64 = self
            .vms
            .values()
            .map(|vm| vm.spec.ram as f64 * vm.scheduler().ram_utilization(time))
            .sum();
        used / self.ram_total as f64
    }

    pub fn bw_utilization(&self, time: f64) -> f64 {
        if self.bw_total == 0 {
            return 0.;
        }
        let used: f64 = self
            .vms
            .values()
            .map(|vm| vm.spec.bw as f64 * vm.scheduler().bw_utilization(time))
            .sum();
        used / self.bw_total as f64
    }

    /// Returns the current power consumption in W.
    ///
    /// A failed host consumes nothing.
    pub fn power(&self) -> Result<f64, SimulationError> {
        if self.failed {
            return Ok(0.);
        }
        self.power_model
            .get_power(self.cpu_utilization())
            .map_err(|source| SimulationError::PowerModelLookupFailure { host_id: self.id, source })
    }

    pub fn static_power(&self) -> f64 {
        self.power_model.static_power()
    }

    /// Accrues energy up to `time` and records the current state.
    ///
    /// When the power model fails, static power is used for the next interval and the error is returned.
    pub fn update_energy(&mut self, time: f64) -> Result<(), SimulationError> {
        let (power, result) = match self.power() {
            Ok(power) => (power, Ok(())),
            Err(e) => {
                self.power_fallbacks += 1;
                (self.power_model.static_power(), Err(e))
            }
        };
        self.energy_meter.update(time, power);
        let sample = HostStateSample {
            time,
            cpu_utilization: self.cpu_utilization(),
            ram_utilization: self.ram_utilization(time),
            bw_utilization: self.bw_utilization(time),
            power,
        };
        match self.history.last_mut() {
            Some(last) if last.time == time => *last = sample,
            Some(last) if last.cpu_utilization == sample.cpu_utilization
                && last.ram_utilization == sample.ram_utilization
                && last.bw_utilization == sample.bw_utilization
                && last.power == sample.power => {}
            _ => self.history.push(sample),
        }
        result
    }

    /// Returns the power used by energy accounting since the last update in W.
    pub fn current_power(&self) -> f64 {
        self.energy_meter.current_power()
    }

    /// Returns the energy consumed up to `time` in Wh.
    ///
    /// Does not change the host state, so repeated calls return the same value.
    pub fn energy_consumed(&self, time: f64) -> f64 {
        self.energy_meter.energy_consumed(time)
    }

    /// Returns utilization and power changes recorded so far.
    pub fn history(&self) -> &[HostStateSample] {
        &self.history
    }

    /// Returns the number of updates which used static power because the power model failed.
    pub fn power_fallbacks(&self) -> u64 {
        self.power_fallbacks
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use cloudsim_core::Id;
    use cloudsim_models::power::power_model::PowerModelError;
    use cloudsim_models::power::power_models::empirical::EmpiricalPowerModel;

    use super::*;
    use crate::core::vm::VmSpec;

    const BROKER: Id = 0;

    fn host(metric: UtilizationMetric) -> Host {
        let spec = HostSpec::new(4, 1000., 8192, 10000, 1_000_000)
            .with_power_model(Box::new(LinearPowerModel::new(35., 50.)));
        Host::new(0, spec, metric)
    }

    fn vm(id: u32, pes: u32) -> VirtualMachine {
        VirtualMachine::new(VmSpec::new(id, 1000., pes, 2048, 1000, 10000), BROKER, 0, 0.)
    }

    #[test]
    fn test_allocate_and_release() {
        let mut host = host(UtilizationMetric::PeCount);
        host.allocate(vm(0, 2)).unwrap();
        host.allocate(vm(1, 1)).unwrap();
        assert_eq!(host.free_pes(), 1);
        assert_eq!(host.ram_available(), 8192 - 4096);
        assert_eq!(host.vm(0).unwrap().pe_ids, vec![0, 1]);
        assert_eq!(host.vm(1).unwrap().pe_ids, vec![2]);
        assert!(host.capacity_consistent());

        let released = host.release(0).unwrap();
        assert_eq!(released.id(), 0);
        assert_eq!(host.free_pes(), 3);
        assert_eq!(host.ram_available(), 8192 - 2048);
        assert!(host.release(0).is_none());
        assert!(host.capacity_consistent());
    }

    #[test]
    fn test_allocation_verdicts() {
        let mut host = host(UtilizationMetric::PeCount);
        assert_eq!(
            host.can_allocate(&VmSpec::new(0, 1000., 5, 1, 1, 1).allocation()),
            AllocationVerdict::NotEnoughPes
        );
        assert_eq!(
            host.can_allocate(&VmSpec::new(0, 1500., 1, 1, 1, 1).allocation()),
            AllocationVerdict::NotEnoughPes
        );
        assert_eq!(
            host.can_allocate(&VmSpec::new(0, 1000., 1, 10000, 1, 1).allocation()),
            AllocationVerdict::NotEnoughRam
        );
        assert_eq!(
            host.can_allocate(&VmSpec::new(0, 1000., 1, 1, 20000, 1).allocation()),
            AllocationVerdict::NotEnoughBw
        );
        assert_eq!(
            host.can_allocate(&VmSpec::new(0, 1000., 1, 1, 1, 2_000_000).allocation()),
            AllocationVerdict::NotEnoughStorage
        );
        let err = host.allocate(vm(9, 8)).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::InsufficientCapacity {
                vm_id: 9,
                verdict: AllocationVerdict::NotEnoughPes,
                ..
            }
        ));
        assert_eq!(host.free_pes(), 4);
    }

    #[test]
    fn test_failed_host() {
        let mut host = host(UtilizationMetric::PeCount);
        host.allocate(vm(0, 2)).unwrap();
        let evicted = host.fail();
        assert_eq!(evicted.len(), 1);
        assert_eq!(host.free_pes(), 4);
        assert_eq!(host.can_allocate(&VmSpec::new(1, 1000., 1, 1, 1, 1).allocation()), AllocationVerdict::HostFailed);
        assert_eq!(host.power().unwrap(), 0.);
    }

    #[test]
    // 2 of 4 PEs allocated: P = 35 + 15 * 0.5 = 42.5 W during one hour.
    fn test_energy_with_pe_count_utilization() {
        let mut host = host(UtilizationMetric::PeCount);
        host.update_energy(0.).unwrap();
        host.allocate(vm(0, 2)).unwrap();
        host.update_energy(0.).unwrap();
        assert_eq!(host.cpu_utilization(), 0.5);
        assert_abs_diff_eq!(host.energy_consumed(3600.), 42.5);
        // query does not change the meter
        assert_abs_diff_eq!(host.energy_consumed(3600.), 42.5);
        assert_eq!(host.history().len(), 1);
    }

    #[test]
    fn test_idle_and_full_power_are_exact() {
        let mut host = host(UtilizationMetric::PeCount);
        assert_eq!(host.power().unwrap(), 35.);
        host.allocate(vm(0, 4)).unwrap();
        assert_eq!(host.power().unwrap(), 50.);
    }

    #[test]
    fn test_power_model_failure_falls_back_to_static_power() {
        let spec = HostSpec::new(2, 1000., 1024, 100, 100)
            .with_power_model(Box::new(EmpiricalPowerModel::new(vec![20., 30.])));
        let mut host = Host::new(3, spec, UtilizationMetric::PeCount);
        let err = host.update_energy(0.).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::PowerModelLookupFailure {
                host_id: 3,
                source: PowerModelError::MalformedTable(_)
            }
        ));
        assert_eq!(host.power_fallbacks(), 1);
        assert_eq!(host.current_power(), 20.);
        assert_abs_diff_eq!(host.energy_consumed(7200.), 40.);
    }
}
