//! Datacenter component: places VMs on hosts, executes cloudlets and accounts host energy.

use std::collections::BTreeMap;

use cloudsim_core::cast;
use cloudsim_core::context::SimulationContext;
use cloudsim_core::event::{Event, EventId};
use cloudsim_core::handler::EventHandler;
use cloudsim_core::{log_debug, log_error, log_info, log_warn, Id};

use crate::core::characteristics::DatacenterCharacteristics;
use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::error::SimulationError;
use crate::core::events::cloudlet::{
    CloudletCancelRequest, CloudletPauseRequest, CloudletResumeRequest, CloudletReturn, CloudletSubmit,
};
use crate::core::events::datacenter::{HostFailure, SchedulingTick, UpdateProcessing};
use crate::core::events::vm::{VmCreateFailed, VmCreateRequest, VmCreated, VmDestroyRequest, VmDestroyed, VmFailed};
use crate::core::host::{Host, HostSpec, UtilizationMetric};
use crate::core::vm::{VirtualMachine, VmSpec};
use crate::core::vm_allocation_policy::VmAllocationPolicy;

/// Datacenter owns the hosts and the VMs placed on them.
///
/// All host and VM state changes happen inside its event handlers. Before handling any request the datacenter
/// brings cloudlet progress up to the current time, so that requests always see up-to-date state.
/// After the request it recomputes host power and schedules a processing update at the earliest
/// estimated cloudlet completion.
pub struct Datacenter {
    pub id: Id,
    hosts: Vec<Host>,
    vm_hosts: BTreeMap<u32, u32>,
    policy: Box<dyn VmAllocationPolicy>,
    characteristics: DatacenterCharacteristics,
    scheduling_interval: f64,
    message_delay: f64,
    next_update: Option<(f64, EventId)>,
    next_tick: Option<EventId>,
    ctx: SimulationContext,
}

impl Datacenter {
    pub fn new(
        policy: Box<dyn VmAllocationPolicy>,
        characteristics: DatacenterCharacteristics,
        scheduling_interval: f64,
        message_delay: f64,
        ctx: SimulationContext,
    ) -> Self {
        Self {
            id: ctx.id(),
            hosts: Vec::new(),
            vm_hosts: BTreeMap::new(),
            policy,
            characteristics,
            scheduling_interval,
            message_delay,
            next_update: None,
            next_tick: None,
            ctx,
        }
    }

    /// Adds a host and returns its id. Hosts are numbered from zero in the order of addition.
    ///
    /// Hosts should be added before the simulation is started.
    pub fn add_host(&mut self, spec: HostSpec, utilization_metric: UtilizationMetric) -> Result<u32, SimulationError> {
        let host_id = self.hosts.len() as u32;
        spec.validate(host_id)?;
        let mut host = Host::new(host_id, spec, utilization_metric);
        if let Err(e) = host.update_energy(self.ctx.time()) {
            log_warn!(self.ctx, "{}", e);
        }
        log_debug!(self.ctx, "host {} added with {} PEs", host_id, host.total_pes());
        self.hosts.push(host);
        Ok(host_id)
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn host(&self, host_id: u32) -> Option<&Host> {
        self.hosts.get(host_id as usize)
    }

    pub fn characteristics(&self) -> &DatacenterCharacteristics {
        &self.characteristics
    }

    /// Returns the host of a running VM.
    pub fn vm_host(&self, vm_id: u32) -> Option<u32> {
        self.vm_hosts.get(&vm_id).copied()
    }

    pub fn vm(&self, vm_id: u32) -> Option<&VirtualMachine> {
        let host_id = self.vm_host(vm_id)?;
        self.hosts[host_id as usize].vm(vm_id)
    }

    /// Returns cloudlets still held by VMs: running, waiting or paused.
    pub fn unfinished_cloudlets(&self) -> Vec<&Cloudlet> {
        let mut cloudlets: Vec<&Cloudlet> = self
            .hosts
            .iter()
            .flat_map(|host| host.vms())
            .flat_map(|vm| vm.scheduler().unfinished())
            .collect();
        cloudlets.sort_by_key(|c| c.id);
        cloudlets
    }

    /// Checks the capacity invariant on every host.
    pub fn check_capacity(&self) -> bool {
        self.hosts.iter().all(|host| host.capacity_consistent())
    }

    // Processing ------------------------------------------------------------------------------------------------------

    /// Advances cloudlets on all VMs to the current time and returns finished ones to their brokers.
    fn update_processing(&mut self) {
        let time = self.ctx.time();
        let mut finished = Vec::new();
        for host in self.hosts.iter_mut() {
            for vm in host.vms_mut() {
                let scheduler = vm.scheduler_mut();
                scheduler.update_processing(time);
                finished.extend(scheduler.take_finished());
            }
        }
        finished.sort_by_key(|c| c.id);
        for cloudlet in finished {
            log_debug!(self.ctx, "cloudlet {} finished on vm {:?}", cloudlet.id, cloudlet.vm_id);
            self.return_cloudlet(cloudlet);
        }
    }

    /// Recomputes host power and schedules the next processing update.
    fn reschedule(&mut self) {
        self.update_energy();

        let next_completion = self
            .hosts
            .iter()
            .flat_map(|host| host.vms())
            .filter_map(|vm| vm.scheduler().next_completion_time())
            .min_by(|a, b| a.total_cmp(b));
        match (next_completion, self.next_update) {
            (Some(time), Some((scheduled, _))) if time == scheduled => {}
            (next_completion, scheduled) => {
                if let Some((_, event_id)) = scheduled {
                    self.ctx.cancel_event(event_id);
                    self.next_update = None;
                }
                if let Some(time) = next_completion {
                    let delay = (time - self.ctx.time()).max(0.);
                    let event_id = self.ctx.emit_self(UpdateProcessing {}, delay);
                    self.next_update = Some((time, event_id));
                }
            }
        }

        if self.scheduling_interval > 0. {
            match (self.has_progressing_cloudlets(), self.next_tick) {
                (true, None) => {
                    self.next_tick = Some(self.ctx.emit_self(SchedulingTick {}, self.scheduling_interval));
                }
                (false, Some(event_id)) => {
                    self.ctx.cancel_event(event_id);
                    self.next_tick = None;
                }
                _ => {}
            }
        }
    }

    fn has_progressing_cloudlets(&self) -> bool {
        let time = self.ctx.time();
        self.hosts
            .iter()
            .flat_map(|host| host.vms())
            .any(|vm| vm.scheduler().is_progressing(time))
    }

    fn update_energy(&mut self) {
        let time = self.ctx.time();
        for host in self.hosts.iter_mut() {
            if let Err(e) = host.update_energy(time) {
                log_warn!(self.ctx, "{}", e);
            }
        }
    }

    fn return_cloudlet(&mut self, mut cloudlet: Cloudlet) {
        cloudlet.datacenter_id = Some(self.id);
        cloudlet.set_cost(cloudlet.actual_cpu_time() * self.characteristics.cost_per_second);
        match cloudlet.broker_id {
            Some(broker_id) => {
                self.ctx.emit(CloudletReturn { cloudlet }, broker_id, self.message_delay);
            }
            None => log_error!(self.ctx, "cloudlet {} has no broker", cloudlet.id),
        }
    }

    fn fail_cloudlet(&mut self, mut cloudlet: Cloudlet, error: SimulationError) {
        log_warn!(self.ctx, "{}", error);
        if let Err(e) = cloudlet.set_status(CloudletStatus::Failed, self.ctx.time()) {
            log_error!(self.ctx, "{}", e);
        }
        self.return_cloudlet(cloudlet);
    }

    // VMs -------------------------------------------------------------------------------------------------------------

    fn on_vm_create_request(&mut self, spec: VmSpec, broker_id: Id) {
        let vm_id = spec.id;
        let result = if self.vm_hosts.contains_key(&vm_id) {
            Err(SimulationError::InvalidSpec {
                entity: "vm",
                id: vm_id,
                reason: "vm with this id is already running".to_string(),
            })
        } else {
            self.allocate_vm(spec, broker_id)
        };
        match result {
            Ok(host_id) => {
                log_info!(self.ctx, "vm {} created on host {}", vm_id, host_id);
                self.ctx.emit(VmCreated { vm_id, host_id }, broker_id, self.message_delay);
            }
            Err(e) => {
                log_warn!(self.ctx, "{}", e);
                let reason = e.to_string();
                self.ctx.emit(VmCreateFailed { vm_id, reason }, broker_id, self.message_delay);
            }
        }
        self.reschedule();
    }

    fn allocate_vm(&mut self, spec: VmSpec, broker_id: Id) -> Result<u32, SimulationError> {
        spec.validate()?;
        let vm_id = spec.id;
        let host_id = self
            .policy
            .select_host(&spec.allocation(), &self.hosts)
            .ok_or(SimulationError::NoSuitableHost { vm_id })?;
        let host = self
            .hosts
            .get_mut(host_id as usize)
            .ok_or(SimulationError::NoSuitableHost { vm_id })?;
        host.allocate(VirtualMachine::new(spec, broker_id, host_id, self.ctx.time()))?;
        self.vm_hosts.insert(vm_id, host_id);
        Ok(host_id)
    }

    fn on_vm_destroy_request(&mut self, vm_id: u32, broker_id: Id) {
        self.update_processing();
        let vm = self
            .vm_hosts
            .remove(&vm_id)
            .and_then(|host_id| self.hosts[host_id as usize].release(vm_id));
        match vm {
            Some(mut vm) => {
                let time = self.ctx.time();
                for cloudlet in vm.scheduler_mut().fail_all(time) {
                    log_warn!(self.ctx, "cloudlet {} failed: vm {} is destroyed", cloudlet.id, vm_id);
                    self.return_cloudlet(cloudlet);
                }
                log_info!(self.ctx, "vm {} destroyed on host {}", vm_id, vm.host_id);
                self.ctx.emit(VmDestroyed { vm_id }, broker_id, self.message_delay);
            }
            None => log_warn!(self.ctx, "can't destroy vm {}: it is not running", vm_id),
        }
        self.reschedule();
    }

    fn on_host_failure(&mut self, host_id: u32) {
        if self.host(host_id).map_or(true, |host| host.is_failed()) {
            log_warn!(self.ctx, "host {} does not exist or is already failed", host_id);
            return;
        }
        self.update_processing();
        let time = self.ctx.time();
        let vms = self.hosts[host_id as usize].fail();
        log_info!(self.ctx, "host {} failed, {} vms evicted", host_id, vms.len());
        for mut vm in vms {
            self.vm_hosts.remove(&vm.id());
            self.ctx.emit(
                VmFailed {
                    vm_id: vm.id(),
                    host_id,
                },
                vm.broker_id,
                self.message_delay,
            );
            for cloudlet in vm.scheduler_mut().fail_all(time) {
                self.return_cloudlet(cloudlet);
            }
        }
        self.reschedule();
    }

    // Cloudlets -------------------------------------------------------------------------------------------------------

    fn on_cloudlet_submit(&mut self, mut cloudlet: Cloudlet) {
        self.update_processing();
        let vm_id = cloudlet.vm_id.unwrap_or(u32::MAX);
        match self.vm_hosts.get(&vm_id).copied() {
            Some(host_id) => {
                cloudlet.host_id = Some(host_id);
                cloudlet.datacenter_id = Some(self.id);
                let time = self.ctx.time();
                let result = match self.hosts[host_id as usize].vm_mut(vm_id) {
                    Some(vm) => vm.scheduler_mut().submit(cloudlet, time),
                    None => Err((Box::new(cloudlet), vm_not_running(vm_id))),
                };
                match result {
                    Ok(()) => log_debug!(self.ctx, "cloudlet submitted to vm {}", vm_id),
                    Err((cloudlet, e)) => self.fail_cloudlet(*cloudlet, e),
                }
            }
            None => {
                let e = SimulationError::SchedulingViolation {
                    cloudlet_id: cloudlet.id,
                    vm_id,
                    reason: "vm is not running in this datacenter".to_string(),
                };
                self.fail_cloudlet(cloudlet, e);
            }
        }
        self.reschedule();
    }

    fn on_cloudlet_cancel(&mut self, cloudlet_id: u32, vm_id: u32) {
        self.update_processing();
        let time = self.ctx.time();
        let result = match self.vm_mut(vm_id) {
            Some(vm) => vm.scheduler_mut().cancel(cloudlet_id, time),
            None => Err(vm_not_running(vm_id)),
        };
        match result {
            Ok(cloudlet) => {
                log_info!(self.ctx, "cloudlet {} canceled", cloudlet_id);
                self.return_cloudlet(cloudlet);
            }
            Err(e) => log_warn!(self.ctx, "can't cancel cloudlet {}: {}", cloudlet_id, e),
        }
        self.reschedule();
    }

    fn on_cloudlet_pause(&mut self, cloudlet_id: u32, vm_id: u32) {
        self.update_processing();
        let time = self.ctx.time();
        let result = match self.vm_mut(vm_id) {
            Some(vm) => vm.scheduler_mut().pause(cloudlet_id, time),
            None => Err(vm_not_running(vm_id)),
        };
        match result {
            Ok(()) => log_info!(self.ctx, "cloudlet {} paused", cloudlet_id),
            Err(e) => log_warn!(self.ctx, "can't pause cloudlet {}: {}", cloudlet_id, e),
        }
        self.reschedule();
    }

    fn on_cloudlet_resume(&mut self, cloudlet_id: u32, vm_id: u32) {
        self.update_processing();
        let time = self.ctx.time();
        let result = match self.vm_mut(vm_id) {
            Some(vm) => vm.scheduler_mut().resume(cloudlet_id, time),
            None => Err(vm_not_running(vm_id)),
        };
        match result {
            Ok(()) => log_info!(self.ctx, "cloudlet {} resumed", cloudlet_id),
            Err(e) => log_warn!(self.ctx, "can't resume cloudlet {}: {}", cloudlet_id, e),
        }
        self.reschedule();
    }

    fn vm_mut(&mut self, vm_id: u32) -> Option<&mut VirtualMachine> {
        let host_id = self.vm_hosts.get(&vm_id).copied()?;
        self.hosts[host_id as usize].vm_mut(vm_id)
    }
}

fn vm_not_running(vm_id: u32) -> SimulationError {
    SimulationError::InvalidSpec {
        entity: "vm",
        id: vm_id,
        reason: "vm is not running in this datacenter".to_string(),
    }
}

impl EventHandler for Datacenter {
    fn on(&mut self, event: Event) {
        let src = event.src;
        cast!(match event.data {
            VmCreateRequest { vm } => {
                self.on_vm_create_request(vm, src);
            }
            VmDestroyRequest { vm_id } => {
                self.on_vm_destroy_request(vm_id, src);
            }
            CloudletSubmit { cloudlet } => {
                self.on_cloudlet_submit(cloudlet);
            }
            CloudletCancelRequest { cloudlet_id, vm_id } => {
                self.on_cloudlet_cancel(cloudlet_id, vm_id);
            }
            CloudletPauseRequest { cloudlet_id, vm_id } => {
                self.on_cloudlet_pause(cloudlet_id, vm_id);
            }
            CloudletResumeRequest { cloudlet_id, vm_id } => {
                self.on_cloudlet_resume(cloudlet_id, vm_id);
            }
            UpdateProcessing {} => {
                self.next_update = None;
                self.update_processing();
                self.reschedule();
            }
            SchedulingTick {} => {
                self.next_tick = None;
                self.update_processing();
                self.reschedule();
            }
            HostFailure { host_id } => {
                self.on_host_failure(host_id);
            }
        })
    }
}
