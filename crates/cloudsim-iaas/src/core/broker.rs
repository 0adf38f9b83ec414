//! Broker acting on behalf of a cloud user.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use cloudsim_core::cast;
use cloudsim_core::context::SimulationContext;
use cloudsim_core::event::Event;
use cloudsim_core::handler::EventHandler;
use cloudsim_core::{log_debug, log_info, log_warn, Id};

use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::error::SimulationError;
use crate::core::events::broker::{BrokerStart, CloudletAction, CloudletActionRequest};
use crate::core::events::cloudlet::{
    CloudletCancelRequest, CloudletPauseRequest, CloudletResumeRequest, CloudletReturn, CloudletSubmit,
};
use crate::core::events::vm::{VmCreateFailed, VmCreateRequest, VmCreated, VmDestroyRequest, VmDestroyed, VmFailed};
use crate::core::vm::{VmSpec, VmStatus};

/// Broker submits VMs and cloudlets of one user to the datacenter and collects the results.
///
/// VM creation requests are sent on start. Cloudlets are submitted once every VM request is answered:
/// a bound cloudlet goes to its VM, unbound cloudlets are distributed round-robin over the placed VMs
/// in ascending id order. When no cloudlets are outstanding, the broker destroys its VMs.
pub struct Broker {
    pub id: Id,
    datacenter_id: Id,
    message_delay: f64,

    vms: Vec<VmSpec>,
    cloudlets: Vec<Cloudlet>,
    bindings: BTreeMap<u32, u32>,

    vm_status: BTreeMap<u32, VmStatus>,
    vm_hosts: BTreeMap<u32, u32>,
    unplaced_vms: BTreeSet<u32>,
    pending_acks: usize,

    known_cloudlets: HashSet<u32>,
    cloudlet_vms: BTreeMap<u32, u32>,
    outstanding: BTreeSet<u32>,
    received: Vec<Cloudlet>,
    failed: Vec<Cloudlet>,

    started: bool,
    vms_destroy_requested: bool,
    ctx: SimulationContext,
}

impl Broker {
    pub fn new(datacenter_id: Id, message_delay: f64, ctx: SimulationContext) -> Self {
        Self {
            id: ctx.id(),
            datacenter_id,
            message_delay,
            vms: Vec::new(),
            cloudlets: Vec::new(),
            bindings: BTreeMap::new(),
            vm_status: BTreeMap::new(),
            vm_hosts: BTreeMap::new(),
            unplaced_vms: BTreeSet::new(),
            pending_acks: 0,
            known_cloudlets: HashSet::new(),
            cloudlet_vms: BTreeMap::new(),
            outstanding: BTreeSet::new(),
            received: Vec::new(),
            failed: Vec::new(),
            started: false,
            vms_destroy_requested: false,
            ctx,
        }
    }

    // Setup -----------------------------------------------------------------------------------------------------------

    /// Adds VMs to be created on start.
    ///
    /// The whole list is rejected if some VM is malformed or its id is already used.
    pub fn submit_vm_list(&mut self, vms: Vec<VmSpec>) -> Result<(), SimulationError> {
        let mut ids: HashSet<u32> = self.vms.iter().map(|vm| vm.id).collect();
        for vm in vms.iter() {
            vm.validate()?;
            if self.started {
                return Err(already_started("vm", vm.id));
            }
            if !ids.insert(vm.id) {
                return Err(duplicate("vm", vm.id));
            }
        }
        self.vms.extend(vms);
        Ok(())
    }

    /// Adds cloudlets to be submitted once VMs are created.
    ///
    /// The whole list is rejected if some cloudlet is malformed or its id is already used.
    pub fn submit_cloudlet_list(&mut self, cloudlets: Vec<Cloudlet>) -> Result<(), SimulationError> {
        let mut ids = self.known_cloudlets.clone();
        for cloudlet in cloudlets.iter() {
            cloudlet.validate()?;
            if self.started {
                return Err(already_started("cloudlet", cloudlet.id));
            }
            if !ids.insert(cloudlet.id) {
                return Err(duplicate("cloudlet", cloudlet.id));
            }
        }
        self.known_cloudlets = ids;
        self.cloudlets.extend(cloudlets);
        Ok(())
    }

    /// Binds a submitted cloudlet to a submitted VM.
    pub fn bind_cloudlet_to_vm(&mut self, cloudlet_id: u32, vm_id: u32) -> Result<(), SimulationError> {
        if !self.cloudlets.iter().any(|c| c.id == cloudlet_id) {
            return Err(SimulationError::InvalidSpec {
                entity: "cloudlet",
                id: cloudlet_id,
                reason: "cloudlet is not waiting for submission".to_string(),
            });
        }
        if !self.vms.iter().any(|vm| vm.id == vm_id) {
            return Err(SimulationError::InvalidSpec {
                entity: "vm",
                id: vm_id,
                reason: "vm is not submitted to the broker".to_string(),
            });
        }
        self.bindings.insert(cloudlet_id, vm_id);
        Ok(())
    }

    // Results ---------------------------------------------------------------------------------------------------------

    /// Returns successfully finished cloudlets in arrival order.
    pub fn received_cloudlets(&self) -> &[Cloudlet] {
        &self.received
    }

    /// Returns failed and canceled cloudlets in arrival order.
    pub fn failed_cloudlets(&self) -> &[Cloudlet] {
        &self.failed
    }

    /// Returns ids of VMs which could not be placed on any host.
    pub fn unplaced_vms(&self) -> &BTreeSet<u32> {
        &self.unplaced_vms
    }

    pub fn vm_status(&self, vm_id: u32) -> Option<VmStatus> {
        self.vm_status.get(&vm_id).copied()
    }

    pub fn vm_host(&self, vm_id: u32) -> Option<u32> {
        self.vm_hosts.get(&vm_id).copied()
    }

    /// Returns the number of cloudlets submitted to the datacenter and not returned yet.
    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    // Processing ------------------------------------------------------------------------------------------------------

    fn on_start(&mut self) {
        if self.started {
            log_warn!(self.ctx, "broker is already started");
            return;
        }
        self.started = true;
        log_info!(self.ctx, "starting with {} vms and {} cloudlets", self.vms.len(), self.cloudlets.len());
        self.pending_acks = self.vms.len();
        for vm in self.vms.clone() {
            self.vm_status.insert(vm.id, VmStatus::Requested);
            self.ctx.emit(VmCreateRequest { vm }, self.datacenter_id, self.message_delay);
        }
        if self.pending_acks == 0 {
            self.submit_cloudlets();
        }
    }

    fn on_vm_created(&mut self, vm_id: u32, host_id: u32) {
        log_debug!(self.ctx, "vm {} is running on host {}", vm_id, host_id);
        self.vm_status.insert(vm_id, VmStatus::Running);
        self.vm_hosts.insert(vm_id, host_id);
        self.on_vm_ack();
    }

    fn on_vm_create_failed(&mut self, vm_id: u32, reason: String) {
        log_warn!(self.ctx, "vm {} is not created: {}", vm_id, reason);
        self.vm_status.insert(vm_id, VmStatus::FailedToAllocate);
        self.unplaced_vms.insert(vm_id);
        self.on_vm_ack();
    }

    fn on_vm_ack(&mut self) {
        self.pending_acks = self.pending_acks.saturating_sub(1);
        if self.pending_acks == 0 {
            self.submit_cloudlets();
        }
    }

    fn submit_cloudlets(&mut self) {
        let placed: Vec<u32> = self
            .vm_status
            .iter()
            .filter(|(_, status)| **status == VmStatus::Running)
            .map(|(vm_id, _)| *vm_id)
            .collect();
        let mut next_vm = 0;
        for mut cloudlet in std::mem::take(&mut self.cloudlets) {
            let vm_id = match self.bindings.get(&cloudlet.id) {
                Some(vm_id) => Some(*vm_id),
                None if !placed.is_empty() => {
                    let vm_id = placed[next_vm % placed.len()];
                    next_vm += 1;
                    Some(vm_id)
                }
                None => None,
            };
            match vm_id {
                Some(vm_id) => {
                    cloudlet.vm_id = Some(vm_id);
                    cloudlet.broker_id = Some(self.id);
                    self.cloudlet_vms.insert(cloudlet.id, vm_id);
                    self.outstanding.insert(cloudlet.id);
                    log_debug!(self.ctx, "submitting cloudlet {} to vm {}", cloudlet.id, vm_id);
                    self.ctx
                        .emit(CloudletSubmit { cloudlet }, self.datacenter_id, self.message_delay);
                }
                None => {
                    log_warn!(self.ctx, "cloudlet {} failed: no vm is running", cloudlet.id);
                    cloudlet.broker_id = Some(self.id);
                    if cloudlet.set_status(CloudletStatus::Failed, self.ctx.time()).is_ok() {
                        self.failed.push(cloudlet);
                    }
                }
            }
        }
        self.destroy_vms_if_done();
    }

    fn on_cloudlet_return(&mut self, cloudlet: Cloudlet) {
        self.outstanding.remove(&cloudlet.id);
        log_info!(
            self.ctx,
            "cloudlet {} returned with status {}, {} cloudlets outstanding",
            cloudlet.id,
            cloudlet.status(),
            self.outstanding.len()
        );
        if cloudlet.status() == CloudletStatus::Finished {
            self.received.push(cloudlet);
        } else {
            self.failed.push(cloudlet);
        }
        self.destroy_vms_if_done();
    }

    fn destroy_vms_if_done(&mut self) {
        if !self.started || self.vms_destroy_requested || self.pending_acks > 0 || !self.outstanding.is_empty() {
            return;
        }
        self.vms_destroy_requested = true;
        let running: Vec<u32> = self
            .vm_status
            .iter()
            .filter(|(_, status)| **status == VmStatus::Running)
            .map(|(vm_id, _)| *vm_id)
            .collect();
        for vm_id in running {
            self.ctx
                .emit(VmDestroyRequest { vm_id }, self.datacenter_id, self.message_delay);
        }
    }

    fn on_cloudlet_action(&mut self, cloudlet_id: u32, action: CloudletAction) {
        if let Some(pos) = self.cloudlets.iter().position(|c| c.id == cloudlet_id) {
            if action == CloudletAction::Cancel {
                let mut cloudlet = self.cloudlets.remove(pos);
                cloudlet.broker_id = Some(self.id);
                if cloudlet.set_status(CloudletStatus::Canceled, self.ctx.time()).is_ok() {
                    log_info!(self.ctx, "cloudlet {} canceled before submission", cloudlet_id);
                    self.failed.push(cloudlet);
                }
            } else {
                log_warn!(self.ctx, "can't {:?} cloudlet {}: it is not submitted", action, cloudlet_id);
            }
            return;
        }
        let vm_id = match self.cloudlet_vms.get(&cloudlet_id) {
            Some(vm_id) if self.outstanding.contains(&cloudlet_id) => *vm_id,
            _ => {
                log_warn!(self.ctx, "can't {:?} cloudlet {}: it is not active", action, cloudlet_id);
                return;
            }
        };
        let dst = self.datacenter_id;
        let delay = self.message_delay;
        match action {
            CloudletAction::Cancel => self.ctx.emit(CloudletCancelRequest { cloudlet_id, vm_id }, dst, delay),
            CloudletAction::Pause => self.ctx.emit(CloudletPauseRequest { cloudlet_id, vm_id }, dst, delay),
            CloudletAction::Resume => self.ctx.emit(CloudletResumeRequest { cloudlet_id, vm_id }, dst, delay),
        };
    }
}

fn duplicate(entity: &'static str, id: u32) -> SimulationError {
    SimulationError::InvalidSpec {
        entity,
        id,
        reason: "duplicate id".to_string(),
    }
}

fn already_started(entity: &'static str, id: u32) -> SimulationError {
    SimulationError::InvalidSpec {
        entity,
        id,
        reason: "broker is already started".to_string(),
    }
}

impl EventHandler for Broker {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            BrokerStart {} => {
                self.on_start();
            }
            VmCreated { vm_id, host_id } => {
                self.on_vm_created(vm_id, host_id);
            }
            VmCreateFailed { vm_id, reason } => {
                self.on_vm_create_failed(vm_id, reason);
            }
            VmDestroyed { vm_id } => {
                log_debug!(self.ctx, "vm {} destroyed", vm_id);
                self.vm_status.insert(vm_id, VmStatus::Destroyed);
            }
            VmFailed { vm_id, host_id } => {
                log_warn!(self.ctx, "vm {} failed with host {}", vm_id, host_id);
                self.vm_status.insert(vm_id, VmStatus::Failed);
            }
            CloudletReturn { cloudlet } => {
                self.on_cloudlet_return(cloudlet);
            }
            CloudletActionRequest { cloudlet_id, action } => {
                self.on_cloudlet_action(cloudlet_id, action);
            }
        })
    }
}
