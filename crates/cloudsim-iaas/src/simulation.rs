//! Simulation facade.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use sugars::{rc, refcell};

use cloudsim_core::context::SimulationContext;
use cloudsim_core::simulation::Simulation;
use cloudsim_core::{log_info, Id};

use crate::core::broker::Broker;
use crate::core::cloudlet::Cloudlet;
use crate::core::config::resolvers::{power_model_resolver, utilization_model_resolver};
use crate::core::config::sim_config::ActionConfig;
use crate::core::config::SimulationConfig;
use crate::core::datacenter::Datacenter;
use crate::core::error::SimulationError;
use crate::core::events::broker::{BrokerStart, CloudletAction, CloudletActionRequest};
use crate::core::events::datacenter::HostFailure;
use crate::core::host::{Host, HostSpec};
use crate::core::report::{CloudletRecord, HostEnergyRecord, SimulationReport};
use crate::core::vm::VmSpec;
use crate::core::vm_allocation_policy::allocation_policy_resolver;

/// Name of the broker created from config.
pub const DEFAULT_BROKER_NAME: &str = "broker";

/// Single-datacenter cloud simulation.
///
/// Hosts and brokers are added before the run. Brokers are started with the first call of
/// [`run`](CloudSimulation::run), [`steps`](CloudSimulation::steps) or
/// [`step_for_duration`](CloudSimulation::step_for_duration).
pub struct CloudSimulation {
    datacenter: Rc<RefCell<Datacenter>>,
    datacenter_id: Id,
    brokers: BTreeMap<Id, Rc<RefCell<Broker>>>,
    started: bool,
    sim: Simulation,
    ctx: SimulationContext,
    sim_config: SimulationConfig,
}

impl CloudSimulation {
    /// Creates a simulation with an empty datacenter.
    ///
    /// Global parameters are taken from the config, its hosts, VMs and cloudlets are ignored.
    pub fn new(mut sim: Simulation, sim_config: SimulationConfig) -> Result<Self, SimulationError> {
        sim_config.validate()?;
        let policy = allocation_policy_resolver(&sim_config.allocation_policy)?;
        let datacenter = rc!(refcell!(Datacenter::new(
            policy,
            sim_config.characteristics.clone(),
            sim_config.scheduling_interval,
            sim_config.message_delay,
            sim.create_context("datacenter"),
        )));
        let datacenter_id = sim.add_handler("datacenter", datacenter.clone());
        let ctx = sim.create_context("simulation");
        Ok(Self {
            datacenter,
            datacenter_id,
            brokers: BTreeMap::new(),
            started: false,
            sim,
            ctx,
            sim_config,
        })
    }

    /// Creates a simulation with hosts, VMs, cloudlets and actions from the config.
    ///
    /// VMs and cloudlets are submitted to a single broker named [`DEFAULT_BROKER_NAME`].
    pub fn from_config(sim_config: SimulationConfig) -> Result<Self, SimulationError> {
        let sim = Simulation::new(sim_config.seed);
        let mut cloud_sim = Self::new(sim, sim_config.clone())?;

        for host in sim_config.hosts.iter() {
            let mut spec = HostSpec::new(host.pes, host.mips, host.ram, host.bw, host.storage);
            if let Some(power_model) = &host.power_model {
                spec = spec.with_power_model(power_model_resolver(power_model)?);
            }
            for _ in 0..host.count.unwrap_or(1) {
                cloud_sim.add_host(spec.clone())?;
            }
        }

        let broker_id = cloud_sim.create_broker(DEFAULT_BROKER_NAME).borrow().id;

        let mut vms = Vec::new();
        let mut next_id = 0;
        for vm in sim_config.vms.iter() {
            let first_id = vm.first_id.unwrap_or(next_id);
            for id in first_id..first_id + vm.count.unwrap_or(1) {
                let mut spec = VmSpec::new(id, vm.mips, vm.pes, vm.ram, vm.bw, vm.size)
                    .with_scheduler(vm.scheduler.unwrap_or_default());
                if let Some(vmm) = &vm.vmm {
                    spec.vmm = vmm.clone();
                }
                vms.push(spec);
            }
            next_id = first_id + vm.count.unwrap_or(1);
        }
        cloud_sim.submit_vms(broker_id, vms)?;

        let mut cloudlets = Vec::new();
        let mut bindings = Vec::new();
        let mut next_id = 0;
        for config in sim_config.cloudlets.iter() {
            let first_id = config.first_id.unwrap_or(next_id);
            for id in first_id..first_id + config.count.unwrap_or(1) {
                let mut resolve = |model: &Option<String>| {
                    utilization_model_resolver(model.as_deref().unwrap_or("Full"), &mut cloud_sim.ctx)
                };
                let utilization_cpu = resolve(&config.utilization_cpu)?;
                let utilization_ram = resolve(&config.utilization_ram)?;
                let utilization_bw = resolve(&config.utilization_bw)?;
                cloudlets.push(Cloudlet::with_models(
                    id,
                    config.length,
                    config.pes.unwrap_or(1),
                    config.file_size.unwrap_or(300),
                    config.output_size.unwrap_or(300),
                    utilization_cpu,
                    utilization_ram,
                    utilization_bw,
                ));
                if let Some(vm_id) = config.vm {
                    bindings.push((id, vm_id));
                }
            }
            next_id = first_id + config.count.unwrap_or(1);
        }
        cloud_sim.submit_cloudlets(broker_id, cloudlets)?;
        for (cloudlet_id, vm_id) in bindings {
            cloud_sim.bind_cloudlet_to_vm(broker_id, cloudlet_id, vm_id)?;
        }

        for action in sim_config.actions.iter() {
            match *action {
                ActionConfig::CancelCloudlet { time, cloudlet_id } => {
                    cloud_sim.cancel_cloudlet_at(broker_id, cloudlet_id, time)?
                }
                ActionConfig::PauseCloudlet { time, cloudlet_id } => {
                    cloud_sim.pause_cloudlet_at(broker_id, cloudlet_id, time)?
                }
                ActionConfig::ResumeCloudlet { time, cloudlet_id } => {
                    cloud_sim.resume_cloudlet_at(broker_id, cloudlet_id, time)?
                }
                ActionConfig::FailHost { time, host_id } => cloud_sim.fail_host_at(host_id, time)?,
            }
        }
        Ok(cloud_sim)
    }

    /// Creates a simulation from YAML config file.
    pub fn from_file(file_name: &str) -> Result<Self, SimulationError> {
        Self::from_config(SimulationConfig::from_file(file_name)?)
    }

    // Setup -----------------------------------------------------------------------------------------------------------

    /// Adds a host to the datacenter and returns its id.
    pub fn add_host(&mut self, spec: HostSpec) -> Result<u32, SimulationError> {
        if self.started {
            return Err(SimulationError::Config(
                "hosts can't be added after the simulation is started".to_string(),
            ));
        }
        self.datacenter
            .borrow_mut()
            .add_host(spec, self.sim_config.utilization_metric)
    }

    /// Creates a broker which submits VMs and cloudlets to the datacenter.
    pub fn create_broker(&mut self, name: &str) -> Rc<RefCell<Broker>> {
        let broker = rc!(refcell!(Broker::new(
            self.datacenter_id,
            self.sim_config.message_delay,
            self.sim.create_context(name),
        )));
        let id = self.sim.add_handler(name, broker.clone());
        self.brokers.insert(id, broker.clone());
        if self.started {
            self.ctx.emit_now(BrokerStart {}, id);
        }
        broker
    }

    pub fn submit_vms(&mut self, broker_id: Id, vms: Vec<VmSpec>) -> Result<(), SimulationError> {
        self.broker_ref(broker_id)?.borrow_mut().submit_vm_list(vms)
    }

    pub fn submit_cloudlets(&mut self, broker_id: Id, cloudlets: Vec<Cloudlet>) -> Result<(), SimulationError> {
        self.broker_ref(broker_id)?.borrow_mut().submit_cloudlet_list(cloudlets)
    }

    pub fn bind_cloudlet_to_vm(&mut self, broker_id: Id, cloudlet_id: u32, vm_id: u32) -> Result<(), SimulationError> {
        self.broker_ref(broker_id)?
            .borrow_mut()
            .bind_cloudlet_to_vm(cloudlet_id, vm_id)
    }

    fn broker_ref(&self, broker_id: Id) -> Result<&Rc<RefCell<Broker>>, SimulationError> {
        self.brokers.get(&broker_id).ok_or_else(|| SimulationError::InvalidSpec {
            entity: "broker",
            id: broker_id,
            reason: "broker does not exist".to_string(),
        })
    }

    // Actions ---------------------------------------------------------------------------------------------------------

    /// Asks the broker to cancel the cloudlet at the given time.
    pub fn cancel_cloudlet_at(&mut self, broker_id: Id, cloudlet_id: u32, time: f64) -> Result<(), SimulationError> {
        self.cloudlet_action_at(broker_id, cloudlet_id, CloudletAction::Cancel, time)
    }

    /// Asks the broker to pause the cloudlet at the given time.
    pub fn pause_cloudlet_at(&mut self, broker_id: Id, cloudlet_id: u32, time: f64) -> Result<(), SimulationError> {
        self.cloudlet_action_at(broker_id, cloudlet_id, CloudletAction::Pause, time)
    }

    /// Asks the broker to resume the cloudlet at the given time.
    pub fn resume_cloudlet_at(&mut self, broker_id: Id, cloudlet_id: u32, time: f64) -> Result<(), SimulationError> {
        self.cloudlet_action_at(broker_id, cloudlet_id, CloudletAction::Resume, time)
    }

    fn cloudlet_action_at(
        &mut self,
        broker_id: Id,
        cloudlet_id: u32,
        action: CloudletAction,
        time: f64,
    ) -> Result<(), SimulationError> {
        self.broker_ref(broker_id)?;
        self.ctx
            .emit_at(CloudletActionRequest { cloudlet_id, action }, broker_id, time)?;
        Ok(())
    }

    /// Fails the host at the given time. Its VMs and their cloudlets fail too.
    pub fn fail_host_at(&mut self, host_id: u32, time: f64) -> Result<(), SimulationError> {
        if self.datacenter.borrow().host(host_id).is_none() {
            return Err(SimulationError::InvalidSpec {
                entity: "host",
                id: host_id,
                reason: "host does not exist".to_string(),
            });
        }
        self.ctx.emit_at(HostFailure { host_id }, self.datacenter_id, time)?;
        Ok(())
    }

    // Running ---------------------------------------------------------------------------------------------------------

    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        log_info!(self.ctx, "starting {} brokers", self.brokers.len());
        for broker_id in self.brokers.keys() {
            self.ctx.emit_now(BrokerStart {}, *broker_id);
        }
    }

    /// Runs the simulation until there are no pending events and returns the final time.
    pub fn run(&mut self) -> f64 {
        self.start();
        self.sim.step_until_no_events();
        log_info!(self.ctx, "simulation finished");
        self.sim.time()
    }

    /// Performs the specified number of steps through the simulation.
    ///
    /// Returns `true` if there could be more pending events and `false` otherwise.
    pub fn steps(&mut self, step_count: u64) -> bool {
        self.start();
        self.sim.steps(step_count)
    }

    /// Processes all events with time not exceeding `current time + duration`.
    ///
    /// Returns `true` if there could be more pending events and `false` otherwise.
    pub fn step_for_duration(&mut self, duration: f64) -> bool {
        self.start();
        self.sim.step_for_duration(duration)
    }

    pub fn current_time(&self) -> f64 {
        self.sim.time()
    }

    // Results ---------------------------------------------------------------------------------------------------------

    pub fn datacenter(&self) -> Rc<RefCell<Datacenter>> {
        self.datacenter.clone()
    }

    pub fn datacenter_id(&self) -> Id {
        self.datacenter_id
    }

    pub fn broker(&self, broker_id: Id) -> Option<Rc<RefCell<Broker>>> {
        self.brokers.get(&broker_id).cloned()
    }

    /// Looks up a broker by its name.
    pub fn broker_by_name(&self, name: &str) -> Option<Rc<RefCell<Broker>>> {
        self.sim.lookup_id(name).and_then(|id| self.broker(id))
    }

    /// Calls the function with the host with the given id.
    pub fn with_host<R>(&self, host_id: u32, f: impl FnOnce(&Host) -> R) -> Option<R> {
        self.datacenter.borrow().host(host_id).map(f)
    }

    /// Returns finished cloudlets of all brokers, in the order they were received.
    pub fn cloudlet_records(&self) -> Vec<CloudletRecord> {
        self.brokers
            .values()
            .flat_map(|broker| {
                broker
                    .borrow()
                    .received_cloudlets()
                    .iter()
                    .map(CloudletRecord::from)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Returns failed and canceled cloudlets of all brokers.
    pub fn failed_cloudlet_records(&self) -> Vec<CloudletRecord> {
        self.brokers
            .values()
            .flat_map(|broker| {
                broker
                    .borrow()
                    .failed_cloudlets()
                    .iter()
                    .map(CloudletRecord::from)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Returns cloudlets which are still running, waiting or paused on VMs, in ascending id order.
    ///
    /// After [`run`](Self::run) these are cloudlets that can no longer make progress.
    pub fn unfinished_cloudlet_records(&self) -> Vec<CloudletRecord> {
        self.datacenter
            .borrow()
            .unfinished_cloudlets()
            .into_iter()
            .map(CloudletRecord::from)
            .collect()
    }

    /// Returns energy records of all hosts at the current time.
    pub fn host_energy_records(&self) -> Vec<HostEnergyRecord> {
        let time = self.sim.time();
        self.datacenter
            .borrow()
            .hosts()
            .iter()
            .map(|host| HostEnergyRecord::new(host, time))
            .collect()
    }

    /// Builds the report at the current time. Building the report does not change the simulation state.
    pub fn report(&self) -> SimulationReport {
        let hosts = self.host_energy_records();
        let unplaced_vms: BTreeSet<u32> = self
            .brokers
            .values()
            .flat_map(|broker| broker.borrow().unplaced_vms().iter().copied().collect::<Vec<_>>())
            .collect();
        SimulationReport {
            clock: self.sim.time(),
            cloudlets: self.cloudlet_records(),
            failed_cloudlets: self.failed_cloudlet_records(),
            unfinished_cloudlets: self.unfinished_cloudlet_records(),
            total_energy_wh: hosts.iter().map(|h| h.energy_wh).sum(),
            hosts,
            unplaced_vms: unplaced_vms.into_iter().collect(),
        }
    }
}
