//! Simulation configuration.

use serde::{Deserialize, Serialize};

use crate::core::characteristics::DatacenterCharacteristics;
use crate::core::cloudlet_scheduler::CloudletSchedulerKind;
use crate::core::error::SimulationError;
use crate::core::host::UtilizationMetric;

/// Holds raw simulation config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
struct RawSimulationConfig {
    pub seed: Option<u64>,
    pub message_delay: Option<f64>,
    pub scheduling_interval: Option<f64>,
    pub allocation_policy: Option<String>,
    pub utilization_metric: Option<UtilizationMetric>,
    pub characteristics: Option<DatacenterCharacteristics>,
    pub hosts: Option<Vec<HostConfig>>,
    pub vms: Option<Vec<VmConfig>>,
    pub cloudlets: Option<Vec<CloudletConfig>>,
    pub actions: Option<Vec<ActionConfig>>,
}

/// Holds configuration of a single physical host or a set of identical hosts.
///
/// Host ids are assigned sequentially in the order of appearance.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    /// Number of PEs.
    pub pes: u32,
    /// MIPS of each PE.
    pub mips: f64,
    /// RAM in MB.
    pub ram: u64,
    pub bw: u64,
    /// Storage in MB.
    pub storage: u64,
    /// Power model, e.g. `Linear[static=35,max=50]`.
    pub power_model: Option<String>,
    /// Number of such hosts.
    pub count: Option<u32>,
}

/// Holds configuration of a single VM or a set of identical VMs.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct VmConfig {
    /// Id of the first VM in the set.
    /// Should be set only if it differs from the next free id.
    pub first_id: Option<u32>,
    pub mips: f64,
    pub pes: u32,
    pub ram: u64,
    pub bw: u64,
    pub size: u64,
    pub vmm: Option<String>,
    pub scheduler: Option<CloudletSchedulerKind>,
    /// Number of such VMs.
    pub count: Option<u32>,
}

/// Holds configuration of a single cloudlet or a set of identical cloudlets.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct CloudletConfig {
    /// Id of the first cloudlet in the set.
    /// Should be set only if it differs from the next free id.
    pub first_id: Option<u32>,
    /// Length in MI per PE.
    pub length: f64,
    pub pes: Option<u32>,
    pub file_size: Option<u64>,
    pub output_size: Option<u64>,
    /// CPU utilization model, e.g. `Full` or `Stochastic[seed=7]`.
    pub utilization_cpu: Option<String>,
    pub utilization_ram: Option<String>,
    pub utilization_bw: Option<String>,
    /// VM to bind the cloudlets to.
    /// Unbound cloudlets are distributed over placed VMs by the broker.
    pub vm: Option<u32>,
    /// Number of such cloudlets.
    pub count: Option<u32>,
}

/// An action performed at the given simulation time.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionConfig {
    CancelCloudlet { time: f64, cloudlet_id: u32 },
    PauseCloudlet { time: f64, cloudlet_id: u32 },
    ResumeCloudlet { time: f64, cloudlet_id: u32 },
    FailHost { time: f64, host_id: u32 },
}

impl ActionConfig {
    pub fn time(&self) -> f64 {
        match self {
            ActionConfig::CancelCloudlet { time, .. }
            | ActionConfig::PauseCloudlet { time, .. }
            | ActionConfig::ResumeCloudlet { time, .. }
            | ActionConfig::FailHost { time, .. } => *time,
        }
    }
}

/// Represents simulation configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Seed of the simulation random generator.
    pub seed: u64,
    /// Delay in seconds of messages between the broker and the datacenter.
    pub message_delay: f64,
    /// Period in seconds of cloudlet processing updates while cloudlets are active.
    /// Zero means updates happen only when cloudlets change state.
    pub scheduling_interval: f64,
    /// VM allocation policy, e.g. `FirstFit`.
    pub allocation_policy: String,
    /// Metric of host CPU utilization used for power accounting.
    pub utilization_metric: UtilizationMetric,
    pub characteristics: DatacenterCharacteristics,
    pub hosts: Vec<HostConfig>,
    pub vms: Vec<VmConfig>,
    pub cloudlets: Vec<CloudletConfig>,
    pub actions: Vec<ActionConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::from_raw(RawSimulationConfig::default())
    }
}

impl SimulationConfig {
    /// Creates simulation config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self, SimulationError> {
        let content = std::fs::read_to_string(file_name)?;
        Self::from_yaml(&content)
    }

    /// Creates simulation config from YAML string.
    pub fn from_yaml(content: &str) -> Result<Self, SimulationError> {
        let raw: RawSimulationConfig = serde_yaml::from_str(content)?;
        let config = Self::from_raw(raw);
        config.validate()?;
        Ok(config)
    }

    fn from_raw(raw: RawSimulationConfig) -> Self {
        Self {
            seed: raw.seed.unwrap_or(123),
            message_delay: raw.message_delay.unwrap_or(0.),
            scheduling_interval: raw.scheduling_interval.unwrap_or(0.),
            allocation_policy: raw.allocation_policy.unwrap_or_else(|| "FirstFit".to_string()),
            utilization_metric: raw.utilization_metric.unwrap_or_default(),
            characteristics: raw.characteristics.unwrap_or_default(),
            hosts: raw.hosts.unwrap_or_default(),
            vms: raw.vms.unwrap_or_default(),
            cloudlets: raw.cloudlets.unwrap_or_default(),
            actions: raw.actions.unwrap_or_default(),
        }
    }

    /// Checks global parameters, entity parameters are checked when entities are created.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.message_delay.is_finite() && self.message_delay >= 0.) {
            return Err(SimulationError::Config(format!(
                "message_delay must be non-negative, got {}",
                self.message_delay
            )));
        }
        if !(self.scheduling_interval.is_finite() && self.scheduling_interval >= 0.) {
            return Err(SimulationError::Config(format!(
                "scheduling_interval must be non-negative, got {}",
                self.scheduling_interval
            )));
        }
        if let Some(action) = self.actions.iter().find(|a| !(a.time().is_finite() && a.time() >= 0.)) {
            return Err(SimulationError::Config(format!("action time must be non-negative: {:?}", action)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::from_yaml("{}").unwrap();
        assert_eq!(config.seed, 123);
        assert_eq!(config.message_delay, 0.);
        assert_eq!(config.scheduling_interval, 0.);
        assert_eq!(config.allocation_policy, "FirstFit");
        assert_eq!(config.utilization_metric, UtilizationMetric::PeCount);
        assert_eq!(config.characteristics, DatacenterCharacteristics::default());
        assert!(config.hosts.is_empty());
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_entities_and_actions() {
        let config = SimulationConfig::from_yaml(
            r#"
scheduling_interval: 10
utilization_metric: MipsWeighted
characteristics:
  cost_per_second: 1.5
hosts:
  - pes: 4
    mips: 1000
    ram: 8192
    bw: 10000
    storage: 1000000
    power_model: Linear[static=35,max=50]
    count: 2
vms:
  - mips: 1000
    pes: 2
    ram: 2048
    bw: 1000
    size: 10000
    scheduler: SpaceShared
cloudlets:
  - length: 10000
    vm: 0
    count: 3
actions:
  - action: pause_cloudlet
    time: 1.5
    cloudlet_id: 2
  - action: fail_host
    time: 20
    host_id: 1
"#,
        )
        .unwrap();
        assert_eq!(config.scheduling_interval, 10.);
        assert_eq!(config.utilization_metric, UtilizationMetric::MipsWeighted);
        assert_eq!(config.characteristics.cost_per_second, 1.5);
        assert_eq!(config.characteristics.os, "Linux");
        assert_eq!(config.hosts[0].count, Some(2));
        assert_eq!(config.vms[0].scheduler, Some(CloudletSchedulerKind::SpaceShared));
        assert_eq!(config.cloudlets[0].vm, Some(0));
        assert_eq!(
            config.actions,
            vec![
                ActionConfig::PauseCloudlet {
                    time: 1.5,
                    cloudlet_id: 2
                },
                ActionConfig::FailHost { time: 20., host_id: 1 },
            ]
        );
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            SimulationConfig::from_yaml("scheduling_interval: -1"),
            Err(SimulationError::Config(_))
        ));
        assert!(matches!(
            SimulationConfig::from_yaml("hosts: 5"),
            Err(SimulationError::Yaml(_))
        ));
        assert!(matches!(
            SimulationConfig::from_file("no-such-config.yaml"),
            Err(SimulationError::Io(_))
        ));
    }
}
