//! Simulation results.

use std::fmt;

use serde::Serialize;

use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::host::Host;

/// Outcome of one cloudlet.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CloudletRecord {
    pub id: u32,
    pub status: CloudletStatus,
    pub datacenter_id: Option<u32>,
    pub host_id: Option<u32>,
    pub vm_id: Option<u32>,
    pub cpu_time: f64,
    pub submission_time: Option<f64>,
    pub start_time: Option<f64>,
    pub finish_time: Option<f64>,
    pub cost: f64,
}

impl From<&Cloudlet> for CloudletRecord {
    fn from(cloudlet: &Cloudlet) -> Self {
        Self {
            id: cloudlet.id,
            status: cloudlet.status(),
            datacenter_id: cloudlet.datacenter_id,
            host_id: cloudlet.host_id,
            vm_id: cloudlet.vm_id,
            cpu_time: cloudlet.actual_cpu_time(),
            submission_time: cloudlet.submission_time(),
            start_time: cloudlet.start_time(),
            finish_time: cloudlet.finish_time(),
            cost: cloudlet.cost(),
        }
    }
}

/// Resource usage and energy of one host.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HostEnergyRecord {
    pub host_id: u32,
    /// PEs reserved by VMs at the report time.
    pub used_pes: u32,
    pub total_pes: u32,
    /// Time-weighted mean CPU utilization since the start, in percent.
    pub utilization_percent: f64,
    /// Power at the report time in W.
    pub power_w: f64,
    /// Energy consumed since the start in Wh.
    pub energy_wh: f64,
}

impl HostEnergyRecord {
    pub fn new(host: &Host, time: f64) -> Self {
        Self {
            host_id: host.id,
            used_pes: host.allocated_pes(),
            total_pes: host.total_pes(),
            utilization_percent: mean_cpu_utilization(host, time) * 100.,
            power_w: host.current_power(),
            energy_wh: host.energy_consumed(time),
        }
    }
}

fn mean_cpu_utilization(host: &Host, time: f64) -> f64 {
    let history = host.history();
    if time <= 0. || history.is_empty() {
        return host.cpu_utilization();
    }
    let mut weighted = 0.;
    for (i, sample) in history.iter().enumerate() {
        let end = history.get(i + 1).map_or(time, |next| next.time).min(time);
        if end > sample.time {
            weighted += sample.cpu_utilization * (end - sample.time);
        }
    }
    weighted / time
}

/// Results of a simulation run.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SimulationReport {
    /// Simulation time when the report was built.
    pub clock: f64,
    /// Finished cloudlets in the order they were received by brokers.
    pub cloudlets: Vec<CloudletRecord>,
    /// Failed and canceled cloudlets.
    pub failed_cloudlets: Vec<CloudletRecord>,
    /// Cloudlets still running, waiting or paused on VMs.
    pub unfinished_cloudlets: Vec<CloudletRecord>,
    pub hosts: Vec<HostEnergyRecord>,
    /// Ids of VMs which could not be placed.
    pub unplaced_vms: Vec<u32>,
    pub total_energy_wh: f64,
}

impl SimulationReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn fmt_time(time: Option<f64>) -> String {
    time.map_or_else(|| "-".to_string(), |t| format!("{:.2}", t))
}

fn fmt_id(id: Option<u32>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

fn fmt_cloudlets(f: &mut fmt::Formatter, records: &[CloudletRecord]) -> fmt::Result {
    writeln!(
        f,
        "{:>8} {:>9} {:>6} {:>6} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Cloudlet", "Status", "DC", "Host", "VM", "CPU time", "Submitted", "Start", "Finish", "Cost"
    )?;
    for r in records {
        writeln!(
            f,
            "{:>8} {:>9} {:>6} {:>6} {:>6} {:>10.2} {:>10} {:>10} {:>10} {:>10.2}",
            r.id,
            r.status.to_string(),
            fmt_id(r.datacenter_id),
            fmt_id(r.host_id),
            fmt_id(r.vm_id),
            r.cpu_time,
            fmt_time(r.submission_time),
            fmt_time(r.start_time),
            fmt_time(r.finish_time),
            r.cost
        )?;
    }
    Ok(())
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "========== CLOUDLETS ({:.2} s) ==========", self.clock)?;
        fmt_cloudlets(f, &self.cloudlets)?;
        if !self.failed_cloudlets.is_empty() {
            writeln!(f, "========== FAILED CLOUDLETS ==========")?;
            fmt_cloudlets(f, &self.failed_cloudlets)?;
        }
        if !self.unfinished_cloudlets.is_empty() {
            writeln!(f, "========== UNFINISHED CLOUDLETS ==========")?;
            fmt_cloudlets(f, &self.unfinished_cloudlets)?;
        }
        if !self.unplaced_vms.is_empty() {
            writeln!(f, "Unplaced VMs: {:?}", self.unplaced_vms)?;
        }
        writeln!(f, "========== HOSTS ==========")?;
        writeln!(
            f,
            "{:>6} {:>10} {:>12} {:>10} {:>12}",
            "Host", "PEs", "CPU util %", "Power W", "Energy Wh"
        )?;
        for h in &self.hosts {
            writeln!(
                f,
                "{:>6} {:>10} {:>12.2} {:>10.2} {:>12.4}",
                h.host_id,
                format!("{}/{}", h.used_pes, h.total_pes),
                h.utilization_percent,
                h.power_w,
                h.energy_wh
            )?;
        }
        write!(f, "Total energy: {:.4} Wh", self.total_energy_wh)
    }
}
