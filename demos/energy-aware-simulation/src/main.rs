use std::error::Error;
use std::io::Write;

use clap::Parser;
use env_logger::Builder;

use cloudsim_core::simulation::Simulation;
use cloudsim_iaas::core::cloudlet::Cloudlet;
use cloudsim_iaas::core::config::SimulationConfig;
use cloudsim_iaas::core::host::{HostSpec, UtilizationMetric};
use cloudsim_iaas::core::vm::VmSpec;
use cloudsim_iaas::simulation::CloudSimulation;
use cloudsim_models::power::power_models::linear::LinearPowerModel;

const CLOUDLET_LENGTHS: [f64; 8] = [10000., 15000., 20000., 25000., 30000., 35000., 40000., 20000.];

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Runs the basic scenario on hosts with a linear power model
struct Args {
    /// Number of hosts
    #[arg(long, default_value_t = 4)]
    hosts: u32,

    /// Interval of periodic processing updates in seconds
    #[arg(long, default_value_t = 10.)]
    scheduling_interval: f64,

    /// Weight CPU utilization by MIPS instead of counting PEs
    #[arg(long)]
    mips_weighted: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    let sim_config = SimulationConfig {
        scheduling_interval: args.scheduling_interval,
        utilization_metric: if args.mips_weighted {
            UtilizationMetric::MipsWeighted
        } else {
            UtilizationMetric::PeCount
        },
        ..Default::default()
    };

    let mut cloud_sim = CloudSimulation::new(Simulation::new(sim_config.seed), sim_config)?;
    for _ in 0..args.hosts {
        let spec = HostSpec::new(4, 1000., 8192, 10000, 1_000_000)
            .with_power_model(Box::new(LinearPowerModel::new(35., 50.)));
        cloud_sim.add_host(spec)?;
    }

    let broker_id = cloud_sim.create_broker("broker").borrow().id;
    let vms = (0..4).map(|id| VmSpec::new(id, 1000., 2, 2048, 1000, 10000)).collect();
    cloud_sim.submit_vms(broker_id, vms)?;
    let cloudlets = CLOUDLET_LENGTHS
        .iter()
        .enumerate()
        .map(|(id, length)| Cloudlet::new(id as u32, *length, 1, 300, 300))
        .collect();
    cloud_sim.submit_cloudlets(broker_id, cloudlets)?;

    cloud_sim.run();
    let report = cloud_sim.report();
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report);
    }
    Ok(())
}
