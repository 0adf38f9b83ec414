use std::error::Error;
use std::io::Write;

use clap::{Parser, ValueEnum};
use env_logger::Builder;
use log::info;

use cloudsim_iaas::core::config::SimulationConfig;
use cloudsim_iaas::simulation::CloudSimulation;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Runs a simulation scenario described in YAML
struct Args {
    /// Path to scenario file
    scenario: String,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Overrides the seed from the scenario
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    let mut sim_config = SimulationConfig::from_file(&args.scenario)?;
    if let Some(seed) = args.seed {
        sim_config.seed = seed;
    }

    let mut cloud_sim = CloudSimulation::from_config(sim_config)?;
    let end_time = cloud_sim.run();
    info!("Scenario {} finished at {:.2}", args.scenario, end_time);

    let report = cloud_sim.report();
    match args.format {
        Format::Text => println!("{}", report),
        Format::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}
