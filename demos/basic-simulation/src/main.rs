use std::error::Error;
use std::io::Write;

use env_logger::Builder;

use cloudsim_core::simulation::Simulation;
use cloudsim_iaas::core::cloudlet::Cloudlet;
use cloudsim_iaas::core::config::SimulationConfig;
use cloudsim_iaas::core::host::HostSpec;
use cloudsim_iaas::core::vm::VmSpec;
use cloudsim_iaas::simulation::CloudSimulation;

const CLOUDLET_LENGTHS: [f64; 8] = [10000., 15000., 20000., 25000., 30000., 35000., 40000., 20000.];

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let mut cloud_sim = CloudSimulation::new(Simulation::new(123), SimulationConfig::default())?;
    for _ in 0..4 {
        cloud_sim.add_host(HostSpec::new(4, 1000., 8192, 10000, 1_000_000))?;
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

    let end_time = cloud_sim.run();
    println!("Simulation finished at {:.2}", end_time);
    println!("{}", cloud_sim.report());
    Ok(())
}
