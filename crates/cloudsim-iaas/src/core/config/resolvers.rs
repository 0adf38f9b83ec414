//! Creation of power and utilization models from config strings.

use cloudsim_core::context::SimulationContext;
use cloudsim_models::power::power_model::PowerModel;
use cloudsim_models::power::power_models::constant::ConstantPowerModel;
use cloudsim_models::power::power_models::cubic::CubicPowerModel;
use cloudsim_models::power::power_models::empirical::EmpiricalPowerModel;
use cloudsim_models::power::power_models::linear::LinearPowerModel;
use cloudsim_models::power::power_models::sqrt::SqrtPowerModel;
use cloudsim_models::power::power_models::square::SquarePowerModel;
use cloudsim_models::utilization::utilization_model::UtilizationModel;
use cloudsim_models::utilization::utilization_models::constant::ConstantUtilizationModel;
use cloudsim_models::utilization::utilization_models::full::UtilizationModelFull;
use cloudsim_models::utilization::utilization_models::stochastic::StochasticUtilizationModel;
use cloudsim_models::utilization::utilization_models::trace::TraceUtilizationModel;

use crate::core::config::options::{parse_config_value, parse_options, required_option};
use crate::core::error::SimulationError;

/// Resolves a power model, e.g. `Linear[static=35,max=50]`, `Constant[power=100]`,
/// `Empirical[values=86;89.4;...]` or `HpProliantMl110G4`.
pub fn power_model_resolver(config_str: &str) -> Result<Box<dyn PowerModel>, SimulationError> {
    let (name, options_str) = parse_config_value(config_str);
    let options = parse_options(options_str.as_deref().unwrap_or(""));
    let static_and_max = || -> Result<(f64, f64), SimulationError> {
        Ok((
            required_option(&options, "static", config_str)?,
            required_option(&options, "max", config_str)?,
        ))
    };
    let model: Box<dyn PowerModel> = match name.as_str() {
        "Linear" => {
            let (static_power, max_power) = static_and_max()?;
            Box::new(LinearPowerModel::new(static_power, max_power))
        }
        "Square" => {
            let (static_power, max_power) = static_and_max()?;
            Box::new(SquarePowerModel::new(static_power, max_power))
        }
        "Cubic" => {
            let (static_power, max_power) = static_and_max()?;
            Box::new(CubicPowerModel::new(static_power, max_power))
        }
        "Sqrt" => {
            let (static_power, max_power) = static_and_max()?;
            Box::new(SqrtPowerModel::new(static_power, max_power))
        }
        "Constant" => Box::new(ConstantPowerModel::new(required_option(&options, "power", config_str)?)),
        "Empirical" => {
            let values: String = required_option(&options, "values", config_str)?;
            let measurements = values
                .split(';')
                .map(|v| v.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| SimulationError::Config(format!("invalid measurements in {}", config_str)))?;
            Box::new(EmpiricalPowerModel::new(measurements))
        }
        "HpProliantMl110G4" => Box::new(EmpiricalPowerModel::hp_proliant_ml110_g4()),
        "HpProliantMl110G5" => Box::new(EmpiricalPowerModel::hp_proliant_ml110_g5()),
        _ => return Err(SimulationError::Config(format!("unknown power model: {}", config_str))),
    };
    Ok(model)
}

/// Resolves a utilization model, e.g. `Full`, `Constant[value=0.5]`, `Stochastic[seed=7]`
/// or `Trace[path=traces/host1,interval=300]`.
///
/// `Stochastic` without seed gets one from the simulation random generator.
pub fn utilization_model_resolver(
    config_str: &str,
    ctx: &mut SimulationContext,
) -> Result<Box<dyn UtilizationModel>, SimulationError> {
    let (name, options_str) = parse_config_value(config_str);
    let options = parse_options(options_str.as_deref().unwrap_or(""));
    let model: Box<dyn UtilizationModel> = match name.as_str() {
        "Full" => Box::new(UtilizationModelFull::new()),
        "Constant" => {
            let value: f64 = required_option(&options, "value", config_str)?;
            if !value.is_finite() {
                return Err(SimulationError::Config(format!("utilization must be finite: {}", config_str)));
            }
            Box::new(ConstantUtilizationModel::new(value))
        }
        "Stochastic" => {
            let seed = match options.get("seed") {
                Some(_) => required_option(&options, "seed", config_str)?,
                None => ctx.gen_range(0..u64::MAX),
            };
            Box::new(StochasticUtilizationModel::new(seed))
        }
        "Trace" => {
            let path: String = required_option(&options, "path", config_str)?;
            let interval = options
                .get("interval")
                .map(|_| required_option::<f64>(&options, "interval", config_str))
                .transpose()?
                .unwrap_or(300.);
            Box::new(TraceUtilizationModel::from_file(path, interval)?)
        }
        _ => return Err(SimulationError::Config(format!("unknown utilization model: {}", config_str))),
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use cloudsim_core::simulation::Simulation;

    use super::*;

    #[test]
    fn test_power_models() {
        let linear = power_model_resolver("Linear[static=35,max=50]").unwrap();
        assert_eq!(linear.get_power(0.5).unwrap(), 42.5);
        let constant = power_model_resolver("Constant[power=100]").unwrap();
        assert_eq!(constant.get_power(0.3).unwrap(), 100.);
        let g4 = power_model_resolver("HpProliantMl110G4").unwrap();
        assert_eq!(g4.static_power(), 86.);
        let empirical = power_model_resolver("Empirical[values=0;10;20;30;40;50;60;70;80;90;100]").unwrap();
        assert_abs_diff_eq!(empirical.get_power(0.45).unwrap(), 45.);
        for shape in ["Square", "Cubic", "Sqrt"] {
            let model = power_model_resolver(&format!("{}[static=10,max=20]", shape)).unwrap();
            assert_eq!(model.get_power(0.).unwrap(), 10.);
            assert_eq!(model.get_power(1.).unwrap(), 20.);
        }
    }

    #[test]
    fn test_power_model_errors() {
        assert!(power_model_resolver("Linear[static=35]").is_err());
        assert!(power_model_resolver("Linear[static=a,max=50]").is_err());
        assert!(power_model_resolver("Empirical[values=1;x]").is_err());
        assert!(power_model_resolver("Quadratic").is_err());
    }

    #[test]
    fn test_utilization_models() {
        let mut sim = Simulation::new(123);
        let mut ctx = sim.create_context("test");
        let mut resolve = |s: &str| utilization_model_resolver(s, &mut ctx);
        assert_eq!(resolve("Full").unwrap().get_utilization(5.), 1.);
        assert_eq!(resolve("Constant[value=0.25]").unwrap().get_utilization(5.), 0.25);
        let stochastic = resolve("Stochastic[seed=3]").unwrap();
        assert_eq!(stochastic.get_utilization(1.), stochastic.get_utilization(1.));
        assert!(matches!(resolve("Trace[path=no-such-file]"), Err(SimulationError::Trace(_))));
        assert!(resolve("Stochastic[seed=x]").is_err());
        assert!(resolve("Random").is_err());
    }

    #[test]
    fn test_non_finite_constant_utilization() {
        let mut sim = Simulation::new(123);
        let mut ctx = sim.create_context("test");
        for config_str in ["Constant[value=NaN]", "Constant[value=nan]", "Constant[value=inf]"] {
            assert!(matches!(
                utilization_model_resolver(config_str, &mut ctx),
                Err(SimulationError::Config(_))
            ));
        }
    }

    #[test]
    fn test_stochastic_seed_from_simulation() {
        let draw = |sim_seed: u64| -> Vec<f64> {
            let mut sim = Simulation::new(sim_seed);
            let mut ctx = sim.create_context("test");
            let first = utilization_model_resolver("Stochastic", &mut ctx).unwrap();
            let second = utilization_model_resolver("Stochastic", &mut ctx).unwrap();
            vec![first.get_utilization(1.), second.get_utilization(1.)]
        };
        assert_eq!(draw(42), draw(42));
        let values = draw(42);
        // each model gets its own seed
        assert_ne!(values[0], values[1]);
    }
}
