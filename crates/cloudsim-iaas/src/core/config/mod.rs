//! Simulation configuration.

pub mod options;
pub mod resolvers;
pub mod sim_config;

pub use options::{parse_config_value, parse_options};
pub use sim_config::SimulationConfig;
