//! Config utils.

use std::collections::HashMap;
use std::str::FromStr;

use crate::core::error::SimulationError;

/// Parses config value string, which consists of two parts - name and options.
/// Example: `Linear[static=35,max=50]` parts are name `Linear` and options string `static=35,max=50`.
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.trim().split_once('[') {
        Some((l, r)) => (l.trim().to_string(), Some(r.replace(']', ""))),
        None => (config_str.trim().to_string(), None),
    }
}

/// Parses options string from config value, returns map with option names and values.
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    options
}

/// Reads and parses a required option.
pub fn required_option<T: FromStr>(
    options: &HashMap<String, String>,
    name: &str,
    config_str: &str,
) -> Result<T, SimulationError> {
    let value = options
        .get(name)
        .ok_or_else(|| SimulationError::Config(format!("option `{}` is missing in {}", name, config_str)))?;
    value.parse::<T>().map_err(|_| {
        SimulationError::Config(format!(
            "option `{}` has invalid value `{}` in {}",
            name, value, config_str
        ))
    })
}
