//! A collection of utilization models.

pub mod constant;
pub mod full;
pub mod stochastic;
pub mod trace;
