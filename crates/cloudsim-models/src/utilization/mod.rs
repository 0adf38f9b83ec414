//! Resource utilization models.

pub mod utilization_model;
pub mod utilization_models;

#[cfg(test)]
mod tests;
