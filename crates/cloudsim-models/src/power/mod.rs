//! Host power consumption models.

pub mod power_model;
pub mod power_models;
