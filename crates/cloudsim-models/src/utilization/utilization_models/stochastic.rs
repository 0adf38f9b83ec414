//! Stochastic utilization model.

use std::cell::RefCell;
use std::collections::HashMap;

use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::utilization::utilization_model::UtilizationModel;

/// Draws utilization uniformly from 0.0-1.0 range using its own seeded generator.
///
/// Values are cached by time, so repeated queries for the same moment agree
/// and the sequence depends only on the seed and the order of distinct queried times.
#[derive(Clone)]
pub struct StochasticUtilizationModel {
    rng: RefCell<Pcg64>,
    history: RefCell<HashMap<u64, f64>>,
}

impl StochasticUtilizationModel {
    /// Creates the model with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RefCell::new(Pcg64::seed_from_u64(seed)),
            history: RefCell::new(HashMap::new()),
        }
    }
}

impl UtilizationModel for StochasticUtilizationModel {
    fn get_utilization(&self, time: f64) -> f64 {
        *self
            .history
            .borrow_mut()
            .entry(time.to_bits())
            .or_insert_with(|| self.rng.borrow_mut().gen_range(0.0..=1.0))
    }
}
