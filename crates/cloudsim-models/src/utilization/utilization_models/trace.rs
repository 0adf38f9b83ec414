//! Trace-driven utilization model.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::utilization::utilization_model::UtilizationModel;

/// Errors raised while loading a utilization trace.
#[derive(Error, Debug)]
pub enum TraceError {
    /// Trace file can not be read.
    #[error("can't read trace file: {0}")]
    Io(#[from] std::io::Error),
    /// Trace file contains a line which is not a number.
    #[error("line {line}: `{value}` is not a utilization percentage")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Offending line content.
        value: String,
    },
    /// Sample is not a finite number.
    #[error("sample {index} is not a finite number: {value}")]
    InvalidSample {
        /// 0-based sample index.
        index: usize,
        /// Offending sample.
        value: f64,
    },
    /// Trace contains no samples.
    #[error("trace is empty")]
    Empty,
    /// Sampling interval is not positive.
    #[error("sampling interval must be positive, got {0}")]
    InvalidInterval(f64),
}

/// Utilization defined by samples taken at a fixed interval, with linear interpolation between them.
///
/// After the last sample the utilization stays at the last value.
#[derive(Clone, Debug)]
pub struct TraceUtilizationModel {
    samples: Vec<f64>,
    interval: f64,
}

impl TraceUtilizationModel {
    /// Creates the model from samples in 0.0-1.0 range taken every `interval` seconds starting from time 0.
    pub fn new(samples: Vec<f64>, interval: f64) -> Result<Self, TraceError> {
        if samples.is_empty() {
            return Err(TraceError::Empty);
        }
        if interval.is_nan() || interval <= 0. {
            return Err(TraceError::InvalidInterval(interval));
        }
        if let Some((index, &value)) = samples.iter().enumerate().find(|(_, s)| !s.is_finite()) {
            return Err(TraceError::InvalidSample { index, value });
        }
        let samples = samples.into_iter().map(|s| s.clamp(0., 1.)).collect();
        Ok(Self { samples, interval })
    }

    /// Parses a PlanetLab-style trace: one utilization percentage (0-100) per line, blank lines are skipped.
    pub fn parse(content: &str, interval: f64) -> Result<Self, TraceError> {
        let mut samples = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let percent = line
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite())
                .ok_or_else(|| TraceError::Parse {
                    line: i + 1,
                    value: line.to_string(),
                })?;
            samples.push(percent / 100.);
        }
        Self::new(samples, interval)
    }

    /// Loads a PlanetLab-style trace from file, see [`parse`](Self::parse).
    pub fn from_file<P: AsRef<Path>>(path: P, interval: f64) -> Result<Self, TraceError> {
        Self::parse(&fs::read_to_string(path)?, interval)
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `false`, traces are never empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl UtilizationModel for TraceUtilizationModel {
    fn get_utilization(&self, time: f64) -> f64 {
        let position = time.max(0.) / self.interval;
        let last = self.samples.len() - 1;
        let floor_idx = position.floor() as usize;
        if floor_idx >= last {
            return self.samples[last];
        }
        let floor_value = self.samples[floor_idx];
        let ceil_value = self.samples[floor_idx + 1];
        floor_value + (ceil_value - floor_value) * (position - floor_idx as f64)
    }

    fn is_constant_after(&self, time: f64) -> bool {
        time >= (self.samples.len() - 1) as f64 * self.interval
    }
}
