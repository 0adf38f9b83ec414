//! Energy meter calculates the host energy consumption.

/// Seconds in one hour, used to report energy in Wh.
pub const SECONDS_PER_HOUR: f64 = 3600.;

/// Integrates power over time.
///
/// Power is assumed to be constant between two updates, energy is only accrued forward in time.
#[derive(Debug, Clone, Default)]
pub struct EnergyMeter {
    // in W*s
    energy_consumed: f64,
    current_power: f64,
    prev_time: f64,
}

impl EnergyMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoked each time the host power consumption is changed to update the total energy consumption.
    ///
    /// Updates with time before the previous update are ignored.
    pub fn update(&mut self, time: f64, power: f64) {
        if time < self.prev_time {
            return;
        }
        self.energy_consumed += (time - self.prev_time) * self.current_power;
        self.current_power = power;
        self.prev_time = time;
    }

    /// Returns the power set by the last update in W.
    pub fn current_power(&self) -> f64 {
        self.current_power
    }

    /// Returns the energy consumed up to `time` in Wh without changing the meter state.
    pub fn energy_consumed(&self, time: f64) -> f64 {
        let pending = (time - self.prev_time).max(0.) * self.current_power;
        (self.energy_consumed + pending) / SECONDS_PER_HOUR
    }
}
