//! Simulation tuning knobs.
//!
//! Durations and probabilities are policy, not protocol, so every one of them
//! is configurable. The defaults reproduce the production cadence: 300-tick
//! halves on a one-second clock, a 30 s break and one minute of extra time.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Longest half whose end (`2 * match_duration`) still fits the clock.
pub const MAX_MATCH_DURATION: u32 = u32::MAX / 2;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Quiescence wait before every discovery pass.
    pub startup_delay_secs: u64,
    /// Clock ticks per half. Half-time falls on `match_duration`, the end of
    /// the second half on `2 * match_duration`.
    pub match_duration: u32,
    /// Length of the half-time break.
    pub break_secs: u64,
    /// Wait between the end of the second half and full time.
    pub extra_time_secs: u64,
    /// Wall-clock length of one tick.
    pub tick_millis: u64,
    /// Per-fixture goal cap for one cycle.
    pub max_goals: u32,
    /// Upper bound on fixtures launched per cycle, and the size of every
    /// regenerated batch.
    pub batch_size: usize,
    /// Chance that a tick asks the generator for an event.
    pub event_probability: f64,
    /// How long a completed fixture stays in the live cache.
    pub retention_secs: u64,
    /// Seed for every random draw. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            startup_delay_secs: 30,
            match_duration: 300,
            break_secs: 30,
            extra_time_secs: 60,
            tick_millis: 1000,
            max_goals: 3,
            batch_size: 249,
            event_probability: 0.05,
            retention_secs: 600,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn break_interval(&self) -> Duration {
        Duration::from_secs(self.break_secs)
    }

    pub fn extra_time(&self) -> Duration {
        Duration::from_secs(self.extra_time_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Reject values the runtime cannot honor (zero-length ticks, empty
    /// batches, probabilities outside `[0, 1]`).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.match_duration == 0 {
            return Err(ConfigError {
                field: "match_duration",
                reason: "must be at least one tick",
            });
        }
        if self.match_duration > MAX_MATCH_DURATION {
            return Err(ConfigError {
                field: "match_duration",
                reason: "second half would end past the clock's range",
            });
        }
        if self.tick_millis == 0 {
            return Err(ConfigError {
                field: "tick_millis",
                reason: "must be at least 1 ms",
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError {
                field: "batch_size",
                reason: "must be at least 1",
            });
        }
        if !(0.0..=1.0).contains(&self.event_probability) {
            return Err(ConfigError {
                field: "event_probability",
                reason: "must lie within [0, 1]",
            });
        }
        Ok(())
    }
}
