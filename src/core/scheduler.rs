// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Timer gates for periodic work inside the control loop

use std::time::Duration;
use tracing::debug;

use crate::config::ControllerConfig;

/// Decides whether a periodic activity runs on this tick.
///
/// Each gate keeps its own last-fired time, so a late or skipped tick for one
/// activity never shifts another.
#[derive(Debug, Clone)]
pub struct Gate {
    name: &'static str,
    interval: Duration,
    last_fired: Option<Duration>,
}

impl Gate {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        debug!("Gate '{}' every {:?}", name, interval);
        Self {
            name,
            interval,
            last_fired: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fires on first evaluation, then once `interval` has elapsed since the last firing
    pub fn ready(&mut self, now: Duration) -> bool {
        let due = match self.last_fired {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.interval,
        };
        if due {
            self.last_fired = Some(now);
        }
        due
    }
}

/// The controller's independent gates
#[derive(Debug, Clone)]
pub struct Gates {
    pub sensors: Gate,
    pub telemetry: Gate,
    pub health: Gate,
}

impl Gates {
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            sensors: Gate::new("sensors", Duration::from_millis(config.sensor_interval_ms)),
            telemetry: Gate::new("telemetry", Duration::from_millis(config.telemetry_interval_ms)),
            health: Gate::new("health", Duration::from_millis(config.health_interval_ms)),
        }
    }
}
