//! Core module - control loop state, transitions and orchestration

mod controller;
mod health;
mod runner;
mod scheduler;
mod state_machine;

pub use controller::{Controller, ControllerState, Peripherals, TickOutcome};
pub use health::{HealthIssue, HealthMonitor, HealthReport};
pub use runner::{run_blocking, RunStats, Runner, SHUTDOWN_GRACE};
pub use scheduler::{Gate, Gates};
pub use state_machine::{transition, OperatingState, StateMachine, ACTIVE_TIMEOUT};

use chrono::{DateTime, TimeZone, Utc};
use std::time::{Duration, Instant};

/// Time as seen by one tick: monotonic uptime for gates and timers, wall
/// clock for telemetry timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickClock {
    pub uptime: Duration,
    pub wall: DateTime<Utc>,
}

impl TickClock {
    pub fn new(uptime: Duration, wall: DateTime<Utc>) -> Self {
        Self { uptime, wall }
    }

    /// Read both clocks relative to `started`
    pub fn since(started: Instant) -> Self {
        Self::new(started.elapsed(), Utc::now())
    }

    /// A clock `ms` after the Unix epoch, for replay and tests
    pub fn from_millis(ms: u64) -> Self {
        let wall = Utc
            .timestamp_millis_opt(ms as i64)
            .single()
            .unwrap_or_else(Utc::now);
        Self::new(Duration::from_millis(ms), wall)
    }
}
