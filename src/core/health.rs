// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Periodic health check. Reports conditions, never acts on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::Config;
use crate::sensors::{BatteryModel, SensorHub};

/// A condition worth an operator's attention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HealthIssue {
    /// Sensor read failures since the previous check
    SensorFaults { count: u32 },
    /// No successful sensor read for this long
    SensorsStale { age_ms: u64 },
    LowBattery { percent: f64 },
    /// Detection computer quiet since its last message
    DetectionLinkSilent { secs: u64 },
    /// Telemetry records lost since the previous check
    TelemetryDropped { count: u32 },
    /// Ticks over budget since the previous check
    TickOverruns { count: u32 },
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthIssue::SensorFaults { count } => write!(f, "{} sensor read faults", count),
            HealthIssue::SensorsStale { age_ms } => write!(f, "sensor data {} ms old", age_ms),
            HealthIssue::LowBattery { percent } => write!(f, "battery low at {:.0}%", percent),
            HealthIssue::DetectionLinkSilent { secs } => {
                write!(f, "no detection message for {} s", secs)
            }
            HealthIssue::TelemetryDropped { count } => {
                write!(f, "{} telemetry records dropped", count)
            }
            HealthIssue::TickOverruns { count } => write!(f, "{} ticks over budget", count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub at: DateTime<Utc>,
    pub issues: Vec<HealthIssue>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Accumulates counters between checks and turns them into a report
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    sensor_stale: Duration,
    link_timeout: Duration,
    battery: BatteryModel,
    telemetry_dropped: u32,
    tick_overruns: u32,
}

impl HealthMonitor {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sensor_stale: Duration::from_millis(config.controller.sensor_stale_ms),
            link_timeout: Duration::from_secs(config.detection.link_timeout_secs),
            battery: BatteryModel::from_config(&config.power),
            telemetry_dropped: 0,
            tick_overruns: 0,
        }
    }

    pub fn note_telemetry_dropped(&mut self) {
        self.telemetry_dropped = self.telemetry_dropped.saturating_add(1);
    }

    pub fn note_overrun(&mut self) {
        self.tick_overruns = self.tick_overruns.saturating_add(1);
    }

    /// Build a report and reset the per-check counters.
    ///
    /// `last_message_at` is the uptime of the latest detection message; the
    /// link is not judged until one has arrived.
    pub fn check(
        &mut self,
        now: Duration,
        wall: DateTime<Utc>,
        sensors: &mut SensorHub,
        last_message_at: Option<Duration>,
    ) -> HealthReport {
        let mut issues = Vec::new();

        let faults = sensors.take_faults();
        if faults > 0 {
            issues.push(HealthIssue::SensorFaults { count: faults });
        }

        let age = sensors.staleness(now);
        if age > self.sensor_stale {
            issues.push(HealthIssue::SensorsStale {
                age_ms: age.as_millis() as u64,
            });
        }

        let voltage = sensors.power().battery_voltage;
        if self.battery.is_low(voltage) {
            issues.push(HealthIssue::LowBattery {
                percent: self.battery.level_percent(voltage),
            });
        }

        if let Some(at) = last_message_at {
            let silent = now.saturating_sub(at);
            if silent > self.link_timeout {
                issues.push(HealthIssue::DetectionLinkSilent {
                    secs: silent.as_secs(),
                });
            }
        }

        let dropped = std::mem::take(&mut self.telemetry_dropped);
        if dropped > 0 {
            issues.push(HealthIssue::TelemetryDropped { count: dropped });
        }

        let overruns = std::mem::take(&mut self.tick_overruns);
        if overruns > 0 {
            issues.push(HealthIssue::TickOverruns { count: overruns });
        }

        HealthReport { at: wall, issues }
    }
}
