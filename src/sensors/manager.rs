// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor hub - refreshes collaborators and keeps last-known values

use std::time::Duration;

use tracing::{debug, warn};

use super::{FlightSensors, PowerMonitor, PowerStatus, SensorSnapshot};

/// Read counters for the health check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorStats {
    pub readings: u64,
    pub faults: u64,
}

/// Owns the flight and power collaborators and the last good reading of each
pub struct SensorHub {
    flight: Box<dyn FlightSensors>,
    power: Box<dyn PowerMonitor>,
    latest_sensors: SensorSnapshot,
    latest_power: PowerStatus,
    flight_ok_at: Option<Duration>,
    power_ok_at: Option<Duration>,
    faults_since_check: u32,
    stats: SensorStats,
}

impl SensorHub {
    pub fn new(flight: Box<dyn FlightSensors>, power: Box<dyn PowerMonitor>) -> Self {
        Self {
            flight,
            power,
            latest_sensors: SensorSnapshot::default(),
            latest_power: PowerStatus::default(),
            flight_ok_at: None,
            power_ok_at: None,
            faults_since_check: 0,
            stats: SensorStats::default(),
        }
    }

    /// Read both collaborators. A failed read keeps the previous value.
    ///
    /// Returns `true` when both reads succeeded.
    pub fn refresh(&mut self, now: Duration) -> bool {
        let mut ok = true;

        match self.flight.read() {
            Ok(snapshot) => {
                self.latest_sensors = snapshot;
                self.flight_ok_at = Some(now);
                self.stats.readings += 1;
            }
            Err(e) => {
                ok = false;
                self.record_fault();
                debug!("Flight sensor read failed on {}: {:#}", self.flight.id(), e);
            }
        }

        match self.power.read() {
            Ok(status) => {
                self.latest_power = status;
                self.power_ok_at = Some(now);
                self.stats.readings += 1;
            }
            Err(e) => {
                ok = false;
                self.record_fault();
                debug!("Power monitor read failed on {}: {:#}", self.power.id(), e);
            }
        }

        ok
    }

    fn record_fault(&mut self) {
        self.faults_since_check = self.faults_since_check.saturating_add(1);
        self.stats.faults += 1;
        if self.stats.faults == 1 {
            warn!("First sensor fault recorded; holding last-known values");
        }
    }

    pub fn sensors(&self) -> &SensorSnapshot {
        &self.latest_sensors
    }

    pub fn power(&self) -> &PowerStatus {
        &self.latest_power
    }

    pub fn stats(&self) -> SensorStats {
        self.stats
    }

    /// Faults since the previous call
    pub fn take_faults(&mut self) -> u32 {
        std::mem::take(&mut self.faults_since_check)
    }

    /// Age of the oldest of the two last-good readings, measured from boot if never read
    pub fn staleness(&self, now: Duration) -> Duration {
        let age = |at: Option<Duration>| now.saturating_sub(at.unwrap_or(Duration::ZERO));
        age(self.flight_ok_at).max(age(self.power_ok_at))
    }
}
