// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor traits and common types

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// GPS position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
}

/// Flight sensor readings for one refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// m/s², body frame
    pub accel: [f64; 3],
    /// rad/s, body frame
    pub gyro: [f64; 3],
    /// °C
    pub temperature: f64,
    /// Pa
    pub pressure: f64,
    /// Meters, barometric against 1013.25 hPa
    pub altitude: f64,
    pub gps: Option<GpsFix>,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            accel: [0.0; 3],
            gyro: [0.0; 3],
            temperature: 0.0,
            pressure: 101_325.0,
            altitude: 0.0,
            gps: None,
        }
    }
}

/// Voltage/current pair measured on one supply rail
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RailReading {
    pub voltage: f64,
    pub current: f64,
}

impl RailReading {
    pub fn new(voltage: f64, current: f64) -> Self {
        Self { voltage, current }
    }

    /// Watts
    pub fn power(&self) -> f64 {
        self.voltage * self.current
    }
}

/// Power measurements for one refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerStatus {
    pub battery_voltage: f64,
    pub rail_12v: RailReading,
    pub rail_5v: RailReading,
    pub rail_3v3: RailReading,
}

impl PowerStatus {
    /// Total draw across all rails in watts
    pub fn total_power(&self) -> f64 {
        self.rail_12v.power() + self.rail_5v.power() + self.rail_3v3.power()
    }
}

/// IMU, barometer and GPS behind one read
pub trait FlightSensors {
    fn id(&self) -> &str;

    /// Read all flight sensors. Must return within the tick budget.
    fn read(&mut self) -> Result<SensorSnapshot>;
}

/// Battery and rail power measurement
pub trait PowerMonitor {
    fn id(&self) -> &str;

    fn read(&mut self) -> Result<PowerStatus>;
}

/// A digital input pin. `true` is electrically high.
pub trait LevelInput {
    fn read_level(&mut self) -> Result<bool>;
}
