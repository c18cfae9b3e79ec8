// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Configuration module

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::telemetry::TelemetryConfig;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Log level
    pub log_level: String,

    /// Enable demo mode (simulated sensors and detections)
    pub demo_mode: bool,

    /// Control loop configuration
    pub controller: ControllerConfig,

    /// Strobe and audio output configuration
    pub deterrent: DeterrentConfig,

    /// Battery model
    pub power: PowerConfig,

    /// Emergency-stop wiring
    pub emergency: EmergencyConfig,

    /// Detection link
    pub detection: DetectionLinkConfig,

    /// Telemetry sinks
    pub telemetry: TelemetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "AviShield".to_string(),
            log_level: "info".to_string(),
            demo_mode: false,
            controller: ControllerConfig::default(),
            deterrent: DeterrentConfig::default(),
            power: PowerConfig::default(),
            emergency: EmergencyConfig::default(),
            detection: DetectionLinkConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {:?}", path))?;
        config.validate()?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("avishield"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Reject settings the control loop cannot run with
    pub fn validate(&self) -> Result<()> {
        let c = &self.controller;
        if c.tick_interval_ms == 0 {
            bail!("controller.tick_interval_ms must be positive");
        }
        if c.sensor_interval_ms == 0 || c.telemetry_interval_ms == 0 || c.health_interval_ms == 0 {
            bail!("controller gate intervals must be positive");
        }
        if c.active_timeout_secs == 0 {
            bail!("controller.active_timeout_secs must be positive");
        }

        let d = &self.deterrent;
        if d.strobe_period_ms == 0 {
            bail!("deterrent.strobe_period_ms must be positive");
        }
        if d.audio_deviation_hz > d.audio_center_hz {
            bail!(
                "deterrent.audio_deviation_hz ({}) exceeds audio_center_hz ({})",
                d.audio_deviation_hz,
                d.audio_center_hz
            );
        }

        let p = &self.power;
        if !(p.battery_min_voltage < p.battery_max_voltage) {
            bail!(
                "power.battery_min_voltage ({}) must be below battery_max_voltage ({})",
                p.battery_min_voltage,
                p.battery_max_voltage
            );
        }
        if !(0.0..=100.0).contains(&p.low_battery_percent) {
            bail!("power.low_battery_percent must be within 0-100");
        }

        if self.emergency.enabled && self.emergency.gpio_value_path.is_none() {
            bail!("emergency.enabled requires emergency.gpio_value_path");
        }

        if self.detection.max_messages_per_tick == 0 {
            bail!("detection.max_messages_per_tick must be positive");
        }

        Ok(())
    }
}

/// Control loop timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Main loop period (20 Hz)
    pub tick_interval_ms: u64,

    /// Tick duration above which an overrun is counted
    pub tick_budget_ms: u64,

    /// Sensor refresh gate (10 Hz)
    pub sensor_interval_ms: u64,

    /// Telemetry gate (1 Hz)
    pub telemetry_interval_ms: u64,

    /// Health check gate (0.2 Hz)
    pub health_interval_ms: u64,

    /// Sensor data older than this is reported stale
    pub sensor_stale_ms: u64,

    /// Active state auto-timeout
    pub active_timeout_secs: u64,

    /// Restart the Active timeout when a new Medium/High detection arrives while already Active
    pub rearm_on_new_detection: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            tick_budget_ms: 50,
            sensor_interval_ms: 100,
            telemetry_interval_ms: 1000,
            health_interval_ms: 5000,
            sensor_stale_ms: 1000,
            active_timeout_secs: 60,
            rearm_on_new_detection: false,
        }
    }
}

impl ControllerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn tick_budget(&self) -> Duration {
        Duration::from_millis(self.tick_budget_ms)
    }

    pub fn active_timeout(&self) -> Duration {
        Duration::from_secs(self.active_timeout_secs)
    }
}

/// Strobe and audio output shaping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeterrentConfig {
    /// Strobe intensity in Alert (~20%)
    pub alert_intensity: u8,

    /// Strobe intensity in Active
    pub active_intensity: u8,

    /// Rotation period of the four-channel strobe pattern
    pub strobe_period_ms: u64,

    /// Center of the distress-call sweep
    pub audio_center_hz: f64,

    /// Sweep half-range
    pub audio_deviation_hz: f64,

    /// Sweep rate in radians per millisecond
    pub audio_sweep_rate: f64,
}

impl Default for DeterrentConfig {
    fn default() -> Self {
        Self {
            alert_intensity: 50,
            active_intensity: 255,
            strobe_period_ms: 1000,
            audio_center_hz: 2000.0,
            audio_deviation_hz: 500.0,
            audio_sweep_rate: 0.01,
        }
    }
}

/// Battery model for a 3S LiPo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    pub battery_min_voltage: f64,
    pub battery_max_voltage: f64,
    pub low_battery_percent: f64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            battery_min_voltage: 9.0,
            battery_max_voltage: 12.6,
            low_battery_percent: 30.0,
        }
    }
}

/// Emergency-stop wiring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyConfig {
    /// Read a physical switch
    pub enabled: bool,

    /// Switch pulls the line low when pressed
    pub active_low: bool,

    /// sysfs GPIO value file
    pub gpio_value_path: Option<PathBuf>,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            active_low: true,
            gpio_value_path: None,
        }
    }
}

/// Where detections come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSourceKind {
    Stdin,
    Serial,
    Simulated,
}

/// Detection link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionLinkConfig {
    pub source: DetectionSourceKind,

    /// UART to the detection computer
    pub serial_port: String,

    pub baud_rate: u32,

    /// Silence longer than this is reported by the health check
    pub link_timeout_secs: u64,

    /// Upper bound on messages ingested in one tick
    pub max_messages_per_tick: usize,

    /// Reader-task queue depth
    pub queue_capacity: usize,
}

impl Default for DetectionLinkConfig {
    fn default() -> Self {
        Self {
            source: DetectionSourceKind::Stdin,
            serial_port: "/dev/ttyAMA0".to_string(),
            baud_rate: 115_200,
            link_timeout_secs: 5,
            max_messages_per_tick: 16,
            queue_capacity: 64,
        }
    }
}
