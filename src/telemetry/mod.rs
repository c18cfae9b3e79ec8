//! Telemetry module - snapshot records and fire-and-forget sinks

mod export;
mod mqtt;

pub use export::*;
pub use mqtt::*;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{OperatingState, TickClock};
use crate::detection::{DetectionEvent, ThreatLevel};
use crate::sensors::{BatteryModel, PowerStatus, SensorSnapshot};

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Log every record at debug level
    pub log_records: bool,

    /// Enable file export
    pub export_enabled: bool,
    pub export_path: String,
    pub export_format: ExportFormat,
    /// Start a new file after this many records
    pub export_rotate_records: usize,

    /// Enable MQTT
    pub mqtt_enabled: bool,
    pub mqtt_broker: String,
    pub mqtt_port: u16,
    pub mqtt_client_id: String,
    pub mqtt_topic: String,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_records: true,

            export_enabled: false,
            export_path: "./data".to_string(),
            export_format: ExportFormat::Json,
            export_rotate_records: 86_400,

            mqtt_enabled: false,
            mqtt_broker: "localhost".to_string(),
            mqtt_port: 1883,
            mqtt_client_id: "avishield".to_string(),
            mqtt_topic: "avishield/telemetry".to_string(),
            mqtt_username: None,
            mqtt_password: None,
        }
    }
}

/// Export format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

/// Outbound telemetry record.
///
/// `state` and `threat` are enum ordinals. The `bird_*` fields are present only
/// while the latest detection is positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub uptime_ms: u64,
    pub state: u8,
    pub threat: u8,
    /// Percent
    pub battery: f64,
    /// Watts
    pub power: f64,
    /// Meters
    pub altitude: f64,
    /// °C
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bird_detected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bird_confidence: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bird_distance: Option<f64>,
}

/// Assemble a record from one consistent view of the controller
pub fn snapshot(
    clock: &TickClock,
    state: OperatingState,
    threat: ThreatLevel,
    sensors: &SensorSnapshot,
    power: &PowerStatus,
    battery: &BatteryModel,
    detection: Option<&DetectionEvent>,
) -> TelemetryRecord {
    let bird = detection.filter(|event| event.detected);

    TelemetryRecord {
        timestamp: clock.wall,
        uptime_ms: clock.uptime.as_millis() as u64,
        state: state.ordinal(),
        threat: threat.ordinal(),
        battery: battery.level_percent(power.battery_voltage),
        power: power.total_power(),
        altitude: sensors.altitude,
        temperature: sensors.temperature,
        bird_detected: bird.map(|_| true),
        bird_confidence: bird.map(|event| event.confidence),
        bird_distance: bird.map(|event| event.distance),
    }
}

/// Destination for telemetry records.
///
/// Publishing must not block. A failure loses only that record; the caller
/// never retries.
pub trait TelemetrySink {
    fn name(&self) -> &str;

    fn publish(&mut self, record: &TelemetryRecord) -> Result<()>;
}

/// Emits records through `tracing`
#[derive(Debug, Default)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn name(&self) -> &str {
        "log"
    }

    fn publish(&mut self, record: &TelemetryRecord) -> Result<()> {
        debug!("Telemetry: {}", serde_json::to_string(record)?);
        Ok(())
    }
}

/// Build every sink the configuration enables
pub fn sinks_from_config(config: &TelemetryConfig) -> Result<Vec<Box<dyn TelemetrySink>>> {
    let mut sinks: Vec<Box<dyn TelemetrySink>> = Vec::new();

    if config.log_records {
        sinks.push(Box::new(LogTelemetry));
    }
    if config.export_enabled {
        sinks.push(Box::new(TelemetryExporter::new(
            &config.export_path,
            config.export_format,
            config.export_rotate_records,
        )?));
    }
    if config.mqtt_enabled {
        sinks.push(Box::new(MqttTelemetry::new(config)?));
    }

    Ok(sinks)
}
