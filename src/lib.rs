// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! AviShield - Onboard Bird-Deterrent Controller
//!
//! Runs on a delivery drone's companion computer and drives strobe and audio
//! deterrents from the bird detections reported by the vision computer:
//! - Threat scoring of each detection (distance, confidence, species)
//! - Standby / Alert / Active / Emergency state machine with Active timeout
//! - Phase-shifted 4-channel strobe and swept distress-call audio
//! - Periodic telemetry to log, file and MQTT sinks
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Controller tick                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  E-stop → Sensors → Detections → State machine → Deterrent   │
//! │  (every)  (gated)   (score each)  (every)        (every)     │
//! │                                          ↓                   │
//! │                     Telemetry (gated)   Health (gated)       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod detection;
pub mod deterrent;
pub mod sensors;
pub mod telemetry;

// Re-exports for convenience
pub use config::Config;
pub use core::{Controller, OperatingState, Peripherals, Runner, TickClock};
pub use detection::{score, DetectionEvent, DetectionSource, Species, ThreatLevel};
pub use deterrent::{render, Actuator, DeterrentCommand};
pub use telemetry::{snapshot, TelemetryRecord, TelemetrySink};

/// AviShield version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// AviShield name
pub const NAME: &str = "AviShield";

/// Build info
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: VERSION.to_string(),
        rust_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
        target: std::env::consts::ARCH.to_string(),
        os: std::env::consts::OS.to_string(),
        features: enabled_features(),
    }
}

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version string
    pub version: String,
    /// Rust version
    pub rust_version: String,
    /// Target architecture
    pub target: String,
    /// Operating system
    pub os: String,
    /// Enabled features
    pub features: Vec<String>,
}

fn enabled_features() -> Vec<String> {
    [("serial", cfg!(feature = "serial"))]
        .into_iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| name.to_string())
        .collect()
}
