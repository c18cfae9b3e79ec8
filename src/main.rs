// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! AviShield - Onboard Bird-Deterrent Controller
//!
//! Reads bird detections from the vision computer, scores each one, and
//! drives the strobe and audio deterrents through a four-state machine while
//! reporting telemetry.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use avishield::config::DetectionSourceKind;
use avishield::core::{run_blocking, Peripherals, Runner};
use avishield::detection::{ChannelDetections, DetectionSource};
use avishield::deterrent::TracingActuator;
use avishield::sensors::{EmergencyStop, SensorHub, SimulatedDetections, SimulatedFlight, SimulatedPower};
use avishield::telemetry::sinks_from_config;
use avishield::{Config, NAME, VERSION};

/// AviShield - Onboard Bird-Deterrent Controller
#[derive(Parser, Debug)]
#[command(name = "avishield")]
#[command(author = "AviShield Project")]
#[command(version = VERSION)]
#[command(about = "Bird threat assessment and strobe/audio deterrent control for delivery drones")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Demo mode with simulated sensors and bird encounters
    #[arg(long)]
    demo: bool,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// MQTT broker address (enables MQTT telemetry)
    #[arg(long)]
    mqtt_broker: Option<String>,

    /// Telemetry export directory (enables file export)
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Detection computer serial port (selects the serial link)
    #[arg(long)]
    serial_port: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{} v{} - Onboard Bird-Deterrent Controller", NAME, VERSION);

    // Override with command line args
    if args.demo {
        config.demo_mode = true;
    }
    if let Some(mqtt) = args.mqtt_broker {
        config.telemetry.mqtt_enabled = true;
        config.telemetry.mqtt_broker = mqtt;
    }
    if let Some(dir) = args.export_dir {
        config.telemetry.export_enabled = true;
        config.telemetry.export_path = dir.to_string_lossy().into_owned();
    }
    if let Some(port) = args.serial_port {
        config.detection.source = DetectionSourceKind::Serial;
        config.detection.serial_port = port;
    }
    config.validate()?;

    info!("Configuration loaded from {:?}", config_path);
    info!("Demo mode: {}", config.demo_mode);

    // The stdin reader may still be parked in a read; do not wait for it
    run_blocking(run(config, args.ticks))??;

    Ok(())
}

async fn run(config: Config, ticks: Option<u64>) -> Result<()> {
    let peripherals = build_peripherals(&config)?;
    let sinks = sinks_from_config(&config.telemetry)?;
    info!(
        "Telemetry sinks: {}",
        sinks.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
    );

    let runner = Runner::new(&config, peripherals, Box::new(TracingActuator::new()), sinks)
        .with_max_ticks(ticks);

    let stats = runner.run().await?;
    info!("{} shutdown complete ({} ticks)", NAME, stats.ticks);
    Ok(())
}

fn build_peripherals(config: &Config) -> Result<Peripherals> {
    if !config.demo_mode {
        // Flight controller and INA219 drivers are board specific; the
        // simulated models stand in until one is configured.
        warn!("No flight sensor or power monitor driver configured; using simulated readings");
    }

    let sensors = SensorHub::new(
        Box::new(SimulatedFlight::new("sim-imu", None)),
        Box::new(SimulatedPower::new("sim-ina219", None)),
    );

    let detections = detection_source(config)?;
    info!("Detection source: {}", detections.name());

    Ok(Peripherals {
        sensors,
        detections,
        emergency: EmergencyStop::from_config(&config.emergency),
    })
}

fn detection_source(config: &Config) -> Result<Box<dyn DetectionSource>> {
    let link = &config.detection;
    let source = if config.demo_mode {
        DetectionSourceKind::Simulated
    } else {
        link.source
    };

    match source {
        DetectionSourceKind::Simulated => Ok(Box::new(SimulatedDetections::new(None))),
        DetectionSourceKind::Stdin => Ok(Box::new(ChannelDetections::from_stdin(
            link.queue_capacity,
            link.max_messages_per_tick,
        ))),
        DetectionSourceKind::Serial => serial_source(config),
    }
}

#[cfg(feature = "serial")]
fn serial_source(config: &Config) -> Result<Box<dyn DetectionSource>> {
    let link = &config.detection;
    Ok(Box::new(avishield::detection::SerialDetections::open(
        &link.serial_port,
        link.baud_rate,
    )?))
}

#[cfg(not(feature = "serial"))]
fn serial_source(_config: &Config) -> Result<Box<dyn DetectionSource>> {
    anyhow::bail!("Serial feature not enabled. Build with --features serial or use the stdin source")
}
