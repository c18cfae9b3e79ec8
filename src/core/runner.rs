// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Fixed-rate driver for the controller

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{Controller, Peripherals, TickClock, TickOutcome};
use crate::config::Config;
use crate::deterrent::{Actuator, DeterrentCommand};
use crate::telemetry::TelemetrySink;

/// How long shutdown waits on tasks parked in blocking reads
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// Drive `future` on a current-thread runtime, then shut the runtime down
/// without waiting for blocking reads that may never return (an open stdin pipe).
pub fn run_blocking<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let output = rt.block_on(future);
    rt.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}

/// Counters kept across a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub overruns: u64,
    pub worst_tick: Duration,
    pub telemetry_published: u64,
    pub telemetry_dropped: u64,
}

/// Ticks the controller, applies its output and fans out telemetry
pub struct Runner {
    controller: Controller,
    peripherals: Peripherals,
    actuator: Box<dyn Actuator>,
    sinks: Vec<Box<dyn TelemetrySink>>,
    tick_interval: Duration,
    budget: Duration,
    max_ticks: Option<u64>,
    stats: RunStats,
}

impl Runner {
    pub fn new(
        config: &Config,
        peripherals: Peripherals,
        actuator: Box<dyn Actuator>,
        sinks: Vec<Box<dyn TelemetrySink>>,
    ) -> Self {
        Self {
            controller: Controller::new(config),
            peripherals,
            actuator,
            sinks,
            tick_interval: config.controller.tick_interval(),
            budget: config.controller.tick_budget(),
            max_ticks: None,
            stats: RunStats::default(),
        }
    }

    /// Stop after this many ticks instead of waiting for Ctrl-C
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Run one tick and deliver its outputs
    pub fn step(&mut self, clock: &TickClock) -> TickOutcome {
        let started = Instant::now();

        let outcome = self.controller.tick(clock, &mut self.peripherals);

        if let Err(e) = self.actuator.apply(&outcome.command) {
            warn!("Actuator rejected command: {:#}", e);
        }

        if let Some(record) = &outcome.telemetry {
            for sink in self.sinks.iter_mut() {
                match sink.publish(record) {
                    Ok(()) => self.stats.telemetry_published += 1,
                    Err(e) => {
                        warn!("Telemetry dropped by {}: {:#}", sink.name(), e);
                        self.stats.telemetry_dropped += 1;
                        self.controller.note_telemetry_dropped();
                    }
                }
            }
        }

        if let Some(report) = &outcome.health {
            for issue in &report.issues {
                warn!("Health: {}", issue);
            }
        }

        let elapsed = started.elapsed();
        self.stats.ticks += 1;
        self.stats.worst_tick = self.stats.worst_tick.max(elapsed);
        if elapsed > self.budget {
            self.stats.overruns += 1;
            self.controller.note_overrun();
            debug!("Tick {} took {:?} (budget {:?})", self.stats.ticks, elapsed, self.budget);
        }

        outcome
    }

    /// Tick at the configured rate until Ctrl-C or the tick limit
    pub async fn run(mut self) -> Result<RunStats> {
        let started = Instant::now();
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!(
            "Control loop running every {:?} (detections from {})",
            self.tick_interval,
            self.peripherals.detections.name()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = interval.tick() => {
                    self.step(&TickClock::since(started));
                    if self.max_ticks.is_some_and(|max| self.stats.ticks >= max) {
                        break;
                    }
                }
            }
        }

        if let Err(e) = self.actuator.apply(&DeterrentCommand::off()) {
            warn!("Failed to switch deterrent off: {:#}", e);
        }

        info!(
            "Control loop stopped after {} ticks ({} overruns, worst {:?}, {} telemetry dropped)",
            self.stats.ticks, self.stats.overruns, self.stats.worst_tick, self.stats.telemetry_dropped
        );
        Ok(self.stats)
    }
}
