// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Cycle orchestrator - owns the mutable control state and runs one tick at a time

use std::time::Duration;

use tracing::{debug, info};

use super::{Gates, HealthMonitor, HealthReport, OperatingState, StateMachine, TickClock};
use crate::config::Config;
use crate::detection::{score_breakdown, DetectionEvent, DetectionSource, ThreatLevel};
use crate::deterrent::{DeterrentCommand, DeterrentDriver};
use crate::sensors::{BatteryModel, EmergencyStop, SensorHub};
use crate::telemetry::{self, TelemetryRecord};

/// Everything the controller remembers between ticks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerState {
    pub state: OperatingState,
    /// Threat of the most recent detection event
    pub threat: ThreatLevel,
    /// Uptime at which Active was entered
    pub active_since: Option<Duration>,
    /// Set when the Active timeout fired; caps the threat at Low until a new event arrives
    pub timeout_hold: bool,
    pub latest_detection: Option<DetectionEvent>,
    /// Uptime of the most recent detection message
    pub last_message_at: Option<Duration>,
}

impl ControllerState {
    /// Threat fed to the state machine this tick
    pub fn effective_threat(&self) -> ThreatLevel {
        if self.timeout_hold {
            self.threat.min(ThreatLevel::Low)
        } else {
            self.threat
        }
    }

    pub fn time_in_active(&self, now: Duration) -> Duration {
        self.active_since
            .map(|since| now.saturating_sub(since))
            .unwrap_or(Duration::ZERO)
    }
}

/// Collaborators read during a tick
pub struct Peripherals {
    pub sensors: SensorHub,
    pub detections: Box<dyn DetectionSource>,
    pub emergency: EmergencyStop,
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub state: OperatingState,
    pub threat: ThreatLevel,
    pub command: DeterrentCommand,
    /// Present when the telemetry gate fired
    pub telemetry: Option<TelemetryRecord>,
    /// Present when the health gate fired
    pub health: Option<HealthReport>,
    /// True when any transition happened during the tick
    pub state_changed: bool,
    /// States entered this tick, in order; one transition runs per ingested event
    pub transitions: Vec<OperatingState>,
}

/// Runs the fixed per-tick sequence over the pure components
pub struct Controller {
    machine: StateMachine,
    driver: DeterrentDriver,
    battery: BatteryModel,
    gates: Gates,
    health: HealthMonitor,
    rearm_on_new_detection: bool,
    state: ControllerState,
}

impl Controller {
    pub fn new(config: &Config) -> Self {
        Self {
            machine: StateMachine::new(config.controller.active_timeout()),
            driver: DeterrentDriver::from_config(&config.deterrent),
            battery: BatteryModel::from_config(&config.power),
            gates: Gates::from_config(&config.controller),
            health: HealthMonitor::from_config(config),
            rearm_on_new_detection: config.controller.rearm_on_new_detection,
            state: ControllerState::default(),
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn note_telemetry_dropped(&mut self) {
        self.health.note_telemetry_dropped();
    }

    pub fn note_overrun(&mut self) {
        self.health.note_overrun();
    }

    /// One control cycle: emergency, sensors, detections, transition,
    /// deterrent output, then the gated telemetry and health reports.
    pub fn tick(&mut self, clock: &TickClock, peripherals: &mut Peripherals) -> TickOutcome {
        let now = clock.uptime;

        let emergency = peripherals.emergency.asserted();

        if self.gates.sensors.ready(now) {
            peripherals.sensors.refresh(now);
        }

        let mut transitions = Vec::new();

        let events = peripherals.detections.poll();
        if events.is_empty() {
            self.advance(now, emergency, &mut transitions);
        }
        for event in events {
            self.ingest(event, now);
            self.advance(now, emergency, &mut transitions);
        }

        let next = self.state.state;
        let state_changed = !transitions.is_empty();

        let command = self.driver.render(next, now);

        let telemetry = if self.gates.telemetry.ready(now) {
            Some(telemetry::snapshot(
                clock,
                next,
                self.state.threat,
                peripherals.sensors.sensors(),
                peripherals.sensors.power(),
                &self.battery,
                self.state.latest_detection.as_ref(),
            ))
        } else {
            None
        };

        let health = if self.gates.health.ready(now) {
            Some(self.health.check(
                now,
                clock.wall,
                &mut peripherals.sensors,
                self.state.last_message_at,
            ))
        } else {
            None
        };

        TickOutcome {
            state: next,
            threat: self.state.threat,
            command,
            telemetry,
            health,
            state_changed,
            transitions,
        }
    }

    /// Run the state machine once against the current threat, stamping Active
    /// entry and setting the timeout hold. Entered states are appended to `transitions`.
    fn advance(&mut self, now: Duration, emergency: bool, transitions: &mut Vec<OperatingState>) {
        let previous = self.state.state;
        let time_in_active = self.state.time_in_active(now);
        let next = self.machine.transition(
            previous,
            self.state.effective_threat(),
            emergency,
            time_in_active,
        );

        if previous == OperatingState::Active
            && next == OperatingState::Alert
            && time_in_active > self.machine.active_timeout()
        {
            info!("Active timeout after {:?}, holding at Alert until a new detection", time_in_active);
            self.state.timeout_hold = true;
        }

        match next {
            OperatingState::Active if previous != OperatingState::Active => {
                self.state.active_since = Some(now);
            }
            OperatingState::Active => {}
            _ => self.state.active_since = None,
        }

        if next != previous {
            info!(
                "State {:?} -> {:?} (threat {:?}, emergency {})",
                previous, next, self.state.threat, emergency
            );
            transitions.push(next);
        }
        self.state.state = next;
    }

    /// Score a newly arrived event once and make it the latest detection
    fn ingest(&mut self, event: DetectionEvent, now: Duration) {
        let assessment = score_breakdown(&event);
        debug!(
            "Detection {:?} conf {} at {:.1} m: {} points ({}+{}+{}) -> {:?}",
            event.species,
            event.confidence,
            event.distance,
            assessment.total,
            assessment.distance_points,
            assessment.confidence_points,
            assessment.species_points,
            assessment.level
        );

        if self.rearm_on_new_detection
            && self.state.state == OperatingState::Active
            && assessment.level >= ThreatLevel::Medium
        {
            self.state.active_since = Some(now);
        }

        self.state.threat = assessment.level;
        self.state.timeout_hold = false;
        self.state.latest_detection = Some(event);
        self.state.last_message_at = Some(now);
    }
}
