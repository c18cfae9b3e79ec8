// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! End-to-end controller scenarios with scripted peripherals

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;

use avishield::config::Config;
use avishield::core::{Controller, HealthIssue, OperatingState, Peripherals, TickClock, TickOutcome};
use avishield::detection::{DetectionEvent, DetectionSource, Species, ThreatLevel};
use avishield::deterrent::DeterrentCommand;
use avishield::sensors::{
    EmergencyStop, FlightSensors, LevelInput, PowerMonitor, PowerStatus, RailReading, SensorHub,
    SensorSnapshot,
};

#[derive(Clone, Default)]
struct Inbox(Rc<RefCell<VecDeque<DetectionEvent>>>);

impl Inbox {
    fn send(&self, event: DetectionEvent) {
        self.0.borrow_mut().push_back(event);
    }
}

impl DetectionSource for Inbox {
    fn name(&self) -> &str {
        "inbox"
    }

    fn poll(&mut self) -> Vec<DetectionEvent> {
        self.0.borrow_mut().drain(..).collect()
    }
}

struct Switch(Rc<Cell<Option<bool>>>);

impl LevelInput for Switch {
    fn read_level(&mut self) -> Result<bool> {
        match self.0.get() {
            Some(level) => Ok(level),
            None => bail!("gpio read failed"),
        }
    }
}

struct Flight(Rc<Cell<bool>>);

impl FlightSensors for Flight {
    fn id(&self) -> &str {
        "flight"
    }

    fn read(&mut self) -> Result<SensorSnapshot> {
        if self.0.get() {
            bail!("i2c timeout");
        }
        Ok(SensorSnapshot {
            altitude: 100.0,
            temperature: 18.0,
            ..SensorSnapshot::default()
        })
    }
}

struct Power;

impl PowerMonitor for Power {
    fn id(&self) -> &str {
        "power"
    }

    fn read(&mut self) -> Result<PowerStatus> {
        Ok(PowerStatus {
            battery_voltage: 12.0,
            rail_12v: RailReading::new(12.0, 1.0),
            rail_5v: RailReading::new(5.0, 1.0),
            rail_3v3: RailReading::new(3.3, 0.0),
        })
    }
}

/// Controller plus handles to steer its peripherals
struct Rig {
    controller: Controller,
    peripherals: Peripherals,
    inbox: Inbox,
    /// Electrical level of the active-low e-stop pin; `None` fails the read
    estop_level: Rc<Cell<Option<bool>>>,
    flight_broken: Rc<Cell<bool>>,
}

impl Rig {
    fn new(config: Config) -> Self {
        let inbox = Inbox::default();
        let estop_level = Rc::new(Cell::new(Some(true)));
        let flight_broken = Rc::new(Cell::new(false));

        let peripherals = Peripherals {
            sensors: SensorHub::new(Box::new(Flight(flight_broken.clone())), Box::new(Power)),
            detections: Box::new(inbox.clone()),
            emergency: EmergencyStop::new(Box::new(Switch(estop_level.clone())), true),
        };

        Self {
            controller: Controller::new(&config),
            peripherals,
            inbox,
            estop_level,
            flight_broken,
        }
    }

    fn tick(&mut self, ms: u64) -> TickOutcome {
        self.controller
            .tick(&TickClock::from_millis(ms), &mut self.peripherals)
    }
}

fn eagle_close() -> DetectionEvent {
    DetectionEvent::sighting(80, 40.0, 12.0, Species::Eagle, Utc::now())
}

fn crow_mid() -> DetectionEvent {
    // 10 + 7 + 10 = 27
    DetectionEvent::sighting(70, 150.0, -5.0, Species::Crow, Utc::now())
}

#[test]
fn test_close_eagle_goes_active() {
    let mut rig = Rig::new(Config::default());
    rig.inbox.send(eagle_close());

    let outcome = rig.tick(0);
    assert_eq!(outcome.threat, ThreatLevel::High);
    assert_eq!(outcome.state, OperatingState::Active);
    assert!(outcome.state_changed);
    assert_eq!(outcome.command.strobe_intensity, 255);
    assert!(outcome.command.audio.enabled);
    assert_eq!(outcome.command.audio.frequency_hz, 2000);
}

#[test]
fn test_faint_distant_bird_stays_standby() {
    let mut rig = Rig::new(Config::default());
    rig.inbox
        .send(DetectionEvent::sighting(20, 150.0, 0.0, Species::Other, Utc::now()));

    let outcome = rig.tick(0);
    assert_eq!(outcome.threat, ThreatLevel::None);
    assert_eq!(outcome.state, OperatingState::Standby);
    assert_eq!(outcome.command, DeterrentCommand::off());
}

#[test]
fn test_clear_report_returns_to_standby() {
    let mut rig = Rig::new(Config::default());
    rig.inbox.send(crow_mid());
    assert_eq!(rig.tick(0).state, OperatingState::Alert);

    rig.inbox.send(DetectionEvent::clear(Utc::now()));
    let outcome = rig.tick(50);
    assert_eq!(outcome.state, OperatingState::Standby);
    assert_eq!(outcome.command, DeterrentCommand::off());
}

#[test]
fn test_sighting_and_clear_in_one_tick_both_transition() {
    let mut rig = Rig::new(Config::default());
    rig.inbox.send(eagle_close());
    rig.inbox.send(DetectionEvent::clear(Utc::now()));

    let outcome = rig.tick(0);
    assert_eq!(
        outcome.transitions,
        vec![OperatingState::Active, OperatingState::Standby]
    );
    assert_eq!(outcome.state, OperatingState::Standby);
    assert_eq!(rig.controller.state().threat, ThreatLevel::None);
}

#[test]
fn test_emergency_overrides_and_releases() {
    let mut rig = Rig::new(Config::default());
    rig.inbox.send(eagle_close());
    assert_eq!(rig.tick(0).state, OperatingState::Active);

    rig.estop_level.set(Some(false));
    let outcome = rig.tick(50);
    assert_eq!(outcome.state, OperatingState::Emergency);
    assert_eq!(outcome.command, DeterrentCommand::off());

    // New detections do not lift the stop
    rig.inbox.send(eagle_close());
    assert_eq!(rig.tick(100).state, OperatingState::Emergency);

    rig.estop_level.set(Some(true));
    let outcome = rig.tick(150);
    assert_eq!(outcome.state, OperatingState::Active);
    assert_eq!(rig.controller.state().active_since, Some(Duration::from_millis(150)));
}

#[test]
fn test_unreadable_emergency_input_stops() {
    let mut rig = Rig::new(Config::default());
    rig.estop_level.set(None);

    let outcome = rig.tick(0);
    assert_eq!(outcome.state, OperatingState::Emergency);
}

#[test]
fn test_active_times_out_and_holds_at_alert() {
    let mut rig = Rig::new(Config::default());
    rig.inbox.send(eagle_close());
    assert_eq!(rig.tick(0).state, OperatingState::Active);

    assert_eq!(rig.tick(30_000).state, OperatingState::Active);
    // Exactly 60 s is not yet over the limit
    assert_eq!(rig.tick(60_000).state, OperatingState::Active);

    let outcome = rig.tick(60_050);
    assert_eq!(outcome.state, OperatingState::Alert);
    assert_eq!(outcome.threat, ThreatLevel::High);
    assert_eq!(outcome.command.strobe_intensity, 50);
    assert!(!outcome.command.audio.enabled);
    assert!(rig.controller.state().timeout_hold);

    // The stale High event must not re-enter Active
    for t in (60_100..62_000).step_by(50) {
        assert_eq!(rig.tick(t).state, OperatingState::Alert);
    }
}

#[test]
fn test_new_detection_after_timeout_reenters_active() {
    let mut rig = Rig::new(Config::default());
    rig.inbox.send(eagle_close());
    rig.tick(0);
    assert_eq!(rig.tick(61_000).state, OperatingState::Alert);

    rig.inbox.send(eagle_close());
    let outcome = rig.tick(62_000);
    assert_eq!(outcome.state, OperatingState::Active);
    assert!(!rig.controller.state().timeout_hold);
    assert_eq!(rig.controller.state().active_since, Some(Duration::from_millis(62_000)));

    assert_eq!(rig.tick(122_000).state, OperatingState::Active);
    assert_eq!(rig.tick(122_001).state, OperatingState::Alert);
}

#[test]
fn test_clear_report_during_hold_drops_to_standby() {
    let mut rig = Rig::new(Config::default());
    rig.inbox.send(eagle_close());
    rig.tick(0);
    assert_eq!(rig.tick(61_000).state, OperatingState::Alert);

    rig.inbox.send(DetectionEvent::clear(Utc::now()));
    assert_eq!(rig.tick(61_050).state, OperatingState::Standby);
}

#[test]
fn test_repeat_detections_do_not_extend_active_by_default() {
    let mut rig = Rig::new(Config::default());
    rig.inbox.send(eagle_close());
    rig.tick(0);

    rig.inbox.send(eagle_close());
    assert_eq!(rig.tick(50_000).state, OperatingState::Active);

    assert_eq!(rig.tick(70_000).state, OperatingState::Alert);
}

#[test]
fn test_rearm_extends_active_on_new_detection() {
    let mut config = Config::default();
    config.controller.rearm_on_new_detection = true;
    let mut rig = Rig::new(config);

    rig.inbox.send(eagle_close());
    rig.tick(0);

    rig.inbox.send(eagle_close());
    rig.tick(50_000);
    assert_eq!(rig.controller.state().active_since, Some(Duration::from_millis(50_000)));

    assert_eq!(rig.tick(70_000).state, OperatingState::Active);
    assert_eq!(rig.tick(110_001).state, OperatingState::Alert);
}

#[test]
fn test_telemetry_once_per_second_with_bird_fields() {
    let mut rig = Rig::new(Config::default());

    let mut records = Vec::new();
    for t in (0..3_000).step_by(50) {
        if t == 1_200 {
            rig.inbox.send(eagle_close());
        }
        if let Some(record) = rig.tick(t).telemetry {
            records.push(record);
        }
    }

    assert_eq!(records.len(), 3);
    assert_eq!(
        records.iter().map(|r| r.uptime_ms).collect::<Vec<_>>(),
        vec![0, 1_000, 2_000]
    );

    assert_eq!(records[1].bird_detected, None);
    assert_eq!(records[1].state, 0);

    let last = &records[2];
    assert_eq!(last.state, OperatingState::Active.ordinal());
    assert_eq!(last.threat, ThreatLevel::High.ordinal());
    assert_eq!(last.bird_detected, Some(true));
    assert_eq!(last.bird_confidence, Some(80));
    assert_eq!(last.bird_distance, Some(40.0));
    assert_eq!(last.altitude, 100.0);
    assert!((last.power - 17.0).abs() < 1e-9);
}

#[test]
fn test_sensor_failure_keeps_last_values_and_reports() {
    let mut rig = Rig::new(Config::default());

    let first = rig.tick(0);
    let report = first.health.expect("health gate fires on the first tick");
    assert!(report.is_healthy(), "{:?}", report.issues);

    rig.flight_broken.set(true);
    let mut last_health = None;
    let mut last_telemetry = None;
    for t in (100..=5_000).step_by(100) {
        let outcome = rig.tick(t);
        if outcome.health.is_some() {
            last_health = outcome.health;
        }
        if outcome.telemetry.is_some() {
            last_telemetry = outcome.telemetry;
        }
    }

    let telemetry = last_telemetry.expect("telemetry was emitted");
    assert_eq!(telemetry.altitude, 100.0);
    assert_eq!(telemetry.temperature, 18.0);

    let report = last_health.expect("health gate fired at 5 s");
    assert!(report
        .issues
        .iter()
        .any(|issue| matches!(issue, HealthIssue::SensorFaults { count } if *count == 50)));
    assert!(report
        .issues
        .contains(&HealthIssue::SensorsStale { age_ms: 5_000 }));
    assert_eq!(rig.peripherals.sensors.stats().faults, 50);
}

#[test]
fn test_silent_link_is_reported() {
    let mut config = Config::default();
    config.controller.health_interval_ms = 1_000;
    let mut rig = Rig::new(config);

    rig.inbox.send(crow_mid());
    rig.tick(0);

    let mut issues = Vec::new();
    for t in (100..=8_000).step_by(100) {
        if let Some(report) = rig.tick(t).health {
            issues.extend(report.issues);
        }
    }

    assert!(issues.contains(&HealthIssue::DetectionLinkSilent { secs: 6 }));
    // Silence does not change the threat
    assert_eq!(rig.controller.state().threat, ThreatLevel::Low);
}
