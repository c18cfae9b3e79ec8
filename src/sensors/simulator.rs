// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor and detection simulators for demo/testing

use anyhow::{bail, Result};
use chrono::Utc;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use super::{FlightSensors, GpsFix, PowerMonitor, PowerStatus, RailReading, SensorSnapshot};
use crate::detection::{DetectionEvent, DetectionSource, Species};

const GRAVITY: f64 = 9.806_65;
const SEA_LEVEL_PA: f64 = 101_325.0;

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Simulated IMU + barometer + GPS on a delivery flight
pub struct SimulatedFlight {
    id: String,
    rng: StdRng,
    reads: u64,
    cruise_altitude: f64,
    climb_per_read: f64,
    altitude: f64,
    position: GpsFix,
    fault_probability: f64,
}

impl SimulatedFlight {
    pub fn new(id: &str, seed: Option<u64>) -> Self {
        Self {
            id: id.to_string(),
            rng: rng_from(seed),
            reads: 0,
            cruise_altitude: 120.0,
            climb_per_read: 0.5,
            altitude: 0.0,
            position: GpsFix {
                latitude: 47.3769,
                longitude: 8.5417,
            },
            fault_probability: 0.0,
        }
    }

    /// Make a fraction of reads fail, as a flaky I2C bus would
    pub fn with_fault_probability(mut self, probability: f64) -> Self {
        self.fault_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn noise(&mut self, sigma: f64) -> f64 {
        self.rng.sample::<f64, _>(StandardNormal) * sigma
    }
}

impl FlightSensors for SimulatedFlight {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&mut self) -> Result<SensorSnapshot> {
        if self.rng.gen::<f64>() < self.fault_probability {
            bail!("simulated bus timeout");
        }
        self.reads += 1;

        if self.altitude < self.cruise_altitude {
            self.altitude = (self.altitude + self.climb_per_read).min(self.cruise_altitude);
        }
        let altitude = self.altitude + self.noise(0.3);

        // ~50 km/h heading north-east at 10 Hz refresh
        self.position.latitude += 0.000_001;
        self.position.longitude += 0.000_001;

        // ISA lapse rate from a 22°C ground
        let temperature = 22.0 - 0.0065 * altitude + self.noise(0.1);
        let pressure = SEA_LEVEL_PA * (1.0 - 2.255_77e-5 * altitude).powf(5.255_88);

        Ok(SensorSnapshot {
            accel: [self.noise(0.05), self.noise(0.05), GRAVITY + self.noise(0.05)],
            gyro: [self.noise(0.01), self.noise(0.01), self.noise(0.01)],
            temperature,
            pressure,
            altitude,
            gps: Some(self.position),
        })
    }
}

/// Simulated INA219 rails and a slowly draining 3S pack
pub struct SimulatedPower {
    id: String,
    rng: StdRng,
    battery_voltage: f64,
    drain_per_read: f64,
}

impl SimulatedPower {
    pub fn new(id: &str, seed: Option<u64>) -> Self {
        Self {
            id: id.to_string(),
            rng: rng_from(seed),
            battery_voltage: 12.6,
            drain_per_read: 0.000_2,
        }
    }

    fn jitter(&mut self, value: f64, fraction: f64) -> f64 {
        value * (1.0 + self.rng.sample::<f64, _>(StandardNormal) * fraction)
    }
}

impl PowerMonitor for SimulatedPower {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&mut self) -> Result<PowerStatus> {
        self.battery_voltage = (self.battery_voltage - self.drain_per_read).max(9.0);

        Ok(PowerStatus {
            battery_voltage: self.battery_voltage,
            rail_12v: RailReading::new(self.jitter(12.0, 0.002), self.jitter(1.1, 0.05)),
            rail_5v: RailReading::new(self.jitter(5.0, 0.002), self.jitter(0.9, 0.05)),
            rail_3v3: RailReading::new(self.jitter(3.3, 0.002), self.jitter(0.25, 0.05)),
        })
    }
}

struct Encounter {
    species: Species,
    distance: f64,
    closing_per_poll: f64,
    bearing: f64,
    remaining_polls: u32,
}

/// Random bird encounters reported the way the detection computer does
pub struct SimulatedDetections {
    rng: StdRng,
    encounter: Option<Encounter>,
    encounter_probability: f64,
    idle_report_every: u32,
    idle_polls: u32,
}

impl SimulatedDetections {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: rng_from(seed),
            encounter: None,
            encounter_probability: 0.005,
            idle_report_every: 20,
            idle_polls: 0,
        }
    }

    pub fn with_encounter_probability(mut self, probability: f64) -> Self {
        self.encounter_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn start_encounter(&mut self) -> Encounter {
        let species = match self.rng.gen_range(0..5) {
            0 => Species::Eagle,
            1 => Species::Hawk,
            2 => Species::Crow,
            3 => Species::Other,
            _ => Species::Unknown,
        };
        Encounter {
            species,
            distance: self.rng.gen_range(150.0..300.0),
            closing_per_poll: self.rng.gen_range(0.2..2.0),
            bearing: self.rng.gen_range(-37.5..37.5),
            remaining_polls: self.rng.gen_range(100..800),
        }
    }

    fn confidence(&mut self) -> u8 {
        let sample = 80.0 + self.rng.sample::<f64, _>(StandardNormal) * 8.0;
        sample.clamp(60.0, 95.0).round() as u8
    }
}

impl DetectionSource for SimulatedDetections {
    fn name(&self) -> &str {
        "simulator"
    }

    fn poll(&mut self) -> Vec<DetectionEvent> {
        let now = Utc::now();

        if self.encounter.is_none() && self.rng.gen::<f64>() < self.encounter_probability {
            self.encounter = Some(self.start_encounter());
        }

        let confidence = self.confidence();
        match self.encounter.take() {
            Some(mut bird) if bird.remaining_polls > 0 => {
                bird.remaining_polls -= 1;
                bird.distance = (bird.distance - bird.closing_per_poll).max(20.0);
                let event = DetectionEvent::sighting(
                    confidence,
                    bird.distance,
                    bird.bearing,
                    bird.species,
                    now,
                );
                self.encounter = Some(bird);
                vec![event]
            }
            Some(_) => {
                self.idle_polls = 0;
                vec![DetectionEvent::clear(now)]
            }
            None => {
                self.idle_polls += 1;
                if self.idle_polls >= self.idle_report_every {
                    self.idle_polls = 0;
                    vec![DetectionEvent::clear(now)]
                } else {
                    Vec::new()
                }
            }
        }
    }
}
