// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Threat scoring

use serde::{Deserialize, Serialize};

use super::{DetectionEvent, Species};

/// Ordered threat classification derived from the latest detection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThreatLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    /// Wire ordinal used in telemetry
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// Unknown ordinals fail safe toward `None`
    pub fn from_ordinal(value: u8) -> Self {
        match value {
            1 => ThreatLevel::Low,
            2 => ThreatLevel::Medium,
            3 => ThreatLevel::High,
            _ => ThreatLevel::None,
        }
    }

    fn from_score(score: u32) -> Self {
        match score {
            s if s >= 50 => ThreatLevel::High,
            s if s >= 30 => ThreatLevel::Medium,
            s if s >= 15 => ThreatLevel::Low,
            _ => ThreatLevel::None,
        }
    }
}

/// Per-factor breakdown of a threat score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatAssessment {
    pub distance_points: u32,
    pub confidence_points: u32,
    pub species_points: u32,
    pub total: u32,
    pub level: ThreatLevel,
}

impl ThreatAssessment {
    fn none() -> Self {
        Self {
            distance_points: 0,
            confidence_points: 0,
            species_points: 0,
            total: 0,
            level: ThreatLevel::None,
        }
    }
}

fn distance_points(distance: f64) -> u32 {
    // NaN fails every comparison and scores nothing
    if distance < 50.0 {
        30
    } else if distance < 100.0 {
        20
    } else if distance < 200.0 {
        10
    } else {
        0
    }
}

fn species_points(species: Species) -> u32 {
    match species {
        Species::Eagle => 20,
        Species::Hawk => 15,
        Species::Crow => 10,
        Species::Unknown | Species::Other => 0,
    }
}

/// Score a detection, keeping each contribution
pub fn score_breakdown(event: &DetectionEvent) -> ThreatAssessment {
    if !event.detected {
        return ThreatAssessment::none();
    }

    let distance_points = distance_points(event.distance);
    let confidence_points = u32::from(event.confidence.min(100)) / 10;
    let species_points = species_points(event.species);
    let total = distance_points + confidence_points + species_points;

    ThreatAssessment {
        distance_points,
        confidence_points,
        species_points,
        total,
        level: ThreatLevel::from_score(total),
    }
}

/// Map a detection to a threat level
pub fn score(event: &DetectionEvent) -> ThreatLevel {
    score_breakdown(event).level
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sighting(confidence: u8, distance: f64, species: Species) -> DetectionEvent {
        DetectionEvent::sighting(confidence, distance, 0.0, species, Utc::now())
    }

    #[test]
    fn test_not_detected_is_none() {
        let now = Utc::now();
        for species in [Species::Unknown, Species::Eagle, Species::Hawk, Species::Crow, Species::Other] {
            for distance in [0.0, 10.0, 49.9, 150.0, 1000.0] {
                let event = DetectionEvent {
                    detected: false,
                    confidence: 100,
                    distance,
                    bearing: 12.0,
                    species,
                    observed_at: now,
                };
                assert_eq!(score(&event), ThreatLevel::None);
                assert_eq!(score_breakdown(&event).total, 0);
            }
        }
    }

    #[test]
    fn test_close_eagle_is_high() {
        let assessment = score_breakdown(&sighting(80, 40.0, Species::Eagle));
        assert_eq!(assessment.distance_points, 30);
        assert_eq!(assessment.confidence_points, 8);
        assert_eq!(assessment.species_points, 20);
        assert_eq!(assessment.total, 58);
        assert_eq!(assessment.level, ThreatLevel::High);
    }

    #[test]
    fn test_distant_other_is_none() {
        let assessment = score_breakdown(&sighting(20, 150.0, Species::Other));
        assert_eq!(assessment.total, 12);
        assert_eq!(assessment.level, ThreatLevel::None);
    }

    #[test]
    fn test_distance_band_edges() {
        assert_eq!(distance_points(0.0), 30);
        assert_eq!(distance_points(49.999), 30);
        assert_eq!(distance_points(50.0), 20);
        assert_eq!(distance_points(99.999), 20);
        assert_eq!(distance_points(100.0), 10);
        assert_eq!(distance_points(199.999), 10);
        assert_eq!(distance_points(200.0), 0);
        assert_eq!(distance_points(f64::NAN), 0);
    }

    #[test]
    fn test_level_thresholds_tie_to_higher() {
        assert_eq!(ThreatLevel::from_score(14), ThreatLevel::None);
        assert_eq!(ThreatLevel::from_score(15), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(29), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(30), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(49), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(50), ThreatLevel::High);
    }

    #[test]
    fn test_monotonic_in_each_factor() {
        let species_by_severity = [Species::Other, Species::Crow, Species::Hawk, Species::Eagle];
        let distances = [500.0, 199.0, 150.0, 99.0, 60.0, 49.0, 5.0];

        for &species in &species_by_severity {
            for confidence in (0..=100).step_by(5) {
                let mut previous = ThreatLevel::None;
                for &distance in &distances {
                    let level = score(&sighting(confidence, distance, species));
                    assert!(level >= previous, "closer bird scored lower");
                    previous = level;
                }
            }
        }

        for &species in &species_by_severity {
            for &distance in &distances {
                let mut previous = ThreatLevel::None;
                for confidence in 0..=100 {
                    let level = score(&sighting(confidence, distance, species));
                    assert!(level >= previous, "more confident detection scored lower");
                    previous = level;
                }
            }
        }

        for &distance in &distances {
            for confidence in (0..=100).step_by(10) {
                let mut previous = ThreatLevel::None;
                for &species in &species_by_severity {
                    let level = score(&sighting(confidence, distance, species));
                    assert!(level >= previous, "more dangerous species scored lower");
                    previous = level;
                }
            }
        }
    }

    #[test]
    fn test_ordinals() {
        assert_eq!(ThreatLevel::None.ordinal(), 0);
        assert_eq!(ThreatLevel::High.ordinal(), 3);
        assert_eq!(ThreatLevel::from_ordinal(2), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_ordinal(42), ThreatLevel::None);
    }
}
