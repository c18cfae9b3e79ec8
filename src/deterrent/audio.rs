// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Distress-call frequency sweep

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sinusoidal sweep `center + deviation * sin(rate * t_ms)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSweep {
    pub center_hz: f64,
    pub deviation_hz: f64,
    /// Radians per millisecond
    pub rate: f64,
}

impl AudioSweep {
    pub fn frequency_at(&self, now: Duration) -> u32 {
        let t_ms = now.as_millis() as f64;
        let hz = self.center_hz + self.deviation_hz * (self.rate * t_ms).sin();
        hz.round().max(0.0) as u32
    }
}

impl Default for AudioSweep {
    fn default() -> Self {
        Self {
            center_hz: 2000.0,
            deviation_hz: 500.0,
            rate: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_closed_form() {
        let sweep = AudioSweep::default();
        for t in (0..20_000u64).step_by(13) {
            let expected = (2000.0 + 500.0 * (0.01 * t as f64).sin()).round() as u32;
            assert_eq!(sweep.frequency_at(Duration::from_millis(t)), expected);
        }
    }

    #[test]
    fn test_sweep_stays_in_band() {
        let sweep = AudioSweep::default();
        let mut lowest = u32::MAX;
        let mut highest = 0;
        for t in 0..10_000u64 {
            let f = sweep.frequency_at(Duration::from_millis(t));
            lowest = lowest.min(f);
            highest = highest.max(f);
        }
        assert!(lowest >= 1500);
        assert!(highest <= 2500);
        // A full cycle is ~628 ms, so both extremes are reached
        assert!(lowest <= 1501);
        assert!(highest >= 2499);
    }

    #[test]
    fn test_starts_at_center() {
        assert_eq!(AudioSweep::default().frequency_at(Duration::ZERO), 2000);
    }
}
