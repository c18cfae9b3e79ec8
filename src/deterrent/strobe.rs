// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Four-channel rotating strobe pattern

use std::f64::consts::{FRAC_PI_2, PI};
use std::time::Duration;

/// Number of strobe heads, spaced 90° apart around the airframe
pub const STROBE_CHANNELS: usize = 4;

/// Phase angle in radians for a pattern with the given period
pub fn phase_angle(now: Duration, period: Duration) -> f64 {
    let period_ms = period.as_millis().max(1);
    let within = now.as_millis() % period_ms;
    within as f64 / period_ms as f64 * 2.0 * PI
}

/// Per-channel output: sinusoids a quarter turn apart, scaled by `intensity`
pub fn channel_levels(intensity: u8, now: Duration, period: Duration) -> [u8; STROBE_CHANNELS] {
    let mut levels = [0u8; STROBE_CHANNELS];
    if intensity == 0 {
        return levels;
    }

    let theta = phase_angle(now, period);
    let base = f64::from(intensity);
    for (i, level) in levels.iter_mut().enumerate() {
        let wave = ((theta + i as f64 * FRAC_PI_2).sin() + 1.0) / 2.0;
        *level = (wave * base).round().clamp(0.0, 255.0) as u8;
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(1000);

    fn closed_form(intensity: u8, t_ms: u64, channel: usize) -> u8 {
        let theta = (t_ms % 1000) as f64 / 1000.0 * 2.0 * PI;
        let value = ((theta + channel as f64 * PI / 2.0).sin() + 1.0) / 2.0 * f64::from(intensity);
        value.round().clamp(0.0, 255.0) as u8
    }

    #[test]
    fn test_full_intensity_at_zero() {
        let levels = channel_levels(255, Duration::ZERO, PERIOD);
        for (i, level) in levels.iter().enumerate() {
            assert_eq!(*level, closed_form(255, 0, i));
        }
        // sin(π/2) = 1 and sin(3π/2) = -1
        assert_eq!(levels[1], 255);
        assert_eq!(levels[3], 0);
    }

    #[test]
    fn test_matches_closed_form_over_period() {
        for intensity in [50u8, 128, 255] {
            for t in (0..3000).step_by(37) {
                let levels = channel_levels(intensity, Duration::from_millis(t), PERIOD);
                for (i, level) in levels.iter().enumerate() {
                    assert_eq!(*level, closed_form(intensity, t, i), "t={} ch={}", t, i);
                    assert!(*level <= intensity);
                }
            }
        }
    }

    #[test]
    fn test_pattern_repeats_each_period() {
        for t in [0u64, 125, 250, 999] {
            assert_eq!(
                channel_levels(255, Duration::from_millis(t), PERIOD),
                channel_levels(255, Duration::from_millis(t + 7000), PERIOD)
            );
        }
    }

    #[test]
    fn test_quarter_period_rotates_channels() {
        // Channel i at t equals channel i+1 a quarter period earlier
        let now = channel_levels(255, Duration::from_millis(400), PERIOD);
        let earlier = channel_levels(255, Duration::from_millis(150), PERIOD);
        assert_eq!(now[0], earlier[1]);
        assert_eq!(now[1], earlier[2]);
        assert_eq!(now[2], earlier[3]);
    }

    #[test]
    fn test_zero_intensity_is_dark() {
        for t in [0u64, 250, 600] {
            assert_eq!(channel_levels(0, Duration::from_millis(t), PERIOD), [0; 4]);
        }
    }

    #[test]
    fn test_phase_angle_wraps() {
        assert_eq!(phase_angle(Duration::ZERO, PERIOD), 0.0);
        assert!((phase_angle(Duration::from_millis(250), PERIOD) - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(phase_angle(Duration::from_millis(1000), PERIOD), 0.0);
    }
}
