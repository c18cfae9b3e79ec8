//! Deterrent module - strobe and audio actuation derived from the operating state

mod audio;
mod strobe;

pub use audio::AudioSweep;
pub use strobe::{channel_levels, phase_angle, STROBE_CHANNELS};

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::DeterrentConfig;
use crate::core::OperatingState;

/// Audio channel output. A disabled channel is silent at 0 Hz.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioCommand {
    pub enabled: bool,
    pub frequency_hz: u32,
}

impl AudioCommand {
    pub fn silent() -> Self {
        Self::default()
    }
}

/// Actuation parameters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterrentCommand {
    /// Base strobe intensity for the state (0-255)
    pub strobe_intensity: u8,
    /// Phase-shifted output of each strobe head
    pub strobe_channels: [u8; STROBE_CHANNELS],
    pub audio: AudioCommand,
}

impl DeterrentCommand {
    pub fn off() -> Self {
        Self::default()
    }
}

/// Maps the operating state and elapsed time to strobe and audio output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterrentDriver {
    alert_intensity: u8,
    active_intensity: u8,
    strobe_period: Duration,
    sweep: AudioSweep,
}

impl DeterrentDriver {
    pub fn from_config(config: &DeterrentConfig) -> Self {
        Self {
            alert_intensity: config.alert_intensity,
            active_intensity: config.active_intensity,
            strobe_period: Duration::from_millis(config.strobe_period_ms.max(1)),
            sweep: AudioSweep {
                center_hz: config.audio_center_hz,
                deviation_hz: config.audio_deviation_hz,
                rate: config.audio_sweep_rate,
            },
        }
    }

    fn posture(&self, state: OperatingState) -> (u8, bool) {
        match state {
            OperatingState::Standby => (0, false),
            OperatingState::Alert => (self.alert_intensity, false),
            OperatingState::Active => (self.active_intensity, true),
            // Minimal draw while stopped
            OperatingState::Emergency => (0, false),
        }
    }

    pub fn render(&self, state: OperatingState, now: Duration) -> DeterrentCommand {
        let (intensity, audio_enabled) = self.posture(state);

        let audio = if audio_enabled {
            AudioCommand {
                enabled: true,
                frequency_hz: self.sweep.frequency_at(now),
            }
        } else {
            AudioCommand::silent()
        };

        DeterrentCommand {
            strobe_intensity: intensity,
            strobe_channels: channel_levels(intensity, now, self.strobe_period),
            audio,
        }
    }
}

impl Default for DeterrentDriver {
    fn default() -> Self {
        Self::from_config(&DeterrentConfig::default())
    }
}

/// Render with the stock intensities, 1 s strobe period and 1.5-2.5 kHz sweep
pub fn render(state: OperatingState, now: Duration) -> DeterrentCommand {
    DeterrentDriver::default().render(state, now)
}

/// PWM/GPIO driver that puts a command onto the hardware
pub trait Actuator {
    fn apply(&mut self, command: &DeterrentCommand) -> Result<()>;
}

/// Logs posture changes instead of driving hardware
#[derive(Debug, Default)]
pub struct TracingActuator {
    last: Option<(u8, bool)>,
}

impl TracingActuator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Actuator for TracingActuator {
    fn apply(&mut self, command: &DeterrentCommand) -> Result<()> {
        let posture = (command.strobe_intensity, command.audio.enabled);
        if self.last != Some(posture) {
            info!(
                "Deterrent output: strobe intensity {} audio {}",
                command.strobe_intensity,
                if command.audio.enabled { "on" } else { "off" }
            );
            self.last = Some(posture);
        }
        Ok(())
    }
}

/// Keeps every applied command, for tests and replay
#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub applied: Vec<DeterrentCommand>,
}

impl RecordingActuator {
    pub fn last(&self) -> Option<&DeterrentCommand> {
        self.applied.last()
    }
}

impl Actuator for RecordingActuator {
    fn apply(&mut self, command: &DeterrentCommand) -> Result<()> {
        self.applied.push(*command);
        Ok(())
    }
}
