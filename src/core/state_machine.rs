// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Operating-state transitions.
//!
//! Pure functions: the caller owns the current state and the time spent in
//! Active, this module only decides what comes next.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detection::ThreatLevel;

/// Default Active auto-timeout
pub const ACTIVE_TIMEOUT: Duration = Duration::from_secs(60);

/// Deterrent posture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatingState {
    #[default]
    Standby,
    Alert,
    Active,
    Emergency,
}

impl OperatingState {
    /// Wire ordinal used in telemetry
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }
}

/// Transition rules with a configurable Active timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMachine {
    active_timeout: Duration,
}

impl StateMachine {
    pub fn new(active_timeout: Duration) -> Self {
        Self { active_timeout }
    }

    pub fn active_timeout(&self) -> Duration {
        self.active_timeout
    }

    /// Next state, rules evaluated in order:
    ///
    /// 1. emergency asserted: `Emergency`
    /// 2. threat maps `None`/`Low`/`Medium|High` to `Standby`/`Alert`/`Active`
    /// 3. already `Active` for longer than the timeout: `Alert`, whatever the threat
    pub fn transition(
        &self,
        current: OperatingState,
        threat: ThreatLevel,
        emergency_asserted: bool,
        time_in_active: Duration,
    ) -> OperatingState {
        if emergency_asserted {
            return OperatingState::Emergency;
        }

        let next = match threat {
            ThreatLevel::None => OperatingState::Standby,
            ThreatLevel::Low => OperatingState::Alert,
            ThreatLevel::Medium | ThreatLevel::High => OperatingState::Active,
        };

        if current == OperatingState::Active && time_in_active > self.active_timeout {
            return OperatingState::Alert;
        }

        next
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(ACTIVE_TIMEOUT)
    }
}

/// [`StateMachine::transition`] with the default 60 s timeout
pub fn transition(
    current: OperatingState,
    threat: ThreatLevel,
    emergency_asserted: bool,
    time_in_active: Duration,
) -> OperatingState {
    StateMachine::default().transition(current, threat, emergency_asserted, time_in_active)
}
