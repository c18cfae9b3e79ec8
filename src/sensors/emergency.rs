// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Emergency-stop input

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::warn;

use super::LevelInput;
use crate::config::EmergencyConfig;

/// GPIO exposed through a sysfs-style `value` file ("0" or "1")
pub struct SysfsLevelInput {
    path: PathBuf,
}

impl SysfsLevelInput {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl LevelInput for SysfsLevelInput {
    fn read_level(&mut self) -> Result<bool> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {:?}", self.path))?;
        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => bail!("unexpected GPIO value {:?} in {:?}", other, self.path),
        }
    }
}

/// A pin held at a constant level
pub struct FixedLevel(pub bool);

impl LevelInput for FixedLevel {
    fn read_level(&mut self) -> Result<bool> {
        Ok(self.0)
    }
}

/// Emergency-stop switch with wiring polarity applied
pub struct EmergencyStop {
    input: Box<dyn LevelInput>,
    active_low: bool,
}

impl EmergencyStop {
    pub fn new(input: Box<dyn LevelInput>, active_low: bool) -> Self {
        Self { input, active_low }
    }

    /// No switch wired: a pull-up holds the pin inactive
    pub fn unwired() -> Self {
        Self::new(Box::new(FixedLevel(true)), true)
    }

    pub fn from_config(config: &EmergencyConfig) -> Self {
        match &config.gpio_value_path {
            Some(path) if config.enabled => {
                Self::new(Box::new(SysfsLevelInput::new(path)), config.active_low)
            }
            _ => Self::unwired(),
        }
    }

    /// Sample the switch. An unreadable input counts as asserted.
    pub fn asserted(&mut self) -> bool {
        match self.input.read_level() {
            Ok(level) => level != self.active_low,
            Err(e) => {
                warn!("Emergency input unreadable, treating as asserted: {:#}", e);
                true
            }
        }
    }
}
