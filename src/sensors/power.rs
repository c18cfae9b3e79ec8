// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Battery level estimation

use crate::config::PowerConfig;

/// Linear voltage-to-charge model for a LiPo pack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryModel {
    pub min_voltage: f64,
    pub max_voltage: f64,
    pub low_percent: f64,
}

impl BatteryModel {
    pub fn from_config(config: &PowerConfig) -> Self {
        Self {
            min_voltage: config.battery_min_voltage,
            max_voltage: config.battery_max_voltage,
            low_percent: config.low_battery_percent,
        }
    }

    /// Charge in percent, clamped to 0-100
    pub fn level_percent(&self, voltage: f64) -> f64 {
        let span = self.max_voltage - self.min_voltage;
        if span <= 0.0 || !voltage.is_finite() {
            return 0.0;
        }
        ((voltage - self.min_voltage) / span * 100.0).clamp(0.0, 100.0)
    }

    pub fn is_low(&self, voltage: f64) -> bool {
        self.level_percent(voltage) < self.low_percent
    }
}

impl Default for BatteryModel {
    fn default() -> Self {
        Self::from_config(&PowerConfig::default())
    }
}
