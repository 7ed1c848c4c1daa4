// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch status and configuration.

use serde::{Deserialize, Serialize};

use crate::component::Extensible;
use crate::response::{EnergyCounter, TemperatureReading};

/// Result of `Switch.Set` and `Switch.Toggle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasOn {
    /// Output state before the call.
    pub was_on: bool,
}

/// Result of `Switch.GetStatus`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchStatus {
    /// Instance id.
    pub id: u32,
    /// What triggered the last state change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Whether the output is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<bool>,
    /// Active power in watts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apower: Option<f64>,
    /// Supply voltage in volts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    /// Current in amperes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    /// Supply frequency in hertz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq: Option<f64>,
    /// Energy counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aenergy: Option<Extensible<EnergyCounter>>,
    /// Internal temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<TemperatureReading>,
    /// Unix time at which a flip-back timer started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_started_at: Option<f64>,
    /// Duration of the flip-back timer in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_duration: Option<f64>,
}

impl SwitchStatus {
    /// Returns true if the output is reported on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.output.unwrap_or(false)
    }
}

/// Result of `Switch.GetConfig`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Instance id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    /// User-assigned name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Input mode (`momentary`, `follow`, `flip`, `detached`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_mode: Option<String>,
    /// State after power-on (`off`, `on`, `restore_last`, `match_input`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<String>,
    /// Turn back on after `auto_on_delay` seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_on_delay: Option<f64>,
    /// Turn back off after `auto_off_delay` seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_off: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_off_delay: Option<f64>,
    /// Power limit in watts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_limit: Option<f64>,
}
