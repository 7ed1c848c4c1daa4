// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Members shared by several component statuses.

use serde::{Deserialize, Serialize};

/// Accumulated active energy of a metering output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyCounter {
    /// Total energy in watt-hours.
    pub total: f64,
    /// Energy of each of the last three complete minutes, in milliwatt-hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_minute: Option<Vec<f64>>,
    /// Unix timestamp of the start of the current minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute_ts: Option<i64>,
}

/// Internal temperature of an output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    /// Degrees Celsius.
    #[serde(rename = "tC", default, skip_serializing_if = "Option::is_none")]
    pub celsius: Option<f64>,
    /// Degrees Fahrenheit.
    #[serde(rename = "tF", default, skip_serializing_if = "Option::is_none")]
    pub fahrenheit: Option<f64>,
}
