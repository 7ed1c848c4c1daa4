// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cover status and configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::Extensible;
use crate::response::{EnergyCounter, TemperatureReading};
use crate::types::Position;

/// Motion state of a cover.
///
/// States added by newer firmware decode as [`CoverState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CoverState {
    /// Fully open.
    Open,
    /// Fully closed.
    Closed,
    /// Moving towards open.
    Opening,
    /// Moving towards closed.
    Closing,
    /// Stopped part way.
    Stopped,
    /// Running a calibration cycle.
    Calibrating,
    /// A state this library does not know.
    Other(String),
}

impl CoverState {
    /// Returns the wire name of the state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Stopped => "stopped",
            Self::Calibrating => "calibrating",
            Self::Other(state) => state,
        }
    }

    /// Returns true while the motor runs.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        matches!(self, Self::Opening | Self::Closing | Self::Calibrating)
    }
}

impl From<String> for CoverState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "open" => Self::Open,
            "closed" => Self::Closed,
            "opening" => Self::Opening,
            "closing" => Self::Closing,
            "stopped" => Self::Stopped,
            "calibrating" => Self::Calibrating,
            _ => Self::Other(state),
        }
    }
}

impl From<CoverState> for String {
    fn from(state: CoverState) -> Self {
        match state {
            CoverState::Other(state) => state,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for CoverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of `Cover.GetStatus`.
///
/// # Examples
///
/// ```
/// use shelly_rpc::response::{CoverState, CoverStatus};
///
/// let json = r#"{"id": 0, "source": "http", "state": "open", "current_pos": 100}"#;
/// let status: CoverStatus = serde_json::from_str(json).unwrap();
/// assert_eq!(status.state, Some(CoverState::Open));
/// assert_eq!(status.position().map(|p| p.value()), Some(100));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverStatus {
    /// Instance id.
    pub id: u32,
    /// What triggered the last state change (`http`, `button`, `timer`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Motion state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CoverState>,
    /// Active power in watts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apower: Option<f64>,
    /// Supply voltage in volts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    /// Current in amperes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    /// Power factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pf: Option<f64>,
    /// Supply frequency in hertz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq: Option<f64>,
    /// Energy counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aenergy: Option<Extensible<EnergyCounter>>,
    /// Internal temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<TemperatureReading>,
    /// Whether the cover is calibrated and accepts positions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_control: Option<bool>,
    /// Direction of the last movement (`open` or `close`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_direction: Option<String>,
    /// Current position in percent; only with `pos_control`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_pos: Option<u8>,
    /// Target of a running move in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_pos: Option<u8>,
    /// Seconds after which a running move is stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_timeout: Option<f64>,
    /// Unix time at which the running move started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_started_at: Option<f64>,
    /// Active fault conditions (`overtemp`, `overpower`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl CoverStatus {
    /// Returns the current position, if the device reports one.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.current_pos.and_then(|pos| Position::new(pos).ok())
    }

    /// Returns true while the motor runs.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.state.as_ref().is_some_and(CoverState::is_moving)
    }
}

/// Result of `Cover.GetConfig`, and the body of `Cover.SetConfig`.
///
/// Members left as `None` are not sent, so a default value with one member
/// set changes only that member on the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverConfig {
    /// Instance id; reported by the device, ignored on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    /// User-assigned name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Input mode (`single`, `dual`, `detached`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_mode: Option<String>,
    /// State after power-on (`open`, `closed`, `stopped`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<String>,
    /// Swap the open and close outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invert_directions: Option<bool>,
    /// Swap the open and close inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_inputs: Option<bool>,
    /// Maximum seconds for a full opening move.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxtime_open: Option<f64>,
    /// Maximum seconds for a full closing move.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxtime_close: Option<f64>,
    /// Power limit in watts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_limit: Option<f64>,
    /// Voltage limit in volts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage_limit: Option<f64>,
    /// Current limit in amperes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_limit: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_known_and_unknown() {
        let state: CoverState = serde_json::from_value(json!("closing")).unwrap();
        assert_eq!(state, CoverState::Closing);
        assert!(state.is_moving());

        let state: CoverState = serde_json::from_value(json!("jammed")).unwrap();
        assert_eq!(state, CoverState::Other("jammed".to_string()));
        assert_eq!(serde_json::to_value(state).unwrap(), json!("jammed"));
    }

    #[test]
    fn status_minimal() {
        let status: CoverStatus = serde_json::from_value(json!({"id": 1})).unwrap();
        assert_eq!(status.id, 1);
        assert!(status.position().is_none());
        assert!(!status.is_moving());
    }

    #[test]
    fn status_round_trip_with_unknown_members() {
        let input = json!({
            "id": 0,
            "source": "limit_switch",
            "state": "stopped",
            "apower": 0.0,
            "voltage": 231.4,
            "aenergy": {"total": 2.5, "by_minute": [0.0, 0.0, 0.0], "minute_ts": 1_700_000_000},
            "temperature": {"tC": 41.2, "tF": 106.2},
            "pos_control": true,
            "last_direction": "open",
            "current_pos": 60,
            "slat_pos": 15
        });
        let status: Extensible<CoverStatus> = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(status.position(), Position::new(60).ok());
        assert_eq!(status.unknown.len(), 1);
        assert_eq!(serde_json::to_value(&status).unwrap(), input);
    }

    #[test]
    fn uncalibrated_status_keeps_null_positions() {
        let input = json!({
            "id": 0,
            "state": "stopped",
            "pos_control": false,
            "current_pos": null,
            "target_pos": null
        });
        let status: Extensible<CoverStatus> = serde_json::from_value(input.clone()).unwrap();
        assert!(status.position().is_none());
        assert!(status.target_pos.is_none());
        assert_eq!(serde_json::to_value(&status).unwrap(), input);
    }

    #[test]
    fn position_out_of_range_is_none() {
        let status: CoverStatus =
            serde_json::from_value(json!({"id": 0, "current_pos": 120})).unwrap();
        assert!(status.position().is_none());
    }

    #[test]
    fn config_writes_only_set_members() {
        let config = CoverConfig {
            maxtime_open: Some(30.0),
            ..CoverConfig::default()
        };
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({"maxtime_open": 30.0})
        );
    }
}
