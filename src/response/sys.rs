// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! System status and configuration.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of `Sys.GetStatus`.
///
/// # Examples
///
/// ```
/// use shelly_rpc::response::SysStatus;
///
/// let json = r#"{"mac": "A8032ABE54DC", "unixtime": 1700000000, "uptime": 3600}"#;
/// let status: SysStatus = serde_json::from_str(json).unwrap();
///
/// assert_eq!(status.unix_time().unwrap().to_rfc3339(), "2023-11-14T22:13:20+00:00");
/// assert_eq!(status.uptime().unwrap().as_secs(), 3600);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SysStatus {
    /// MAC address, upper-case hex without separators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    /// Whether a reboot is pending for a config change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_required: Option<bool>,
    /// Local time as `HH:MM`; absent until synced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Seconds since the Unix epoch; absent until synced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unixtime: Option<i64>,
    /// Seconds since boot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// Total RAM in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_size: Option<u64>,
    /// Free RAM in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_free: Option<u64>,
    /// Filesystem size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_size: Option<u64>,
    /// Free filesystem space in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_free: Option<u64>,
    /// Configuration revision, bumped on every change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfg_rev: Option<u32>,
    /// Firmware updates on offer, keyed by channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_updates: Option<Value>,
}

impl SysStatus {
    /// Returns the device clock as a UTC timestamp.
    #[must_use]
    pub fn unix_time(&self) -> Option<DateTime<Utc>> {
        self.unixtime
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Returns the time since boot.
    #[must_use]
    pub fn uptime(&self) -> Option<Duration> {
        self.uptime.map(Duration::from_secs)
    }
}

/// Result of `Sys.GetConfig`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SysConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<SysDeviceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SysLocation>,
    /// Configuration revision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfg_rev: Option<u32>,
}

/// `device` section of [`SysConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SysDeviceConfig {
    /// User-assigned device name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fw_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eco_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discoverable: Option<bool>,
}

/// `location` section of [`SysConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SysLocation {
    /// IANA time zone name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unsynced_clock_has_no_time() {
        let status: SysStatus =
            serde_json::from_value(json!({"time": null, "unixtime": null, "uptime": 12})).unwrap();
        assert!(status.unix_time().is_none());
        assert_eq!(status.uptime(), Some(Duration::from_secs(12)));
    }

    #[test]
    fn config_sections() {
        let config: SysConfig = serde_json::from_value(json!({
            "device": {"name": "garage", "eco_mode": false},
            "location": {"tz": "Europe/Sofia", "lat": 42.7, "lon": 23.3},
            "cfg_rev": 10
        }))
        .unwrap();
        assert_eq!(config.device.unwrap().name.as_deref(), Some("garage"));
        assert_eq!(config.location.unwrap().tz.as_deref(), Some("Europe/Sofia"));
        assert_eq!(config.cfg_rev, Some(10));
    }
}
