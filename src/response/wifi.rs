// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wi-Fi status and configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::Extensible;

/// Result of `WiFi.GetStatus`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WifiStatus {
    /// Station IP address, once connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sta_ip: Option<String>,
    /// Connection state (`disconnected`, `connecting`, `connected`, `got ip`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    /// Signal strength in dBm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
    /// Clients on the device's own access point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap_client_count: Option<u32>,
}

impl WifiStatus {
    /// Returns true once the station has an address.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status.as_deref() == Some("got ip")
    }
}

/// Result of `WiFi.GetConfig`.
///
/// Station sections keep unknown members so they can be written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WifiConfig {
    /// Access point settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap: Option<Value>,
    /// Primary station.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sta: Option<Extensible<WifiStationConfig>>,
    /// Fallback station.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sta1: Option<Extensible<WifiStationConfig>>,
    /// Roaming settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roam: Option<Value>,
}

/// Station section of [`WifiConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WifiStationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// `dhcp` or `static`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nameserver: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_connected() {
        let status: WifiStatus = serde_json::from_value(json!({
            "sta_ip": "192.168.1.40",
            "status": "got ip",
            "ssid": "home",
            "rssi": -58
        }))
        .unwrap();
        assert!(status.is_connected());
        assert_eq!(status.rssi, Some(-58));
    }

    #[test]
    fn station_keeps_unknown_members() {
        let input = json!({
            "sta": {"ssid": "home", "enable": true, "ipv4mode": "dhcp", "pass_set": true}
        });
        let config: WifiConfig = serde_json::from_value(input.clone()).unwrap();
        let sta = config.sta.as_ref().unwrap();
        assert_eq!(sta.ssid.as_deref(), Some("home"));
        assert_eq!(sta.get_unknown("pass_set"), Some(&json!(true)));
        assert_eq!(serde_json::to_value(&config).unwrap(), input);
    }
}
