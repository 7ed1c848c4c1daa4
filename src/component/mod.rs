// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Component addressing.
//!
//! A device is made of components. Some are singletons addressed by type
//! alone (`sys`, `wifi`); others are instances addressed by a numeric id
//! (`cover:0`, `switch:1`). This module provides:
//!
//! - [`ComponentType`]: the static table from logical type to wire namespace
//! - [`ComponentRef`]: a `(type, id)` pair, displayed as its component key
//! - [`inject_id`], [`decode`], [`annotate`]: the helpers every accessor
//!   runs its calls through
//! - [`Extensible`]: a decoded value plus the members it did not recognise
//! - [`ComponentHandle`]: a component bound to a client
//!
//! # Examples
//!
//! ```
//! use shelly_rpc::component::{ComponentRef, ComponentType};
//!
//! let cover: ComponentRef = "cover:1".parse().unwrap();
//! assert_eq!(cover.kind(), ComponentType::Cover);
//! assert_eq!(cover.id(), Some(1));
//! assert_eq!(cover.method("GoToPosition"), "Cover.GoToPosition");
//!
//! let wifi = ComponentRef::singleton(ComponentType::Wifi);
//! assert_eq!(wifi.to_string(), "wifi");
//! assert_eq!(wifi.method("GetStatus"), "WiFi.GetStatus");
//! ```

mod addressing;
mod extensible;
mod handle;

pub use addressing::{ID_KEY, annotate, decode, decode_slice, inject_id};
pub use extensible::Extensible;
pub use handle::{ComponentHandle, SetConfigResult};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KeyError;

/// Every component type the client knows how to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentType {
    /// Device-wide methods (`Shelly.GetStatus`, `Shelly.Reboot`).
    Shelly,
    /// System settings and status.
    Sys,
    /// Wi-Fi station and access point.
    Wifi,
    /// Wired Ethernet.
    Eth,
    /// Bluetooth Low Energy.
    Ble,
    /// Cloud connection.
    Cloud,
    /// MQTT client settings.
    Mqtt,
    /// Outbound websocket.
    Ws,
    /// Roller shutter / cover.
    Cover,
    /// Relay output.
    Switch,
    /// Digital or analog input.
    Input,
    /// Dimmable light output.
    Light,
    /// Three-phase energy meter.
    Em,
    /// Single-phase energy meter.
    Em1,
    /// Energy meter data store.
    EmData,
    /// Single-phase power meter.
    Pm1,
    /// Temperature sensor.
    Temperature,
    /// Humidity sensor.
    Humidity,
    /// Voltmeter add-on.
    Voltmeter,
    /// Battery status.
    DevicePower,
    /// User script.
    Script,
}

impl ComponentType {
    /// All component types, in table order.
    pub const ALL: [Self; 21] = [
        Self::Shelly,
        Self::Sys,
        Self::Wifi,
        Self::Eth,
        Self::Ble,
        Self::Cloud,
        Self::Mqtt,
        Self::Ws,
        Self::Cover,
        Self::Switch,
        Self::Input,
        Self::Light,
        Self::Em,
        Self::Em1,
        Self::EmData,
        Self::Pm1,
        Self::Temperature,
        Self::Humidity,
        Self::Voltmeter,
        Self::DevicePower,
        Self::Script,
    ];

    /// Returns the namespace used in method names (`WiFi` in `WiFi.GetStatus`).
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Shelly => "Shelly",
            Self::Sys => "Sys",
            Self::Wifi => "WiFi",
            Self::Eth => "Eth",
            Self::Ble => "BLE",
            Self::Cloud => "Cloud",
            Self::Mqtt => "MQTT",
            Self::Ws => "WS",
            Self::Cover => "Cover",
            Self::Switch => "Switch",
            Self::Input => "Input",
            Self::Light => "Light",
            Self::Em => "EM",
            Self::Em1 => "EM1",
            Self::EmData => "EMData",
            Self::Pm1 => "PM1",
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::Voltmeter => "Voltmeter",
            Self::DevicePower => "DevicePower",
            Self::Script => "Script",
        }
    }

    /// Returns the lowercase prefix used in component keys (`wifi`, `cover`).
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::Shelly => "shelly",
            Self::Sys => "sys",
            Self::Wifi => "wifi",
            Self::Eth => "eth",
            Self::Ble => "ble",
            Self::Cloud => "cloud",
            Self::Mqtt => "mqtt",
            Self::Ws => "ws",
            Self::Cover => "cover",
            Self::Switch => "switch",
            Self::Input => "input",
            Self::Light => "light",
            Self::Em => "em",
            Self::Em1 => "em1",
            Self::EmData => "emdata",
            Self::Pm1 => "pm1",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Voltmeter => "voltmeter",
            Self::DevicePower => "devicepower",
            Self::Script => "script",
        }
    }

    /// Returns true if the type is addressed without an instance id.
    #[must_use]
    pub const fn is_singleton(self) -> bool {
        matches!(
            self,
            Self::Shelly
                | Self::Sys
                | Self::Wifi
                | Self::Eth
                | Self::Ble
                | Self::Cloud
                | Self::Mqtt
                | Self::Ws
        )
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

impl FromStr for ComponentType {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key_prefix() == s)
            .ok_or_else(|| KeyError::UnknownType(s.to_string()))
    }
}

/// A component on a device: its type plus, for instances, its id.
///
/// Displays as the component key, `type` or `type:id`. The range of valid
/// ids is up to the device; the client passes them through unchecked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentRef {
    kind: ComponentType,
    id: Option<u32>,
}

impl ComponentRef {
    /// Refers to a component, checking that `id` fits the type's addressing.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::MissingId` for an instance type without an id and
    /// `KeyError::UnexpectedId` for a singleton given one.
    pub fn new(kind: ComponentType, id: Option<u32>) -> Result<Self, KeyError> {
        match (kind.is_singleton(), id) {
            (true, Some(_)) => Err(KeyError::UnexpectedId(kind)),
            (false, None) => Err(KeyError::MissingId(kind)),
            _ => Ok(Self { kind, id }),
        }
    }

    /// Refers to a singleton component.
    ///
    /// The id is omitted even if `kind` is normally instance-addressed.
    #[must_use]
    pub const fn singleton(kind: ComponentType) -> Self {
        Self { kind, id: None }
    }

    /// Refers to instance `id` of `kind`.
    #[must_use]
    pub const fn instance(kind: ComponentType, id: u32) -> Self {
        Self { kind, id: Some(id) }
    }

    /// Returns the component type.
    #[must_use]
    pub const fn kind(&self) -> ComponentType {
        self.kind
    }

    /// Returns the instance id, or `None` for singletons.
    #[must_use]
    pub const fn id(&self) -> Option<u32> {
        self.id
    }

    /// Returns the full method name for `action`, e.g. `Cover.Open`.
    #[must_use]
    pub fn method(&self, action: &str) -> String {
        format!("{}.{action}", self.kind.namespace())
    }

    /// Returns the component key, e.g. `cover:0` or `sys`.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}:{id}", self.kind.key_prefix()),
            None => f.write_str(self.kind.key_prefix()),
        }
    }
}

impl FromStr for ComponentRef {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = match s.split_once(':') {
            Some((kind, id)) => {
                let id = id
                    .parse::<u32>()
                    .map_err(|_| KeyError::InvalidId(id.to_string()))?;
                (kind.parse()?, Some(id))
            }
            None => (s.parse()?, None),
        };
        Self::new(kind, id)
    }
}

impl Serialize for ComponentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ComponentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}
