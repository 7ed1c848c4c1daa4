// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device-wide results from the `Shelly` namespace.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{ComponentRef, ComponentType, decode};
use crate::error::DecodeError;

/// Result of `Shelly.GetDeviceInfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device id, `<model family>-<mac>`.
    pub id: String,
    /// MAC address, upper-case hex without separators.
    pub mac: String,
    /// Model identifier, e.g. `SNSW-102P16EU`.
    pub model: String,
    /// Device generation.
    #[serde(rename = "gen")]
    pub generation: u8,
    /// Firmware build id.
    pub fw_id: String,
    /// Firmware version.
    pub ver: String,
    /// Application name, e.g. `Plus2PM`.
    pub app: String,
    /// User-assigned name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Current device profile, for devices that have several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Whether authentication is enabled.
    #[serde(default)]
    pub auth_en: bool,
    /// Authentication realm, set when authentication is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_domain: Option<String>,
}

/// Result of `Shelly.ListMethods`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodList {
    /// Every method the device accepts.
    pub methods: Vec<String>,
}

impl MethodList {
    /// Returns true if the device accepts `method`.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }

    /// Returns the methods in `kind`'s namespace.
    pub fn for_type(&self, kind: ComponentType) -> impl Iterator<Item = &str> {
        let prefix = format!("{}.", kind.namespace());
        self.methods
            .iter()
            .filter(move |m| m.starts_with(&prefix))
            .map(String::as_str)
    }
}

/// Result of `Shelly.GetStatus`: every component's status keyed by
/// component key.
///
/// Members are kept as raw JSON and decoded on lookup, so a component this
/// library does not model never fails the whole result.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use shelly_rpc::component::{ComponentRef, ComponentType};
/// use shelly_rpc::response::{DeviceStatus, SwitchStatus};
///
/// let status: DeviceStatus = serde_json::from_value(json!({
///     "switch:0": {"id": 0, "output": true},
///     "sys": {"uptime": 10},
///     "knx": {}
/// }))
/// .unwrap();
///
/// let switch = ComponentRef::instance(ComponentType::Switch, 0);
/// let decoded: SwitchStatus = status.status_of(&switch).unwrap().unwrap();
/// assert!(decoded.is_on());
/// assert_eq!(status.components().count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceStatus {
    members: BTreeMap<String, Value>,
}

impl DeviceStatus {
    /// Returns the raw status of `component`.
    #[must_use]
    pub fn get(&self, component: &ComponentRef) -> Option<&Value> {
        self.members.get(&component.key())
    }

    /// Returns the raw member `key`, whether or not it names a component.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.members.get(key)
    }

    /// Decodes the status of `component` into `T`.
    ///
    /// Returns `Ok(None)` if the device did not report the component.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the member does not fit `T`.
    pub fn status_of<T: DeserializeOwned>(
        &self,
        component: &ComponentRef,
    ) -> Result<Option<T>, DecodeError> {
        self.get(component).cloned().map(decode).transpose()
    }

    /// Iterates over the members whose keys name a known component.
    pub fn components(&self) -> impl Iterator<Item = ComponentRef> + '_ {
        self.members.keys().filter_map(|key| key.parse().ok())
    }

    /// Iterates over the instances of `kind`.
    pub fn instances(&self, kind: ComponentType) -> impl Iterator<Item = ComponentRef> + '_ {
        self.components().filter(move |c| c.kind() == kind)
    }

    /// Returns the number of members, known or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the device reported nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the members keyed by raw key.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.members
    }
}
