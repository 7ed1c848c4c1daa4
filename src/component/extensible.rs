// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Forward-compatible decoding.
//!
//! Devices add fields with new firmware. [`Extensible`] pairs a typed value
//! with the members of the JSON object that the type does not map, so that
//! decoding and re-encoding a config never drops anything.

use std::ops::{Deref, DerefMut};

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed value plus the unknown members of the object it was decoded from.
///
/// Decoding hands the object to `T`, then keeps in `unknown` every member
/// that `T` does not reproduce when encoded. That covers members `T` does not
/// name and known members `T` reads as absent, such as an optional field sent
/// as `null`. Encoding writes `T` first and then each `unknown` member whose
/// name `T` did not emit, so each input member appears exactly once in the
/// output and a field set through `T` replaces the stored one.
///
/// Optional fields of `T` should skip serialization when absent
/// (`skip_serializing_if = "Option::is_none"`).
///
/// # Examples
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
/// use shelly_rpc::component::Extensible;
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Status {
///     id: u32,
///     #[serde(default, skip_serializing_if = "Option::is_none")]
///     output: Option<bool>,
/// }
///
/// let input = json!({"id": 0, "output": true, "overtemperature": false});
/// let status: Extensible<Status> = serde_json::from_value(input.clone()).unwrap();
///
/// assert_eq!(status.output, Some(true));
/// assert_eq!(status.unknown["overtemperature"], json!(false));
/// assert_eq!(serde_json::to_value(&status).unwrap(), input);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensible<T> {
    /// The members `T` maps.
    pub known: T,
    /// Every member `T` does not reproduce, keyed by name.
    pub unknown: Map<String, Value>,
}

impl<T> Extensible<T> {
    /// Wraps a value with no unknown members.
    #[must_use]
    pub fn new(known: T) -> Self {
        Self {
            known,
            unknown: Map::new(),
        }
    }

    /// Returns the unknown member `key`, if present.
    #[must_use]
    pub fn get_unknown(&self, key: &str) -> Option<&Value> {
        self.unknown.get(key)
    }

    /// Splits into the typed value and the unknown members.
    #[must_use]
    pub fn into_parts(self) -> (T, Map<String, Value>) {
        (self.known, self.unknown)
    }

    /// Returns the typed value, discarding unknown members.
    #[must_use]
    pub fn into_known(self) -> T {
        self.known
    }
}

fn to_members<T: Serialize + ?Sized>(value: &T) -> Result<Map<String, Value>, String> {
    match serde_json::to_value(value).map_err(|e| e.to_string())? {
        Value::Object(members) => Ok(members),
        other => Err(format!("expected an object, found {other}")),
    }
}

impl<T: Serialize> Serialize for Extensible<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut members = to_members(&self.known).map_err(ser::Error::custom)?;
        for (key, value) in &self.unknown {
            if !members.contains_key(key) {
                members.insert(key.clone(), value.clone());
            }
        }
        members.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned + Serialize> Deserialize<'de> for Extensible<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut members: Map<String, Value> = Map::deserialize(deserializer)?;
        let known = T::deserialize(Value::Object(members.clone())).map_err(de::Error::custom)?;
        for key in to_members(&known).map_err(de::Error::custom)?.keys() {
            members.remove(key);
        }
        Ok(Self {
            known,
            unknown: members,
        })
    }
}

impl<T> From<T> for Extensible<T> {
    fn from(known: T) -> Self {
        Self::new(known)
    }
}

impl<T> Deref for Extensible<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.known
    }
}

impl<T> DerefMut for Extensible<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.known
    }
}
