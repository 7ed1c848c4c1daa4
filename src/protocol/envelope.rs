// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire-level request and response envelopes.
//!
//! ```text
//! -> {"id":7,"src":"shelly_rpc","method":"Cover.GetStatus","params":{"id":0}}
//! <- {"id":7,"src":"shellyplus2pm-a8032ab1e2c8","dst":"shelly_rpc","result":{...}}
//! <- {"id":7,"src":"shellyplus2pm-a8032ab1e2c8","dst":"shelly_rpc","error":{"code":-103,"message":"..."}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One outgoing call.
#[derive(Debug, Clone, Serialize)]
pub struct Request<'a> {
    /// Correlation id, unique among in-flight calls on one transport.
    pub id: u64,
    /// Name the device should address its response to.
    pub src: &'a str,
    /// `Component.Action` method name, passed through verbatim.
    pub method: &'a str,
    /// Call parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<&'a Value>,
}

impl<'a> Request<'a> {
    /// Creates a request envelope.
    #[must_use]
    pub fn new(id: u64, src: &'a str, method: &'a str, params: Option<&'a Value>) -> Self {
        Self {
            id,
            src,
            method,
            params,
        }
    }
}

/// The error object of a failed call, as sent by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Device error code.
    pub code: i64,
    /// Device error message.
    #[serde(default)]
    pub message: String,
}

/// One incoming response.
///
/// Exactly one of `result` and `error` is expected; the client rejects
/// envelopes carrying both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Correlation id echoed from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Device that produced the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Addressee of the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst: Option<String>,
    /// Result payload of a successful call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error object of a failed call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    /// Creates a successful response carrying `result`.
    #[must_use]
    pub fn success(result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::default()
        }
    }

    /// Creates a failed response carrying a device error.
    #[must_use]
    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self {
            error: Some(ErrorObject {
                code,
                message: message.into(),
            }),
            ..Self::default()
        }
    }

    /// Sets the correlation id.
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}
