// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transports that carry calls to a device.
//!
//! A [`Transport`] performs one logical call: given a method name and
//! parameters it returns the decoded response envelope or a
//! [`TransportError`]. How bytes are framed on the wire is entirely the
//! transport's concern.
//!
//! # Transports
//!
//! - [`HttpTransport`]: one HTTP exchange per call, stateless
//! - [`MqttTransport`]: one persistent broker connection multiplexing many
//!   concurrent calls by correlation id
//! - [`MockTransport`]: scriptable in-process double for tests

mod envelope;
#[cfg(feature = "http")]
mod http;
mod mock;
#[cfg(feature = "mqtt")]
mod mqtt;
mod pending;

pub use envelope::{ErrorObject, Request, Response};
#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpTransport, RequestStyle};
pub use mock::{MockTransport, RecordedCall, Reply};
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttTransport, MqttTransportBuilder};

pub(crate) use pending::PendingCalls;

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::error::TransportError;

/// Something that can perform a call against a device.
///
/// Implementations must be safe to use from many concurrent callers. A
/// stateful transport multiplexing one connection is responsible for
/// correlating responses to their calls; the [`Client`](crate::Client) does
/// not assume any ordering.
pub trait Transport: Send + Sync {
    /// Performs `method` with `params` and returns the response envelope.
    ///
    /// The transport returns the payload exactly as the device produced it;
    /// it does not interpret the `result` member. Device-reported failures
    /// travel inside the envelope and are classified by the client.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when the call cannot be delivered, the
    /// connection is lost, the context finishes first, or the received bytes
    /// are not a valid envelope.
    fn perform(
        &self,
        cx: &Context,
        method: &str,
        params: Option<&Value>,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn perform(
        &self,
        cx: &Context,
        method: &str,
        params: Option<&Value>,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send {
        (**self).perform(cx, method, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transports_implement_trait() {
        fn assert_transport<T: Transport>() {}
        assert_transport::<MockTransport>();
        assert_transport::<Arc<MockTransport>>();
        #[cfg(feature = "http")]
        assert_transport::<HttpTransport>();
        #[cfg(feature = "mqtt")]
        assert_transport::<MqttTransport>();
    }
}
