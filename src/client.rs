// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The RPC client shared by every component accessor.
//!
//! [`Client::call`] is the single dispatch point. Around every call it
//! applies the caller's cancellation and deadline, and it classifies the
//! outcome into the three error kinds of [`crate::error`]. It never retries:
//! several actions move physical hardware and are not safe to repeat
//! blindly.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::component::decode;
use crate::context::Context;
use crate::error::{ApplicationError, Delivery, Error, TransportError, TransportErrorKind};
use crate::protocol::{Response, Transport};

/// RPC client owning one transport.
///
/// `Client` is cheaply cloneable; clones share the transport. Calls take
/// `&self`, so any number of callers may issue calls concurrently.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use shelly_rpc::protocol::{MockTransport, Reply};
/// use shelly_rpc::{Client, Context};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> shelly_rpc::Result<()> {
/// let mock = MockTransport::new().with("Sys.GetStatus", Reply::result(json!({"uptime": 42})));
/// let client = Client::new(mock);
///
/// let status = client.call(&Context::background(), "Sys.GetStatus", None).await?;
/// assert_eq!(status["uptime"], 42);
/// # Ok(())
/// # }
/// ```
pub struct Client<T> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T> {
    transport: T,
    default_timeout: Option<Duration>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.inner.transport)
            .field("default_timeout", &self.inner.default_timeout)
            .finish()
    }
}

impl<T: Transport> Client<T> {
    /// Default deadline for calls whose context has none.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a client with the default timeout.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::builder(transport).build()
    }

    /// Creates a builder for a client over `transport`.
    #[must_use]
    pub fn builder(transport: T) -> ClientBuilder<T> {
        ClientBuilder {
            transport,
            default_timeout: Some(Self::DEFAULT_TIMEOUT),
        }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Returns the deadline applied to calls whose context has none.
    #[must_use]
    pub fn default_timeout(&self) -> Option<Duration> {
        self.inner.default_timeout
    }

    /// Performs one call and returns its raw result payload.
    ///
    /// The call waits for whichever comes first: the transport's response,
    /// the cancellation of `cx`, or the deadline. Cancellation wins ties. A
    /// response arriving after the call gave up is discarded.
    ///
    /// A successful response without a `result` member yields `null`.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] when the exchange did not complete, including
    ///   cancellation and deadline expiry
    /// - [`Error::Application`] when the device reported a failure
    pub async fn call(
        &self,
        cx: &Context,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, Error> {
        if method.is_empty() {
            return Err(TransportError::new(
                method,
                TransportErrorKind::InvalidRequest,
                Delivery::NotSent,
                "method name is empty",
            )
            .into());
        }

        let cx = match (cx.deadline(), self.inner.default_timeout) {
            (None, Some(timeout)) => cx.clone().with_timeout(timeout),
            _ => cx.clone(),
        };
        if let Some(done) = cx.done() {
            return Err(done.into_error(method, Delivery::NotSent).into());
        }

        tracing::debug!(method, "Issuing RPC call");

        let response = tokio::select! {
            biased;
            done = cx.finished() => {
                tracing::debug!(method, ?done, "RPC call abandoned");
                return Err(done.into_error(method, Delivery::Unknown).into());
            }
            response = self.inner.transport.perform(&cx, method, params.as_ref()) => response?,
        };

        let result = classify(method, response);
        tracing::debug!(method, ok = result.is_ok(), "RPC call completed");
        result
    }

    /// Performs one call with serializable params and decodes the result.
    ///
    /// # Errors
    ///
    /// Same as [`Client::call`], plus [`Error::Transport`] with
    /// [`TransportErrorKind::InvalidRequest`] when `params` cannot be
    /// serialized and [`Error::Decode`] when the result does not fit `R`.
    pub async fn call_typed<P, R>(
        &self,
        cx: &Context,
        method: &str,
        params: Option<&P>,
    ) -> Result<R, Error>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = params
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| {
                TransportError::new(
                    method,
                    TransportErrorKind::InvalidRequest,
                    Delivery::NotSent,
                    "params could not be serialized",
                )
                .with_source(e)
            })?;
        let raw = self.call(cx, method, params).await?;
        Ok(decode(raw)?)
    }
}

/// Sorts a response envelope into a payload or a device error.
fn classify(method: &str, response: Response) -> Result<Value, Error> {
    match (response.result, response.error) {
        (Some(_), Some(_)) => Err(TransportError::new(
            method,
            TransportErrorKind::InvalidEnvelope,
            Delivery::Unknown,
            "response carries both result and error",
        )
        .into()),
        (_, Some(error)) => Err(ApplicationError::new(method, error.code, error.message).into()),
        (result, None) => Ok(result.unwrap_or(Value::Null)),
    }
}

/// Builder for a [`Client`].
#[derive(Debug)]
pub struct ClientBuilder<T> {
    transport: T,
    default_timeout: Option<Duration>,
}

impl<T: Transport> ClientBuilder<T> {
    /// Sets the deadline applied to calls whose context has none.
    #[must_use]
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Leaves calls without a deadline unbounded.
    #[must_use]
    pub fn no_default_timeout(mut self) -> Self {
        self.default_timeout = None;
        self
    }

    /// Builds the client.
    #[must_use]
    pub fn build(self) -> Client<T> {
        Client {
            inner: Arc::new(ClientInner {
                transport: self.transport,
                default_timeout: self.default_timeout,
            }),
        }
    }
}
