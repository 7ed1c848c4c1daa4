// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-process transport for tests.
//!
//! [`MockTransport`] answers each method with a scripted [`Reply`] and records
//! every call it sees. Replies may be delayed, or deferred until the test
//! resolves them by correlation id, which makes it possible to deliver
//! responses in any order.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use shelly_rpc::protocol::{MockTransport, Reply};
//! use shelly_rpc::{Client, Context};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> shelly_rpc::Result<()> {
//! let mock = MockTransport::new().with("Switch.Toggle", Reply::result(json!({"was_on": true})));
//! let client = Client::new(mock.clone());
//!
//! let result = client
//!     .call(&Context::background(), "Switch.Toggle", Some(json!({"id": 0})))
//!     .await?;
//! assert_eq!(result, json!({"was_on": true}));
//! assert_eq!(mock.calls()[0].params, Some(json!({"id": 0})));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;

use crate::context::Context;
use crate::error::{ApplicationError, Delivery, TransportError, TransportErrorKind};
use crate::protocol::{PendingCalls, Response, Transport};

/// A scripted answer to a call.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Succeed with this result payload.
    Result(Value),
    /// Fail with a device-reported error.
    DeviceError {
        /// Device error code.
        code: i64,
        /// Device error message.
        message: String,
    },
    /// Fail at the transport level.
    Failure {
        /// What went wrong.
        kind: TransportErrorKind,
        /// Whether the call may have reached the device.
        delivery: Delivery,
        /// Description.
        message: String,
    },
    /// Answer with this exact envelope.
    Envelope(Response),
    /// Wait, then answer with the inner reply.
    Delayed(Duration, Box<Reply>),
    /// Park the call until [`MockTransport::resolve`] answers it.
    Deferred,
}

impl Reply {
    /// Succeeds with `result`.
    #[must_use]
    pub fn result(result: Value) -> Self {
        Self::Result(result)
    }

    /// Fails with a device error.
    #[must_use]
    pub fn device_error(code: i64, message: impl Into<String>) -> Self {
        Self::DeviceError {
            code,
            message: message.into(),
        }
    }

    /// Fails at the transport level.
    #[must_use]
    pub fn failure(kind: TransportErrorKind, delivery: Delivery) -> Self {
        Self::Failure {
            kind,
            delivery,
            message: format!("scripted {kind}"),
        }
    }

    /// Delays this reply by `delay`.
    #[must_use]
    pub fn delayed(self, delay: Duration) -> Self {
        Self::Delayed(delay, Box::new(self))
    }
}

/// A call observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Method name as passed to the transport.
    pub method: String,
    /// Parameters as passed to the transport.
    pub params: Option<Value>,
}

struct MockInner {
    replies: Mutex<HashMap<String, Reply>>,
    fallback: Mutex<Option<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
    deferred: PendingCalls,
    parked: watch::Sender<usize>,
}

/// Scriptable in-process transport.
///
/// Cloning shares the script and the call log. Methods without a scripted
/// reply get the fallback, which by default is the device's "no handler"
/// error.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

impl MockTransport {
    /// Creates a mock with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        let (parked, _) = watch::channel(0);
        Self {
            inner: Arc::new(MockInner {
                replies: Mutex::new(HashMap::new()),
                fallback: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
                deferred: PendingCalls::new(),
                parked,
            }),
        }
    }

    /// Scripts the reply for `method`, builder style.
    #[must_use]
    pub fn with(self, method: impl Into<String>, reply: Reply) -> Self {
        self.on(method, reply);
        self
    }

    /// Scripts the reply for `method`, replacing any earlier one.
    pub fn on(&self, method: impl Into<String>, reply: Reply) -> &Self {
        self.inner.replies.lock().insert(method.into(), reply);
        self
    }

    /// Sets the reply for methods without a scripted one.
    pub fn fallback(&self, reply: Reply) -> &Self {
        *self.inner.fallback.lock() = Some(reply);
        self
    }

    /// Returns every call seen so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.calls.lock().clone()
    }

    /// Returns the calls made to `method`, oldest first.
    #[must_use]
    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.inner
            .calls
            .lock()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Returns the correlation ids of parked calls in ascending order.
    #[must_use]
    pub fn deferred_ids(&self) -> Vec<u64> {
        self.inner.deferred.ids()
    }

    /// Returns how many calls are parked right now.
    #[must_use]
    pub fn deferred_count(&self) -> usize {
        self.inner.deferred.len()
    }

    /// Waits until at least `count` calls have been parked since creation.
    pub async fn wait_for_deferred(&self, count: usize) {
        let mut rx = self.inner.parked.subscribe();
        let _ = rx.wait_for(|parked| *parked >= count).await;
    }

    /// Answers the parked call `id`. Delays in `reply` are ignored.
    ///
    /// Returns `false` if no call with that id is parked, for instance
    /// because its caller gave up.
    pub fn resolve(&self, id: u64, reply: Reply) -> bool {
        let deferred = &self.inner.deferred;
        match reply {
            Reply::Result(result) => deferred.complete(Response::success(result).with_id(id)),
            Reply::DeviceError { code, message } => {
                deferred.complete(Response::failure(code, message).with_id(id))
            }
            Reply::Failure {
                kind,
                delivery,
                message,
            } => deferred.fail(id, kind, delivery, &message),
            Reply::Envelope(response) => deferred.complete(response.with_id(id)),
            Reply::Delayed(_, next) => self.resolve(id, *next),
            Reply::Deferred => false,
        }
    }

    fn reply_for(&self, method: &str) -> Reply {
        if let Some(reply) = self.inner.replies.lock().get(method) {
            return reply.clone();
        }
        self.inner.fallback.lock().clone().unwrap_or_else(|| {
            Reply::device_error(
                ApplicationError::METHOD_NOT_FOUND,
                format!("No handler for {method}"),
            )
        })
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("calls", &self.inner.calls.lock().len())
            .field("deferred", &self.inner.deferred.len())
            .finish_non_exhaustive()
    }
}

impl Transport for MockTransport {
    async fn perform(
        &self,
        cx: &Context,
        method: &str,
        params: Option<&Value>,
    ) -> Result<Response, TransportError> {
        self.inner.calls.lock().push(RecordedCall {
            method: method.to_string(),
            params: params.cloned(),
        });
        tracing::trace!(method, "Mock transport call");

        let mut reply = self.reply_for(method);
        loop {
            match reply {
                Reply::Delayed(delay, next) => {
                    tokio::time::sleep(delay).await;
                    reply = *next;
                }
                Reply::Deferred => {
                    let call = self.inner.deferred.register(method);
                    self.inner.parked.send_modify(|parked| *parked += 1);
                    return call.wait(cx, method).await;
                }
                Reply::Result(result) => return Ok(Response::success(result)),
                Reply::DeviceError { code, message } => {
                    return Ok(Response::failure(code, message));
                }
                Reply::Failure {
                    kind,
                    delivery,
                    message,
                } => return Err(TransportError::new(method, kind, delivery, message)),
                Reply::Envelope(response) => return Ok(response),
            }
        }
    }
}
