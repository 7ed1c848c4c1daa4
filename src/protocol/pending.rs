// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Correlation of in-flight calls on a multiplexed connection.
//!
//! A transport that shares one connection between concurrent calls registers
//! each call here before sending it. The receive side routes every incoming
//! response to its waiter by id. A [`PendingCall`] removes its own entry when
//! dropped, so a cancelled call releases its slot and any late response for
//! it is discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::context::Context;
use crate::error::{Delivery, TransportError, TransportErrorKind};
use crate::protocol::Response;

type Reply = Result<Response, TransportError>;

struct Waiter {
    method: String,
    tx: oneshot::Sender<Reply>,
}

/// Table of calls waiting for a response.
pub(crate) struct PendingCalls {
    next_id: AtomicU64,
    waiters: Mutex<HashMap<u64, Waiter>>,
}

impl PendingCalls {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// Assigns a fresh id and registers a waiter for it.
    pub(crate) fn register(&self, method: &str) -> PendingCall<'_> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(
            id,
            Waiter {
                method: method.to_string(),
                tx,
            },
        );
        PendingCall {
            table: self,
            id,
            rx,
        }
    }

    /// Delivers a response to the call with the matching id.
    ///
    /// Returns `false` if no call is waiting for that id.
    pub(crate) fn complete(&self, response: Response) -> bool {
        let Some(id) = response.id else {
            return false;
        };
        let Some(waiter) = self.waiters.lock().remove(&id) else {
            return false;
        };
        waiter.tx.send(Ok(response)).is_ok()
    }

    /// Fails the call with the given id.
    pub(crate) fn fail(
        &self,
        id: u64,
        kind: TransportErrorKind,
        delivery: Delivery,
        message: &str,
    ) -> bool {
        let Some(waiter) = self.waiters.lock().remove(&id) else {
            return false;
        };
        let err = TransportError::new(waiter.method, kind, delivery, message);
        waiter.tx.send(Err(err)).is_ok()
    }

    /// Fails every waiting call, returning how many there were.
    pub(crate) fn fail_all(&self, kind: TransportErrorKind, message: &str) -> usize {
        let waiters: Vec<Waiter> = self.waiters.lock().drain().map(|(_, w)| w).collect();
        let count = waiters.len();
        for waiter in waiters {
            let err = TransportError::new(waiter.method, kind, Delivery::Unknown, message);
            let _ = waiter.tx.send(Err(err));
        }
        count
    }

    /// Returns the ids of all waiting calls in ascending order.
    pub(crate) fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.waiters.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters.lock().len()
    }
}

/// A registered call. Dropping it releases the correlation slot.
pub(crate) struct PendingCall<'a> {
    table: &'a PendingCalls,
    id: u64,
    rx: oneshot::Receiver<Reply>,
}

impl PendingCall<'_> {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the response, the context's cancellation, or its deadline.
    pub(crate) async fn wait(mut self, cx: &Context, method: &str) -> Reply {
        tokio::select! {
            biased;
            done = cx.finished() => Err(done.into_error(method, Delivery::Unknown)),
            reply = &mut self.rx => reply.unwrap_or_else(|_| {
                Err(TransportError::new(
                    method,
                    TransportErrorKind::ConnectionLost,
                    Delivery::Unknown,
                    "response channel closed",
                ))
            }),
        }
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.table.waiters.lock().remove(&self.id);
    }
}
