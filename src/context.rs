// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-call cancellation and deadline.
//!
//! A [`Context`] travels with every call. It bundles a
//! [`CancellationToken`] the caller may trigger at any time with an optional
//! deadline. Both are observed at the single point where a call waits for
//! its response.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use shelly_rpc::Context;
//!
//! let cx = Context::background().with_timeout(Duration::from_secs(2));
//! assert!(cx.deadline().is_some());
//!
//! let child = cx.child();
//! cx.cancel();
//! assert!(child.is_cancelled());
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Delivery, TransportError, TransportErrorKind};

/// Why a context stopped accepting work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Done {
    /// The cancellation token fired.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl Done {
    /// Converts the reason into the transport error a call ends with.
    #[must_use]
    pub fn into_error(self, method: &str, delivery: Delivery) -> TransportError {
        match self {
            Self::Cancelled => TransportError::new(
                method,
                TransportErrorKind::Cancelled,
                delivery,
                "call cancelled by caller",
            ),
            Self::DeadlineExceeded => TransportError::new(
                method,
                TransportErrorKind::Timeout,
                delivery,
                "no response before deadline",
            ),
        }
    }
}

/// Cancellation token plus optional deadline for one or more calls.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Creates a context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Creates a context driven by an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Sets a deadline `timeout` from now, keeping an earlier one if present.
    ///
    /// A timeout too large to represent as an instant leaves the context
    /// unchanged.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Sets an absolute deadline, keeping an earlier one if present.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Derives a context that is cancelled along with this one but can also
    /// be cancelled on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the underlying cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left until the deadline, if any.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns true if the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns why the context is done, or `None` while it is still live.
    ///
    /// Cancellation takes precedence over an expired deadline.
    #[must_use]
    pub fn done(&self) -> Option<Done> {
        if self.token.is_cancelled() {
            Some(Done::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(Done::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Completes when the context is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Completes when the deadline passes; never completes without one.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    /// Completes when the context is done, reporting why.
    pub async fn finished(&self) -> Done {
        tokio::select! {
            biased;
            () = self.cancelled() => Done::Cancelled,
            () = self.expired() => Done::DeadlineExceeded,
        }
    }
}
