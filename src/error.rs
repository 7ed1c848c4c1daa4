// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `shelly_rpc` library.
//!
//! Every failure surfaced by [`Client::call`](crate::Client::call) and the
//! component helpers falls into exactly one of three kinds:
//!
//! - [`TransportError`]: the exchange did not complete over the wire.
//! - [`ApplicationError`]: the device processed the call and reported a failure.
//! - [`DecodeError`]: the device answered, but the payload did not fit the
//!   requested type.
//!
//! [`Error::Component`] only adds context (component key and action); the
//! kind of the wrapped error is always reachable through [`Error::kind`].

use std::fmt;

use thiserror::Error;

use crate::component::{ComponentRef, ComponentType};

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The call could not be completed over the wire.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The device reported a failure for the call.
    #[error("device error: {0}")]
    Application(#[from] ApplicationError),

    /// The result payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A failure annotated with the component and action that produced it.
    #[error("{component} {action}: {source}")]
    Component {
        /// The component the call was addressed to.
        component: ComponentRef,
        /// The attempted action (e.g. `Open`, `GetStatus`).
        action: String,
        /// The underlying failure.
        source: Box<Error>,
    },
}

/// The three kinds of failure a call can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`TransportError`].
    Transport,
    /// See [`ApplicationError`].
    Application,
    /// See [`DecodeError`].
    Decode,
}

impl Error {
    /// Returns the kind of this error, looking through component annotations.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Application(_) => ErrorKind::Application,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Component { source, .. } => source.kind(),
        }
    }

    /// Returns the innermost error with all component annotations removed.
    #[must_use]
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Self::Component { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns the transport error, if this is one.
    #[must_use]
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self.root() {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the device-reported error, if this is one.
    #[must_use]
    pub fn as_application(&self) -> Option<&ApplicationError> {
        match self.root() {
            Self::Application(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the decode error, if this is one.
    #[must_use]
    pub fn as_decode(&self) -> Option<&DecodeError> {
        match self.root() {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the component this error is annotated with, if any.
    ///
    /// The outermost annotation wins.
    #[must_use]
    pub fn component(&self) -> Option<&ComponentRef> {
        match self {
            Self::Component { component, .. } => Some(component),
            _ => None,
        }
    }

    /// Returns true if the call was cancelled by the caller's context.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.as_transport()
            .is_some_and(|e| e.kind() == TransportErrorKind::Cancelled)
    }

    /// Returns true if the call ran past its deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.as_transport()
            .is_some_and(|e| e.kind() == TransportErrorKind::Timeout)
    }

    /// Returns true if the call is known not to have reached the device.
    ///
    /// Only these failures may be retried for non-idempotent actions.
    #[must_use]
    pub fn is_retry_safe(&self) -> bool {
        self.as_transport().is_some_and(TransportError::is_retry_safe)
    }

    /// Wraps this error with the component and action that produced it.
    #[must_use]
    pub fn annotate(self, component: ComponentRef, action: impl Into<String>) -> Self {
        Self::Component {
            component,
            action: action.into(),
            source: Box::new(self),
        }
    }
}

/// Whether a failed call may have had an effect on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// The request is known not to have reached the device.
    NotSent,
    /// The request may or may not have been applied.
    Unknown,
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSent => f.write_str("not sent"),
            Self::Unknown => f.write_str("delivery unknown"),
        }
    }
}

/// What went wrong on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The device or broker could not be reached.
    Unreachable,
    /// The connection dropped while the call was in flight.
    ConnectionLost,
    /// No response arrived before the deadline.
    Timeout,
    /// The caller cancelled the call.
    Cancelled,
    /// The received bytes are not a valid response envelope.
    InvalidEnvelope,
    /// The request could not be built (empty method, unserializable params).
    InvalidRequest,
    /// The HTTP layer answered with a non-success status and no device error.
    Status(u16),
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => f.write_str("unreachable"),
            Self::ConnectionLost => f.write_str("connection lost"),
            Self::Timeout => f.write_str("deadline exceeded"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::InvalidEnvelope => f.write_str("invalid response envelope"),
            Self::InvalidRequest => f.write_str("invalid request"),
            Self::Status(code) => write!(f, "HTTP status {code}"),
        }
    }
}

/// A call that could not be completed over the wire.
#[derive(Debug, Error)]
#[error("{method}: {kind} ({delivery}): {message}")]
pub struct TransportError {
    method: String,
    kind: TransportErrorKind,
    delivery: Delivery,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Creates a transport error for the given method.
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        kind: TransportErrorKind,
        delivery: Delivery,
        message: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            kind,
            delivery,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the method of the failed call.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns what went wrong.
    #[must_use]
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Returns whether the call may have reached the device.
    #[must_use]
    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the request is known not to have reached the device.
    #[must_use]
    pub fn is_retry_safe(&self) -> bool {
        self.delivery == Delivery::NotSent
    }
}

/// A failure reported by the device itself.
///
/// The code and message are passed through exactly as the device sent them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{method}: device error {code}: {message}")]
pub struct ApplicationError {
    /// The method of the failed call.
    pub method: String,
    /// Device error code.
    pub code: i64,
    /// Device error message.
    pub message: String,
}

impl ApplicationError {
    /// An argument was missing, malformed or out of range.
    pub const INVALID_ARGUMENT: i64 = -103;
    /// The device gave up on the operation.
    pub const DEADLINE_EXCEEDED: i64 = -104;
    /// The addressed entity does not exist.
    pub const NOT_FOUND: i64 = -105;
    /// The device ran out of a resource (memory, handles).
    pub const RESOURCE_EXHAUSTED: i64 = -108;
    /// The component is not in a state that permits the call.
    pub const FAILED_PRECONDITION: i64 = -109;
    /// The component is temporarily unavailable.
    pub const UNAVAILABLE: i64 = -114;
    /// No handler is registered for the method.
    pub const METHOD_NOT_FOUND: i64 = 404;

    /// Creates a device error for the given method.
    #[must_use]
    pub fn new(method: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            code,
            message: message.into(),
        }
    }
}

/// A payload that could not be decoded into the requested type.
#[derive(Debug, Error)]
#[error("cannot decode {target}: {source}")]
pub struct DecodeError {
    target: &'static str,
    #[source]
    source: serde_json::Error,
}

impl DecodeError {
    /// Creates a decode error for target type `T`.
    #[must_use]
    pub fn new<T: ?Sized>(source: serde_json::Error) -> Self {
        Self {
            target: std::any::type_name::<T>(),
            source,
        }
    }

    /// Returns the name of the type that could not be decoded.
    #[must_use]
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Returns the underlying JSON error.
    #[must_use]
    pub fn json_error(&self) -> &serde_json::Error {
        &self.source
    }
}

/// Errors related to value validation and constraints.
///
/// These errors occur when attempting to create constrained types
/// with invalid values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },
}

/// Errors from parsing a component key such as `cover:0`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The type part does not name a known component.
    #[error("unknown component type: {0}")]
    UnknownType(String),

    /// The id part is not a non-negative integer.
    #[error("invalid component id: {0}")]
    InvalidId(String),

    /// An instance-addressed component was given without an id.
    #[error("component {0} requires an instance id")]
    MissingId(ComponentType),

    /// A singleton component was given an id.
    #[error("component {0} is a singleton and takes no id")]
    UnexpectedId(ComponentType),
}

/// Errors raised while configuring a transport.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A required setting was not provided.
    #[error("missing setting: {0}")]
    Missing(&'static str),

    /// The HTTP client could not be created.
    #[cfg(feature = "http")]
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The MQTT client rejected a request during setup.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The broker connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn lost() -> TransportError {
        TransportError::new(
            "Cover.Open",
            TransportErrorKind::ConnectionLost,
            Delivery::Unknown,
            "socket closed",
        )
    }

    #[test]
    fn transport_error_display() {
        assert_eq!(
            lost().to_string(),
            "Cover.Open: connection lost (delivery unknown): socket closed"
        );
    }

    #[test]
    fn application_error_display() {
        let err = ApplicationError::new("Cover.GoToPosition", -103, "Invalid argument 'pos'!");
        assert_eq!(
            err.to_string(),
            "Cover.GoToPosition: device error -103: Invalid argument 'pos'!"
        );
    }

    #[test]
    fn annotation_preserves_kind() {
        let cover = ComponentRef::instance(ComponentType::Cover, 2);
        let err = Error::from(lost()).annotate(cover, "Open");

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.component(), Some(&cover));
        assert!(!err.is_retry_safe());
        assert!(err.as_transport().is_some());
        assert!(err.to_string().starts_with("cover:2 Open: "));
    }

    #[test]
    fn nested_annotation_reaches_root() {
        let sys = ComponentRef::singleton(ComponentType::Sys);
        let err = Error::from(ApplicationError::new("Sys.GetStatus", -114, "busy"))
            .annotate(sys, "GetStatus")
            .annotate(sys, "GetStatus");

        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(
            err.as_application().map(|e| e.code),
            Some(ApplicationError::UNAVAILABLE)
        );
    }

    #[test]
    fn not_sent_is_retry_safe() {
        let err = TransportError::new(
            "Switch.Toggle",
            TransportErrorKind::Unreachable,
            Delivery::NotSent,
            "connection refused",
        );
        assert!(err.is_retry_safe());
        assert!(Error::from(err).is_retry_safe());
    }

    #[test]
    fn decode_error_names_target() {
        let json_err = serde_json::from_str::<u8>("\"x\"").unwrap_err();
        let err = DecodeError::new::<u8>(json_err);
        assert_eq!(err.target(), "u8");
        assert!(err.to_string().starts_with("cannot decode u8: "));
    }

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: 150,
        };
        assert_eq!(err.to_string(), "value 150 is out of range [0, 100]");
    }
}
