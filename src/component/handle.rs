// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A component bound to a client.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::client::Client;
use crate::component::{ComponentRef, annotate, decode, inject_id};
use crate::context::Context;
use crate::error::{Delivery, Error, TransportError, TransportErrorKind};
use crate::protocol::Transport;

/// Result of a `<Namespace>.SetConfig` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetConfigResult {
    /// Whether the device must reboot for the change to take effect.
    #[serde(default)]
    pub restart_required: bool,
}

/// Issues calls against one component.
///
/// Every call builds the method name from the component's namespace, merges
/// the instance id into the params, and annotates any failure with the
/// component and action. The error kind is never changed.
///
/// Typed accessors such as [`crate::device::Cover`] wrap a handle; it can
/// also be used directly for components without one.
pub struct ComponentHandle<T> {
    client: Client<T>,
    component: ComponentRef,
}

impl<T> Clone for ComponentHandle<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            component: self.component,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ComponentHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("component", &self.component)
            .field("client", &self.client)
            .finish()
    }
}

impl<T: Transport> ComponentHandle<T> {
    /// Binds `component` to `client`.
    #[must_use]
    pub fn new(client: Client<T>, component: ComponentRef) -> Self {
        Self { client, component }
    }

    /// Returns the component this handle addresses.
    #[must_use]
    pub fn component(&self) -> ComponentRef {
        self.component
    }

    /// Returns the client calls go through.
    #[must_use]
    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    /// Calls `action` and returns the raw result payload.
    ///
    /// # Errors
    ///
    /// Any error from [`Client::call`], wrapped in [`Error::Component`].
    pub async fn call_raw(
        &self,
        cx: &Context,
        action: &str,
        params: Option<Value>,
    ) -> Result<Value, Error> {
        let method = self.component.method(action);
        let params = inject_id(&method, self.component.id(), params)
            .map_err(annotate(self.component, action))?;
        self.client
            .call(cx, &method, params)
            .await
            .map_err(annotate(self.component, action))
    }

    /// Calls `action` and decodes the result into `R`.
    ///
    /// # Errors
    ///
    /// Any error from [`Client::call`], or a decode error if the result does
    /// not fit `R`, wrapped in [`Error::Component`].
    pub async fn call<R: DeserializeOwned>(
        &self,
        cx: &Context,
        action: &str,
        params: Option<Value>,
    ) -> Result<R, Error> {
        let raw = self.call_raw(cx, action, params).await?;
        decode(raw).map_err(annotate(self.component, action))
    }

    /// Calls `<Namespace>.GetStatus`.
    ///
    /// # Errors
    ///
    /// See [`ComponentHandle::call`].
    pub async fn get_status<S: DeserializeOwned>(&self, cx: &Context) -> Result<S, Error> {
        self.call(cx, "GetStatus", None).await
    }

    /// Calls `<Namespace>.GetConfig`.
    ///
    /// # Errors
    ///
    /// See [`ComponentHandle::call`].
    pub async fn get_config<C: DeserializeOwned>(&self, cx: &Context) -> Result<C, Error> {
        self.call(cx, "GetConfig", None).await
    }

    /// Calls `<Namespace>.SetConfig` with `{"config": config}`.
    ///
    /// Only the members present in `config` are changed on the device.
    ///
    /// # Errors
    ///
    /// See [`ComponentHandle::call`]. A `config` that cannot be serialized is
    /// reported as [`TransportErrorKind::InvalidRequest`] and nothing is sent.
    pub async fn set_config<C: Serialize + ?Sized>(
        &self,
        cx: &Context,
        config: &C,
    ) -> Result<SetConfigResult, Error> {
        const ACTION: &str = "SetConfig";

        let config = serde_json::to_value(config).map_err(|e| {
            Error::from(
                TransportError::new(
                    self.component.method(ACTION),
                    TransportErrorKind::InvalidRequest,
                    Delivery::NotSent,
                    "config could not be serialized",
                )
                .with_source(e),
            )
            .annotate(self.component, ACTION)
        })?;
        self.call(cx, ACTION, Some(json!({ "config": config }))).await
    }
}
