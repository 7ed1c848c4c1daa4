// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed accessors for a device's components.
//!
//! [`Device`] owns a [`Client`] and hands out one accessor per component.
//! Accessors are thin: each operation is a method name, a parameter object
//! and a result type. The shared work (id injection, decoding, error
//! annotation) lives in [`ComponentHandle`].
//!
//! The same accessors work over every transport:
//!
//! ```no_run
//! use shelly_rpc::{Context, Device};
//! use shelly_rpc::types::Position;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let device = Device::http("192.168.1.60")?;
//! let cx = Context::background();
//!
//! let cover = device.cover(0);
//! cover.go_to_position(&cx, Position::new(40)?).await?;
//!
//! let status = cover.get_status(&cx).await?;
//! println!("cover:0 is {:?} at {:?}", status.state, status.current_pos);
//! # Ok(())
//! # }
//! ```

mod cover;
mod switch;
mod sys;
mod wifi;

pub use cover::Cover;
pub use switch::Switch;
pub use sys::Sys;
pub use wifi::Wifi;

use std::fmt;

use crate::client::Client;
use crate::component::{ComponentHandle, ComponentRef, ComponentType};
use crate::context::Context;
use crate::error::Error;
use crate::protocol::Transport;
use crate::response::{DeviceInfo, DeviceStatus, MethodList};

/// A device reachable through one transport.
pub struct Device<T> {
    client: Client<T>,
}

impl<T> Clone for Device<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Device<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device").field("client", &self.client).finish()
    }
}

#[cfg(feature = "http")]
impl Device<crate::protocol::HttpTransport> {
    /// Creates a device reached over HTTP at `host` with default settings.
    ///
    /// Use [`HttpConfig`](crate::protocol::HttpConfig) for anything else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the host is invalid or the HTTP client cannot
    /// be created.
    pub fn http(host: impl Into<String>) -> Result<Self, crate::error::ConfigError> {
        Ok(Self::new(crate::protocol::HttpTransport::new(host)?))
    }
}

impl<T: Transport> Device<T> {
    /// Creates a device over `transport` with a default client.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::from_client(Client::new(transport))
    }

    /// Creates a device over an existing client.
    #[must_use]
    pub fn from_client(client: Client<T>) -> Self {
        Self { client }
    }

    /// Returns the client calls go through.
    #[must_use]
    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    /// Returns a handle for any component, including those without an accessor.
    #[must_use]
    pub fn component(&self, component: ComponentRef) -> ComponentHandle<T> {
        ComponentHandle::new(self.client.clone(), component)
    }

    /// Returns the cover with instance id `id`.
    #[must_use]
    pub fn cover(&self, id: u32) -> Cover<T> {
        Cover::new(self.component(ComponentRef::instance(ComponentType::Cover, id)))
    }

    /// Returns the switch with instance id `id`.
    #[must_use]
    pub fn switch(&self, id: u32) -> Switch<T> {
        Switch::new(self.component(ComponentRef::instance(ComponentType::Switch, id)))
    }

    /// Returns the system component.
    #[must_use]
    pub fn sys(&self) -> Sys<T> {
        Sys::new(self.component(ComponentRef::singleton(ComponentType::Sys)))
    }

    /// Returns the Wi-Fi component.
    #[must_use]
    pub fn wifi(&self) -> Wifi<T> {
        Wifi::new(self.component(ComponentRef::singleton(ComponentType::Wifi)))
    }

    fn shelly(&self) -> ComponentHandle<T> {
        self.component(ComponentRef::singleton(ComponentType::Shelly))
    }

    /// Calls `Shelly.GetDeviceInfo`.
    ///
    /// # Errors
    ///
    /// Returns any transport, device or decode error, annotated with `shelly`.
    pub async fn get_device_info(&self, cx: &Context) -> Result<DeviceInfo, Error> {
        self.shelly().call(cx, "GetDeviceInfo", None).await
    }

    /// Calls `Shelly.GetStatus`: the status of every component at once.
    ///
    /// # Errors
    ///
    /// Returns any transport, device or decode error, annotated with `shelly`.
    pub async fn get_status(&self, cx: &Context) -> Result<DeviceStatus, Error> {
        self.shelly().call(cx, "GetStatus", None).await
    }

    /// Calls `Shelly.ListMethods`.
    ///
    /// # Errors
    ///
    /// Returns any transport, device or decode error, annotated with `shelly`.
    pub async fn list_methods(&self, cx: &Context) -> Result<MethodList, Error> {
        self.shelly().call(cx, "ListMethods", None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MockTransport, Reply};
    use serde_json::json;

    #[tokio::test]
    async fn device_wide_calls_are_singletons() {
        let mock = MockTransport::new()
            .with(
                "Shelly.ListMethods",
                Reply::result(json!({"methods": ["Cover.Open", "Shelly.GetStatus"]})),
            )
            .with(
                "Shelly.GetStatus",
                Reply::result(json!({"cover:0": {"id": 0}, "sys": {}})),
            );
        let device = Device::new(mock.clone());
        let cx = Context::background();

        let methods = device.list_methods(&cx).await.unwrap();
        assert!(methods.contains("Cover.Open"));

        let status = device.get_status(&cx).await.unwrap();
        assert_eq!(status.components().count(), 2);

        assert!(mock.calls().iter().all(|call| call.params.is_none()));
    }

    #[tokio::test]
    async fn device_info_errors_name_shelly() {
        let mock = MockTransport::new().with("Shelly.GetDeviceInfo", Reply::result(json!({})));
        let device = Device::new(mock);

        let err = device
            .get_device_info(&Context::background())
            .await
            .unwrap_err();
        assert_eq!(
            err.component(),
            Some(&ComponentRef::singleton(ComponentType::Shelly))
        );
        assert!(err.to_string().starts_with("shelly GetDeviceInfo: decode error"));
    }

    #[test]
    fn accessors_address_their_component() {
        let device = Device::new(MockTransport::new());
        assert_eq!(device.cover(2).id(), 2);
        assert_eq!(device.switch(1).id(), 1);
        assert_eq!(
            device.sys().component(),
            ComponentRef::singleton(ComponentType::Sys)
        );
    }
}
