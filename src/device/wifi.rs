// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wi-Fi component accessor.

use crate::component::{ComponentHandle, ComponentRef, Extensible};
use crate::context::Context;
use crate::error::Error;
use crate::protocol::Transport;
use crate::response::{WifiConfig, WifiStatus};

/// The device's Wi-Fi interface. A singleton: calls carry no id.
#[derive(Debug)]
pub struct Wifi<T> {
    handle: ComponentHandle<T>,
}

impl<T> Clone for Wifi<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<T: Transport> Wifi<T> {
    pub(crate) fn new(handle: ComponentHandle<T>) -> Self {
        Self { handle }
    }

    #[must_use]
    pub fn component(&self) -> ComponentRef {
        self.handle.component()
    }

    /// Calls `WiFi.GetStatus`.
    ///
    /// # Errors
    ///
    /// Returns any transport, device or decode error, annotated with `wifi`.
    pub async fn get_status(&self, cx: &Context) -> Result<Extensible<WifiStatus>, Error> {
        self.handle.get_status(cx).await
    }

    /// Calls `WiFi.GetConfig`.
    ///
    /// # Errors
    ///
    /// Returns any transport, device or decode error, annotated with `wifi`.
    pub async fn get_config(&self, cx: &Context) -> Result<Extensible<WifiConfig>, Error> {
        self.handle.get_config(cx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::protocol::{MockTransport, Reply};
    use serde_json::json;

    #[tokio::test]
    async fn uses_wifi_namespace() {
        let mock = MockTransport::new().with(
            "WiFi.GetStatus",
            Reply::result(json!({"status": "got ip", "sta_ip": "10.0.0.7"})),
        );
        let wifi = Device::new(mock.clone()).wifi();

        let status = wifi.get_status(&Context::background()).await.unwrap();
        assert!(status.is_connected());
        assert_eq!(mock.calls()[0].method, "WiFi.GetStatus");
        assert_eq!(mock.calls()[0].params, None);
    }
}
