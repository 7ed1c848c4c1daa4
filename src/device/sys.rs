// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! System component accessor.

use crate::component::{ComponentHandle, ComponentRef, Extensible, SetConfigResult};
use crate::context::Context;
use crate::error::Error;
use crate::protocol::Transport;
use crate::response::{SysConfig, SysStatus};

/// The device's system component. A singleton: calls carry no id.
#[derive(Debug)]
pub struct Sys<T> {
    handle: ComponentHandle<T>,
}

impl<T> Clone for Sys<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<T: Transport> Sys<T> {
    pub(crate) fn new(handle: ComponentHandle<T>) -> Self {
        Self { handle }
    }

    #[must_use]
    pub fn component(&self) -> ComponentRef {
        self.handle.component()
    }

    /// Calls `Sys.GetStatus`.
    ///
    /// # Errors
    ///
    /// Returns any transport, device or decode error, annotated with `sys`.
    pub async fn get_status(&self, cx: &Context) -> Result<Extensible<SysStatus>, Error> {
        self.handle.get_status(cx).await
    }

    /// Calls `Sys.GetConfig`.
    ///
    /// # Errors
    ///
    /// Returns any transport, device or decode error, annotated with `sys`.
    pub async fn get_config(&self, cx: &Context) -> Result<Extensible<SysConfig>, Error> {
        self.handle.get_config(cx).await
    }

    /// Calls `Sys.SetConfig`.
    ///
    /// # Errors
    ///
    /// Returns any transport, device or decode error, annotated with `sys`.
    pub async fn set_config(
        &self,
        cx: &Context,
        config: &SysConfig,
    ) -> Result<SetConfigResult, Error> {
        self.handle.set_config(cx, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::protocol::{MockTransport, Reply};
    use crate::response::SysDeviceConfig;
    use serde_json::json;

    #[tokio::test]
    async fn status_exposes_clock() {
        let mock = MockTransport::new().with(
            "Sys.GetStatus",
            Reply::result(json!({"unixtime": 1_700_000_000, "uptime": 5, "kvs_rev": 3})),
        );
        let sys = Device::new(mock.clone()).sys();

        let status = sys.get_status(&Context::background()).await.unwrap();
        assert_eq!(status.unix_time().map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(status.get_unknown("kvs_rev"), Some(&json!(3)));
        assert_eq!(mock.calls()[0].params, None);
    }

    #[tokio::test]
    async fn set_config_has_no_id() {
        let mock = MockTransport::new().with(
            "Sys.SetConfig",
            Reply::result(json!({"restart_required": true})),
        );
        let sys = Device::new(mock.clone()).sys();

        let config = SysConfig {
            device: Some(SysDeviceConfig {
                name: Some("porch".to_string()),
                ..SysDeviceConfig::default()
            }),
            ..SysConfig::default()
        };
        let result = sys.set_config(&Context::background(), &config).await.unwrap();
        assert!(result.restart_required);
        assert_eq!(
            mock.calls()[0].params,
            Some(json!({"config": {"device": {"name": "porch"}}}))
        );
    }
}
