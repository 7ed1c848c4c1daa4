// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch (relay) accessor.

use serde_json::json;

use crate::component::{ComponentHandle, ComponentRef, Extensible, SetConfigResult};
use crate::context::Context;
use crate::error::Error;
use crate::protocol::Transport;
use crate::response::{SwitchConfig, SwitchStatus, WasOn};

/// One relay output.
#[derive(Debug)]
pub struct Switch<T> {
    handle: ComponentHandle<T>,
}

impl<T> Clone for Switch<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<T: Transport> Switch<T> {
    pub(crate) fn new(handle: ComponentHandle<T>) -> Self {
        Self { handle }
    }

    /// Returns the component reference, `switch:<id>`.
    #[must_use]
    pub fn component(&self) -> ComponentRef {
        self.handle.component()
    }

    /// Returns the instance id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.handle.component().id().unwrap_or_default()
    }

    /// Turns the output on or off.
    ///
    /// # Errors
    ///
    /// Returns any transport, device or decode error, annotated with the
    /// component key.
    pub async fn set(&self, cx: &Context, on: bool) -> Result<WasOn, Error> {
        self.handle.call(cx, "Set", Some(json!({"on": on}))).await
    }

    /// Inverts the output.
    ///
    /// # Errors
    ///
    /// See [`Switch::set`].
    pub async fn toggle(&self, cx: &Context) -> Result<WasOn, Error> {
        self.handle.call(cx, "Toggle", None).await
    }

    /// Calls `Switch.GetStatus`.
    ///
    /// # Errors
    ///
    /// See [`Switch::set`].
    pub async fn get_status(&self, cx: &Context) -> Result<Extensible<SwitchStatus>, Error> {
        self.handle.get_status(cx).await
    }

    /// Calls `Switch.GetConfig`.
    ///
    /// # Errors
    ///
    /// See [`Switch::set`].
    pub async fn get_config(&self, cx: &Context) -> Result<Extensible<SwitchConfig>, Error> {
        self.handle.get_config(cx).await
    }

    /// Calls `Switch.SetConfig`.
    ///
    /// # Errors
    ///
    /// See [`Switch::set`].
    pub async fn set_config(
        &self,
        cx: &Context,
        config: &SwitchConfig,
    ) -> Result<SetConfigResult, Error> {
        self.handle.set_config(cx, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::error::ErrorKind;
    use crate::protocol::{MockTransport, Reply};

    #[tokio::test]
    async fn set_reports_previous_state() {
        let mock = MockTransport::new().with("Switch.Set", Reply::result(json!({"was_on": true})));
        let switch = Device::new(mock.clone()).switch(0);

        let result = switch.set(&Context::background(), false).await.unwrap();
        assert!(result.was_on);
        assert_eq!(mock.calls()[0].params, Some(json!({"id": 0, "on": false})));
    }

    #[tokio::test]
    async fn toggle_sends_only_id() {
        let mock = MockTransport::new().with("Switch.Toggle", Reply::result(json!({"was_on": false})));
        let switch = Device::new(mock.clone()).switch(2);

        let result = switch.toggle(&Context::background()).await.unwrap();
        assert!(!result.was_on);
        assert_eq!(mock.calls()[0].params, Some(json!({"id": 2})));
    }

    #[tokio::test]
    async fn malformed_result_is_decode_error() {
        let mock = MockTransport::new().with("Switch.Set", Reply::result(json!({"was_on": "yes"})));
        let switch = Device::new(mock).switch(0);

        let err = switch.set(&Context::background(), true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.component(), Some(&switch.component()));
    }
}
