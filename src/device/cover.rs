// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cover (roller shutter) accessor.

use std::time::Duration;

use serde::de::IgnoredAny;
use serde_json::{Value, json};

use crate::component::{ComponentHandle, ComponentRef, Extensible, SetConfigResult};
use crate::context::Context;
use crate::error::Error;
use crate::protocol::Transport;
use crate::response::{CoverConfig, CoverStatus};
use crate::types::Position;

/// One cover output.
///
/// Movement commands return as soon as the device accepted them; poll
/// [`Cover::get_status`] to follow the move.
#[derive(Debug)]
pub struct Cover<T> {
    handle: ComponentHandle<T>,
}

impl<T> Clone for Cover<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<T: Transport> Cover<T> {
    pub(crate) fn new(handle: ComponentHandle<T>) -> Self {
        Self { handle }
    }

    /// Returns the component reference, `cover:<id>`.
    #[must_use]
    pub fn component(&self) -> ComponentRef {
        self.handle.component()
    }

    /// Returns the instance id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.handle.component().id().unwrap_or_default()
    }

    async fn act(&self, cx: &Context, action: &str, params: Option<Value>) -> Result<(), Error> {
        let _: IgnoredAny = self.handle.call(cx, action, params).await?;
        Ok(())
    }

    /// Starts opening.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails; a missed response leaves it
    /// unknown whether the cover moved.
    pub async fn open(&self, cx: &Context) -> Result<(), Error> {
        self.act(cx, "Open", None).await
    }

    /// Opens for `duration`, then stops.
    ///
    /// # Errors
    ///
    /// See [`Cover::open`].
    pub async fn open_for(&self, cx: &Context, duration: Duration) -> Result<(), Error> {
        self.act(cx, "Open", Some(json!({"duration": duration.as_secs_f64()})))
            .await
    }

    /// Starts closing.
    ///
    /// # Errors
    ///
    /// See [`Cover::open`].
    pub async fn close(&self, cx: &Context) -> Result<(), Error> {
        self.act(cx, "Close", None).await
    }

    /// Closes for `duration`, then stops.
    ///
    /// # Errors
    ///
    /// See [`Cover::open`].
    pub async fn close_for(&self, cx: &Context, duration: Duration) -> Result<(), Error> {
        self.act(cx, "Close", Some(json!({"duration": duration.as_secs_f64()})))
            .await
    }

    /// Stops any movement.
    ///
    /// # Errors
    ///
    /// See [`Cover::open`].
    pub async fn stop(&self, cx: &Context) -> Result<(), Error> {
        self.act(cx, "Stop", None).await
    }

    /// Moves to `position`. Requires a calibrated cover.
    ///
    /// # Errors
    ///
    /// See [`Cover::open`]. An uncalibrated cover is reported by the device
    /// as an application error.
    pub async fn go_to_position(&self, cx: &Context, position: Position) -> Result<(), Error> {
        self.act(cx, "GoToPosition", Some(json!({"pos": position.value()})))
            .await
    }

    /// Starts a calibration cycle.
    ///
    /// # Errors
    ///
    /// See [`Cover::open`].
    pub async fn calibrate(&self, cx: &Context) -> Result<(), Error> {
        self.act(cx, "Calibrate", None).await
    }

    /// Calls `Cover.GetStatus`.
    ///
    /// # Errors
    ///
    /// Returns any transport, device or decode error, annotated with the
    /// component key.
    pub async fn get_status(&self, cx: &Context) -> Result<Extensible<CoverStatus>, Error> {
        self.handle.get_status(cx).await
    }

    /// Calls `Cover.GetConfig`.
    ///
    /// # Errors
    ///
    /// See [`Cover::get_status`].
    pub async fn get_config(&self, cx: &Context) -> Result<Extensible<CoverConfig>, Error> {
        self.handle.get_config(cx).await
    }

    /// Calls `Cover.SetConfig`.
    ///
    /// # Errors
    ///
    /// See [`Cover::get_status`].
    pub async fn set_config(
        &self,
        cx: &Context,
        config: &CoverConfig,
    ) -> Result<SetConfigResult, Error> {
        self.handle.set_config(cx, config).await
    }
}
