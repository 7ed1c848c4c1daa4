// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed result payloads.
//!
//! These structures decode the `result` member of device responses. Optional
//! members are skipped when absent so that, wrapped in
//! [`Extensible`](crate::component::Extensible), a payload re-encodes to what
//! the device sent.

mod common;
mod cover;
mod device;
mod switch;
mod sys;
mod wifi;

pub use common::{EnergyCounter, TemperatureReading};
pub use cover::{CoverConfig, CoverState, CoverStatus};
pub use device::{DeviceInfo, DeviceStatus, MethodList};
pub use switch::{SwitchConfig, SwitchStatus, WasOn};
pub use sys::{SysConfig, SysDeviceConfig, SysLocation, SysStatus};
pub use wifi::{WifiConfig, WifiStationConfig, WifiStatus};
