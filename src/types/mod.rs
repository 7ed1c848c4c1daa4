// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for device control.
//!
//! Each type checks its range at construction time, so an out-of-range value
//! is rejected before any request is sent.
//!
//! - [`Position`] - Cover position (0-100%)

mod position;

pub use position::Position;
