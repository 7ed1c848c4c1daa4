// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `shelly_rpc` - An async JSON-RPC client for Shelly Gen2+ devices.
//!
//! Devices expose methods named `Component.Action` (`Cover.Open`,
//! `Switch.Set`, `Sys.GetStatus`) that take a JSON parameter object and
//! return a JSON result. This library provides:
//!
//! - **Transports**: HTTP ([`protocol::HttpTransport`]), MQTT
//!   ([`protocol::MqttTransport`]) and an in-process test double
//!   ([`protocol::MockTransport`]) behind one [`protocol::Transport`] trait
//! - **Client**: one dispatch point with cancellation, deadlines and uniform
//!   error classification ([`Client`])
//! - **Component addressing**: id injection, typed decoding, error annotation
//!   and unknown-field capture ([`component`])
//! - **Accessors**: typed operations for covers, switches, system and Wi-Fi
//!   ([`Device`])
//!
//! # Errors
//!
//! Every failure is exactly one of three kinds, see [`ErrorKind`]:
//!
//! - **Transport**: the exchange did not complete. The error says whether
//!   the request was known not to be sent ([`error::Delivery::NotSent`],
//!   safe to retry) or may have reached the device.
//! - **Application**: the device answered with an error code.
//! - **Decode**: the device answered, but the result did not fit the
//!   expected type.
//!
//! Nothing is retried automatically.
//!
//! # Quick Start
//!
//! ## HTTP
//!
//! ```no_run
//! use shelly_rpc::{Context, Device};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let device = Device::http("192.168.1.60")?;
//!     let cx = Context::background();
//!
//!     let was = device.switch(0).toggle(&cx).await?;
//!     println!("switch:0 was on: {}", was.was_on);
//!     Ok(())
//! }
//! ```
//!
//! ## MQTT
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use shelly_rpc::protocol::MqttTransport;
//! use shelly_rpc::{Context, Device};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = MqttTransport::builder()
//!         .broker("mqtt://192.168.1.50:1883")
//!         .device_prefix("shellyplus2pm-a8032abe54dc")
//!         .build()
//!         .await?;
//!     let device = Device::new(transport);
//!
//!     // Cancel everything still running after five seconds.
//!     let cx = Context::background().with_timeout(Duration::from_secs(5));
//!     let status = device.get_status(&cx).await?;
//!     for component in status.components() {
//!         println!("{component}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Raw calls
//!
//! ```no_run
//! use serde_json::json;
//! use shelly_rpc::protocol::HttpConfig;
//! use shelly_rpc::{Client, Context};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(HttpConfig::new("192.168.1.60").into_transport()?);
//! let result = client
//!     .call(&Context::background(), "Cover.GoToPosition", Some(json!({"id": 0, "pos": 50})))
//!     .await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod component;
pub mod context;
pub mod device;
pub mod error;
pub mod protocol;
pub mod response;
pub mod types;

pub use client::{Client, ClientBuilder};
pub use component::{ComponentRef, ComponentType, Extensible};
pub use context::Context;
pub use device::Device;
pub use error::{
    ApplicationError, DecodeError, Delivery, Error, ErrorKind, Result, TransportError,
    TransportErrorKind,
};
pub use protocol::Transport;
pub use types::Position;
