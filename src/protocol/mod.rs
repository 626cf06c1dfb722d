// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary protocol spoken with room controllers.
//!
//! # Layers
//!
//! - [`wire`]: protobuf message schema
//! - [`codec`]: mapping between [`Command`](crate::command::Command) /
//!   [`Response`](crate::response::Response) and self-delimiting frames
//! - [`TransportSession`]: one TCP connection, one round trip at a time
//! - [`ControllerConfig`]: endpoint address and timeouts

pub mod codec;
mod config;
pub(crate) mod transport;
pub mod wire;

pub use config::ControllerConfig;
pub use transport::{RoundTripError, TransportSession};
