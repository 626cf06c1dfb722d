// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room controller abstraction.
//!
//! [`Controller`] is the whole surface the rest of a back-end needs from a
//! room controller. It is implemented by:
//!
//! - [`ControllerClient`]: talks to hardware over TCP
//! - [`SimulatedController`](crate::simulator::SimulatedController): keeps
//!   state in memory (feature `simulator`)
//! - [`AnyController`]: either of the above, picked at construction from a
//!   [`ControllerBackend`]
//!
//! Callers are written against the trait and never inspect which backend
//! they hold.
//!
//! # Examples
//!
//! ```no_run
//! use roomctl_lib::controller::{Controller, ControllerClient};
//! use roomctl_lib::protocol::ControllerConfig;
//! use roomctl_lib::state::{PartialStateUpdate, StateField};
//!
//! # async fn example() -> roomctl_lib::Result<()> {
//! let client = ControllerClient::new(ControllerConfig::new("192.168.1.100"));
//!
//! let info = client.get_info().await?;
//! println!("connected to {} ({})", info.ble_name, info.mac);
//!
//! let state = client
//!     .set_state(&PartialStateUpdate::new().with(StateField::LightsOn, true))
//!     .await?;
//! assert!(state.lights_on);
//! # Ok(())
//! # }
//! ```

mod any;
mod client;

pub use any::{AnyController, ControllerBackend};
pub use client::ControllerClient;

use crate::error::Result;
use crate::state::{DeviceState, PartialStateUpdate};
use crate::types::ControllerInfo;

/// Capability set of a room controller.
#[allow(async_fn_in_trait)]
pub trait Controller {
    /// Returns the controller identity for the current session.
    ///
    /// # Errors
    ///
    /// Returns error if the controller cannot be reached or answers with
    /// anything other than `Info`.
    async fn get_info(&self) -> Result<ControllerInfo>;

    /// Returns the full current device state.
    ///
    /// # Errors
    ///
    /// Returns error if the controller cannot be reached or answers with
    /// anything other than `State`.
    async fn get_state(&self) -> Result<DeviceState>;

    /// Applies a partial update and returns the resulting full state.
    ///
    /// Fields are changed one at a time in [`StateField::ALL`] order.
    /// On the first failure no further fields are changed, already applied
    /// fields stay applied, and the error is
    /// [`Error::PartialUpdate`](crate::Error::PartialUpdate). If every field
    /// was applied but the final state read fails, the error is
    /// [`Error::FinalReadFailed`](crate::Error::FinalReadFailed).
    ///
    /// [`StateField::ALL`]: crate::state::StateField::ALL
    ///
    /// # Errors
    ///
    /// Returns error if any field change fails or the final state read
    /// fails.
    async fn set_state(&self, update: &PartialStateUpdate) -> Result<DeviceState>;
}
