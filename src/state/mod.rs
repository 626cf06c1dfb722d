// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room controller state types.
//!
//! This module provides the full snapshot type [`DeviceState`] and the
//! sparse patch type [`PartialStateUpdate`] keyed by [`StateField`].
//!
//! # Examples
//!
//! ```
//! use roomctl_lib::state::{DeviceState, PartialStateUpdate, StateField};
//!
//! let mut state = DeviceState::default();
//!
//! let update = PartialStateUpdate::new()
//!     .with(StateField::LightsOn, true)
//!     .with(StateField::DoorLocked, false);
//! state.apply(&update);
//!
//! assert!(state.lights_on);
//! assert!(!state.door_locked);
//! ```

mod device_state;
mod partial;

pub use device_state::DeviceState;
pub use partial::{PartialStateUpdate, StateField};
