// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the library.
//!
//! - [`ControllerInfo`] - Per-session identity reported by a controller
//! - [`SensorRange`] - Inclusive range used to seed and clamp sensor readings
//! - [`SensorEnvelope`] - Ranges for all three sensors

mod info;
mod sensor;

pub use info::ControllerInfo;
pub use sensor::{SensorEnvelope, SensorRange};
