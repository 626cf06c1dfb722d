// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room controller command definitions.
//!
//! Each round trip carries exactly one [`Command`]; commands are never
//! batched.
//!
//! | Command | Payload | Expected reply |
//! |---------|---------|----------------|
//! | [`Command::GetInfo`] | none | `Info` |
//! | [`Command::GetState`] | none | `State` |
//! | [`Command::SetState`] | one [`SetTarget`] | `Status` |
//!
//! # Examples
//!
//! ```
//! use roomctl_lib::command::{Command, SetTarget};
//! use roomctl_lib::state::StateField;
//!
//! let cmd = Command::SetState(SetTarget::DoorLockOpen);
//! assert_eq!(cmd.name(), "SetState");
//! assert_eq!(SetTarget::DoorLockOpen.field_change(), (StateField::DoorLocked, false));
//! ```

use std::fmt;

use crate::state::StateField;

/// A request sent to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Query controller identity.
    GetInfo,
    /// Query the full device state.
    GetState,
    /// Drive a single actuator to a target value.
    SetState(SetTarget),
}

impl Command {
    /// Returns the protocol name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetInfo => "GetInfo",
            Self::GetState => "GetState",
            Self::SetState(_) => "SetState",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetState(target) => write!(f, "SetState({target})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Target value carried by a `SetState` command.
///
/// The hardware accepts one target per call, so a change to several fields
/// is a sequence of `SetState` round trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetTarget {
    /// Turn the lights on.
    LightOn,
    /// Turn the lights off.
    LightOff,
    /// Release the door lock.
    DoorLockOpen,
    /// Engage the door lock.
    DoorLockClose,
    /// Switch channel 1 on.
    Channel1On,
    /// Switch channel 1 off.
    Channel1Off,
    /// Switch channel 2 on.
    Channel2On,
    /// Switch channel 2 off.
    Channel2Off,
}

impl SetTarget {
    /// All targets.
    pub const ALL: [Self; 8] = [
        Self::LightOn,
        Self::LightOff,
        Self::DoorLockOpen,
        Self::DoorLockClose,
        Self::Channel1On,
        Self::Channel1Off,
        Self::Channel2On,
        Self::Channel2Off,
    ];

    /// Returns the protocol name of the target.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LightOn => "LightOn",
            Self::LightOff => "LightOff",
            Self::DoorLockOpen => "DoorLockOpen",
            Self::DoorLockClose => "DoorLockClose",
            Self::Channel1On => "Channel1On",
            Self::Channel1Off => "Channel1Off",
            Self::Channel2On => "Channel2On",
            Self::Channel2Off => "Channel2Off",
        }
    }

    /// Returns the field this target changes and the value it sets.
    #[must_use]
    pub const fn field_change(&self) -> (StateField, bool) {
        match self {
            Self::LightOn => (StateField::LightsOn, true),
            Self::LightOff => (StateField::LightsOn, false),
            Self::DoorLockOpen => (StateField::DoorLocked, false),
            Self::DoorLockClose => (StateField::DoorLocked, true),
            Self::Channel1On => (StateField::Channel1, true),
            Self::Channel1Off => (StateField::Channel1, false),
            Self::Channel2On => (StateField::Channel2, true),
            Self::Channel2Off => (StateField::Channel2, false),
        }
    }
}

impl fmt::Display for SetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
