// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room controller replies.
//!
//! The transport is strictly half-duplex, so a [`Response`] always answers
//! the command sent immediately before it.

use crate::error::DeviceError;
use crate::state::DeviceState;
use crate::types::ControllerInfo;

/// A reply received from the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Reply to `GetInfo`.
    Info(ControllerInfo),
    /// Reply to `GetState`.
    State(DeviceState),
    /// Reply to `SetState`.
    Status(Status),
}

impl Response {
    /// Returns the protocol tag of the reply.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Info(_) => "Info",
            Self::State(_) => "State",
            Self::Status(_) => "Status",
        }
    }

    /// Extracts the `Info` payload.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnexpectedReply` for any other tag.
    pub fn into_info(self) -> Result<ControllerInfo, DeviceError> {
        match self {
            Self::Info(info) => Ok(info),
            other => Err(other.unexpected("Info")),
        }
    }

    /// Extracts the `State` payload.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnexpectedReply` for any other tag.
    pub fn into_state(self) -> Result<DeviceState, DeviceError> {
        match self {
            Self::State(state) => Ok(state),
            other => Err(other.unexpected("State")),
        }
    }

    /// Extracts the `Status` payload.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnexpectedReply` for any other tag.
    pub fn into_status(self) -> Result<Status, DeviceError> {
        match self {
            Self::Status(status) => Ok(status),
            other => Err(other.unexpected("Status")),
        }
    }

    fn unexpected(&self, expected: &'static str) -> DeviceError {
        DeviceError::UnexpectedReply {
            expected,
            actual: self.tag(),
        }
    }
}

/// Outcome of a `SetState` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The change was applied.
    Ok,
    /// The controller refused the change.
    Error,
}

impl Status {
    /// Returns `true` for [`Status::Ok`].
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}
