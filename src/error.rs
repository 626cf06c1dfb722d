// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `roomctl` library.
//!
//! Failures are grouped by the layer that produces them: the transport
//! ([`ProtocolError`]), the wire codec ([`ParseError`]), and the controller
//! itself ([`DeviceError`]). The top-level [`Error`] wraps all of them.
//!
//! Nothing in this crate retries. Transport failures
//! ([`Error::is_transport`]) are recoverable by reconnecting and retrying at
//! the call site; codec and reply mismatches indicate a protocol mismatch
//! and are reproduced by a blind retry.

use std::io;

use thiserror::Error;

use crate::state::StateField;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred on the transport session.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while encoding or decoding a message.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The controller answered, but not with what was asked for.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// A multi-field state change stopped part way through.
    ///
    /// Changes already applied on the device are not rolled back; `applied`
    /// lists them in the order they were issued.
    #[error("state update failed at {field} after applying {applied:?}: {source}")]
    PartialUpdate {
        /// The field whose change failed.
        field: StateField,
        /// Fields that were successfully changed before the failure.
        applied: Vec<StateField>,
        /// The failure reported for `field`.
        #[source]
        source: Box<Error>,
    },

    /// Every field change was accepted, but reading the resulting state
    /// failed.
    #[error("state read after applying {applied:?} failed: {source}")]
    FinalReadFailed {
        /// Fields that were successfully changed, in the order issued.
        applied: Vec<StateField>,
        /// The failure of the final read.
        #[source]
        source: Box<Error>,
    },

    /// A control command could not be interpreted.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

impl Error {
    /// Returns `true` for failures that a reconnect-and-retry can recover.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Protocol(err) => !matches!(err, ProtocolError::ConcurrentUseViolation),
            Self::PartialUpdate { source, .. } | Self::FinalReadFailed { source, .. } => {
                source.is_transport()
            }
            _ => false,
        }
    }

    /// Returns the field a partial update failed at, if this is one.
    #[must_use]
    pub fn failed_field(&self) -> Option<StateField> {
        match self {
            Self::PartialUpdate { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Returns the fields a failed state change had already applied on the
    /// device.
    #[must_use]
    pub fn applied_fields(&self) -> &[StateField] {
        match self {
            Self::PartialUpdate { applied, .. } | Self::FinalReadFailed { applied, .. } => applied,
            _ => &[],
        }
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A state field name is not one of the settable fields.
    #[error("unknown state field: {0}")]
    UnknownField(String),

    /// A bulk command name is not recognized.
    #[error("unknown bulk command: {0}")]
    UnknownBulkCommand(String),
}

/// Errors related to the transport session.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Connection to the controller failed or timed out.
    #[error("connection to {address} failed: {message}")]
    ConnectionFailed {
        /// The endpoint that was dialed.
        address: String,
        /// Description of the failure.
        message: String,
    },

    /// The peer closed the connection before a complete reply arrived.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// No complete reply arrived in time.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// A round trip was started while another one was still outstanding.
    #[error("concurrent use of a transport session")]
    ConcurrentUseViolation,

    /// The peer announced a frame larger than the protocol allows.
    #[error("frame of {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Announced frame size.
        size: usize,
        /// Maximum accepted frame size.
        max: usize,
    },

    /// Socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors related to decoding controller messages.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Bytes did not form exactly one well-formed protocol message.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Unexpected payload format.
    #[error("unexpected format: {0}")]
    UnexpectedFormat(String),
}

impl From<prost::DecodeError> for ParseError {
    fn from(err: prost::DecodeError) -> Self {
        Self::MalformedMessage(err.to_string())
    }
}

/// Errors reported by, or about, the controller.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The reply tag does not match the command that was sent.
    #[error("expected {expected} reply, got {actual}")]
    UnexpectedReply {
        /// The reply tag the command implies.
        expected: &'static str,
        /// The reply tag that arrived.
        actual: &'static str,
    },

    /// The controller answered `Status(error)`.
    #[error("command rejected: {0}")]
    CommandRejected(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display() {
        let err = ProtocolError::Timeout(5000);
        assert_eq!(err.to_string(), "request timed out after 5000 ms");
    }

    #[test]
    fn unexpected_reply_display() {
        let err = DeviceError::UnexpectedReply {
            expected: "State",
            actual: "Info",
        };
        assert_eq!(err.to_string(), "expected State reply, got Info");
    }

    #[test]
    fn transport_errors_are_recoverable() {
        assert!(Error::from(ProtocolError::ConnectionClosed).is_transport());
        assert!(Error::from(ProtocolError::Timeout(0)).is_transport());
    }

    #[test]
    fn protocol_mismatch_is_not_transport() {
        let err = Error::from(ParseError::MalformedMessage("bad tag".to_string()));
        assert!(!err.is_transport());
        assert!(!Error::from(ProtocolError::ConcurrentUseViolation).is_transport());
    }

    #[test]
    fn partial_update_reports_field() {
        let err = Error::PartialUpdate {
            field: StateField::DoorLocked,
            applied: vec![StateField::LightsOn],
            source: Box::new(DeviceError::CommandRejected("DoorLockOpen".to_string()).into()),
        };
        assert_eq!(err.failed_field(), Some(StateField::DoorLocked));
        assert!(!err.is_transport());
        assert!(err.to_string().contains("door_locked"));
        assert_eq!(err.applied_fields(), &[StateField::LightsOn]);
    }

    #[test]
    fn final_read_failure_keeps_applied_fields() {
        let err = Error::FinalReadFailed {
            applied: vec![StateField::LightsOn, StateField::Channel1],
            source: Box::new(ProtocolError::ConnectionClosed.into()),
        };
        assert_eq!(err.failed_field(), None);
        assert_eq!(
            err.applied_fields(),
            &[StateField::LightsOn, StateField::Channel1]
        );
        assert!(err.is_transport());
    }
}
