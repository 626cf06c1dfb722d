// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room-control requests as received from the back-end.
//!
//! [`execute`] runs one [`ControlCommand`] against a [`Controller`] and
//! reconciles the result into the room's [`RoomStateRecord`].
//! [`BulkCommand`] is the admin form that applies one change to many
//! records at once.
//!
//! # Examples
//!
//! ```
//! use roomctl_lib::control::ControlCommand;
//!
//! let command = ControlCommand::from_json(&serde_json::json!({
//!     "command": "set_state",
//!     "state": {"lights_on": true}
//! })).unwrap();
//! assert_eq!(command.name(), "set_state");
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::controller::Controller;
use crate::error::{Error, Result, ValueError};
use crate::reconcile::{RoomStateRecord, apply_full_state, apply_partial};
use crate::state::{DeviceState, PartialStateUpdate, StateField};
use crate::types::ControllerInfo;

/// A single room-control request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Report controller identity.
    GetInfo,
    /// Read and reconcile the device state.
    GetState,
    /// Change device state, then reconcile the result.
    SetState {
        /// Requested changes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<PartialStateUpdate>,
    },
}

impl ControlCommand {
    /// Parses a request body.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCommand` if the body does not name a known
    /// command.
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| Error::InvalidCommand(e.to_string()))
    }

    /// Returns the command name as used in request bodies.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetInfo => "get_info",
            Self::GetState => "get_state",
            Self::SetState { .. } => "set_state",
        }
    }
}

/// Successful result of [`execute`].
///
/// Serializes as `{"status": "success", "result": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlOutcome {
    /// Controller identity.
    Info(ControllerInfo),
    /// Reconciled device state.
    State(DeviceState),
}

impl Serialize for ControlOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("status", "success")?;
        match self {
            Self::Info(info) => map.serialize_entry("result", info)?,
            Self::State(state) => map.serialize_entry("result", state)?,
        }
        map.end()
    }
}

/// Runs `command` against `controller` and reconciles `record`.
///
/// `get_info` leaves the record untouched. `get_state` and `set_state`
/// replace the record's device state with the snapshot the controller
/// returns. If `set_state` fails after the device accepted some fields,
/// those fields are merged into the record before the error is returned.
///
/// # Errors
///
/// - `Error::InvalidCommand` if `set_state` carries no state
/// - any error reported by the controller
pub async fn execute<C: Controller>(
    controller: &C,
    record: &mut RoomStateRecord,
    command: &ControlCommand,
    now: DateTime<Utc>,
) -> Result<ControlOutcome> {
    tracing::debug!(room_id = %record.room_id, command = command.name(), "Executing control command");

    match command {
        ControlCommand::GetInfo => Ok(ControlOutcome::Info(controller.get_info().await?)),
        ControlCommand::GetState => {
            let state = controller.get_state().await?;
            apply_full_state(record, &state, now);
            Ok(ControlOutcome::State(state))
        }
        ControlCommand::SetState { state: None } => Err(Error::InvalidCommand(
            "set_state requires a state object".to_string(),
        )),
        ControlCommand::SetState {
            state: Some(update),
        } => match controller.set_state(update).await {
            Ok(state) => {
                apply_full_state(record, &state, now);
                Ok(ControlOutcome::State(state))
            }
            Err(err) => {
                let applied = err.applied_fields();
                if !applied.is_empty() {
                    apply_partial(record, &accepted_changes(update, applied), now);
                }
                Err(err)
            }
        },
    }
}

fn accepted_changes(update: &PartialStateUpdate, applied: &[StateField]) -> PartialStateUpdate {
    applied
        .iter()
        .filter_map(|&field| update.get(field).map(|value| (field, value)))
        .collect()
}

/// Admin command applied to every room at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkCommand {
    /// Turn every room's lights on.
    LightsOn,
    /// Turn every room's lights off.
    LightsOff,
}

impl BulkCommand {
    /// Returns the command name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LightsOn => "lights_on",
            Self::LightsOff => "lights_off",
        }
    }

    /// Returns the partial update this command stands for.
    #[must_use]
    pub fn update(&self) -> PartialStateUpdate {
        PartialStateUpdate::new().with(StateField::LightsOn, matches!(self, Self::LightsOn))
    }

    /// Reconciles the command into every record and returns how many
    /// records changed.
    pub fn apply_all<'a>(
        &self,
        records: impl IntoIterator<Item = &'a mut RoomStateRecord>,
        now: DateTime<Utc>,
    ) -> usize {
        let update = self.update();
        let modified = records
            .into_iter()
            .map(|record| apply_partial(record, &update, now))
            .filter(|&changed| changed)
            .count();
        tracing::debug!(command = self.as_str(), modified, "Applied bulk command");
        modified
    }
}

impl fmt::Display for BulkCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkCommand {
    type Err = ValueError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "lights_on" => Ok(Self::LightsOn),
            "lights_off" => Ok(Self::LightsOff),
            other => Err(ValueError::UnknownBulkCommand(other.to_string())),
        }
    }
}

#[cfg(all(test, feature = "simulator"))]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::simulator::{SimulatedController, SimulatorConfig};
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn simulator() -> SimulatedController {
        SimulatedController::new(SimulatorConfig::default().with_seed(21))
    }

    /// Controller that accepts the first `accept` fields of an update, then
    /// fails. Accepting every field fails the final state read instead.
    struct StopsAfter {
        accept: usize,
    }

    fn closed() -> Box<Error> {
        Box::new(ProtocolError::ConnectionClosed.into())
    }

    impl Controller for StopsAfter {
        async fn get_info(&self) -> Result<ControllerInfo> {
            Err(ProtocolError::ConnectionClosed.into())
        }

        async fn get_state(&self) -> Result<DeviceState> {
            Err(ProtocolError::ConnectionClosed.into())
        }

        async fn set_state(&self, update: &PartialStateUpdate) -> Result<DeviceState> {
            let fields: Vec<StateField> = update.iter().map(|(field, _)| field).collect();
            if self.accept >= fields.len() {
                return Err(Error::FinalReadFailed {
                    applied: fields,
                    source: closed(),
                });
            }
            Err(Error::PartialUpdate {
                field: fields[self.accept],
                applied: fields[..self.accept].to_vec(),
                source: closed(),
            })
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            ControlCommand::from_json(&json!({"command": "get_info"})).unwrap(),
            ControlCommand::GetInfo
        );
        let command =
            ControlCommand::from_json(&json!({"command": "set_state", "state": {"channel1": 1}}))
                .unwrap();
        assert_eq!(
            command,
            ControlCommand::SetState {
                state: Some(PartialStateUpdate::new().with(StateField::Channel1, true))
            }
        );
    }

    #[test]
    fn unknown_command_is_invalid() {
        let err = ControlCommand::from_json(&json!({"command": "reboot"})).unwrap_err();
        assert!(matches!(err, Error::InvalidCommand(_)));
    }

    #[tokio::test]
    async fn get_info_leaves_record_untouched() {
        let mut record = RoomStateRecord::new("r1", "101", now());
        let before = record.clone();
        let outcome = execute(&simulator(), &mut record, &ControlCommand::GetInfo, now())
            .await
            .unwrap();
        assert!(matches!(outcome, ControlOutcome::Info(_)));
        assert_eq!(record, before);
    }

    #[tokio::test]
    async fn get_state_reconciles_snapshot() {
        let sim = simulator();
        let mut record = RoomStateRecord::new("r1", "101", now());
        let outcome = execute(&sim, &mut record, &ControlCommand::GetState, now())
            .await
            .unwrap();

        let ControlOutcome::State(state) = outcome else {
            panic!("expected state outcome");
        };
        assert_eq!(record.state, state);
        assert_eq!(state, sim.snapshot());
    }

    #[tokio::test]
    async fn set_state_reconciles_result() {
        let sim = simulator();
        let mut record = RoomStateRecord::new("r1", "101", now());
        let command = ControlCommand::SetState {
            state: Some(
                PartialStateUpdate::new()
                    .with(StateField::LightsOn, true)
                    .with(StateField::DoorLocked, false),
            ),
        };

        execute(&sim, &mut record, &command, now()).await.unwrap();
        assert!(record.state.lights_on);
        assert!(!record.state.door_locked);
        assert_eq!(record.state, sim.snapshot());
    }

    #[tokio::test]
    async fn set_state_without_state_is_invalid() {
        let mut record = RoomStateRecord::new("r1", "101", now());
        let err = execute(
            &simulator(),
            &mut record,
            &ControlCommand::SetState { state: None },
            now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidCommand(_)));
    }

    #[tokio::test]
    async fn partial_failure_keeps_accepted_fields() {
        let mut record = RoomStateRecord::new("r1", "101", now());
        let command = ControlCommand::SetState {
            state: Some(
                PartialStateUpdate::new()
                    .with(StateField::LightsOn, true)
                    .with(StateField::DoorLocked, false)
                    .with(StateField::Channel1, true),
            ),
        };

        let err = execute(&StopsAfter { accept: 1 }, &mut record, &command, now())
            .await
            .unwrap_err();
        assert_eq!(err.failed_field(), Some(StateField::DoorLocked));
        assert!(record.state.lights_on);
        assert!(record.state.door_locked);
        assert!(!record.state.channel1);
    }

    #[tokio::test]
    async fn failed_final_read_keeps_every_accepted_field() {
        let mut record = RoomStateRecord::new("r1", "101", now());
        let command = ControlCommand::SetState {
            state: Some(
                PartialStateUpdate::new()
                    .with(StateField::LightsOn, true)
                    .with(StateField::DoorLocked, false),
            ),
        };

        let err = execute(&StopsAfter { accept: 2 }, &mut record, &command, now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FinalReadFailed { .. }));
        assert!(record.state.lights_on);
        assert!(!record.state.door_locked);
    }

    #[tokio::test]
    async fn failure_before_any_change_leaves_record() {
        let mut record = RoomStateRecord::new("r1", "101", now());
        let before = record.clone();
        let command = ControlCommand::SetState {
            state: Some(PartialStateUpdate::new().with(StateField::Channel2, true)),
        };

        execute(&StopsAfter { accept: 0 }, &mut record, &command, now())
            .await
            .unwrap_err();
        assert_eq!(record, before);
    }

    #[test]
    fn outcome_body_shape() {
        let body = serde_json::to_value(ControlOutcome::State(DeviceState::default())).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["result"]["door_locked"], true);
    }

    #[test]
    fn bulk_command_names() {
        assert_eq!("lights_off".parse::<BulkCommand>().unwrap(), BulkCommand::LightsOff);
        assert_eq!(
            "dim".parse::<BulkCommand>(),
            Err(ValueError::UnknownBulkCommand("dim".to_string()))
        );
        assert_eq!(
            BulkCommand::LightsOn.update().get(StateField::LightsOn),
            Some(true)
        );
    }

    #[test]
    fn bulk_counts_modified_records() {
        let mut records = vec![
            RoomStateRecord::new("r1", "101", now()),
            RoomStateRecord::new("r2", "102", now()),
        ];
        records[1].state.lights_on = true;

        assert_eq!(BulkCommand::LightsOff.apply_all(&mut records, now()), 1);
        assert!(records.iter().all(|r| !r.state.lights_on));
    }
}
