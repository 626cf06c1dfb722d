// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation of controller results into room-state records.
//!
//! A [`RoomStateRecord`] is the application's authoritative copy of a
//! room's device state. It is persisted elsewhere and changed only through
//! [`apply_full_state`] and [`apply_partial`]. Both build the new value
//! completely before writing it back, so a record never holds a mix of
//! old and new fields outside the scope of the operation.
//!
//! `last_updated` never moves backwards: each operation stamps
//! `max(last_updated, now)`.
//!
//! Callers serialize mutations per room; nothing here locks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{DeviceState, PartialStateUpdate};

/// Persisted device state of one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStateRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Identifier of the room this record belongs to.
    pub room_id: String,
    /// Human-facing room number.
    pub room_number: String,
    /// Last known device state.
    pub state: DeviceState,
    /// When the record was last reconciled.
    pub last_updated: DateTime<Utc>,
}

impl RoomStateRecord {
    /// Creates a record with the default device state.
    #[must_use]
    pub fn new(room_id: impl Into<String>, room_number: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id: room_id.into(),
            room_number: room_number.into(),
            state: DeviceState::default(),
            last_updated: now,
        }
    }
}

/// Replaces every device field of `record` with `state`.
///
/// Use after a full `get_state` or `set_state` result.
pub fn apply_full_state(record: &mut RoomStateRecord, state: &DeviceState, now: DateTime<Utc>) {
    let next = RoomStateRecord {
        state: *state,
        last_updated: stamp(record.last_updated, now),
        ..record.clone()
    };

    tracing::debug!(room_id = %record.room_id, "Reconciled full device state");
    *record = next;
}

/// Overwrites only the fields present in `update`.
///
/// Sensor readings and fields absent from the update are left as they are.
/// An empty update only refreshes `last_updated`. Returns `true` if any
/// device field changed.
pub fn apply_partial(
    record: &mut RoomStateRecord,
    update: &PartialStateUpdate,
    now: DateTime<Utc>,
) -> bool {
    let mut state = record.state;
    let changed = state.apply(update);
    let next = RoomStateRecord {
        state,
        last_updated: stamp(record.last_updated, now),
        ..record.clone()
    };

    tracing::debug!(room_id = %record.room_id, fields = update.len(), changed, "Reconciled partial device state");
    *record = next;
    changed
}

fn stamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now < previous {
        tracing::warn!(%previous, %now, "Clock stepped back, keeping last update time");
        previous
    } else {
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateField;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn record() -> RoomStateRecord {
        RoomStateRecord::new("room-1", "101", at(0))
    }

    #[test]
    fn new_record_uses_default_state() {
        let record = record();
        assert_eq!(record.state, DeviceState::default());
        assert_eq!(record.last_updated, at(0));
    }

    #[test]
    fn full_state_replaces_everything() {
        let mut record = record();
        let state = DeviceState {
            lights_on: true,
            door_locked: false,
            channel1: true,
            channel2: true,
            temperature: 19.5,
            humidity: 61.0,
            pressure: 998.0,
        };

        apply_full_state(&mut record, &state, at(10));
        assert_eq!(record.state, state);
        assert_eq!(record.last_updated, at(10));
        assert_eq!(record.room_number, "101");
    }

    #[test]
    fn partial_touches_only_present_fields() {
        let mut record = record();
        let before = record.state;
        let update = PartialStateUpdate::new()
            .with(StateField::LightsOn, true)
            .with(StateField::Channel2, true);

        assert!(apply_partial(&mut record, &update, at(5)));
        assert!(record.state.lights_on);
        assert!(record.state.channel2);
        assert_eq!(record.state.door_locked, before.door_locked);
        assert_eq!(record.state.channel1, before.channel1);
        assert!((record.state.temperature - before.temperature).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_partial_only_refreshes_timestamp() {
        let mut record = record();
        let before = record.clone();

        assert!(!apply_partial(&mut record, &PartialStateUpdate::new(), at(30)));
        assert_eq!(record.state, before.state);
        assert_eq!(record.id, before.id);
        assert_eq!(record.last_updated, at(30));
    }

    #[test]
    fn sensor_keys_in_payload_are_dropped() {
        let mut record = record();
        let update = PartialStateUpdate::from_json(&serde_json::json!({
            "temperature": 40.0,
            "door_locked": false,
            "mood": "calm"
        }))
        .unwrap();

        apply_partial(&mut record, &update, at(1));
        assert!(!record.state.door_locked);
        assert!((record.state.temperature - DeviceState::DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[test]
    fn last_updated_never_moves_back() {
        let mut record = record();
        apply_full_state(&mut record, &DeviceState::default(), at(100));
        apply_partial(&mut record, &PartialStateUpdate::new(), at(50));
        assert_eq!(record.last_updated, at(100));

        apply_full_state(&mut record, &DeviceState::default(), at(20));
        assert_eq!(record.last_updated, at(100));
    }

    #[test]
    fn record_serializes_for_persistence() {
        let record = record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["room_id"], "room-1");
        assert_eq!(json["state"]["door_locked"], true);

        let back: RoomStateRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
