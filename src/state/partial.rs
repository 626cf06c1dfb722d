// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sparse state patches.
//!
//! A [`PartialStateUpdate`] names a subset of the settable [`StateField`]s
//! together with their target values. Payloads arriving from callers may
//! carry keys this layer does not track; those keys are dropped rather than
//! rejected, so richer client payloads stay forward-compatible.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::command::SetTarget;
use crate::error::{ParseError, ValueError};

/// A settable field of a room controller.
///
/// Sensor readings are not settable and have no variant here.
///
/// # Examples
///
/// ```
/// use roomctl_lib::state::StateField;
///
/// let field: StateField = "door_locked".parse().unwrap();
/// assert_eq!(field, StateField::DoorLocked);
/// assert_eq!(field.as_str(), "door_locked");
/// assert!("temperature".parse::<StateField>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    /// Room lighting.
    LightsOn,
    /// Door lock; `true` means locked.
    DoorLocked,
    /// Switched channel 1.
    #[serde(rename = "channel1")]
    Channel1,
    /// Switched channel 2.
    #[serde(rename = "channel2")]
    Channel2,
}

impl StateField {
    /// All settable fields, in the order updates are applied.
    pub const ALL: [Self; 4] = [
        Self::LightsOn,
        Self::DoorLocked,
        Self::Channel1,
        Self::Channel2,
    ];

    /// Returns the key used for this field in JSON payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LightsOn => "lights_on",
            Self::DoorLocked => "door_locked",
            Self::Channel1 => "channel1",
            Self::Channel2 => "channel2",
        }
    }

    /// Returns the wire command that drives this field to `value`.
    #[must_use]
    pub const fn target(&self, value: bool) -> SetTarget {
        match (self, value) {
            (Self::LightsOn, true) => SetTarget::LightOn,
            (Self::LightsOn, false) => SetTarget::LightOff,
            (Self::DoorLocked, true) => SetTarget::DoorLockClose,
            (Self::DoorLocked, false) => SetTarget::DoorLockOpen,
            (Self::Channel1, true) => SetTarget::Channel1On,
            (Self::Channel1, false) => SetTarget::Channel1Off,
            (Self::Channel2, true) => SetTarget::Channel2On,
            (Self::Channel2, false) => SetTarget::Channel2Off,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::LightsOn => 0,
            Self::DoorLocked => 1,
            Self::Channel1 => 2,
            Self::Channel2 => 3,
        }
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateField {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ValueError::UnknownField(s.to_string()))
    }
}

/// A sparse set of field changes.
///
/// # Examples
///
/// ```
/// use roomctl_lib::state::{PartialStateUpdate, StateField};
///
/// let update: PartialStateUpdate = serde_json::from_str(
///     r#"{"lights_on": true, "door_locked": false, "minibar": "open"}"#,
/// ).unwrap();
///
/// assert_eq!(update.len(), 2);
/// assert_eq!(update.get(StateField::LightsOn), Some(true));
/// assert_eq!(update.get(StateField::Channel1), None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct PartialStateUpdate {
    changes: [Option<bool>; 4],
}

impl PartialStateUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field change, replacing any previous value for that field.
    #[must_use]
    pub fn with(mut self, field: StateField, value: bool) -> Self {
        self.set(field, value);
        self
    }

    /// Sets the target value for a field.
    pub fn set(&mut self, field: StateField, value: bool) {
        self.changes[field.index()] = Some(value);
    }

    /// Returns the target value for a field, if the update carries one.
    #[must_use]
    pub fn get(&self, field: StateField) -> Option<bool> {
        self.changes[field.index()]
    }

    /// Returns `true` if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.iter().all(Option::is_none)
    }

    /// Returns the number of fields carried by the update.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.iter().filter(|c| c.is_some()).count()
    }

    /// Iterates over the carried changes in application order.
    pub fn iter(&self) -> impl Iterator<Item = (StateField, bool)> + '_ {
        StateField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
    }

    /// Builds an update from a JSON value.
    ///
    /// Recognized keys are coerced by JSON truthiness: `null`, `false`, `0`
    /// and empty strings, arrays or objects are `false`, everything else is
    /// `true`. Unrecognized keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnexpectedFormat` if `value` is not an object.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        let Value::Object(map) = value else {
            return Err(ParseError::UnexpectedFormat(format!(
                "state update must be an object, got {value}"
            )));
        };
        Ok(Self::from_map(map))
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let mut update = Self::new();
        for (key, value) in map {
            match key.parse::<StateField>() {
                Ok(field) => update.set(field, truthy(value)),
                Err(_) => tracing::trace!(key = %key, "Ignoring untracked state key"),
            }
        }
        update
    }
}

impl TryFrom<Map<String, Value>> for PartialStateUpdate {
    type Error = ParseError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        Ok(Self::from_map(&map))
    }
}

impl FromIterator<(StateField, bool)> for PartialStateUpdate {
    fn from_iter<I: IntoIterator<Item = (StateField, bool)>>(iter: I) -> Self {
        let mut update = Self::new();
        for (field, value) in iter {
            update.set(field, value);
        }
        update
    }
}

impl Serialize for PartialStateUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.as_str(), &value)?;
        }
        map.end()
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
