// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Full controller state snapshots.

use serde::{Deserialize, Serialize};

use super::{PartialStateUpdate, StateField};

/// Complete state of a room controller.
///
/// Every field always holds a value; a snapshot never contains unknowns.
/// Use [`PartialStateUpdate`] to express "change only these fields".
///
/// # Examples
///
/// ```
/// use roomctl_lib::state::{DeviceState, PartialStateUpdate, StateField};
///
/// let mut state = DeviceState::default();
/// assert!(state.door_locked);
///
/// let changed = state.apply(&PartialStateUpdate::new().with(StateField::LightsOn, true));
/// assert!(changed);
/// assert!(state.lights_on);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Room lighting is on.
    pub lights_on: bool,
    /// Door lock is closed.
    pub door_locked: bool,
    /// Switched channel 1 is on.
    pub channel1: bool,
    /// Switched channel 2 is on.
    pub channel2: bool,
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
    /// Barometric pressure in hPa.
    pub pressure: f32,
}

impl DeviceState {
    /// Temperature of a freshly provisioned room.
    pub const DEFAULT_TEMPERATURE: f32 = 23.0;
    /// Humidity of a freshly provisioned room.
    pub const DEFAULT_HUMIDITY: f32 = 45.0;
    /// Pressure of a freshly provisioned room.
    pub const DEFAULT_PRESSURE: f32 = 1013.0;

    /// Returns the value of a settable field.
    #[must_use]
    pub fn get(&self, field: StateField) -> bool {
        match field {
            StateField::LightsOn => self.lights_on,
            StateField::DoorLocked => self.door_locked,
            StateField::Channel1 => self.channel1,
            StateField::Channel2 => self.channel2,
        }
    }

    /// Sets the value of a settable field.
    pub fn set(&mut self, field: StateField, value: bool) {
        match field {
            StateField::LightsOn => self.lights_on = value,
            StateField::DoorLocked => self.door_locked = value,
            StateField::Channel1 => self.channel1 = value,
            StateField::Channel2 => self.channel2 = value,
        }
    }

    /// Applies a partial update and returns whether any field changed.
    pub fn apply(&mut self, update: &PartialStateUpdate) -> bool {
        let mut changed = false;
        for (field, value) in update.iter() {
            if self.get(field) != value {
                self.set(field, value);
                changed = true;
            }
        }
        changed
    }

    /// Returns a copy with sensor readings replaced.
    #[must_use]
    pub fn with_sensors(mut self, temperature: f32, humidity: f32, pressure: f32) -> Self {
        self.temperature = temperature;
        self.humidity = humidity;
        self.pressure = pressure;
        self
    }
}

impl Default for DeviceState {
    /// Lights off, door locked, both channels off, nominal sensor readings.
    fn default() -> Self {
        Self {
            lights_on: false,
            door_locked: true,
            channel1: false,
            channel2: false,
            temperature: Self::DEFAULT_TEMPERATURE,
            humidity: Self::DEFAULT_HUMIDITY,
            pressure: Self::DEFAULT_PRESSURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state() {
        let state = DeviceState::default();
        assert!(!state.lights_on);
        assert!(state.door_locked);
        assert!(!state.channel1);
        assert!(!state.channel2);
        assert!((state.pressure - 1013.0).abs() < f32::EPSILON);
    }

    #[test]
    fn apply_reports_change() {
        let mut state = DeviceState::default();
        let update = PartialStateUpdate::new()
            .with(StateField::LightsOn, true)
            .with(StateField::DoorLocked, true);

        assert!(state.apply(&update));
        assert!(state.lights_on);
        assert!(!state.apply(&update));
    }

    #[test]
    fn apply_leaves_sensors_alone() {
        let mut state = DeviceState::default().with_sensors(19.5, 33.0, 1001.0);
        state.apply(&PartialStateUpdate::new().with(StateField::Channel2, true));
        assert!(state.channel2);
        assert!((state.temperature - 19.5).abs() < f32::EPSILON);
        assert!((state.humidity - 33.0).abs() < f32::EPSILON);
    }

    #[test]
    fn get_set_roundtrip() {
        let mut state = DeviceState::default();
        for field in StateField::ALL {
            let flipped = !state.get(field);
            state.set(field, flipped);
            assert_eq!(state.get(field), flipped);
        }
    }

    #[test]
    fn serializes_with_collaborator_keys() {
        let value = serde_json::to_value(DeviceState::default()).unwrap();
        assert_eq!(value["lights_on"], false);
        assert_eq!(value["door_locked"], true);
        assert_eq!(value["channel1"], false);
        assert_eq!(value["channel2"], false);
    }
}
