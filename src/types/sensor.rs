// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor value ranges.

use serde::{Deserialize, Serialize};

/// An inclusive range of sensor values.
///
/// # Examples
///
/// ```
/// use roomctl_lib::types::SensorRange;
///
/// let range = SensorRange::new(18.0, 26.0);
/// assert!((range.clamp(30.0) - 26.0).abs() < f32::EPSILON);
/// assert!(range.contains(22.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorRange {
    min: f32,
    max: f32,
}

impl SensorRange {
    /// Creates a range; the bounds are swapped if given in reverse.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Clamps a value into the range. NaN maps to the lower bound.
    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Returns `true` if the value lies within the range.
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Per-sensor ranges for temperature, humidity and pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorEnvelope {
    /// Temperature range in degrees Celsius.
    pub temperature: SensorRange,
    /// Humidity range in percent.
    pub humidity: SensorRange,
    /// Pressure range in hPa.
    pub pressure: SensorRange,
}

impl SensorEnvelope {
    /// Realistic indoor envelope sensor readings never leave.
    #[must_use]
    pub fn realistic() -> Self {
        Self {
            temperature: SensorRange::new(18.0, 26.0),
            humidity: SensorRange::new(30.0, 70.0),
            pressure: SensorRange::new(990.0, 1030.0),
        }
    }

    /// Ranges fresh readings are seeded from.
    #[must_use]
    pub fn seed() -> Self {
        Self {
            temperature: SensorRange::new(20.0, 24.0),
            humidity: SensorRange::new(40.0, 60.0),
            pressure: SensorRange::new(1000.0, 1020.0),
        }
    }

    /// Returns `true` if all three readings lie within the envelope.
    #[must_use]
    pub fn contains(&self, temperature: f32, humidity: f32, pressure: f32) -> bool {
        self.temperature.contains(temperature)
            && self.humidity.contains(humidity)
            && self.pressure.contains(pressure)
    }
}
