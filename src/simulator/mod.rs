// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory room controller.
//!
//! [`SimulatedController`] implements [`Controller`] without any network
//! dependency. Readings drift by a small bounded amount on every
//! `get_state` and are clamped to [`SensorEnvelope::realistic`], so they
//! never diverge. State changes always succeed.
//!
//! [`server::SimulatorServer`] exposes a simulator over TCP so the real
//! [`ControllerClient`](crate::controller::ControllerClient) can be
//! exercised end to end.
//!
//! # Examples
//!
//! ```
//! use roomctl_lib::simulator::{SimulatedController, SimulatorConfig};
//! use roomctl_lib::state::{PartialStateUpdate, StateField};
//! use roomctl_lib::types::SensorEnvelope;
//!
//! let sim = SimulatedController::new(SimulatorConfig::default().with_seed(42));
//!
//! let state = sim.update(&PartialStateUpdate::new().with(StateField::LightsOn, true));
//! assert!(state.lights_on);
//!
//! let reading = sim.sample();
//! assert!(SensorEnvelope::realistic().contains(reading.temperature, reading.humidity, reading.pressure));
//! ```

pub mod server;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::command::SetTarget;
use crate::controller::Controller;
use crate::error::Result;
use crate::state::{DeviceState, PartialStateUpdate};
use crate::types::{ControllerInfo, SensorEnvelope, SensorRange};

/// Maximum temperature change per reading, in degrees Celsius.
pub const TEMPERATURE_DRIFT: f32 = 0.5;
/// Maximum humidity change per reading, in percent.
pub const HUMIDITY_DRIFT: f32 = 1.0;
/// Maximum pressure change per reading, in hPa.
pub const PRESSURE_DRIFT: f32 = 2.0;

/// Configuration for a [`SimulatedController`].
///
/// # Examples
///
/// ```
/// use roomctl_lib::simulator::SimulatorConfig;
/// use roomctl_lib::state::DeviceState;
///
/// let config = SimulatorConfig::new()
///     .with_ble_name("Room_204")
///     .with_seed(7)
///     .with_initial_state(DeviceState::default());
/// assert_eq!(config.ble_name(), Some("Room_204"));
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    ip: String,
    mac: String,
    ble_name: Option<String>,
    token: String,
    seed: Option<u64>,
    initial_state: Option<DeviceState>,
}

impl SimulatorConfig {
    /// Default advertised address.
    pub const DEFAULT_IP: &'static str = "192.168.1.100";
    /// Default hardware identifier.
    pub const DEFAULT_MAC: &'static str = "12:34:56:78:90:AB";
    /// Default session token.
    pub const DEFAULT_TOKEN: &'static str = "mock_token_123";
    /// Room numbers a generated advertised name is picked from.
    pub const ROOM_NUMBERS: std::ops::RangeInclusive<u16> = 101..=105;

    /// Creates a configuration with default identity and a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ip: Self::DEFAULT_IP.to_string(),
            mac: Self::DEFAULT_MAC.to_string(),
            ble_name: None,
            token: Self::DEFAULT_TOKEN.to_string(),
            seed: None,
            initial_state: None,
        }
    }

    /// Sets the advertised address.
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }

    /// Sets the hardware identifier.
    #[must_use]
    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = mac.into();
        self
    }

    /// Sets the advertised name instead of generating `Room_<n>`.
    #[must_use]
    pub fn with_ble_name(mut self, name: impl Into<String>) -> Self {
        self.ble_name = Some(name.into());
        self
    }

    /// Sets the session token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Seeds the random generator for reproducible readings.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Starts from this state instead of seeded readings.
    ///
    /// Sensor readings are clamped into the realistic envelope.
    #[must_use]
    pub fn with_initial_state(mut self, state: DeviceState) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Returns the advertised address.
    #[must_use]
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// Returns the hardware identifier.
    #[must_use]
    pub fn mac(&self) -> &str {
        &self.mac
    }

    /// Returns the configured advertised name, if any.
    #[must_use]
    pub fn ble_name(&self) -> Option<&str> {
        self.ble_name.as_deref()
    }

    /// Returns the session token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the random seed, if any.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the configured initial state, if any.
    #[must_use]
    pub fn initial_state(&self) -> Option<&DeviceState> {
        self.initial_state.as_ref()
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A room controller held entirely in memory.
///
/// All methods take `&self`; the simulator can be shared between tasks,
/// for example behind an `Arc` by [`server::SimulatorServer`].
#[derive(Debug)]
pub struct SimulatedController {
    info: ControllerInfo,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: DeviceState,
    rng: StdRng,
}

impl SimulatedController {
    /// Creates a simulator.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let mut rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        let ble_name = config.ble_name.unwrap_or_else(|| {
            format!("Room_{}", rng.gen_range(SimulatorConfig::ROOM_NUMBERS))
        });
        let state = match config.initial_state {
            Some(state) => clamp_sensors(state),
            None => seed_sensors(DeviceState::default(), &mut rng),
        };

        tracing::debug!(ble_name = %ble_name, "Created simulated room controller");
        Self {
            info: ControllerInfo::new(config.ip, config.mac, ble_name, config.token),
            inner: Mutex::new(Inner { state, rng }),
        }
    }

    /// Returns the identity reported by `get_info`.
    #[must_use]
    pub fn info(&self) -> &ControllerInfo {
        &self.info
    }

    /// Returns the current state without taking a new reading.
    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        self.inner.lock().state
    }

    /// Takes a reading: sensors drift, then the full state is returned.
    pub fn sample(&self) -> DeviceState {
        let mut inner = self.inner.lock();
        let Inner { state, rng } = &mut *inner;

        state.temperature += rng.gen_range(-TEMPERATURE_DRIFT..=TEMPERATURE_DRIFT);
        state.humidity += rng.gen_range(-HUMIDITY_DRIFT..=HUMIDITY_DRIFT);
        state.pressure += rng.gen_range(-PRESSURE_DRIFT..=PRESSURE_DRIFT);
        *state = clamp_sensors(*state);
        *state
    }

    /// Applies every field of `update` and returns the resulting state.
    ///
    /// Only actuator fields can be set. Sensor keys in a JSON payload never
    /// reach this method, since [`PartialStateUpdate`] drops them like any
    /// other untracked key.
    pub fn update(&self, update: &PartialStateUpdate) -> DeviceState {
        let mut inner = self.inner.lock();
        inner.state.apply(update);
        inner.state
    }

    /// Applies a single wire target.
    pub fn apply_target(&self, target: SetTarget) {
        let (field, value) = target.field_change();
        self.inner.lock().state.set(field, value);
    }

    /// Restores default actuator values and re-seeds the sensors.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let Inner { state, rng } = &mut *inner;
        *state = seed_sensors(DeviceState::default(), rng);
        tracing::debug!(ble_name = %self.info.ble_name, "Simulated room controller reset");
    }
}

impl Controller for SimulatedController {
    async fn get_info(&self) -> Result<ControllerInfo> {
        Ok(self.info.clone())
    }

    async fn get_state(&self) -> Result<DeviceState> {
        Ok(self.sample())
    }

    async fn set_state(&self, update: &PartialStateUpdate) -> Result<DeviceState> {
        Ok(self.update(update))
    }
}

fn seed_sensors(state: DeviceState, rng: &mut StdRng) -> DeviceState {
    let seed = SensorEnvelope::seed();
    state.with_sensors(
        draw(&seed.temperature, rng),
        draw(&seed.humidity, rng),
        draw(&seed.pressure, rng),
    )
}

fn draw(range: &SensorRange, rng: &mut StdRng) -> f32 {
    rng.gen_range(range.min()..=range.max())
}

fn clamp_sensors(state: DeviceState) -> DeviceState {
    let envelope = SensorEnvelope::realistic();
    state.with_sensors(
        envelope.temperature.clamp(state.temperature),
        envelope.humidity.clamp(state.humidity),
        envelope.pressure.clamp(state.pressure),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateField;

    fn seeded(seed: u64) -> SimulatedController {
        SimulatedController::new(SimulatorConfig::default().with_seed(seed))
    }

    #[test]
    fn seeded_readings_start_in_seed_ranges() {
        for seed in 0..50 {
            let state = seeded(seed).snapshot();
            let ranges = SensorEnvelope::seed();
            assert!(ranges.contains(state.temperature, state.humidity, state.pressure));
            assert!(!state.lights_on);
            assert!(state.door_locked);
        }
    }

    #[test]
    fn generated_name_is_a_room_number() {
        let sim = seeded(9);
        let number: u16 = sim.info().ble_name.trim_start_matches("Room_").parse().unwrap();
        assert!(SimulatorConfig::ROOM_NUMBERS.contains(&number));
        assert_eq!(sim.info().token, "mock_token_123");
    }

    #[test]
    fn same_seed_same_readings() {
        let a = seeded(11);
        let b = seeded(11);
        assert_eq!(a.sample(), b.sample());
        assert_eq!(a.info(), b.info());
    }

    #[test]
    fn drift_is_bounded() {
        let sim = seeded(5);
        let mut previous = sim.snapshot();
        for _ in 0..200 {
            let next = sim.sample();
            assert!((next.temperature - previous.temperature).abs() <= TEMPERATURE_DRIFT + 1e-3);
            assert!((next.humidity - previous.humidity).abs() <= HUMIDITY_DRIFT + 1e-3);
            assert!((next.pressure - previous.pressure).abs() <= PRESSURE_DRIFT + 1e-3);
            previous = next;
        }
    }

    #[test]
    fn initial_state_is_clamped() {
        let sim = SimulatedController::new(
            SimulatorConfig::default()
                .with_seed(1)
                .with_initial_state(DeviceState::default().with_sensors(-40.0, 120.0, f32::NAN)),
        );
        let state = sim.snapshot();
        assert!((state.temperature - 18.0).abs() < f32::EPSILON);
        assert!((state.humidity - 70.0).abs() < f32::EPSILON);
        assert!((state.pressure - 990.0).abs() < f32::EPSILON);
    }

    #[test]
    fn apply_target_changes_one_field() {
        let sim = seeded(2);
        sim.apply_target(SetTarget::Channel2On);
        sim.apply_target(SetTarget::DoorLockOpen);
        let state = sim.snapshot();
        assert!(state.channel2);
        assert!(!state.door_locked);
        assert!(!state.channel1);
    }

    #[test]
    fn reset_restores_defaults() {
        let sim = seeded(3);
        sim.update(
            &PartialStateUpdate::new()
                .with(StateField::LightsOn, true)
                .with(StateField::DoorLocked, false),
        );
        sim.reset();

        let state = sim.snapshot();
        assert!(!state.lights_on);
        assert!(state.door_locked);
        assert!(SensorEnvelope::seed().contains(state.temperature, state.humidity, state.pressure));
    }
}
