// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Protobuf schema of the controller protocol.
//!
//! Equivalent `.proto` definition:
//!
//! ```text
//! message ClientMessage {
//!   oneof msg { GetInfo get_info = 1; GetState get_state = 2; SetState set_state = 3; }
//! }
//! message GetInfo {}
//! message GetState {}
//! message SetState { optional States state = 1; }
//!
//! message ControllerResponse {
//!   oneof response { Info info = 1; State state = 2; Status status = 3; }
//! }
//! message Info {
//!   optional string ip = 1; optional string mac = 2;
//!   optional string ble_name = 3; optional string token = 4;
//! }
//! message State {
//!   optional LightState light_on = 1; optional DoorLockState door_lock = 2;
//!   optional ChannelState channel_1 = 3; optional ChannelState channel_2 = 4;
//!   optional float temperature = 5; optional float humidity = 6;
//!   optional float pressure = 7;
//! }
//! ```
//!
//! Fields use explicit presence so that a missing field can be told apart
//! from a zero value. Messages are hand-derived with `prost` rather than
//! generated, so no `protoc` is needed at build time.

#![allow(clippy::derive_partial_eq_without_eq)]

/// Envelope for every client-to-controller message.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ClientMessage {
    /// The request being made.
    #[prost(oneof = "client_message::Msg", tags = "1, 2, 3")]
    pub msg: Option<client_message::Msg>,
}

/// Nested types for [`ClientMessage`].
pub mod client_message {
    /// Request variants.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Msg {
        /// Query controller identity.
        #[prost(message, tag = "1")]
        GetInfo(super::GetInfo),
        /// Query device state.
        #[prost(message, tag = "2")]
        GetState(super::GetState),
        /// Change one actuator.
        #[prost(message, tag = "3")]
        SetState(super::SetState),
    }
}

/// `GetInfo` request body.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct GetInfo {}

/// `GetState` request body.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct GetState {}

/// `SetState` request body.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct SetState {
    /// Target value, a [`States`] code.
    #[prost(enumeration = "States", optional, tag = "1")]
    pub state: Option<i32>,
}

/// Envelope for every controller-to-client message.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ControllerResponse {
    /// The reply being made.
    #[prost(oneof = "controller_response::Response", tags = "1, 2, 3")]
    pub response: Option<controller_response::Response>,
}

/// Nested types for [`ControllerResponse`].
pub mod controller_response {
    /// Reply variants.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Response {
        /// Controller identity.
        #[prost(message, tag = "1")]
        Info(super::Info),
        /// Device state snapshot.
        #[prost(message, tag = "2")]
        State(super::State),
        /// Outcome of a `SetState`, a [`Status`](super::Status) code.
        #[prost(enumeration = "super::Status", tag = "3")]
        Status(i32),
    }
}

/// `Info` reply body.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Info {
    /// Network address.
    #[prost(string, optional, tag = "1")]
    pub ip: Option<String>,
    /// Hardware identifier.
    #[prost(string, optional, tag = "2")]
    pub mac: Option<String>,
    /// Advertised short name.
    #[prost(string, optional, tag = "3")]
    pub ble_name: Option<String>,
    /// Session token.
    #[prost(string, optional, tag = "4")]
    pub token: Option<String>,
}

/// `State` reply body.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct State {
    /// A [`LightState`] code.
    #[prost(enumeration = "LightState", optional, tag = "1")]
    pub light_on: Option<i32>,
    /// A [`DoorLockState`] code.
    #[prost(enumeration = "DoorLockState", optional, tag = "2")]
    pub door_lock: Option<i32>,
    /// A [`ChannelState`] code.
    #[prost(enumeration = "ChannelState", optional, tag = "3")]
    pub channel_1: Option<i32>,
    /// A [`ChannelState`] code.
    #[prost(enumeration = "ChannelState", optional, tag = "4")]
    pub channel_2: Option<i32>,
    /// Temperature in degrees Celsius.
    #[prost(float, optional, tag = "5")]
    pub temperature: Option<f32>,
    /// Relative humidity in percent.
    #[prost(float, optional, tag = "6")]
    pub humidity: Option<f32>,
    /// Pressure in hPa.
    #[prost(float, optional, tag = "7")]
    pub pressure: Option<f32>,
}

/// `SetState` target codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum States {
    /// Lights on.
    LightOn = 0,
    /// Lights off.
    LightOff = 1,
    /// Unlock the door.
    DoorLockOpen = 2,
    /// Lock the door.
    DoorLockClose = 3,
    /// Channel 1 on.
    Channel1On = 4,
    /// Channel 1 off.
    Channel1Off = 5,
    /// Channel 2 on.
    Channel2On = 6,
    /// Channel 2 off.
    Channel2Off = 7,
}

/// Light codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum LightState {
    /// Lights off.
    Off = 0,
    /// Lights on.
    On = 1,
}

/// Door lock codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DoorLockState {
    /// Lock engaged.
    Closed = 0,
    /// Lock released.
    Open = 1,
}

/// Switched channel codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ChannelState {
    /// Channel off.
    ChannelOff = 0,
    /// Channel on.
    ChannelOn = 1,
}

/// `SetState` outcome codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Status {
    /// Change applied.
    Ok = 0,
    /// Change refused.
    Error = 1,
}
