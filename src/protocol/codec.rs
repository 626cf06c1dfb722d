// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire codec for commands and replies.
//!
//! # Framing
//!
//! Every message is a protobuf body preceded by its length as a protobuf
//! varint, so a reader can find the end of a message without any framing
//! from the caller:
//!
//! ```text
//! ┌───────────────────────┬──────────────────────────┐
//! │ Length (1-10 bytes)   │ Payload (variable)       │
//! │ protobuf varint       │ ClientMessage or         │
//! │                       │ ControllerResponse       │
//! └───────────────────────┴──────────────────────────┘
//! ```
//!
//! Decoding is strict: the input must hold exactly one frame, the oneof
//! must be set, every field must be present and every enum code must be
//! known. Anything else is a [`ParseError::MalformedMessage`]; nothing is
//! defaulted.
//!
//! # Examples
//!
//! ```
//! use roomctl_lib::command::{Command, SetTarget};
//! use roomctl_lib::protocol::codec;
//!
//! let bytes = codec::encode_command(&Command::SetState(SetTarget::LightOn));
//! let decoded = codec::decode_command(&bytes).unwrap();
//! assert_eq!(decoded, Command::SetState(SetTarget::LightOn));
//! ```

use prost::Message;

use crate::command::{Command, SetTarget};
use crate::error::ParseError;
use crate::response::{Response, Status};
use crate::state::DeviceState;
use crate::types::ControllerInfo;

use super::wire::{self, client_message, controller_response};

/// Largest frame body accepted from a peer.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Largest possible varint length prefix.
pub const MAX_PREFIX_LEN: usize = 10;

/// Encodes a command into a self-delimiting frame.
#[must_use]
pub fn encode_command(command: &Command) -> Vec<u8> {
    wire::ClientMessage::from(command).encode_length_delimited_to_vec()
}

/// Decodes a self-delimiting frame into a command.
///
/// # Errors
///
/// Returns `ParseError::MalformedMessage` if the bytes are not exactly one
/// valid `ClientMessage` frame.
pub fn decode_command(bytes: &[u8]) -> Result<Command, ParseError> {
    decode_frame::<wire::ClientMessage>(bytes)?.try_into()
}

/// Encodes a reply into a self-delimiting frame.
#[must_use]
pub fn encode_response(response: &Response) -> Vec<u8> {
    wire::ControllerResponse::from(response).encode_length_delimited_to_vec()
}

/// Decodes a self-delimiting frame into a reply.
///
/// # Errors
///
/// Returns `ParseError::MalformedMessage` if the bytes are not exactly one
/// valid `ControllerResponse` frame, or if the reply lacks a field its tag
/// requires.
pub fn decode_response(bytes: &[u8]) -> Result<Response, ParseError> {
    decode_frame::<wire::ControllerResponse>(bytes)?.try_into()
}

/// Decodes a varint length prefix.
///
/// Returns `Ok(None)` while the prefix is still incomplete.
///
/// # Errors
///
/// Returns `ParseError::MalformedMessage` if the prefix is longer than a
/// varint can be.
pub fn frame_len(prefix: &[u8]) -> Result<Option<usize>, ParseError> {
    match prefix.last() {
        Some(byte) if byte & 0x80 == 0 => {
            let len = prost::decode_length_delimiter(prefix)?;
            Ok(Some(len))
        }
        _ if prefix.len() >= MAX_PREFIX_LEN => Err(malformed("length prefix too long")),
        _ => Ok(None),
    }
}

fn decode_frame<M: Message + Default>(bytes: &[u8]) -> Result<M, ParseError> {
    let mut buf = bytes;
    let message = M::decode_length_delimited(&mut buf)?;
    if !buf.is_empty() {
        return Err(malformed(format!("{} trailing bytes after frame", buf.len())));
    }
    Ok(message)
}

fn malformed(message: impl Into<String>) -> ParseError {
    ParseError::MalformedMessage(message.into())
}

fn required<T>(value: Option<T>, message: &str, field: &str) -> Result<T, ParseError> {
    value.ok_or_else(|| malformed(format!("{message} is missing {field}")))
}

// ============================================================================
// Commands
// ============================================================================

impl From<&Command> for wire::ClientMessage {
    fn from(command: &Command) -> Self {
        let msg = match command {
            Command::GetInfo => client_message::Msg::GetInfo(wire::GetInfo {}),
            Command::GetState => client_message::Msg::GetState(wire::GetState {}),
            Command::SetState(target) => client_message::Msg::SetState(wire::SetState {
                state: Some(wire::States::from(*target) as i32),
            }),
        };
        Self { msg: Some(msg) }
    }
}

impl TryFrom<wire::ClientMessage> for Command {
    type Error = ParseError;

    fn try_from(message: wire::ClientMessage) -> Result<Self, Self::Error> {
        match message.msg {
            Some(client_message::Msg::GetInfo(_)) => Ok(Self::GetInfo),
            Some(client_message::Msg::GetState(_)) => Ok(Self::GetState),
            Some(client_message::Msg::SetState(set)) => {
                let code = required(set.state, "SetState", "state")?;
                let target = wire::States::try_from(code)
                    .map_err(|_| malformed(format!("unknown SetState target {code}")))?;
                Ok(Self::SetState(target.into()))
            }
            None => Err(malformed("ClientMessage carries no command")),
        }
    }
}

impl From<SetTarget> for wire::States {
    fn from(target: SetTarget) -> Self {
        match target {
            SetTarget::LightOn => Self::LightOn,
            SetTarget::LightOff => Self::LightOff,
            SetTarget::DoorLockOpen => Self::DoorLockOpen,
            SetTarget::DoorLockClose => Self::DoorLockClose,
            SetTarget::Channel1On => Self::Channel1On,
            SetTarget::Channel1Off => Self::Channel1Off,
            SetTarget::Channel2On => Self::Channel2On,
            SetTarget::Channel2Off => Self::Channel2Off,
        }
    }
}

impl From<wire::States> for SetTarget {
    fn from(state: wire::States) -> Self {
        match state {
            wire::States::LightOn => Self::LightOn,
            wire::States::LightOff => Self::LightOff,
            wire::States::DoorLockOpen => Self::DoorLockOpen,
            wire::States::DoorLockClose => Self::DoorLockClose,
            wire::States::Channel1On => Self::Channel1On,
            wire::States::Channel1Off => Self::Channel1Off,
            wire::States::Channel2On => Self::Channel2On,
            wire::States::Channel2Off => Self::Channel2Off,
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

impl From<&Response> for wire::ControllerResponse {
    fn from(response: &Response) -> Self {
        let response = match response {
            Response::Info(info) => controller_response::Response::Info(info.into()),
            Response::State(state) => controller_response::Response::State(state.into()),
            Response::Status(status) => {
                let code = match status {
                    Status::Ok => wire::Status::Ok,
                    Status::Error => wire::Status::Error,
                };
                controller_response::Response::Status(code as i32)
            }
        };
        Self {
            response: Some(response),
        }
    }
}

impl TryFrom<wire::ControllerResponse> for Response {
    type Error = ParseError;

    fn try_from(message: wire::ControllerResponse) -> Result<Self, Self::Error> {
        match message.response {
            Some(controller_response::Response::Info(info)) => Ok(Self::Info(info.try_into()?)),
            Some(controller_response::Response::State(state)) => {
                Ok(Self::State(state.try_into()?))
            }
            Some(controller_response::Response::Status(code)) => {
                match wire::Status::try_from(code) {
                    Ok(wire::Status::Ok) => Ok(Self::Status(Status::Ok)),
                    Ok(wire::Status::Error) => Ok(Self::Status(Status::Error)),
                    Err(_) => Err(malformed(format!("unknown status code {code}"))),
                }
            }
            None => Err(malformed("ControllerResponse carries no reply")),
        }
    }
}

impl From<&ControllerInfo> for wire::Info {
    fn from(info: &ControllerInfo) -> Self {
        Self {
            ip: Some(info.ip.clone()),
            mac: Some(info.mac.clone()),
            ble_name: Some(info.ble_name.clone()),
            token: Some(info.token.clone()),
        }
    }
}

impl TryFrom<wire::Info> for ControllerInfo {
    type Error = ParseError;

    fn try_from(info: wire::Info) -> Result<Self, Self::Error> {
        Ok(Self {
            ip: required(info.ip, "Info", "ip")?,
            mac: required(info.mac, "Info", "mac")?,
            ble_name: required(info.ble_name, "Info", "ble_name")?,
            token: required(info.token, "Info", "token")?,
        })
    }
}

impl From<&DeviceState> for wire::State {
    fn from(state: &DeviceState) -> Self {
        let light = if state.lights_on {
            wire::LightState::On
        } else {
            wire::LightState::Off
        };
        let lock = if state.door_locked {
            wire::DoorLockState::Closed
        } else {
            wire::DoorLockState::Open
        };
        Self {
            light_on: Some(light as i32),
            door_lock: Some(lock as i32),
            channel_1: Some(channel_code(state.channel1)),
            channel_2: Some(channel_code(state.channel2)),
            temperature: Some(state.temperature),
            humidity: Some(state.humidity),
            pressure: Some(state.pressure),
        }
    }
}

impl TryFrom<wire::State> for DeviceState {
    type Error = ParseError;

    fn try_from(state: wire::State) -> Result<Self, Self::Error> {
        let light = required(state.light_on, "State", "light_on")?;
        let lights_on = match wire::LightState::try_from(light) {
            Ok(wire::LightState::On) => true,
            Ok(wire::LightState::Off) => false,
            Err(_) => return Err(malformed(format!("unknown light code {light}"))),
        };

        let lock = required(state.door_lock, "State", "door_lock")?;
        let door_locked = match wire::DoorLockState::try_from(lock) {
            Ok(wire::DoorLockState::Closed) => true,
            Ok(wire::DoorLockState::Open) => false,
            Err(_) => return Err(malformed(format!("unknown door lock code {lock}"))),
        };

        Ok(Self {
            lights_on,
            door_locked,
            channel1: channel_on(required(state.channel_1, "State", "channel_1")?)?,
            channel2: channel_on(required(state.channel_2, "State", "channel_2")?)?,
            temperature: required(state.temperature, "State", "temperature")?,
            humidity: required(state.humidity, "State", "humidity")?,
            pressure: required(state.pressure, "State", "pressure")?,
        })
    }
}

fn channel_code(on: bool) -> i32 {
    let code = if on {
        wire::ChannelState::ChannelOn
    } else {
        wire::ChannelState::ChannelOff
    };
    code as i32
}

fn channel_on(code: i32) -> Result<bool, ParseError> {
    match wire::ChannelState::try_from(code) {
        Ok(wire::ChannelState::ChannelOn) => Ok(true),
        Ok(wire::ChannelState::ChannelOff) => Ok(false),
        Err(_) => Err(malformed(format!("unknown channel code {code}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_frame(state: wire::State) -> Vec<u8> {
        wire::ControllerResponse {
            response: Some(controller_response::Response::State(state)),
        }
        .encode_length_delimited_to_vec()
    }

    #[test]
    fn commands_round_trip() {
        let mut commands = vec![Command::GetInfo, Command::GetState];
        commands.extend(SetTarget::ALL.into_iter().map(Command::SetState));

        for command in commands {
            let bytes = encode_command(&command);
            assert_eq!(decode_command(&bytes).unwrap(), command);
        }
    }

    #[test]
    fn responses_reencode_identically() {
        let replies = [
            Response::Info(ControllerInfo::new(
                "192.168.1.100",
                "12:34:56:78:90:AB",
                "Room_101",
                "mock_token_123",
            )),
            Response::State(DeviceState::default().with_sensors(21.5, 48.25, 1009.75)),
            Response::Status(Status::Ok),
            Response::Status(Status::Error),
        ];

        for reply in replies {
            let bytes = encode_response(&reply);
            let decoded = decode_response(&bytes).unwrap();
            assert_eq!(decoded, reply);
            assert_eq!(encode_response(&decoded), bytes);
        }
    }

    #[test]
    fn missing_pressure_is_malformed() {
        let mut state = wire::State::from(&DeviceState::default());
        state.pressure = None;

        let err = decode_response(&state_frame(state)).unwrap_err();
        assert!(matches!(err, ParseError::MalformedMessage(ref m) if m.contains("pressure")));
    }

    #[test]
    fn unknown_enum_code_is_malformed() {
        let mut state = wire::State::from(&DeviceState::default());
        state.door_lock = Some(7);

        let err = decode_response(&state_frame(state)).unwrap_err();
        assert!(matches!(err, ParseError::MalformedMessage(_)));
    }

    #[test]
    fn unknown_status_code_is_malformed() {
        let bytes = wire::ControllerResponse {
            response: Some(controller_response::Response::Status(2)),
        }
        .encode_length_delimited_to_vec();

        assert!(matches!(
            decode_response(&bytes),
            Err(ParseError::MalformedMessage(_))
        ));
    }

    #[test]
    fn unknown_set_target_is_malformed() {
        let bytes = wire::ClientMessage {
            msg: Some(client_message::Msg::SetState(wire::SetState { state: Some(42) })),
        }
        .encode_length_delimited_to_vec();

        assert!(matches!(
            decode_command(&bytes),
            Err(ParseError::MalformedMessage(_))
        ));
    }

    #[test]
    fn empty_envelope_is_malformed() {
        let bytes = wire::ControllerResponse { response: None }.encode_length_delimited_to_vec();
        assert!(matches!(
            decode_response(&bytes),
            Err(ParseError::MalformedMessage(_))
        ));
    }

    #[test]
    fn info_missing_token_is_malformed() {
        let mut info = wire::Info::from(&ControllerInfo::new("a", "b", "c", "d"));
        info.token = None;
        let bytes = wire::ControllerResponse {
            response: Some(controller_response::Response::Info(info)),
        }
        .encode_length_delimited_to_vec();

        let err = decode_response(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::MalformedMessage(ref m) if m.contains("token")));
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let mut bytes = encode_response(&Response::Status(Status::Ok));
        bytes.push(0x00);
        assert!(matches!(
            decode_response(&bytes),
            Err(ParseError::MalformedMessage(_))
        ));
    }

    #[test]
    fn truncated_frame_is_malformed() {
        let bytes = encode_response(&Response::State(DeviceState::default()));
        assert!(matches!(
            decode_response(&bytes[..bytes.len() - 1]),
            Err(ParseError::MalformedMessage(_))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(decode_response(&[0x03, 0xff, 0xff, 0xff]).is_err());
        assert!(decode_response(&[]).is_err());
    }

    #[test]
    fn frame_len_waits_for_complete_prefix() {
        assert_eq!(frame_len(&[]).unwrap(), None);
        assert_eq!(frame_len(&[0x80]).unwrap(), None);
        assert_eq!(frame_len(&[0x05]).unwrap(), Some(5));
        assert_eq!(frame_len(&[0xac, 0x02]).unwrap(), Some(300));
        assert!(frame_len(&[0xff; MAX_PREFIX_LEN]).is_err());
    }

    #[test]
    fn encoded_length_matches_prefix() {
        let bytes = encode_command(&Command::SetState(SetTarget::Channel1On));
        let len = frame_len(&bytes[..1]).unwrap().unwrap();
        assert_eq!(len + 1, bytes.len());
    }
}
