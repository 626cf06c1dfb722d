// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `roomctl` Lib - A Rust client for hotel room controllers.
//!
//! This library talks to room-automation hardware over TCP using a small
//! length-delimited protobuf protocol, and keeps the application's copy of
//! each room's device state in line with what the hardware reports.
//!
//! # Supported Features
//!
//! - **Controller client**: `get_info`, `get_state` and `set_state` over one
//!   TCP session per room, strictly one request at a time
//! - **Partial updates**: sparse field changes applied as a sequence of
//!   single-target commands, stopping at the first failure
//! - **Simulator**: an in-memory controller with bounded sensor drift, and a
//!   TCP server wrapping it (feature `simulator`, on by default)
//! - **Reconciliation**: merging controller results into persisted
//!   room-state records
//!
//! # Quick Start
//!
//! ## Hardware Controller
//!
//! ```no_run
//! use roomctl_lib::{Controller, ControllerClient, ControllerConfig};
//! use roomctl_lib::state::{PartialStateUpdate, StateField};
//!
//! #[tokio::main]
//! async fn main() -> roomctl_lib::Result<()> {
//!     let client = ControllerClient::new(ControllerConfig::new("192.168.1.100"));
//!
//!     let state = client.get_state().await?;
//!     println!("{:.1} °C, door locked: {}", state.temperature, state.door_locked);
//!
//!     client
//!         .set_state(&PartialStateUpdate::new().with(StateField::LightsOn, true))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Backend Chosen by Configuration
//!
//! ```no_run
//! use chrono::Utc;
//! use roomctl_lib::control::{ControlCommand, execute};
//! use roomctl_lib::reconcile::RoomStateRecord;
//! use roomctl_lib::{AnyController, ControllerBackend};
//!
//! #[tokio::main]
//! async fn main() -> roomctl_lib::Result<()> {
//!     let backend: ControllerBackend =
//!         serde_json::from_str(r#"{"kind": "simulated", "seed": 1}"#).unwrap();
//!     let controller = AnyController::from_backend(backend);
//!
//!     let mut record = RoomStateRecord::new("room-101", "101", Utc::now());
//!     let outcome = execute(&controller, &mut record, &ControlCommand::GetState, Utc::now()).await?;
//!     println!("{}", serde_json::to_string(&outcome).unwrap());
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod control;
pub mod controller;
pub mod error;
pub mod protocol;
pub mod reconcile;
pub mod response;
#[cfg(feature = "simulator")]
pub mod simulator;
pub mod state;
pub mod types;

pub use command::{Command, SetTarget};
pub use controller::{AnyController, Controller, ControllerBackend, ControllerClient};
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, ValueError};
pub use protocol::{ControllerConfig, TransportSession};
pub use reconcile::RoomStateRecord;
pub use response::{Response, Status};
#[cfg(feature = "simulator")]
pub use simulator::{SimulatedController, SimulatorConfig};
pub use state::{DeviceState, PartialStateUpdate, StateField};
pub use types::{ControllerInfo, SensorEnvelope, SensorRange};
