// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Backend selection at construction time.

use serde::Deserialize;

use crate::error::Result;
use crate::protocol::ControllerConfig;
#[cfg(feature = "simulator")]
use crate::simulator::{SimulatedController, SimulatorConfig};
use crate::state::{DeviceState, PartialStateUpdate};
use crate::types::ControllerInfo;

use super::{Controller, ControllerClient};

/// Which controller implementation to build.
///
/// # Examples
///
/// ```
/// use roomctl_lib::controller::ControllerBackend;
///
/// let backend: ControllerBackend = serde_json::from_str(
///     r#"{"kind": "remote", "host": "10.0.4.12", "port": 7000}"#,
/// ).unwrap();
/// assert!(matches!(backend, ControllerBackend::Remote(_)));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControllerBackend {
    /// Hardware reached over TCP.
    Remote(ControllerConfig),
    /// In-memory simulator.
    #[cfg(feature = "simulator")]
    Simulated(SimulatorConfig),
}

/// A controller handle whose backend was chosen at construction.
#[derive(Debug)]
pub enum AnyController {
    /// Hardware reached over TCP.
    Remote(ControllerClient),
    /// In-memory simulator.
    #[cfg(feature = "simulator")]
    Simulated(SimulatedController),
}

impl AnyController {
    /// Builds the controller described by `backend`.
    ///
    /// No connection is made; a remote controller connects on first use.
    #[must_use]
    pub fn from_backend(backend: ControllerBackend) -> Self {
        match backend {
            ControllerBackend::Remote(config) => {
                tracing::debug!(address = %config.address(), "Using remote room controller");
                Self::Remote(ControllerClient::new(config))
            }
            #[cfg(feature = "simulator")]
            ControllerBackend::Simulated(config) => {
                tracing::debug!("Using simulated room controller");
                Self::Simulated(SimulatedController::new(config))
            }
        }
    }
}

impl From<ControllerClient> for AnyController {
    fn from(client: ControllerClient) -> Self {
        Self::Remote(client)
    }
}

#[cfg(feature = "simulator")]
impl From<SimulatedController> for AnyController {
    fn from(simulator: SimulatedController) -> Self {
        Self::Simulated(simulator)
    }
}

impl Controller for AnyController {
    async fn get_info(&self) -> Result<ControllerInfo> {
        match self {
            Self::Remote(c) => c.get_info().await,
            #[cfg(feature = "simulator")]
            Self::Simulated(c) => c.get_info().await,
        }
    }

    async fn get_state(&self) -> Result<DeviceState> {
        match self {
            Self::Remote(c) => c.get_state().await,
            #[cfg(feature = "simulator")]
            Self::Simulated(c) => c.get_state().await,
        }
    }

    async fn set_state(&self, update: &PartialStateUpdate) -> Result<DeviceState> {
        match self {
            Self::Remote(c) => c.set_state(update).await,
            #[cfg(feature = "simulator")]
            Self::Simulated(c) => c.set_state(update).await,
        }
    }
}
