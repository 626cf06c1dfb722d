// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TCP peer speaking the controller protocol.
//!
//! [`SimulatorServer`] accepts any number of connections and answers each
//! request from a shared [`SimulatedController`]. Faults can be injected to
//! exercise client error paths:
//!
//! - [`SimulatorServer::rejecting`]: answer `Status(Error)` for a target
//! - [`SimulatorServer::with_response_delay`]: hold every reply back
//! - [`SimulatorServer::with_raw_reply`]: answer every request with fixed bytes
//!
//! A request that does not decode closes its connection. Dropping the
//! server stops accepting and closes every open connection.
//!
//! # Examples
//!
//! ```no_run
//! use roomctl_lib::controller::{Controller, ControllerClient};
//! use roomctl_lib::simulator::server::SimulatorServer;
//! use roomctl_lib::simulator::{SimulatedController, SimulatorConfig};
//!
//! # async fn example() -> roomctl_lib::Result<()> {
//! let server = SimulatorServer::start(SimulatedController::new(SimulatorConfig::default())).await?;
//! let client = ControllerClient::new(server.controller_config());
//!
//! let state = client.get_state().await?;
//! println!("{:.1} °C", state.temperature);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::task::{JoinHandle, JoinSet};

use crate::command::{Command, SetTarget};
use crate::error::ProtocolError;
use crate::protocol::transport::read_frame;
use crate::protocol::{ControllerConfig, codec};
use crate::response::{Response, Status};

use super::SimulatedController;

/// A simulated controller reachable over TCP.
#[derive(Debug)]
pub struct SimulatorServer {
    local_addr: SocketAddr,
    shared: Arc<Shared>,
    accept_task: JoinHandle<()>,
}

#[derive(Debug)]
struct Shared {
    controller: SimulatedController,
    faults: Mutex<Faults>,
    received: Mutex<Vec<Command>>,
    connections: AtomicUsize,
}

#[derive(Debug, Default, Clone)]
struct Faults {
    rejected: HashSet<SetTarget>,
    response_delay: Option<Duration>,
    raw_reply: Option<Vec<u8>>,
}

impl SimulatorServer {
    /// Serves `controller` on an ephemeral loopback port.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Io` if the listener cannot be bound.
    pub async fn start(controller: SimulatedController) -> Result<Self, ProtocolError> {
        Self::bind("127.0.0.1:0", controller).await
    }

    /// Serves `controller` on `address`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Io` if the listener cannot be bound.
    pub async fn bind(
        address: impl ToSocketAddrs,
        controller: SimulatedController,
    ) -> Result<Self, ProtocolError> {
        let listener = TcpListener::bind(address).await?;
        let local_addr = listener.local_addr()?;
        let shared = Arc::new(Shared {
            controller,
            faults: Mutex::new(Faults::default()),
            received: Mutex::new(Vec::new()),
            connections: AtomicUsize::new(0),
        });

        tracing::debug!(address = %local_addr, "Simulator server listening");
        let accept_task = tokio::spawn(accept_loop(listener, Arc::clone(&shared)));

        Ok(Self {
            local_addr,
            shared,
            accept_task,
        })
    }

    /// Answers `Status(Error)` whenever `target` is requested.
    #[must_use]
    pub fn rejecting(self, target: SetTarget) -> Self {
        self.shared.faults.lock().rejected.insert(target);
        self
    }

    /// Delays every reply by `delay`.
    #[must_use]
    pub fn with_response_delay(self, delay: Duration) -> Self {
        self.set_response_delay(Some(delay));
        self
    }

    /// Answers every request with `bytes` instead of a real reply.
    #[must_use]
    pub fn with_raw_reply(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.set_raw_reply(Some(bytes.into()));
        self
    }

    /// Changes the reply delay of a running server.
    pub fn set_response_delay(&self, delay: Option<Duration>) {
        self.shared.faults.lock().response_delay = delay;
    }

    /// Changes the fixed reply of a running server.
    pub fn set_raw_reply(&self, bytes: Option<Vec<u8>>) {
        self.shared.faults.lock().raw_reply = bytes;
    }

    /// Removes every injected fault.
    pub fn clear_faults(&self) {
        *self.shared.faults.lock() = Faults::default();
    }

    /// Returns the bound address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns a client configuration pointing at this server.
    #[must_use]
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::new(self.local_addr.ip().to_string()).with_port(self.local_addr.port())
    }

    /// Returns the simulator answering requests.
    #[must_use]
    pub fn controller(&self) -> &SimulatedController {
        &self.shared.controller
    }

    /// Returns every command received so far, in arrival order.
    #[must_use]
    pub fn received(&self) -> Vec<Command> {
        self.shared.received.lock().clone()
    }

    /// Returns the number of connections accepted so far.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }
}

impl Drop for SimulatorServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    // Dropped together with the accept task, which aborts every connection.
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    shared.connections.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!(peer = %peer, "Simulator accepted connection");
                    connections.spawn(serve(stream, Arc::clone(&shared)));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Simulator failed to accept connection");
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }
}

async fn serve(mut stream: TcpStream, shared: Arc<Shared>) {
    loop {
        let frame = match read_frame(&mut stream).await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "Simulator connection ended");
                return;
            }
        };

        let command = match codec::decode_command(&frame) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(error = %e, "Simulator received malformed request, closing");
                return;
            }
        };
        tracing::trace!(command = %command, "Simulator received command");
        shared.received.lock().push(command);

        let faults = shared.faults.lock().clone();
        let reply = match faults.raw_reply {
            Some(bytes) => bytes,
            None => codec::encode_response(&answer(&shared.controller, &faults.rejected, command)),
        };

        if let Some(delay) = faults.response_delay {
            tokio::time::sleep(delay).await;
        }
        if let Err(e) = stream.write_all(&reply).await {
            tracing::debug!(error = %e, "Simulator failed to send reply");
            return;
        }
    }
}

fn answer(
    controller: &SimulatedController,
    rejected: &HashSet<SetTarget>,
    command: Command,
) -> Response {
    match command {
        Command::GetInfo => Response::Info(controller.info().clone()),
        Command::GetState => Response::State(controller.sample()),
        Command::SetState(target) if rejected.contains(&target) => Response::Status(Status::Error),
        Command::SetState(target) => {
            controller.apply_target(target);
            Response::Status(Status::Ok)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TransportSession;
    use crate::simulator::SimulatorConfig;

    async fn started() -> SimulatorServer {
        SimulatorServer::start(SimulatedController::new(SimulatorConfig::default().with_seed(4)))
            .await
            .unwrap()
    }

    async fn ask(server: &SimulatorServer, command: Command) -> Response {
        let session = TransportSession::open(server.local_addr().to_string(), Duration::from_secs(1))
            .await
            .unwrap();
        let reply = session
            .round_trip(&codec::encode_command(&command), Duration::from_secs(1))
            .await
            .unwrap();
        codec::decode_response(&reply).unwrap()
    }

    #[tokio::test]
    async fn answers_info() {
        let server = started().await;
        let info = ask(&server, Command::GetInfo).await.into_info().unwrap();
        assert_eq!(&info, server.controller().info());
        assert_eq!(server.received(), vec![Command::GetInfo]);
    }

    #[tokio::test]
    async fn set_state_changes_simulator() {
        let server = started().await;
        let status = ask(&server, Command::SetState(SetTarget::Channel1On))
            .await
            .into_status()
            .unwrap();
        assert!(status.is_ok());
        assert!(server.controller().snapshot().channel1);
    }

    #[tokio::test]
    async fn rejected_target_is_not_applied() {
        let server = started().await.rejecting(SetTarget::LightOn);
        let status = ask(&server, Command::SetState(SetTarget::LightOn))
            .await
            .into_status()
            .unwrap();
        assert_eq!(status, Status::Error);
        assert!(!server.controller().snapshot().lights_on);
    }

    #[tokio::test]
    async fn malformed_request_closes_connection() {
        let server = started().await;
        let session = TransportSession::open(server.local_addr().to_string(), Duration::from_secs(1))
            .await
            .unwrap();

        let result = session.round_trip(&[0x02, 0xff, 0xff], Duration::from_secs(1)).await;
        assert!(result.is_err());
        assert!(server.received().is_empty());
    }

    #[test]
    fn answer_follows_command() {
        let sim = SimulatedController::new(SimulatorConfig::default().with_seed(8));
        let none = HashSet::new();
        assert_eq!(answer(&sim, &none, Command::GetState).tag(), "State");
        assert_eq!(answer(&sim, &none, Command::GetInfo).tag(), "Info");
        assert_eq!(
            answer(&sim, &none, Command::SetState(SetTarget::Channel2On)),
            Response::Status(Status::Ok)
        );
    }
}
