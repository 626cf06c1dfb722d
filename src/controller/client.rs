// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Network-backed controller client.

use tokio::sync::Mutex;

use crate::command::{Command, SetTarget};
use crate::error::{DeviceError, Error, Result};
use crate::protocol::{ControllerConfig, TransportSession, codec};
use crate::response::{Response, Status};
use crate::state::{DeviceState, PartialStateUpdate};
use crate::types::ControllerInfo;

use super::Controller;

/// Controller reached over a TCP [`TransportSession`].
///
/// The client holds at most one session and serializes every operation
/// through it, so requests are never interleaved. A `set_state` call holds
/// the session for its whole sequence of round trips.
///
/// The session is opened lazily and dropped after any failure that leaves
/// it unusable (timeout, closed peer, malformed reply). The next call opens
/// a fresh one; retrying is up to the caller.
#[derive(Debug)]
pub struct ControllerClient {
    config: ControllerConfig,
    link: Mutex<Link>,
}

#[derive(Debug, Default)]
struct Link {
    session: Option<TransportSession>,
    info: Option<ControllerInfo>,
}

impl ControllerClient {
    /// Creates a client; no connection is made until the first call.
    #[must_use]
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            link: Mutex::new(Link::default()),
        }
    }

    /// Creates a client and opens its session immediately.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::ConnectionFailed` if the controller cannot be
    /// reached.
    pub async fn connect(config: ControllerConfig) -> Result<Self> {
        let client = Self::new(config);
        {
            let mut link = client.link.lock().await;
            client.session(&mut link).await?;
        }
        Ok(client)
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Returns the identity cached by the last `get_info` on the current
    /// session.
    pub async fn session_info(&self) -> Option<ControllerInfo> {
        self.link.lock().await.info.clone()
    }

    /// Returns `true` if a session is currently open.
    pub async fn is_connected(&self) -> bool {
        match &self.link.lock().await.session {
            Some(session) => session.is_open().await,
            None => false,
        }
    }

    /// Closes the current session, if any.
    pub async fn disconnect(&self) {
        let mut link = self.link.lock().await;
        if let Some(session) = link.session.take() {
            session.close().await;
        }
        link.info = None;
    }

    async fn session<'a>(&self, link: &'a mut Link) -> Result<&'a TransportSession> {
        let session = match link.session.take() {
            Some(session) => session,
            None => {
                let session =
                    TransportSession::open(self.config.address(), self.config.connect_timeout())
                        .await?;
                link.info = None;
                session
            }
        };
        Ok(&*link.session.insert(session))
    }

    async fn request(&self, link: &mut Link, command: Command) -> Result<Response> {
        tracing::debug!(address = %self.config.address(), command = %command, "Sending controller command");

        let request = codec::encode_command(&command);
        let session = self.session(link).await?;
        let outcome = match session
            .round_trip(&request, self.config.response_timeout())
            .await
        {
            Ok(reply) => codec::decode_response(&reply).map_err(Error::from),
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(response) => {
                tracing::debug!(reply = response.tag(), "Received controller reply");
                Ok(response)
            }
            Err(e) => {
                Self::drop_session(link).await;
                Err(e)
            }
        }
    }

    async fn drop_session(link: &mut Link) {
        if let Some(session) = link.session.take() {
            session.close().await;
        }
        link.info = None;
    }

    async fn fetch_state(&self, link: &mut Link) -> Result<DeviceState> {
        Ok(self.request(link, Command::GetState).await?.into_state()?)
    }

    async fn set_target(&self, link: &mut Link, target: SetTarget) -> Result<()> {
        let status = self
            .request(link, Command::SetState(target))
            .await?
            .into_status()?;
        match status {
            Status::Ok => Ok(()),
            Status::Error => Err(DeviceError::CommandRejected(target.to_string()).into()),
        }
    }
}

impl Controller for ControllerClient {
    async fn get_info(&self) -> Result<ControllerInfo> {
        let mut link = self.link.lock().await;
        let info = self.request(&mut link, Command::GetInfo).await?.into_info()?;
        link.info = Some(info.clone());
        Ok(info)
    }

    async fn get_state(&self) -> Result<DeviceState> {
        let mut link = self.link.lock().await;
        self.fetch_state(&mut link).await
    }

    async fn set_state(&self, update: &PartialStateUpdate) -> Result<DeviceState> {
        let mut link = self.link.lock().await;
        let mut applied = Vec::with_capacity(update.len());

        for (field, value) in update.iter() {
            let target = field.target(value);
            if let Err(source) = self.set_target(&mut link, target).await {
                tracing::warn!(field = %field, target = %target, applied = ?applied, error = %source, "State update stopped");
                return Err(Error::PartialUpdate {
                    field,
                    applied,
                    source: Box::new(source),
                });
            }
            applied.push(field);
        }

        match self.fetch_state(&mut link).await {
            Ok(state) => Ok(state),
            Err(source) if !applied.is_empty() => {
                tracing::warn!(applied = ?applied, error = %source, "State read after update failed");
                Err(Error::FinalReadFailed {
                    applied,
                    source: Box::new(source),
                })
            }
            Err(source) => Err(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    use super::*;
    use crate::error::ProtocolError;
    use crate::protocol::transport::read_frame;
    use crate::state::StateField;

    /// Peer that acknowledges every `SetState` and hangs up on `GetState`.
    async fn acks_then_hangs_up() -> ControllerConfig {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            while let Ok(frame) = read_frame(&mut socket).await {
                match codec::decode_command(&frame).unwrap() {
                    Command::SetState(_) => {
                        let reply = codec::encode_response(&Response::Status(Status::Ok));
                        socket.write_all(&reply).await.unwrap();
                    }
                    _ => break,
                }
            }
        });
        ControllerConfig::new(addr.ip().to_string())
            .with_port(addr.port())
            .with_response_timeout(Duration::from_secs(2))
    }

    #[tokio::test]
    async fn failed_final_read_reports_applied_fields() {
        let client = ControllerClient::new(acks_then_hangs_up().await);
        let update = PartialStateUpdate::new()
            .with(StateField::LightsOn, true)
            .with(StateField::Channel1, true);

        let err = client.set_state(&update).await.unwrap_err();
        match &err {
            Error::FinalReadFailed { applied, source } => {
                assert_eq!(applied, &vec![StateField::LightsOn, StateField::Channel1]);
                assert!(matches!(
                    **source,
                    Error::Protocol(ProtocolError::ConnectionClosed)
                ));
            }
            other => panic!("expected final read failure, got {other:?}"),
        }
        assert!(err.is_transport());
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn failed_final_read_still_reconciles_record() {
        let client = ControllerClient::new(acks_then_hangs_up().await);
        let now = chrono::Utc::now();
        let mut record = crate::reconcile::RoomStateRecord::new("room-101", "101", now);
        let command = crate::control::ControlCommand::SetState {
            state: Some(PartialStateUpdate::new().with(StateField::LightsOn, true)),
        };

        let err = crate::control::execute(&client, &mut record, &command, now)
            .await
            .unwrap_err();
        assert_eq!(err.applied_fields(), &[StateField::LightsOn]);
        assert!(record.state.lights_on);
    }

    #[tokio::test]
    async fn empty_update_read_failure_is_plain() {
        let client = ControllerClient::new(acks_then_hangs_up().await);
        let err = client
            .set_state(&PartialStateUpdate::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::ConnectionClosed)));
    }
}
