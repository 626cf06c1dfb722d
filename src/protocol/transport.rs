// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TCP transport session to a room controller.
//!
//! A [`TransportSession`] owns one TCP connection and enforces the
//! half-duplex discipline of the protocol: one request, then one reply,
//! never two requests in flight. The protocol has no request identifiers,
//! so a session that timed out or saw a broken frame can no longer tell
//! which reply belongs to which request. Such a session closes itself and
//! must be reopened.
//!
//! Nothing here retries.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout, timeout_at};

use crate::error::{ParseError, ProtocolError};

use super::codec::{self, MAX_FRAME_LEN};

/// Failure of a single round trip.
#[derive(Debug, thiserror::Error)]
pub enum RoundTripError {
    /// The link failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The reply could not be framed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<RoundTripError> for crate::Error {
    fn from(err: RoundTripError) -> Self {
        match err {
            RoundTripError::Protocol(e) => Self::Protocol(e),
            RoundTripError::Parse(e) => Self::Parse(e),
        }
    }
}

/// One TCP connection to a controller endpoint.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use roomctl_lib::command::Command;
/// use roomctl_lib::protocol::{TransportSession, codec};
///
/// # async fn example() -> roomctl_lib::Result<()> {
/// let session = TransportSession::open("192.168.1.100:7000", Duration::from_secs(5)).await?;
/// let reply = session
///     .round_trip(&codec::encode_command(&Command::GetState), Duration::from_secs(5))
///     .await?;
/// let state = codec::decode_response(&reply)?.into_state()?;
/// session.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TransportSession {
    address: String,
    stream: Mutex<Option<TcpStream>>,
}

impl TransportSession {
    /// Connects to a controller.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::ConnectionFailed` if the endpoint refuses the
    /// connection, cannot be resolved, or does not answer within
    /// `connect_timeout`.
    pub async fn open(
        address: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, ProtocolError> {
        let address = address.into();
        tracing::debug!(address = %address, "Connecting to controller");

        let stream = match timeout(connect_timeout, TcpStream::connect(address.as_str())).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ProtocolError::ConnectionFailed {
                    address,
                    message: e.to_string(),
                });
            }
            Err(_) => {
                return Err(ProtocolError::ConnectionFailed {
                    address,
                    message: format!("no answer within {} ms", millis(connect_timeout)),
                });
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(error = %e, "Failed to disable Nagle on controller socket");
        }

        tracing::debug!(address = %address, "Connected to controller");
        Ok(Self {
            address,
            stream: Mutex::new(Some(stream)),
        })
    }

    /// Returns the address this session was opened against.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns `true` while the session still owns its socket.
    pub async fn is_open(&self) -> bool {
        self.stream.lock().await.is_some()
    }

    /// Sends one request frame and waits for one reply frame.
    ///
    /// The request is written in full, then the reply is read until one
    /// complete frame has arrived or `response_timeout` has elapsed. A zero
    /// timeout has expired by the time the request is written.
    ///
    /// On timeout, closed peer, or a broken frame, the session closes
    /// itself; later calls fail with `ConnectionClosed`.
    ///
    /// Overlapping calls are a caller bug. The second call is logged at
    /// `error` level and fails with `ConcurrentUseViolation` in every build;
    /// it does not panic, and the call in flight is left undisturbed.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::ConcurrentUseViolation` if another round trip is in flight
    /// - `ProtocolError::Timeout` if no complete reply arrived in time
    /// - `ProtocolError::ConnectionClosed` if the peer closed first, or the
    ///   session was already closed
    /// - `ProtocolError::FrameTooLarge` if the peer announces an oversized frame
    /// - `ParseError::MalformedMessage` if the length prefix is invalid
    pub async fn round_trip(
        &self,
        request: &[u8],
        response_timeout: Duration,
    ) -> Result<Vec<u8>, RoundTripError> {
        let Ok(mut guard) = self.stream.try_lock() else {
            tracing::error!(address = %self.address, "Round trip started while another is in flight");
            return Err(ProtocolError::ConcurrentUseViolation.into());
        };
        let stream = guard.as_mut().ok_or(ProtocolError::ConnectionClosed)?;

        let deadline = Instant::now() + response_timeout;
        let result = exchange(stream, request, deadline, response_timeout).await;

        if let Err(e) = &result {
            tracing::warn!(address = %self.address, error = %e, "Round trip failed, closing session");
            if let Some(mut stream) = guard.take() {
                let _ = stream.shutdown().await;
            }
        }
        result
    }

    /// Closes the session. Calling it again does nothing.
    pub async fn close(&self) {
        if let Some(mut stream) = self.stream.lock().await.take() {
            tracing::debug!(address = %self.address, "Closing controller session");
            let _ = stream.shutdown().await;
        }
    }
}

async fn exchange(
    stream: &mut TcpStream,
    request: &[u8],
    deadline: Instant,
    response_timeout: Duration,
) -> Result<Vec<u8>, RoundTripError> {
    let timed_out = || ProtocolError::Timeout(millis(response_timeout));

    tracing::trace!(bytes = request.len(), "Sending request frame");
    match timeout_at(deadline, stream.write_all(request)).await {
        Ok(result) => result.map_err(io_error)?,
        Err(_) => return Err(timed_out().into()),
    }

    if response_timeout.is_zero() {
        return Err(timed_out().into());
    }

    match timeout_at(deadline, read_frame(stream)).await {
        Ok(frame) => {
            let frame = frame?;
            tracing::trace!(bytes = frame.len(), "Received reply frame");
            Ok(frame)
        }
        Err(_) => Err(timed_out().into()),
    }
}

/// Reads one length-delimited frame, prefix included.
pub(crate) async fn read_frame(stream: &mut TcpStream) -> Result<Vec<u8>, RoundTripError> {
    let mut frame = Vec::with_capacity(64);

    let len = loop {
        let byte = stream.read_u8().await.map_err(io_error)?;
        frame.push(byte);
        if let Some(len) = codec::frame_len(&frame)? {
            break len;
        }
    };

    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_LEN,
        }
        .into());
    }

    let prefix_len = frame.len();
    frame.resize(prefix_len + len, 0);
    stream
        .read_exact(&mut frame[prefix_len..])
        .await
        .map_err(io_error)?;
    Ok(frame)
}

fn io_error(err: std::io::Error) -> ProtocolError {
    match err.kind() {
        std::io::ErrorKind::UnexpectedEof
        | std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::BrokenPipe => ProtocolError::ConnectionClosed,
        _ => ProtocolError::Io(err),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn millis(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}
