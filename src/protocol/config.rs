// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection parameters for a room controller endpoint.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for a TCP room controller.
///
/// # Examples
///
/// ```
/// use roomctl_lib::protocol::ControllerConfig;
/// use std::time::Duration;
///
/// // Defaults: port 7000, 5 second timeouts
/// let config = ControllerConfig::new("192.168.1.100");
/// assert_eq!(config.address(), "192.168.1.100:7000");
///
/// // With all options
/// let config = ControllerConfig::new("10.0.4.12")
///     .with_port(7100)
///     .with_connect_timeout(Duration::from_secs(2))
///     .with_response_timeout(Duration::from_millis(1500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    host: String,
    port: u16,
    #[serde(rename = "connect_timeout_ms", with = "duration_ms")]
    connect_timeout: Duration,
    #[serde(rename = "response_timeout_ms", with = "duration_ms")]
    response_timeout: Duration,
}

impl ControllerConfig {
    /// Default controller host.
    pub const DEFAULT_HOST: &'static str = "192.168.1.100";
    /// Default controller port.
    pub const DEFAULT_PORT: u16 = 7000;
    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    /// Default response timeout.
    pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a configuration for the specified host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            response_timeout: Self::DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the timeout for each reply.
    #[must_use]
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the response timeout.
    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Returns `host:port`, bracketing IPv6 literals.
    #[must_use]
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOST)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
