// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller identity.

use serde::{Deserialize, Serialize};

/// Identity a controller reports for the current session.
///
/// The token is issued by the device on first contact and is only valid
/// for the session it was obtained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerInfo {
    /// Network address of the controller.
    pub ip: String,
    /// Hardware identifier.
    pub mac: String,
    /// Advertised short name.
    pub ble_name: String,
    /// Session token.
    pub token: String,
}

impl ControllerInfo {
    /// Creates controller info from its parts.
    #[must_use]
    pub fn new(
        ip: impl Into<String>,
        mac: impl Into<String>,
        ble_name: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            mac: mac.into(),
            ble_name: ble_name.into(),
            token: token.into(),
        }
    }
}
