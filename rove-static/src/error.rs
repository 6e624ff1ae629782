//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use rove_utils::ibus::SendError;
use tracing::warn;

// Static daemon errors.
#[derive(Debug)]
pub enum Error {
    // Configuration
    SidNotFound(Ipv6Addr),
    // Broker communication
    BrokerSend(SendError),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::SidNotFound(addr) => {
                warn!(%addr, "{}", self);
            }
            Error::BrokerSend(error) => {
                warn!(%error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::SidNotFound(..) => {
                write!(f, "SID not found")
            }
            Error::BrokerSend(..) => {
                write!(f, "failed to send request to the broker")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::BrokerSend(error) => Some(error),
            _ => None,
        }
    }
}
