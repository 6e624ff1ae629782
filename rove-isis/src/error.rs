//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use rove_utils::ibus::SendError;
use tracing::warn;

// IS-IS errors.
#[derive(Debug)]
pub enum Error {
    // Configuration
    InterfaceNotFound(String),
    // Segment Routing
    SidAllocationFailed(String),
    // Broker communication
    BrokerSend(SendError),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::InterfaceNotFound(name) => {
                warn!(%name, "{}", self);
            }
            Error::SidAllocationFailed(locator) => {
                warn!(%locator, "{}", self);
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
            Error::InterfaceNotFound(..) => {
                write!(f, "interface not found")
            }
            Error::SidAllocationFailed(..) => {
                write!(f, "failed to allocate SRv6 SID")
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
