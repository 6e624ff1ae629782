//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

use crate::fpm::netlink::EncodeError;

// Broker errors.
#[derive(Debug)]
pub enum Error {
    // Configuration
    LocatorNotFound(String),
    LocatorBitLengths(String),
    InvalidSidStructure(rove_utils::srv6::Error),
    InterfaceNotFound(String),
    // FPM mirroring
    FpmEncode(EncodeError),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::LocatorNotFound(name)
            | Error::LocatorBitLengths(name) => {
                warn!(%name, "{}", self);
            }
            Error::InvalidSidStructure(error) => {
                warn!(%error, "{}", self);
            }
            Error::InterfaceNotFound(name) => {
                warn!(%name, "{}", self);
            }
            Error::FpmEncode(error) => {
                warn!(%error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::LocatorNotFound(..) => {
                write!(f, "locator not found")
            }
            Error::LocatorBitLengths(..) => {
                write!(
                    f,
                    "block and node lengths must add up to the locator prefix length"
                )
            }
            Error::InvalidSidStructure(..) => {
                write!(f, "invalid SID structure")
            }
            Error::InterfaceNotFound(..) => {
                write!(f, "interface not found")
            }
            Error::FpmEncode(..) => {
                write!(f, "failed to encode FPM message")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidSidStructure(error) => Some(error),
            Error::FpmEncode(error) => Some(error),
            _ => None,
        }
    }
}
