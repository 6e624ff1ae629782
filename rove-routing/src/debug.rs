//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use ipnetwork::Ipv6Network;
use rove_utils::protocol::Protocol;
use tracing::{debug, debug_span};

// Broker debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    LocatorCreate(&'a str, &'a Ipv6Network),
    LocatorDelete(&'a str),
    ChunkAlloc(&'a str, &'a Ipv6Network, &'a Protocol),
    ChunkRelease(&'a str, &'a Protocol),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Logs the message in decreasing level of importance.
    pub(crate) fn log(&self) {
        match self {
            Debug::LocatorCreate(name, prefix) => {
                debug_span!("srv6").in_scope(|| {
                    debug!(%name, %prefix, "{}", self);
                });
            }
            Debug::LocatorDelete(name) => {
                debug_span!("srv6").in_scope(|| {
                    debug!(%name, "{}", self);
                });
            }
            Debug::ChunkAlloc(name, prefix, proto) => {
                debug_span!("srv6").in_scope(|| {
                    debug!(%name, %prefix, %proto, "{}", self);
                });
            }
            Debug::ChunkRelease(name, proto) => {
                debug_span!("srv6").in_scope(|| {
                    debug!(%name, %proto, "{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::LocatorCreate(..) => {
                write!(f, "locator created")
            }
            Debug::LocatorDelete(..) => {
                write!(f, "locator deleted")
            }
            Debug::ChunkAlloc(..) => {
                write!(f, "locator chunk allocated")
            }
            Debug::ChunkRelease(..) => {
                write!(f, "locator chunk released")
            }
        }
    }
}
