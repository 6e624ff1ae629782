//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use ipnetwork::Ipv6Network;
use rove_utils::srv6::Behavior;
use tracing::{debug, debug_span};

use crate::adjacency::AdjacencyState;
use crate::packet::SystemId;

// IS-IS debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    AdjacencyCreate(&'a SystemId),
    AdjacencyDelete(&'a SystemId),
    AdjacencyStateChange(&'a SystemId, AdjacencyState),
    AdjSidCreate(&'a Ipv6Addr, &'a Behavior),
    AdjSidDelete(&'a Ipv6Addr),
    EndSidCreate(&'a Ipv6Addr, &'a Behavior),
    EndSidDelete(&'a Ipv6Addr),
    LocatorChunkAdd(&'a str, &'a Ipv6Network),
    LocatorChunkDel(&'a str),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Logs the message in decreasing level of importance.
    pub(crate) fn log(&self) {
        match self {
            Debug::AdjacencyCreate(system_id)
            | Debug::AdjacencyDelete(system_id) => {
                debug_span!("adjacency").in_scope(|| {
                    debug!(%system_id, "{}", self);
                });
            }
            Debug::AdjacencyStateChange(system_id, state) => {
                debug_span!("adjacency").in_scope(|| {
                    debug!(%system_id, ?state, "{}", self);
                });
            }
            Debug::AdjSidCreate(sid, behavior)
            | Debug::EndSidCreate(sid, behavior) => {
                debug_span!("srv6").in_scope(|| {
                    debug!(%sid, %behavior, "{}", self);
                });
            }
            Debug::AdjSidDelete(sid) | Debug::EndSidDelete(sid) => {
                debug_span!("srv6").in_scope(|| {
                    debug!(%sid, "{}", self);
                });
            }
            Debug::LocatorChunkAdd(locator, chunk) => {
                debug_span!("srv6").in_scope(|| {
                    debug!(%locator, %chunk, "{}", self);
                });
            }
            Debug::LocatorChunkDel(locator) => {
                debug_span!("srv6").in_scope(|| {
                    debug!(%locator, "{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::AdjacencyCreate(..) => {
                write!(f, "adjacency created")
            }
            Debug::AdjacencyDelete(..) => {
                write!(f, "adjacency deleted")
            }
            Debug::AdjacencyStateChange(..) => {
                write!(f, "adjacency state change")
            }
            Debug::AdjSidCreate(..) => {
                write!(f, "adjacency SID created")
            }
            Debug::AdjSidDelete(..) => {
                write!(f, "adjacency SID deleted")
            }
            Debug::EndSidCreate(..) => {
                write!(f, "End SID created")
            }
            Debug::EndSidDelete(..) => {
                write!(f, "End SID deleted")
            }
            Debug::LocatorChunkAdd(..) => {
                write!(f, "locator chunk added")
            }
            Debug::LocatorChunkDel(..) => {
                write!(f, "locator chunk released")
            }
        }
    }
}
