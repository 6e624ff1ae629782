//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use rove_utils::srv6::Behavior;
use tracing::{debug, debug_span};

// Static daemon debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    SidCreate(&'a Ipv6Addr, &'a Behavior),
    SidDelete(&'a Ipv6Addr),
    SidValidityChange(&'a Ipv6Addr, bool),
    SidInstall(&'a Ipv6Addr, &'a Behavior, u32),
    SidUninstall(&'a Ipv6Addr),
    SidNoInterface(&'a Ipv6Addr),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Logs the message in decreasing level of importance.
    pub(crate) fn log(&self) {
        match self {
            Debug::SidCreate(addr, behavior) => {
                debug_span!("sid").in_scope(|| {
                    debug!(%addr, %behavior, "{}", self);
                });
            }
            Debug::SidDelete(addr) | Debug::SidUninstall(addr) => {
                debug_span!("sid").in_scope(|| {
                    debug!(%addr, "{}", self);
                });
            }
            Debug::SidValidityChange(addr, valid) => {
                debug_span!("sid").in_scope(|| {
                    debug!(%addr, %valid, "{}", self);
                });
            }
            Debug::SidInstall(addr, behavior, oif) => {
                debug_span!("sid").in_scope(|| {
                    debug!(%addr, %behavior, %oif, "{}", self);
                });
            }
            Debug::SidNoInterface(addr) => {
                debug_span!("sid").in_scope(|| {
                    debug!(%addr, "{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::SidCreate(..) => {
                write!(f, "SID created")
            }
            Debug::SidDelete(..) => {
                write!(f, "SID deleted")
            }
            Debug::SidValidityChange(..) => {
                write!(f, "SID validity changed")
            }
            Debug::SidInstall(..) => {
                write!(f, "installing SID")
            }
            Debug::SidUninstall(..) => {
                write!(f, "uninstalling SID")
            }
            Debug::SidNoInterface(..) => {
                write!(f, "no usable outgoing interface, SID not installed")
            }
        }
    }
}
