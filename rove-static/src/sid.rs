//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv6Addr;

use bitflags::bitflags;
use rove_utils::srv6::Behavior;
use serde::{Deserialize, Serialize};

// Operator-declared SRv6 local SID.
#[derive(Clone, Debug)]
pub struct StaticSid {
    pub addr: Ipv6Addr,
    pub behavior: Behavior,
    pub attrs: SidAttrs,
    pub flags: SidFlags,
    pub install_state: SidInstallState,
}

// Attributes shared by the SID behaviors; each behavior consumes the subset
// it requires.
#[derive(Clone, Debug, Default)]
#[derive(Deserialize, Serialize)]
pub struct SidAttrs {
    pub vrf_name: Option<String>,
    pub ifname: Option<String>,
    pub adj_v6: Option<Ipv6Addr>,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct SidFlags: u8 {
        // The SID is valid and can be programmed into the forwarding plane.
        const VALID = 0x01;
        // The SID has been handed to the broker.
        const SENT_TO_BROKER = 0x02;
    }
}

// Installation state as reported by the broker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum SidInstallState {
    Start,
    SentToBroker,
    Installed,
    NotInstalled,
}

// Table of static SIDs, keyed by address.
//
// Insertion order is preserved for the benefit of the configuration
// pretty-printer.
#[derive(Debug, Default)]
pub struct SidTable {
    entries: BTreeMap<Ipv6Addr, StaticSid>,
    order: Vec<Ipv6Addr>,
}

// ===== impl StaticSid =====

impl StaticSid {
    pub(crate) fn new(addr: Ipv6Addr, behavior: Behavior) -> StaticSid {
        StaticSid {
            addr,
            behavior,
            attrs: Default::default(),
            flags: SidFlags::empty(),
            install_state: SidInstallState::Start,
        }
    }
}

// ===== impl SidTable =====

impl SidTable {
    // Adds a SID descriptor to the table, returning a reference to the new
    // entry or to the preexisting one with the same address.
    pub(crate) fn insert(
        &mut self,
        addr: Ipv6Addr,
        behavior: Behavior,
    ) -> &mut StaticSid {
        self.entries.entry(addr).or_insert_with(|| {
            self.order.push(addr);
            StaticSid::new(addr, behavior)
        })
    }

    pub fn get(&self, addr: &Ipv6Addr) -> Option<&StaticSid> {
        self.entries.get(addr)
    }

    pub(crate) fn get_mut(&mut self, addr: &Ipv6Addr) -> Option<&mut StaticSid> {
        self.entries.get_mut(addr)
    }

    pub(crate) fn remove(&mut self, addr: &Ipv6Addr) -> Option<StaticSid> {
        let sid = self.entries.remove(addr)?;
        self.order.retain(|a| a != addr);
        Some(sid)
    }

    // Returns an iterator visiting all SIDs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &StaticSid> + '_ {
        self.order.iter().filter_map(|addr| self.entries.get(addr))
    }

    // Returns the addresses of all SIDs, in insertion order.
    pub(crate) fn addrs(&self) -> Vec<Ipv6Addr> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
