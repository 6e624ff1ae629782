//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::Ipv6Addr;

use derive_new::new;
use rove_utils::srv6::Behavior;

use crate::collections::InterfaceIndex;
use crate::debug::Debug;
use crate::packet::SystemId;
use crate::packet::subtlvs::neighbor::{
    EndXSidFlags, Srv6EndXSidStlv, Srv6LanEndXSidStlv,
};
use crate::packet::subtlvs::Srv6SidStructureSstlv;

#[derive(Debug)]
pub struct Adjacency {
    pub iface_idx: InterfaceIndex,
    pub system_id: SystemId,
    pub state: AdjacencyState,
    pub ipv6_addrs: BTreeSet<Ipv6Addr>,
    pub adj_sids: Vec<Srv6AdjSid>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AdjacencyState {
    Down,
    Up,
}

// SRv6 Adjacency SID.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
pub struct Srv6AdjSid {
    pub sid: Ipv6Addr,
    pub behavior: Behavior,
    pub nbr_addr: Ipv6Addr,
    // Set on broadcast circuits only.
    pub nbr_system_id: Option<SystemId>,
    pub backup: bool,
    // Whether the SID was handed to the broker.
    pub sent: bool,
}

// ===== impl Adjacency =====

impl Adjacency {
    pub(crate) fn new(
        iface_idx: InterfaceIndex,
        system_id: SystemId,
    ) -> Adjacency {
        let adj = Adjacency {
            iface_idx,
            system_id,
            state: AdjacencyState::Down,
            ipv6_addrs: Default::default(),
            adj_sids: Default::default(),
        };
        Debug::AdjacencyCreate(&adj.system_id).log();
        adj
    }
}

// ===== impl Srv6AdjSid =====

impl Srv6AdjSid {
    fn flags(&self) -> EndXSidFlags {
        let mut flags = EndXSidFlags::empty();
        if self.backup {
            flags.insert(EndXSidFlags::B);
        }
        flags
    }

    // Builds the End.X SID Sub-TLV advertised for point-to-point circuits.
    pub(crate) fn to_stlv(
        &self,
        structure: Option<Srv6SidStructureSstlv>,
    ) -> Srv6EndXSidStlv {
        Srv6EndXSidStlv::new(
            self.flags(),
            0,
            0,
            self.behavior,
            self.sid,
            structure,
        )
    }

    // Builds the LAN End.X SID Sub-TLV advertised for broadcast circuits.
    pub(crate) fn to_lan_stlv(
        &self,
        structure: Option<Srv6SidStructureSstlv>,
    ) -> Option<Srv6LanEndXSidStlv> {
        let nbr_system_id = self.nbr_system_id?;
        Some(Srv6LanEndXSidStlv::new(
            nbr_system_id,
            self.flags(),
            0,
            0,
            self.behavior,
            self.sid,
            structure,
        ))
    }
}
