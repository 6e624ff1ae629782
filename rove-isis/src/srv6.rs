//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::Ipv6Addr;

use rove_utils::protocol::Protocol;
use rove_utils::southbound::{InterfaceFlags, LocatorChunkMsg};
use rove_utils::srv6::{Behavior, SidStructure, transpose_sid};

use crate::adjacency::{AdjacencyState, Srv6AdjSid};
use crate::collections::{AdjacencyIndex, Interfaces};
use crate::debug::Debug;
use crate::error::Error;
use crate::instance::{Instance, Srv6Chunk, Srv6EndSid};
use crate::interface::InterfaceType;
use crate::packet::consts::MsdType;
use crate::packet::subtlvs::Srv6SidStructureSstlv;
use crate::packet::subtlvs::capability::{Srv6CapFlags, Srv6CapabilitiesStlv};
use crate::packet::subtlvs::locator::Srv6EndSidStlv;
use crate::packet::subtlvs::neighbor::{Srv6EndXSidStlv, Srv6LanEndXSidStlv};
use crate::packet::tlv::{
    LocatorFlags, NodeMsdTlv, Srv6LocatorEntry, Srv6LocatorTlv,
};
use crate::southbound;

// ===== global functions =====

// Handles a locator advertisement from the broker, requesting a chunk when
// the locator is the one the area is configured to use.
pub(crate) fn process_locator_update(
    instance: &mut Instance,
    name: &str,
) {
    let cfg = &instance.config.srv6;
    if !cfg.enabled || cfg.locator.as_deref() != Some(name) {
        return;
    }
    if instance
        .state
        .srv6
        .chunks
        .iter()
        .any(|chunk| chunk.locator.name == name)
    {
        return;
    }

    instance.tx.locator_chunk_get(name, Protocol::ISIS);
}

// Handles the deletion of a locator. Every SID allocated from it is torn
// down before the chunk is given back.
pub(crate) fn process_locator_delete(instance: &mut Instance, name: &str) {
    if !instance
        .state
        .srv6
        .chunks
        .iter()
        .any(|chunk| chunk.locator.name == name)
    {
        return;
    }

    teardown(instance);
}

// Handles a locator chunk granted by the broker.
pub(crate) fn process_chunk_add(
    instance: &mut Instance,
    msg: LocatorChunkMsg,
) {
    let srv6 = &mut instance.state.srv6;

    // At most one outstanding chunk per locator.
    if srv6
        .chunks
        .iter()
        .any(|chunk| chunk.locator.name == msg.locator.name)
    {
        return;
    }

    Debug::LocatorChunkAdd(&msg.locator.name, &msg.chunk).log();
    srv6.chunks
        .push(Srv6Chunk::new(msg.locator.clone(), msg.chunk));

    // Bind the End SID covering the locator node prefix.
    end_sid_add(instance, &msg.locator.name);

    // Allocate Adjacency SIDs for the IPv6-enabled adjacencies.
    for adj_idx in instance
        .arenas
        .adjacencies
        .indexes()
        .collect::<Vec<_>>()
    {
        adj_sids_add(instance, adj_idx);
    }
}

// Adds an SRv6 Adjacency SID to the given adjacency.
//
// Nothing happens until the adjacency is up, its first IPv6 address is
// known and the area holds a locator chunk.
pub(crate) fn adj_sids_add(
    instance: &mut Instance,
    adj_idx: AdjacencyIndex,
) {
    if !instance.config.srv6.enabled {
        return;
    }

    let adj = &instance.arenas.adjacencies[adj_idx];
    if adj.state != AdjacencyState::Up || !adj.adj_sids.is_empty() {
        return;
    }
    let Some(nbr_addr) = adj.ipv6_addrs.first().copied() else {
        return;
    };
    let iface = &instance.arenas.interfaces[adj.iface_idx];
    let nbr_system_id = (iface.config.interface_type
        == InterfaceType::Broadcast)
        .then_some(adj.system_id);
    let Some(oif) = iface.system.ifindex else {
        // Retried when the interface shows up.
        return;
    };

    // Allocate a SID from the first chunk in the area's chunk list.
    let Some(chunk) = instance.state.srv6.chunks.first() else {
        return;
    };
    let structure = chunk.locator.structure;
    let behavior = Behavior::end_x_for(chunk.locator.usid);
    let Some(sid) = sid_alloc_auto(
        chunk.prefix.ip(),
        &structure,
        &instance.state.srv6.sid_addrs,
    ) else {
        Error::SidAllocationFailed(chunk.locator.name.clone()).log();
        return;
    };

    let mut adj_sid =
        Srv6AdjSid::new(sid, behavior, nbr_addr, nbr_system_id, false, false);
    Debug::AdjSidCreate(&sid, &behavior).log();

    // Request installation.
    adj_sid.sent =
        southbound::tx::adj_sid_install(&instance.tx, &adj_sid, oif, &structure);

    instance.state.srv6.sid_addrs.insert(sid);
    instance.arenas.adjacencies[adj_idx].adj_sids.push(adj_sid);
}

// Deletes all SRv6 Adjacency SIDs from the given adjacency.
pub(crate) fn adj_sids_del(
    instance: &mut Instance,
    adj_idx: AdjacencyIndex,
) {
    let adj = &mut instance.arenas.adjacencies[adj_idx];
    let iface_idx = adj.iface_idx;
    let adj_sids = std::mem::take(&mut adj.adj_sids);
    let oif = instance.arenas.interfaces[iface_idx]
        .system
        .ifindex
        .unwrap_or(0);

    for adj_sid in adj_sids {
        Debug::AdjSidDelete(&adj_sid.sid).log();
        instance.state.srv6.sid_addrs.remove(&adj_sid.sid);
        if adj_sid.sent {
            southbound::tx::adj_sid_uninstall(&instance.tx, adj_sid.sid, oif);
        }
    }
}

// Tears down every SID allocated from the area's chunks, then releases the
// chunks themselves.
pub(crate) fn teardown(instance: &mut Instance) {
    // Every End.X SID is torn down before its chunk is released.
    for adj_idx in instance
        .arenas
        .adjacencies
        .indexes()
        .collect::<Vec<_>>()
    {
        adj_sids_del(instance, adj_idx);
    }

    for end_sid in std::mem::take(&mut instance.state.srv6.end_sids) {
        Debug::EndSidDelete(&end_sid.sid).log();
        instance.state.srv6.sid_addrs.remove(&end_sid.sid);
        if end_sid.sent {
            southbound::tx::end_sid_uninstall(&instance.tx, end_sid.sid);
        }
    }

    for chunk in std::mem::take(&mut instance.state.srv6.chunks) {
        Debug::LocatorChunkDel(&chunk.locator.name).log();
        instance
            .tx
            .locator_chunk_release(&chunk.locator.name, Protocol::ISIS);
    }
}

// Retries the installation of SIDs that could not be handed to the broker
// yet, and allocates the ones that were waiting for an interface.
pub(crate) fn sids_retry(instance: &mut Instance) {
    // End SIDs.
    let mut end_sids = std::mem::take(&mut instance.state.srv6.end_sids);
    for end_sid in end_sids.iter_mut().filter(|end_sid| !end_sid.sent) {
        if let Some(oif) = default_oif(&instance.arenas.interfaces) {
            end_sid.sent = southbound::tx::end_sid_install(
                &instance.tx,
                end_sid,
                oif,
                &end_sid_structure(instance, &end_sid.locator),
            );
        }
    }
    instance.state.srv6.end_sids = end_sids;

    // Adjacency SIDs.
    for adj_idx in instance
        .arenas
        .adjacencies
        .indexes()
        .collect::<Vec<_>>()
    {
        let adj = &instance.arenas.adjacencies[adj_idx];
        if adj.adj_sids.is_empty() {
            adj_sids_add(instance, adj_idx);
            continue;
        }

        let Some(oif) = instance.arenas.interfaces[adj.iface_idx]
            .system
            .ifindex
        else {
            continue;
        };
        let Some(chunk) = instance.state.srv6.chunks.first() else {
            continue;
        };
        let structure = chunk.locator.structure;

        let adj = &mut instance.arenas.adjacencies[adj_idx];
        let mut adj_sids = std::mem::take(&mut adj.adj_sids);
        for adj_sid in adj_sids.iter_mut().filter(|adj_sid| !adj_sid.sent) {
            adj_sid.sent = southbound::tx::adj_sid_install(
                &instance.tx,
                adj_sid,
                oif,
                &structure,
            );
        }
        instance.arenas.adjacencies[adj_idx].adj_sids = adj_sids;
    }
}

// Handles a broker (re)connection: all sent state is invalidated and the
// installation requests are re-issued.
pub(crate) fn process_connected(instance: &mut Instance) {
    for end_sid in instance.state.srv6.end_sids.iter_mut() {
        end_sid.sent = false;
    }
    for adj_idx in instance
        .arenas
        .adjacencies
        .indexes()
        .collect::<Vec<_>>()
    {
        for adj_sid in instance.arenas.adjacencies[adj_idx]
            .adj_sids
            .iter_mut()
        {
            adj_sid.sent = false;
        }
    }
    sids_retry(instance);

    // Re-request the chunk if the area does not hold one.
    let cfg = &instance.config.srv6;
    if cfg.enabled {
        if let Some(locator) = &cfg.locator {
            if instance.state.srv6.chunks.is_empty() {
                instance.tx.locator_chunk_get(locator, Protocol::ISIS);
            }
        }
    }
}

// ===== TLV production =====

// SRv6 Capabilities Sub-TLV advertised in the Router Capability TLV.
pub fn capabilities_stlv(instance: &Instance) -> Option<Srv6CapabilitiesStlv> {
    instance
        .config
        .srv6
        .enabled
        .then(|| Srv6CapabilitiesStlv::new(Srv6CapFlags::empty()))
}

// Node MSD TLV carrying the SRv6 MSD values.
pub fn node_msd_tlv(instance: &Instance) -> Option<NodeMsdTlv> {
    let cfg = &instance.config.srv6;
    if !cfg.enabled {
        return None;
    }

    let mut tlv = NodeMsdTlv::default();
    tlv.msds.insert(MsdType::MaxSegsLeft, cfg.max_seg_left_msd);
    tlv.msds.insert(MsdType::MaxEndPop, cfg.max_end_pop_msd);
    tlv.msds.insert(MsdType::MaxHEncaps, cfg.max_h_encaps_msd);
    tlv.msds.insert(MsdType::MaxEndD, cfg.max_end_d_msd);
    Some(tlv)
}

// SRv6 Locator TLV advertising the area's chunks and their End SIDs.
pub fn locator_tlv(instance: &Instance) -> Option<Srv6LocatorTlv> {
    let srv6 = &instance.state.srv6;
    if srv6.chunks.is_empty() {
        return None;
    }

    let entries = srv6
        .chunks
        .iter()
        .map(|chunk| {
            let sub_tlvs = srv6
                .end_sids
                .iter()
                .filter(|end_sid| end_sid.locator == chunk.locator.name)
                .map(|end_sid| {
                    Srv6EndSidStlv::new(
                        0,
                        end_sid.behavior,
                        end_sid.sid,
                        Some(Srv6SidStructureSstlv(chunk.locator.structure)),
                    )
                })
                .collect();
            Srv6LocatorEntry::new(
                0,
                LocatorFlags::empty(),
                0,
                chunk.prefix,
                sub_tlvs,
            )
        })
        .collect();

    Some(Srv6LocatorTlv::new(0, entries))
}

// End.X SID Sub-TLVs advertised for the given point-to-point adjacency.
pub fn end_x_stlvs(
    instance: &Instance,
    adj_idx: AdjacencyIndex,
) -> Vec<Srv6EndXSidStlv> {
    let adj = &instance.arenas.adjacencies[adj_idx];
    let structure = sid_structure_sstlv(instance);
    adj.adj_sids
        .iter()
        .filter(|adj_sid| adj_sid.nbr_system_id.is_none())
        .map(|adj_sid| adj_sid.to_stlv(structure))
        .collect()
}

// LAN End.X SID Sub-TLVs advertised for the given broadcast adjacency.
pub fn lan_end_x_stlvs(
    instance: &Instance,
    adj_idx: AdjacencyIndex,
) -> Vec<Srv6LanEndXSidStlv> {
    let adj = &instance.arenas.adjacencies[adj_idx];
    let structure = sid_structure_sstlv(instance);
    adj.adj_sids
        .iter()
        .filter_map(|adj_sid| adj_sid.to_lan_stlv(structure))
        .collect()
}

// ===== helper functions =====

// Binds the End SID covering the node prefix of the given locator.
fn end_sid_add(instance: &mut Instance, locator_name: &str) {
    let Some(chunk) = instance
        .state
        .srv6
        .chunks
        .iter()
        .find(|chunk| chunk.locator.name == locator_name)
    else {
        return;
    };
    let structure = chunk.locator.structure;
    let behavior = Behavior::end_for(chunk.locator.usid);

    // The End SID is the locator node prefix itself (function index 0).
    let Some(sid) = sid_alloc_explicit(
        chunk.prefix.ip(),
        &structure,
        0,
        &instance.state.srv6.sid_addrs,
    ) else {
        Error::SidAllocationFailed(locator_name.to_owned()).log();
        return;
    };

    let mut end_sid =
        Srv6EndSid::new(sid, behavior, locator_name.to_owned(), false);
    Debug::EndSidCreate(&sid, &behavior).log();

    if let Some(oif) = default_oif(&instance.arenas.interfaces) {
        end_sid.sent = southbound::tx::end_sid_install(
            &instance.tx,
            &end_sid,
            oif,
            &structure,
        );
    }

    instance.state.srv6.sid_addrs.insert(sid);
    instance.state.srv6.end_sids.push(end_sid);
}

// First non-loopback interface known to the broker.
fn default_oif(interfaces: &Interfaces) -> Option<u32> {
    interfaces
        .iter()
        .find(|iface| {
            !iface.system.flags.contains(InterfaceFlags::LOOPBACK)
        })
        .and_then(|iface| iface.system.ifindex)
}

fn end_sid_structure(instance: &Instance, locator_name: &str) -> SidStructure {
    instance
        .state
        .srv6
        .chunks
        .iter()
        .find(|chunk| chunk.locator.name == locator_name)
        .map(|chunk| chunk.locator.structure)
        .unwrap_or(SidStructure::USID_F3216)
}

fn sid_structure_sstlv(instance: &Instance) -> Option<Srv6SidStructureSstlv> {
    instance
        .state
        .srv6
        .chunks
        .first()
        .map(|chunk| Srv6SidStructureSstlv(chunk.locator.structure))
}

// Allocates the first available function index, searching upward from 1.
//
// Index 0 belongs to the locator's End SID and the all-ones function value
// is treated as a reservation, so neither is ever handed out.
pub(crate) fn sid_alloc_auto(
    base: Ipv6Addr,
    structure: &SidStructure,
    in_use: &BTreeSet<Ipv6Addr>,
) -> Option<Ipv6Addr> {
    let func_len = structure.function_len;
    if func_len == 0 || func_len > 32 {
        return None;
    }

    let offset = structure.function_offset();
    let max = ((1u64 << func_len) - 1) as u32;
    for index in 1..max {
        let sid = transpose_sid(base, index, offset, func_len).ok()?;
        if !in_use.contains(&sid) {
            return Some(sid);
        }
    }

    None
}

// Allocates the SID at the operator-specified function index, failing if
// the resulting address is already in use.
pub(crate) fn sid_alloc_explicit(
    base: Ipv6Addr,
    structure: &SidStructure,
    index: u32,
    in_use: &BTreeSet<Ipv6Addr>,
) -> Option<Ipv6Addr> {
    let sid = transpose_sid(
        base,
        index,
        structure.function_offset(),
        structure.function_len,
    )
    .ok()?;
    if in_use.contains(&sid) {
        return None;
    }
    Some(sid)
}

// ===== tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_allocation_is_deterministic() {
        let base: Ipv6Addr = "2001:db8::".parse().unwrap();
        let structure = SidStructure::new(32, 16, 16, 0).unwrap();
        let mut in_use = BTreeSet::new();

        let sid1 = sid_alloc_auto(base, &structure, &in_use).unwrap();
        assert_eq!(sid1, "2001:db8:0:1::".parse::<Ipv6Addr>().unwrap());
        in_use.insert(sid1);

        let sid2 = sid_alloc_auto(base, &structure, &in_use).unwrap();
        assert_eq!(sid2, "2001:db8:0:2::".parse::<Ipv6Addr>().unwrap());
        in_use.insert(sid2);

        // Releasing the first index makes it the next candidate again.
        in_use.remove(&sid1);
        assert_eq!(sid_alloc_auto(base, &structure, &in_use), Some(sid1));
    }

    #[test]
    fn explicit_allocation_rejects_collisions() {
        let base: Ipv6Addr = "2001:db8::".parse().unwrap();
        let structure = SidStructure::new(32, 16, 16, 0).unwrap();
        let mut in_use = BTreeSet::new();

        let sid = sid_alloc_explicit(base, &structure, 7, &in_use).unwrap();
        assert_eq!(sid, "2001:db8:0:7::".parse::<Ipv6Addr>().unwrap());
        in_use.insert(sid);
        assert_eq!(sid_alloc_explicit(base, &structure, 7, &in_use), None);
    }

    #[test]
    fn auto_allocation_excludes_sentinels() {
        let base: Ipv6Addr = "2001:db8::".parse().unwrap();
        let structure = SidStructure::new(32, 16, 2, 0).unwrap();
        let mut in_use = BTreeSet::new();

        // With 2 function bits, only indexes 1 and 2 are allocatable.
        for _ in 0..2 {
            let sid = sid_alloc_auto(base, &structure, &in_use).unwrap();
            in_use.insert(sid);
        }
        assert_eq!(sid_alloc_auto(base, &structure, &in_use), None);
    }
}
