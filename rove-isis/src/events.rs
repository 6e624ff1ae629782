//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use rove_utils::southbound::InterfaceUpdateMsg;

use crate::adjacency::AdjacencyState;
use crate::debug::Debug;
use crate::error::Error;
use crate::instance::Instance;
use crate::packet::SystemId;
use crate::srv6;

// ===== global functions =====

// Handles an interface update notification from the broker.
pub fn process_iface_update(instance: &mut Instance, msg: InterfaceUpdateMsg) {
    // Lookup interface.
    let Some(iface) = instance.arenas.interfaces.get_mut_by_name(&msg.ifname)
    else {
        return;
    };
    let iface_idx = iface.index;

    // Update interface data.
    iface.system.flags = msg.flags;
    iface.system.mtu = Some(msg.mtu);
    if iface.system.ifindex != Some(msg.ifindex) {
        instance
            .arenas
            .interfaces
            .update_ifindex(iface_idx, Some(msg.ifindex));
    }

    // SIDs waiting for an interface are retried here.
    srv6::sids_retry(instance);
}

// Handles an interface delete notification from the broker.
pub fn process_iface_delete(instance: &mut Instance, ifname: &str) {
    let Some(iface) = instance.arenas.interfaces.get_by_name(ifname) else {
        return;
    };
    let iface_id = iface.id;
    let iface_idx = iface.index;

    // The link is gone, so are its adjacencies.
    for adj_idx in instance
        .arenas
        .adjacencies
        .indexes()
        .collect::<Vec<_>>()
    {
        if instance.arenas.adjacencies[adj_idx].iface_idx != iface_idx {
            continue;
        }
        srv6::adj_sids_del(instance, adj_idx);
        let system_id = instance.arenas.adjacencies[adj_idx].system_id;
        Debug::AdjacencyDelete(&system_id).log();
        instance.arenas.adjacencies.delete(iface_id, adj_idx);
    }

    instance.arenas.interfaces.update_ifindex(iface_idx, None);
}

// Handles the transition of an adjacency to the Up state.
//
// Adjacency SID allocation is deferred until the neighbor's IPv6 addresses
// are known.
pub fn process_adjacency_up(
    instance: &mut Instance,
    ifname: &str,
    system_id: SystemId,
) -> Result<(), Error> {
    let iface = instance
        .arenas
        .interfaces
        .get_by_name(ifname)
        .ok_or_else(|| Error::InterfaceNotFound(ifname.to_owned()))?;
    let iface_id = iface.id;
    let iface_idx = iface.index;

    let adj_idx = match instance
        .arenas
        .adjacencies
        .get_idx(iface_id, system_id)
    {
        Some(adj_idx) => adj_idx,
        None => {
            let (adj_idx, _) = instance
                .arenas
                .adjacencies
                .insert(iface_id, iface_idx, system_id);
            adj_idx
        }
    };

    let adj = &mut instance.arenas.adjacencies[adj_idx];
    if adj.state == AdjacencyState::Up {
        return Ok(());
    }
    Debug::AdjacencyStateChange(&system_id, AdjacencyState::Up).log();
    adj.state = AdjacencyState::Up;

    srv6::adj_sids_add(instance, adj_idx);

    Ok(())
}

// Handles the transition of an adjacency to the Down state.
pub fn process_adjacency_down(
    instance: &mut Instance,
    ifname: &str,
    system_id: SystemId,
) -> Result<(), Error> {
    let iface = instance
        .arenas
        .interfaces
        .get_by_name(ifname)
        .ok_or_else(|| Error::InterfaceNotFound(ifname.to_owned()))?;
    let iface_id = iface.id;

    let Some(adj_idx) = instance
        .arenas
        .adjacencies
        .get_idx(iface_id, system_id)
    else {
        return Ok(());
    };

    // Tear down every End.X SID on the adjacency.
    srv6::adj_sids_del(instance, adj_idx);

    Debug::AdjacencyStateChange(&system_id, AdjacencyState::Down).log();
    Debug::AdjacencyDelete(&system_id).log();
    instance.arenas.adjacencies.delete(iface_id, adj_idx);

    Ok(())
}

// Handles the addition of a neighbor IPv6 address to an adjacency.
pub fn process_adjacency_ipv6_addr_add(
    instance: &mut Instance,
    ifname: &str,
    system_id: SystemId,
    addr: Ipv6Addr,
) -> Result<(), Error> {
    let iface = instance
        .arenas
        .interfaces
        .get_by_name(ifname)
        .ok_or_else(|| Error::InterfaceNotFound(ifname.to_owned()))?;
    let iface_id = iface.id;

    let Some(adj_idx) = instance
        .arenas
        .adjacencies
        .get_idx(iface_id, system_id)
    else {
        return Ok(());
    };

    let adj = &mut instance.arenas.adjacencies[adj_idx];
    adj.ipv6_addrs.insert(addr);

    srv6::adj_sids_add(instance, adj_idx);

    Ok(())
}

// Handles the removal of a neighbor IPv6 address from an adjacency.
pub fn process_adjacency_ipv6_addr_del(
    instance: &mut Instance,
    ifname: &str,
    system_id: SystemId,
    addr: Ipv6Addr,
) -> Result<(), Error> {
    let iface = instance
        .arenas
        .interfaces
        .get_by_name(ifname)
        .ok_or_else(|| Error::InterfaceNotFound(ifname.to_owned()))?;
    let iface_id = iface.id;

    let Some(adj_idx) = instance
        .arenas
        .adjacencies
        .get_idx(iface_id, system_id)
    else {
        return Ok(());
    };

    let adj = &mut instance.arenas.adjacencies[adj_idx];
    adj.ipv6_addrs.remove(&addr);

    // IPv6 is gone from the adjacency.
    if adj.ipv6_addrs.is_empty() {
        srv6::adj_sids_del(instance, adj_idx);
    }

    Ok(())
}
