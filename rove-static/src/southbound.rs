//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use rove_utils::protocol::Protocol;
use rove_utils::southbound::{
    InterfaceFlags, LocalSidContext, LocalSidKeyMsg, LocalSidMsg,
};
use rove_utils::srv6::{Behavior, LocalSidFlavor, SidStructure};

use crate::debug::Debug;
use crate::error::Error;
use crate::sid::{SidFlags, SidInstallState, StaticSid};
use crate::Master;

// ===== global functions =====

// Re-derives the desired installation state of the given SID and issues the
// corresponding broker request when an edge is crossed.
pub(crate) fn sid_update(master: &mut Master, addr: Ipv6Addr) {
    let Some(sid) = master.sids.get(&addr) else {
        return;
    };

    // Re-evaluate validity against the current interface and VRF catalogues.
    let valid = sid_is_valid(master, sid);
    let sid = master.sids.get_mut(&addr).unwrap();
    if valid != sid.flags.contains(SidFlags::VALID) {
        Debug::SidValidityChange(&addr, valid).log();
    }
    if valid {
        sid.flags.insert(SidFlags::VALID);
    } else {
        sid.flags.remove(SidFlags::VALID);
    }

    // Edge-triggered installation.
    if valid && !sid.flags.contains(SidFlags::SENT_TO_BROKER) {
        sid_install(master, addr);
    } else if !valid && sid.flags.contains(SidFlags::SENT_TO_BROKER) {
        sid_uninstall(master, addr);
    }
}

// Re-derives the desired installation state of every SID in the table.
pub(crate) fn sid_update_all(master: &mut Master) {
    for addr in master.sids.addrs() {
        sid_update(master, addr);
    }
}

// Uninstalls every SID that was handed to the broker.
pub(crate) fn sid_uninstall_all(master: &mut Master) -> Result<(), Error> {
    for addr in master.sids.addrs() {
        let Some(sid) = master.sids.get(&addr) else {
            continue;
        };
        if sid.flags.contains(SidFlags::SENT_TO_BROKER) {
            sid_uninstall(master, addr);
        }
    }
    Ok(())
}

// ===== helper functions =====

// A SID is valid when every attribute required by its behavior is present
// and each referenced collaborator is currently live.
fn sid_is_valid(master: &Master, sid: &StaticSid) -> bool {
    if sid.behavior == Behavior::Unspec {
        return false;
    }

    if sid.behavior.requires_vrf() {
        let Some(vrf_name) = &sid.attrs.vrf_name else {
            return false;
        };
        match master.vrfs.get(vrf_name) {
            Some(vrf) if vrf.active => (),
            _ => return false,
        }
    }

    if sid.behavior.requires_nexthop() && sid.attrs.adj_v6.is_none() {
        return false;
    }

    if let Some(ifname) = &sid.attrs.ifname {
        if !master.interfaces.contains_key(ifname) {
            return false;
        }
    }

    true
}

// Installs the SID in the broker RIB.
fn sid_install(master: &mut Master, addr: Ipv6Addr) {
    let Some(sid) = master.sids.get(&addr) else {
        return;
    };

    let mut ctx = LocalSidContext::default();
    let mut oif = 0;

    // Generate nexthop from the interface name, if configured.
    if let Some(ifname) = &sid.attrs.ifname {
        let Some(iface) = master.interfaces.get(ifname) else {
            return;
        };
        oif = iface.ifindex;
    }

    // Generate nexthop from the adjacency, if configured.
    if let Some(adj_v6) = sid.attrs.adj_v6 {
        ctx.nh6 = Some(adj_v6);
    }

    // Generate table ID from the VRF name, if configured.
    if let Some(vrf_name) = &sid.attrs.vrf_name {
        let Some(vrf) = master.vrfs.get(vrf_name).filter(|vrf| vrf.active)
        else {
            return;
        };
        ctx.table_id = Some(vrf.table_id);
        oif = vrf.vrf_id;
    }

    // By default, use the first non-loopback interface as the outgoing
    // device. Without one the SID stays valid but unsent, to be retried on
    // the next interface event.
    if oif == 0 {
        let Some(iface) = master
            .interfaces
            .values()
            .find(|iface| !iface.flags.contains(InterfaceFlags::LOOPBACK))
        else {
            Debug::SidNoInterface(&addr).log();
            return;
        };
        oif = iface.ifindex;
    }

    // Attach the flavor descriptor for compressed-SID behaviors.
    if matches!(sid.behavior, Behavior::UN | Behavior::UA) {
        ctx.flavor = Some(LocalSidFlavor::next_csid());
    }

    let msg = LocalSidMsg::new(
        Protocol::STATIC,
        addr,
        sid.behavior.to_wire(),
        oif,
        ctx,
        SidStructure::USID_F3216,
    );

    Debug::SidInstall(&addr, &sid.behavior, oif).log();
    match master.ibus_tx.localsid_add(msg) {
        Ok(()) => {
            let sid = master.sids.get_mut(&addr).unwrap();
            sid.flags.insert(SidFlags::SENT_TO_BROKER);
            sid.install_state = SidInstallState::SentToBroker;
        }
        Err(error) => {
            Error::BrokerSend(error).log();
        }
    }
}

// Removes the SID from the broker RIB.
pub(crate) fn sid_uninstall(master: &mut Master, addr: Ipv6Addr) {
    let Some(sid) = master.sids.get(&addr) else {
        return;
    };

    let mut oif = 0;
    if let Some(vrf_name) = &sid.attrs.vrf_name {
        if let Some(vrf) = master.vrfs.get(vrf_name) {
            oif = vrf.vrf_id;
        }
    }

    let msg = LocalSidKeyMsg::new(Protocol::STATIC, addr, oif);

    Debug::SidUninstall(&addr).log();
    match master.ibus_tx.localsid_del(msg) {
        Ok(()) => {
            let sid = master.sids.get_mut(&addr).unwrap();
            sid.flags.remove(SidFlags::SENT_TO_BROKER);
        }
        Err(error) => {
            // Keep SENT_TO_BROKER asserted; the edge is retried on the next
            // relevant event.
            Error::BrokerSend(error).log();
        }
    }
}
