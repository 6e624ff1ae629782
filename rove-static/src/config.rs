//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use rove_utils::srv6::Behavior;
use serde::{Deserialize, Serialize};

use crate::debug::Debug;
use crate::error::Error;
use crate::sid::SidFlags;
use crate::{Master, southbound};

// Configuration operations accepted by the static daemon.
//
// Each operation is idempotent on the resulting state.
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub enum Command {
    SidAdd {
        addr: Ipv6Addr,
        behavior: Behavior,
    },
    SidAttrSet {
        addr: Ipv6Addr,
        attr: SidAttr,
    },
    SidDelete {
        addr: Ipv6Addr,
    },
}

// A single SID attribute assignment.
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub enum SidAttr {
    Vrf(String),
    Ifname(String),
    AdjV6(Ipv6Addr),
}

// ===== global functions =====

pub fn process_command(
    master: &mut Master,
    command: Command,
) -> Result<(), Error> {
    match command {
        Command::SidAdd { addr, behavior } => sid_add(master, addr, behavior),
        Command::SidAttrSet { addr, attr } => sid_attr_set(master, addr, attr),
        Command::SidDelete { addr } => sid_delete(master, addr),
    }
}

// ===== helper functions =====

fn sid_add(
    master: &mut Master,
    addr: Ipv6Addr,
    behavior: Behavior,
) -> Result<(), Error> {
    match master.sids.get(&addr) {
        Some(sid) if sid.behavior == behavior => {
            // Re-declaration of the existing descriptor.
        }
        Some(_) => {
            // Rebind the address to the new behavior. The old binding is
            // withdrawn first so the broker never sees both.
            force_uninstall(master, addr);
            let sid = master.sids.get_mut(&addr).unwrap();
            sid.behavior = behavior;
        }
        None => {
            Debug::SidCreate(&addr, &behavior).log();
            master.sids.insert(addr, behavior);
        }
    }
    southbound::sid_update(master, addr);

    Ok(())
}

// Forces the uninstall edge for a SID that is about to be rebound,
// reattributed or destroyed.
fn force_uninstall(master: &mut Master, addr: Ipv6Addr) {
    if let Some(sid) = master.sids.get_mut(&addr) {
        sid.flags.remove(SidFlags::VALID);
        if sid.flags.contains(SidFlags::SENT_TO_BROKER) {
            southbound::sid_uninstall(master, addr);
        }
    }
}

fn sid_attr_set(
    master: &mut Master,
    addr: Ipv6Addr,
    attr: SidAttr,
) -> Result<(), Error> {
    if master.sids.get(&addr).is_none() {
        return Err(Error::SidNotFound(addr));
    }

    // An attribute change on an installed SID is a DEL-then-ADD.
    force_uninstall(master, addr);

    let sid = master.sids.get_mut(&addr).unwrap();
    match attr {
        SidAttr::Vrf(vrf_name) => sid.attrs.vrf_name = Some(vrf_name),
        SidAttr::Ifname(ifname) => sid.attrs.ifname = Some(ifname),
        SidAttr::AdjV6(adj_v6) => sid.attrs.adj_v6 = Some(adj_v6),
    }
    southbound::sid_update(master, addr);

    Ok(())
}

fn sid_delete(master: &mut Master, addr: Ipv6Addr) -> Result<(), Error> {
    if master.sids.get(&addr).is_none() {
        // Clearing an unknown SID is a no-op.
        return Ok(());
    }

    // Force the uninstall edge before dropping the descriptor.
    force_uninstall(master, addr);

    Debug::SidDelete(&addr).log();
    master.sids.remove(&addr);

    Ok(())
}
