//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use rove_utils::ibus::IbusChannelsTx;
use rove_utils::protocol::Protocol;
use rove_utils::southbound::{LocalSidContext, LocalSidKeyMsg, LocalSidMsg};
use rove_utils::srv6::{Behavior, LocalSidFlavor, SidStructure};

use crate::adjacency::Srv6AdjSid;
use crate::error::Error;
use crate::instance::Srv6EndSid;

// ===== global functions =====

// Requests the installation of an End.X SID. Returns whether the request
// was handed to the broker.
pub(crate) fn adj_sid_install(
    ibus_tx: &IbusChannelsTx,
    adj_sid: &Srv6AdjSid,
    oif: u32,
    structure: &SidStructure,
) -> bool {
    let ctx = LocalSidContext {
        nh6: Some(adj_sid.nbr_addr),
        flavor: flavor_for(&adj_sid.behavior),
        ..Default::default()
    };
    let msg = LocalSidMsg::new(
        Protocol::ISIS,
        adj_sid.sid,
        adj_sid.behavior.to_wire(),
        oif,
        ctx,
        *structure,
    );

    match ibus_tx.localsid_add(msg) {
        Ok(()) => true,
        Err(error) => {
            Error::BrokerSend(error).log();
            false
        }
    }
}

// Requests the removal of an End.X SID.
pub(crate) fn adj_sid_uninstall(
    ibus_tx: &IbusChannelsTx,
    sid: Ipv6Addr,
    oif: u32,
) {
    let msg = LocalSidKeyMsg::new(Protocol::ISIS, sid, oif);
    if let Err(error) = ibus_tx.localsid_del(msg) {
        Error::BrokerSend(error).log();
    }
}

// Requests the installation of an End SID. Returns whether the request was
// handed to the broker.
pub(crate) fn end_sid_install(
    ibus_tx: &IbusChannelsTx,
    end_sid: &Srv6EndSid,
    oif: u32,
    structure: &SidStructure,
) -> bool {
    let ctx = LocalSidContext {
        flavor: flavor_for(&end_sid.behavior),
        ..Default::default()
    };
    let msg = LocalSidMsg::new(
        Protocol::ISIS,
        end_sid.sid,
        end_sid.behavior.to_wire(),
        oif,
        ctx,
        *structure,
    );

    match ibus_tx.localsid_add(msg) {
        Ok(()) => true,
        Err(error) => {
            Error::BrokerSend(error).log();
            false
        }
    }
}

// Requests the removal of an End SID.
pub(crate) fn end_sid_uninstall(ibus_tx: &IbusChannelsTx, sid: Ipv6Addr) {
    let msg = LocalSidKeyMsg::new(Protocol::ISIS, sid, 0);
    if let Err(error) = ibus_tx.localsid_del(msg) {
        Error::BrokerSend(error).log();
    }
}

// ===== helper functions =====

fn flavor_for(behavior: &Behavior) -> Option<LocalSidFlavor> {
    matches!(behavior, Behavior::UN | Behavior::UA)
        .then(LocalSidFlavor::next_csid)
}
