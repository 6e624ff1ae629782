//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use rove_utils::ibus::IbusMsg;

use crate::error::Error;
use crate::{Master, srv6};

// ===== global functions =====

pub fn process_msg(master: &mut Master, msg: IbusMsg) {
    match msg {
        // Request to install an SRv6 local SID.
        IbusMsg::LocalSidAdd(msg) => {
            master.rib.localsid_add(msg);
        }
        // Request to uninstall an SRv6 local SID.
        IbusMsg::LocalSidDel(msg) => {
            master.rib.localsid_del(msg);
        }
        // Request to install IP route in the RIB.
        IbusMsg::RouteIpAdd(msg) => {
            master.rib.ip_route_add(msg);
        }
        // Request to uninstall IP route from the RIB.
        IbusMsg::RouteIpDel(msg) => {
            master.rib.ip_route_del(msg);
        }
        // Nexthop tracking registration.
        IbusMsg::NexthopTrack(addr) => {
            let ibus_tx = master.ibus_tx.clone();
            master.rib.nht_add(addr, &ibus_tx);
        }
        // Nexthop tracking unregistration.
        IbusMsg::NexthopUntrack(addr) => {
            master.rib.nht_del(addr);
        }
        // Request for a chunk of an SRv6 locator.
        IbusMsg::LocatorChunkGet { locator, proto } => {
            if let Err(error) = srv6::chunk_alloc(master, &locator, proto) {
                error.log();
            }
        }
        // Release of a previously requested locator chunk.
        IbusMsg::LocatorChunkRelease { locator, proto } => {
            if let Err(error) = srv6::chunk_release(master, &locator, proto) {
                error.log();
            }
        }
        // Ignore other events.
        _ => {}
    }
}
