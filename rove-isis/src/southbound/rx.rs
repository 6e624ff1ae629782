//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use rove_utils::ibus::IbusMsg;
use rove_utils::protocol::Protocol;

use crate::instance::Instance;
use crate::{events, srv6};

// ===== global functions =====

pub fn process_msg(instance: &mut Instance, msg: IbusMsg) {
    match msg {
        // Broker (re)connection notification.
        IbusMsg::Connected => {
            srv6::process_connected(instance);
        }
        // Interface update notification.
        IbusMsg::InterfaceUpd(msg) => {
            events::process_iface_update(instance, msg);
        }
        // Interface delete notification.
        IbusMsg::InterfaceDel(ifname) => {
            events::process_iface_delete(instance, &ifname);
        }
        // SRv6 locator update notification.
        IbusMsg::LocatorUpd(locator) => {
            srv6::process_locator_update(instance, &locator.name);
        }
        // SRv6 locator delete notification.
        IbusMsg::LocatorDel(name) => {
            srv6::process_locator_delete(instance, &name);
        }
        // Locator chunk grant notification.
        IbusMsg::LocatorChunkUpd(msg) => {
            if msg.proto == Protocol::ISIS {
                srv6::process_chunk_add(instance, msg);
            }
        }
        // Ignore other events.
        _ => {}
    }
}
