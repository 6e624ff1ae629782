//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use ipnetwork::Ipv6Network;
use rove_utils::southbound::{
    AddressFlags, AddressMsg, InterfaceFlags, InterfaceUpdateMsg,
    VrfUpdateMsg,
};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::interface::Vrf;
use crate::{Master, srv6};

// Configuration operations accepted by the broker.
//
// Interfaces and VRFs are fed through here as well: the broker is the
// system-facing component, and deployments that don't run a kernel
// monitor declare them statically.
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub enum Command {
    LocatorCreate {
        name: String,
        prefix: Ipv6Network,
        block_len: u8,
        node_len: u8,
        function_len: u8,
        argument_len: u8,
        usid: bool,
    },
    LocatorDelete {
        name: String,
    },
    EncapSrcAddrSet(Ipv6Addr),
    EncapSrcAddrUnset,
    InterfaceAdd {
        name: String,
        ifindex: u32,
        mtu: u32,
        flags: InterfaceFlags,
    },
    InterfaceDelete {
        name: String,
    },
    AddressAdd {
        ifname: String,
        addr: ipnetwork::IpNetwork,
    },
    VrfAdd {
        name: String,
        vrf_id: u32,
        table_id: u32,
    },
    VrfDelete {
        name: String,
    },
}

// ===== global functions =====

pub fn process_command(
    master: &mut Master,
    command: Command,
) -> Result<(), Error> {
    match command {
        Command::LocatorCreate {
            name,
            prefix,
            block_len,
            node_len,
            function_len,
            argument_len,
            usid,
        } => srv6::locator_create(
            master,
            &name,
            prefix,
            block_len,
            node_len,
            function_len,
            argument_len,
            usid,
        ),
        Command::LocatorDelete { name } => srv6::locator_delete(master, &name),
        Command::EncapSrcAddrSet(addr) => {
            srv6::encap_src_addr_set(master, addr);
            Ok(())
        }
        Command::EncapSrcAddrUnset => {
            srv6::encap_src_addr_unset(master);
            Ok(())
        }
        Command::InterfaceAdd {
            name,
            ifindex,
            mtu,
            flags,
        } => {
            master
                .interfaces
                .update(name.clone(), ifindex, mtu, flags);
            master.ibus_tx.notify_interface_upd(InterfaceUpdateMsg::new(
                name, ifindex, mtu, flags,
            ));
            Ok(())
        }
        Command::InterfaceDelete { name } => {
            master.interfaces.remove(&name);
            master.ibus_tx.notify_interface_del(name);
            Ok(())
        }
        Command::AddressAdd { ifname, addr } => {
            let Some(iface) = master.interfaces.get_mut_by_name(&ifname)
            else {
                return Err(Error::InterfaceNotFound(ifname));
            };
            iface.addresses.insert(addr, AddressFlags::empty());
            master.ibus_tx.notify_addr_add(AddressMsg::new(
                ifname,
                addr,
                AddressFlags::empty(),
            ));
            Ok(())
        }
        Command::VrfAdd {
            name,
            vrf_id,
            table_id,
        } => {
            master.vrfs.update(Vrf {
                name: name.clone(),
                vrf_id,
                table_id,
                active: true,
            });
            master.ibus_tx.notify_vrf_upd(VrfUpdateMsg::new(
                name, vrf_id, table_id, true,
            ));
            Ok(())
        }
        Command::VrfDelete { name } => {
            master.vrfs.remove(&name);
            master.ibus_tx.notify_vrf_del(name);
            Ok(())
        }
    }
}
