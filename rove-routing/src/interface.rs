//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, HashMap};

use generational_arena::{Arena, Index};
use ipnetwork::IpNetwork;
use rove_utils::southbound::{AddressFlags, InterfaceFlags};

#[derive(Debug)]
pub struct Interface {
    pub name: String,
    pub ifindex: u32,
    pub mtu: u32,
    pub flags: InterfaceFlags,
    pub addresses: BTreeMap<IpNetwork, AddressFlags>,
}

#[derive(Debug, Default)]
pub struct Interfaces {
    // Interface arena.
    arena: Arena<Interface>,
    // Interface binary tree keyed by name.
    name_tree: BTreeMap<String, Index>,
    // Interface hash table keyed by ifindex.
    ifindex_tree: HashMap<u32, Index>,
}

#[derive(Clone, Debug)]
pub struct Vrf {
    pub name: String,
    pub vrf_id: u32,
    pub table_id: u32,
    pub active: bool,
}

#[derive(Debug, Default)]
pub struct Vrfs {
    // VRF binary tree keyed by name.
    name_tree: BTreeMap<String, Vrf>,
}

// ===== impl Interfaces =====

impl Interfaces {
    // Adds or updates the interface with the specified attributes.
    pub(crate) fn update(
        &mut self,
        ifname: String,
        ifindex: u32,
        mtu: u32,
        flags: InterfaceFlags,
    ) {
        match self.ifindex_tree.get(&ifindex).copied() {
            Some(iface_idx) => {
                let iface = &mut self.arena[iface_idx];

                // Update the existing interface with the new information.
                if iface.name != ifname {
                    self.name_tree.remove(&iface.name);
                    iface.name.clone_from(&ifname);
                    self.name_tree.insert(ifname, iface_idx);
                }
                iface.mtu = mtu;
                iface.flags = flags;
            }
            None => {
                // If the interface does not exist, create a new entry.
                let iface = Interface {
                    name: ifname.clone(),
                    ifindex,
                    mtu,
                    flags,
                    addresses: Default::default(),
                };
                let iface_idx = self.arena.insert(iface);
                self.name_tree.insert(ifname, iface_idx);
                self.ifindex_tree.insert(ifindex, iface_idx);
            }
        }
    }

    // Removes the specified interface.
    pub(crate) fn remove(&mut self, ifname: &str) {
        let Some(iface_idx) = self.name_tree.get(ifname).copied() else {
            return;
        };
        let iface = &mut self.arena[iface_idx];

        // Remove interface.
        self.name_tree.remove(&iface.name);
        self.ifindex_tree.remove(&iface.ifindex);
        self.arena.remove(iface_idx);
    }

    // Returns a mutable reference to the interface corresponding to the given
    // name.
    pub(crate) fn get_mut_by_name(
        &mut self,
        ifname: &str,
    ) -> Option<&mut Interface> {
        self.name_tree
            .get(ifname)
            .copied()
            .map(move |iface_idx| &mut self.arena[iface_idx])
    }
}

// ===== impl Vrfs =====

impl Vrfs {
    // Adds or updates a VRF.
    pub(crate) fn update(&mut self, vrf: Vrf) {
        self.name_tree.insert(vrf.name.clone(), vrf);
    }

    // Removes the specified VRF.
    pub(crate) fn remove(&mut self, name: &str) {
        self.name_tree.remove(name);
    }

    // Returns a reference to the VRF corresponding to the given table ID.
    pub(crate) fn get_by_table_id(&self, table_id: u32) -> Option<&Vrf> {
        self.name_tree
            .values()
            .find(|vrf| vrf.table_id == table_id)
    }
}
