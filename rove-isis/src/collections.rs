//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, HashMap};

use generational_arena::Index;

use crate::adjacency::Adjacency;
use crate::interface::Interface;
use crate::packet::SystemId;

pub type ObjectId = u32;

pub type InterfaceId = ObjectId;
pub type InterfaceIndex = Index;
pub type AdjacencyIndex = Index;

#[derive(Debug)]
pub struct Arena<T>(generational_arena::Arena<T>);

#[derive(Debug, Default)]
pub struct Interfaces {
    arena: Arena<Interface>,
    name_tree: BTreeMap<String, InterfaceIndex>,
    ifindex_tree: HashMap<u32, InterfaceIndex>,
    next_id: InterfaceId,
}

#[derive(Debug, Default)]
pub struct Adjacencies {
    arena: Arena<Adjacency>,
    key_tree: BTreeMap<(InterfaceId, SystemId), AdjacencyIndex>,
}

// ===== impl Arena =====

impl<T> Default for Arena<T> {
    fn default() -> Arena<T> {
        Arena(Default::default())
    }
}

impl<T> std::ops::Index<Index> for Arena<T> {
    type Output = T;

    fn index(&self, index: Index) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> std::ops::IndexMut<Index> for Arena<T> {
    fn index_mut(&mut self, index: Index) -> &mut Self::Output {
        &mut self.0[index]
    }
}

// ===== impl Interfaces =====

impl Interfaces {
    pub(crate) fn insert(&mut self, ifname: &str) -> &mut Interface {
        // Create and insert interface into the arena.
        self.next_id += 1;
        let iface_idx = self.arena.0.insert_with(|index| {
            Interface::new(index, self.next_id, ifname.to_owned())
        });

        // Link interface to different collections.
        let iface = &mut self.arena[iface_idx];
        if self
            .name_tree
            .insert(iface.name.clone(), iface_idx)
            .is_some()
        {
            panic!("interface name={} already exists", iface.name);
        }

        iface
    }

    pub(crate) fn delete(&mut self, iface_idx: InterfaceIndex) {
        let iface = &mut self.arena[iface_idx];

        // Unlink interface from different collections.
        self.name_tree.remove(&iface.name);
        if let Some(ifindex) = iface.system.ifindex {
            self.ifindex_tree.remove(&ifindex);
        }

        // Remove interface from the arena.
        self.arena.0.remove(iface_idx);
    }

    // Update interface ifindex.
    pub(crate) fn update_ifindex(
        &mut self,
        iface_idx: InterfaceIndex,
        ifindex: Option<u32>,
    ) {
        let iface = &mut self.arena[iface_idx];
        if let Some(ifindex) = iface.system.ifindex {
            self.ifindex_tree.remove(&ifindex);
        }
        iface.system.ifindex = ifindex;
        if let Some(ifindex) = ifindex {
            self.ifindex_tree.insert(ifindex, iface_idx);
        }
    }

    // Returns a reference to the interface corresponding to the given name.
    pub(crate) fn get_by_name(&self, ifname: &str) -> Option<&Interface> {
        self.name_tree
            .get(ifname)
            .copied()
            .map(|iface_idx| &self.arena[iface_idx])
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

    // Returns an iterator visiting all interfaces.
    //
    // Interfaces are ordered by their names.
    pub fn iter(&self) -> impl Iterator<Item = &Interface> + '_ {
        self.name_tree
            .values()
            .map(|iface_idx| &self.arena[*iface_idx])
    }
}

impl std::ops::Index<InterfaceIndex> for Interfaces {
    type Output = Interface;

    fn index(&self, index: InterfaceIndex) -> &Self::Output {
        &self.arena[index]
    }
}

impl std::ops::IndexMut<InterfaceIndex> for Interfaces {
    fn index_mut(&mut self, index: InterfaceIndex) -> &mut Self::Output {
        &mut self.arena[index]
    }
}

// ===== impl Adjacencies =====

impl Adjacencies {
    pub(crate) fn insert(
        &mut self,
        iface_id: InterfaceId,
        iface_idx: InterfaceIndex,
        system_id: SystemId,
    ) -> (AdjacencyIndex, &mut Adjacency) {
        // Create and insert adjacency into the arena.
        let adj_idx = self
            .arena
            .0
            .insert(Adjacency::new(iface_idx, system_id));

        // Link adjacency to the lookup tree.
        self.key_tree.insert((iface_id, system_id), adj_idx);

        (adj_idx, &mut self.arena[adj_idx])
    }

    pub(crate) fn delete(
        &mut self,
        iface_id: InterfaceId,
        adj_idx: AdjacencyIndex,
    ) {
        let adj = &mut self.arena[adj_idx];

        // Unlink adjacency from the lookup tree.
        self.key_tree.remove(&(iface_id, adj.system_id));

        // Remove adjacency from the arena.
        self.arena.0.remove(adj_idx);
    }

    // Returns the index of the adjacency corresponding to the given key.
    pub(crate) fn get_idx(
        &self,
        iface_id: InterfaceId,
        system_id: SystemId,
    ) -> Option<AdjacencyIndex> {
        self.key_tree.get(&(iface_id, system_id)).copied()
    }

    // Returns an iterator over all adjacency indexes.
    pub(crate) fn indexes(
        &self,
    ) -> impl Iterator<Item = AdjacencyIndex> + '_ {
        self.key_tree.values().copied()
    }

    // Returns an iterator visiting all adjacencies.
    pub fn iter(&self) -> impl Iterator<Item = &Adjacency> + '_ {
        self.key_tree.values().map(|adj_idx| &self.arena[*adj_idx])
    }
}

impl std::ops::Index<AdjacencyIndex> for Adjacencies {
    type Output = Adjacency;

    fn index(&self, index: AdjacencyIndex) -> &Self::Output {
        &self.arena[index]
    }
}

impl std::ops::IndexMut<AdjacencyIndex> for Adjacencies {
    fn index_mut(&mut self, index: AdjacencyIndex) -> &mut Self::Output {
        &mut self.arena[index]
    }
}
