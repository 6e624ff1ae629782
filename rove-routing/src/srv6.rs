//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv6Addr;

use ipnetwork::Ipv6Network;
use rove_utils::protocol::Protocol;
use rove_utils::southbound::LocatorChunkMsg;
use rove_utils::srv6::{Locator, SidStructure};

use crate::Master;
use crate::debug::Debug;
use crate::error::Error;

// SRv6 state of the broker.
#[derive(Debug, Default)]
pub struct Srv6 {
    // Locator catalogue, keyed by name.
    pub locators: BTreeMap<String, LocatorEntry>,
    // Source address for SRv6 encapsulation.
    pub encap_src_addr: Option<Ipv6Addr>,
    // Chunk requests waiting for their locator to be configured.
    pub pending_chunks: BTreeSet<(String, Protocol)>,
}

// A configured locator and its chunks.
#[derive(Debug)]
pub struct LocatorEntry {
    pub cfg: Locator,
    pub status_up: bool,
    pub chunks: Vec<Chunk>,
}

// A sub-prefix of a locator handed out to an owner protocol.
//
// Every owner currently receives a chunk spanning the whole locator
// prefix; owners are expected to carve disjoint function ranges out of it.
#[derive(Debug)]
pub struct Chunk {
    pub prefix: Ipv6Network,
    pub proto: Option<Protocol>,
}

// ===== global functions =====

// Creates a locator. The operation is idempotent by name.
pub(crate) fn locator_create(
    master: &mut Master,
    name: &str,
    prefix: Ipv6Network,
    block_len: u8,
    node_len: u8,
    function_len: u8,
    argument_len: u8,
    usid: bool,
) -> Result<(), Error> {
    // The locator prefix is the concatenation of the block and node parts.
    if block_len as u16 + node_len as u16 != prefix.prefix() as u16 {
        return Err(Error::LocatorBitLengths(name.to_owned()));
    }
    if function_len < 1 {
        return Err(Error::LocatorBitLengths(name.to_owned()));
    }
    let structure =
        SidStructure::new(block_len, node_len, function_len, argument_len)
            .map_err(Error::InvalidSidStructure)?;

    let cfg = Locator::new(name.to_owned(), prefix, structure, usid);
    if let Some(entry) = master.srv6.locators.get(name) {
        if entry.cfg == cfg {
            return Ok(());
        }
        // A locator change is a delete followed by a recreate.
        locator_delete(master, name)?;
    }

    Debug::LocatorCreate(name, &prefix).log();
    master.srv6.locators.insert(
        name.to_owned(),
        LocatorEntry {
            cfg: cfg.clone(),
            status_up: true,
            chunks: vec![Chunk {
                prefix,
                proto: None,
            }],
        },
    );

    // Notify the protocol clients.
    master.ibus_tx.notify_locator_upd(cfg);

    // Serve chunk requests that were waiting for this locator.
    let pending = std::mem::take(&mut master.srv6.pending_chunks);
    for (locator, proto) in pending {
        if locator == name {
            let _ = chunk_alloc(master, &locator, proto);
        } else {
            master.srv6.pending_chunks.insert((locator, proto));
        }
    }

    Ok(())
}

// Deletes a locator, releasing all of its chunks.
//
// Each owner is notified so every SID allocated from the released chunks
// is withdrawn.
pub(crate) fn locator_delete(
    master: &mut Master,
    name: &str,
) -> Result<(), Error> {
    let Some(_entry) = master.srv6.locators.remove(name) else {
        return Err(Error::LocatorNotFound(name.to_owned()));
    };

    Debug::LocatorDelete(name).log();
    master.ibus_tx.notify_locator_del(name.to_owned());

    Ok(())
}

// Hands a chunk of the given locator to the requesting protocol.
//
// For any locator and owner there is at most one outstanding chunk; a
// repeated request returns the already allocated one.
pub(crate) fn chunk_alloc(
    master: &mut Master,
    name: &str,
    proto: Protocol,
) -> Result<(), Error> {
    if !master.srv6.locators.contains_key(name) {
        // Served when the locator gets configured.
        master
            .srv6
            .pending_chunks
            .insert((name.to_owned(), proto));
        return Ok(());
    }
    let entry = master.srv6.locators.get_mut(name).unwrap();

    let chunk_prefix = match entry
        .chunks
        .iter_mut()
        .find(|chunk| chunk.proto == Some(proto))
    {
        Some(chunk) => chunk.prefix,
        None => {
            // Claim the free chunk if one is left, otherwise share the
            // locator prefix through a new chunk.
            match entry
                .chunks
                .iter_mut()
                .find(|chunk| chunk.proto.is_none())
            {
                Some(chunk) => {
                    chunk.proto = Some(proto);
                    chunk.prefix
                }
                None => {
                    let prefix = entry.cfg.prefix;
                    entry.chunks.push(Chunk {
                        prefix,
                        proto: Some(proto),
                    });
                    prefix
                }
            }
        }
    };

    Debug::ChunkAlloc(name, &chunk_prefix, &proto).log();
    let msg = LocatorChunkMsg::new(entry.cfg.clone(), chunk_prefix, proto);
    master.ibus_tx.notify_locator_chunk(msg);

    Ok(())
}

// Releases the chunk owned by the given protocol.
pub(crate) fn chunk_release(
    master: &mut Master,
    name: &str,
    proto: Protocol,
) -> Result<(), Error> {
    master.srv6.pending_chunks.remove(&(name.to_owned(), proto));

    let Some(entry) = master.srv6.locators.get_mut(name) else {
        return Err(Error::LocatorNotFound(name.to_owned()));
    };

    if let Some(chunk) = entry
        .chunks
        .iter_mut()
        .find(|chunk| chunk.proto == Some(proto))
    {
        Debug::ChunkRelease(name, &proto).log();
        chunk.proto = None;
    }

    Ok(())
}

// Sets the source address for SRv6 encapsulation.
pub(crate) fn encap_src_addr_set(master: &mut Master, addr: Ipv6Addr) {
    master.srv6.encap_src_addr = Some(addr);
}

// Unsets the source address for SRv6 encapsulation.
pub(crate) fn encap_src_addr_unset(master: &mut Master) {
    master.srv6.encap_src_addr = None;
}
