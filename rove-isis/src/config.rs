//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use rove_utils::protocol::Protocol;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::instance::Instance;
use crate::interface::InterfaceType;
use crate::packet::SystemId;
use crate::srv6;

// Configuration operations accepted by the IS-IS daemon.
//
// Each operation is idempotent on the resulting state.
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub enum Command {
    SystemIdSet(SystemId),
    InterfaceAdd {
        name: String,
        interface_type: InterfaceType,
    },
    InterfaceDelete {
        name: String,
    },
    Srv6Enable,
    Srv6Disable,
    Srv6LocatorSet(String),
    Srv6LocatorUnset,
}

// ===== global functions =====

pub fn process_command(
    instance: &mut Instance,
    command: Command,
) -> Result<(), Error> {
    match command {
        Command::SystemIdSet(system_id) => {
            instance.config.system_id = Some(system_id);
            Ok(())
        }
        Command::InterfaceAdd {
            name,
            interface_type,
        } => interface_add(instance, &name, interface_type),
        Command::InterfaceDelete { name } => interface_delete(instance, &name),
        Command::Srv6Enable => srv6_enable(instance),
        Command::Srv6Disable => srv6_disable(instance),
        Command::Srv6LocatorSet(name) => srv6_locator_set(instance, &name),
        Command::Srv6LocatorUnset => srv6_locator_unset(instance),
    }
}

// ===== helper functions =====

fn interface_add(
    instance: &mut Instance,
    name: &str,
    interface_type: InterfaceType,
) -> Result<(), Error> {
    if instance.arenas.interfaces.get_by_name(name).is_none() {
        instance.arenas.interfaces.insert(name);
    }
    let iface = instance.arenas.interfaces.get_mut_by_name(name).unwrap();
    iface.config.interface_type = interface_type;

    Ok(())
}

fn interface_delete(instance: &mut Instance, name: &str) -> Result<(), Error> {
    if instance.arenas.interfaces.get_by_name(name).is_none() {
        return Ok(());
    }

    // Adjacency teardown included.
    crate::events::process_iface_delete(instance, name);
    let iface_idx = instance
        .arenas
        .interfaces
        .get_by_name(name)
        .map(|iface| iface.index)
        .unwrap();
    instance.arenas.interfaces.delete(iface_idx);

    Ok(())
}

fn srv6_enable(instance: &mut Instance) -> Result<(), Error> {
    if instance.config.srv6.enabled {
        return Ok(());
    }
    instance.config.srv6.enabled = true;

    if let Some(locator) = instance.config.srv6.locator.clone() {
        instance.tx.locator_chunk_get(&locator, Protocol::ISIS);
    }

    Ok(())
}

fn srv6_disable(instance: &mut Instance) -> Result<(), Error> {
    if !instance.config.srv6.enabled {
        return Ok(());
    }

    srv6::teardown(instance);
    instance.config.srv6.enabled = false;

    Ok(())
}

fn srv6_locator_set(instance: &mut Instance, name: &str) -> Result<(), Error> {
    if instance.config.srv6.locator.as_deref() == Some(name) {
        return Ok(());
    }

    // A locator change is a delete followed by a recreate.
    if instance.config.srv6.locator.is_some() {
        srv6::teardown(instance);
    }
    instance.config.srv6.locator = Some(name.to_owned());

    if instance.config.srv6.enabled {
        instance.tx.locator_chunk_get(name, Protocol::ISIS);
    }

    Ok(())
}

fn srv6_locator_unset(instance: &mut Instance) -> Result<(), Error> {
    if instance.config.srv6.locator.is_none() {
        return Ok(());
    }

    srv6::teardown(instance);
    instance.config.srv6.locator = None;

    Ok(())
}
