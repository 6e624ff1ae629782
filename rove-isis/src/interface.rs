//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use rove_utils::southbound::InterfaceFlags;
use serde::{Deserialize, Serialize};

use crate::collections::{InterfaceId, InterfaceIndex};

#[derive(Debug)]
pub struct Interface {
    pub index: InterfaceIndex,
    pub id: InterfaceId,
    pub name: String,
    pub system: InterfaceSys,
    pub config: InterfaceCfg,
}

#[derive(Debug, Default)]
pub struct InterfaceSys {
    pub ifindex: Option<u32>,
    pub mtu: Option<u32>,
    pub flags: InterfaceFlags,
}

#[derive(Debug, Default)]
pub struct InterfaceCfg {
    pub interface_type: InterfaceType,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum InterfaceType {
    #[default]
    Broadcast,
    PointToPoint,
}

// ===== impl Interface =====

impl Interface {
    pub(crate) fn new(
        index: InterfaceIndex,
        id: InterfaceId,
        name: String,
    ) -> Interface {
        Interface {
            index,
            id,
            name,
            system: Default::default(),
            config: Default::default(),
        }
    }
}

// ===== impl InterfaceType =====

impl std::fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceType::Broadcast => write!(f, "broadcast"),
            InterfaceType::PointToPoint => write!(f, "point-to-point"),
        }
    }
}
