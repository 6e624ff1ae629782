//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::Ipv6Addr;

use derive_new::new;
use ipnetwork::Ipv6Network;
use rove_utils::ibus::IbusChannelsTx;
use rove_utils::srv6::{Behavior, Locator};
use serde::{Deserialize, Serialize};

use crate::collections::{Adjacencies, Interfaces};
use crate::packet::SystemId;

#[derive(Debug)]
pub struct Instance {
    // Area tag.
    pub name: String,
    // Instance configuration data.
    pub config: InstanceCfg,
    // Instance state data.
    pub state: InstanceState,
    // Instance arenas.
    pub arenas: InstanceArenas,
    // Internal bus Tx channels.
    pub tx: IbusChannelsTx,
}

#[derive(Debug, Default)]
pub struct InstanceCfg {
    pub system_id: Option<SystemId>,
    pub srv6: Srv6Cfg,
}

// Per-area SRv6 configuration.
#[derive(Debug)]
#[derive(Deserialize, Serialize)]
pub struct Srv6Cfg {
    // Administrative status of SRv6.
    pub enabled: bool,
    // Name of the locator SIDs are allocated from.
    pub locator: Option<String>,
    // Maximum Segments Left Depth supported by the node.
    pub max_seg_left_msd: u8,
    // Maximum End Pop Depth supported by the node.
    pub max_end_pop_msd: u8,
    // Maximum H.Encaps supported by the node.
    pub max_h_encaps_msd: u8,
    // Maximum End D MSD supported by the node.
    pub max_end_d_msd: u8,
}

#[derive(Debug, Default)]
pub struct InstanceState {
    // Per-area SRv6 Data Base.
    pub srv6: Srv6Db,
}

#[derive(Debug, Default)]
pub struct Srv6Db {
    // Locator chunks granted by the broker.
    pub chunks: Vec<Srv6Chunk>,
    // SIDs bound to the locator node prefix.
    pub end_sids: Vec<Srv6EndSid>,
    // Area-wide set of allocated SID addresses.
    pub sid_addrs: BTreeSet<Ipv6Addr>,
}

// A chunk of an SRv6 locator granted to this area.
#[derive(Clone, Debug)]
#[derive(new)]
pub struct Srv6Chunk {
    pub locator: Locator,
    pub prefix: Ipv6Network,
}

// SID covering the locator node prefix.
#[derive(Clone, Debug)]
#[derive(new)]
pub struct Srv6EndSid {
    pub sid: Ipv6Addr,
    pub behavior: Behavior,
    pub locator: String,
    // Whether the SID was handed to the broker.
    pub sent: bool,
}

#[derive(Debug, Default)]
pub struct InstanceArenas {
    pub interfaces: Interfaces,
    pub adjacencies: Adjacencies,
}

// ===== impl Instance =====

impl Instance {
    pub fn new(name: &str, tx: IbusChannelsTx) -> Instance {
        Instance {
            name: name.to_owned(),
            config: Default::default(),
            state: Default::default(),
            arenas: Default::default(),
            tx,
        }
    }
}

// ===== impl Srv6Cfg =====

impl Default for Srv6Cfg {
    fn default() -> Srv6Cfg {
        Srv6Cfg {
            enabled: false,
            locator: None,
            max_seg_left_msd: Srv6Cfg::DFLT_MAX_SEG_LEFT_MSD,
            max_end_pop_msd: Srv6Cfg::DFLT_MAX_END_POP_MSD,
            max_h_encaps_msd: Srv6Cfg::DFLT_MAX_H_ENCAPS_MSD,
            max_end_d_msd: Srv6Cfg::DFLT_MAX_END_D_MSD,
        }
    }
}

impl Srv6Cfg {
    pub const DFLT_MAX_SEG_LEFT_MSD: u8 = 10;
    pub const DFLT_MAX_END_POP_MSD: u8 = 11;
    pub const DFLT_MAX_H_ENCAPS_MSD: u8 = 12;
    pub const DFLT_MAX_END_D_MSD: u8 = 13;
}
