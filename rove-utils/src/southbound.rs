//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bitflags::bitflags;
use derive_new::new;
use ipnetwork::{IpNetwork, Ipv6Network};
use serde::{Deserialize, Serialize};

use crate::protocol::Protocol;
use crate::srv6::{Behavior, LocalSidFlavor, Locator, SidStructure};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct InterfaceFlags: u8 {
        const LOOPBACK = 0x01;
        const OPERATIVE = 0x02;
        const BROADCAST = 0x04;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct AddressFlags: u8 {
        const UNNUMBERED = 0x01;
    }
}

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum Nexthop {
    Address { ifindex: u32, addr: IpAddr },
    Interface { ifindex: u32 },
    Special(NexthopSpecial),
}

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum NexthopSpecial {
    Blackhole,
    Unreachable,
    Prohibit,
}

// Outcome of a route installation request, reported back to the protocol
// that owns the route.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum RouteNotifyOutcome {
    Installed,
    FailInstall,
    BetterAdminWon,
    Removed,
    RemoveFail,
}

// ===== Ibus messages =====

#[derive(Clone, Debug)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct InterfaceUpdateMsg {
    pub ifname: String,
    pub ifindex: u32,
    pub mtu: u32,
    pub flags: InterfaceFlags,
}

#[derive(Clone, Debug)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct AddressMsg {
    pub ifname: String,
    pub addr: IpNetwork,
    pub flags: AddressFlags,
}

#[derive(Clone, Debug)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct VrfUpdateMsg {
    pub name: String,
    pub vrf_id: u32,
    pub table_id: u32,
    pub active: bool,
}

#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub struct RouteMsg {
    pub protocol: Protocol,
    pub prefix: IpNetwork,
    pub distance: u32,
    pub metric: u32,
    pub tag: Option<u32>,
    pub nexthops: BTreeSet<Nexthop>,
    // VPN SID for SRv6 route encapsulation.
    pub vpn_sid: Option<Ipv6Addr>,
}

#[derive(Clone, Debug)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct RouteKeyMsg {
    pub protocol: Protocol,
    pub prefix: IpNetwork,
}

#[derive(Clone, Debug)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct RouteNotifyMsg {
    pub protocol: Protocol,
    pub prefix: IpNetwork,
    pub table_id: u32,
    pub outcome: RouteNotifyOutcome,
}

// Context block attached to a local-SID installation request, carrying the
// attributes the behavior requires.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LocalSidContext {
    pub nh4: Option<Ipv4Addr>,
    pub nh6: Option<Ipv6Addr>,
    pub table_id: Option<u32>,
    pub flavor: Option<LocalSidFlavor>,
}

#[derive(Clone, Debug)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct LocalSidMsg {
    pub protocol: Protocol,
    pub sid: Ipv6Addr,
    pub behavior: Behavior,
    pub oif: u32,
    pub ctx: LocalSidContext,
    pub structure: SidStructure,
}

#[derive(Clone, Debug)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct LocalSidKeyMsg {
    pub protocol: Protocol,
    pub sid: Ipv6Addr,
    pub oif: u32,
}

#[derive(Clone, Debug)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct LocatorChunkMsg {
    pub locator: Locator,
    pub chunk: Ipv6Network,
    pub proto: Protocol,
}

// ===== impl Nexthop =====

impl Nexthop {
    // Returns the interface the nexthop points out of, if any.
    pub fn ifindex(&self) -> Option<u32> {
        match self {
            Nexthop::Address { ifindex, .. }
            | Nexthop::Interface { ifindex } => Some(*ifindex),
            Nexthop::Special(_) => None,
        }
    }
}
