//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::protocol::Protocol;
use crate::southbound::{
    AddressMsg, InterfaceUpdateMsg, LocalSidKeyMsg, LocalSidMsg,
    LocatorChunkMsg, RouteKeyMsg, RouteMsg, RouteNotifyMsg, VrfUpdateMsg,
};
use crate::srv6::Locator;
use crate::{UnboundedReceiver, UnboundedSender};

// Useful type definition(s).
pub type IbusReceiver = UnboundedReceiver<IbusMsg>;
pub type IbusSender = UnboundedSender<IbusMsg>;

// Ibus output channels.
#[derive(Clone, Debug)]
pub struct IbusChannelsTx {
    pub routing: UnboundedSender<IbusMsg>,
    pub staticd: UnboundedSender<IbusMsg>,
    pub isis: UnboundedSender<IbusMsg>,
}

// Ibus input channels.
#[derive(Debug)]
pub struct IbusChannelsRx {
    pub routing: UnboundedReceiver<IbusMsg>,
    pub staticd: UnboundedReceiver<IbusMsg>,
    pub isis: UnboundedReceiver<IbusMsg>,
}

// Ibus message for communication among the different Rove components.
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub enum IbusMsg {
    // Broker (re)connection notification. Clients clear their
    // sent-to-broker state and re-issue requests.
    Connected,
    // Interface update notification.
    InterfaceUpd(InterfaceUpdateMsg),
    // Interface delete notification.
    InterfaceDel(String),
    // Interface address addition notification.
    InterfaceAddressAdd(AddressMsg),
    // Interface address delete notification.
    InterfaceAddressDel(AddressMsg),
    // VRF update notification.
    VrfUpd(VrfUpdateMsg),
    // VRF delete notification.
    VrfDel(String),
    // Nexthop tracking registration.
    NexthopTrack(IpAddr),
    // Nexthop tracking unregistration.
    NexthopUntrack(IpAddr),
    // Nexthop tracking update.
    NexthopUpd { addr: IpAddr, metric: Option<u32> },
    // Request to install IP route in the RIB.
    RouteIpAdd(RouteMsg),
    // Request to uninstall IP route from the RIB.
    RouteIpDel(RouteKeyMsg),
    // Route installation outcome notification.
    RouteNotify(RouteNotifyMsg),
    // Request to install an SRv6 local SID.
    LocalSidAdd(LocalSidMsg),
    // Request to uninstall an SRv6 local SID.
    LocalSidDel(LocalSidKeyMsg),
    // SRv6 locator update notification.
    LocatorUpd(Locator),
    // SRv6 locator delete notification.
    LocatorDel(String),
    // Request for a chunk of an SRv6 locator.
    LocatorChunkGet { locator: String, proto: Protocol },
    // Release of a previously requested locator chunk.
    LocatorChunkRelease { locator: String, proto: Protocol },
    // Locator chunk grant notification.
    LocatorChunkUpd(LocatorChunkMsg),
}

// Failure to hand a message to the broker.
#[derive(Debug)]
pub struct SendError;

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to send message to the broker")
    }
}

impl std::error::Error for SendError {}

// ===== impl IbusChannelsTx =====

impl IbusChannelsTx {
    // Request to install an SRv6 local SID.
    //
    // Unlike the notification helpers, installation requests report send
    // failures so the caller can keep its sent-to-broker state accurate.
    pub fn localsid_add(&self, msg: LocalSidMsg) -> Result<(), SendError> {
        self.routing
            .send(IbusMsg::LocalSidAdd(msg))
            .map_err(|_| SendError)
    }

    // Request to uninstall an SRv6 local SID.
    pub fn localsid_del(&self, msg: LocalSidKeyMsg) -> Result<(), SendError> {
        self.routing
            .send(IbusMsg::LocalSidDel(msg))
            .map_err(|_| SendError)
    }

    // Nexthop tracking registration.
    pub fn nexthop_track(&self, addr: IpAddr) {
        let _ = self.routing.send(IbusMsg::NexthopTrack(addr));
    }

    // Nexthop tracking unregistration.
    pub fn nexthop_untrack(&self, addr: IpAddr) {
        let _ = self.routing.send(IbusMsg::NexthopUntrack(addr));
    }

    // Request to install IP route in the RIB.
    pub fn route_ip_add(&self, msg: RouteMsg) {
        let _ = self.routing.send(IbusMsg::RouteIpAdd(msg));
    }

    // Request to uninstall IP route from the RIB.
    pub fn route_ip_del(&self, msg: RouteKeyMsg) {
        let _ = self.routing.send(IbusMsg::RouteIpDel(msg));
    }

    // Request a chunk of the given SRv6 locator.
    pub fn locator_chunk_get(&self, locator: &str, proto: Protocol) {
        let _ = self.routing.send(IbusMsg::LocatorChunkGet {
            locator: locator.to_owned(),
            proto,
        });
    }

    // Release a previously requested locator chunk.
    pub fn locator_chunk_release(&self, locator: &str, proto: Protocol) {
        let _ = self.routing.send(IbusMsg::LocatorChunkRelease {
            locator: locator.to_owned(),
            proto,
        });
    }

    // Notify all protocol clients that the broker is up.
    pub fn notify_connected(&self) {
        for tx in self.clients() {
            let _ = tx.send(IbusMsg::Connected);
        }
    }

    // Interface update notification.
    pub fn notify_interface_upd(&self, msg: InterfaceUpdateMsg) {
        for tx in self.clients() {
            let _ = tx.send(IbusMsg::InterfaceUpd(msg.clone()));
        }
    }

    // Interface delete notification.
    pub fn notify_interface_del(&self, ifname: String) {
        for tx in self.clients() {
            let _ = tx.send(IbusMsg::InterfaceDel(ifname.clone()));
        }
    }

    // Interface address addition notification.
    pub fn notify_addr_add(&self, msg: AddressMsg) {
        for tx in self.clients() {
            let _ = tx.send(IbusMsg::InterfaceAddressAdd(msg.clone()));
        }
    }

    // Interface address delete notification.
    pub fn notify_addr_del(&self, msg: AddressMsg) {
        for tx in self.clients() {
            let _ = tx.send(IbusMsg::InterfaceAddressDel(msg.clone()));
        }
    }

    // VRF update notification.
    pub fn notify_vrf_upd(&self, msg: VrfUpdateMsg) {
        for tx in self.clients() {
            let _ = tx.send(IbusMsg::VrfUpd(msg.clone()));
        }
    }

    // VRF delete notification.
    pub fn notify_vrf_del(&self, name: String) {
        for tx in self.clients() {
            let _ = tx.send(IbusMsg::VrfDel(name.clone()));
        }
    }

    // Nexthop tracking update.
    pub fn notify_nexthop_upd(&self, addr: IpAddr, metric: Option<u32>) {
        for tx in self.clients() {
            let _ = tx.send(IbusMsg::NexthopUpd { addr, metric });
        }
    }

    // Route installation outcome, sent to the owning protocol only.
    pub fn notify_route_owner(&self, msg: RouteNotifyMsg) {
        if let Some(tx) = self.client(msg.protocol) {
            let _ = tx.send(IbusMsg::RouteNotify(msg));
        }
    }

    // SRv6 locator update notification.
    pub fn notify_locator_upd(&self, locator: Locator) {
        for tx in self.clients() {
            let _ = tx.send(IbusMsg::LocatorUpd(locator.clone()));
        }
    }

    // SRv6 locator delete notification.
    pub fn notify_locator_del(&self, name: String) {
        for tx in self.clients() {
            let _ = tx.send(IbusMsg::LocatorDel(name.clone()));
        }
    }

    // Locator chunk grant, sent to the owning protocol only.
    pub fn notify_locator_chunk(&self, msg: LocatorChunkMsg) {
        if let Some(tx) = self.client(msg.proto) {
            let _ = tx.send(IbusMsg::LocatorChunkUpd(msg));
        }
    }

    fn clients(&self) -> [&UnboundedSender<IbusMsg>; 2] {
        [&self.staticd, &self.isis]
    }

    fn client(&self, proto: Protocol) -> Option<&UnboundedSender<IbusMsg>> {
        match proto {
            Protocol::STATIC => Some(&self.staticd),
            Protocol::ISIS => Some(&self.isis),
            _ => None,
        }
    }
}

// ===== global functions =====

pub fn ibus_channels() -> (IbusChannelsTx, IbusChannelsRx) {
    let (routing_tx, routing_rx) = mpsc::unbounded_channel();
    let (staticd_tx, staticd_rx) = mpsc::unbounded_channel();
    let (isis_tx, isis_rx) = mpsc::unbounded_channel();

    let tx = IbusChannelsTx {
        routing: routing_tx,
        staticd: staticd_tx,
        isis: isis_tx,
    };
    let rx = IbusChannelsRx {
        routing: routing_rx,
        staticd: staticd_rx,
        isis: isis_rx,
    };

    (tx, rx)
}
