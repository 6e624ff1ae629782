//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet, HashMap, btree_map};
use std::net::{IpAddr, Ipv6Addr};

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use derive_new::new;
use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use prefix_trie::map::PrefixMap;
use rove_utils::ibus::IbusChannelsTx;
use rove_utils::ip::Ipv6NetworkExt;
use rove_utils::protocol::Protocol;
use rove_utils::southbound::{
    LocalSidContext, LocalSidKeyMsg, LocalSidMsg, Nexthop, RouteKeyMsg,
    RouteMsg, RouteNotifyMsg, RouteNotifyOutcome,
};
use rove_utils::srv6::{Behavior, SidStructure};
use rove_utils::{UnboundedReceiver, UnboundedSender};
use tokio::sync::mpsc;
use tracing::debug;

use crate::fpm::{self, FpmSender};
use crate::interface::Vrfs;
use crate::netlink;
use crate::srv6::Srv6;

// Main routing table ID.
pub const RT_TABLE_MAIN: u32 = 254;

#[derive(Debug)]
pub struct Rib {
    pub ipv4: PrefixMap<Ipv4Network, BTreeMap<u32, Route>>,
    pub ipv6: PrefixMap<Ipv6Network, BTreeMap<u32, Route>>,
    pub nht: HashMap<IpAddr, Option<u32>>,
    pub ip_update_queue: BTreeSet<IpNetwork>,
    pub update_queue_tx: UnboundedSender<()>,
    pub update_queue_rx: UnboundedReceiver<()>,
}

#[derive(Clone, Debug, new)]
pub struct Route {
    pub protocol: Protocol,
    pub distance: u32,
    pub metric: u32,
    pub tag: Option<u32>,
    pub table_id: u32,
    pub nexthops: BTreeSet<Nexthop>,
    pub srv6: Option<RouteSrv6>,
    pub last_updated: DateTime<Utc>,
    pub flags: RouteFlags,
}

// SRv6 information attached to a route.
#[derive(Clone, Debug)]
pub enum RouteSrv6 {
    // The route is a local SID binding.
    LocalSid {
        behavior: Behavior,
        ctx: LocalSidContext,
        structure: SidStructure,
    },
    // Matching packets are encapsulated with the VPN SID.
    Encap { vpn_sid: Ipv6Addr },
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct RouteFlags: u8 {
        const ACTIVE = 0x01;
        const REMOVED = 0x02;
    }
}

// ===== impl Rib =====

impl Rib {
    // Adds a local SID binding to the RIB.
    pub(crate) fn localsid_add(&mut self, msg: LocalSidMsg) {
        let prefix = host_prefix(msg.sid);
        let rib_prefix = self.prefix_entry(prefix);
        let distance = 0;

        let mut nexthops = BTreeSet::new();
        nexthops.insert(Nexthop::Interface { ifindex: msg.oif });

        let srv6 = Some(RouteSrv6::LocalSid {
            behavior: msg.behavior,
            ctx: msg.ctx,
            structure: msg.structure,
        });

        match rib_prefix.entry(distance) {
            btree_map::Entry::Vacant(v) => {
                v.insert(Route::new(
                    msg.protocol,
                    distance,
                    0,
                    None,
                    RT_TABLE_MAIN,
                    nexthops,
                    srv6,
                    Utc::now(),
                    RouteFlags::empty(),
                ));
            }
            btree_map::Entry::Occupied(o) => {
                let route = o.into_mut();

                // Update the existing binding with the new information.
                route.protocol = msg.protocol;
                route.nexthops = nexthops;
                route.srv6 = srv6;
                route.last_updated = Utc::now();
                route.flags.remove(RouteFlags::REMOVED);
            }
        }

        // Add route to the update queue.
        self.ip_update_queue_add(prefix);
    }

    // Removes a local SID binding from the RIB.
    pub(crate) fn localsid_del(&mut self, msg: LocalSidKeyMsg) {
        let prefix = host_prefix(msg.sid);
        let rib_prefix = self.prefix_entry(prefix);

        if let Some(route) = rib_prefix
            .values_mut()
            .filter(|route| route.protocol == msg.protocol)
            .find(|route| {
                matches!(route.srv6, Some(RouteSrv6::LocalSid { .. }))
            })
        {
            // Mark route as removed.
            route.flags.insert(RouteFlags::REMOVED);

            // Add route to the update queue.
            self.ip_update_queue_add(prefix);
        }
    }

    // Adds IP route to the RIB.
    pub(crate) fn ip_route_add(&mut self, msg: RouteMsg) {
        let rib_prefix = self.prefix_entry(msg.prefix);
        let srv6 = msg
            .vpn_sid
            .map(|vpn_sid| RouteSrv6::Encap { vpn_sid });
        match rib_prefix.entry(msg.distance) {
            btree_map::Entry::Vacant(v) => {
                // If the IP route does not exist, create a new entry.
                v.insert(Route::new(
                    msg.protocol,
                    msg.distance,
                    msg.metric,
                    msg.tag,
                    RT_TABLE_MAIN,
                    msg.nexthops,
                    srv6,
                    Utc::now(),
                    RouteFlags::empty(),
                ));
            }
            btree_map::Entry::Occupied(o) => {
                let route = o.into_mut();

                // Update the existing IP route with the new information.
                route.protocol = msg.protocol;
                route.metric = msg.metric;
                route.tag = msg.tag;
                route.nexthops = msg.nexthops;
                route.srv6 = srv6;
                route.last_updated = Utc::now();
                route.flags.remove(RouteFlags::REMOVED);
            }
        }

        // Add IP route to the update queue.
        self.ip_update_queue_add(msg.prefix);
    }

    // Removes IP route from the RIB.
    pub(crate) fn ip_route_del(&mut self, msg: RouteKeyMsg) {
        let rib_prefix = self.prefix_entry(msg.prefix);

        // Find IP route entry from the same advertising protocol.
        if let Some(route) = rib_prefix
            .values_mut()
            .find(|route| route.protocol == msg.protocol)
        {
            // Mark IP route as removed.
            route.flags.insert(RouteFlags::REMOVED);

            // Add IP route to the update queue.
            self.ip_update_queue_add(msg.prefix);
        }
    }

    // Nexthop tracking registration.
    pub(crate) fn nht_add(&mut self, addr: IpAddr, ibus_tx: &IbusChannelsTx) {
        debug!(%addr, "nexthop tracking add");
        let metric = self.nht_evaluate(&addr);
        ibus_tx.notify_nexthop_upd(addr, metric);
        self.nht.entry(addr).or_insert(metric);
    }

    // Nexthop tracking unregistration.
    pub(crate) fn nht_del(&mut self, addr: IpAddr) {
        debug!(%addr, "nexthop tracking delete");
        self.nht.remove(&addr);
    }

    // Processes routes present in the update queue.
    pub async fn process_update_queue(
        &mut self,
        netlink_handle: Option<&rtnetlink::Handle>,
        vrfs: &Vrfs,
        srv6: &Srv6,
        fpm_tx: Option<&FpmSender>,
        ibus_tx: &IbusChannelsTx,
    ) {
        while let Some(prefix) = self.ip_update_queue.pop_first() {
            let rib_prefix = self.prefix_entry(prefix);

            // Handle routes marked with the REMOVED flag.
            for route in rib_prefix
                .values()
                .filter(|route| route.flags.contains(RouteFlags::REMOVED))
            {
                if route.flags.contains(RouteFlags::ACTIVE) {
                    // Uninstall the route using the netlink handle.
                    if let Some(netlink_handle) = netlink_handle {
                        if route.protocol != Protocol::DIRECT {
                            netlink::ip_route_uninstall(
                                netlink_handle,
                                &prefix,
                                route,
                            )
                            .await;
                        }
                    }

                    // Mirror the removal to the FPM.
                    if let Some(fpm_tx) = fpm_tx {
                        fpm::mirror_route(
                            fpm_tx,
                            fpm::netlink::RTM_DELROUTE,
                            &prefix,
                            route,
                            vrfs,
                            srv6.encap_src_addr,
                        );
                    }
                }

                // Notify the owner protocol about the withdrawal.
                ibus_tx.notify_route_owner(RouteNotifyMsg::new(
                    route.protocol,
                    prefix,
                    route.table_id,
                    RouteNotifyOutcome::Removed,
                ));
            }
            rib_prefix
                .retain(|_, route| !route.flags.contains(RouteFlags::REMOVED));

            // Select and (re)install the best route for this prefix.
            for (idx, route) in rib_prefix.values_mut().enumerate() {
                if idx == 0 {
                    // Mark the route as the preferred one.
                    route.flags.insert(RouteFlags::ACTIVE);

                    // Install the route using the netlink handle.
                    if let Some(netlink_handle) = netlink_handle {
                        if route.protocol != Protocol::DIRECT {
                            netlink::ip_route_install(
                                netlink_handle,
                                &prefix,
                                route,
                            )
                            .await;
                        }
                    }

                    // Mirror the route to the FPM.
                    if let Some(fpm_tx) = fpm_tx {
                        fpm::mirror_route(
                            fpm_tx,
                            fpm::netlink::RTM_NEWROUTE,
                            &prefix,
                            route,
                            vrfs,
                            srv6.encap_src_addr,
                        );
                    }

                    // Notify the owner protocol about the installation.
                    ibus_tx.notify_route_owner(RouteNotifyMsg::new(
                        route.protocol,
                        prefix,
                        route.table_id,
                        RouteNotifyOutcome::Installed,
                    ));
                } else {
                    // Remove the preferred flag for other routes.
                    route.flags.remove(RouteFlags::ACTIVE);
                }
            }

            // Check if there are no routes left for this prefix.
            if rib_prefix.is_empty() {
                // Remove prefix entry from the RIB.
                match prefix {
                    IpNetwork::V4(prefix) => {
                        self.ipv4.remove(&prefix);
                    }
                    IpNetwork::V6(prefix) => {
                        self.ipv6.remove(&prefix);
                    }
                }
            }
        }

        // Reevaluate all registered nexthops.
        let mut nht = std::mem::take(&mut self.nht);
        for (addr, metric) in &mut nht {
            let new_metric = self.nht_evaluate(addr);
            if new_metric != *metric {
                debug!(
                    %addr, old_metric = ?metric, ?new_metric,
                    "nexthop tracking update"
                );
                *metric = new_metric;
                ibus_tx.notify_nexthop_upd(*addr, *metric);
            }
        }
        self.nht = nht;
    }

    // Uninstalls all active routes.
    pub(crate) async fn uninstall_all(
        &mut self,
        netlink_handle: Option<&rtnetlink::Handle>,
    ) {
        let Some(netlink_handle) = netlink_handle else {
            return;
        };

        let routes: Vec<(IpNetwork, Route)> = self
            .ipv4
            .iter()
            .map(|(prefix, routes)| (IpNetwork::V4(*prefix), routes))
            .chain(
                self.ipv6
                    .iter()
                    .map(|(prefix, routes)| (IpNetwork::V6(*prefix), routes)),
            )
            .flat_map(|(prefix, routes)| {
                routes.values().map(move |route| (prefix, route.clone()))
            })
            .filter(|(_, route)| route.flags.contains(RouteFlags::ACTIVE))
            .filter(|(_, route)| route.protocol != Protocol::DIRECT)
            .collect();

        for (prefix, route) in &routes {
            netlink::ip_route_uninstall(netlink_handle, prefix, route).await;
        }
    }

    // Evaluates the reachability of the given nexthop address and returns
    // the metric of the route used to reach it.
    fn nht_evaluate(&self, addr: &IpAddr) -> Option<u32> {
        self.prefix_longest_match(addr).map(|route| route.metric)
    }

    // Returns RIB entry associated to the given IP prefix.
    fn prefix_entry(&mut self, prefix: IpNetwork) -> &mut BTreeMap<u32, Route> {
        match prefix {
            IpNetwork::V4(prefix) => self.ipv4.entry(prefix).or_default(),
            IpNetwork::V6(prefix) => self.ipv6.entry(prefix).or_default(),
        }
    }

    // Returns the longest matching route for the given IP address.
    fn prefix_longest_match(&self, addr: &IpAddr) -> Option<&Route> {
        let lpm = match addr {
            IpAddr::V4(addr) => {
                let prefix = Ipv4Network::new(*addr, 32).unwrap();
                let (_, lpm) = self.ipv4.get_lpm(&prefix)?;
                lpm
            }
            IpAddr::V6(addr) => {
                let prefix =
                    Ipv6Network::new(*addr, Ipv6Network::MAX_PREFIXLEN)
                        .unwrap();
                let (_, lpm) = self.ipv6.get_lpm(&prefix)?;
                lpm
            }
        };
        lpm.values()
            .next()
            .filter(|route| route.flags.contains(RouteFlags::ACTIVE))
            .filter(|route| !route.flags.contains(RouteFlags::REMOVED))
    }

    // Adds IP route to the update queue.
    fn ip_update_queue_add(&mut self, prefix: IpNetwork) {
        self.ip_update_queue.insert(prefix);
        let _ = self.update_queue_tx.send(());
    }
}

impl Default for Rib {
    fn default() -> Self {
        let (update_queue_tx, update_queue_rx) = mpsc::unbounded_channel();
        Self {
            ipv4: Default::default(),
            ipv6: Default::default(),
            nht: Default::default(),
            ip_update_queue: Default::default(),
            update_queue_tx,
            update_queue_rx,
        }
    }
}

// ===== helper functions =====

fn host_prefix(addr: Ipv6Addr) -> IpNetwork {
    IpNetwork::V6(
        Ipv6Network::new(addr, Ipv6Network::MAX_PREFIXLEN).unwrap(),
    )
}
