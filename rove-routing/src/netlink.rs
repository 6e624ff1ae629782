//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use capctl::caps::CapState;
use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use rove_utils::protocol::Protocol;
use rove_utils::southbound::Nexthop;
use rtnetlink::{Handle, RouteAddRequest, new_connection};
use tracing::error;

use crate::rib::Route;

// Route protocol types as defined in the rtnetlink.h kernel header.
const NETLINK_PROTO_UNSPEC: u8 = 0;
const NETLINK_PROTO_KERNEL: u8 = 2;
const NETLINK_PROTO_STATIC: u8 = 4;
const NETLINK_PROTO_BGP: u8 = 186;
const NETLINK_PROTO_ISIS: u8 = 187;

pub(crate) fn netlink_protocol(protocol: Protocol) -> u8 {
    match protocol {
        Protocol::BGP => NETLINK_PROTO_BGP,
        Protocol::DIRECT => NETLINK_PROTO_KERNEL,
        Protocol::ISIS => NETLINK_PROTO_ISIS,
        Protocol::STATIC => NETLINK_PROTO_STATIC,
        #[allow(unreachable_patterns)]
        _ => NETLINK_PROTO_UNSPEC,
    }
}

// Builds the netlink request programming the given IPv4 route.
//
// SRv6 local SIDs and encapsulation routes have no equivalent in the
// `rtnetlink` crate; their forwarding-plane sink is the FPM mirror.
pub fn ip_route_request_v4(
    handle: &Handle,
    prefix: Ipv4Network,
    route: &Route,
) -> Option<RouteAddRequest<Ipv4Addr>> {
    if route.srv6.is_some() {
        return None;
    }

    let mut request = handle
        .route()
        .add()
        .protocol(netlink_protocol(route.protocol))
        .v4()
        .replace()
        .destination_prefix(prefix.ip(), prefix.prefix());
    for nexthop in route.nexthops.iter() {
        request = match nexthop {
            Nexthop::Address {
                addr: IpAddr::V4(addr),
                ifindex,
            } => request.gateway(*addr).output_interface(*ifindex),
            Nexthop::Interface { ifindex } => {
                request.output_interface(*ifindex)
            }
            // Special nexthops aren't supported by the `rtnetlink` crate.
            _ => request,
        };
    }

    Some(request)
}

// Builds the netlink request programming the given IPv6 route.
pub fn ip_route_request_v6(
    handle: &Handle,
    prefix: Ipv6Network,
    route: &Route,
) -> Option<RouteAddRequest<Ipv6Addr>> {
    if route.srv6.is_some() {
        return None;
    }

    let mut request = handle
        .route()
        .add()
        .protocol(netlink_protocol(route.protocol))
        .v6()
        .replace()
        .destination_prefix(prefix.ip(), prefix.prefix());
    for nexthop in route.nexthops.iter() {
        request = match nexthop {
            Nexthop::Address {
                addr: IpAddr::V6(addr),
                ifindex,
            } => request.gateway(*addr).output_interface(*ifindex),
            Nexthop::Interface { ifindex } => {
                request.output_interface(*ifindex)
            }
            // Special nexthops aren't supported by the `rtnetlink` crate.
            _ => request,
        };
    }

    Some(request)
}

pub(crate) async fn ip_route_install(
    handle: &Handle,
    prefix: &IpNetwork,
    route: &Route,
) {
    match prefix {
        IpNetwork::V4(prefix) => {
            let Some(request) = ip_route_request_v4(handle, *prefix, route)
            else {
                return;
            };
            if let Err(error) = request.execute().await {
                error!(%prefix, %error, "failed to install route");
            }
        }
        IpNetwork::V6(prefix) => {
            let Some(request) = ip_route_request_v6(handle, *prefix, route)
            else {
                return;
            };
            if let Err(error) = request.execute().await {
                error!(%prefix, %error, "failed to install route");
            }
        }
    }
}

pub(crate) async fn ip_route_uninstall(
    handle: &Handle,
    prefix: &IpNetwork,
    route: &Route,
) {
    // The deletion reuses the message derived from the add request.
    let message = match prefix {
        IpNetwork::V4(prefix) => ip_route_request_v4(handle, *prefix, route)
            .map(|mut request| request.message_mut().clone()),
        IpNetwork::V6(prefix) => ip_route_request_v6(handle, *prefix, route)
            .map(|mut request| request.message_mut().clone()),
    };
    let Some(message) = message else {
        return;
    };

    if let Err(error) = handle.route().del(message).execute().await {
        error!(%prefix, %error, "failed to uninstall route");
    }
}

// Opens the netlink socket and spawns its request driver on a dedicated
// thread. That thread keeps the elevated capabilities needed to program
// routes after the daemon drops its own.
pub(crate) fn init() -> std::io::Result<Handle> {
    let (conn, handle, _) = new_connection()?;

    std::thread::spawn(|| {
        match CapState::get_current() {
            Ok(mut caps) => {
                caps.effective = caps.permitted;
                if let Err(error) = caps.set_current() {
                    error!(%error, "failed to raise netlink thread capabilities");
                }
            }
            Err(error) => {
                error!(%error, "failed to read current capabilities");
            }
        }

        // Serve requests initiated by the netlink handle.
        futures::executor::block_on(conn)
    });

    Ok(handle)
}
