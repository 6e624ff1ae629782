//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use chrono::Utc;
use const_addrs::{ip4, ip6, net4, net6};
use netlink_packet_route::route::Nla;
use rove_routing::netlink::{ip_route_request_v4, ip_route_request_v6};
use rove_routing::rib::{Route, RouteFlags, RouteSrv6, RT_TABLE_MAIN};
use rove_utils::protocol::Protocol;
use rove_utils::southbound::{LocalSidContext, Nexthop, NexthopSpecial};
use rove_utils::srv6::{Behavior, SidStructure};

//
// Helper functions.
//

fn route(
    protocol: Protocol,
    nexthops: Vec<Nexthop>,
    srv6: Option<RouteSrv6>,
) -> Route {
    Route::new(
        protocol,
        0,
        0,
        None,
        RT_TABLE_MAIN,
        BTreeSet::from_iter(nexthops),
        srv6,
        Utc::now(),
        RouteFlags::empty(),
    )
}

//
// Test functions.
//

// The IPv6 request carries the destination prefix, protocol, gateway and
// outgoing interface of the route.
#[tokio::test]
async fn build_v6_route_request() {
    let (_conn, handle, _rx) = rtnetlink::new_connection().unwrap();
    let route = route(
        Protocol::STATIC,
        vec![Nexthop::Address {
            ifindex: 2,
            addr: ip6!("fe80::2").into(),
        }],
        None,
    );

    let mut request =
        ip_route_request_v6(&handle, net6!("2001:db8:100::/48"), &route)
            .unwrap();
    let message = request.message_mut();

    assert_eq!(message.header.destination_prefix_length, 48);
    assert_eq!(message.header.protocol, 4);
    assert!(message.nlas.iter().any(|nla| matches!(nla,
        Nla::Destination(addr) if addr == &ip6!("2001:db8:100::").octets())));
    assert!(message.nlas.iter().any(|nla| matches!(nla,
        Nla::Gateway(addr) if addr == &ip6!("fe80::2").octets())));
    assert!(message
        .nlas
        .iter()
        .any(|nla| matches!(nla, Nla::Oif(2))));
}

// The IPv4 request maps the owner protocol to its rtnetlink.h code and
// skips nexthops of the wrong address family.
#[tokio::test]
async fn build_v4_route_request() {
    let (_conn, handle, _rx) = rtnetlink::new_connection().unwrap();
    let route = route(
        Protocol::ISIS,
        vec![
            Nexthop::Address {
                ifindex: 2,
                addr: ip4!("192.0.2.1").into(),
            },
            Nexthop::Address {
                ifindex: 3,
                addr: ip6!("fe80::3").into(),
            },
        ],
        None,
    );

    let mut request =
        ip_route_request_v4(&handle, net4!("10.0.0.0/24"), &route).unwrap();
    let message = request.message_mut();

    assert_eq!(message.header.destination_prefix_length, 24);
    assert_eq!(message.header.protocol, 187);
    assert!(message.nlas.iter().any(|nla| matches!(nla,
        Nla::Gateway(addr) if addr == &ip4!("192.0.2.1").octets())));
    assert!(message
        .nlas
        .iter()
        .any(|nla| matches!(nla, Nla::Oif(2))));
    assert!(!message
        .nlas
        .iter()
        .any(|nla| matches!(nla, Nla::Oif(3))));
}

// Interface-only nexthops produce no gateway attribute.
#[tokio::test]
async fn build_interface_route_request() {
    let (_conn, handle, _rx) = rtnetlink::new_connection().unwrap();
    let route = route(
        Protocol::STATIC,
        vec![Nexthop::Interface { ifindex: 2 }],
        None,
    );

    let mut request =
        ip_route_request_v6(&handle, net6!("fc00::1/128"), &route).unwrap();
    let message = request.message_mut();

    assert!(message
        .nlas
        .iter()
        .any(|nla| matches!(nla, Nla::Oif(2))));
    assert!(!message
        .nlas
        .iter()
        .any(|nla| matches!(nla, Nla::Gateway(_))));
}

// Special nexthops aren't programmable through the `rtnetlink` crate and
// leave no nexthop attributes behind.
#[tokio::test]
async fn build_blackhole_route_request() {
    let (_conn, handle, _rx) = rtnetlink::new_connection().unwrap();
    let route = route(
        Protocol::STATIC,
        vec![Nexthop::Special(NexthopSpecial::Blackhole)],
        None,
    );

    let mut request =
        ip_route_request_v6(&handle, net6!("2001:db8:dead::/48"), &route)
            .unwrap();
    let message = request.message_mut();

    assert!(!message
        .nlas
        .iter()
        .any(|nla| matches!(nla, Nla::Gateway(_) | Nla::Oif(_))));
}

// SRv6 routes are never handed to the kernel through rtnetlink; the FPM
// mirror is their sink.
#[tokio::test]
async fn srv6_routes_are_not_programmed() {
    let (_conn, handle, _rx) = rtnetlink::new_connection().unwrap();

    let localsid = route(
        Protocol::STATIC,
        vec![Nexthop::Interface { ifindex: 2 }],
        Some(RouteSrv6::LocalSid {
            behavior: Behavior::End,
            ctx: LocalSidContext::default(),
            structure: SidStructure::USID_F3216,
        }),
    );
    assert!(
        ip_route_request_v6(&handle, net6!("fc00::1/128"), &localsid)
            .is_none()
    );

    let encap = route(
        Protocol::BGP,
        vec![Nexthop::Address {
            ifindex: 2,
            addr: ip4!("192.0.2.1").into(),
        }],
        Some(RouteSrv6::Encap {
            vpn_sid: ip6!("fc00::100"),
        }),
    );
    assert!(
        ip_route_request_v4(&handle, net4!("10.0.0.0/24"), &encap).is_none()
    );
}
