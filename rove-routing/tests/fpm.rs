//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use chrono::Utc;
use const_addrs::{ip4, ip6, net4, net6};
use ipnetwork::IpNetwork;
use rove_routing::Master;
use rove_routing::config::{Command, process_command};
use rove_routing::fpm;
use rove_routing::fpm::netlink::{EncodeError, RTM_DELROUTE, RTM_NEWROUTE};
use rove_routing::rib::{Route, RouteFlags, RouteSrv6, RT_TABLE_MAIN};
use rove_utils::ibus::ibus_channels;
use rove_utils::protocol::Protocol;
use rove_utils::southbound::{LocalSidContext, Nexthop, NexthopSpecial};
use rove_utils::srv6::{Behavior, SidStructure};

//
// Helper functions.
//

fn setup() -> Master {
    let (ibus_tx, _ibus_rx) = ibus_channels();
    let mut master = Master::new(ibus_tx);

    process_command(
        &mut master,
        Command::VrfAdd {
            name: "blue".to_owned(),
            vrf_id: 20,
            table_id: 100,
        },
    )
    .unwrap();

    master
}

fn route(nexthops: Vec<Nexthop>, srv6: Option<RouteSrv6>) -> Route {
    Route::new(
        Protocol::STATIC,
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

fn parse_u16(bytes: &[u8]) -> u16 {
    u16::from_ne_bytes([bytes[0], bytes[1]])
}

fn parse_u32(bytes: &[u8]) -> u32 {
    u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

// Finds an attribute in a block of rtattrs, returning its payload.
fn find_attr(mut attrs: &[u8], attr_type: u16) -> Option<&[u8]> {
    while attrs.len() >= 4 {
        let rta_len = parse_u16(&attrs[0..2]) as usize;
        let rta_type = parse_u16(&attrs[2..4]);
        if rta_len < 4 || rta_len > attrs.len() {
            return None;
        }
        if rta_type == attr_type {
            return Some(&attrs[4..rta_len]);
        }
        let aligned = (rta_len + 3) & !3;
        if aligned > attrs.len() {
            return None;
        }
        attrs = &attrs[aligned..];
    }
    None
}

// Offset of the first top-level attribute: FPM framing header, nlmsghdr
// and rtmsg.
const ATTRS_OFFSET: usize = 4 + 16 + 12;

//
// Test functions.
//

// A local-SID route carries the SRv6 local-SID encapsulation with the
// action, VRF name and the four SID structure lengths.
#[test]
fn encode_localsid_end_dt6() {
    let master = setup();
    let prefix = IpNetwork::from(net6!("2001::/64"));
    let route = route(
        vec![Nexthop::Interface { ifindex: 2 }],
        Some(RouteSrv6::LocalSid {
            behavior: Behavior::EndDt6,
            ctx: LocalSidContext {
                table_id: Some(100),
                ..Default::default()
            },
            structure: SidStructure::new(40, 24, 16, 0).unwrap(),
        }),
    );

    let mut buf = [0u8; 4096];
    let len = fpm::encode_message(
        &mut buf,
        RTM_NEWROUTE,
        &prefix,
        &route,
        &master.vrfs,
        None,
    )
    .unwrap();
    let msg = &buf[..len];

    // FPM framing header.
    assert_eq!(msg[0], 1);
    assert_eq!(msg[1], 1);
    assert_eq!(u16::from_be_bytes([msg[2], msg[3]]) as usize, len);

    // Netlink header.
    assert_eq!(parse_u32(&msg[4..8]) as usize, len - 4);
    assert_eq!(parse_u16(&msg[8..10]), RTM_NEWROUTE);

    // Route header.
    assert_eq!(msg[20], 10);
    assert_eq!(msg[21], 64);
    assert_eq!(msg[24], 254);

    let attrs = &msg[ATTRS_OFFSET..];

    // Destination prefix.
    let dst = find_attr(attrs, 1).unwrap();
    assert_eq!(dst, &ip6!("2001::").octets());

    // Outgoing interface.
    let oif = find_attr(attrs, 4).unwrap();
    assert_eq!(parse_u32(oif), 2);

    // Encapsulation type discriminator.
    let encap_type = find_attr(attrs, 21).unwrap();
    assert_eq!(parse_u16(encap_type), 102);

    // Nested local-SID attributes.
    let encap = find_attr(attrs, 22).unwrap();
    assert_eq!(find_attr(encap, 101).unwrap(), &[40]);
    assert_eq!(find_attr(encap, 102).unwrap(), &[24]);
    assert_eq!(find_attr(encap, 103).unwrap(), &[16]);
    assert_eq!(find_attr(encap, 104).unwrap(), &[0]);
    assert_eq!(parse_u32(find_attr(encap, 1).unwrap()), 7);
    assert_eq!(find_attr(encap, 100).unwrap(), b"blue\0");
}

// End.X local SIDs carry the IPv6 nexthop in the nested attributes.
#[test]
fn encode_localsid_end_x() {
    let master = setup();
    let prefix = IpNetwork::from(net6!("2001:db8:0:1::/128"));
    let route = route(
        vec![Nexthop::Interface { ifindex: 2 }],
        Some(RouteSrv6::LocalSid {
            behavior: Behavior::EndX,
            ctx: LocalSidContext {
                nh6: Some(ip6!("fe80::2")),
                ..Default::default()
            },
            structure: SidStructure::USID_F3216,
        }),
    );

    let mut buf = [0u8; 4096];
    let len = fpm::encode_message(
        &mut buf,
        RTM_NEWROUTE,
        &prefix,
        &route,
        &master.vrfs,
        None,
    )
    .unwrap();
    let attrs = &buf[ATTRS_OFFSET..len];

    let encap_type = find_attr(attrs, 21).unwrap();
    assert_eq!(parse_u16(encap_type), 102);
    let encap = find_attr(attrs, 22).unwrap();
    assert_eq!(parse_u32(find_attr(encap, 1).unwrap()), 2);
    assert_eq!(find_attr(encap, 5).unwrap(), &ip6!("fe80::2").octets());
}

// VPN routes carry the SRv6 route encapsulation with the VPN SID and the
// encapsulation source address.
#[test]
fn encode_srv6_route_encap() {
    let master = setup();
    let prefix = IpNetwork::from(net4!("10.0.0.0/24"));
    let route = route(
        vec![Nexthop::Address {
            ifindex: 2,
            addr: ip4!("192.0.2.1").into(),
        }],
        Some(RouteSrv6::Encap {
            vpn_sid: ip6!("fc00::100"),
        }),
    );

    let mut buf = [0u8; 4096];
    let len = fpm::encode_message(
        &mut buf,
        RTM_NEWROUTE,
        &prefix,
        &route,
        &master.vrfs,
        Some(ip6!("2001:db8::1")),
    )
    .unwrap();
    let msg = &buf[..len];

    // Route header family.
    assert_eq!(msg[20], 2);

    let attrs = &msg[ATTRS_OFFSET..];
    let gateway = find_attr(attrs, 5).unwrap();
    assert_eq!(gateway, &ip4!("192.0.2.1").octets());

    let encap_type = find_attr(attrs, 21).unwrap();
    assert_eq!(parse_u16(encap_type), 101);

    let encap = find_attr(attrs, 22).unwrap();
    assert_eq!(
        find_attr(encap, 101).unwrap(),
        &ip6!("2001:db8::1").octets()
    );
    assert_eq!(find_attr(encap, 100).unwrap(), &ip6!("fc00::100").octets());

    // The source address attribute precedes the VPN SID.
    assert_eq!(parse_u16(&encap[2..4]), 101);
}

// Multipath routes nest one rtnexthop entry per nexthop.
#[test]
fn encode_multipath() {
    let master = setup();
    let prefix = IpNetwork::from(net6!("2001:db8:100::/48"));
    let route = route(
        vec![
            Nexthop::Address {
                ifindex: 2,
                addr: ip6!("fe80::2").into(),
            },
            Nexthop::Address {
                ifindex: 3,
                addr: ip6!("fe80::3").into(),
            },
        ],
        None,
    );

    let mut buf = [0u8; 4096];
    let len = fpm::encode_message(
        &mut buf,
        RTM_NEWROUTE,
        &prefix,
        &route,
        &master.vrfs,
        None,
    )
    .unwrap();
    let attrs = &buf[ATTRS_OFFSET..len];

    let multipath = find_attr(attrs, 9).unwrap();

    // First rtnexthop entry.
    let rtnh_len = parse_u16(&multipath[0..2]) as usize;
    assert_eq!(parse_u32(&multipath[4..8]), 2);
    let gateway = find_attr(&multipath[8..rtnh_len], 5).unwrap();
    assert_eq!(gateway, &ip6!("fe80::2").octets());

    // Second rtnexthop entry.
    let rest = &multipath[rtnh_len..];
    assert_eq!(parse_u32(&rest[4..8]), 3);
}

// Blackhole routes have the corresponding route type and no nexthop
// attributes.
#[test]
fn encode_blackhole() {
    let master = setup();
    let prefix = IpNetwork::from(net6!("2001:db8:dead::/48"));
    let route = route(vec![Nexthop::Special(NexthopSpecial::Blackhole)], None);

    let mut buf = [0u8; 4096];
    let len = fpm::encode_message(
        &mut buf,
        RTM_NEWROUTE,
        &prefix,
        &route,
        &master.vrfs,
        None,
    )
    .unwrap();
    let msg = &buf[..len];

    assert_eq!(msg[27], 6);
    let attrs = &msg[ATTRS_OFFSET..];
    assert!(find_attr(attrs, 4).is_none());
    assert!(find_attr(attrs, 5).is_none());
}

// Table IDs above 255 move from the rtmsg header to the extended
// attribute.
#[test]
fn encode_extended_table_id() {
    let master = setup();
    let prefix = IpNetwork::from(net6!("2001:db8:1::/64"));
    let mut route = route(vec![Nexthop::Interface { ifindex: 2 }], None);
    route.table_id = 1000;

    let mut buf = [0u8; 4096];
    let len = fpm::encode_message(
        &mut buf,
        RTM_DELROUTE,
        &prefix,
        &route,
        &master.vrfs,
        None,
    )
    .unwrap();
    let msg = &buf[..len];

    assert_eq!(msg[24], 0);
    let attrs = &msg[ATTRS_OFFSET..];
    assert_eq!(parse_u32(find_attr(attrs, 15).unwrap()), 1000);
}

// The encoder is a pure function of its inputs.
#[test]
fn encode_is_deterministic() {
    let master = setup();
    let prefix = IpNetwork::from(net6!("2001::/64"));
    let route = route(
        vec![Nexthop::Interface { ifindex: 2 }],
        Some(RouteSrv6::LocalSid {
            behavior: Behavior::End,
            ctx: LocalSidContext::default(),
            structure: SidStructure::USID_F3216,
        }),
    );

    let mut buf1 = [0u8; 4096];
    let mut buf2 = [0u8; 4096];
    let len1 = fpm::encode_message(
        &mut buf1,
        RTM_NEWROUTE,
        &prefix,
        &route,
        &master.vrfs,
        None,
    )
    .unwrap();
    let len2 = fpm::encode_message(
        &mut buf2,
        RTM_NEWROUTE,
        &prefix,
        &route,
        &master.vrfs,
        None,
    )
    .unwrap();
    assert_eq!(buf1[..len1], buf2[..len2]);
}

// A message that doesn't fit the caller-provided buffer is reported as an
// overflow, never truncated.
#[test]
fn encode_overflow() {
    let master = setup();
    let prefix = IpNetwork::from(net6!("2001::/64"));
    let route = route(vec![Nexthop::Interface { ifindex: 2 }], None);

    let mut buf = [0u8; 32];
    let result = fpm::encode_message(
        &mut buf,
        RTM_NEWROUTE,
        &prefix,
        &route,
        &master.vrfs,
        None,
    );
    assert_eq!(result.unwrap_err(), EncodeError::BufferOverflow);
}

// Behaviors without an FPM representation are rejected.
#[test]
fn encode_unsupported_behavior() {
    let master = setup();
    let prefix = IpNetwork::from(net6!("2001::/128"));
    let route = route(
        vec![Nexthop::Interface { ifindex: 2 }],
        Some(RouteSrv6::LocalSid {
            behavior: Behavior::EndB6,
            ctx: LocalSidContext::default(),
            structure: SidStructure::USID_F3216,
        }),
    );

    let mut buf = [0u8; 4096];
    let result = fpm::encode_message(
        &mut buf,
        RTM_NEWROUTE,
        &prefix,
        &route,
        &master.vrfs,
        None,
    );
    assert_eq!(
        result.unwrap_err(),
        EncodeError::UnsupportedBehavior(Behavior::EndB6)
    );
}
