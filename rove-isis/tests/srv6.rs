//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use const_addrs::{ip6, net6};
use rove_isis::config::{Command, process_command};
use rove_isis::instance::Instance;
use rove_isis::interface::InterfaceType;
use rove_isis::packet::SystemId;
use rove_isis::southbound::rx::process_msg;
use rove_isis::{events, srv6};
use rove_utils::ibus::{IbusChannelsRx, IbusMsg, ibus_channels};
use rove_utils::protocol::Protocol;
use rove_utils::southbound::{
    InterfaceFlags, InterfaceUpdateMsg, LocatorChunkMsg,
};
use rove_utils::srv6::{Behavior, Locator, SidStructure};

//
// Helper functions.
//

fn setup() -> (Instance, IbusChannelsRx) {
    let (ibus_tx, ibus_rx) = ibus_channels();
    let mut instance = Instance::new("main", ibus_tx);

    process_command(
        &mut instance,
        Command::SystemIdSet(SystemId::from([0, 0, 0, 0, 0, 1])),
    )
    .unwrap();
    process_command(
        &mut instance,
        Command::InterfaceAdd {
            name: "eth0".to_owned(),
            interface_type: InterfaceType::PointToPoint,
        },
    )
    .unwrap();
    process_command(
        &mut instance,
        Command::InterfaceAdd {
            name: "eth1".to_owned(),
            interface_type: InterfaceType::Broadcast,
        },
    )
    .unwrap();

    (instance, ibus_rx)
}

fn drain(ibus_rx: &mut IbusChannelsRx) -> Vec<IbusMsg> {
    let mut msgs = vec![];
    while let Ok(msg) = ibus_rx.routing.try_recv() {
        msgs.push(msg);
    }
    msgs
}

fn locator() -> Locator {
    Locator::new(
        "loc1".to_owned(),
        net6!("2001:db8::/48"),
        SidStructure::new(32, 16, 16, 0).unwrap(),
        false,
    )
}

fn grant_chunk(instance: &mut Instance) {
    let locator = locator();
    let chunk = locator.prefix;
    process_msg(
        instance,
        IbusMsg::LocatorChunkUpd(LocatorChunkMsg::new(
            locator,
            chunk,
            Protocol::ISIS,
        )),
    );
}

fn enable_srv6(instance: &mut Instance, ibus_rx: &mut IbusChannelsRx) {
    process_command(instance, Command::Srv6Enable).unwrap();
    process_command(
        instance,
        Command::Srv6LocatorSet("loc1".to_owned()),
    )
    .unwrap();

    // The daemon asks the broker for a chunk of the locator.
    let msgs = drain(ibus_rx);
    assert!(msgs
        .iter()
        .any(|msg| matches!(msg, IbusMsg::LocatorChunkGet { locator, proto }
            if locator == "loc1" && *proto == Protocol::ISIS)));

    process_msg(
        instance,
        IbusMsg::InterfaceUpd(InterfaceUpdateMsg::new(
            "eth0".to_owned(),
            2,
            1500,
            InterfaceFlags::OPERATIVE,
        )),
    );
    process_msg(
        instance,
        IbusMsg::InterfaceUpd(InterfaceUpdateMsg::new(
            "eth1".to_owned(),
            3,
            1500,
            InterfaceFlags::OPERATIVE | InterfaceFlags::BROADCAST,
        )),
    );
}

//
// Test functions.
//

// The chunk grant binds the End SID covering the locator node prefix.
#[test]
fn end_sid_allocation() {
    let (mut instance, mut ibus_rx) = setup();
    enable_srv6(&mut instance, &mut ibus_rx);
    drain(&mut ibus_rx);

    grant_chunk(&mut instance);

    let msgs = drain(&mut ibus_rx);
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        IbusMsg::LocalSidAdd(msg) => {
            assert_eq!(msg.protocol, Protocol::ISIS);
            assert_eq!(msg.sid, ip6!("2001:db8::"));
            assert_eq!(msg.behavior, Behavior::End);
        }
        msg => panic!("unexpected message: {:?}", msg),
    }
}

// An adjacency becoming IPv6-enabled gets one End.X SID auto-allocated at
// the first available function index.
#[test]
fn adj_sid_allocation() {
    let (mut instance, mut ibus_rx) = setup();
    enable_srv6(&mut instance, &mut ibus_rx);
    grant_chunk(&mut instance);
    drain(&mut ibus_rx);

    let nbr1 = SystemId::from([0, 0, 0, 0, 0, 2]);
    events::process_adjacency_up(&mut instance, "eth0", nbr1).unwrap();

    // Nothing happens until an IPv6 address is known.
    assert!(drain(&mut ibus_rx).is_empty());

    events::process_adjacency_ipv6_addr_add(
        &mut instance,
        "eth0",
        nbr1,
        ip6!("fe80::2"),
    )
    .unwrap();

    let msgs = drain(&mut ibus_rx);
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        IbusMsg::LocalSidAdd(msg) => {
            assert_eq!(msg.sid, ip6!("2001:db8:0:1::"));
            assert_eq!(msg.behavior, Behavior::EndX);
            assert_eq!(msg.oif, 2);
            assert_eq!(msg.ctx.nh6, Some(ip6!("fe80::2")));
        }
        msg => panic!("unexpected message: {:?}", msg),
    }

    // A second adjacency gets the next index.
    let nbr2 = SystemId::from([0, 0, 0, 0, 0, 3]);
    events::process_adjacency_up(&mut instance, "eth1", nbr2).unwrap();
    events::process_adjacency_ipv6_addr_add(
        &mut instance,
        "eth1",
        nbr2,
        ip6!("fe80::3"),
    )
    .unwrap();

    let msgs = drain(&mut ibus_rx);
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        IbusMsg::LocalSidAdd(msg) => {
            assert_eq!(msg.sid, ip6!("2001:db8:0:2::"));
            assert_eq!(msg.oif, 3);
        }
        msg => panic!("unexpected message: {:?}", msg),
    }
}

// Adjacency teardown uninstalls and frees every End.X SID bound to it.
#[test]
fn adj_sid_teardown() {
    let (mut instance, mut ibus_rx) = setup();
    enable_srv6(&mut instance, &mut ibus_rx);
    grant_chunk(&mut instance);

    let nbr = SystemId::from([0, 0, 0, 0, 0, 2]);
    events::process_adjacency_up(&mut instance, "eth0", nbr).unwrap();
    events::process_adjacency_ipv6_addr_add(
        &mut instance,
        "eth0",
        nbr,
        ip6!("fe80::2"),
    )
    .unwrap();
    drain(&mut ibus_rx);

    events::process_adjacency_down(&mut instance, "eth0", nbr).unwrap();

    let msgs = drain(&mut ibus_rx);
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        IbusMsg::LocalSidDel(msg) => {
            assert_eq!(msg.sid, ip6!("2001:db8:0:1::"));
        }
        msg => panic!("unexpected message: {:?}", msg),
    }

    // The freed index is reused by the next adjacency.
    events::process_adjacency_up(&mut instance, "eth0", nbr).unwrap();
    events::process_adjacency_ipv6_addr_add(
        &mut instance,
        "eth0",
        nbr,
        ip6!("fe80::2"),
    )
    .unwrap();
    let msgs = drain(&mut ibus_rx);
    assert_eq!(msgs.len(), 1);
    assert!(matches!(&msgs[0], IbusMsg::LocalSidAdd(msg)
        if msg.sid == ip6!("2001:db8:0:1::")));
}

// Locator deletion tears down every SID before the chunk is released.
#[test]
fn locator_release_cascades() {
    let (mut instance, mut ibus_rx) = setup();
    enable_srv6(&mut instance, &mut ibus_rx);
    grant_chunk(&mut instance);

    let nbr = SystemId::from([0, 0, 0, 0, 0, 2]);
    events::process_adjacency_up(&mut instance, "eth0", nbr).unwrap();
    events::process_adjacency_ipv6_addr_add(
        &mut instance,
        "eth0",
        nbr,
        ip6!("fe80::2"),
    )
    .unwrap();
    drain(&mut ibus_rx);

    process_msg(&mut instance, IbusMsg::LocatorDel("loc1".to_owned()));

    let msgs = drain(&mut ibus_rx);
    let release_pos = msgs
        .iter()
        .position(|msg| matches!(msg, IbusMsg::LocatorChunkRelease { .. }))
        .expect("chunk not released");
    let dels = msgs
        .iter()
        .enumerate()
        .filter(|(_, msg)| matches!(msg, IbusMsg::LocalSidDel(_)))
        .map(|(pos, _)| pos)
        .collect::<Vec<_>>();
    assert_eq!(dels.len(), 2);
    assert!(dels.iter().all(|pos| *pos < release_pos));
}

// The advertised SRv6 TLVs reflect the allocated SIDs.
#[test]
fn tlv_production() {
    let (mut instance, mut ibus_rx) = setup();
    enable_srv6(&mut instance, &mut ibus_rx);
    grant_chunk(&mut instance);

    let nbr1 = SystemId::from([0, 0, 0, 0, 0, 2]);
    events::process_adjacency_up(&mut instance, "eth0", nbr1).unwrap();
    events::process_adjacency_ipv6_addr_add(
        &mut instance,
        "eth0",
        nbr1,
        ip6!("fe80::2"),
    )
    .unwrap();
    let nbr2 = SystemId::from([0, 0, 0, 0, 0, 3]);
    events::process_adjacency_up(&mut instance, "eth1", nbr2).unwrap();
    events::process_adjacency_ipv6_addr_add(
        &mut instance,
        "eth1",
        nbr2,
        ip6!("fe80::3"),
    )
    .unwrap();

    // SRv6 capabilities and MSDs.
    assert!(srv6::capabilities_stlv(&instance).is_some());
    let msd = srv6::node_msd_tlv(&instance).unwrap();
    assert_eq!(msd.msds.len(), 4);

    // Locator TLV with the End SID attached.
    let locator_tlv = srv6::locator_tlv(&instance).unwrap();
    assert_eq!(locator_tlv.entries.len(), 1);
    let entry = &locator_tlv.entries[0];
    assert_eq!(entry.locator, net6!("2001:db8::/48"));
    assert_eq!(entry.sub_tlvs.len(), 1);
    assert_eq!(entry.sub_tlvs[0].sid, ip6!("2001:db8::"));

    // One End.X SID per adjacency, LAN flavor on the broadcast circuit.
    let adj_idxs = instance
        .arenas
        .adjacencies
        .iter()
        .map(|adj| (adj.system_id, adj.adj_sids.len()))
        .collect::<Vec<_>>();
    assert_eq!(adj_idxs, vec![(nbr1, 1), (nbr2, 1)]);
}
