//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use rove_static::config::{Command, SidAttr, process_command};
use rove_static::ibus::process_msg;
use rove_static::sid::SidInstallState;
use rove_static::Master;
use rove_utils::ibus::{IbusChannelsRx, IbusMsg, ibus_channels};
use rove_utils::protocol::Protocol;
use rove_utils::southbound::{
    InterfaceFlags, InterfaceUpdateMsg, RouteNotifyMsg, RouteNotifyOutcome,
    VrfUpdateMsg,
};
use rove_utils::srv6::{Behavior, FlavorOps};

//
// Helper functions.
//

fn setup() -> (Master, IbusChannelsRx) {
    let (ibus_tx, ibus_rx) = ibus_channels();
    (Master::new(ibus_tx), ibus_rx)
}

fn drain(ibus_rx: &mut IbusChannelsRx) -> Vec<IbusMsg> {
    let mut msgs = vec![];
    while let Ok(msg) = ibus_rx.routing.try_recv() {
        msgs.push(msg);
    }
    msgs
}

fn iface_up(master: &mut Master, ifname: &str, ifindex: u32) {
    process_msg(
        master,
        IbusMsg::InterfaceUpd(InterfaceUpdateMsg::new(
            ifname.to_owned(),
            ifindex,
            1500,
            InterfaceFlags::OPERATIVE,
        )),
    );
}

fn vrf_up(master: &mut Master, name: &str, vrf_id: u32, table_id: u32) {
    process_msg(
        master,
        IbusMsg::VrfUpd(VrfUpdateMsg::new(
            name.to_owned(),
            vrf_id,
            table_id,
            true,
        )),
    );
}

//
// Test functions.
//

// A SID with no interface known to the broker stays valid but unsent; the
// first interface event triggers the installation.
#[test]
fn sid_end_waits_for_interface() {
    let (mut master, mut ibus_rx) = setup();
    let addr: Ipv6Addr = "fc00::1".parse().unwrap();

    process_command(
        &mut master,
        Command::SidAdd {
            addr,
            behavior: Behavior::End,
        },
    )
    .unwrap();
    assert!(drain(&mut ibus_rx).is_empty());

    iface_up(&mut master, "eth0", 2);

    let msgs = drain(&mut ibus_rx);
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        IbusMsg::LocalSidAdd(msg) => {
            assert_eq!(msg.sid, addr);
            assert_eq!(msg.behavior, Behavior::End);
            assert_eq!(msg.oif, 2);
            assert!(msg.ctx.flavor.is_none());
        }
        msg => panic!("unexpected message: {:?}", msg),
    }

    // Further interface events must not re-send the SID.
    iface_up(&mut master, "eth1", 3);
    assert!(drain(&mut ibus_rx).is_empty());
}

// An End.DT4 SID stays down until its VRF becomes active.
#[test]
fn sid_end_dt4_waits_for_vrf() {
    let (mut master, mut ibus_rx) = setup();
    let addr: Ipv6Addr = "fc00::2".parse().unwrap();

    iface_up(&mut master, "eth0", 2);

    process_command(
        &mut master,
        Command::SidAdd {
            addr,
            behavior: Behavior::EndDt4,
        },
    )
    .unwrap();
    process_command(
        &mut master,
        Command::SidAttrSet {
            addr,
            attr: SidAttr::Vrf("red".to_owned()),
        },
    )
    .unwrap();
    assert!(drain(&mut ibus_rx).is_empty());

    vrf_up(&mut master, "red", 10, 100);

    let msgs = drain(&mut ibus_rx);
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        IbusMsg::LocalSidAdd(msg) => {
            assert_eq!(msg.behavior, Behavior::EndDt4);
            assert_eq!(msg.ctx.table_id, Some(100));
            assert_eq!(msg.oif, 10);
        }
        msg => panic!("unexpected message: {:?}", msg),
    }
}

// uN SIDs are sent as End plus the NEXT_CSID flavor with the default
// locator-block/node lengths.
#[test]
fn sid_un_carries_flavor() {
    let (mut master, mut ibus_rx) = setup();
    let addr: Ipv6Addr = "fc00::3".parse().unwrap();

    iface_up(&mut master, "eth0", 2);

    process_command(
        &mut master,
        Command::SidAdd {
            addr,
            behavior: Behavior::UN,
        },
    )
    .unwrap();

    let msgs = drain(&mut ibus_rx);
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        IbusMsg::LocalSidAdd(msg) => {
            assert_eq!(msg.behavior, Behavior::End);
            let flavor = msg.ctx.flavor.unwrap();
            assert!(flavor.ops.contains(FlavorOps::NEXT_CSID));
            assert_eq!(flavor.lcblock_len, 32);
            assert_eq!(flavor.lcnode_fn_len, 16);
        }
        msg => panic!("unexpected message: {:?}", msg),
    }
}

// The loopback interface is never used as the default outgoing device.
#[test]
fn sid_skips_loopback() {
    let (mut master, mut ibus_rx) = setup();
    let addr: Ipv6Addr = "fc00::4".parse().unwrap();

    process_msg(
        &mut master,
        IbusMsg::InterfaceUpd(InterfaceUpdateMsg::new(
            "lo".to_owned(),
            1,
            65536,
            InterfaceFlags::LOOPBACK | InterfaceFlags::OPERATIVE,
        )),
    );

    process_command(
        &mut master,
        Command::SidAdd {
            addr,
            behavior: Behavior::End,
        },
    )
    .unwrap();
    assert!(drain(&mut ibus_rx).is_empty());

    iface_up(&mut master, "eth0", 2);
    let msgs = drain(&mut ibus_rx);
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        IbusMsg::LocalSidAdd(msg) => assert_eq!(msg.oif, 2),
        msg => panic!("unexpected message: {:?}", msg),
    }
}

// Over a full declare/attribute/clear cycle, every DEL follows an ADD and
// the counts match.
#[test]
fn sid_add_del_pairing() {
    let (mut master, mut ibus_rx) = setup();
    let addr: Ipv6Addr = "fc00::5".parse().unwrap();

    iface_up(&mut master, "eth0", 2);
    iface_up(&mut master, "eth1", 3);

    process_command(
        &mut master,
        Command::SidAdd {
            addr,
            behavior: Behavior::End,
        },
    )
    .unwrap();
    process_command(
        &mut master,
        Command::SidAttrSet {
            addr,
            attr: SidAttr::Ifname("eth1".to_owned()),
        },
    )
    .unwrap();
    process_command(&mut master, Command::SidDelete { addr }).unwrap();

    let mut adds = 0;
    let mut dels = 0;
    for msg in drain(&mut ibus_rx) {
        match msg {
            IbusMsg::LocalSidAdd(msg) => {
                assert_eq!(msg.sid, addr);
                assert_eq!(adds, dels, "ADD while previous ADD outstanding");
                adds += 1;
            }
            IbusMsg::LocalSidDel(msg) => {
                assert_eq!(msg.sid, addr);
                assert_eq!(adds, dels + 1, "DEL without matching ADD");
                dels += 1;
            }
            msg => panic!("unexpected message: {:?}", msg),
        }
    }
    assert_eq!(adds, 2);
    assert_eq!(dels, 2);
}

// A VRF going away withdraws the SIDs referencing it.
#[test]
fn sid_withdrawn_on_vrf_down() {
    let (mut master, mut ibus_rx) = setup();
    let addr: Ipv6Addr = "fc00::6".parse().unwrap();

    iface_up(&mut master, "eth0", 2);
    vrf_up(&mut master, "blue", 20, 200);

    process_command(
        &mut master,
        Command::SidAdd {
            addr,
            behavior: Behavior::EndDt6,
        },
    )
    .unwrap();
    process_command(
        &mut master,
        Command::SidAttrSet {
            addr,
            attr: SidAttr::Vrf("blue".to_owned()),
        },
    )
    .unwrap();
    assert_eq!(drain(&mut ibus_rx).len(), 1);

    process_msg(&mut master, IbusMsg::VrfDel("blue".to_owned()));
    let msgs = drain(&mut ibus_rx);
    assert_eq!(msgs.len(), 1);
    assert!(matches!(msgs[0], IbusMsg::LocalSidDel(_)));

    // The VRF coming back re-installs the SID.
    vrf_up(&mut master, "blue", 20, 200);
    let msgs = drain(&mut ibus_rx);
    assert_eq!(msgs.len(), 1);
    assert!(matches!(msgs[0], IbusMsg::LocalSidAdd(_)));
}

// A failed installation drops the SID route state without triggering a
// spontaneous re-send.
#[test]
fn sid_fail_install_is_quiet() {
    let (mut master, mut ibus_rx) = setup();
    let addr: Ipv6Addr = "fc00::7".parse().unwrap();

    iface_up(&mut master, "eth0", 2);
    process_command(
        &mut master,
        Command::SidAdd {
            addr,
            behavior: Behavior::End,
        },
    )
    .unwrap();
    assert_eq!(drain(&mut ibus_rx).len(), 1);

    process_msg(
        &mut master,
        IbusMsg::RouteNotify(RouteNotifyMsg::new(
            Protocol::STATIC,
            format!("{}/128", addr).parse().unwrap(),
            254,
            RouteNotifyOutcome::FailInstall,
        )),
    );

    let sid = master.sids.get(&addr).unwrap();
    assert_eq!(sid.install_state, SidInstallState::NotInstalled);
    assert!(drain(&mut ibus_rx).is_empty());
}
