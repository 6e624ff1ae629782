//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::LazyLock as Lazy;

use bytes::{Bytes, BytesMut};
use const_addrs::{ip4, ip6, net6};
use rove_isis::packet::SystemId;
use rove_isis::packet::consts::MsdType;
use rove_isis::packet::subtlvs::Srv6SidStructureSstlv;
use rove_isis::packet::subtlvs::capability::{
    Srv6CapFlags, Srv6CapabilitiesStlv,
};
use rove_isis::packet::subtlvs::locator::Srv6EndSidStlv;
use rove_isis::packet::subtlvs::neighbor::{
    EndXSidFlags, Srv6EndXSidStlv, Srv6LanEndXSidStlv,
};
use rove_isis::packet::tlv::{
    LocatorFlags, NodeMsdTlv, RouterCapFlags, RouterCapTlv, Srv6LocatorEntry,
    Srv6LocatorTlv,
};
use rove_utils::srv6::{Behavior, SidStructure};

//
// Helper functions.
//

fn structure_f3216() -> Option<Srv6SidStructureSstlv> {
    Some(Srv6SidStructureSstlv(SidStructure::USID_F3216))
}

//
// Test vectors.
//

static SRV6_CAP: Lazy<(Vec<u8>, Srv6CapabilitiesStlv)> = Lazy::new(|| {
    (
        vec![0x19, 0x02, 0x40, 0x00],
        Srv6CapabilitiesStlv::new(Srv6CapFlags::O),
    )
});

static ROUTER_CAP: Lazy<(Vec<u8>, RouterCapTlv)> = Lazy::new(|| {
    (
        vec![
            0xf2, 0x09, 0x0a, 0x00, 0x00, 0x01, 0x00, 0x19, 0x02, 0x40, 0x00,
        ],
        RouterCapTlv::new(
            ip4!("10.0.0.1"),
            RouterCapFlags::empty(),
            Some(Srv6CapabilitiesStlv::new(Srv6CapFlags::O)),
        ),
    )
});

static NODE_MSD: Lazy<(Vec<u8>, NodeMsdTlv)> = Lazy::new(|| {
    (
        vec![
            0x17, 0x08, 0x29, 0x0a, 0x2a, 0x0b, 0x2c, 0x0c, 0x2d, 0x0d,
        ],
        NodeMsdTlv::new(
            [
                (MsdType::MaxSegsLeft, 10),
                (MsdType::MaxEndPop, 11),
                (MsdType::MaxHEncaps, 12),
                (MsdType::MaxEndD, 13),
            ]
            .into(),
        ),
    )
});

static END_X_SID: Lazy<(Vec<u8>, Srv6EndXSidStlv)> = Lazy::new(|| {
    (
        vec![
            0x2b, 0x1c,
            // Flags, algorithm and weight.
            0x00, 0x00, 0x00,
            // Behavior.
            0x00, 0x02,
            // SID.
            0x20, 0x01, 0x0d, 0xb8, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // Sub-sub-TLVs.
            0x06, 0x01, 0x04, 0x20, 0x10, 0x10, 0x00,
        ],
        Srv6EndXSidStlv::new(
            EndXSidFlags::empty(),
            0,
            0,
            Behavior::EndX,
            ip6!("2001:db8:0:1::"),
            structure_f3216(),
        ),
    )
});

static LAN_END_X_SID: Lazy<(Vec<u8>, Srv6LanEndXSidStlv)> = Lazy::new(|| {
    (
        vec![
            0x2c, 0x22,
            // Neighbor System ID.
            0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
            // Flags, algorithm and weight.
            0x80, 0x00, 0x00,
            // Behavior.
            0x00, 0x68,
            // SID.
            0x20, 0x01, 0x0d, 0xb8, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // Sub-sub-TLVs.
            0x06, 0x01, 0x04, 0x20, 0x10, 0x10, 0x00,
        ],
        Srv6LanEndXSidStlv::new(
            SystemId::from([0, 0, 0, 0, 0, 2]),
            EndXSidFlags::B,
            0,
            0,
            Behavior::UA,
            ip6!("2001:db8:0:2::"),
            structure_f3216(),
        ),
    )
});

static LOCATOR: Lazy<(Vec<u8>, Srv6LocatorTlv)> = Lazy::new(|| {
    (
        vec![
            0x1b, 0x2c,
            // MT ID.
            0x00, 0x00,
            // Metric.
            0x00, 0x00, 0x00, 0x00,
            // Flags and algorithm.
            0x00, 0x00,
            // Locator size and prefix.
            0x30, 0x20, 0x01, 0x0d, 0xb8, 0x00, 0x00,
            // Sub-TLVs: End SID.
            0x1c, 0x05, 0x1a, 0x00, 0x00, 0x01, 0x20, 0x01, 0x0d, 0xb8,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x06, 0x01, 0x04, 0x20, 0x10, 0x10, 0x00,
        ],
        Srv6LocatorTlv::new(
            0,
            vec![Srv6LocatorEntry::new(
                0,
                LocatorFlags::empty(),
                0,
                net6!("2001:db8::/48"),
                vec![Srv6EndSidStlv::new(
                    0,
                    Behavior::End,
                    ip6!("2001:db8::"),
                    structure_f3216(),
                )],
            )],
        ),
    )
});

//
// Test functions.
//

#[test]
fn encode_srv6_capabilities() {
    let (bytes, stlv) = &*SRV6_CAP;
    let mut buf = BytesMut::new();
    stlv.encode(&mut buf);
    assert_eq!(&buf[..], &bytes[..]);
}

#[test]
fn decode_srv6_capabilities() {
    let (bytes, stlv_expected) = &*SRV6_CAP;
    let mut buf = Bytes::copy_from_slice(&bytes[2..]);
    let stlv_actual = Srv6CapabilitiesStlv::decode(bytes[1], &mut buf).unwrap();
    assert_eq!(*stlv_expected, stlv_actual);
}

#[test]
fn encode_router_cap() {
    let (bytes, tlv) = &*ROUTER_CAP;
    let mut buf = BytesMut::new();
    tlv.encode(&mut buf);
    assert_eq!(&buf[..], &bytes[..]);
}

#[test]
fn decode_router_cap() {
    let (bytes, tlv_expected) = &*ROUTER_CAP;
    let mut buf = Bytes::copy_from_slice(&bytes[2..]);
    let tlv_actual = RouterCapTlv::decode(bytes[1], &mut buf).unwrap();
    assert_eq!(*tlv_expected, tlv_actual);
}

#[test]
fn encode_node_msd() {
    let (bytes, tlv) = &*NODE_MSD;
    let mut buf = BytesMut::new();
    tlv.encode(&mut buf);
    assert_eq!(&buf[..], &bytes[..]);
}

#[test]
fn decode_node_msd() {
    let (bytes, tlv_expected) = &*NODE_MSD;
    let mut buf = Bytes::copy_from_slice(&bytes[2..]);
    let tlv_actual = NodeMsdTlv::decode(bytes[1], &mut buf).unwrap();
    assert_eq!(*tlv_expected, tlv_actual);
}

#[test]
fn encode_end_x_sid() {
    let (bytes, stlv) = &*END_X_SID;
    let mut buf = BytesMut::new();
    stlv.encode(&mut buf);
    assert_eq!(&buf[..], &bytes[..]);
}

#[test]
fn decode_end_x_sid() {
    let (bytes, stlv_expected) = &*END_X_SID;
    let mut buf = Bytes::copy_from_slice(&bytes[2..]);
    let stlv_actual = Srv6EndXSidStlv::decode(bytes[1], &mut buf).unwrap();
    assert_eq!(*stlv_expected, stlv_actual);
}

#[test]
fn encode_lan_end_x_sid() {
    let (bytes, stlv) = &*LAN_END_X_SID;
    let mut buf = BytesMut::new();
    stlv.encode(&mut buf);
    assert_eq!(&buf[..], &bytes[..]);
}

#[test]
fn decode_lan_end_x_sid() {
    let (bytes, stlv_expected) = &*LAN_END_X_SID;
    let mut buf = Bytes::copy_from_slice(&bytes[2..]);
    let stlv_actual = Srv6LanEndXSidStlv::decode(bytes[1], &mut buf).unwrap();
    assert_eq!(*stlv_expected, stlv_actual);
}

#[test]
fn encode_locator() {
    let (bytes, tlv) = &*LOCATOR;
    let mut buf = BytesMut::new();
    tlv.encode(&mut buf);
    assert_eq!(&buf[..], &bytes[..]);
}

#[test]
fn decode_locator() {
    let (bytes, tlv_expected) = &*LOCATOR;
    let mut buf = Bytes::copy_from_slice(&bytes[2..]);
    let tlv_actual = Srv6LocatorTlv::decode(bytes[1], &mut buf).unwrap();
    assert_eq!(*tlv_expected, tlv_actual);
}

#[test]
fn decode_unknown_behavior() {
    let (bytes, _) = &*END_X_SID;
    let mut bytes = bytes.clone();
    // Corrupt the behavior field.
    bytes[5] = 0xff;
    bytes[6] = 0xff;
    let mut buf = Bytes::copy_from_slice(&bytes[2..]);
    assert!(Srv6EndXSidStlv::decode(bytes[1], &mut buf).is_err());
}
