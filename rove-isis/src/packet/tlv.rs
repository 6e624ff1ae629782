//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use ipnetwork::Ipv6Network;
use num_traits::{FromPrimitive, ToPrimitive};
use rove_utils::bytes::{BytesExt, BytesMutExt};
use serde::{Deserialize, Serialize};

use crate::packet::consts::{
    LocatorStlvType, MsdType, RouterCapStlvType, TlvType,
};
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::subtlvs::capability::Srv6CapabilitiesStlv;
use crate::packet::subtlvs::locator::Srv6EndSidStlv;

// TLV header size.
pub const TLV_HDR_SIZE: usize = 2;
// Maximum TLV length.
pub const TLV_MAX_LEN: usize = 255;

// SRv6 Locator TLV.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Srv6LocatorTlv {
    pub mt_id: u16,
    pub entries: Vec<Srv6LocatorEntry>,
}

// Locator entry within the SRv6 Locator TLV.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Srv6LocatorEntry {
    pub metric: u32,
    pub flags: LocatorFlags,
    pub algo: u8,
    pub locator: Ipv6Network,
    pub sub_tlvs: Vec<Srv6EndSidStlv>,
}

bitflags! {
    // SRv6 Locator entry flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct LocatorFlags: u8 {
        const D = 0x80;
    }
}

// Node MSD TLV.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct NodeMsdTlv {
    pub msds: BTreeMap<MsdType, u8>,
}

// Router Capability TLV, restricted to the sub-TLVs the suite produces.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct RouterCapTlv {
    pub router_id: Ipv4Addr,
    pub flags: RouterCapFlags,
    pub srv6_cap: Option<Srv6CapabilitiesStlv>,
}

bitflags! {
    // Router Capability TLV flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct RouterCapFlags: u8 {
        const S = 0x01;
        const D = 0x02;
    }
}

// ===== impl Srv6LocatorTlv =====

impl Srv6LocatorTlv {
    const ENTRY_MIN_SIZE: usize = 8;

    pub fn decode(tlv_len: u8, buf: &mut Bytes) -> DecodeResult<Self> {
        if (tlv_len as usize) < 2 {
            return Err(DecodeError::InvalidTlvLength(tlv_len));
        }
        let mt_id = buf.get_u16() & 0x0fff;

        let mut entries = vec![];
        while buf.remaining() >= Self::ENTRY_MIN_SIZE {
            let metric = buf.get_u32();
            let flags = LocatorFlags::from_bits_truncate(buf.get_u8());
            let algo = buf.get_u8();

            // Locator prefix, stored in the minimum number of octets.
            let loc_size = buf.get_u8();
            if loc_size > 128 {
                return Err(DecodeError::InvalidLocatorSize(loc_size));
            }
            let loc_bytes = (loc_size as usize).div_ceil(8);
            if buf.remaining() < loc_bytes + 1 {
                return Err(DecodeError::IncompletePacket);
            }
            let mut octets = [0u8; 16];
            buf.copy_to_slice(&mut octets[..loc_bytes]);
            let locator =
                Ipv6Network::new(Ipv6Addr::from(octets), loc_size)
                    .map_err(|_| DecodeError::InvalidLocatorSize(loc_size))?;

            // Sub-TLVs.
            let mut sub_tlvs = vec![];
            let stlvs_len = buf.get_u8();
            if buf.remaining() < stlvs_len as usize {
                return Err(DecodeError::IncompletePacket);
            }
            let mut buf_stlvs = buf.copy_to_bytes(stlvs_len as usize);
            while buf_stlvs.remaining() >= TLV_HDR_SIZE {
                let stlv_type = buf_stlvs.get_u8();
                let stlv_len = buf_stlvs.get_u8();
                if buf_stlvs.remaining() < stlv_len as usize {
                    return Err(DecodeError::IncompletePacket);
                }
                let mut buf_stlv = buf_stlvs.copy_to_bytes(stlv_len as usize);

                match LocatorStlvType::from_u8(stlv_type) {
                    Some(LocatorStlvType::Srv6EndSid) => {
                        let stlv =
                            Srv6EndSidStlv::decode(stlv_len, &mut buf_stlv)?;
                        sub_tlvs.push(stlv);
                    }
                    _ => {
                        // Ignore unknown sub-TLV.
                    }
                }
            }

            entries.push(Srv6LocatorEntry {
                metric,
                flags,
                algo,
                locator,
                sub_tlvs,
            });
        }

        Ok(Srv6LocatorTlv { mt_id, entries })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let start_pos = tlv_encode_start(buf, TlvType::Srv6Locator);
        buf.put_u16(self.mt_id & 0x0fff);
        for entry in &self.entries {
            buf.put_u32(entry.metric);
            buf.put_u8(entry.flags.bits());
            buf.put_u8(entry.algo);
            buf.put_u8(entry.locator.prefix());
            let loc_bytes = (entry.locator.prefix() as usize).div_ceil(8);
            buf.put_slice(&entry.locator.ip().octets()[..loc_bytes]);

            // Sub-TLVs, preceded by their aggregate length.
            let stlvs_pos = buf.len();
            buf.put_u8(0);
            for stlv in &entry.sub_tlvs {
                stlv.encode(buf);
            }
            buf[stlvs_pos] = (buf.len() - stlvs_pos - 1) as u8;
        }
        tlv_encode_end(buf, start_pos);
    }
}

// ===== impl NodeMsdTlv =====

impl NodeMsdTlv {
    const ENTRY_SIZE: usize = 2;

    pub fn decode(tlv_len: u8, buf: &mut Bytes) -> DecodeResult<Self> {
        if tlv_len as usize % Self::ENTRY_SIZE != 0 {
            return Err(DecodeError::InvalidTlvLength(tlv_len));
        }

        let mut msds = BTreeMap::new();
        while buf.remaining() >= Self::ENTRY_SIZE {
            let msd_type = buf.get_u8();
            let msd_value = buf.get_u8();
            // Ignore unknown MSD types.
            if let Some(msd_type) = MsdType::from_u8(msd_type) {
                msds.insert(msd_type, msd_value);
            }
        }

        Ok(NodeMsdTlv { msds })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let start_pos = tlv_encode_start(buf, TlvType::NodeMsd);
        for (msd_type, msd_value) in &self.msds {
            buf.put_u8(msd_type.to_u8().unwrap());
            buf.put_u8(*msd_value);
        }
        tlv_encode_end(buf, start_pos);
    }
}

// ===== impl RouterCapTlv =====

impl RouterCapTlv {
    const MIN_SIZE: usize = 5;

    pub fn decode(tlv_len: u8, buf: &mut Bytes) -> DecodeResult<Self> {
        if (tlv_len as usize) < Self::MIN_SIZE {
            return Err(DecodeError::InvalidTlvLength(tlv_len));
        }

        let router_id = buf.get_ipv4();
        let flags = RouterCapFlags::from_bits_truncate(buf.get_u8());

        let mut srv6_cap = None;
        while buf.remaining() >= TLV_HDR_SIZE {
            let stlv_type = buf.get_u8();
            let stlv_len = buf.get_u8();
            if buf.remaining() < stlv_len as usize {
                return Err(DecodeError::IncompletePacket);
            }
            let mut buf_stlv = buf.copy_to_bytes(stlv_len as usize);

            match RouterCapStlvType::from_u8(stlv_type) {
                Some(RouterCapStlvType::Srv6Capabilities) => {
                    let stlv =
                        Srv6CapabilitiesStlv::decode(stlv_len, &mut buf_stlv)?;
                    srv6_cap = Some(stlv);
                }
                _ => {
                    // Ignore unknown sub-TLV.
                }
            }
        }

        Ok(RouterCapTlv {
            router_id,
            flags,
            srv6_cap,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let start_pos = tlv_encode_start(buf, TlvType::RouterCapability);
        buf.put_ipv4(&self.router_id);
        buf.put_u8(self.flags.bits());
        if let Some(srv6_cap) = &self.srv6_cap {
            srv6_cap.encode(buf);
        }
        tlv_encode_end(buf, start_pos);
    }
}

// ===== global functions =====

pub(crate) fn tlv_encode_start(
    buf: &mut BytesMut,
    tlv_type: impl ToPrimitive,
) -> usize {
    let start_pos = buf.len();
    buf.put_u8(tlv_type.to_u8().unwrap());
    // The TLV length will be rewritten later.
    buf.put_u8(0);
    start_pos
}

pub(crate) fn tlv_encode_end(buf: &mut BytesMut, start_pos: usize) {
    // Rewrite TLV length.
    buf[start_pos + 1] = (buf.len() - start_pos - TLV_HDR_SIZE) as u8;
}
