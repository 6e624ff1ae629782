//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use num_traits::ToPrimitive;
use rove_utils::bytes::{BytesExt, BytesMutExt};
use rove_utils::srv6::Behavior;
use serde::{Deserialize, Serialize};

use crate::packet::SystemId;
use crate::packet::consts::NeighborStlvType;
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::subtlvs::{
    Srv6SidStructureSstlv, behavior_decode, sid_sstlvs_decode,
    sid_sstlvs_encode,
};
use crate::packet::tlv::{tlv_encode_end, tlv_encode_start};

// SRv6 End.X SID Sub-TLV.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Srv6EndXSidStlv {
    pub flags: EndXSidFlags,
    pub algo: u8,
    pub weight: u8,
    pub behavior: Behavior,
    pub sid: Ipv6Addr,
    pub structure: Option<Srv6SidStructureSstlv>,
}

// SRv6 LAN End.X SID Sub-TLV.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Srv6LanEndXSidStlv {
    pub nbr_system_id: SystemId,
    pub flags: EndXSidFlags,
    pub algo: u8,
    pub weight: u8,
    pub behavior: Behavior,
    pub sid: Ipv6Addr,
    pub structure: Option<Srv6SidStructureSstlv>,
}

bitflags! {
    // SRv6 End.X SID flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct EndXSidFlags: u8 {
        const B = 0x80;
        const S = 0x40;
        const P = 0x20;
    }
}

// ===== impl Srv6EndXSidStlv =====

impl Srv6EndXSidStlv {
    const MIN_SIZE: usize = 21;

    pub fn decode(stlv_len: u8, buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate the TLV length.
        if (stlv_len as usize) < Self::MIN_SIZE {
            return Err(DecodeError::InvalidTlvLength(stlv_len));
        }

        let flags = EndXSidFlags::from_bits_truncate(buf.get_u8());
        let algo = buf.get_u8();
        let weight = buf.get_u8();
        let behavior = behavior_decode(buf)?;
        let sid = buf.get_ipv6();
        let structure = sid_sstlvs_decode(buf)?;

        Ok(Srv6EndXSidStlv {
            flags,
            algo,
            weight,
            behavior,
            sid,
            structure,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let start_pos = tlv_encode_start(buf, NeighborStlvType::Srv6EndXSid);
        buf.put_u8(self.flags.bits());
        buf.put_u8(self.algo);
        buf.put_u8(self.weight);
        buf.put_u16(self.behavior.to_u16().unwrap());
        buf.put_ipv6(&self.sid);
        sid_sstlvs_encode(buf, &self.structure);
        tlv_encode_end(buf, start_pos);
    }
}

// ===== impl Srv6LanEndXSidStlv =====

impl Srv6LanEndXSidStlv {
    const MIN_SIZE: usize = 27;

    pub fn decode(stlv_len: u8, buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate the TLV length.
        if (stlv_len as usize) < Self::MIN_SIZE {
            return Err(DecodeError::InvalidTlvLength(stlv_len));
        }

        let nbr_system_id = SystemId::decode(buf)?;
        let flags = EndXSidFlags::from_bits_truncate(buf.get_u8());
        let algo = buf.get_u8();
        let weight = buf.get_u8();
        let behavior = behavior_decode(buf)?;
        let sid = buf.get_ipv6();
        let structure = sid_sstlvs_decode(buf)?;

        Ok(Srv6LanEndXSidStlv {
            nbr_system_id,
            flags,
            algo,
            weight,
            behavior,
            sid,
            structure,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let start_pos =
            tlv_encode_start(buf, NeighborStlvType::Srv6LanEndXSid);
        self.nbr_system_id.encode(buf);
        buf.put_u8(self.flags.bits());
        buf.put_u8(self.algo);
        buf.put_u8(self.weight);
        buf.put_u16(self.behavior.to_u16().unwrap());
        buf.put_ipv6(&self.sid);
        sid_sstlvs_encode(buf, &self.structure);
        tlv_encode_end(buf, start_pos);
    }
}
