//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use num_traits::ToPrimitive;
use rove_utils::bytes::{BytesExt, BytesMutExt};
use rove_utils::srv6::Behavior;
use serde::{Deserialize, Serialize};

use crate::packet::consts::LocatorStlvType;
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::subtlvs::{
    Srv6SidStructureSstlv, behavior_decode, sid_sstlvs_decode,
    sid_sstlvs_encode,
};
use crate::packet::tlv::{tlv_encode_end, tlv_encode_start};

// SRv6 End SID Sub-TLV.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Srv6EndSidStlv {
    pub flags: u8,
    pub behavior: Behavior,
    pub sid: Ipv6Addr,
    pub structure: Option<Srv6SidStructureSstlv>,
}

// ===== impl Srv6EndSidStlv =====

impl Srv6EndSidStlv {
    const MIN_SIZE: usize = 20;

    pub fn decode(stlv_len: u8, buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate the TLV length.
        if (stlv_len as usize) < Self::MIN_SIZE {
            return Err(DecodeError::InvalidTlvLength(stlv_len));
        }

        let flags = buf.get_u8();
        let behavior = behavior_decode(buf)?;
        let sid = buf.get_ipv6();
        let structure = sid_sstlvs_decode(buf)?;

        Ok(Srv6EndSidStlv {
            flags,
            behavior,
            sid,
            structure,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let start_pos = tlv_encode_start(buf, LocatorStlvType::Srv6EndSid);
        buf.put_u8(self.flags);
        buf.put_u16(self.behavior.to_u16().unwrap());
        buf.put_ipv6(&self.sid);
        sid_sstlvs_encode(buf, &self.structure);
        tlv_encode_end(buf, start_pos);
    }
}
