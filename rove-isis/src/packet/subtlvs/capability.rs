//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::packet::consts::RouterCapStlvType;
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::tlv::{tlv_encode_end, tlv_encode_start};

// SRv6 Capabilities Sub-TLV.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Srv6CapabilitiesStlv {
    pub flags: Srv6CapFlags,
}

bitflags! {
    // SRv6 Capabilities flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct Srv6CapFlags: u16 {
        const O = 0x4000;
    }
}

// ===== impl Srv6CapabilitiesStlv =====

impl Srv6CapabilitiesStlv {
    const SIZE: usize = 2;

    pub fn decode(stlv_len: u8, buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate the TLV length.
        if (stlv_len as usize) < Self::SIZE {
            return Err(DecodeError::InvalidTlvLength(stlv_len));
        }

        let flags = Srv6CapFlags::from_bits_truncate(buf.get_u16());

        Ok(Srv6CapabilitiesStlv { flags })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let start_pos =
            tlv_encode_start(buf, RouterCapStlvType::Srv6Capabilities);
        buf.put_u16(self.flags.bits());
        tlv_encode_end(buf, start_pos);
    }
}
