//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod capability;
pub mod locator;
pub mod neighbor;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use num_traits::FromPrimitive;
use rove_utils::srv6::{Behavior, SidStructure};
use serde::{Deserialize, Serialize};

use crate::packet::consts::Srv6SidSstlvType;
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::tlv::{TLV_HDR_SIZE, tlv_encode_end, tlv_encode_start};

// SRv6 SID Structure Sub-Sub-TLV.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Srv6SidStructureSstlv(pub SidStructure);

// ===== impl Srv6SidStructureSstlv =====

impl Srv6SidStructureSstlv {
    const SIZE: usize = 4;

    pub fn decode(sstlv_len: u8, buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate the TLV length.
        if sstlv_len as usize != Self::SIZE {
            return Err(DecodeError::InvalidTlvLength(sstlv_len));
        }

        let block_len = buf.get_u8();
        let node_len = buf.get_u8();
        let function_len = buf.get_u8();
        let argument_len = buf.get_u8();
        let structure =
            SidStructure::new(block_len, node_len, function_len, argument_len)
                .map_err(|_| DecodeError::InvalidTlvLength(sstlv_len))?;

        Ok(Srv6SidStructureSstlv(structure))
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let start_pos = tlv_encode_start(buf, Srv6SidSstlvType::SidStructure);
        buf.put_u8(self.0.block_len);
        buf.put_u8(self.0.node_len);
        buf.put_u8(self.0.function_len);
        buf.put_u8(self.0.argument_len);
        tlv_encode_end(buf, start_pos);
    }

    pub fn get(&self) -> &SidStructure {
        &self.0
    }
}

// ===== helper functions =====

// Decodes the sub-sub-TLV block trailing an SRv6 SID sub-TLV.
pub(crate) fn sid_sstlvs_decode(
    buf: &mut Bytes,
) -> DecodeResult<Option<Srv6SidStructureSstlv>> {
    let mut structure = None;

    if !buf.has_remaining() {
        return Ok(structure);
    }
    let sstlvs_len = buf.get_u8();
    if buf.remaining() < sstlvs_len as usize {
        return Err(DecodeError::IncompletePacket);
    }
    let mut buf_sstlvs = buf.copy_to_bytes(sstlvs_len as usize);
    while buf_sstlvs.remaining() >= TLV_HDR_SIZE {
        let sstlv_type = buf_sstlvs.get_u8();
        let sstlv_len = buf_sstlvs.get_u8();
        if buf_sstlvs.remaining() < sstlv_len as usize {
            return Err(DecodeError::IncompletePacket);
        }
        let mut buf_sstlv = buf_sstlvs.copy_to_bytes(sstlv_len as usize);

        match Srv6SidSstlvType::from_u8(sstlv_type) {
            Some(Srv6SidSstlvType::SidStructure) => {
                let sstlv =
                    Srv6SidStructureSstlv::decode(sstlv_len, &mut buf_sstlv)?;
                structure = Some(sstlv);
            }
            _ => {
                // Ignore unknown sub-sub-TLV.
            }
        }
    }

    Ok(structure)
}

// Encodes the sub-sub-TLV block trailing an SRv6 SID sub-TLV.
pub(crate) fn sid_sstlvs_encode(
    buf: &mut BytesMut,
    structure: &Option<Srv6SidStructureSstlv>,
) {
    let sstlvs_pos = buf.len();
    buf.put_u8(0);
    if let Some(structure) = structure {
        structure.encode(buf);
    }
    buf[sstlvs_pos] = (buf.len() - sstlvs_pos - 1) as u8;
}

// Decodes an SRv6 endpoint behavior code.
pub(crate) fn behavior_decode(buf: &mut Bytes) -> DecodeResult<Behavior> {
    let code = buf.get_u16();
    Behavior::from_u16(code).ok_or(DecodeError::UnknownBehavior(code))
}
