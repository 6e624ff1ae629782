//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod consts;
pub mod error;
pub mod subtlvs;
pub mod tlv;

use std::str::FromStr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::packet::error::{DecodeError, DecodeResult};

// IS-IS System ID.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct SystemId([u8; 6]);

// ===== impl SystemId =====

impl SystemId {
    pub const LENGTH: usize = 6;

    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        if buf.remaining() < Self::LENGTH {
            return Err(DecodeError::IncompletePacket);
        }
        let mut bytes = [0u8; 6];
        buf.copy_to_slice(&mut bytes);
        Ok(SystemId(bytes))
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 6]> for SystemId {
    fn from(bytes: [u8; 6]) -> SystemId {
        SystemId(bytes)
    }
}

impl std::fmt::Display for SystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02x}{:02x}.{:02x}{:02x}.{:02x}{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for SystemId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups = s.split('.').collect::<Vec<_>>();
        if groups.len() != 3 {
            return Err(());
        }

        let mut bytes = [0u8; 6];
        for (i, group) in groups.iter().enumerate() {
            if group.len() != 4 || !group.is_ascii() {
                return Err(());
            }
            for (j, octet) in [&group[0..2], &group[2..4]].iter().enumerate() {
                bytes[i * 2 + j] =
                    u8::from_str_radix(octet, 16).map_err(|_| ())?;
            }
        }

        Ok(SystemId(bytes))
    }
}
