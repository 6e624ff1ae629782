//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use bitflags::bitflags;
use derive_new::new;
use ipnetwork::Ipv6Network;
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

// SRv6 endpoint behaviors.
//
// The numeric codes are used both on the IS-IS wire and in the local-SID
// messages exchanged with the routing broker and the FPM.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum Behavior {
    Unspec = 0,
    End = 1,
    EndX = 2,
    EndT = 3,
    EndDx2 = 4,
    EndDx6 = 5,
    EndDx4 = 6,
    EndDt6 = 7,
    EndDt4 = 8,
    EndB6 = 9,
    EndB6Encap = 10,
    EndBm = 11,
    EndS = 12,
    EndAs = 13,
    EndAm = 14,
    EndBpf = 15,
    EndDt46 = 16,
    UDt4 = 100,
    UDt6 = 101,
    UDt46 = 102,
    UN = 103,
    UA = 104,
}

// SRv6 SID structure: block/node/function/argument lengths in bits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct SidStructure {
    pub block_len: u8,
    pub node_len: u8,
    pub function_len: u8,
    pub argument_len: u8,
}

// SRv6 locator attributes, as configured and as announced to protocol
// clients.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Locator {
    pub name: String,
    pub prefix: Ipv6Network,
    pub structure: SidStructure,
    pub usid: bool,
}

bitflags! {
    // Local-SID flavor operations.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct FlavorOps: u8 {
        const NEXT_CSID = 0x01;
    }
}

// Flavor descriptor attached to compressed-SID local SIDs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct LocalSidFlavor {
    pub ops: FlavorOps,
    pub lcblock_len: u8,
    pub lcnode_fn_len: u8,
}

// SRv6 manipulation errors.
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    InvalidStructure(u8, u8, u8, u8),
    InvalidBitRange(u8, u8),
}

// ===== impl Behavior =====

impl Behavior {
    // Returns the behavior announced to the forwarding broker.
    //
    // The compressed-SID flavors map to their base behaviors; the caller is
    // expected to attach a NEXT_CSID flavor descriptor.
    pub fn to_wire(&self) -> Behavior {
        match self {
            Behavior::UN => Behavior::End,
            Behavior::UA => Behavior::EndX,
            _ => *self,
        }
    }

    // Returns the behavior used for a locator's node SID.
    pub fn end_for(usid: bool) -> Behavior {
        if usid { Behavior::UN } else { Behavior::End }
    }

    // Returns the behavior used for an adjacency SID.
    pub fn end_x_for(usid: bool) -> Behavior {
        if usid { Behavior::UA } else { Behavior::EndX }
    }

    // Returns whether the behavior requires an attached VRF.
    pub fn requires_vrf(&self) -> bool {
        matches!(
            self,
            Behavior::EndT
                | Behavior::EndDt4
                | Behavior::EndDt6
                | Behavior::EndDt46
                | Behavior::UDt4
                | Behavior::UDt6
                | Behavior::UDt46
        )
    }

    // Returns whether the behavior requires an IPv6 adjacency.
    pub fn requires_nexthop(&self) -> bool {
        matches!(self, Behavior::EndX | Behavior::UA)
    }

    // Returns whether this is a compressed-SID (uSID) flavor.
    pub fn is_usid(&self) -> bool {
        matches!(
            self,
            Behavior::UDt4
                | Behavior::UDt6
                | Behavior::UDt46
                | Behavior::UN
                | Behavior::UA
        )
    }

    // Returns the configuration rendering of the behavior.
    pub fn to_cli_name(&self) -> &'static str {
        match self {
            Behavior::Unspec => "unspec",
            Behavior::End => "end",
            Behavior::EndX => "end-x",
            Behavior::EndT => "end-t",
            Behavior::EndDx2 => "end-dx2",
            Behavior::EndDx6 => "end-dx6",
            Behavior::EndDx4 => "end-dx4",
            Behavior::EndDt6 => "end-dt6",
            Behavior::EndDt4 => "end-dt4",
            Behavior::EndB6 => "end-b6",
            Behavior::EndB6Encap => "end-b6-encap",
            Behavior::EndBm => "end-bm",
            Behavior::EndS => "end-s",
            Behavior::EndAs => "end-as",
            Behavior::EndAm => "end-am",
            Behavior::EndBpf => "end-bpf",
            Behavior::EndDt46 => "end-dt46",
            Behavior::UDt4 => "udt4",
            Behavior::UDt6 => "udt6",
            Behavior::UDt46 => "udt46",
            Behavior::UN => "un",
            Behavior::UA => "ua",
        }
    }
}

impl std::str::FromStr for Behavior {
    type Err = ();

    // Parses the configuration rendering of the behavior.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "end" => Ok(Behavior::End),
            "end-x" => Ok(Behavior::EndX),
            "end-t" => Ok(Behavior::EndT),
            "end-dx2" => Ok(Behavior::EndDx2),
            "end-dx6" => Ok(Behavior::EndDx6),
            "end-dx4" => Ok(Behavior::EndDx4),
            "end-dt6" => Ok(Behavior::EndDt6),
            "end-dt4" => Ok(Behavior::EndDt4),
            "end-b6" => Ok(Behavior::EndB6),
            "end-b6-encap" => Ok(Behavior::EndB6Encap),
            "end-bm" => Ok(Behavior::EndBm),
            "end-s" => Ok(Behavior::EndS),
            "end-as" => Ok(Behavior::EndAs),
            "end-am" => Ok(Behavior::EndAm),
            "end-bpf" => Ok(Behavior::EndBpf),
            "end-dt46" => Ok(Behavior::EndDt46),
            "udt4" => Ok(Behavior::UDt4),
            "udt6" => Ok(Behavior::UDt6),
            "udt46" => Ok(Behavior::UDt46),
            "un" => Ok(Behavior::UN),
            "ua" => Ok(Behavior::UA),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Behavior::Unspec => write!(f, "unspec"),
            Behavior::End => write!(f, "End"),
            Behavior::EndX => write!(f, "End.X"),
            Behavior::EndT => write!(f, "End.T"),
            Behavior::EndDx2 => write!(f, "End.DX2"),
            Behavior::EndDx6 => write!(f, "End.DX6"),
            Behavior::EndDx4 => write!(f, "End.DX4"),
            Behavior::EndDt6 => write!(f, "End.DT6"),
            Behavior::EndDt4 => write!(f, "End.DT4"),
            Behavior::EndB6 => write!(f, "End.B6"),
            Behavior::EndB6Encap => write!(f, "End.B6.Encap"),
            Behavior::EndBm => write!(f, "End.BM"),
            Behavior::EndS => write!(f, "End.S"),
            Behavior::EndAs => write!(f, "End.AS"),
            Behavior::EndAm => write!(f, "End.AM"),
            Behavior::EndBpf => write!(f, "End.BPF"),
            Behavior::EndDt46 => write!(f, "End.DT46"),
            Behavior::UDt4 => write!(f, "uDT4"),
            Behavior::UDt6 => write!(f, "uDT6"),
            Behavior::UDt46 => write!(f, "uDT46"),
            Behavior::UN => write!(f, "uN"),
            Behavior::UA => write!(f, "uA"),
        }
    }
}

// ===== impl SidStructure =====

impl SidStructure {
    // Default structure of SIDs allocated from "usid-f3216" locators.
    pub const USID_F3216: SidStructure = SidStructure {
        block_len: 32,
        node_len: 16,
        function_len: 16,
        argument_len: 0,
    };

    // Default structure of SIDs allocated from uncompressed locators.
    pub const UNCOMPRESSED_F4024: SidStructure = SidStructure {
        block_len: 40,
        node_len: 24,
        function_len: 16,
        argument_len: 0,
    };

    pub fn new(
        block_len: u8,
        node_len: u8,
        function_len: u8,
        argument_len: u8,
    ) -> Result<SidStructure, Error> {
        let total = block_len as u16
            + node_len as u16
            + function_len as u16
            + argument_len as u16;
        if total > 128 {
            return Err(Error::InvalidStructure(
                block_len,
                node_len,
                function_len,
                argument_len,
            ));
        }

        Ok(SidStructure {
            block_len,
            node_len,
            function_len,
            argument_len,
        })
    }

    // Bit offset of the function part within the SID.
    pub fn function_offset(&self) -> u8 {
        self.block_len + self.node_len
    }

    // Total number of significant bits.
    pub fn length(&self) -> u8 {
        self.block_len + self.node_len + self.function_len + self.argument_len
    }
}

// ===== impl LocalSidFlavor =====

impl LocalSidFlavor {
    // Default locator-block and locator-node + function lengths attached to
    // compressed-SID behaviors.
    pub const DFLT_LCBLOCK_LEN: u8 = 32;
    pub const DFLT_LCNODE_FN_LEN: u8 = 16;

    // Returns the flavor descriptor used for uN and uA SIDs.
    pub fn next_csid() -> LocalSidFlavor {
        LocalSidFlavor {
            ops: FlavorOps::NEXT_CSID,
            lcblock_len: Self::DFLT_LCBLOCK_LEN,
            lcnode_fn_len: Self::DFLT_LCNODE_FN_LEN,
        }
    }
}

// ===== impl Error =====

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidStructure(block, node, function, argument) => {
                write!(
                    f,
                    "invalid SID structure ({}/{}/{}/{})",
                    block, node, function, argument
                )
            }
            Error::InvalidBitRange(offset, len) => {
                write!(f, "invalid SID bit range (offset {}, len {})", offset, len)
            }
        }
    }
}

impl std::error::Error for Error {}

// ===== global functions =====

// Overwrites `len` bits of `sid`, starting at `offset` from the most
// significant bit, with the lowest `len` bits of `index`.
pub fn transpose_sid(
    sid: Ipv6Addr,
    index: u32,
    offset: u8,
    len: u8,
) -> Result<Ipv6Addr, Error> {
    if len > 32 || offset as u16 + len as u16 > 128 {
        return Err(Error::InvalidBitRange(offset, len));
    }
    if len == 0 {
        return Ok(sid);
    }

    let shift = 128 - offset as u32 - len as u32;
    let mask = if len == 128 {
        u128::MAX
    } else {
        ((1u128 << len) - 1) << shift
    };

    let mut bits = u128::from(sid);
    bits &= !mask;
    bits |= ((index as u128) << shift) & mask;

    Ok(Ipv6Addr::from(bits))
}

// ===== tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_bits() {
        let sid: Ipv6Addr = "2001:db8::".parse().unwrap();

        // Function index 1 at offset 48, length 16.
        let sid = transpose_sid(sid, 1, 48, 16).unwrap();
        assert_eq!(sid, "2001:db8:0:1::".parse::<Ipv6Addr>().unwrap());

        // Rewriting the same range replaces the previous index.
        let sid = transpose_sid(sid, 0xbeef, 48, 16).unwrap();
        assert_eq!(sid, "2001:db8:0:beef::".parse::<Ipv6Addr>().unwrap());
    }

    #[test]
    fn transpose_preserves_outside_bits() {
        let sid: Ipv6Addr = "2001:db8:aaaa:bbbb::cccc".parse().unwrap();
        let mask = !(0xffffu128 << (128 - 48 - 16));

        for index in [0u32, 1, 0x7fff, 0xffff] {
            let out = transpose_sid(sid, index, 48, 16).unwrap();
            assert_eq!(u128::from(out) & mask, u128::from(sid) & mask);
        }
    }

    #[test]
    fn transpose_rejects_invalid_ranges() {
        let sid = Ipv6Addr::UNSPECIFIED;
        assert_eq!(
            transpose_sid(sid, 1, 120, 16),
            Err(Error::InvalidBitRange(120, 16))
        );
        assert_eq!(
            transpose_sid(sid, 1, 0, 33),
            Err(Error::InvalidBitRange(0, 33))
        );
    }

    #[test]
    fn structure_validation() {
        assert!(SidStructure::new(32, 16, 16, 0).is_ok());
        assert!(SidStructure::new(64, 32, 31, 1).is_ok());
        assert!(SidStructure::new(64, 32, 32, 1).is_err());
    }

    #[test]
    fn behavior_wire_mapping() {
        assert_eq!(Behavior::UN.to_wire(), Behavior::End);
        assert_eq!(Behavior::UA.to_wire(), Behavior::EndX);
        assert_eq!(Behavior::EndDt4.to_wire(), Behavior::EndDt4);
    }

    #[test]
    fn behavior_renderings() {
        assert_eq!(Behavior::EndDt4.to_string(), "End.DT4");
        assert_eq!(Behavior::EndDt4.to_cli_name(), "end-dt4");
        assert_eq!(Behavior::EndB6Encap.to_string(), "End.B6.Encap");
        assert_eq!(Behavior::UN.to_string(), "uN");
    }
}
