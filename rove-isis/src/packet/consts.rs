//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

// IS-IS top-level TLV types.
//
// IANA registry:
// https://www.iana.org/assignments/isis-tlv-codepoints/isis-tlv-codepoints.xhtml#tlv-codepoints
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum TlvType {
    NodeMsd = 23,
    Srv6Locator = 27,
    RouterCapability = 242,
}

// IS-IS Sub-TLVs for the Router Capability TLV.
//
// IANA registry:
// https://www.iana.org/assignments/isis-tlv-codepoints/isis-tlv-codepoints.xhtml#isis-tlv-codepoints-242
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum RouterCapStlvType {
    Srv6Capabilities = 25,
}

// IS-IS Sub-TLVs for TLVs Advertising Neighbor Information.
//
// IANA registry:
// https://www.iana.org/assignments/isis-tlv-codepoints/isis-tlv-codepoints.xhtml#isis-tlv-codepoints-advertising-neighbor-information
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum NeighborStlvType {
    Srv6EndXSid = 43,
    Srv6LanEndXSid = 44,
}

// IS-IS Sub-TLVs for the SRv6 Locator TLV.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum LocatorStlvType {
    Srv6EndSid = 5,
}

// IS-IS Sub-Sub-TLVs for SRv6 SID Sub-TLVs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum Srv6SidSstlvType {
    SidStructure = 1,
}

// Node MSD types advertised for SRv6.
//
// IANA registry:
// https://www.iana.org/assignments/igp-parameters/igp-parameters.xhtml#igp-msd-types
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum MsdType {
    BaseMplsImposition = 1,
    MaxSegsLeft = 41,
    MaxEndPop = 42,
    MaxHEncaps = 44,
    MaxEndD = 45,
}
