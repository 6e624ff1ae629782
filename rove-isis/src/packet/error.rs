//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

// Type aliases.
pub type DecodeResult<T> = Result<T, DecodeError>;

// IS-IS message decoding errors.
#[derive(Debug, Eq, PartialEq)]
pub enum DecodeError {
    IncompletePacket,
    InvalidTlvLength(u8),
    InvalidLocatorSize(u8),
    UnknownBehavior(u16),
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::IncompletePacket => {
                write!(f, "incomplete packet")
            }
            DecodeError::InvalidTlvLength(tlv_len) => {
                write!(f, "invalid TLV length: {}", tlv_len)
            }
            DecodeError::InvalidLocatorSize(loc_size) => {
                write!(f, "invalid locator size: {}", loc_size)
            }
            DecodeError::UnknownBehavior(behavior) => {
                write!(f, "unknown SRv6 endpoint behavior: {}", behavior)
            }
        }
    }
}

impl std::error::Error for DecodeError {}
