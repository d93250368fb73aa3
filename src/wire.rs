//! Wire types and field tags

use crate::error::{Error, Result};

/// Framing kind carried in the low three bits of every tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Base-128 varint
    Varint = 0,
    /// Eight fixed bytes
    Fixed64 = 1,
    /// Varint length followed by that many bytes
    LengthDelimited = 2,
    /// Four fixed bytes
    Fixed32 = 5,
}

impl WireType {
    /// Parse the low three bits of a tag
    #[inline]
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(Error::InvalidWireType(other)),
        }
    }

    /// Numeric value as it appears in the tag
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Build the tag value `number << 3 | wire_type`
#[inline]
pub const fn make_tag(number: u32, wire_type: WireType) -> u64 {
    ((number as u64) << 3) | wire_type as u64
}

/// Split a tag into field number and raw wire type bits
///
/// The number is returned at full width. Numbers no schema can hold (zero,
/// or above `MAX_FIELD_NUMBER`) are simply unknown to every schema.
#[inline]
pub const fn split_tag(tag: u64) -> (u64, u8) {
    (tag >> 3, (tag & 0x7) as u8)
}
