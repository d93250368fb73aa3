//! Field descriptors and repetition flags

use crate::codec::Codec;
use crate::error::{Error, Result};

/// How many values a field carries and how they are framed
///
/// The discriminants are the values `TypeMetadata` puts on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Flags {
    /// Optional single value, last write wins
    #[default]
    Simple = 0,
    /// Single value that must be present on encode and decode
    Required = 1,
    /// Zero or more values, one frame each
    Repeated = 2,
    /// Zero or more values concatenated in one length-delimited frame
    PackedRepeated = 6,
}

impl Flags {
    /// Numeric wire value
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Parse a numeric wire value
    pub fn from_bits(bits: u64) -> Result<Self> {
        match bits {
            0 => Ok(Flags::Simple),
            1 => Ok(Flags::Required),
            2 => Ok(Flags::Repeated),
            6 => Ok(Flags::PackedRepeated),
            other => Err(Error::InvalidFlags(other)),
        }
    }

    /// True for `Repeated` and `PackedRepeated`
    #[inline]
    pub const fn is_repeated(self) -> bool {
        matches!(self, Flags::Repeated | Flags::PackedRepeated)
    }
}

/// One registered field of a [`MessageType`](crate::MessageType)
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) number: u32,
    pub(crate) name: String,
    pub(crate) codec: Codec,
    pub(crate) flags: Flags,
}

impl Field {
    /// Field number used in the wire tag
    #[inline]
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Field name used for value access
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Codec for the field's values
    #[inline]
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Repetition flags
    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// `(number, name, codec, flags)` as one tuple
    pub fn as_tuple(&self) -> (u32, &str, &Codec, Flags) {
        (self.number, &self.name, &self.codec, self.flags)
    }
}
