//! Variable-length integer encoding (LEB128)
//!
//! Little-endian base-128: seven value bits per byte, high bit set on every
//! byte but the last. Used for tags, lengths and the `UVarint`/`Varint`/`Bool`
//! codecs. Signed values go through the zigzag mapping first.

use crate::error::{Error, Result};

/// Maximum bytes needed for a u64 varint (10 bytes)
pub const MAX_VARINT_U64_SIZE: usize = 10;

/// Encode a u64 as varint into the given buffer
///
/// Returns the number of bytes written, or Error::ShortBuffer if insufficient space.
#[inline]
pub fn encode_u64(value: u64, buf: &mut [u8]) -> Result<usize> {
    let mut value = value;
    let mut pos = 0;

    loop {
        if pos >= buf.len() {
            return Err(Error::ShortBuffer);
        }

        if value < 0x80 {
            buf[pos] = value as u8;
            return Ok(pos + 1);
        }

        buf[pos] = (value as u8) | 0x80;
        value >>= 7;
        pos += 1;
    }
}

/// Decode a u64 varint from the given buffer
///
/// Returns (value, bytes_consumed). Running out of input before the final
/// byte, or a value wider than 64 bits, is `Error::MalformedVarint`.
#[inline]
pub fn decode_u64(buf: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0;
    let mut pos = 0;

    loop {
        if pos >= buf.len() || pos >= MAX_VARINT_U64_SIZE {
            return Err(Error::MalformedVarint);
        }

        let byte = buf[pos];
        pos += 1;

        // only one bit of the tenth byte fits in a u64
        if shift == 63 && byte & 0x7E != 0 {
            return Err(Error::MalformedVarint);
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 == 0 {
            return Ok((result, pos));
        }

        shift += 7;
    }
}

/// Number of bytes `value` occupies as a varint
#[inline]
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Zigzag-map a signed integer so small magnitudes stay short
#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`]
#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
