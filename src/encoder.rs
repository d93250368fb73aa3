//! Wire encoder and the message encoding engine
//!
//! [`WireEncoder`] is a growable byte writer with the primitive put
//! operations the codecs need. [`encode_message`] walks a message's schema in
//! registration order and emits one frame per value (or one packed frame per
//! packed field).

use tracing::trace;

use crate::error::{Error, Result};
use crate::field::{Field, Flags};
use crate::message::Message;
use crate::value::{FieldValue, Value};
use crate::wire::{self, WireType};

/// Growable output buffer
#[derive(Debug, Default)]
pub struct WireEncoder {
    buf: Vec<u8>,
}

impl WireEncoder {
    /// Create an empty encoder
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a u8 value
    #[inline]
    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a u32 value (big-endian)
    #[inline]
    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a u64 value (big-endian)
    #[inline]
    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write an i32 value (big-endian two's complement)
    #[inline]
    pub fn put_i32(&mut self, value: i32) {
        self.put_u32(value as u32)
    }

    /// Write an i64 value (big-endian two's complement)
    #[inline]
    pub fn put_i64(&mut self, value: i64) {
        self.put_u64(value as u64)
    }

    /// Write a varint-encoded u64
    #[inline]
    pub fn put_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Write variable-length bytes with length prefix
    #[inline]
    pub fn put_varbytes(&mut self, bytes: &[u8]) {
        self.put_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    /// Write raw bytes without length prefix
    #[inline]
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a field tag
    #[inline]
    pub fn put_tag(&mut self, number: u32, wire_type: WireType) {
        self.put_varint(wire::make_tag(number, wire_type));
    }

    /// Get current position in buffer
    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Get a slice of the encoded data
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Reset encoder for reuse, keeping the allocation
    #[inline]
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Take the encoded bytes
    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Encode a message to a fresh buffer
pub fn encode_message(msg: &Message) -> Result<Vec<u8>> {
    let mut out = WireEncoder::new();
    encode_fields(msg, &mut out)?;
    Ok(out.into_vec())
}

/// Append every present field of `msg` in schema order
pub fn encode_fields(msg: &Message, out: &mut WireEncoder) -> Result<()> {
    for (index, field) in msg.message_type().iter().enumerate() {
        match msg.slot(index) {
            None if field.flags() == Flags::Required => {
                return Err(Error::MissingRequiredField(field.name().to_owned()));
            }
            None => {}
            Some(FieldValue::Single(value)) => encode_single(field, value, out)?,
            Some(FieldValue::Repeated(values)) if field.flags() == Flags::PackedRepeated => {
                encode_packed(field, values, out)?
            }
            Some(FieldValue::Repeated(values)) => {
                for value in values {
                    encode_single(field, value, out)?;
                }
            }
        }
    }
    Ok(())
}

fn encode_single(field: &Field, value: &Value, out: &mut WireEncoder) -> Result<()> {
    let codec = field.codec();
    trace!(number = field.number(), codec = codec.name(), "encode field");
    out.put_tag(field.number(), codec.wire_type());
    codec.encode_value(value, out)
}

fn encode_packed(field: &Field, values: &[Value], out: &mut WireEncoder) -> Result<()> {
    let codec = field.codec();
    let mut block = WireEncoder::new();
    for value in values {
        codec.encode_value(value, &mut block)?;
    }
    trace!(
        number = field.number(),
        elements = values.len(),
        len = block.position(),
        "encode packed field"
    );
    out.put_tag(field.number(), WireType::LengthDelimited);
    out.put_varbytes(block.as_slice());
    Ok(())
}
