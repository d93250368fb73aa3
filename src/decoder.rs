//! Byte sources, wire cursor and the message decoding engine
//!
//! Decoding makes a single pass over a [`ByteSource`]: read a tag, find the
//! field by number, read exactly the bytes that frame declares, hand them to
//! the field's codec. The frame boundaries come from the declared field; the
//! observed wire type is only checked against it. Every length prefix is
//! validated against what the source can still deliver before it is consumed.

use std::borrow::Cow;
use std::io::{self, Read};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::field::{Field, Flags};
use crate::message::{self, Message};
use crate::message_type::MessageType;
use crate::value::FieldValue;
use crate::varint;
use crate::wire::{self, WireType};
use crate::DEFAULT_MAX_DEPTH;

/// What to do with a tag whose field number the schema does not know
///
/// Every number without a registered field is unknown, including zero and
/// numbers above [`MAX_FIELD_NUMBER`](crate::MAX_FIELD_NUMBER) that no schema
/// can register. The policy applies to all of them alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFieldPolicy {
    /// Consume the frame using the observed wire type and drop it
    #[default]
    Skip,
    /// Fail with `Error::UnknownField`
    Reject,
}

/// Decoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Handling of unknown field numbers
    pub unknown_fields: UnknownFieldPolicy,
    /// Maximum nesting of embedded messages and schemas
    pub max_depth: usize,
}

impl DecodeOptions {
    const DEFAULT: DecodeOptions = DecodeOptions {
        unknown_fields: UnknownFieldPolicy::Skip,
        max_depth: DEFAULT_MAX_DEPTH,
    };
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static DEFAULT_OPTIONS: DecodeOptions = DecodeOptions::DEFAULT;

/// Options plus the current nesting depth
#[derive(Debug, Clone, Copy)]
pub(crate) struct DecodeContext<'o> {
    options: &'o DecodeOptions,
    depth: usize,
}

impl<'o> DecodeContext<'o> {
    pub(crate) fn new(options: &'o DecodeOptions) -> Self {
        Self { options, depth: 0 }
    }

    /// Context for one level deeper
    pub(crate) fn nested(&self) -> Result<Self> {
        let depth = self.depth + 1;
        if depth > self.options.max_depth {
            return Err(Error::DepthLimitExceeded(self.options.max_depth));
        }
        Ok(Self {
            options: self.options,
            depth,
        })
    }
}

impl Default for DecodeContext<'static> {
    fn default() -> Self {
        Self::new(&DEFAULT_OPTIONS)
    }
}

/// Incremental input for the decoding engine
pub trait ByteSource {
    /// Next byte, or `None` at end of input
    fn next_byte(&mut self) -> Result<Option<u8>>;

    /// Exactly `len` bytes, or `TruncatedBuffer` when fewer remain
    fn read_bytes(&mut self, len: usize) -> Result<Cow<'_, [u8]>>;
}

/// Cursor over an in-memory buffer
#[derive(Debug)]
pub struct WireCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireCursor<'a> {
    /// Create a cursor at the start of `buf`
    #[inline]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current read position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get remaining bytes in cursor
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Check if cursor is at end
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Skip bytes in the cursor
    #[inline]
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.get_bytes(n).map(|_| ())
    }

    /// Read a u8 value
    #[inline]
    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.get_array::<1>()?[0])
    }

    /// Read a u32 value (big-endian)
    #[inline]
    pub fn get_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.get_array()?))
    }

    /// Read a u64 value (big-endian)
    #[inline]
    pub fn get_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.get_array()?))
    }

    /// Read an i32 value (big-endian)
    #[inline]
    pub fn get_i32(&mut self) -> Result<i32> {
        Ok(self.get_u32()? as i32)
    }

    /// Read an i64 value (big-endian)
    #[inline]
    pub fn get_i64(&mut self) -> Result<i64> {
        Ok(self.get_u64()? as i64)
    }

    /// Read a varint-encoded u64
    #[inline]
    pub fn get_varint(&mut self) -> Result<u64> {
        let (value, varint_size) = varint::decode_u64(&self.buf[self.pos..])?;
        self.pos += varint_size;
        Ok(value)
    }

    /// Read variable-length bytes with length prefix
    ///
    /// Returns a zero-copy slice into the original buffer
    #[inline]
    pub fn get_varbytes(&mut self) -> Result<&'a [u8]> {
        let len = self.get_varint()?;
        self.get_bytes(to_len(len))
    }

    /// Read raw bytes without length prefix
    #[inline]
    pub fn get_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::TruncatedBuffer {
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Peek at bytes without advancing cursor
    #[inline]
    pub fn peek_bytes(&self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::TruncatedBuffer {
                needed: len,
                available: self.remaining(),
            });
        }
        Ok(&self.buf[self.pos..self.pos + len])
    }

    fn get_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.get_bytes(N)?);
        Ok(out)
    }
}

impl ByteSource for WireCursor<'_> {
    fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.get_u8().map(Some)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Cow<'_, [u8]>> {
        self.get_bytes(len).map(Cow::Borrowed)
    }
}

/// Adapter reading frames from any [`Read`] implementation
///
/// Pulls exactly the bytes each frame needs; nothing is read ahead.
#[derive(Debug)]
pub struct IoSource<R> {
    reader: R,
}

impl<R: Read> IoSource<R> {
    /// Wrap a reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Recover the reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for IoSource<R> {
    fn next_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_bytes(&mut self, len: usize) -> Result<Cow<'_, [u8]>> {
        // grow as data arrives so a bogus length cannot force a huge allocation
        let mut buf = Vec::new();
        (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(Error::TruncatedBuffer {
                needed: len,
                available: buf.len(),
            });
        }
        Ok(Cow::Owned(buf))
    }
}

/// Decode a whole buffer against `ty`
pub(crate) fn decode_message(
    ty: &Arc<MessageType>,
    bytes: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<Message> {
    decode_fields(ty, &mut WireCursor::new(bytes), ctx)
}

/// Decode frames until the source is exhausted
pub(crate) fn decode_fields<S: ByteSource>(
    ty: &Arc<MessageType>,
    src: &mut S,
    ctx: &DecodeContext<'_>,
) -> Result<Message> {
    let mut msg = ty.new_message();

    while let Some(tag) = read_tag(src)? {
        let (number, bits) = wire::split_tag(tag);
        let wire_type = WireType::from_bits(bits)?;

        let known = u32::try_from(number)
            .ok()
            .and_then(|n| ty.index_of_number(n));
        let Some(index) = known else {
            match ctx.options.unknown_fields {
                UnknownFieldPolicy::Skip => {
                    debug!(number, wire_type = bits, "skipping unknown field");
                    skip_frame(src, wire_type)?;
                    continue;
                }
                UnknownFieldPolicy::Reject => {
                    warn!(number, wire_type = bits, "rejecting unknown field");
                    return Err(Error::UnknownField(number));
                }
            }
        };

        let field = ty.field_at(index);
        trace!(number, name = field.name(), wire_type = bits, "decode field");
        decode_field(src, field, wire_type, msg.slot_mut(index), ctx)?;
    }

    for (index, field) in ty.iter().enumerate() {
        if field.flags() == Flags::Required && msg.slot(index).is_none() {
            return Err(Error::MissingRequiredField(field.name().to_owned()));
        }
    }

    Ok(msg)
}

fn decode_field<S: ByteSource>(
    src: &mut S,
    field: &Field,
    observed: WireType,
    slot: &mut Option<FieldValue>,
    ctx: &DecodeContext<'_>,
) -> Result<()> {
    let codec = field.codec();
    let flags = field.flags();
    let expected = match flags {
        Flags::PackedRepeated => WireType::LengthDelimited,
        _ => codec.wire_type(),
    };
    // repeated primitives may also arrive packed
    let packed = observed == WireType::LengthDelimited
        && (flags == Flags::PackedRepeated
            || (flags == Flags::Repeated && codec.wire_type() != WireType::LengthDelimited));

    if observed != expected && !packed {
        return Err(Error::UnexpectedWireType {
            number: field.number(),
            expected: expected.bits(),
            found: observed.bits(),
        });
    }

    if packed {
        let payload = read_length_delimited(src)?;
        let mut cursor = WireCursor::new(&payload);
        if slot.is_none() {
            *slot = Some(FieldValue::Repeated(Vec::new()));
        }
        while !cursor.is_at_end() {
            let value = codec.decode_value(&mut cursor, ctx)?;
            message::push_slot(slot, value);
        }
        return Ok(());
    }

    let value = match observed {
        WireType::LengthDelimited => {
            let payload = read_length_delimited(src)?;
            codec.decode_payload(&payload, ctx)?
        }
        WireType::Varint => {
            let (raw, len) = read_raw_varint(src)?;
            codec.decode_value(&mut WireCursor::new(&raw[..len]), ctx)?
        }
        WireType::Fixed64 => {
            let raw = src.read_bytes(8)?;
            codec.decode_value(&mut WireCursor::new(&raw), ctx)?
        }
        WireType::Fixed32 => {
            let raw = src.read_bytes(4)?;
            codec.decode_value(&mut WireCursor::new(&raw), ctx)?
        }
    };

    if flags.is_repeated() {
        message::push_slot(slot, value);
    } else {
        // last write wins
        *slot = Some(FieldValue::Single(value));
    }
    Ok(())
}

fn skip_frame<S: ByteSource>(src: &mut S, wire_type: WireType) -> Result<()> {
    match wire_type {
        WireType::Varint => read_raw_varint(src).map(|_| ()),
        WireType::Fixed64 => src.read_bytes(8).map(|_| ()),
        WireType::Fixed32 => src.read_bytes(4).map(|_| ()),
        WireType::LengthDelimited => read_length_delimited(src).map(|_| ()),
    }
}

/// Read a tag, or `None` when the source ends cleanly between frames
fn read_tag<S: ByteSource>(src: &mut S) -> Result<Option<u64>> {
    let Some(first) = src.next_byte()? else {
        return Ok(None);
    };
    let (raw, len) = read_varint_from(src, first)?;
    let (tag, _) = varint::decode_u64(&raw[..len])?;
    Ok(Some(tag))
}

fn read_raw_varint<S: ByteSource>(src: &mut S) -> Result<([u8; varint::MAX_VARINT_U64_SIZE], usize)> {
    let first = src.next_byte()?.ok_or(Error::MalformedVarint)?;
    read_varint_from(src, first)
}

fn read_varint_from<S: ByteSource>(
    src: &mut S,
    first: u8,
) -> Result<([u8; varint::MAX_VARINT_U64_SIZE], usize)> {
    let mut raw = [0u8; varint::MAX_VARINT_U64_SIZE];
    raw[0] = first;
    let mut len = 1;
    while raw[len - 1] & 0x80 != 0 {
        if len == raw.len() {
            return Err(Error::MalformedVarint);
        }
        raw[len] = src.next_byte()?.ok_or(Error::MalformedVarint)?;
        len += 1;
    }
    Ok((raw, len))
}

fn read_length_delimited<S: ByteSource>(src: &mut S) -> Result<Cow<'_, [u8]>> {
    let (raw, len) = read_raw_varint(src)?;
    let (declared, _) = varint::decode_u64(&raw[..len])?;
    src.read_bytes(to_len(declared))
}

/// Length prefixes past the address space can never be satisfied
#[inline]
fn to_len(declared: u64) -> usize {
    usize::try_from(declared).unwrap_or(usize::MAX)
}
