//! Value codecs and the process-wide codec registry
//!
//! Every codec knows its wire type, the registered name `TypeMetadata` uses to
//! refer to it, and how to move one [`Value`] to and from the wire. Fixed-width
//! numbers are big-endian; this codec does not interoperate with little-endian
//! protobuf peers for `UInt64`/`Int64`/`Int32`/`Float32`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::decoder::{self, DecodeContext, WireCursor};
use crate::encoder::{self, WireEncoder};
use crate::error::{Error, Result};
use crate::message_type::MessageType;
use crate::metadata;
use crate::value::Value;
use crate::varint;
use crate::wire::WireType;

/// A field codec
///
/// Equality and hashing are structural: an `EmbeddedMessage` compares by its
/// inner type's structure, not by pointer.
#[derive(Debug, Clone)]
pub enum Codec {
    /// Unsigned base-128 varint
    UVarint,
    /// Signed varint, zigzag mapped
    Varint,
    /// One byte, 0 or 1, varint wire type
    Bool,
    /// Eight bytes, big-endian
    UInt64,
    /// Eight bytes, big-endian two's complement
    Int64,
    /// Four bytes, big-endian two's complement
    Int32,
    /// IEEE-754 single precision, big-endian
    Float32,
    /// Length-prefixed raw bytes
    Bytes,
    /// UTF-8 text with `Bytes` framing
    Unicode,
    /// Nested message of a fixed type
    EmbeddedMessage(Arc<MessageType>),
    /// A message type described by the bootstrap schema
    TypeMetadata,
}

/// Names of every codec resolvable by [`lookup`], in registration order
pub const REGISTERED_NAMES: [&str; 10] = [
    "UVarint",
    "Varint",
    "Bool",
    "UInt64",
    "Int64",
    "Int32",
    "Float32",
    "Bytes",
    "Unicode",
    "TypeMetadata",
];

/// Resolve a registered codec name
///
/// `EmbeddedMessage` is never registered since it needs an inner type.
pub fn lookup(name: &str) -> Option<Codec> {
    let codec = match name {
        "UVarint" => Codec::UVarint,
        "Varint" => Codec::Varint,
        "Bool" => Codec::Bool,
        "UInt64" => Codec::UInt64,
        "Int64" => Codec::Int64,
        "Int32" => Codec::Int32,
        "Float32" => Codec::Float32,
        "Bytes" => Codec::Bytes,
        "Unicode" => Codec::Unicode,
        "TypeMetadata" => Codec::TypeMetadata,
        _ => return None,
    };
    Some(codec)
}

impl Codec {
    /// Registered name of this codec
    pub fn name(&self) -> &'static str {
        match self {
            Codec::UVarint => "UVarint",
            Codec::Varint => "Varint",
            Codec::Bool => "Bool",
            Codec::UInt64 => "UInt64",
            Codec::Int64 => "Int64",
            Codec::Int32 => "Int32",
            Codec::Float32 => "Float32",
            Codec::Bytes => "Bytes",
            Codec::Unicode => "Unicode",
            Codec::EmbeddedMessage(_) => "EmbeddedMessage",
            Codec::TypeMetadata => "TypeMetadata",
        }
    }

    /// Intrinsic wire type of a single value
    pub fn wire_type(&self) -> WireType {
        match self {
            Codec::UVarint | Codec::Varint | Codec::Bool => WireType::Varint,
            Codec::UInt64 | Codec::Int64 => WireType::Fixed64,
            Codec::Int32 | Codec::Float32 => WireType::Fixed32,
            Codec::Bytes | Codec::Unicode | Codec::EmbeddedMessage(_) | Codec::TypeMetadata => {
                WireType::LengthDelimited
            }
        }
    }

    /// True for codecs whose values are messages or schemas
    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(self, Codec::EmbeddedMessage(_) | Codec::TypeMetadata)
    }

    /// Whether `value` can be encoded by this codec
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Codec::UVarint, Value::UVarint(_))
            | (Codec::Varint, Value::Varint(_))
            | (Codec::Bool, Value::Bool(_))
            | (Codec::UInt64, Value::UInt64(_))
            | (Codec::Int64, Value::Int64(_))
            | (Codec::Int32, Value::Int32(_))
            | (Codec::Float32, Value::Float32(_))
            | (Codec::Bytes, Value::Bytes(_))
            | (Codec::Unicode, Value::Unicode(_))
            | (Codec::TypeMetadata, Value::Type(_)) => true,
            (Codec::EmbeddedMessage(inner), Value::Message(m)) => **m.message_type() == **inner,
            _ => false,
        }
    }

    /// Short description of accepted values, for mismatch errors
    pub(crate) fn expected(&self) -> &'static str {
        match self {
            Codec::UVarint => "a UVarint value",
            Codec::Varint => "a Varint value",
            Codec::Bool => "a Bool value",
            Codec::UInt64 => "a UInt64 value",
            Codec::Int64 => "an Int64 value",
            Codec::Int32 => "an Int32 value",
            Codec::Float32 => "a Float32 value",
            Codec::Bytes => "a Bytes value",
            Codec::Unicode => "a Unicode value",
            Codec::EmbeddedMessage(_) => "a message of the embedded type",
            Codec::TypeMetadata => "a message type",
        }
    }

    /// Encode a standalone value, without tag
    ///
    /// ```
    /// use metabuf::{Codec, Value};
    ///
    /// assert_eq!(Codec::UVarint.encode(&Value::UVarint(270)).unwrap(), [0x8E, 0x02]);
    /// assert_eq!(Codec::Varint.encode(&Value::Varint(-2)).unwrap(), [0x03]);
    /// ```
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let mut out = WireEncoder::new();
        self.encode_value(value, &mut out)?;
        Ok(out.into_vec())
    }

    /// Decode a standalone value that must span all of `bytes`
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let mut cursor = WireCursor::new(bytes);
        let value = self.decode_value(&mut cursor, &DecodeContext::default())?;
        if !cursor.is_at_end() {
            return Err(Error::TrailingBytes(cursor.remaining()));
        }
        Ok(value)
    }

    /// Append the encoding of one value
    pub(crate) fn encode_value(&self, value: &Value, out: &mut WireEncoder) -> Result<()> {
        match (self, value) {
            (Codec::UVarint, Value::UVarint(v)) => out.put_varint(*v),
            (Codec::Varint, Value::Varint(v)) => out.put_varint(varint::zigzag_encode(*v)),
            (Codec::Bool, Value::Bool(v)) => out.put_u8(*v as u8),
            (Codec::UInt64, Value::UInt64(v)) => out.put_u64(*v),
            (Codec::Int64, Value::Int64(v)) => out.put_i64(*v),
            (Codec::Int32, Value::Int32(v)) => out.put_i32(*v),
            (Codec::Float32, Value::Float32(v)) => out.put_u32(v.to_bits()),
            (Codec::Bytes, Value::Bytes(v)) => out.put_varbytes(v),
            (Codec::Unicode, Value::Unicode(s)) => out.put_varbytes(s.as_bytes()),
            (Codec::EmbeddedMessage(inner), Value::Message(m)) => {
                if **m.message_type() != **inner {
                    return Err(self.mismatch());
                }
                let body = encoder::encode_message(m)?;
                out.put_varbytes(&body);
            }
            (Codec::TypeMetadata, Value::Type(t)) => {
                let body = metadata::encode_type(t)?;
                out.put_varbytes(&body);
            }
            _ => return Err(self.mismatch()),
        }
        Ok(())
    }

    /// Read one value from the cursor
    pub(crate) fn decode_value(
        &self,
        cursor: &mut WireCursor<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value> {
        let value = match self {
            Codec::UVarint => Value::UVarint(cursor.get_varint()?),
            Codec::Varint => Value::Varint(varint::zigzag_decode(cursor.get_varint()?)),
            Codec::Bool => match cursor.get_u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => return Err(Error::InvalidBooleanByte(other)),
            },
            Codec::UInt64 => Value::UInt64(cursor.get_u64()?),
            Codec::Int64 => Value::Int64(cursor.get_i64()?),
            Codec::Int32 => Value::Int32(cursor.get_i32()?),
            Codec::Float32 => Value::Float32(f32::from_bits(cursor.get_u32()?)),
            Codec::Bytes | Codec::Unicode | Codec::EmbeddedMessage(_) | Codec::TypeMetadata => {
                let body = cursor.get_varbytes()?;
                self.decode_payload(body, ctx)?
            }
        };
        Ok(value)
    }

    /// Decode the body of a length-delimited frame, prefix already removed
    pub(crate) fn decode_payload(&self, payload: &[u8], ctx: &DecodeContext<'_>) -> Result<Value> {
        let value = match self {
            Codec::Bytes => Value::Bytes(payload.to_vec()),
            Codec::Unicode => {
                let text = std::str::from_utf8(payload).map_err(|_| Error::InvalidUtf8)?;
                Value::Unicode(text.to_owned())
            }
            Codec::EmbeddedMessage(inner) => {
                Value::Message(decoder::decode_message(inner, payload, &ctx.nested()?)?)
            }
            Codec::TypeMetadata => {
                Value::Type(Arc::new(metadata::decode_type(payload, &ctx.nested()?)?))
            }
            // fixed-width and varint codecs never own a length-delimited frame
            Codec::UVarint
            | Codec::Varint
            | Codec::Bool
            | Codec::UInt64
            | Codec::Int64
            | Codec::Int32
            | Codec::Float32 => {
                return Err(Error::InvalidWireType(WireType::LengthDelimited.bits()));
            }
        };
        Ok(value)
    }

    fn mismatch(&self) -> Error {
        Error::ValueMismatch {
            field: self.name().to_owned(),
            expected: self.expected(),
        }
    }

    fn kind_id(&self) -> u8 {
        match self {
            Codec::UVarint => 0,
            Codec::Varint => 1,
            Codec::Bool => 2,
            Codec::UInt64 => 3,
            Codec::Int64 => 4,
            Codec::Int32 => 5,
            Codec::Float32 => 6,
            Codec::Bytes => 7,
            Codec::Unicode => 8,
            Codec::EmbeddedMessage(_) => 9,
            Codec::TypeMetadata => 10,
        }
    }
}

impl PartialEq for Codec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Codec::EmbeddedMessage(a), Codec::EmbeddedMessage(b)) => a == b,
            _ => self.kind_id() == other.kind_id(),
        }
    }
}

impl Eq for Codec {}

impl Hash for Codec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind_id().hash(state);
        if let Codec::EmbeddedMessage(inner) = self {
            inner.hash(state);
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
