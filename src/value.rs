//! Dynamically typed field values

use std::sync::Arc;

use crate::message::Message;
use crate::message_type::MessageType;

/// One value of some codec
///
/// Each variant pairs with exactly one codec; see [`Codec::accepts`](crate::Codec::accepts).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `UVarint`
    UVarint(u64),
    /// `Varint`
    Varint(i64),
    /// `Bool`
    Bool(bool),
    /// `UInt64`
    UInt64(u64),
    /// `Int64`
    Int64(i64),
    /// `Int32`
    Int32(i32),
    /// `Float32`
    Float32(f32),
    /// `Bytes`
    Bytes(Vec<u8>),
    /// `Unicode`
    Unicode(String),
    /// `EmbeddedMessage`
    Message(Message),
    /// `TypeMetadata`
    Type(Arc<MessageType>),
}

impl Value {
    /// Unsigned integer payload (`UVarint`, `UInt64`)
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::UVarint(v) | Value::UInt64(v) => Some(v),
            _ => None,
        }
    }

    /// Signed integer payload (`Varint`, `Int64`, `Int32`)
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Varint(v) | Value::Int64(v) => Some(v),
            Value::Int32(v) => Some(v as i64),
            _ => None,
        }
    }

    /// `Bool` payload
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// `Float32` payload
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::Float32(v) => Some(v),
            _ => None,
        }
    }

    /// Raw bytes (`Bytes`, or the UTF-8 of `Unicode`)
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v.as_slice()),
            Value::Unicode(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// `Unicode` payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Unicode(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Nested message payload
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Schema payload
    pub fn as_type(&self) -> Option<&Arc<MessageType>> {
        match self {
            Value::Type(t) => Some(t),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Unicode(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Unicode(v.to_owned())
    }
}

impl From<Message> for Value {
    fn from(v: Message) -> Self {
        Value::Message(v)
    }
}

impl From<Arc<MessageType>> for Value {
    fn from(v: Arc<MessageType>) -> Self {
        Value::Type(v)
    }
}

/// Contents of a present field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// `SIMPLE` and `REQUIRED` fields
    Single(Value),
    /// `REPEATED` and `PACKED_REPEATED` fields, in wire order
    Repeated(Vec<Value>),
}

impl FieldValue {
    /// The single value, if this is not a repeated field
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            FieldValue::Single(v) => Some(v),
            FieldValue::Repeated(_) => None,
        }
    }

    /// The element sequence, if this is a repeated field
    pub fn as_repeated(&self) -> Option<&[Value]> {
        match self {
            FieldValue::Single(_) => None,
            FieldValue::Repeated(v) => Some(v.as_slice()),
        }
    }
}
