//! Runtime message schemas
//!
//! A [`MessageType`] is an ordered list of fields plus two lookup indices
//! (by number for decoding, by name for value access). Registration order is
//! the encode order and the iteration order.
//!
//! # Structural identity
//!
//! `PartialEq`, `Eq` and `Hash` only look at each field's
//! `(number, codec, flags)` in order. Field names are ignored, so two
//! independently built schemas that differ only in naming compare equal.
//! This is what makes a schema that went through `TypeMetadata` compare equal
//! to the original.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::sync::Arc;

use crate::codec::Codec;
use crate::decoder::{self, DecodeContext, DecodeOptions, IoSource};
use crate::error::{Error, Result};
use crate::field::{Field, Flags};
use crate::message::Message;
use crate::MAX_FIELD_NUMBER;

/// Ordered, numbered, named fields describing one message layout
#[derive(Debug, Clone, Default)]
pub struct MessageType {
    fields: Vec<Field>,
    by_number: BTreeMap<u32, usize>,
    by_name: BTreeMap<String, usize>,
}

impl MessageType {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field
    ///
    /// Fails with `InvalidField` when the number is zero or above
    /// [`MAX_FIELD_NUMBER`], when the number or name is already taken, or when
    /// `PackedRepeated` is combined with a message or schema codec.
    pub fn add_field(
        &mut self,
        number: u32,
        name: impl Into<String>,
        codec: Codec,
        flags: Flags,
    ) -> Result<&mut Self> {
        let invalid = |reason| Error::InvalidField {
            number: number as u64,
            reason,
        };

        if number == 0 {
            return Err(invalid("field number must be positive"));
        }
        if number > MAX_FIELD_NUMBER {
            return Err(invalid("field number out of range"));
        }
        if self.by_number.contains_key(&number) {
            return Err(invalid("duplicate field number"));
        }
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(invalid("duplicate field name"));
        }
        if flags == Flags::PackedRepeated && codec.is_composite() {
            return Err(invalid("packed fields need a primitive codec"));
        }

        let index = self.fields.len();
        self.by_number.insert(number, index);
        self.by_name.insert(name.clone(), index);
        self.fields.push(Field {
            number,
            name,
            codec,
            flags,
        });
        Ok(self)
    }

    /// Builder form of [`add_field`](Self::add_field)
    pub fn with_field(
        mut self,
        number: u32,
        name: impl Into<String>,
        codec: Codec,
        flags: Flags,
    ) -> Result<Self> {
        self.add_field(number, name, codec, flags)?;
        Ok(self)
    }

    /// Fields in registration order
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Number of registered fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field is registered
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field registered under `name`
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index_of_name(name).map(|i| &self.fields[i])
    }

    /// Field registered under `number`
    pub fn field_by_number(&self, number: u32) -> Option<&Field> {
        self.index_of_number(number).map(|i| &self.fields[i])
    }

    pub(crate) fn index_of_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn index_of_number(&self, number: u32) -> Option<usize> {
        self.by_number.get(&number).copied()
    }

    pub(crate) fn field_at(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    /// 64-bit structural hash over `(number, codec, flags)` of every field
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Create an empty message bound to this schema
    pub fn new_message(self: &Arc<Self>) -> Message {
        Message::new(Arc::clone(self))
    }

    /// Decode a complete buffer with default options
    pub fn decode(self: &Arc<Self>, bytes: &[u8]) -> Result<Message> {
        self.decode_with(bytes, &DecodeOptions::default())
    }

    /// Decode a complete buffer
    pub fn decode_with(self: &Arc<Self>, bytes: &[u8], options: &DecodeOptions) -> Result<Message> {
        decoder::decode_message(self, bytes, &DecodeContext::new(options))
    }

    /// Decode from a reader until it reports end of input
    ///
    /// Reads exactly the bytes each frame declares.
    pub fn decode_from<R: Read>(self: &Arc<Self>, reader: R) -> Result<Message> {
        self.decode_from_with(reader, &DecodeOptions::default())
    }

    /// Decode from a reader with explicit options
    pub fn decode_from_with<R: Read>(
        self: &Arc<Self>,
        reader: R,
        options: &DecodeOptions,
    ) -> Result<Message> {
        let mut source = IoSource::new(reader);
        decoder::decode_fields(self, &mut source, &DecodeContext::new(options))
    }
}

impl<'a> IntoIterator for &'a MessageType {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self.fields.iter().zip(&other.fields).all(|(a, b)| {
                a.number == b.number && a.codec == b.codec && a.flags == b.flags
            })
    }
}

impl Eq for MessageType {}

impl Hash for MessageType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fields.len().hash(state);
        for field in &self.fields {
            field.number.hash(state);
            field.codec.hash(state);
            field.flags.hash(state);
        }
    }
}
