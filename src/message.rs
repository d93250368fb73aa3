//! Message values
//!
//! A [`Message`] holds one optional slot per schema field, in schema order.
//! A field is present exactly when its slot is filled; an empty `Bytes`
//! value is present, an untouched field is not.

use std::io::Write;
use std::sync::Arc;

use crate::encoder;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::message_type::MessageType;
use crate::value::{FieldValue, Value};

/// An instance of a [`MessageType`]
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    ty: Arc<MessageType>,
    slots: Vec<Option<FieldValue>>,
}

impl Message {
    pub(crate) fn new(ty: Arc<MessageType>) -> Self {
        let slots = vec![None; ty.len()];
        Self { ty, slots }
    }

    /// Schema this message is bound to
    #[inline]
    pub fn message_type(&self) -> &Arc<MessageType> {
        &self.ty
    }

    /// Assign a single-valued field, replacing any previous value
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let index = self.resolve(name)?;
        let field = self.ty.field_at(index);
        if field.flags().is_repeated() {
            return Err(mismatch(field, "a sequence of values"));
        }
        check(field, &value)?;
        self.slots[index] = Some(FieldValue::Single(value));
        Ok(())
    }

    /// Assign a repeated field, replacing any previous sequence
    ///
    /// An empty sequence marks the field present, but it only survives a
    /// round trip for `PackedRepeated`, which still writes an empty frame.
    /// A `Repeated` field writes one frame per element, so an empty one
    /// writes nothing and decodes as absent.
    pub fn set_repeated<I, V>(&mut self, name: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let index = self.resolve(name)?;
        let field = self.ty.field_at(index);
        if !field.flags().is_repeated() {
            return Err(mismatch(field, "a single value"));
        }
        let values = values.into_iter().map(Into::into).collect::<Vec<Value>>();
        for value in &values {
            check(field, value)?;
        }
        self.slots[index] = Some(FieldValue::Repeated(values));
        Ok(())
    }

    /// Append one element to a repeated field
    pub fn push(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let index = self.resolve(name)?;
        let field = self.ty.field_at(index);
        if !field.flags().is_repeated() {
            return Err(mismatch(field, "a single value"));
        }
        check(field, &value)?;
        push_slot(&mut self.slots[index], value);
        Ok(())
    }

    /// Value of a present single-valued field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field_value(name).and_then(FieldValue::as_single)
    }

    /// Elements of a present repeated field
    pub fn get_repeated(&self, name: &str) -> Option<&[Value]> {
        self.field_value(name).and_then(FieldValue::as_repeated)
    }

    /// Raw slot contents of a present field
    pub fn field_value(&self, name: &str) -> Option<&FieldValue> {
        let index = self.ty.index_of_name(name)?;
        self.slots[index].as_ref()
    }

    /// True when the field was set or decoded
    pub fn contains(&self, name: &str) -> bool {
        self.field_value(name).is_some()
    }

    /// Make a field absent again, returning what it held
    pub fn clear(&mut self, name: &str) -> Option<FieldValue> {
        let index = self.ty.index_of_name(name)?;
        self.slots[index].take()
    }

    /// Present fields in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&Field, &FieldValue)> + '_ {
        self.ty
            .iter()
            .zip(&self.slots)
            .filter_map(|(field, slot)| slot.as_ref().map(|v| (field, v)))
    }

    /// Encode to a new buffer
    pub fn encode(&self) -> Result<Vec<u8>> {
        encoder::encode_message(self)
    }

    /// Encode into a caller buffer, returning the number of bytes written
    ///
    /// Fails with `ShortBuffer` when `buf` cannot hold the whole message;
    /// `buf` contents are unspecified in that case.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let bytes = encoder::encode_message(self)?;
        if bytes.len() > buf.len() {
            return Err(Error::ShortBuffer);
        }
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    /// Encode into a byte sink
    pub fn encode_to<W: Write>(&self, mut sink: W) -> Result<()> {
        let bytes = encoder::encode_message(self)?;
        sink.write_all(&bytes)?;
        Ok(())
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&FieldValue> {
        self.slots[index].as_ref()
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Option<FieldValue> {
        &mut self.slots[index]
    }

    fn resolve(&self, name: &str) -> Result<usize> {
        self.ty
            .index_of_name(name)
            .ok_or_else(|| Error::UnknownFieldName(name.to_owned()))
    }
}

/// Append to a repeated slot, creating the sequence on first use
pub(crate) fn push_slot(slot: &mut Option<FieldValue>, value: Value) {
    match slot {
        Some(FieldValue::Repeated(values)) => values.push(value),
        _ => *slot = Some(FieldValue::Repeated(vec![value])),
    }
}

fn check(field: &Field, value: &Value) -> Result<()> {
    if field.codec().accepts(value) {
        Ok(())
    } else {
        Err(mismatch(field, field.codec().expected()))
    }
}

fn mismatch(field: &Field, expected: &'static str) -> Error {
    Error::ValueMismatch {
        field: field.name().to_owned(),
        expected,
    }
}
