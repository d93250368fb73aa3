//! Self-describing schemas
//!
//! A [`MessageType`] travels on the wire as a message of a fixed bootstrap
//! schema: one repeated embedded `FieldDescriptor` per registered field.
//!
//! ```text
//! FieldDescriptor                 TypeDescriptor
//!   1 number  UVarint  required     1 fields  FieldDescriptor  repeated
//!   2 name    Unicode  required
//!   3 codec   Unicode  required   (codec name, see codec::REGISTERED_NAMES)
//!   4 flags   UVarint  required   (Flags discriminant)
//! ```
//!
//! Decoding resolves codec names through [`codec::lookup`], which includes
//! `TypeMetadata` itself, so schemas may describe fields that hold schemas.
//! `EmbeddedMessage` fields cannot be described.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::codec::{self, Codec};
use crate::decoder::{self, DecodeContext};
use crate::encoder;
use crate::error::{Error, Result};
use crate::field::Flags;
use crate::message::Message;
use crate::message_type::MessageType;
use crate::value::{FieldValue, Value};

const NUMBER: &str = "number";
const NAME: &str = "name";
const CODEC: &str = "codec";
const FLAGS: &str = "flags";
const FIELDS: &str = "fields";

struct Bootstrap {
    descriptor: Arc<MessageType>,
    type_descriptor: Arc<MessageType>,
}

static BOOTSTRAP: OnceLock<Result<Bootstrap>> = OnceLock::new();

fn build_bootstrap() -> Result<Bootstrap> {
    let descriptor = Arc::new(
        MessageType::new()
            .with_field(1, NUMBER, Codec::UVarint, Flags::Required)?
            .with_field(2, NAME, Codec::Unicode, Flags::Required)?
            .with_field(3, CODEC, Codec::Unicode, Flags::Required)?
            .with_field(4, FLAGS, Codec::UVarint, Flags::Required)?,
    );
    let type_descriptor = Arc::new(MessageType::new().with_field(
        1,
        FIELDS,
        Codec::EmbeddedMessage(Arc::clone(&descriptor)),
        Flags::Repeated,
    )?);
    Ok(Bootstrap {
        descriptor,
        type_descriptor,
    })
}

fn bootstrap() -> Result<&'static Bootstrap> {
    BOOTSTRAP
        .get_or_init(build_bootstrap)
        .as_ref()
        .map_err(Clone::clone)
}

/// Schema of one field descriptor
pub fn field_descriptor_type() -> Result<Arc<MessageType>> {
    bootstrap().map(|b| Arc::clone(&b.descriptor))
}

/// Schema of a whole type description
pub fn type_descriptor_type() -> Result<Arc<MessageType>> {
    bootstrap().map(|b| Arc::clone(&b.type_descriptor))
}

/// Describe `ty` as a `TypeDescriptor` message
pub fn describe(ty: &MessageType) -> Result<Message> {
    let boot = bootstrap()?;
    let mut descriptors = Vec::with_capacity(ty.len());

    for field in ty {
        if let Codec::EmbeddedMessage(_) = field.codec() {
            return Err(Error::NotDescribable(field.name().to_owned()));
        }
        let mut d = boot.descriptor.new_message();
        d.set(NUMBER, Value::UVarint(field.number() as u64))?;
        d.set(NAME, field.name())?;
        d.set(CODEC, field.codec().name())?;
        d.set(FLAGS, Value::UVarint(field.flags().bits() as u64))?;
        descriptors.push(Value::Message(d));
    }

    let mut description = boot.type_descriptor.new_message();
    description.set_repeated(FIELDS, descriptors)?;
    Ok(description)
}

/// Rebuild a schema from a `TypeDescriptor` message
///
/// Entries of the wrong shape fail with `ValueMismatch` rather than being
/// read as defaults.
pub fn reconstruct(description: &Message) -> Result<MessageType> {
    let entries = match description.field_value(FIELDS) {
        None => &[][..],
        Some(FieldValue::Repeated(values)) => values.as_slice(),
        Some(FieldValue::Single(_)) => {
            return Err(mismatch(FIELDS, "a sequence of field descriptors"));
        }
    };

    let mut ty = MessageType::new();
    for entry in entries {
        let d = entry
            .as_message()
            .ok_or_else(|| mismatch(FIELDS, "a field descriptor message"))?;

        let raw_number = uvarint(d, NUMBER)?;
        let number = u32::try_from(raw_number).map_err(|_| Error::InvalidField {
            number: raw_number,
            reason: "field number out of range",
        })?;
        let name = text(d, NAME)?;
        let codec_name = text(d, CODEC)?;
        let codec = codec::lookup(codec_name)
            .ok_or_else(|| Error::UnknownCodecName(codec_name.to_owned()))?;
        let flags = Flags::from_bits(uvarint(d, FLAGS)?)?;

        ty.add_field(number, name, codec, flags)?;
    }

    debug!(fields = ty.len(), "reconstructed message type");
    Ok(ty)
}

fn required<'m>(d: &'m Message, name: &str) -> Result<&'m Value> {
    d.get(name)
        .ok_or_else(|| Error::MissingRequiredField(name.to_owned()))
}

fn uvarint(d: &Message, name: &str) -> Result<u64> {
    match required(d, name)? {
        Value::UVarint(v) => Ok(*v),
        _ => Err(mismatch(name, "a UVarint value")),
    }
}

fn text<'m>(d: &'m Message, name: &str) -> Result<&'m str> {
    required(d, name)?
        .as_str()
        .ok_or_else(|| mismatch(name, "a Unicode value"))
}

fn mismatch(field: &str, expected: &'static str) -> Error {
    Error::ValueMismatch {
        field: field.to_owned(),
        expected,
    }
}

/// Encode a schema body (no outer tag or length)
pub(crate) fn encode_type(ty: &MessageType) -> Result<Vec<u8>> {
    encoder::encode_message(&describe(ty)?)
}

/// Decode a schema body produced by [`encode_type`]
pub(crate) fn decode_type(bytes: &[u8], ctx: &DecodeContext<'_>) -> Result<MessageType> {
    let boot = bootstrap()?;
    let description = decoder::decode_message(&boot.type_descriptor, bytes, ctx)?;
    reconstruct(&description)
}
