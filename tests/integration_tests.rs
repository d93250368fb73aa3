//! Integration tests for metabuf
//!
//! These tests verify end-to-end schema, encode and decode behaviour.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::sync::Arc;

use metabuf::*;

fn hash_of(ty: &MessageType) -> u64 {
    let mut hasher = DefaultHasher::new();
    ty.hash(&mut hasher);
    hasher.finish()
}

fn schema(fields: &[(u32, &str, Codec, Flags)]) -> Arc<MessageType> {
    let mut ty = MessageType::new();
    for (number, name, codec, flags) in fields {
        ty.add_field(*number, *name, codec.clone(), *flags).unwrap();
    }
    Arc::new(ty)
}

#[test]
fn test_dump_to_sink() {
    let test2 = schema(&[(2, "b", Codec::Bytes, Flags::Simple)]);
    let mut msg = test2.new_message();
    msg.set("b", &b"testing"[..]).unwrap();

    let mut sink = Vec::new();
    msg.encode_to(&mut sink).unwrap();
    assert_eq!(sink, b"\x12\x07\x74\x65\x73\x74\x69\x6e\x67");
    assert_eq!(msg.encode().unwrap(), sink);
}

#[test]
fn test_missing_optional_value() {
    let test2 = schema(&[(2, "b", Codec::Bytes, Flags::Simple)]);
    assert_eq!(test2.new_message().encode().unwrap(), b"");

    let msg = test2.decode(b"").unwrap();
    assert!(!msg.contains("b"));
}

#[test]
fn test_missing_required_value() {
    let test2 = schema(&[(2, "b", Codec::Bytes, Flags::Required)]);
    assert_eq!(
        test2.new_message().encode(),
        Err(Error::MissingRequiredField("b".into()))
    );
    assert_eq!(
        test2.decode(b""),
        Err(Error::MissingRequiredField("b".into()))
    );
}

#[test]
fn test_repeated_roundtrip() {
    let test2 = schema(&[(1, "b", Codec::UVarint, Flags::Repeated)]);
    let mut msg = test2.new_message();
    msg.set_repeated("b", [1u64, 2, 3].map(Value::UVarint)).unwrap();

    let bytes = msg.encode().unwrap();
    assert_eq!(bytes, b"\x08\x01\x08\x02\x08\x03");

    let back = test2.decode(&bytes).unwrap();
    assert!(back.contains("b"));
    assert_eq!(back, msg);
}

#[test]
fn test_packed_repeated_roundtrip() {
    let test4 = schema(&[(4, "d", Codec::UVarint, Flags::PackedRepeated)]);
    let mut msg = test4.new_message();
    msg.set_repeated("d", [3u64, 270, 86942].map(Value::UVarint))
        .unwrap();

    let bytes = msg.encode().unwrap();
    assert_eq!(bytes, b"\x22\x06\x03\x8E\x02\x9E\xA7\x05");

    let back = test4.decode(&bytes).unwrap();
    assert_eq!(
        back.get_repeated("d").unwrap(),
        &[Value::UVarint(3), Value::UVarint(270), Value::UVarint(86942)]
    );
}

#[test]
fn test_packed_fixed_width_and_bool() {
    let ty = schema(&[
        (1, "f", Codec::Float32, Flags::PackedRepeated),
        (2, "i", Codec::Int64, Flags::PackedRepeated),
        (3, "b", Codec::Bool, Flags::PackedRepeated),
    ]);
    let mut msg = ty.new_message();
    msg.set_repeated("f", [1.5f32, -0.25]).unwrap();
    msg.set_repeated("i", [Value::Int64(-1)]).unwrap();
    msg.set_repeated("b", [true, false, true]).unwrap();

    let bytes = msg.encode().unwrap();
    assert_eq!(&bytes[..2], &[0x0A, 0x08]);
    assert_eq!(&bytes[10..12], &[0x12, 0x08]);
    assert_eq!(&bytes[20..], &[0x1A, 0x03, 0x01, 0x00, 0x01]);

    assert_eq!(ty.decode(&bytes).unwrap(), msg);
}

#[test]
fn test_last_value_wins() {
    let test2 = schema(&[(1, "b", Codec::UVarint, Flags::Simple)]);
    let msg = test2.decode(b"\x08\x01\x08\x02\x08\x03").unwrap();
    assert_eq!(msg.get("b").and_then(Value::as_u64), Some(3));
}

#[test]
fn test_structural_hash() {
    let type1 = schema(&[(1, "b", Codec::UVarint, Flags::Simple)]);
    let type2 = schema(&[(1, "a", Codec::UVarint, Flags::Simple)]);
    let type3 = schema(&[(2, "a", Codec::UVarint, Flags::Simple)]);
    let type4 = schema(&[(1, "b", Codec::UVarint, Flags::Repeated)]);

    assert_eq!(hash_of(&type1), hash_of(&type2));
    assert_ne!(hash_of(&type1), hash_of(&type3));
    assert_ne!(hash_of(&type1), hash_of(&type4));
    assert_eq!(type1, type2);
    assert_ne!(type1, type3);
}

#[test]
fn test_iteration() {
    let type1 = schema(&[
        (1, "b", Codec::UVarint, Flags::Repeated),
        (2, "c", Codec::Bytes, Flags::PackedRepeated),
    ]);
    let mut it = type1.iter().map(Field::as_tuple);
    assert_eq!(it.next(), Some((1, "b", &Codec::UVarint, Flags::Repeated)));
    assert_eq!(
        it.next(),
        Some((2, "c", &Codec::Bytes, Flags::PackedRepeated))
    );
    assert_eq!(it.next(), None);
}

#[test]
fn test_empty_optional_bytes() {
    let type1 = schema(&[(1, "a", Codec::Bytes, Flags::Simple)]);
    let msg = type1.decode(b"\n\x00").unwrap();
    assert_eq!(msg.get("a").and_then(Value::as_bytes), Some(&b""[..]));

    let type1 = schema(&[(1, "a", Codec::Unicode, Flags::Simple)]);
    let msg = type1.decode(b"\n\x00").unwrap();
    assert_eq!(msg.get("a").and_then(Value::as_str), Some(""));
}

#[test]
fn test_embedded_message_bytes() {
    let test1 = schema(&[(1, "a", Codec::UVarint, Flags::Simple)]);
    let test3 = schema(&[(3, "c", Codec::EmbeddedMessage(test1.clone()), Flags::Simple)]);

    let mut inner = test1.new_message();
    inner.set("a", Value::UVarint(150)).unwrap();
    let mut msg = test3.new_message();
    msg.set("c", inner).unwrap();
    assert_eq!(msg.encode().unwrap(), b"\x1a\x03\x08\x96\x01");

    let msg = test3.decode(b"\x1a\x03\x08\x96\x01").unwrap();
    let c = msg.get("c").and_then(Value::as_message).unwrap();
    assert!(c.contains("a"));
    assert_eq!(c.get("a"), Some(&Value::UVarint(150)));
}

#[test]
fn test_embedded_message_boundaries() {
    let type2 = schema(&[(1, "a", Codec::UVarint, Flags::Simple)]);
    let type1 = schema(&[
        (1, "a", Codec::UVarint, Flags::Simple),
        (2, "b", Codec::EmbeddedMessage(type2.clone()), Flags::Simple),
        (3, "c", Codec::UVarint, Flags::Simple),
    ]);

    let mut b = type2.new_message();
    b.set("a", Value::UVarint(2)).unwrap();
    let mut msg = type1.new_message();
    msg.set("a", Value::UVarint(1)).unwrap();
    msg.set("c", Value::UVarint(3)).unwrap();
    msg.set("b", b).unwrap();

    let msg = type1.decode(&msg.encode().unwrap()).unwrap();
    assert_eq!(msg.get("a"), Some(&Value::UVarint(1)));
    assert_eq!(msg.get("c"), Some(&Value::UVarint(3)));
    let b = msg.get("b").and_then(Value::as_message).unwrap();
    assert_eq!(b.get("a"), Some(&Value::UVarint(2)));
}

#[test]
fn test_embedded_message_wrong_type_rejected() {
    let inner = schema(&[(1, "a", Codec::UVarint, Flags::Simple)]);
    let other = schema(&[(1, "a", Codec::Varint, Flags::Simple)]);
    let outer = schema(&[(1, "m", Codec::EmbeddedMessage(inner), Flags::Simple)]);

    let mut msg = outer.new_message();
    assert!(matches!(
        msg.set("m", other.new_message()),
        Err(Error::ValueMismatch { .. })
    ));
}

#[test]
fn test_type_metadata_bytes() {
    let test2 = schema(&[(2, "b", Codec::Bytes, Flags::Simple)]);
    let type1 = schema(&[(1, "t", Codec::TypeMetadata, Flags::Simple)]);

    let mut msg = type1.new_message();
    msg.set("t", test2).unwrap();
    assert_eq!(
        msg.encode().unwrap(),
        b"\n\x10\n\x0e\x08\x02\x12\x01b\x1a\x05Bytes \x00"
    );
}

#[test]
fn test_type_metadata_decode() {
    let type1 = schema(&[(1, "t", Codec::TypeMetadata, Flags::Simple)]);
    let msg = type1
        .decode(b"\n\x10\n\x0e\x08\x02\x12\x01b\x1a\x05Bytes \x00")
        .unwrap();

    let t = msg.get("t").and_then(Value::as_type).unwrap();
    let mut it = t.iter();
    assert_eq!(
        it.next().map(Field::as_tuple),
        Some((2, "b", &Codec::Bytes, Flags::Simple))
    );
    assert!(it.next().is_none());
}

#[test]
fn test_type_metadata_roundtrip() {
    let b = schema(&[]);
    let a = schema(&[
        (1, "a", Codec::Bytes, Flags::Simple),
        (2, "b", Codec::TypeMetadata, Flags::Simple),
        (3, "c", Codec::Bytes, Flags::Simple),
    ]);

    let mut msg = a.new_message();
    msg.set("a", &b"!"[..]).unwrap();
    msg.set("b", b.clone()).unwrap();
    msg.set("c", &b"!"[..]).unwrap();

    let msg = a.decode(&msg.encode().unwrap()).unwrap();
    let decoded = msg.get("b").and_then(Value::as_type).unwrap();
    assert_eq!(hash_of(decoded), hash_of(&b));
    assert_eq!(msg.get("c").and_then(Value::as_bytes), Some(&b"!"[..]));
}

#[test]
fn test_type_metadata_nested_roundtrip() {
    let a = schema(&[
        (1, "a", Codec::UVarint, Flags::Simple),
        (2, "b", Codec::TypeMetadata, Flags::Repeated),
        (3, "c", Codec::Bytes, Flags::Simple),
    ]);
    let b = schema(&[
        (4, "ololo", Codec::Float32, Flags::Simple),
        (5, "c", Codec::TypeMetadata, Flags::Repeated),
        (6, "d", Codec::Bool, Flags::PackedRepeated),
    ]);
    let c = schema(&[(7, "ghjhdf", Codec::UVarint, Flags::Simple)]);

    let mut msg = a.new_message();
    msg.set("a", Value::UVarint(1)).unwrap();
    msg.set_repeated("b", [b.clone(), c.clone()]).unwrap();
    msg.set("c", &b"ololo"[..]).unwrap();

    let msg = a.decode(&msg.encode().unwrap()).unwrap();
    let types = msg.get_repeated("b").unwrap();
    assert_eq!(hash_of(types[0].as_type().unwrap()), hash_of(&b));
    assert_eq!(hash_of(types[1].as_type().unwrap()), hash_of(&c));
    assert_eq!(types[0].as_type().unwrap().fingerprint(), b.fingerprint());
    assert_ne!(b.fingerprint(), c.fingerprint());
}

#[test]
fn test_type_metadata_value_carrying_schemas() {
    // a schema whose TypeMetadata field holds a schema that itself has one
    let leaf = schema(&[(1, "x", Codec::Int32, Flags::Required)]);
    let middle = schema(&[(1, "t", Codec::TypeMetadata, Flags::Simple)]);
    let top = schema(&[(9, "schema", Codec::TypeMetadata, Flags::Required)]);

    let mut msg = top.new_message();
    msg.set("schema", middle.clone()).unwrap();
    let back = top.decode(&msg.encode().unwrap()).unwrap();
    let decoded_middle = back.get("schema").and_then(Value::as_type).unwrap().clone();
    assert_eq!(*decoded_middle, *middle);

    // the reconstructed schema is usable for values of its own
    let mut inner = decoded_middle.new_message();
    inner.set("t", leaf.clone()).unwrap();
    let again = decoded_middle.decode(&inner.encode().unwrap()).unwrap();
    assert_eq!(**again.get("t").and_then(Value::as_type).unwrap(), *leaf);
}

#[test]
fn test_stream_roundtrip() {
    let ty = schema(&[
        (1, "id", Codec::UInt64, Flags::Required),
        (2, "name", Codec::Unicode, Flags::Simple),
        (3, "delta", Codec::Varint, Flags::Repeated),
    ]);
    let mut msg = ty.new_message();
    msg.set("id", Value::UInt64(u64::MAX)).unwrap();
    msg.set("name", "Привет").unwrap();
    msg.set_repeated("delta", [-1i64, 0, 1, i64::MIN].map(Value::Varint))
        .unwrap();

    let mut sink = Cursor::new(Vec::new());
    msg.encode_to(&mut sink).unwrap();
    sink.set_position(0);

    let back = ty.decode_from(sink).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn test_truncated_embedded_frame() {
    let inner = schema(&[(1, "a", Codec::Bytes, Flags::Simple)]);
    let outer = schema(&[(1, "m", Codec::EmbeddedMessage(inner), Flags::Simple)]);

    // the inner bytes frame claims 9 bytes inside a 3-byte message body
    let data = b"\x0a\x03\x0a\x09a";
    assert_eq!(
        outer.decode(data),
        Err(Error::TruncatedBuffer {
            needed: 9,
            available: 1
        })
    );
}

#[test]
fn test_invalid_boolean_in_message() {
    let ty = schema(&[(1, "flag", Codec::Bool, Flags::Simple)]);
    assert_eq!(ty.decode(b"\x08\x02"), Err(Error::InvalidBooleanByte(2)));
}

#[test]
fn test_stream_decode_with_options() {
    let newer = schema(&[
        (1, "id", Codec::UVarint, Flags::Required),
        (2, "extra", Codec::Unicode, Flags::Simple),
    ]);
    let older = schema(&[(1, "id", Codec::UVarint, Flags::Required)]);

    let mut msg = newer.new_message();
    msg.set("id", Value::UVarint(9)).unwrap();
    msg.set("extra", "later").unwrap();
    let bytes = msg.encode().unwrap();

    let lenient = older.decode_from(Cursor::new(bytes.clone())).unwrap();
    assert_eq!(lenient.get("id"), Some(&Value::UVarint(9)));

    let strict = DecodeOptions {
        unknown_fields: UnknownFieldPolicy::Reject,
        ..DecodeOptions::default()
    };
    assert_eq!(
        older.decode_from_with(Cursor::new(bytes), &strict),
        Err(Error::UnknownField(2))
    );
}

#[test]
fn test_stream_decode_depth_limit() {
    let inner = schema(&[(1, "a", Codec::UVarint, Flags::Simple)]);
    let outer = schema(&[(1, "m", Codec::EmbeddedMessage(inner.clone()), Flags::Simple)]);

    let mut nested = inner.new_message();
    nested.set("a", Value::UVarint(1)).unwrap();
    let mut msg = outer.new_message();
    msg.set("m", nested).unwrap();
    let bytes = msg.encode().unwrap();

    let flat = DecodeOptions {
        max_depth: 0,
        ..DecodeOptions::default()
    };
    assert_eq!(
        outer.decode_from_with(&bytes[..], &flat),
        Err(Error::DepthLimitExceeded(0))
    );
    assert_eq!(outer.decode_from(&bytes[..]).unwrap(), msg);
}
