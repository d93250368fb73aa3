//! metabuf: Protocol-Buffers-style wire codec with self-describing schemas
//!
//! Message types are built at runtime by registering numbered, named fields,
//! each backed by a [`Codec`] and [`Flags`]. Messages of that type encode to
//! a tag/length/value byte stream and decode back. A schema is itself a value:
//! the `TypeMetadata` codec carries a whole [`MessageType`] on the wire using
//! a fixed bootstrap schema.
//!
//! # Wire Format
//!
//! ```text
//! +------------------------------+------------------------------------+
//! | tag: UVarint(number<<3 | wt) | payload                            |
//! +------------------------------+------------------------------------+
//!   wt 0 VARINT            base-128, little-endian groups
//!   wt 1 FIXED64           8 bytes, big-endian
//!   wt 2 LENGTH_DELIMITED  UVarint length + bytes (also packed blocks)
//!   wt 5 FIXED32           4 bytes, big-endian
//! ```
//!
//! No header, trailer or checksum. Fields appear in registration order.
//! Fixed-width values are big-endian, so this format is not byte-compatible
//! with canonical protobuf for `UInt64`, `Int64`, `Int32` and `Float32`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use metabuf::*;
//!
//! let mut ty = MessageType::new();
//! ty.add_field(1, "id", Codec::UVarint, Flags::Required)?
//!     .add_field(2, "tags", Codec::Unicode, Flags::Repeated)?;
//! let ty = Arc::new(ty);
//!
//! let mut msg = ty.new_message();
//! msg.set("id", Value::UVarint(150))?;
//! msg.push("tags", "fast")?;
//!
//! let bytes = msg.encode()?;
//! assert_eq!(bytes, b"\x08\x96\x01\x12\x04fast");
//!
//! let back = ty.decode(&bytes)?;
//! assert_eq!(back, msg);
//! # Ok::<(), metabuf::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod field;
pub mod message;
pub mod message_type;
pub mod metadata;
pub mod value;
pub mod varint;
pub mod wire;

// Re-export main types
pub use codec::Codec;
pub use decoder::{ByteSource, DecodeOptions, IoSource, UnknownFieldPolicy, WireCursor};
pub use encoder::WireEncoder;
pub use error::{Error, Result};
pub use field::{Field, Flags};
pub use message::Message;
pub use message_type::MessageType;
pub use value::{FieldValue, Value};
pub use wire::WireType;

/// Largest field number a schema accepts (29 bits, as in protobuf)
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Default nesting limit for embedded messages and schemas while decoding
pub const DEFAULT_MAX_DEPTH: usize = 64;
