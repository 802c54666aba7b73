//! # fieldaddr — schema-driven 128-bit field addresses
//!
//! Packs an ordered list of fixed-width fields into a single 128-bit value rendered in
//! IPv6 colon-hex form, so structured identifiers (a protocol prefix, a version, a
//! process type, a timestamp, ...) can travel and be routed as ordinary addresses. The
//! inverse parses such text, including the `::` zero-run shorthand, back into field values.
//!
//! ## Schema format
//!
//! One field per line, packed most significant first:
//!
//! ```text
//! <name> <bit_width> [fixed <value>]
//! ```
//!
//! - `bit_width`: decimal, 1 to 64; the widths of a schema sum to at most 128
//! - `fixed <value>`: the value is part of the schema and takes no caller input;
//!   decimal or `0x` hex, truncated to the field width when encoded
//! - a line whose first non-blank character is `#` is a comment; blank lines are ignored
//!
//! ## Example
//!
//! ```
//! use fieldaddr::{decode, encode, parse};
//!
//! let schema = parse(
//!     "prefix 16 fixed 0xfcff\n\
//!      version 5 fixed 2\n\
//!      process_type 16\n\
//!      process_version 5\n\
//!      sys_id 32\n\
//!      pid 22\n\
//!      timestamp 32\n",
//! )
//! .unwrap();
//!
//! let text = encode(&schema, &[1, 1, 4, 0x17c9, 0x4d8a3a71]).unwrap();
//! assert_eq!(text, "fcff:1000:0840:0000:0100:17c9:4d8a:3a71");
//!
//! let values = decode(&schema, "fcff:1000:840:0:100:17c9:4d8a:3a71").unwrap();
//! assert_eq!(values, vec![0xfcff, 2, 1, 1, 4, 0x17c9, 0x4d8a3a71]);
//! ```

pub mod address;
pub mod codec;
pub mod dump;
pub mod parser;
pub mod schema;
pub mod value;

pub use address::{expand_groups, Address, Prefix};
pub use codec::{
    decode, decode_address, decode_fields, encode, encode_address, AddressCodec, DecodeError,
    EncodeError,
};
pub use parser::{load_schema, load_schema_file, parse};
pub use schema::{FieldSpec, Schema, SchemaBuilder, SchemaError};
pub use value::FieldValues;
