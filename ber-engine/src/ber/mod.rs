//! Schema-driven BER (Basic Encoding Rules) decoder
//!
//! This module decodes BER, CER and DER data against static field tables
//! supplied by a protocol schema and reports every value with its position
//! to a [`Sink`].
//!
//! # ASN.1 BER Encoding Overview
//!
//! Each value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - P = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number (0-30), or 11111 for a base-128 tag number that follows
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form**: `0x80 | N` followed by N big-endian length octets
//! - **Indefinite form** (`0x80`): content ends with the `00 00` end-of-content
//!   marker; the length is resolved by scanning the nested TLVs first
//!
//! # Decoding Model
//!
//! 1. A schema is a tree of [`FieldDecoder`] values: primitive decoders
//!    ([`BerInteger`], [`BerOctetString`], ...) and composite dispatchers
//!    ([`BerSequence`], [`BerSet`], [`BerChoice`], ...) over `&'static`
//!    tables of [`Field`]s or [`Alternative`]s.
//! 2. [`BerDecoder`] builds a [`DecodeContext`] per message and runs the root.
//! 3. Malformed input never fails a decode: it becomes a [`Diagnostic`] and
//!    decoding continues with the next TLV. Only exceeding the nesting
//!    ceiling aborts the message.
//! 4. TLVs that do not fit the schema are walked generically
//!    ([`walk_unknown`]) when `decode_unexpected` is set.

pub mod bitstring;
pub mod choice;
pub mod context;
pub mod decoder;
pub mod guard;
pub mod length;
pub mod oid;
pub mod primitive;
pub mod reassembly;
pub mod schema;
pub mod sequence;
pub mod sink;
pub mod string;
pub mod types;
pub mod unknown;
pub mod view;

pub use bitstring::{BerBitString, NamedBit, decode_bit_string};
pub use choice::{BerChoice, decode_choice};
pub use context::DecodeContext;
pub use decoder::{BerDecoder, BerTagged, ROOT_NAME};
pub use guard::RecursionGuard;
pub use length::{Header, Length, read_header, resolve_length};
pub use oid::{BerObjectId, BerRelativeOid, decode_object_identifier, decode_relative_oid};
pub use primitive::{
    BerBoolean, BerEnumerated, BerInteger, BerNull, BerReal, Locate, Located, Range, Size,
    decode_boolean, decode_enumerated, decode_integer, decode_null, decode_real, locate,
};
pub use reassembly::{Reassembled, ReassemblyRecord, ReassemblyStore, reassemble};
pub use schema::{Alternative, Field, FieldDecoder, FieldFlags, Input, TagMatch};
pub use sequence::{
    BerSequence, BerSequenceOf, BerSet, BerSetOf, decode_sequence, decode_sequence_of, decode_set,
    decode_set_of,
};
pub use sink::{DecodedItem, Diagnostic, DiagnosticKind, Record, Recorder, Severity, Sink, Value};
pub use string::{
    BerGeneralizedTime, BerOctetString, BerString, BerUtcTime, StringKind, decode_generalized_time,
    decode_octet_string, decode_restricted_string, decode_utc_time,
};
pub use types::{BerLength, BerTag, BerTagClass, universal};
pub use unknown::{BerAny, walk_unknown};
pub use view::ByteView;
