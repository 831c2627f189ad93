//! BER/CER/DER TLV decoding engine
//!
//! This crate provides the generic decoding machinery protocol schemas are
//! built on: identifier and length decoding with indefinite-length
//! resolution, a recursion guard, primitive decoders, reassembly of
//! constructed strings, SEQUENCE/SET/CHOICE dispatchers and a fallback
//! walker for data without a schema.
//!
//! # TODO
//!
//! - [ ] Keep reassembly records across messages for segments split over
//!   several top-level decodes

pub mod ber;

pub use ber::{
    BerDecoder, DecodeContext, DecodedItem, Diagnostic, DiagnosticKind, Field, FieldDecoder,
    FieldFlags, Recorder, Severity, Sink, TagMatch, Value,
};
pub use ber_core::{BerError, BerResult, DecoderConfig};
