//! ber - generic BER/CER/DER decoder
//!
//! This library decodes data encoded with the ASN.1 Basic Encoding Rules
//! (and the CER/DER subsets) against schemas written as static field
//! tables, reporting every decoded value and every structural problem with
//! its byte position.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ber-core`: error type, decoder configuration and value types
//! - `ber-engine`: the TLV engine (length resolution, dispatchers,
//!   reassembly, fallback walker)
//!
//! # Usage
//!
//! ```
//! use ber::engine::{
//!     BerBoolean, BerDecoder, BerInteger, BerSequence, Field, FieldFlags, Recorder, TagMatch, Value,
//! };
//!
//! static ID: BerInteger = BerInteger::new();
//! static FLAG: BerBoolean = BerBoolean;
//! static RECORD: BerSequence = BerSequence::new(&[
//!     Field::new("id", TagMatch::context(0), FieldFlags::IMPLICIT, &ID),
//!     Field::new("flag", TagMatch::context(1), FieldFlags::IMPLICIT.optional(), &FLAG),
//! ]);
//!
//! let data = [0x30, 0x03, 0x80, 0x01, 0x2A];
//! let mut recorder = Recorder::new();
//! BerDecoder::new().decode(&data, &RECORD, &mut recorder)?;
//! assert_eq!(recorder.values("id"), vec![&Value::Integer(42)]);
//! # Ok::<(), ber::BerError>(())
//! ```

// Re-export core types
pub use ber_core::datatypes::*;
pub use ber_core::{BerError, BerResult, DEFAULT_MAX_DEPTH, DecoderConfig};

// Re-export the decoding engine
pub mod engine {
    pub use ber_engine::ber::*;
}

pub use ber_engine::ber::{BerDecoder, Diagnostic, Recorder, Sink, Value};
