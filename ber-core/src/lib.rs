//! Core types and utilities for the BER decoding engine
//!
//! This crate provides the error type, the decoder configuration and the
//! value types (bit strings, object identifiers, calendar strings) shared
//! by the engine and its consumers.

pub mod config;
pub mod datatypes;
pub mod error;

pub use config::{DEFAULT_MAX_DEPTH, DecoderConfig};
pub use datatypes::*;
pub use error::{BerError, BerResult};
