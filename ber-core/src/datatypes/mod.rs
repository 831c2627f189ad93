//! Value types produced by the primitive decoders

pub mod bit_string;
pub mod object_identifier;
pub mod time;

// Re-export types
pub use bit_string::BitString;
pub use object_identifier::ObjectIdentifier;
pub use time::{GeneralizedTime, TimeOffset, UtcTime};
