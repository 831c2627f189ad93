//! Decoder configuration

use serde::{Deserialize, Serialize};

/// Default nesting ceiling for indefinite-length pre-scans and schema re-entry
pub const DEFAULT_MAX_DEPTH: u32 = 500;

/// Decoder configuration
///
/// Controls how much of the raw structure is reported and how unexpected
/// input is treated. The defaults match a conservative protocol analyser:
/// unexpected TLVs are walked generically, octet strings are left opaque.
///
/// # Usage Example
/// ```rust
/// use ber_core::DecoderConfig;
///
/// let config = DecoderConfig::default()
///     .with_show_internals(true)
///     .with_max_depth(64);
/// assert_eq!(config.max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Maximum nesting depth before a message is aborted
    pub max_depth: u32,
    /// Emit identifier and length items for every TLV
    pub show_internals: bool,
    /// Walk unexpected TLVs with the fallback walker
    pub decode_unexpected: bool,
    /// Let the fallback walker descend into octet strings that hold valid BER
    pub decode_octetstring_as_ber: bool,
    /// Let the fallback walker descend into tagged primitives that hold valid BER
    pub decode_primitive_as_ber: bool,
    /// Warn about INTEGER encodings with redundant leading octets
    pub warn_leading_zero_bits: bool,
    /// Reassemble constructed strings into one value
    pub allow_reassembly: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            show_internals: false,
            decode_unexpected: true,
            decode_octetstring_as_ber: false,
            decode_primitive_as_ber: false,
            warn_leading_zero_bits: false,
            allow_reassembly: true,
        }
    }
}

impl DecoderConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_show_internals(mut self, enabled: bool) -> Self {
        self.show_internals = enabled;
        self
    }

    pub fn with_decode_unexpected(mut self, enabled: bool) -> Self {
        self.decode_unexpected = enabled;
        self
    }

    pub fn with_decode_octetstring_as_ber(mut self, enabled: bool) -> Self {
        self.decode_octetstring_as_ber = enabled;
        self
    }

    pub fn with_decode_primitive_as_ber(mut self, enabled: bool) -> Self {
        self.decode_primitive_as_ber = enabled;
        self
    }

    pub fn with_warn_leading_zero_bits(mut self, enabled: bool) -> Self {
        self.warn_leading_zero_bits = enabled;
        self
    }

    pub fn with_allow_reassembly(mut self, enabled: bool) -> Self {
        self.allow_reassembly = enabled;
        self
    }
}
