use thiserror::Error;

/// Main error type for BER decoding operations
///
/// Only [`BerError::BoundsExceeded`] is fatal. Every other variant is turned
/// into a diagnostic by the dispatch layer and decoding continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BerError {
    #[error("Truncated data at offset {offset}: need {needed} bytes, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Tag number too large at offset {offset}")]
    TagTooLarge { offset: usize },

    #[error("Length too large at offset {offset}: {octets} length octets")]
    LengthTooLarge { offset: usize, octets: usize },

    #[error("Indefinite length scan made no progress at offset {offset}")]
    NoProgress { offset: usize },

    #[error("Nesting depth {depth} exceeds limit {limit}")]
    BoundsExceeded { depth: u32, limit: u32 },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl BerError {
    /// Whether this error must abort the whole top-level decode
    pub fn is_fatal(&self) -> bool {
        matches!(self, BerError::BoundsExceeded { .. })
    }

    /// Byte offset the error refers to, if known
    pub fn offset(&self) -> Option<usize> {
        match self {
            BerError::Truncated { offset, .. }
            | BerError::TagTooLarge { offset }
            | BerError::LengthTooLarge { offset, .. }
            | BerError::NoProgress { offset } => Some(*offset),
            BerError::BoundsExceeded { .. } | BerError::InvalidData(_) => None,
        }
    }
}

/// Result type alias for BER decoding operations
pub type BerResult<T> = Result<T, BerError>;
