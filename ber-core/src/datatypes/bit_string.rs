//! Bit string type decoded from BER BIT STRING content

use crate::error::{BerError, BerResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arbitrary string of bits (zeros and ones). A bit string value can have any length including zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitString {
    bytes: Vec<u8>,
    num_bits: usize,
}

impl BitString {
    /// Construct a new bit string object.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_bits > bit_string.len() * 8`
    pub fn new(bit_string: Vec<u8>, num_bits: usize) -> BerResult<Self> {
        if num_bits > bit_string.len() * 8 {
            return Err(BerError::InvalidData(format!(
                "bit_string is too short to hold all bits. Need {} bytes for {} bits",
                num_bits.div_ceil(8),
                num_bits
            )));
        }

        Ok(Self {
            bytes: bit_string,
            num_bits,
        })
    }

    /// Build a bit string from primitive BIT STRING content octets
    ///
    /// The first content octet holds the number of unused bits in the last
    /// octet (0-7). An empty string must be encoded as a single `00` octet.
    pub fn from_content(content: &[u8]) -> BerResult<Self> {
        let Some((&unused, bytes)) = content.split_first() else {
            return Err(BerError::InvalidData(
                "BIT STRING content is empty".to_string(),
            ));
        };
        if unused > 7 {
            return Err(BerError::InvalidData(format!(
                "Invalid unused bits: {} (must be 0-7)",
                unused
            )));
        }
        if bytes.is_empty() && unused != 0 {
            return Err(BerError::InvalidData(format!(
                "Empty BIT STRING with {} unused bits",
                unused
            )));
        }
        Self::new(bytes.to_vec(), bytes.len() * 8 - unused as usize)
    }

    /// Get the bit string as byte array.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The number of bits in the byte array.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Number of padding bits in the last octet
    pub fn unused_bits(&self) -> u8 {
        (self.bytes.len() * 8 - self.num_bits) as u8
    }

    /// Whether the padding bits of the last octet are all zero
    ///
    /// DER requires zero padding; BER leaves it unspecified.
    pub fn padding_is_zero(&self) -> bool {
        match self.bytes.last() {
            Some(last) => {
                let mask = (1u16 << self.unused_bits()) as u8;
                last & mask.wrapping_sub(1) == 0
            }
            None => true,
        }
    }

    /// Get the bit at a specific position (bit 0 is the MSB of the first octet)
    pub fn get_bit(&self, index: usize) -> BerResult<bool> {
        if index >= self.num_bits {
            return Err(BerError::InvalidData(format!(
                "Bit index {} out of bounds (num_bits: {})",
                index, self.num_bits
            )));
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8); // MSB first
        Ok((self.bytes[byte_index] >> bit_index) & 1 == 1)
    }

    /// Indices of all set bits, in ascending order
    pub fn set_bits(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_bits).filter(|&i| (self.bytes[i / 8] >> (7 - (i % 8))) & 1 == 1)
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{:02X} ", byte)?;
        }
        write!(f, "({} bits)", self.num_bits)
    }
}
