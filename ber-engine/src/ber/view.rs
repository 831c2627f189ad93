//! Bounded read-only window over message bytes

use ber_core::{BerError, BerResult};

/// Read-only view over a byte buffer with an upper read limit
///
/// Offsets are always absolute positions in the underlying buffer, so a
/// narrowed view keeps the offsets of the message it was taken from.
/// Every read is checked against the limit and fails with
/// [`BerError::Truncated`] instead of panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteView<'v> {
    data: &'v [u8],
    end: usize,
}

impl<'v> ByteView<'v> {
    pub fn new(data: &'v [u8]) -> Self {
        Self {
            data,
            end: data.len(),
        }
    }

    /// Narrow the view so that nothing at or after `end` can be read
    ///
    /// The limit can only shrink; a larger `end` keeps the current one.
    pub fn limit(&self, end: usize) -> Self {
        Self {
            data: self.data,
            end: end.min(self.end),
        }
    }

    /// Absolute end offset of the view
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of readable bytes from `offset` to the end of the view
    pub fn remaining(&self, offset: usize) -> usize {
        self.end.saturating_sub(offset)
    }

    pub fn byte(&self, offset: usize) -> BerResult<u8> {
        if offset >= self.end {
            return Err(BerError::Truncated {
                offset,
                needed: 1,
                available: 0,
            });
        }
        Ok(self.data[offset])
    }

    /// Borrow `len` bytes starting at `offset`
    pub fn slice(&self, offset: usize, len: usize) -> BerResult<&'v [u8]> {
        let available = self.remaining(offset);
        if len > available {
            return Err(BerError::Truncated {
                offset,
                needed: len,
                available,
            });
        }
        Ok(&self.data[offset..offset + len])
    }

    /// Borrow the bytes between two absolute offsets, clamped to the view
    pub fn window(&self, start: usize, end: usize) -> &'v [u8] {
        let end = end.min(self.end);
        let start = start.min(end);
        &self.data[start..end]
    }

    /// Whether an end-of-content marker (`00 00`) starts at `offset`
    pub fn is_eoc(&self, offset: usize) -> bool {
        self.remaining(offset) >= 2 && self.data[offset] == 0 && self.data[offset + 1] == 0
    }
}
