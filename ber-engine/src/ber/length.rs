//! TLV header reading and indefinite length resolution
//!
//! An indefinite length (`0x80`) is resolved before any content is decoded
//! by walking the nested TLVs up to the matching end-of-content marker. The
//! resolved value counts every byte of content plus the two EOC octets, so
//! `content + length` is always the offset right after the TLV.

use crate::ber::guard::RecursionGuard;
use crate::ber::types::{BerLength, BerTag};
use crate::ber::view::ByteView;
use ber_core::{BerError, BerResult};

/// Resolved length of a TLV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Length {
    /// Content length; for the indefinite form this includes the EOC octets
    pub value: usize,
    pub indefinite: bool,
}

/// Identifier and resolved length of one TLV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub tag: BerTag,
    /// Offset of the first identifier octet
    pub offset: usize,
    /// Offset of the first length octet
    pub length_offset: usize,
    /// Offset of the first content octet
    pub content: usize,
    /// Resolved length, see [`Length::value`]
    pub length: usize,
    pub indefinite: bool,
}

impl Header {
    /// Number of identifier and length octets
    pub fn header_len(&self) -> usize {
        self.content - self.offset
    }

    /// Offset right after the TLV, EOC included
    pub fn end(&self) -> usize {
        self.content + self.length
    }

    /// Offset right after the content, EOC excluded
    pub fn content_end(&self) -> usize {
        if self.indefinite {
            self.end().saturating_sub(2).max(self.content)
        } else {
            self.end()
        }
    }

    pub fn content_len(&self) -> usize {
        self.content_end() - self.content
    }

    pub fn total_len(&self) -> usize {
        self.end() - self.offset
    }
}

/// Decode the length octets at `offset`, resolving the indefinite form
///
/// # Arguments
/// * `view` - Bytes available to the TLV; the pre-scan never reads past its end
/// * `offset` - Position of the first length octet
/// * `guard` - Depth of the caller; each nested indefinite level enters it once
///
/// # Returns
/// Returns `Ok((Length, content_offset))` if successful, `Err` otherwise
pub fn resolve_length(
    view: ByteView<'_>,
    offset: usize,
    guard: RecursionGuard,
) -> BerResult<(Length, usize)> {
    let (raw, content) = BerLength::decode(view, offset)?;
    if !raw.is_indefinite() {
        return Ok((
            Length {
                value: raw.value(),
                indefinite: false,
            },
            content,
        ));
    }

    let value = scan_indefinite(view, content, guard.enter()?)?;
    Ok((
        Length {
            value,
            indefinite: true,
        },
        content,
    ))
}

/// Walk sibling TLVs from `start` until an EOC marker
///
/// Returns the number of bytes from `start` up to and including the EOC.
fn scan_indefinite(view: ByteView<'_>, start: usize, guard: RecursionGuard) -> BerResult<usize> {
    let mut offset = start;
    loop {
        if view.is_eoc(offset) {
            break;
        }
        let (_, after_tag) = BerTag::decode(view, offset)?;
        let (length, content) = resolve_length(view, after_tag, guard)?;
        let next = content + length.value;
        if next > view.end() {
            return Err(BerError::Truncated {
                offset: content,
                needed: length.value,
                available: view.remaining(content),
            });
        }
        if next <= offset {
            return Err(BerError::NoProgress { offset });
        }
        offset = next;
    }
    Ok(offset + 2 - start)
}

/// Read the identifier and length of the TLV starting at `offset`
///
/// The returned header may announce more content than the view holds;
/// callers decide how to report and clamp such a TLV.
pub fn read_header(
    view: ByteView<'_>,
    offset: usize,
    guard: RecursionGuard,
) -> BerResult<Header> {
    let (tag, after_tag) = BerTag::decode(view, offset)?;
    let (length, content) = resolve_length(view, after_tag, guard)?;
    log::trace!(
        "BER header at {}: {} len={}{}",
        offset,
        tag,
        length.value,
        if length.indefinite { " (indefinite)" } else { "" }
    );
    Ok(Header {
        tag,
        offset,
        length_offset: after_tag,
        content,
        length: length.value,
        indefinite: length.indefinite,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(data: &[u8]) -> BerResult<Header> {
        read_header(ByteView::new(data), 0, RecursionGuard::default())
    }

    #[test]
    fn test_definite_header() {
        let h = header(&[0x02, 0x01, 0x05]).unwrap();
        assert_eq!(h.tag, BerTag::universal(false, 2));
        assert_eq!(h.header_len(), 2);
        assert_eq!(h.length, 1);
        assert_eq!(h.end(), 3);
        assert_eq!(h.content_end(), 3);
        assert!(!h.indefinite);
    }

    #[test]
    fn test_indefinite_resolves_to_eoc() {
        // SEQUENCE (indefinite) { INTEGER 5 } EOC
        let h = header(&[0x30, 0x80, 0x02, 0x01, 0x05, 0x00, 0x00]).unwrap();
        assert!(h.indefinite);
        assert_eq!(h.length, 5);
        assert_eq!(h.end(), 7);
        assert_eq!(h.content_end(), 5);
        assert_eq!(h.content_len(), 3);
    }

    #[test]
    fn test_indefinite_length_is_sum_of_children() {
        // Children: INTEGER(3 bytes), nested indefinite SEQUENCE holding a
        // NULL (2 + 2 + 2 bytes), OCTET STRING with long-form length (3 + 2 bytes)
        let data = [
            0x30, 0x80, //
            0x02, 0x01, 0x01, //
            0x30, 0x80, 0x05, 0x00, 0x00, 0x00, //
            0x04, 0x81, 0x02, 0xAA, 0xBB, //
            0x00, 0x00,
        ];
        let h = header(&data).unwrap();
        assert_eq!(h.length, 3 + (2 + 2 + 2) + (3 + 2) + 2);
        assert_eq!(h.end(), data.len());

        let inner = read_header(ByteView::new(&data), 5, RecursionGuard::default()).unwrap();
        assert_eq!(inner.length, 4);
        assert_eq!(inner.end(), 11);
    }

    #[test]
    fn test_empty_indefinite() {
        let h = header(&[0x30, 0x80, 0x00, 0x00]).unwrap();
        assert_eq!(h.length, 2);
        assert_eq!(h.content_len(), 0);
    }

    #[test]
    fn test_indefinite_without_eoc_is_truncated() {
        let result = header(&[0x30, 0x80, 0x02, 0x01, 0x05]);
        assert!(matches!(result, Err(BerError::Truncated { .. })));
        let result = header(&[0x30, 0x80, 0x04, 0x05, 0x01]);
        assert!(matches!(result, Err(BerError::Truncated { .. })));
    }

    #[test]
    fn test_prescan_respects_view_limit() {
        let data = [0x30, 0x80, 0x05, 0x00, 0x00, 0x00];
        let view = ByteView::new(&data).limit(4);
        assert!(read_header(view, 0, RecursionGuard::default()).is_err());
    }

    #[test]
    fn test_prescan_depth_bound() {
        let nested = |levels: usize| {
            let mut data = Vec::new();
            for _ in 0..levels {
                data.extend_from_slice(&[0x30, 0x80]);
            }
            for _ in 0..levels {
                data.extend_from_slice(&[0x00, 0x00]);
            }
            data
        };

        let ok = nested(500);
        let h = header(&ok).unwrap();
        assert_eq!(h.end(), ok.len());

        let too_deep = nested(501);
        assert_eq!(
            header(&too_deep),
            Err(BerError::BoundsExceeded {
                depth: 501,
                limit: 500
            })
        );
    }
}
