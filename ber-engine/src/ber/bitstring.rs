//! BIT STRING decoding with named bits

use crate::ber::context::DecodeContext;
use crate::ber::primitive::{Locate, Located, Size, locate};
use crate::ber::schema::{FieldDecoder, Input};
use crate::ber::sink::{DecodedItem, DiagnosticKind, Severity, Value};
use crate::ber::types::universal;
use crate::ber::view::ByteView;
use ber_core::{BerResult, BitString};
use std::borrow::Cow;

/// Name of one bit position (bit 0 is the first bit on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedBit {
    pub bit: usize,
    pub name: &'static str,
}

impl NamedBit {
    pub const fn new(bit: usize, name: &'static str) -> Self {
        Self { bit, name }
    }
}

/// Interpret and emit BIT STRING content
///
/// A constructed BIT STRING is not joined: every segment is decoded and
/// emitted on its own below the constructed item.
pub(crate) fn bit_string_content(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'_>,
    name: &'static str,
    loc: &Located<'_>,
    named: &[NamedBit],
    size: Size,
) -> BerResult<Option<BitString>> {
    if loc.constructed {
        cx.enter(&loc.item(name, Value::Constructed));
        let result = cx.nested(|cx| {
            let segments = view.limit(loc.content_end);
            let mut offset = loc.content;
            while offset < loc.content_end {
                let input = Input::new(segments, offset, "segment");
                offset = match locate(cx, input, universal::BIT_STRING)? {
                    Locate::Skipped(next) => next,
                    Locate::Found(segment) => {
                        bit_string_content(cx, segments, "segment", &segment, &[], Size::UNBOUNDED)?;
                        segment.end
                    }
                };
            }
            Ok(())
        });
        cx.leave();
        result?;
        return Ok(None);
    }

    let bits = match BitString::from_content(loc.bytes) {
        Ok(bits) => bits,
        Err(err) => {
            cx.report(
                Severity::Malformed,
                DiagnosticKind::InvalidEncoding,
                loc.start,
                loc.len(),
                format!("{}: {}", name, err),
            );
            cx.emit(&loc.item(name, Value::Raw(Cow::Borrowed(loc.bytes))));
            return Ok(None);
        }
    };

    if !bits.padding_is_zero() {
        cx.report(
            Severity::Warning,
            DiagnosticKind::IllegalPadding,
            loc.end.saturating_sub(1),
            1,
            format!(
                "{}: illegal padding in the {} unused bits",
                name,
                bits.unused_bits()
            ),
        );
    }
    size.check(cx, name, loc.start, loc.len(), bits.num_bits(), "bits");

    if named.is_empty() {
        cx.emit(&loc.item(name, Value::BitString(bits.clone())));
        return Ok(Some(bits));
    }

    cx.enter(&loc.item(name, Value::BitString(bits.clone())));
    for bit in bits.set_bits() {
        let Some(named_bit) = named.iter().find(|n| n.bit == bit) else {
            continue;
        };
        cx.emit(&DecodedItem {
            name: named_bit.name,
            offset: loc.content + 1 + bit / 8,
            length: 1,
            tag: None,
            value: Value::Flag { bit },
        });
    }
    cx.leave();
    Ok(Some(bits))
}

/// Decode a BIT STRING field
pub fn decode_bit_string(
    cx: &mut DecodeContext<'_>,
    input: Input<'_>,
    named: &[NamedBit],
    size: Size,
) -> BerResult<(usize, Option<BitString>)> {
    match locate(cx, input, universal::BIT_STRING)? {
        Locate::Skipped(next) => Ok((next, None)),
        Locate::Found(loc) => {
            let bits = bit_string_content(cx, input.view, input.name, &loc, named, size)?;
            Ok((loc.end, bits))
        }
    }
}

/// BIT STRING field
#[derive(Debug, Clone, Copy)]
pub struct BerBitString {
    pub named: &'static [NamedBit],
    pub size: Size,
}

impl BerBitString {
    pub const fn new() -> Self {
        Self {
            named: &[],
            size: Size::UNBOUNDED,
        }
    }

    pub const fn with_named(named: &'static [NamedBit]) -> Self {
        Self {
            named,
            size: Size::UNBOUNDED,
        }
    }

    pub const fn sized(min: usize, max: usize) -> Self {
        Self {
            named: &[],
            size: Size::new(min, max),
        }
    }
}

impl Default for BerBitString {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldDecoder for BerBitString {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_bit_string(cx, input, self.named, self.size).map(|(next, _)| next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::sink::Recorder;
    use ber_core::DecoderConfig;

    fn run(data: &[u8], named: &[NamedBit]) -> ((usize, Option<BitString>), Recorder) {
        let mut recorder = Recorder::new();
        let result = {
            let mut cx = DecodeContext::new(&mut recorder, DecoderConfig::default());
            let input = Input::new(ByteView::new(data), 0, "flags");
            decode_bit_string(&mut cx, input, named, Size::UNBOUNDED).unwrap()
        };
        (result, recorder)
    }

    #[test]
    fn test_named_bits() {
        const NAMED: &[NamedBit] = &[
            NamedBit::new(0, "digitalSignature"),
            NamedBit::new(1, "nonRepudiation"),
            NamedBit::new(5, "keyCertSign"),
        ];
        // 1000 0100, 2 unused bits
        let ((next, bits), recorder) = run(&[0x03, 0x02, 0x02, 0x84], NAMED);
        assert_eq!(next, 4);
        assert_eq!(bits.unwrap().num_bits(), 6);
        assert!(recorder.find("digitalSignature").is_some());
        assert!(recorder.find("nonRepudiation").is_none());
        let flag = recorder.find("keyCertSign").unwrap();
        assert_eq!(flag.level, 1);
        assert_eq!(flag.item.value, Value::Flag { bit: 5 });
        assert!(recorder.diagnostics.is_empty());
    }

    #[test]
    fn test_named_bits_in_wire_order() {
        const NAMED: &[NamedBit] = &[
            NamedBit::new(9, "decipherOnly"),
            NamedBit::new(2, "keyEncipherment"),
        ];
        // 0010 0000 0100 0000, 6 unused bits: bits 2 and 9 set
        let ((_, bits), recorder) = run(&[0x03, 0x03, 0x06, 0x20, 0x40], NAMED);
        assert_eq!(bits.unwrap().num_bits(), 10);
        let names: Vec<_> = recorder.records.iter().skip(1).map(|r| r.item.name).collect();
        assert_eq!(names, vec!["keyEncipherment", "decipherOnly"]);
        assert_eq!(recorder.find("decipherOnly").unwrap().item.offset, 4);
    }

    #[test]
    fn test_illegal_padding_warns() {
        let ((_, bits), recorder) = run(&[0x03, 0x02, 0x04, 0xA1], &[]);
        assert!(bits.is_some());
        assert_eq!(recorder.count(DiagnosticKind::IllegalPadding), 1);
        assert_eq!(recorder.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_invalid_unused_bits() {
        let ((next, bits), recorder) = run(&[0x03, 0x02, 0x09, 0x00], &[]);
        assert_eq!(next, 4);
        assert!(bits.is_none());
        assert_eq!(recorder.count(DiagnosticKind::InvalidEncoding), 1);
    }

    #[test]
    fn test_constructed_segments_not_joined() {
        // 23 08 { 03 02 00 FF, 03 02 04 F0 }
        let data = [0x23, 0x08, 0x03, 0x02, 0x00, 0xFF, 0x03, 0x02, 0x04, 0xF0];
        let ((next, bits), recorder) = run(&data, &[]);
        assert_eq!(next, 10);
        assert!(bits.is_none());
        let segments = recorder.values("segment");
        assert_eq!(segments.len(), 2);
        assert!(matches!(segments[1], Value::BitString(b) if b.num_bits() == 4));
        assert!(recorder.diagnostics.is_empty());
    }
}
