//! Generic walker for TLVs without a schema
//!
//! Used for unexpected and unknown fields, for ANY-typed fields and for a
//! message decoded with no schema at all. Constructed TLVs are descended
//! into; universal primitives are interpreted by their tag; other
//! primitives are emitted as raw bytes unless they look like nested BER and
//! the configuration asks for it.

use crate::ber::bitstring::bit_string_content;
use crate::ber::context::DecodeContext;
use crate::ber::oid::oid_content;
use crate::ber::primitive::{
    Located, Range, Size, boolean_content, integer_content, null_content, real_content,
};
use crate::ber::schema::{FieldDecoder, Input};
use crate::ber::sink::{DecodedItem, DiagnosticKind, Severity, Value};
use crate::ber::string::{
    StringKind, emit_octets, generalized_time_content, string_bytes, string_content,
    utc_time_content,
};
use crate::ber::types::{BerTag, BerTagClass, universal};
use crate::ber::view::ByteView;
use ber_core::BerResult;
use std::borrow::Cow;

static NESTED_BER: BerAny = BerAny;

/// Walk one TLV at `offset` one nesting level deeper
///
/// # Returns
/// The offset after the TLV, clamped to `view`.
pub fn walk_unknown(cx: &mut DecodeContext<'_>, view: ByteView<'_>, offset: usize) -> BerResult<usize> {
    cx.nested(|cx| walk_tlv(cx, view, offset))
}

/// Item name for a TLV without a field name
fn item_name(tag: &BerTag) -> &'static str {
    match tag.class() {
        BerTagClass::Universal => universal::name(tag.number()),
        BerTagClass::Application => "application",
        BerTagClass::ContextSpecific => "context",
        BerTagClass::Private => "private",
    }
}

fn walk_tlv(cx: &mut DecodeContext<'_>, view: ByteView<'_>, offset: usize) -> BerResult<usize> {
    let header = match cx.header(view, offset) {
        Ok(header) => header,
        Err(err) => return cx.recover(err, view, offset),
    };
    cx.internals(&header);
    if header.end() > view.end() {
        let available = view.remaining(header.content);
        cx.report(
            Severity::Malformed,
            DiagnosticKind::Truncated,
            header.content,
            available,
            format!(
                "Length {} of {} is larger than the remaining {} bytes",
                header.length, header.tag, available
            ),
        );
    }

    let loc = Located::from_header(view, &header);
    let name = item_name(&header.tag);
    if loc.constructed {
        cx.enter(&loc.item(name, Value::Constructed));
        let result = walk_children(cx, view.limit(loc.content_end), loc.content, loc.content_end);
        cx.leave();
        result?;
        if loc.indefinite {
            cx.eoc(loc.content_end);
        }
        return Ok(loc.end);
    }

    if header.tag.class() == BerTagClass::Universal {
        universal_content(cx, view, name, &loc, header.tag.number())?;
    } else if cx.config().decode_primitive_as_ber && looks_like_ber(cx, loc.bytes) {
        cx.enter(&loc.item(name, Value::Raw(Cow::Borrowed(loc.bytes))));
        let result = walk_children(cx, view.limit(loc.content_end), loc.content, loc.content_end);
        cx.leave();
        result?;
    } else {
        cx.emit(&loc.item(name, Value::Raw(Cow::Borrowed(loc.bytes))));
    }
    Ok(loc.end)
}

fn walk_children(cx: &mut DecodeContext<'_>, view: ByteView<'_>, start: usize, end: usize) -> BerResult<()> {
    let mut offset = start;
    while offset < end {
        offset = walk_unknown(cx, view, offset)?;
    }
    Ok(())
}

fn universal_content(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'_>,
    name: &'static str,
    loc: &Located<'_>,
    number: u32,
) -> BerResult<()> {
    match number {
        universal::BOOLEAN => {
            boolean_content(cx, name, loc);
        }
        universal::INTEGER | universal::ENUMERATED => {
            integer_content(cx, name, loc, Range::UNBOUNDED, number == universal::ENUMERATED);
        }
        universal::BIT_STRING => {
            bit_string_content(cx, view, name, loc, &[], Size::UNBOUNDED)?;
        }
        universal::OCTET_STRING => {
            let content = string_bytes(cx, view, loc, universal::OCTET_STRING)?;
            let inner: Option<&dyn FieldDecoder> =
                if cx.config().decode_octetstring_as_ber && looks_like_ber(cx, &content) {
                    Some(&NESTED_BER)
                } else {
                    None
                };
            emit_octets(cx, view, name, loc, &content, Size::UNBOUNDED, inner)?;
        }
        universal::NULL => null_content(cx, name, loc),
        universal::OBJECT_IDENTIFIER => {
            oid_content(cx, name, loc, false);
        }
        universal::RELATIVE_OID => {
            oid_content(cx, name, loc, true);
        }
        universal::REAL => {
            real_content(cx, name, loc);
        }
        universal::UTC_TIME => {
            utc_time_content(cx, view, name, loc)?;
        }
        universal::GENERALIZED_TIME => {
            generalized_time_content(cx, view, name, loc)?;
        }
        number => match StringKind::from_tag(number) {
            Some(kind) => {
                string_content(cx, view, name, loc, kind, Size::UNBOUNDED)?;
            }
            None => cx.emit(&loc.item(name, Value::Raw(Cow::Borrowed(loc.bytes)))),
        },
    }
    Ok(())
}

/// Whether `bytes` is a sequence of complete TLVs covering it exactly
fn looks_like_ber(cx: &DecodeContext<'_>, bytes: &[u8]) -> bool {
    let view = ByteView::new(bytes);
    let mut offset = 0;
    while offset < bytes.len() {
        match cx.header(view, offset) {
            Ok(header) if header.end() <= bytes.len() => offset = header.end(),
            _ => return false,
        }
    }
    !bytes.is_empty()
}

/// Field of any type, decoded with the generic walker
///
/// An implicitly tagged value has no inner tag to go by and is emitted as
/// raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BerAny;

impl FieldDecoder for BerAny {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        let view = input.view;
        if input.implicit {
            let end = view.end().max(input.offset);
            cx.emit(&DecodedItem {
                name: input.name,
                offset: input.offset,
                length: end - input.offset,
                tag: input.outer.map(|h| h.tag),
                value: Value::Raw(Cow::Borrowed(view.window(input.offset, end))),
            });
            return Ok(end);
        }
        let mut offset = input.offset;
        while offset < view.end() {
            offset = walk_unknown(cx, view, offset)?;
        }
        Ok(offset.max(input.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::sink::Recorder;
    use ber_core::DecoderConfig;

    fn walk(data: &[u8], config: DecoderConfig) -> (usize, Recorder) {
        let mut recorder = Recorder::new();
        let next = {
            let mut cx = DecodeContext::new(&mut recorder, config);
            walk_unknown(&mut cx, ByteView::new(data), 0).unwrap()
        };
        (next, recorder)
    }

    #[test]
    fn test_walk_constructed() {
        // SEQUENCE { INTEGER 5, [0] { BOOLEAN TRUE }, UTF8String "hi" }
        let data = [
            0x30, 0x0D, 0x02, 0x01, 0x05, 0xA0, 0x03, 0x01, 0x01, 0xFF, 0x0C, 0x02, 0x68, 0x69,
        ];
        let (next, recorder) = walk(&data[..], DecoderConfig::default());
        // declared 13 bytes but only 12 follow the header
        assert_eq!(next, 14);
        assert_eq!(recorder.count(DiagnosticKind::Truncated), 1);
        assert_eq!(recorder.values("INTEGER"), vec![&Value::Integer(5)]);
        assert_eq!(recorder.find("BOOLEAN").unwrap().level, 2);
        assert!(matches!(
            recorder.values("UTF8String")[0],
            Value::String { text, .. } if text == "hi"
        ));
        assert_eq!(recorder.level(), 0);
    }

    #[test]
    fn test_walk_indefinite() {
        let data = [0x30, 0x80, 0x05, 0x00, 0x00, 0x00];
        let config = DecoderConfig::default().with_show_internals(true);
        let (next, recorder) = walk(&data, config);
        assert_eq!(next, 6);
        assert!(recorder.find("NULL").is_some());
        assert_eq!(recorder.values("eoc").len(), 1);
        assert!(recorder.diagnostics.is_empty());
    }

    #[test]
    fn test_tagged_primitive_raw_or_nested() {
        let data = [0x9F, 0x21, 0x03, 0x02, 0x01, 0x07];
        let (_, recorder) = walk(&data, DecoderConfig::default());
        assert!(matches!(recorder.values("context")[0], Value::Raw(b) if b.len() == 3));
        assert!(recorder.find("INTEGER").is_none());

        let config = DecoderConfig::default().with_decode_primitive_as_ber(true);
        let (next, recorder) = walk(&data, config);
        assert_eq!(next, 6);
        let inner = recorder.find("INTEGER").unwrap();
        assert_eq!(inner.level, 1);
        assert_eq!(inner.item.offset, 3);
    }

    #[test]
    fn test_octet_string_as_ber() {
        let data = [0x04, 0x03, 0x01, 0x01, 0x00];
        let (_, recorder) = walk(&data, DecoderConfig::default());
        assert!(recorder.find("BOOLEAN").is_none());

        let config = DecoderConfig::default().with_decode_octetstring_as_ber(true);
        let (_, recorder) = walk(&data, config);
        assert_eq!(recorder.values("BOOLEAN"), vec![&Value::Boolean(false)]);

        // Not BER: stays opaque
        let text = [0x04, 0x02, 0x68, 0x69];
        let (_, recorder) = walk(&text, config_octets());
        assert_eq!(recorder.records.len(), 1);
    }

    fn config_octets() -> DecoderConfig {
        DecoderConfig::default().with_decode_octetstring_as_ber(true)
    }

    #[test]
    fn test_bad_header_recovers() {
        let data = [0x1F, 0x8F];
        let (next, recorder) = walk(&data, DecoderConfig::default());
        assert_eq!(next, 2);
        assert_eq!(recorder.count(DiagnosticKind::Truncated), 1);
    }

    #[test]
    fn test_any_field() {
        let data = [0x02, 0x01, 0x03, 0x05, 0x00];
        let mut recorder = Recorder::new();
        let next = {
            let mut cx = DecodeContext::new(&mut recorder, DecoderConfig::default());
            BerAny.decode(&mut cx, Input::new(ByteView::new(&data), 0, "any")).unwrap()
        };
        assert_eq!(next, 5);
        assert_eq!(recorder.values("INTEGER"), vec![&Value::Integer(3)]);
        assert_eq!(recorder.values("NULL"), vec![&Value::Null]);
    }
}
