//! SEQUENCE, SET, SEQUENCE OF and SET OF dispatchers
//!
//! A composite is decoded against a static field table. Fields are matched
//! by class and tag; a matched field gets its TLV with the own header
//! stripped (unless `no_own_tag` is set) and returns the offset it reached.
//! Every structural problem is reported to the sink and decoding continues
//! with the next TLV.
//!
//! # Usage Example
//! ```rust
//! use ber_engine::ber::{
//!     BerDecoder, BerInteger, BerOctetString, BerSequence, Field, FieldFlags, Recorder, TagMatch,
//! };
//!
//! static INTEGER: BerInteger = BerInteger::new();
//! static OCTETS: BerOctetString = BerOctetString::new();
//! static FIELDS: &[Field] = &[
//!     Field::new("version", TagMatch::context(0), FieldFlags::IMPLICIT.optional(), &INTEGER),
//!     Field::new("serial", TagMatch::universal(2), FieldFlags::NO_OWN_TAG, &INTEGER),
//!     Field::new("digest", TagMatch::universal(4), FieldFlags::NO_OWN_TAG, &OCTETS),
//! ];
//! static RECORD: BerSequence = BerSequence::new(FIELDS);
//!
//! let data = [0x30, 0x07, 0x02, 0x01, 0x2A, 0x04, 0x02, 0xBE, 0xEF];
//! let mut recorder = Recorder::new();
//! let next = BerDecoder::new().decode(&data, &RECORD, &mut recorder).unwrap();
//! assert_eq!(next, data.len());
//! assert!(recorder.find("version").is_none());
//! assert!(recorder.diagnostics.is_empty());
//! ```

use crate::ber::context::DecodeContext;
use crate::ber::length::Header;
use crate::ber::primitive::{Locate, Located, Size, accept, skip_unexpected};
use crate::ber::schema::{Field, FieldDecoder, FieldFlags, Input, invoke};
use crate::ber::sink::{DiagnosticKind, Severity, Value};
use crate::ber::types::{BerTagClass, universal};
use crate::ber::unknown::walk_unknown;
use crate::ber::view::ByteView;
use ber_core::BerResult;

/// Outcome of looking at the next TLV of a composite body
pub(crate) enum Peek {
    Tlv(Header),
    /// No further TLV: EOC marker or unreadable header (already reported)
    End(usize),
}

pub(crate) fn peek(cx: &mut DecodeContext<'_>, body: ByteView<'_>, offset: usize) -> BerResult<Peek> {
    if body.is_eoc(offset) {
        return Ok(Peek::End(offset));
    }
    match cx.header(body, offset) {
        Ok(header) => Ok(Peek::Tlv(header)),
        Err(err) => cx.recover(err, body, offset).map(Peek::End),
    }
}

/// End of a TLV inside `body`
fn tlv_end(body: ByteView<'_>, header: &Header) -> usize {
    header.end().min(body.end()).max(header.content)
}

/// Report a TLV that has no place in the table and skip it
fn skip_field(
    cx: &mut DecodeContext<'_>,
    body: ByteView<'_>,
    header: &Header,
    kind: DiagnosticKind,
    message: String,
) -> BerResult<usize> {
    let end = tlv_end(body, header);
    cx.report(Severity::Malformed, kind, header.offset, end - header.offset, message);
    if cx.config().decode_unexpected {
        walk_unknown(cx, body, header.offset)?;
    }
    Ok(end)
}

pub(crate) enum Step {
    /// Field decoded; continue at this offset
    Next(usize),
    /// Decoder consumed nothing of a non-empty input
    Empty,
}

/// Run one matched field decoder against the TLV at `header`
pub(crate) fn run_field(
    cx: &mut DecodeContext<'_>,
    body: ByteView<'_>,
    header: &Header,
    name: &'static str,
    flags: FieldFlags,
    decoder: &dyn FieldDecoder,
) -> BerResult<Step> {
    // A decoder that sees the whole TLV reports truncation itself
    if !flags.no_own_tag && header.end() > body.end() {
        let available = body.remaining(header.content);
        cx.report(
            Severity::Malformed,
            DiagnosticKind::Truncated,
            header.content,
            available,
            format!(
                "{}: length {} is larger than the remaining {} bytes",
                name, header.length, available
            ),
        );
    }
    let input_end = if flags.no_own_tag {
        header.end()
    } else {
        header.content_end()
    }
    .min(body.end());

    // Once the field's own tag has been stripped the field is present; only
    // a decoder that sees the tag itself may treat it as absent
    let optional = flags.optional && flags.no_own_tag;
    let (start, next) = cx.with_optional(optional, |cx| {
        invoke(cx, body, header, name, flags, decoder)
    })?;
    if next == start && input_end > start {
        return Ok(Step::Empty);
    }
    if flags.no_own_tag {
        Ok(Step::Next(next))
    } else {
        Ok(Step::Next(tlv_end(body, header)))
    }
}

fn report_empty(cx: &mut DecodeContext<'_>, body: ByteView<'_>, header: &Header, name: &str) -> usize {
    let end = tlv_end(body, header);
    cx.report(
        Severity::Malformed,
        DiagnosticKind::EmptyField,
        header.offset,
        end - header.offset,
        format!("{}: decoder consumed no bytes of a mandatory field", name),
    );
    end
}

/// Find and check the header of a SEQUENCE/SET-like composite
///
/// Application and private tags are accepted as tagged composites;
/// otherwise the tag must be the constructed universal `universal_tag`.
fn locate_composite<'v>(
    cx: &mut DecodeContext<'_>,
    input: Input<'v>,
    universal_tag: u32,
) -> BerResult<Locate<'v>> {
    if input.implicit {
        return crate::ber::primitive::locate(cx, input, universal_tag);
    }
    let view = input.view;
    let header = match cx.header(view, input.offset) {
        Ok(header) => header,
        Err(err) => return cx.recover(err, view, input.offset).map(Locate::Skipped),
    };
    let tag = header.tag;
    let expected = universal::name(universal_tag);
    let tagged = matches!(tag.class(), BerTagClass::Application | BerTagClass::Private);
    let native = tag.class() == BerTagClass::Universal
        && tag.number() == universal_tag
        && tag.is_constructed();
    if !tagged && !native {
        return skip_unexpected(cx, view, &header, expected).map(Locate::Skipped);
    }
    Ok(Locate::Found(accept(cx, view, &header, expected)))
}

/// Decode a composite around `body`, which walks the content and returns
/// the offset it reached
fn decode_composite<'v>(
    cx: &mut DecodeContext<'_>,
    input: Input<'v>,
    universal_tag: u32,
    body: impl FnOnce(&mut DecodeContext<'_>, ByteView<'v>, &Located<'v>) -> BerResult<usize>,
) -> BerResult<usize> {
    let loc = match locate_composite(cx, input, universal_tag)? {
        Locate::Skipped(next) => return Ok(next),
        Locate::Found(loc) => loc,
    };

    cx.enter(&loc.item(input.name, Value::Constructed));
    let result = cx.nested(|cx| {
        let offset = body(cx, input.view.limit(loc.content_end), &loc)?;
        check_length(cx, input.name, &loc, offset);
        Ok(())
    });
    cx.leave();
    result?;

    if loc.indefinite {
        cx.eoc(loc.content_end);
    }
    Ok(loc.end)
}

fn check_length(cx: &mut DecodeContext<'_>, name: &str, loc: &Located<'_>, offset: usize) {
    if offset == loc.content_end {
        return;
    }
    let (diff, direction) = if offset > loc.content_end {
        (offset - loc.content_end, "many")
    } else {
        (loc.content_end - offset, "few")
    };
    cx.report(
        Severity::Malformed,
        DiagnosticKind::LengthMismatch,
        loc.start,
        loc.len(),
        format!("{}: composite consumed {} too {} bytes", name, diff, direction),
    );
}

fn sequence_body(
    cx: &mut DecodeContext<'_>,
    body: ByteView<'_>,
    loc: &Located<'_>,
    fields: &[Field],
) -> BerResult<usize> {
    let mut offset = loc.content;
    let mut index = 0;
    'tlv: while offset < loc.content_end {
        let header = match peek(cx, body, offset)? {
            Peek::Tlv(header) => header,
            Peek::End(end) => {
                offset = end;
                break;
            }
        };
        let tag = header.tag;

        loop {
            while index < fields.len() && fields[index].flags.optional && !fields[index].accepts(&tag) {
                index += 1;
            }
            let Some(field) = fields.get(index) else {
                offset = skip_field(
                    cx,
                    body,
                    &header,
                    DiagnosticKind::UnknownField,
                    format!("Unknown field in SEQUENCE: {}", tag),
                )?;
                continue 'tlv;
            };
            if !field.accepts(&tag) {
                // Mandatory field missing; stay on it for the next TLV
                offset = skip_field(
                    cx,
                    body,
                    &header,
                    DiagnosticKind::WrongField,
                    format!("Wrong field in SEQUENCE: expected {} but found {}", field.name, tag),
                )?;
                continue 'tlv;
            }

            match run_field(cx, body, &header, field.name, field.flags, field.decoder)? {
                Step::Next(next) => {
                    offset = next;
                    index += 1;
                    continue 'tlv;
                }
                Step::Empty if field.flags.optional => {
                    log::trace!("optional field {} absent at {}", field.name, header.offset);
                    index += 1;
                }
                Step::Empty => {
                    offset = report_empty(cx, body, &header, field.name);
                    index += 1;
                    continue 'tlv;
                }
            }
        }
    }
    Ok(offset)
}

fn set_body(
    cx: &mut DecodeContext<'_>,
    body: ByteView<'_>,
    loc: &Located<'_>,
    name: &str,
    fields: &[Field],
) -> BerResult<usize> {
    let mut seen: u64 = 0;
    let mut offset = loc.content;
    'tlv: while offset < loc.content_end {
        let header = match peek(cx, body, offset)? {
            Peek::Tlv(header) => header,
            Peek::End(end) => {
                offset = end;
                break;
            }
        };
        let tag = header.tag;

        for (index, field) in fields.iter().enumerate().filter(|(_, f)| f.accepts(&tag)) {
            match run_field(cx, body, &header, field.name, field.flags, field.decoder)? {
                Step::Next(next) => {
                    if index < 64 {
                        seen |= 1 << index;
                    }
                    offset = next;
                    continue 'tlv;
                }
                Step::Empty if field.flags.optional => continue,
                Step::Empty => {
                    offset = report_empty(cx, body, &header, field.name);
                    continue 'tlv;
                }
            }
        }
        offset = skip_field(
            cx,
            body,
            &header,
            DiagnosticKind::UnknownField,
            format!("Unknown field in SET: {}", tag),
        )?;
    }

    for (index, field) in fields.iter().enumerate().take(64) {
        if !field.flags.optional && seen & (1 << index) == 0 {
            cx.report(
                Severity::Malformed,
                DiagnosticKind::MissingField,
                loc.start,
                loc.len(),
                format!("{}: missing mandatory field {}", name, field.name),
            );
        }
    }
    Ok(offset)
}

fn repeated_body(
    cx: &mut DecodeContext<'_>,
    body: ByteView<'_>,
    loc: &Located<'_>,
    name: &'static str,
    item: &Field,
    size: Size,
) -> BerResult<usize> {
    let mut count = 0;
    let mut offset = loc.content;
    while offset < loc.content_end {
        let header = match peek(cx, body, offset)? {
            Peek::Tlv(header) => header,
            Peek::End(end) => {
                offset = end;
                break;
            }
        };
        if !item.accepts(&header.tag) {
            offset = skip_field(
                cx,
                body,
                &header,
                DiagnosticKind::WrongField,
                format!("Wrong field in {}: expected {} but found {}", name, item.name, header.tag),
            )?;
            continue;
        }
        offset = match run_field(cx, body, &header, item.name, item.flags, item.decoder)? {
            Step::Next(next) => {
                count += 1;
                next
            }
            Step::Empty => report_empty(cx, body, &header, item.name),
        };
    }
    size.check(cx, name, loc.start, loc.len(), count, "items");
    Ok(offset)
}

/// Decode a SEQUENCE against `fields`
///
/// # Returns
/// The offset after the SEQUENCE, including its EOC marker when the length
/// is indefinite.
pub fn decode_sequence(cx: &mut DecodeContext<'_>, input: Input<'_>, fields: &[Field]) -> BerResult<usize> {
    decode_composite(cx, input, universal::SEQUENCE, |cx, body, loc| {
        sequence_body(cx, body, loc, fields)
    })
}

/// Decode a SET against `fields`; members may appear in any order
pub fn decode_set(cx: &mut DecodeContext<'_>, input: Input<'_>, fields: &[Field]) -> BerResult<usize> {
    decode_composite(cx, input, universal::SET, |cx, body, loc| {
        set_body(cx, body, loc, input.name, fields)
    })
}

pub fn decode_sequence_of(
    cx: &mut DecodeContext<'_>,
    input: Input<'_>,
    item: &Field,
    size: Size,
) -> BerResult<usize> {
    decode_composite(cx, input, universal::SEQUENCE, |cx, body, loc| {
        repeated_body(cx, body, loc, input.name, item, size)
    })
}

pub fn decode_set_of(
    cx: &mut DecodeContext<'_>,
    input: Input<'_>,
    item: &Field,
    size: Size,
) -> BerResult<usize> {
    decode_composite(cx, input, universal::SET, |cx, body, loc| {
        repeated_body(cx, body, loc, input.name, item, size)
    })
}

/// SEQUENCE field
#[derive(Debug, Clone, Copy)]
pub struct BerSequence {
    pub fields: &'static [Field],
}

impl BerSequence {
    pub const fn new(fields: &'static [Field]) -> Self {
        Self { fields }
    }
}

impl FieldDecoder for BerSequence {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_sequence(cx, input, self.fields)
    }
}

/// SET field
#[derive(Debug, Clone, Copy)]
pub struct BerSet {
    pub fields: &'static [Field],
}

impl BerSet {
    pub const fn new(fields: &'static [Field]) -> Self {
        Self { fields }
    }
}

impl FieldDecoder for BerSet {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_set(cx, input, self.fields)
    }
}

/// SEQUENCE OF field
#[derive(Debug, Clone, Copy)]
pub struct BerSequenceOf {
    pub item: Field,
    pub size: Size,
}

impl BerSequenceOf {
    pub const fn new(item: Field) -> Self {
        Self {
            item,
            size: Size::UNBOUNDED,
        }
    }

    pub const fn sized(item: Field, min: usize, max: usize) -> Self {
        Self {
            item,
            size: Size::new(min, max),
        }
    }
}

impl FieldDecoder for BerSequenceOf {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_sequence_of(cx, input, &self.item, self.size)
    }
}

/// SET OF field
#[derive(Debug, Clone, Copy)]
pub struct BerSetOf {
    pub item: Field,
    pub size: Size,
}

impl BerSetOf {
    pub const fn new(item: Field) -> Self {
        Self {
            item,
            size: Size::UNBOUNDED,
        }
    }

    pub const fn sized(item: Field, min: usize, max: usize) -> Self {
        Self {
            item,
            size: Size::new(min, max),
        }
    }
}

impl FieldDecoder for BerSetOf {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_set_of(cx, input, &self.item, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::primitive::{BerBoolean, BerInteger};
    use crate::ber::schema::TagMatch;
    use crate::ber::sink::Recorder;
    use crate::ber::string::BerOctetString;
    use ber_core::DecoderConfig;
    use rasn::types::Integer;
    use rasn::{AsnType, Encode};

    static INTEGER: BerInteger = BerInteger::new();
    static BOOLEAN: BerBoolean = BerBoolean;
    static OCTETS: BerOctetString = BerOctetString::new();

    fn run(data: &[u8], decoder: &dyn FieldDecoder, config: DecoderConfig) -> (usize, Recorder) {
        let mut recorder = Recorder::new();
        let next = {
            let mut cx = DecodeContext::new(&mut recorder, config);
            decoder
                .decode(&mut cx, Input::new(ByteView::new(data), 0, "root"))
                .unwrap()
        };
        (next, recorder)
    }

    static PAIR: BerSequence = BerSequence::new(&[
        Field::new("a", TagMatch::universal(2), FieldFlags::NO_OWN_TAG, &INTEGER),
        Field::new("b", TagMatch::universal(2), FieldFlags::NO_OWN_TAG, &INTEGER),
    ]);

    #[derive(AsnType, Encode)]
    struct Pair {
        a: Integer,
        b: Integer,
    }

    #[test]
    fn test_sequence_matches_rasn() {
        let encoded = rasn::ber::encode(&Pair {
            a: 7.into(),
            b: (-300).into(),
        })
        .unwrap();
        let (next, recorder) = run(&encoded, &PAIR, DecoderConfig::default());
        assert_eq!(next, encoded.len());
        assert_eq!(recorder.values("a"), vec![&Value::Integer(7)]);
        assert_eq!(recorder.values("b"), vec![&Value::Integer(-300)]);
        assert_eq!(recorder.find("a").unwrap().level, 1);
        assert!(recorder.diagnostics.is_empty());
    }

    #[test]
    fn test_indefinite_sequence_consumes_eoc() {
        let data = [0x30, 0x80, 0x02, 0x01, 0x05, 0x02, 0x01, 0x06, 0x00, 0x00];
        let (next, recorder) = run(&data, &PAIR, DecoderConfig::default());
        assert_eq!(next, 10);
        assert_eq!(recorder.values("b"), vec![&Value::Integer(6)]);
        assert!(recorder.diagnostics.is_empty());
    }

    static WITH_OPTIONAL: BerSequence = BerSequence::new(&[
        Field::new("version", TagMatch::context(0), FieldFlags::IMPLICIT.optional(), &INTEGER),
        Field::new("flag", TagMatch::context(2), FieldFlags::IMPLICIT, &BOOLEAN),
    ]);

    #[test]
    fn test_optional_field_skipped_without_consuming() {
        let data = [0x30, 0x03, 0x82, 0x01, 0xFF];
        let (next, recorder) = run(&data, &WITH_OPTIONAL, DecoderConfig::default());
        assert_eq!(next, 5);
        assert!(recorder.find("version").is_none());
        assert_eq!(recorder.values("flag"), vec![&Value::Boolean(true)]);
        assert!(recorder.diagnostics.is_empty());
    }

    #[test]
    fn test_wrong_field_reported_once() {
        // flag expected as [2], found [3]
        let data = [0x30, 0x03, 0x83, 0x01, 0xFF];
        let (next, recorder) = run(&data, &WITH_OPTIONAL, DecoderConfig::default());
        assert_eq!(next, 5);
        assert_eq!(recorder.diagnostics.len(), 1);
        assert_eq!(recorder.diagnostics[0].kind, DiagnosticKind::WrongField);
        assert_eq!(recorder.diagnostics[0].offset, 2);
        assert_eq!(recorder.diagnostics[0].length, 3);
    }

    #[test]
    fn test_unknown_fields_beyond_table() {
        let data = [0x30, 0x09, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02, 0x02, 0x01, 0x03];
        let config = DecoderConfig::default().with_decode_unexpected(false);
        let (next, recorder) = run(&data, &PAIR, config);
        assert_eq!(next, 11);
        assert_eq!(recorder.count(DiagnosticKind::UnknownField), 1);
        assert!(recorder.find("INTEGER").is_none());
    }

    #[test]
    fn test_length_mismatch_reported_once() {
        // EOC in the middle of a definite-length SEQUENCE
        let data = [0x30, 0x07, 0x02, 0x01, 0x05, 0x00, 0x00, 0x05, 0x00];
        let (next, recorder) = run(&data, &PAIR, DecoderConfig::default());
        assert_eq!(next, 9);
        assert_eq!(recorder.count(DiagnosticKind::LengthMismatch), 1);
        assert!(recorder.diagnostics[0].message.contains("4 too few"));
    }

    #[test]
    fn test_truncated_sequence() {
        let data = [0x30, 0x08, 0x02, 0x01, 0x05, 0x02, 0x01];
        let (next, recorder) = run(&data, &PAIR, DecoderConfig::default());
        assert_eq!(next, 7);
        assert!(recorder.count(DiagnosticKind::Truncated) >= 1);
        assert_eq!(recorder.values("a"), vec![&Value::Integer(5)]);
    }

    #[test]
    fn test_sequence_wrong_universal_type() {
        let data = [0x31, 0x03, 0x02, 0x01, 0x05];
        let (next, recorder) = run(&data, &PAIR, DecoderConfig::default());
        assert_eq!(next, 5);
        assert_eq!(recorder.count(DiagnosticKind::UnexpectedType), 1);
        // Walked generically
        assert!(recorder.find("SET").is_some());
        assert!(recorder.find("a").is_none());
    }

    #[test]
    fn test_application_tagged_sequence_accepted() {
        let data = [0x61, 0x03, 0x02, 0x01, 0x05];
        let (next, recorder) = run(&data, &PAIR, DecoderConfig::default());
        assert_eq!(next, 5);
        assert_eq!(recorder.values("a"), vec![&Value::Integer(5)]);
        assert_eq!(recorder.count(DiagnosticKind::UnexpectedType), 0);
    }

    static MEMBERS: BerSet = BerSet::new(&[
        Field::new("id", TagMatch::context(0), FieldFlags::IMPLICIT, &INTEGER),
        Field::new("active", TagMatch::context(1), FieldFlags::IMPLICIT, &BOOLEAN),
        Field::new("note", TagMatch::context(2), FieldFlags::IMPLICIT.optional(), &OCTETS),
    ]);

    #[test]
    fn test_set_any_order() {
        let data = [0x31, 0x06, 0x81, 0x01, 0x00, 0x80, 0x01, 0x09];
        let (next, recorder) = run(&data, &MEMBERS, DecoderConfig::default());
        assert_eq!(next, 8);
        assert_eq!(recorder.values("id"), vec![&Value::Integer(9)]);
        assert_eq!(recorder.values("active"), vec![&Value::Boolean(false)]);
        assert!(recorder.diagnostics.is_empty());
    }

    #[test]
    fn test_set_missing_mandatory() {
        let data = [0x31, 0x03, 0x80, 0x01, 0x09];
        let (_, recorder) = run(&data, &MEMBERS, DecoderConfig::default());
        assert_eq!(recorder.count(DiagnosticKind::MissingField), 1);
        assert!(recorder.diagnostics[0].message.contains("active"));
    }

    /// Decoder that never consumes anything
    struct Nothing;

    impl FieldDecoder for Nothing {
        fn decode(&self, _cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
            Ok(input.offset)
        }
    }

    static NOTHING: Nothing = Nothing;

    static OVERLAPPING: BerSet = BerSet::new(&[
        Field::new("placeholder", TagMatch::universal(2), FieldFlags::NO_OWN_TAG.optional(), &NOTHING),
        Field::new("count", TagMatch::universal(2), FieldFlags::NO_OWN_TAG, &INTEGER),
    ]);

    #[test]
    fn test_set_tries_next_member_after_empty_optional() {
        let data = [0x31, 0x03, 0x02, 0x01, 0x07];
        let (next, recorder) = run(&data, &OVERLAPPING, DecoderConfig::default());
        assert_eq!(next, 5);
        assert_eq!(recorder.values("count"), vec![&Value::Integer(7)]);
        assert!(recorder.find("placeholder").is_none());
        assert!(recorder.diagnostics.is_empty());
    }

    static NUMBERS: BerSequenceOf = BerSequenceOf::sized(
        Field::new("number", TagMatch::universal(2), FieldFlags::NO_OWN_TAG, &INTEGER),
        1,
        2,
    );

    #[test]
    fn test_sequence_of_items_and_size() {
        let encoded = rasn::ber::encode(&vec![Integer::from(1), Integer::from(2), Integer::from(3)]).unwrap();
        let (next, recorder) = run(&encoded, &NUMBERS, DecoderConfig::default());
        assert_eq!(next, encoded.len());
        assert_eq!(recorder.values("number").len(), 3);
        assert_eq!(recorder.count(DiagnosticKind::SizeConstraint), 1);
        assert_eq!(recorder.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_sequence_of_wrong_item() {
        let data = [0x30, 0x06, 0x02, 0x01, 0x01, 0x01, 0x01, 0xFF];
        let (next, recorder) = run(&data, &NUMBERS, DecoderConfig::default());
        assert_eq!(next, 8);
        assert_eq!(recorder.count(DiagnosticKind::WrongField), 1);
        assert_eq!(recorder.values("number").len(), 1);
    }
}
