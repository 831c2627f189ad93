//! OCTET STRING, restricted character strings and the time types
//!
//! All of them may use the constructed encoding, in which case the content
//! is reassembled from its segments before it is interpreted.

use crate::ber::context::DecodeContext;
use crate::ber::primitive::{Locate, Located, Size, locate};
use crate::ber::reassembly::{Reassembled, reassemble};
use crate::ber::schema::{FieldDecoder, Input};
use crate::ber::sink::{DiagnosticKind, Severity, Value};
use crate::ber::types::universal;
use crate::ber::view::ByteView;
use ber_core::{BerResult, GeneralizedTime, UtcTime};
use serde::Serialize;
use std::borrow::Cow;

/// Restricted character string types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StringKind {
    Utf8,
    Numeric,
    Printable,
    Teletex,
    Videotex,
    Ia5,
    Graphic,
    Visible,
    General,
    Universal,
    Bmp,
    ObjectDescriptor,
}

impl StringKind {
    pub fn tag(self) -> u32 {
        match self {
            StringKind::Utf8 => universal::UTF8_STRING,
            StringKind::Numeric => universal::NUMERIC_STRING,
            StringKind::Printable => universal::PRINTABLE_STRING,
            StringKind::Teletex => universal::TELETEX_STRING,
            StringKind::Videotex => universal::VIDEOTEX_STRING,
            StringKind::Ia5 => universal::IA5_STRING,
            StringKind::Graphic => universal::GRAPHIC_STRING,
            StringKind::Visible => universal::VISIBLE_STRING,
            StringKind::General => universal::GENERAL_STRING,
            StringKind::Universal => universal::UNIVERSAL_STRING,
            StringKind::Bmp => universal::BMP_STRING,
            StringKind::ObjectDescriptor => universal::OBJECT_DESCRIPTOR,
        }
    }

    pub fn from_tag(number: u32) -> Option<Self> {
        let kind = match number {
            universal::UTF8_STRING => StringKind::Utf8,
            universal::NUMERIC_STRING => StringKind::Numeric,
            universal::PRINTABLE_STRING => StringKind::Printable,
            universal::TELETEX_STRING => StringKind::Teletex,
            universal::VIDEOTEX_STRING => StringKind::Videotex,
            universal::IA5_STRING => StringKind::Ia5,
            universal::GRAPHIC_STRING => StringKind::Graphic,
            universal::VISIBLE_STRING => StringKind::Visible,
            universal::GENERAL_STRING => StringKind::General,
            universal::UNIVERSAL_STRING => StringKind::Universal,
            universal::BMP_STRING => StringKind::Bmp,
            universal::OBJECT_DESCRIPTOR => StringKind::ObjectDescriptor,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        universal::name(self.tag())
    }

    /// Convert content octets to text
    ///
    /// # Returns
    /// The text and the number of octets (or code units) outside the
    /// character set of the type. Offending characters are kept when they
    /// are printable ASCII and replaced by U+FFFD otherwise.
    pub fn decode_text(self, bytes: &[u8]) -> (Cow<'_, str>, usize) {
        match self {
            StringKind::Utf8 => match std::str::from_utf8(bytes) {
                Ok(text) => (Cow::Borrowed(text), 0),
                Err(_) => {
                    let invalid = bytes
                        .utf8_chunks()
                        .filter(|chunk| !chunk.invalid().is_empty())
                        .count();
                    (String::from_utf8_lossy(bytes), invalid)
                }
            },
            StringKind::Numeric => checked_ascii(bytes, |b| b.is_ascii_digit() || b == b' '),
            StringKind::Printable => checked_ascii(bytes, |b| {
                b.is_ascii_alphanumeric() || b" '()+,-./:=?".contains(&b)
            }),
            StringKind::Ia5 => checked_ascii(bytes, |b| b.is_ascii()),
            StringKind::Visible => checked_ascii(bytes, |b| (0x20..=0x7E).contains(&b)),
            StringKind::Teletex
            | StringKind::Videotex
            | StringKind::Graphic
            | StringKind::General
            | StringKind::ObjectDescriptor => (latin1(bytes), 0),
            StringKind::Universal => {
                let mut invalid = usize::from(bytes.len() % 4 != 0);
                let text = bytes
                    .chunks_exact(4)
                    .map(|c| {
                        char::from_u32(u32::from_be_bytes([c[0], c[1], c[2], c[3]])).unwrap_or_else(|| {
                            invalid += 1;
                            char::REPLACEMENT_CHARACTER
                        })
                    })
                    .collect::<String>();
                (Cow::Owned(text), invalid)
            }
            StringKind::Bmp => {
                let mut invalid = usize::from(bytes.len() % 2 != 0);
                let units = bytes.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]));
                let text = char::decode_utf16(units)
                    .map(|r| {
                        r.unwrap_or_else(|_| {
                            invalid += 1;
                            char::REPLACEMENT_CHARACTER
                        })
                    })
                    .collect::<String>();
                (Cow::Owned(text), invalid)
            }
        }
    }
}

fn checked_ascii(bytes: &[u8], allowed: impl Fn(u8) -> bool) -> (Cow<'_, str>, usize) {
    let invalid = bytes.iter().filter(|&&b| !allowed(b)).count();
    if bytes.is_ascii() {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return (Cow::Borrowed(text), invalid);
        }
    }
    let text = bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
        .collect();
    (Cow::Owned(text), invalid)
}

fn latin1(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) if bytes.is_ascii() => Cow::Borrowed(text),
        _ => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// Content of a string TLV, reassembled when constructed
pub(crate) fn string_bytes<'v>(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'v>,
    loc: &Located<'v>,
    segment_tag: u32,
) -> BerResult<Reassembled<'v>> {
    if loc.constructed {
        reassemble(cx, view, loc.content, loc.content_end, segment_tag)
    } else {
        Ok(Reassembled::Single {
            offset: loc.content,
            bytes: loc.bytes,
        })
    }
}

/// Emit an OCTET STRING, handing its content to `inner` when given
pub(crate) fn emit_octets(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'_>,
    name: &'static str,
    loc: &Located<'_>,
    content: &Reassembled<'_>,
    size: Size,
    inner: Option<&dyn FieldDecoder>,
) -> BerResult<()> {
    size.check(cx, name, loc.start, loc.len(), content.len(), "octets");
    let item = loc.item(name, Value::OctetString(Cow::Borrowed(content.as_bytes())));
    let Some(inner) = inner.filter(|_| !content.is_empty()) else {
        cx.emit(&item);
        return Ok(());
    };

    cx.enter(&item);
    let result = cx.nested(|cx| cx.with_optional(false, |cx| match content {
        Reassembled::Single { offset, bytes } => inner
            .decode(cx, Input::new(view.limit(offset + bytes.len()), *offset, name))
            .map(|_| ()),
        Reassembled::Joined(bytes) => inner
            .decode(cx, Input::new(ByteView::new(bytes), 0, name))
            .map(|_| ()),
        Reassembled::Empty => Ok(()),
    }));
    cx.leave();
    result
}

/// Interpret and emit restricted string content
pub(crate) fn string_content<'v>(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'v>,
    name: &'static str,
    loc: &Located<'v>,
    kind: StringKind,
    size: Size,
) -> BerResult<Cow<'v, str>> {
    let content = string_bytes(cx, view, loc, kind.tag())?;
    let (text, invalid) = match &content {
        Reassembled::Single { bytes, .. } => kind.decode_text(*bytes),
        Reassembled::Joined(bytes) => {
            let (text, invalid) = kind.decode_text(bytes);
            (Cow::Owned(text.into_owned()), invalid)
        }
        Reassembled::Empty => (Cow::Borrowed(""), 0),
    };

    cx.emit(&loc.item(
        name,
        Value::String {
            kind,
            text: Cow::Borrowed(&text),
        },
    ));
    if invalid > 0 {
        cx.report(
            Severity::Warning,
            DiagnosticKind::UnexpectedCharacters,
            loc.start,
            loc.len(),
            format!(
                "{} with {} unexpected character{}",
                kind.name(),
                invalid,
                if invalid == 1 { "" } else { "s" }
            ),
        );
    }
    size.check(cx, name, loc.start, loc.len(), text.chars().count(), "characters");
    Ok(text)
}

pub(crate) fn generalized_time_content(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'_>,
    name: &'static str,
    loc: &Located<'_>,
) -> BerResult<Option<GeneralizedTime>> {
    let content = string_bytes(cx, view, loc, universal::GENERALIZED_TIME)?;
    let text = String::from_utf8_lossy(&content);
    match GeneralizedTime::parse(&text) {
        Ok(time) => {
            cx.emit(&loc.item(name, Value::GeneralizedTime(time.clone())));
            Ok(Some(time))
        }
        Err(err) => {
            bad_time(cx, name, loc, text, err.to_string());
            Ok(None)
        }
    }
}

pub(crate) fn utc_time_content(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'_>,
    name: &'static str,
    loc: &Located<'_>,
) -> BerResult<Option<UtcTime>> {
    let content = string_bytes(cx, view, loc, universal::UTC_TIME)?;
    let text = String::from_utf8_lossy(&content);
    match UtcTime::parse(&text) {
        Ok(time) => {
            cx.emit(&loc.item(name, Value::UtcTime(time.clone())));
            Ok(Some(time))
        }
        Err(err) => {
            bad_time(cx, name, loc, text, err.to_string());
            Ok(None)
        }
    }
}

fn bad_time(cx: &mut DecodeContext<'_>, name: &'static str, loc: &Located<'_>, text: Cow<'_, str>, reason: String) {
    cx.report(
        Severity::Malformed,
        DiagnosticKind::InvalidEncoding,
        loc.start,
        loc.len(),
        format!("{}: {}", name, reason),
    );
    cx.emit(&loc.item(
        name,
        Value::String {
            kind: StringKind::Visible,
            text,
        },
    ));
}

/// Decode an OCTET STRING field
///
/// # Returns
/// `(next_offset, content)`; the content borrows the message when it was
/// sent as a single segment.
pub fn decode_octet_string<'v>(
    cx: &mut DecodeContext<'_>,
    input: Input<'v>,
    size: Size,
) -> BerResult<(usize, Option<Reassembled<'v>>)> {
    match locate(cx, input, universal::OCTET_STRING)? {
        Locate::Skipped(next) => Ok((next, None)),
        Locate::Found(loc) => {
            let content = string_bytes(cx, input.view, &loc, universal::OCTET_STRING)?;
            emit_octets(cx, input.view, input.name, &loc, &content, size, None)?;
            Ok((loc.end, Some(content)))
        }
    }
}

pub fn decode_restricted_string<'v>(
    cx: &mut DecodeContext<'_>,
    input: Input<'v>,
    kind: StringKind,
    size: Size,
) -> BerResult<(usize, Option<Cow<'v, str>>)> {
    match locate(cx, input, kind.tag())? {
        Locate::Skipped(next) => Ok((next, None)),
        Locate::Found(loc) => {
            let text = string_content(cx, input.view, input.name, &loc, kind, size)?;
            Ok((loc.end, Some(text)))
        }
    }
}

pub fn decode_generalized_time(
    cx: &mut DecodeContext<'_>,
    input: Input<'_>,
) -> BerResult<(usize, Option<GeneralizedTime>)> {
    match locate(cx, input, universal::GENERALIZED_TIME)? {
        Locate::Skipped(next) => Ok((next, None)),
        Locate::Found(loc) => {
            let time = generalized_time_content(cx, input.view, input.name, &loc)?;
            Ok((loc.end, time))
        }
    }
}

pub fn decode_utc_time(
    cx: &mut DecodeContext<'_>,
    input: Input<'_>,
) -> BerResult<(usize, Option<UtcTime>)> {
    match locate(cx, input, universal::UTC_TIME)? {
        Locate::Skipped(next) => Ok((next, None)),
        Locate::Found(loc) => {
            let time = utc_time_content(cx, input.view, input.name, &loc)?;
            Ok((loc.end, time))
        }
    }
}

/// OCTET STRING field
///
/// With an `inner` decoder the (reassembled) content is decoded as nested
/// data and its items are emitted as children of the string.
#[derive(Clone, Copy)]
pub struct BerOctetString {
    pub size: Size,
    pub inner: Option<&'static dyn FieldDecoder>,
}

impl BerOctetString {
    pub const fn new() -> Self {
        Self {
            size: Size::UNBOUNDED,
            inner: None,
        }
    }

    pub const fn sized(min: usize, max: usize) -> Self {
        Self {
            size: Size::new(min, max),
            inner: None,
        }
    }

    pub const fn containing(inner: &'static dyn FieldDecoder) -> Self {
        Self {
            size: Size::UNBOUNDED,
            inner: Some(inner),
        }
    }
}

impl Default for BerOctetString {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldDecoder for BerOctetString {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        match locate(cx, input, universal::OCTET_STRING)? {
            Locate::Skipped(next) => Ok(next),
            Locate::Found(loc) => {
                let content = string_bytes(cx, input.view, &loc, universal::OCTET_STRING)?;
                emit_octets(cx, input.view, input.name, &loc, &content, self.size, self.inner)?;
                Ok(loc.end)
            }
        }
    }
}

/// Restricted character string field
#[derive(Debug, Clone, Copy)]
pub struct BerString {
    pub kind: StringKind,
    pub size: Size,
}

impl BerString {
    pub const fn new(kind: StringKind) -> Self {
        Self {
            kind,
            size: Size::UNBOUNDED,
        }
    }

    pub const fn sized(kind: StringKind, min: usize, max: usize) -> Self {
        Self {
            kind,
            size: Size::new(min, max),
        }
    }
}

impl FieldDecoder for BerString {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_restricted_string(cx, input, self.kind, self.size).map(|(next, _)| next)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BerGeneralizedTime;

impl FieldDecoder for BerGeneralizedTime {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_generalized_time(cx, input).map(|(next, _)| next)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BerUtcTime;

impl FieldDecoder for BerUtcTime {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_utc_time(cx, input).map(|(next, _)| next)
    }
}
