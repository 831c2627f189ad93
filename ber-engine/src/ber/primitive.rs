//! Decoders for the simple universal types: INTEGER, ENUMERATED, BOOLEAN,
//! NULL and REAL
//!
//! Every decoder follows the same steps: locate the TLV (or take the content
//! as-is for an implicitly tagged field), check the universal tag, interpret
//! the content octets and emit one item. Problems with the content are
//! reported as diagnostics; the decoder still consumes the whole TLV.

use crate::ber::context::DecodeContext;
use crate::ber::length::Header;
use crate::ber::schema::{FieldDecoder, Input};
use crate::ber::sink::{DecodedItem, DiagnosticKind, Severity, Value};
use crate::ber::types::{BerTag, BerTagClass, universal};
use crate::ber::unknown::walk_unknown;
use crate::ber::view::ByteView;
use ber_core::{BerError, BerResult};
use std::borrow::Cow;

/// A TLV whose content is ready to be interpreted
#[derive(Debug, Clone, Copy)]
pub struct Located<'v> {
    /// First offset of the TLV (content offset for implicit input)
    pub start: usize,
    pub content: usize,
    pub content_end: usize,
    /// Offset right after the TLV
    pub end: usize,
    pub tag: Option<BerTag>,
    pub constructed: bool,
    /// Content is closed by an EOC marker between `content_end` and `end`
    pub indefinite: bool,
    /// Content octets, clamped to the available bytes
    pub bytes: &'v [u8],
}

impl<'v> Located<'v> {
    pub fn from_header(view: ByteView<'v>, header: &Header) -> Self {
        let content_end = header.content_end().min(view.end());
        Self {
            start: header.offset,
            content: header.content,
            content_end,
            end: header.end().min(view.end()),
            tag: Some(header.tag),
            constructed: header.tag.is_constructed(),
            indefinite: header.indefinite,
            bytes: view.window(header.content, content_end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn item<'a>(&self, name: &'static str, value: Value<'a>) -> DecodedItem<'a> {
        DecodedItem {
            name,
            offset: self.start,
            length: self.len(),
            tag: self.tag,
            value,
        }
    }
}

pub enum Locate<'v> {
    Found(Located<'v>),
    /// The TLV was not the expected type and has been skipped up to this offset
    Skipped(usize),
}

/// Find the TLV of a field expected to carry universal tag `universal_tag`
///
/// # Error Handling
/// Header errors and tag mismatches are reported and turned into
/// [`Locate::Skipped`]; only fatal errors are returned.
pub fn locate<'v>(
    cx: &mut DecodeContext<'_>,
    input: Input<'v>,
    universal_tag: u32,
) -> BerResult<Locate<'v>> {
    let view = input.view;
    if input.implicit {
        let end = view.end().max(input.offset);
        return Ok(Locate::Found(Located {
            start: input.offset,
            content: input.offset,
            content_end: end,
            end,
            tag: input.outer.map(|h| h.tag),
            constructed: input.outer_constructed(),
            indefinite: false,
            bytes: view.window(input.offset, end),
        }));
    }

    let header = match cx.header(view, input.offset) {
        Ok(header) => header,
        Err(err) => return cx.recover(err, view, input.offset).map(Locate::Skipped),
    };
    let tag = header.tag;
    let expected = universal::name(universal_tag);
    if tag.class() != BerTagClass::Universal || tag.number() != universal_tag {
        return skip_unexpected(cx, view, &header, expected).map(Locate::Skipped);
    }
    Ok(Locate::Found(accept(cx, view, &header, expected)))
}

/// Report a TLV of the wrong type and skip it
///
/// The TLV is walked generically when `decode_unexpected` is set.
pub(crate) fn skip_unexpected(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'_>,
    header: &Header,
    expected: &str,
) -> BerResult<usize> {
    let end = header.end().min(view.end()).max(header.content);
    cx.report(
        Severity::Malformed,
        DiagnosticKind::UnexpectedType,
        header.offset,
        end - header.offset,
        format!("{} expected but {} was unexpected", expected, header.tag),
    );
    if cx.config().decode_unexpected {
        walk_unknown(cx, view, header.offset)?;
    }
    Ok(end)
}

/// Take a TLV whose tag has been checked, reporting it when truncated
pub(crate) fn accept<'v>(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'v>,
    header: &Header,
    expected: &str,
) -> Located<'v> {
    cx.internals(header);
    if header.end() > view.end() {
        let available = view.remaining(header.content);
        cx.report(
            Severity::Malformed,
            DiagnosticKind::Truncated,
            header.content,
            available,
            format!(
                "{} length {} is larger than the remaining {} bytes",
                expected, header.length, available
            ),
        );
    }
    Located::from_header(view, header)
}

/// Report a primitive-only type found with a constructed encoding
///
/// Returns true when the content cannot be interpreted.
pub(crate) fn reject_constructed(cx: &mut DecodeContext<'_>, name: &'static str, loc: &Located<'_>) -> bool {
    if !loc.constructed {
        return false;
    }
    cx.report(
        Severity::Malformed,
        DiagnosticKind::InvalidEncoding,
        loc.start,
        loc.len(),
        format!("{}: constructed encoding of a primitive type", name),
    );
    cx.emit(&loc.item(name, Value::Raw(Cow::Borrowed(loc.bytes))));
    true
}

/// Inclusive value range of an INTEGER or ENUMERATED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl Range {
    pub const UNBOUNDED: Self = Self {
        min: None,
        max: None,
    };

    pub const fn new(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Inclusive SIZE constraint (octets, characters, bits or items)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Size {
    pub const UNBOUNDED: Self = Self {
        min: None,
        max: None,
    };

    pub const fn new(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, size: usize) -> bool {
        self.min.is_none_or(|min| size >= min) && self.max.is_none_or(|max| size <= max)
    }

    /// Report a violation as a warning
    pub(crate) fn check(
        &self,
        cx: &mut DecodeContext<'_>,
        name: &'static str,
        offset: usize,
        length: usize,
        size: usize,
        unit: &str,
    ) {
        if self.contains(size) {
            return;
        }
        cx.report(
            Severity::Warning,
            DiagnosticKind::SizeConstraint,
            offset,
            length,
            format!(
                "{}: size {} {} outside {}..{}",
                name,
                size,
                unit,
                self.min.map_or(String::from("MIN"), |v| v.to_string()),
                self.max.map_or(String::from("MAX"), |v| v.to_string())
            ),
        );
    }
}

/// Two's complement value of INTEGER content octets
///
/// # Returns
/// `None` when the content is longer than 8 octets.
pub fn integer_value(content: &[u8]) -> Option<i64> {
    if content.len() > 8 {
        return None;
    }
    let mut value: i64 = match content.first() {
        Some(first) if first & 0x80 != 0 => -1,
        _ => 0,
    };
    for &byte in content {
        value = (value << 8) | byte as i64;
    }
    Some(value)
}

/// Interpret INTEGER or ENUMERATED content and emit it
pub(crate) fn integer_content(
    cx: &mut DecodeContext<'_>,
    name: &'static str,
    loc: &Located<'_>,
    range: Range,
    enumerated: bool,
) -> Option<i64> {
    if reject_constructed(cx, name, loc) {
        return None;
    }
    let content = loc.bytes;
    if content.is_empty() {
        cx.report(
            Severity::Malformed,
            DiagnosticKind::InvalidEncoding,
            loc.start,
            loc.len(),
            format!("{}: length of integer is 0", name),
        );
        return None;
    }

    if cx.config().warn_leading_zero_bits && content.len() >= 2 {
        let redundant = (content[0] == 0x00 && content[1] & 0x80 == 0)
            || (content[0] == 0xFF && content[1] & 0x80 != 0);
        if redundant {
            cx.report(
                Severity::Warning,
                DiagnosticKind::LeadingZeroBits,
                loc.content,
                1,
                format!("{}: integer encoded with leading redundant bits", name),
            );
        }
    }

    let Some(value) = integer_value(content) else {
        // Wider than i64: hand out the octets as they are
        cx.emit(&loc.item(name, Value::Raw(Cow::Borrowed(content))));
        return None;
    };

    let item_value = if enumerated {
        Value::Enumerated(value)
    } else {
        Value::Integer(value)
    };
    cx.emit(&loc.item(name, item_value));

    if !range.contains(value) {
        cx.report(
            Severity::Warning,
            DiagnosticKind::ValueConstraint,
            loc.start,
            loc.len(),
            format!(
                "{}: value {} out of range ({}..{})",
                name,
                value,
                range.min.map_or(String::from("MIN"), |v| v.to_string()),
                range.max.map_or(String::from("MAX"), |v| v.to_string())
            ),
        );
    }
    Some(value)
}

pub(crate) fn boolean_content(
    cx: &mut DecodeContext<'_>,
    name: &'static str,
    loc: &Located<'_>,
) -> Option<bool> {
    if reject_constructed(cx, name, loc) {
        return None;
    }
    if loc.bytes.len() != 1 {
        cx.report(
            Severity::Malformed,
            DiagnosticKind::InvalidEncoding,
            loc.start,
            loc.len(),
            format!("{}: BOOLEAN with length {} (expected 1)", name, loc.bytes.len()),
        );
    }
    let value = loc.bytes.first().map(|&b| b != 0)?;
    cx.emit(&loc.item(name, Value::Boolean(value)));
    Some(value)
}

pub(crate) fn null_content(cx: &mut DecodeContext<'_>, name: &'static str, loc: &Located<'_>) {
    if !loc.bytes.is_empty() {
        cx.report(
            Severity::Malformed,
            DiagnosticKind::InvalidEncoding,
            loc.content,
            loc.bytes.len(),
            format!("{}: NULL with non-zero length {}", name, loc.bytes.len()),
        );
    }
    cx.emit(&loc.item(name, Value::Null));
}

/// Value of REAL content octets (X.690 §8.5)
///
/// # Error Handling
/// Returns error for reserved bases, malformed exponents, unknown special
/// values and unparsable decimal forms.
pub fn real_value(content: &[u8]) -> BerResult<f64> {
    let Some((&first, rest)) = content.split_first() else {
        return Ok(0.0);
    };

    if first & 0x80 != 0 {
        return binary_real(first, rest);
    }

    if first & 0x40 != 0 {
        if !rest.is_empty() {
            return Err(BerError::InvalidData(format!(
                "REAL special value 0x{:02x} with {} trailing octets",
                first,
                rest.len()
            )));
        }
        return match first {
            0x40 => Ok(f64::INFINITY),
            0x41 => Ok(f64::NEG_INFINITY),
            0x42 => Ok(f64::NAN),
            0x43 => Ok(-0.0),
            _ => Err(BerError::InvalidData(format!(
                "Unknown REAL special value 0x{:02x}",
                first
            ))),
        };
    }

    // Decimal: ISO 6093 NR1, NR2 or NR3
    let form = first & 0x3F;
    if !(1..=3).contains(&form) {
        return Err(BerError::InvalidData(format!(
            "Unknown REAL decimal form {}",
            form
        )));
    }
    let text = std::str::from_utf8(rest)
        .map_err(|_| BerError::InvalidData("REAL decimal form is not ASCII".to_string()))?;
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| BerError::InvalidData(format!("Invalid REAL decimal form: {}", text)))
}

fn binary_real(first: u8, rest: &[u8]) -> BerResult<f64> {
    let negative = first & 0x40 != 0;
    let base_bits: i64 = match (first >> 4) & 0x03 {
        0 => 1,
        1 => 3,
        2 => 4,
        _ => {
            return Err(BerError::InvalidData(
                "Reserved REAL base".to_string(),
            ));
        }
    };
    let scale = ((first >> 2) & 0x03) as i64;

    let (exponent_len, rest) = match first & 0x03 {
        3 => {
            let Some((&len, rest)) = rest.split_first() else {
                return Err(BerError::InvalidData(
                    "REAL exponent length missing".to_string(),
                ));
            };
            (len as usize, rest)
        }
        n => (n as usize + 1, rest),
    };
    if exponent_len == 0 || exponent_len > rest.len() {
        return Err(BerError::InvalidData(format!(
            "REAL exponent of {} octets does not fit the content",
            exponent_len
        )));
    }
    let (exponent_octets, mantissa_octets) = rest.split_at(exponent_len);
    let exponent = if exponent_len > 8 {
        // Far outside the f64 range either way
        if exponent_octets[0] & 0x80 != 0 { i64::MIN / 8 } else { i64::MAX / 8 }
    } else {
        integer_value(exponent_octets).unwrap_or_default()
    };

    let mantissa = mantissa_octets
        .iter()
        .fold(0.0f64, |acc, &b| acc * 256.0 + b as f64);
    let power = exponent
        .saturating_mul(base_bits)
        .saturating_add(scale)
        .clamp(-2200, 2200) as i32;
    let value = mantissa * 2f64.powi(power);
    Ok(if negative { -value } else { value })
}

pub(crate) fn real_content(cx: &mut DecodeContext<'_>, name: &'static str, loc: &Located<'_>) -> Option<f64> {
    if reject_constructed(cx, name, loc) {
        return None;
    }
    match real_value(loc.bytes) {
        Ok(value) => {
            cx.emit(&loc.item(name, Value::Real(value)));
            Some(value)
        }
        Err(err) => {
            cx.report(
                Severity::Malformed,
                DiagnosticKind::InvalidEncoding,
                loc.start,
                loc.len(),
                format!("{}: {}", name, err),
            );
            cx.emit(&loc.item(name, Value::Raw(Cow::Borrowed(loc.bytes))));
            None
        }
    }
}

/// Decode an INTEGER field
///
/// # Returns
/// `(next_offset, value)`; the value is `None` when it could not be read
/// or does not fit in `i64`.
pub fn decode_integer(
    cx: &mut DecodeContext<'_>,
    input: Input<'_>,
    range: Range,
) -> BerResult<(usize, Option<i64>)> {
    match locate(cx, input, universal::INTEGER)? {
        Locate::Skipped(next) => Ok((next, None)),
        Locate::Found(loc) => Ok((loc.end, integer_content(cx, input.name, &loc, range, false))),
    }
}

pub fn decode_enumerated(
    cx: &mut DecodeContext<'_>,
    input: Input<'_>,
    range: Range,
) -> BerResult<(usize, Option<i64>)> {
    match locate(cx, input, universal::ENUMERATED)? {
        Locate::Skipped(next) => Ok((next, None)),
        Locate::Found(loc) => Ok((loc.end, integer_content(cx, input.name, &loc, range, true))),
    }
}

pub fn decode_boolean(cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<(usize, Option<bool>)> {
    match locate(cx, input, universal::BOOLEAN)? {
        Locate::Skipped(next) => Ok((next, None)),
        Locate::Found(loc) => Ok((loc.end, boolean_content(cx, input.name, &loc))),
    }
}

pub fn decode_null(cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
    match locate(cx, input, universal::NULL)? {
        Locate::Skipped(next) => Ok(next),
        Locate::Found(loc) => {
            null_content(cx, input.name, &loc);
            Ok(loc.end)
        }
    }
}

pub fn decode_real(cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<(usize, Option<f64>)> {
    match locate(cx, input, universal::REAL)? {
        Locate::Skipped(next) => Ok((next, None)),
        Locate::Found(loc) => Ok((loc.end, real_content(cx, input.name, &loc))),
    }
}

/// INTEGER field, optionally range constrained
#[derive(Debug, Clone, Copy, Default)]
pub struct BerInteger {
    pub range: Range,
}

impl BerInteger {
    pub const fn new() -> Self {
        Self {
            range: Range::UNBOUNDED,
        }
    }

    pub const fn ranged(min: i64, max: i64) -> Self {
        Self {
            range: Range::new(min, max),
        }
    }
}

impl FieldDecoder for BerInteger {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_integer(cx, input, self.range).map(|(next, _)| next)
    }
}

/// ENUMERATED field
#[derive(Debug, Clone, Copy, Default)]
pub struct BerEnumerated {
    pub range: Range,
}

impl BerEnumerated {
    pub const fn new() -> Self {
        Self {
            range: Range::UNBOUNDED,
        }
    }

    pub const fn ranged(min: i64, max: i64) -> Self {
        Self {
            range: Range::new(min, max),
        }
    }
}

impl FieldDecoder for BerEnumerated {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_enumerated(cx, input, self.range).map(|(next, _)| next)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BerBoolean;

impl FieldDecoder for BerBoolean {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_boolean(cx, input).map(|(next, _)| next)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BerNull;

impl FieldDecoder for BerNull {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_null(cx, input)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BerReal;

impl FieldDecoder for BerReal {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_real(cx, input).map(|(next, _)| next)
    }
}
