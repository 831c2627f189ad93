//! OBJECT IDENTIFIER and RELATIVE-OID decoding

use crate::ber::context::DecodeContext;
use crate::ber::primitive::{Locate, Located, locate, reject_constructed};
use crate::ber::schema::{FieldDecoder, Input};
use crate::ber::sink::{DiagnosticKind, Severity, Value};
use crate::ber::types::universal;
use ber_core::{BerResult, ObjectIdentifier};
use std::borrow::Cow;

pub(crate) fn oid_content(
    cx: &mut DecodeContext<'_>,
    name: &'static str,
    loc: &Located<'_>,
    relative: bool,
) -> Option<ObjectIdentifier> {
    if reject_constructed(cx, name, loc) {
        return None;
    }
    let decoded = if relative {
        ObjectIdentifier::decode_relative(loc.bytes)
    } else {
        ObjectIdentifier::decode(loc.bytes)
    };
    match decoded {
        Ok(oid) => {
            cx.emit(&loc.item(name, Value::ObjectIdentifier(oid.clone())));
            Some(oid)
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

pub fn decode_object_identifier(
    cx: &mut DecodeContext<'_>,
    input: Input<'_>,
) -> BerResult<(usize, Option<ObjectIdentifier>)> {
    match locate(cx, input, universal::OBJECT_IDENTIFIER)? {
        Locate::Skipped(next) => Ok((next, None)),
        Locate::Found(loc) => Ok((loc.end, oid_content(cx, input.name, &loc, false))),
    }
}

pub fn decode_relative_oid(
    cx: &mut DecodeContext<'_>,
    input: Input<'_>,
) -> BerResult<(usize, Option<ObjectIdentifier>)> {
    match locate(cx, input, universal::RELATIVE_OID)? {
        Locate::Skipped(next) => Ok((next, None)),
        Locate::Found(loc) => Ok((loc.end, oid_content(cx, input.name, &loc, true))),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BerObjectId;

impl FieldDecoder for BerObjectId {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_object_identifier(cx, input).map(|(next, _)| next)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BerRelativeOid;

impl FieldDecoder for BerRelativeOid {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_relative_oid(cx, input).map(|(next, _)| next)
    }
}
