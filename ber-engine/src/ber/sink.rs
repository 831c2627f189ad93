//! Output side of the engine: decoded items and diagnostics
//!
//! The engine never builds a tree itself. Every decoded value is pushed to a
//! [`Sink`] as a [`DecodedItem`], composites are bracketed by
//! [`Sink::enter`]/[`Sink::leave`], and every recoverable problem is pushed as
//! a [`Diagnostic`]. [`Recorder`] is a simple sink that keeps everything in
//! memory.

use crate::ber::string::StringKind;
use crate::ber::types::BerTag;
use ber_core::{BitString, GeneralizedTime, ObjectIdentifier, UtcTime};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Interpreted content of one TLV
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value<'v> {
    Null,
    Boolean(bool),
    Integer(i64),
    Enumerated(i64),
    Real(f64),
    /// Uninterpreted content bytes (oversized integers, unknown primitives)
    Raw(Cow<'v, [u8]>),
    OctetString(Cow<'v, [u8]>),
    BitString(BitString),
    /// A named bit that is set in the enclosing BIT STRING
    Flag { bit: usize },
    ObjectIdentifier(ObjectIdentifier),
    String { kind: StringKind, text: Cow<'v, str> },
    GeneralizedTime(GeneralizedTime),
    UtcTime(UtcTime),
    /// Alternative selected by a CHOICE
    Choice { value: i32, alternative: &'static str },
    /// Opening item of a composite; children follow until [`Sink::leave`]
    Constructed,
    /// Identifier octets, only with `show_internals`
    Identifier(BerTag),
    /// Length octets, only with `show_internals`
    Length { length: usize, indefinite: bool },
    /// End-of-content marker, only with `show_internals`
    Eoc,
}

impl Value<'_> {
    /// Detach the value from the message buffer
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(b) => Value::Boolean(b),
            Value::Integer(i) => Value::Integer(i),
            Value::Enumerated(i) => Value::Enumerated(i),
            Value::Real(r) => Value::Real(r),
            Value::Raw(bytes) => Value::Raw(Cow::Owned(bytes.into_owned())),
            Value::OctetString(bytes) => Value::OctetString(Cow::Owned(bytes.into_owned())),
            Value::BitString(bits) => Value::BitString(bits),
            Value::Flag { bit } => Value::Flag { bit },
            Value::ObjectIdentifier(oid) => Value::ObjectIdentifier(oid),
            Value::String { kind, text } => Value::String {
                kind,
                text: Cow::Owned(text.into_owned()),
            },
            Value::GeneralizedTime(t) => Value::GeneralizedTime(t),
            Value::UtcTime(t) => Value::UtcTime(t),
            Value::Choice { value, alternative } => Value::Choice { value, alternative },
            Value::Constructed => Value::Constructed,
            Value::Identifier(tag) => Value::Identifier(tag),
            Value::Length { length, indefinite } => Value::Length { length, indefinite },
            Value::Eoc => Value::Eoc,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) | Value::Enumerated(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Raw(bytes) | Value::OctetString(bytes) => {
                for byte in bytes.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::BitString(bits) => write!(f, "{}", bits),
            Value::Flag { bit } => write!(f, "bit {}", bit),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::String { text, .. } => f.write_str(text),
            Value::GeneralizedTime(t) => write!(f, "{}", t),
            Value::UtcTime(t) => write!(f, "{}", t),
            Value::Choice { value, alternative } => write!(f, "{} ({})", alternative, value),
            Value::Constructed => Ok(()),
            Value::Identifier(tag) => write!(f, "{}", tag),
            Value::Length { length, indefinite } => {
                if *indefinite {
                    write!(f, "{} (indefinite)", length)
                } else {
                    write!(f, "{}", length)
                }
            }
            Value::Eoc => f.write_str("EOC"),
        }
    }
}

/// One decoded element, positioned in the message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedItem<'v> {
    /// Field or type name
    pub name: &'static str,
    /// Offset of the TLV (or of the part the item describes)
    pub offset: usize,
    pub length: usize,
    /// Tag as read from the wire; `None` when the header was stripped by the caller
    pub tag: Option<BerTag>,
    pub value: Value<'v>,
}

impl DecodedItem<'_> {
    pub fn into_owned(self) -> DecodedItem<'static> {
        DecodedItem {
            name: self.name,
            offset: self.offset,
            length: self.length,
            tag: self.tag,
            value: self.value.into_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    /// Legal but suspicious encoding
    Warning,
    /// Encoding violates the rules or the schema
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Content runs past the available bytes
    Truncated,
    /// Length octets cannot be used (too large, reserved form, no progress)
    InvalidLength,
    /// Identifier or content octets violate the encoding rules
    InvalidEncoding,
    /// Schema expected another tag at this position
    WrongField,
    /// TLV beyond the schema
    UnknownField,
    /// Mandatory SET member never seen
    MissingField,
    /// Children of a composite do not add up to its length
    LengthMismatch,
    /// Tag of a typed field is not the expected type
    UnexpectedType,
    EmptyChoice,
    ChoiceNotFound,
    /// A field decoder consumed nothing from a non-empty TLV
    EmptyField,
    UnexpectedCharacters,
    SizeConstraint,
    ValueConstraint,
    LeadingZeroBits,
    IllegalPadding,
    /// Nesting ceiling reached; decoding of the message stopped
    BoundsExceeded,
}

/// A recoverable problem found while decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub offset: usize,
    pub length: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} at {} (+{}): {}",
            self.severity, self.offset, self.length, self.message
        )
    }
}

/// Receiver of decoded items and diagnostics
pub trait Sink {
    fn item(&mut self, item: &DecodedItem<'_>);

    fn diagnostic(&mut self, diagnostic: Diagnostic);

    /// Open a composite; following items are its children
    fn enter(&mut self, item: &DecodedItem<'_>) {
        self.item(item);
    }

    /// Close the composite opened by the matching [`Sink::enter`]
    fn leave(&mut self) {}
}

/// An item kept by [`Recorder`] with its nesting level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub level: usize,
    pub item: DecodedItem<'static>,
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct Recorder {
    pub records: Vec<Record>,
    pub diagnostics: Vec<Diagnostic>,
    level: usize,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// First record with the given name
    pub fn find(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.item.name == name)
    }

    /// Values of all records with the given name, in order
    pub fn values(&self, name: &str) -> Vec<&Value<'static>> {
        self.records
            .iter()
            .filter(|r| r.item.name == name)
            .map(|r| &r.item.value)
            .collect()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    /// Current nesting level; zero once every composite has been closed
    pub fn level(&self) -> usize {
        self.level
    }
}

impl Sink for Recorder {
    fn item(&mut self, item: &DecodedItem<'_>) {
        self.records.push(Record {
            level: self.level,
            item: item.clone().into_owned(),
        });
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn enter(&mut self, item: &DecodedItem<'_>) {
        self.item(item);
        self.level += 1;
    }

    fn leave(&mut self) {
        self.level = self.level.saturating_sub(1);
    }
}
