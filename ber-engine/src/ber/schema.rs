//! Schema description: field descriptors, choice alternatives and the
//! decoder trait they point to
//!
//! Schemas are static tables. A SEQUENCE is described by a `&'static [Field]`
//! whose end marks the end of the schema; a CHOICE by a
//! `&'static [Alternative]`.
//!
//! ```
//! use ber_engine::ber::{BerBoolean, BerInteger, BerSequence, Field, FieldFlags, TagMatch};
//!
//! static VERSION: BerInteger = BerInteger::new();
//! static CRITICAL: BerBoolean = BerBoolean;
//! static FIELDS: &[Field] = &[
//!     Field::new("version", TagMatch::context(0), FieldFlags::IMPLICIT, &VERSION),
//!     Field::new("critical", TagMatch::context(1), FieldFlags::IMPLICIT.optional(), &CRITICAL),
//! ];
//! static RECORD: BerSequence = BerSequence::new(FIELDS);
//! ```

use crate::ber::context::DecodeContext;
use crate::ber::length::Header;
use crate::ber::types::{BerTag, BerTagClass};
use crate::ber::view::ByteView;
use ber_core::BerResult;

/// Everything a field decoder is handed
#[derive(Debug, Clone, Copy)]
pub struct Input<'v> {
    /// Bytes of the field; the view ends where the field ends
    pub view: ByteView<'v>,
    /// Position of the field's first byte
    pub offset: usize,
    /// The field's own header was already consumed by the caller and
    /// `offset` points at content octets
    pub implicit: bool,
    /// Name of the field in its parent schema
    pub name: &'static str,
    /// Header the caller stripped, if any
    pub outer: Option<Header>,
}

impl<'v> Input<'v> {
    pub fn new(view: ByteView<'v>, offset: usize, name: &'static str) -> Self {
        Self {
            view,
            offset,
            implicit: false,
            name,
            outer: None,
        }
    }

    /// Mark the input as content octets of an implicitly tagged field
    pub fn implicit(mut self, outer: Option<Header>) -> Self {
        self.implicit = true;
        self.outer = outer;
        self
    }

    /// Whether the stripped header announced a constructed encoding
    pub fn outer_constructed(&self) -> bool {
        self.outer.is_some_and(|h| h.tag.is_constructed())
    }

    pub fn remaining(&self) -> usize {
        self.view.remaining(self.offset)
    }
}

/// Decoder of one schema field
///
/// Implementations report values and diagnostics through the context and
/// return the offset right after what they consumed. Only fatal errors are
/// returned as `Err`.
pub trait FieldDecoder: Sync {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize>;
}

/// Tag a descriptor accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    Exact { class: BerTagClass, number: u32 },
    /// Any tag number of one class
    Class(BerTagClass),
    /// Any tag at all
    Any,
}

impl TagMatch {
    pub const fn universal(number: u32) -> Self {
        TagMatch::Exact {
            class: BerTagClass::Universal,
            number,
        }
    }

    pub const fn application(number: u32) -> Self {
        TagMatch::Exact {
            class: BerTagClass::Application,
            number,
        }
    }

    pub const fn context(number: u32) -> Self {
        TagMatch::Exact {
            class: BerTagClass::ContextSpecific,
            number,
        }
    }

    pub const fn private(number: u32) -> Self {
        TagMatch::Exact {
            class: BerTagClass::Private,
            number,
        }
    }

    pub fn matches(&self, tag: &BerTag) -> bool {
        match *self {
            TagMatch::Exact { class, number } => tag.class() == class && tag.number() == number,
            TagMatch::Class(class) => tag.class() == class,
            TagMatch::Any => true,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TagMatch::Any)
    }
}

/// Per-field flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldFlags {
    /// The field may be absent
    pub optional: bool,
    /// The field's tag replaces the type's own tag
    pub implicit: bool,
    /// Hand the whole TLV, header included, to the decoder
    pub no_own_tag: bool,
    /// Accept whatever tag is present
    pub no_check_tag: bool,
}

impl FieldFlags {
    pub const NONE: Self = Self {
        optional: false,
        implicit: false,
        no_own_tag: false,
        no_check_tag: false,
    };
    pub const OPTIONAL: Self = Self::NONE.optional();
    pub const IMPLICIT: Self = Self::NONE.implicit();
    pub const NO_OWN_TAG: Self = Self::NONE.no_own_tag();

    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub const fn implicit(mut self) -> Self {
        self.implicit = true;
        self
    }

    pub const fn no_own_tag(mut self) -> Self {
        self.no_own_tag = true;
        self
    }

    pub const fn no_check_tag(mut self) -> Self {
        self.no_check_tag = true;
        self
    }
}

/// One entry of a SEQUENCE or SET schema
#[derive(Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub expect: TagMatch,
    pub flags: FieldFlags,
    pub decoder: &'static dyn FieldDecoder,
}

impl Field {
    pub const fn new(
        name: &'static str,
        expect: TagMatch,
        flags: FieldFlags,
        decoder: &'static dyn FieldDecoder,
    ) -> Self {
        Self {
            name,
            expect,
            flags,
            decoder,
        }
    }

    pub fn accepts(&self, tag: &BerTag) -> bool {
        self.flags.no_check_tag || self.expect.matches(tag)
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("expect", &self.expect)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// One alternative of a CHOICE
#[derive(Clone, Copy)]
pub struct Alternative {
    /// Value reported when this alternative is selected
    pub value: i32,
    pub name: &'static str,
    pub expect: TagMatch,
    pub flags: FieldFlags,
    pub decoder: &'static dyn FieldDecoder,
}

impl Alternative {
    pub const fn new(
        value: i32,
        name: &'static str,
        expect: TagMatch,
        flags: FieldFlags,
        decoder: &'static dyn FieldDecoder,
    ) -> Self {
        Self {
            value,
            name,
            expect,
            flags,
            decoder,
        }
    }
}

impl std::fmt::Debug for Alternative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alternative")
            .field("value", &self.value)
            .field("name", &self.name)
            .field("expect", &self.expect)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// Hand one TLV to a field decoder
///
/// Unless `no_own_tag` is set the header is stripped, together with the EOC
/// of an indefinite TLV, and the decoder sees only the content. `view` must
/// already be bounded to the enclosing composite.
///
/// # Returns
/// `(start, next)` where `start` is the first offset the decoder was given,
/// so that `next == start` means nothing was consumed.
pub(crate) fn invoke(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'_>,
    header: &Header,
    name: &'static str,
    flags: FieldFlags,
    decoder: &dyn FieldDecoder,
) -> BerResult<(usize, usize)> {
    let input = if flags.no_own_tag {
        Input::new(view.limit(header.end()), header.offset, name)
    } else {
        cx.internals(header);
        let input = Input::new(view.limit(header.content_end()), header.content, name);
        if flags.implicit {
            input.implicit(Some(*header))
        } else {
            input
        }
    };
    let next = decoder.decode(cx, input)?;
    if !flags.no_own_tag && header.indefinite {
        cx.eoc(header.content_end());
    }
    Ok((input.offset, next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_match() {
        let tag = BerTag::context_specific(false, 3);
        assert!(TagMatch::context(3).matches(&tag));
        assert!(!TagMatch::context(2).matches(&tag));
        assert!(!TagMatch::application(3).matches(&tag));
        assert!(TagMatch::Class(BerTagClass::ContextSpecific).matches(&tag));
        assert!(TagMatch::Any.matches(&tag));
    }

    #[test]
    fn test_flags_builders() {
        let flags = FieldFlags::IMPLICIT.optional();
        assert!(flags.implicit && flags.optional);
        assert!(!flags.no_own_tag && !flags.no_check_tag);
        assert_eq!(FieldFlags::default(), FieldFlags::NONE);
    }

    struct Consume;

    impl FieldDecoder for Consume {
        fn decode(&self, _cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
            Ok(input.view.end())
        }
    }

    static CONSUME: Consume = Consume;

    #[test]
    fn test_field_accepts_no_check_tag() {
        let field = Field::new(
            "any",
            TagMatch::context(0),
            FieldFlags::NONE.no_check_tag(),
            &CONSUME,
        );
        assert!(field.accepts(&BerTag::universal(false, 2)));
    }

    #[test]
    fn test_invoke_strips_header() {
        use crate::ber::sink::Recorder;

        let data = [0xA0, 0x80, 0x05, 0x00, 0x00, 0x00];
        let mut recorder = Recorder::new();
        let mut cx = DecodeContext::new(&mut recorder, Default::default());
        let view = ByteView::new(&data);
        let header = cx.header(view, 0).unwrap();

        let stripped = invoke(&mut cx, view, &header, "f", FieldFlags::NONE, &CONSUME).unwrap();
        assert_eq!(stripped, (2, 4));

        let whole = invoke(&mut cx, view, &header, "f", FieldFlags::NO_OWN_TAG, &CONSUME).unwrap();
        assert_eq!(whole, (0, 6));
    }
}
