//! CHOICE dispatcher

use crate::ber::context::DecodeContext;
use crate::ber::schema::{Alternative, FieldDecoder, Input};
use crate::ber::sequence::{Step, run_field};
use crate::ber::sink::{DecodedItem, DiagnosticKind, Severity, Value};
use crate::ber::unknown::walk_unknown;
use ber_core::BerResult;

/// Decode a CHOICE by selecting the alternative that matches the next TLV
///
/// Alternatives with an exact class/tag are tried before wildcard
/// alternatives. When the selected alternative consumes nothing inside an
/// optional scope the next candidate is tried; with no candidate left an
/// optional CHOICE returns the offset unchanged so the enclosing table can
/// move on.
///
/// # Returns
/// `(next_offset, selected alternative value)`
pub fn decode_choice(
    cx: &mut DecodeContext<'_>,
    input: Input<'_>,
    alternatives: &[Alternative],
) -> BerResult<(usize, Option<i32>)> {
    let view = input.view;
    if input.remaining() == 0 {
        cx.report(
            Severity::Malformed,
            DiagnosticKind::EmptyChoice,
            input.offset,
            0,
            format!("{}: empty CHOICE, no alternative present", input.name),
        );
        return Ok((input.offset, None));
    }

    let header = match cx.header(view, input.offset) {
        Ok(header) => header,
        Err(err) => return cx.recover(err, view, input.offset).map(|next| (next, None)),
    };
    let tag = header.tag;
    let end = header.end().min(view.end()).max(header.content);

    let exact = alternatives
        .iter()
        .filter(|alt| !alt.expect.is_any() && alt.expect.matches(&tag));
    let wildcard = alternatives.iter().filter(|alt| alt.expect.is_any());

    cx.nested(|cx| {
        for alt in exact.chain(wildcard) {
            // The selector opens the alternative's items but is dropped if
            // the alternative turns out to consume nothing
            cx.enter_deferred(DecodedItem {
                name: input.name,
                offset: header.offset,
                length: end - header.offset,
                tag: Some(tag),
                value: Value::Choice {
                    value: alt.value,
                    alternative: alt.name,
                },
            });
            let step = run_field(cx, view, &header, alt.name, alt.flags, alt.decoder);
            cx.leave_deferred(matches!(step, Ok(Step::Next(_))));
            match step? {
                Step::Next(next) => return Ok((next, Some(alt.value))),
                Step::Empty if cx.in_optional() => {
                    log::trace!("alternative {} consumed nothing, trying next", alt.name);
                }
                Step::Empty => {
                    cx.report(
                        Severity::Malformed,
                        DiagnosticKind::EmptyField,
                        header.offset,
                        end - header.offset,
                        format!("{}: alternative {} consumed no bytes", input.name, alt.name),
                    );
                    return Ok((end, None));
                }
            }
        }

        if cx.in_optional() {
            return Ok((input.offset, None));
        }
        cx.report(
            Severity::Malformed,
            DiagnosticKind::ChoiceNotFound,
            header.offset,
            end - header.offset,
            format!("{}: no alternative matches {}", input.name, tag),
        );
        if cx.config().decode_unexpected {
            walk_unknown(cx, view, header.offset)?;
        }
        Ok((end, None))
    })
}

/// CHOICE field
#[derive(Debug, Clone, Copy)]
pub struct BerChoice {
    pub alternatives: &'static [Alternative],
}

impl BerChoice {
    pub const fn new(alternatives: &'static [Alternative]) -> Self {
        Self { alternatives }
    }
}

impl FieldDecoder for BerChoice {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        decode_choice(cx, input, self.alternatives).map(|(next, _)| next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::primitive::{BerBoolean, BerInteger, BerNull};
    use crate::ber::schema::{Field, FieldFlags, TagMatch};
    use crate::ber::sequence::BerSequence;
    use crate::ber::sink::Recorder;
    use crate::ber::view::ByteView;
    use ber_core::DecoderConfig;

    static INTEGER: BerInteger = BerInteger::new();
    static BOOLEAN: BerBoolean = BerBoolean;
    static NULL: BerNull = BerNull;

    static TIME: BerChoice = BerChoice::new(&[
        Alternative::new(0, "seconds", TagMatch::context(0), FieldFlags::IMPLICIT, &INTEGER),
        Alternative::new(1, "enabled", TagMatch::context(1), FieldFlags::IMPLICIT, &BOOLEAN),
        Alternative::new(2, "count", TagMatch::universal(2), FieldFlags::NO_OWN_TAG, &INTEGER),
    ]);

    fn run(data: &[u8], offset: usize) -> ((usize, Option<i32>), Recorder) {
        let mut recorder = Recorder::new();
        let result = {
            let mut cx = DecodeContext::new(&mut recorder, DecoderConfig::default());
            let input = Input::new(ByteView::new(data), offset, "time");
            decode_choice(&mut cx, input, TIME.alternatives).unwrap()
        };
        (result, recorder)
    }

    #[test]
    fn test_choice_selects_by_tag() {
        let ((next, value), recorder) = run(&[0x81, 0x01, 0xFF], 0);
        assert_eq!((next, value), (3, Some(1)));
        assert_eq!(recorder.values("enabled"), vec![&Value::Boolean(true)]);
        assert_eq!(
            recorder.values("time"),
            vec![&Value::Choice {
                value: 1,
                alternative: "enabled"
            }]
        );

        let ((next, value), _) = run(&[0x02, 0x01, 0x07], 0);
        assert_eq!((next, value), (3, Some(2)));
    }

    #[test]
    fn test_selector_precedes_alternative() {
        let (_, recorder) = run(&[0x80, 0x01, 0x2A], 0);
        assert_eq!(recorder.records.len(), 2);
        assert_eq!(recorder.records[0].item.name, "time");
        assert_eq!(recorder.records[0].level, 0);
        assert_eq!(recorder.records[1].item.name, "seconds");
        assert_eq!(recorder.records[1].level, 1);
        assert_eq!(recorder.level(), 0);
    }

    #[test]
    fn test_empty_choice_reported() {
        let ((next, value), recorder) = run(&[0x05, 0x00], 2);
        assert_eq!((next, value), (2, None));
        assert_eq!(recorder.count(DiagnosticKind::EmptyChoice), 1);
    }

    #[test]
    fn test_choice_not_found() {
        let ((next, value), recorder) = run(&[0x83, 0x01, 0x00], 0);
        assert_eq!((next, value), (3, None));
        assert_eq!(recorder.count(DiagnosticKind::ChoiceNotFound), 1);
    }

    #[test]
    fn test_wildcard_after_exact() {
        static ANY_NULL: BerChoice = BerChoice::new(&[
            Alternative::new(9, "other", TagMatch::Any, FieldFlags::NO_OWN_TAG, &NULL),
            Alternative::new(0, "seconds", TagMatch::context(0), FieldFlags::IMPLICIT, &INTEGER),
        ]);
        let mut recorder = Recorder::new();
        {
            let mut cx = DecodeContext::new(&mut recorder, DecoderConfig::default());
            let data = [0x80, 0x01, 0x05, 0x05, 0x00];
            let view = ByteView::new(&data);
            let first = decode_choice(&mut cx, Input::new(view, 0, "c"), ANY_NULL.alternatives).unwrap();
            assert_eq!(first, (3, Some(0)));
            let second = decode_choice(&mut cx, Input::new(view, 3, "c"), ANY_NULL.alternatives).unwrap();
            assert_eq!(second, (5, Some(9)));
        }
        assert!(recorder.diagnostics.is_empty());
    }

    static OPTIONAL_CHOICE: BerSequence = BerSequence::new(&[
        Field::new("time", TagMatch::Any, FieldFlags::NO_OWN_TAG.optional(), &TIME),
        Field::new("flag", TagMatch::universal(1), FieldFlags::NO_OWN_TAG, &BOOLEAN),
    ]);

    /// Decoder that never consumes anything
    struct Nothing;

    impl FieldDecoder for Nothing {
        fn decode(&self, _cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
            Ok(input.offset)
        }
    }

    static NOTHING: Nothing = Nothing;

    static OVERLAPPING: BerChoice = BerChoice::new(&[
        Alternative::new(0, "placeholder", TagMatch::universal(2), FieldFlags::NO_OWN_TAG, &NOTHING),
        Alternative::new(1, "number", TagMatch::universal(2), FieldFlags::NO_OWN_TAG, &INTEGER),
    ]);

    static OPTIONAL_OVERLAPPING: BerSequence = BerSequence::new(&[Field::new(
        "value",
        TagMatch::Any,
        FieldFlags::NO_OWN_TAG.optional(),
        &OVERLAPPING,
    )]);

    static MANDATORY_OVERLAPPING: BerSequence = BerSequence::new(&[Field::new(
        "value",
        TagMatch::Any,
        FieldFlags::NO_OWN_TAG,
        &OVERLAPPING,
    )]);

    fn run_record(data: &[u8], root: &dyn FieldDecoder) -> (usize, Recorder) {
        let mut recorder = Recorder::new();
        let next = {
            let mut cx = DecodeContext::new(&mut recorder, DecoderConfig::default());
            root.decode(&mut cx, Input::new(ByteView::new(data), 0, "record"))
                .unwrap()
        };
        (next, recorder)
    }

    #[test]
    fn test_optional_choice_retries_after_empty_alternative() {
        let data = [0x30, 0x03, 0x02, 0x01, 0x07];
        let (next, recorder) = run_record(&data, &OPTIONAL_OVERLAPPING);
        assert_eq!(next, 5);
        assert_eq!(recorder.values("number"), vec![&Value::Integer(7)]);
        assert_eq!(
            recorder.values("value"),
            vec![&Value::Choice {
                value: 1,
                alternative: "number"
            }]
        );
        assert!(recorder.find("placeholder").is_none());
        assert!(recorder.diagnostics.is_empty());
    }

    #[test]
    fn test_mandatory_choice_reports_empty_alternative() {
        let data = [0x30, 0x03, 0x02, 0x01, 0x07];
        let (next, recorder) = run_record(&data, &MANDATORY_OVERLAPPING);
        assert_eq!(next, 5);
        assert_eq!(recorder.count(DiagnosticKind::EmptyField), 1);
        assert!(recorder.find("value").is_none());
        assert!(recorder.find("number").is_none());
    }

    #[test]
    fn test_optional_choice_absent_in_sequence() {
        let data = [0x30, 0x03, 0x01, 0x01, 0x00];
        let mut recorder = Recorder::new();
        let next = {
            let mut cx = DecodeContext::new(&mut recorder, DecoderConfig::default());
            OPTIONAL_CHOICE
                .decode(&mut cx, Input::new(ByteView::new(&data), 0, "record"))
                .unwrap()
        };
        assert_eq!(next, 5);
        assert!(recorder.find("time").is_none());
        assert_eq!(recorder.values("flag"), vec![&Value::Boolean(false)]);
        assert!(recorder.diagnostics.is_empty());
    }
}
