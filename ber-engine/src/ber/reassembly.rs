//! Reassembly of constructed (segmented) string encodings
//!
//! A constructed OCTET STRING or restricted string carries its value as a
//! series of primitive segments, possibly nested in further constructed
//! segments. The segments are concatenated in order; a value made of a
//! single segment is returned as a borrow of the message without copying.

use crate::ber::context::DecodeContext;
use crate::ber::sink::{DecodedItem, DiagnosticKind, Severity, Value};
use crate::ber::types::{BerTagClass, universal};
use crate::ber::view::ByteView;
use ber_core::BerResult;
use bytes::{Bytes, BytesMut};
use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Deref;

/// Partially reassembled value
#[derive(Debug)]
pub struct ReassemblyRecord {
    data: BytesMut,
    /// More segments are expected
    more: bool,
}

/// Per-message table of values under reassembly
#[derive(Debug, Default)]
pub struct ReassemblyStore {
    records: HashMap<u32, ReassemblyRecord>,
    next_id: u32,
}

impl ReassemblyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an id for a new value
    pub fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Append a segment to record `id`, creating the record on first use
    ///
    /// # Returns
    /// The complete value when `more` is false; the record is removed.
    pub fn add_segment(&mut self, id: u32, segment: &[u8], more: bool) -> Option<Bytes> {
        let record = self.records.entry(id).or_insert_with(|| ReassemblyRecord {
            data: BytesMut::new(),
            more: true,
        });
        record.data.extend_from_slice(segment);
        record.more = more;
        if more {
            return None;
        }
        self.records.remove(&id).map(|r| r.data.freeze())
    }

    /// Remove an unfinished record and return what it collected
    pub fn take(&mut self, id: u32) -> Option<Bytes> {
        self.records.remove(&id).map(|r| r.data.freeze())
    }

    pub fn is_pending(&self, id: u32) -> bool {
        self.records.get(&id).is_some_and(|r| r.more)
    }

    /// Number of records still waiting for segments
    pub fn pending(&self) -> usize {
        self.records.values().filter(|r| r.more).count()
    }
}

/// Content of a possibly segmented string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassembled<'v> {
    /// One segment, borrowed from the message at `offset`
    Single { offset: usize, bytes: &'v [u8] },
    /// Several segments joined into a new buffer
    Joined(Bytes),
    /// No segments at all
    Empty,
}

impl Reassembled<'_> {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Reassembled::Single { bytes, .. } => bytes,
            Reassembled::Joined(bytes) => bytes,
            Reassembled::Empty => &[],
        }
    }

    pub fn is_joined(&self) -> bool {
        matches!(self, Reassembled::Joined(_))
    }
}

impl Deref for Reassembled<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

struct Segments<'v> {
    id: u32,
    count: usize,
    single: Option<(usize, &'v [u8])>,
    joined: Option<Bytes>,
}

impl<'v> Segments<'v> {
    fn push(&mut self, store: &mut ReassemblyStore, offset: usize, bytes: &'v [u8], last: bool) {
        self.count += 1;
        if self.count == 1 && last {
            self.single = Some((offset, bytes));
            return;
        }
        if let Some(joined) = store.add_segment(self.id, bytes, !last) {
            self.joined = Some(joined);
        }
    }
}

/// Reassemble the segments found between `start` and `end`
///
/// `segment_tag` is the universal tag segments are expected to carry;
/// OCTET STRING segments are always accepted. Other tags are reported as a
/// warning and their content is still appended. With reassembly disabled in
/// the configuration every segment is emitted as its own item and the
/// result is [`Reassembled::Empty`].
pub fn reassemble<'v>(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'v>,
    start: usize,
    end: usize,
    segment_tag: u32,
) -> BerResult<Reassembled<'v>> {
    let id = cx.store_mut().allocate();
    let mut segments = Segments {
        id,
        count: 0,
        single: None,
        joined: None,
    };
    cx.nested(|cx| collect(cx, view.limit(end), start, end, segment_tag, true, &mut segments))?;

    if let Some((offset, bytes)) = segments.single {
        return Ok(Reassembled::Single { offset, bytes });
    }
    if let Some(joined) = segments.joined {
        return Ok(Reassembled::Joined(joined));
    }
    // No terminal segment was seen (empty trailing group or decoding stopped)
    if !cx.store_mut().is_pending(id) {
        return Ok(Reassembled::Empty);
    }
    log::debug!("segmented value {} ended without a terminal segment", id);
    Ok(cx
        .store_mut()
        .take(id)
        .map_or(Reassembled::Empty, Reassembled::Joined))
}

fn collect<'v>(
    cx: &mut DecodeContext<'_>,
    view: ByteView<'v>,
    start: usize,
    end: usize,
    segment_tag: u32,
    last_group: bool,
    segments: &mut Segments<'v>,
) -> BerResult<()> {
    let mut offset = start;
    while offset < end {
        let header = match cx.header(view, offset) {
            Ok(header) => header,
            Err(err) => {
                cx.recover(err, view, offset)?;
                break;
            }
        };
        let tag = header.tag;
        let seg_end = header.end().min(end);
        let last = last_group && header.end() >= end;

        if tag.class() != BerTagClass::Universal
            || (tag.number() != segment_tag && tag.number() != universal::OCTET_STRING)
        {
            cx.report(
                Severity::Warning,
                DiagnosticKind::UnexpectedType,
                header.offset,
                seg_end - header.offset,
                format!("Unexpected segment tag: {}", tag),
            );
        }

        if tag.is_constructed() {
            let inner_end = header.content_end().min(end);
            cx.nested(|cx| collect(cx, view, header.content, inner_end, segment_tag, last, segments))?;
        } else {
            if header.end() > end {
                cx.report(
                    Severity::Malformed,
                    DiagnosticKind::Truncated,
                    header.content,
                    view.remaining(header.content),
                    format!(
                        "Segment length {} is larger than the remaining {} bytes",
                        header.length,
                        view.remaining(header.content)
                    ),
                );
            }
            let bytes = view.window(header.content, header.content_end());
            if cx.config().allow_reassembly {
                segments.push(cx.store_mut(), header.content, bytes, last);
            } else {
                cx.emit(&DecodedItem {
                    name: "segment",
                    offset: header.offset,
                    length: seg_end - header.offset,
                    tag: Some(tag),
                    value: Value::OctetString(Cow::Borrowed(bytes)),
                });
            }
        }
        offset = header.end();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::sink::Recorder;
    use ber_core::DecoderConfig;

    fn run(data: &[u8], config: DecoderConfig) -> (Vec<u8>, bool, Recorder) {
        let mut recorder = Recorder::new();
        let (bytes, joined) = {
            let mut cx = DecodeContext::new(&mut recorder, config);
            let view = ByteView::new(data);
            let header = cx.header(view, 0).unwrap();
            let value = reassemble(
                &mut cx,
                view,
                header.content,
                header.content_end(),
                universal::OCTET_STRING,
            )
            .unwrap();
            assert_eq!(cx.store_mut().pending(), 0);
            (value.to_vec(), value.is_joined())
        };
        (bytes, joined, recorder)
    }

    #[test]
    fn test_store_segments() {
        let mut store = ReassemblyStore::new();
        let id = store.allocate();
        assert_eq!(store.add_segment(id, b"ab", true), None);
        assert!(store.is_pending(id));
        assert_eq!(store.add_segment(id, b"cd", true), None);
        assert_eq!(store.add_segment(id, b"e", false), Some(Bytes::from_static(b"abcde")));
        assert_eq!(store.pending(), 0);
        assert_ne!(store.allocate(), id);
    }

    #[test]
    fn test_definite_segments_joined() {
        // Constructed OCTET STRING { "AB", "CD" }
        let data = [0x24, 0x08, 0x04, 0x02, 0x41, 0x42, 0x04, 0x02, 0x43, 0x44];
        let (bytes, joined, recorder) = run(&data, DecoderConfig::default());
        assert_eq!(bytes, b"ABCD");
        assert!(joined);
        assert!(recorder.diagnostics.is_empty());
    }

    #[test]
    fn test_indefinite_nested_segments() {
        // 24 80 { 04 01 'A', 24 80 { 04 01 'B', 04 01 'C' } 00 00 } 00 00
        let data = [
            0x24, 0x80, 0x04, 0x01, 0x41, 0x24, 0x80, 0x04, 0x01, 0x42, 0x04, 0x01, 0x43, 0x00,
            0x00, 0x00, 0x00,
        ];
        let (bytes, joined, _) = run(&data, DecoderConfig::default());
        assert_eq!(bytes, b"ABC");
        assert!(joined);
    }

    #[test]
    fn test_single_segment_is_borrowed() {
        let data = [0x24, 0x04, 0x04, 0x02, 0x41, 0x42];
        let mut recorder = Recorder::new();
        let mut cx = DecodeContext::new(&mut recorder, DecoderConfig::default());
        let view = ByteView::new(&data);
        let value = reassemble(&mut cx, view, 2, 6, universal::OCTET_STRING).unwrap();
        assert_eq!(
            value,
            Reassembled::Single {
                offset: 4,
                bytes: &data[4..6]
            }
        );
    }

    #[test]
    fn test_unterminated_segments_are_flushed() {
        // Second segment header is cut off inside its length octets
        let data = [0x24, 0x05, 0x04, 0x01, 0x41, 0x04, 0x85];
        let (bytes, joined, recorder) = run(&data, DecoderConfig::default());
        assert_eq!(bytes, b"A");
        assert!(joined);
        assert_eq!(recorder.diagnostics.len(), 1);
    }

    #[test]
    fn test_pending_counts_open_records() {
        let mut store = ReassemblyStore::new();
        let first = store.allocate();
        let second = store.allocate();
        store.add_segment(first, b"a", true);
        store.add_segment(second, b"b", true);
        assert_eq!(store.pending(), 2);
        assert_eq!(store.take(first), Some(Bytes::from_static(b"a")));
        assert!(!store.is_pending(first));
        assert_eq!(store.pending(), 1);
    }

    #[test]
    fn test_empty_constructed() {
        let data = [0x24, 0x00];
        let (bytes, joined, _) = run(&data, DecoderConfig::default());
        assert!(bytes.is_empty());
        assert!(!joined);
    }

    #[test]
    fn test_unexpected_segment_tag_warns() {
        let data = [0x24, 0x06, 0x02, 0x01, 0x41, 0x04, 0x01, 0x42];
        let (bytes, _, recorder) = run(&data, DecoderConfig::default());
        assert_eq!(bytes, b"AB");
        assert_eq!(recorder.count(DiagnosticKind::UnexpectedType), 1);
        assert_eq!(recorder.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_reassembly_disabled_emits_segments() {
        let data = [0x24, 0x08, 0x04, 0x02, 0x41, 0x42, 0x04, 0x02, 0x43, 0x44];
        let config = DecoderConfig::default().with_allow_reassembly(false);
        let (bytes, _, recorder) = run(&data, config);
        assert!(bytes.is_empty());
        assert_eq!(recorder.values("segment").len(), 2);
    }
}
