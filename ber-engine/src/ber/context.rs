//! Per-message decoding state
//!
//! A [`DecodeContext`] travels through every decoder by `&mut`. It owns the
//! recursion guard, the reassembly store and the optional-scope flag of one
//! message and forwards items and diagnostics to the caller's [`Sink`].

use crate::ber::guard::RecursionGuard;
use crate::ber::length::{Header, read_header};
use crate::ber::reassembly::ReassemblyStore;
use crate::ber::sink::{DecodedItem, Diagnostic, DiagnosticKind, Severity, Sink, Value};
use crate::ber::view::ByteView;
use ber_core::{BerError, BerResult, DecoderConfig};

pub struct DecodeContext<'s> {
    sink: &'s mut dyn Sink,
    config: DecoderConfig,
    guard: RecursionGuard,
    store: ReassemblyStore,
    optional: bool,
    /// Composites opened with `enter_deferred`; the flag is set once the
    /// opening item has been forwarded to the sink
    deferred: Vec<(DecodedItem<'static>, bool)>,
}

impl<'s> DecodeContext<'s> {
    pub fn new(sink: &'s mut dyn Sink, config: DecoderConfig) -> Self {
        let guard = RecursionGuard::new(config.max_depth);
        Self {
            sink,
            config,
            guard,
            store: ReassemblyStore::new(),
            optional: false,
            deferred: Vec::new(),
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn guard(&self) -> RecursionGuard {
        self.guard
    }

    /// Whether the value being decoded belongs to an OPTIONAL field
    pub fn in_optional(&self) -> bool {
        self.optional
    }

    pub(crate) fn store_mut(&mut self) -> &mut ReassemblyStore {
        &mut self.store
    }

    /// Read the TLV header at `offset` at the current depth
    pub fn header(&self, view: ByteView<'_>, offset: usize) -> BerResult<Header> {
        read_header(view, offset, self.guard)
    }

    /// Run `f` one nesting level deeper
    ///
    /// # Error Handling
    /// Fails with [`BerError::BoundsExceeded`] without running `f` when the
    /// ceiling is reached.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> BerResult<T>) -> BerResult<T> {
        let outer = self.guard;
        self.guard = outer.enter()?;
        let result = f(self);
        self.guard = outer;
        result
    }

    /// Run `f` with the optional-scope flag set to `optional`
    pub fn with_optional<T>(&mut self, optional: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        let outer = self.optional;
        self.optional = optional;
        let result = f(self);
        self.optional = outer;
        result
    }

    pub fn emit(&mut self, item: &DecodedItem<'_>) {
        self.flush_deferred();
        self.sink.item(item);
    }

    pub fn enter(&mut self, item: &DecodedItem<'_>) {
        self.flush_deferred();
        self.sink.enter(item);
    }

    pub fn leave(&mut self) {
        self.sink.leave();
    }

    /// Open a composite whose opening item reaches the sink only when
    /// something is emitted inside it or it is closed with `keep`
    pub(crate) fn enter_deferred(&mut self, item: DecodedItem<'static>) {
        self.deferred.push((item, false));
    }

    /// Close the composite opened by the matching [`Self::enter_deferred`]
    ///
    /// An empty composite is dropped unless `keep` is set.
    pub(crate) fn leave_deferred(&mut self, keep: bool) {
        let Some((item, open)) = self.deferred.pop() else {
            return;
        };
        if open {
            self.sink.leave();
        } else if keep {
            self.flush_deferred();
            self.sink.enter(&item);
            self.sink.leave();
        }
    }

    fn flush_deferred(&mut self) {
        for (item, open) in self.deferred.iter_mut().filter(|(_, open)| !*open) {
            self.sink.enter(item);
            *open = true;
        }
    }

    /// Push a diagnostic to the sink
    pub fn report(
        &mut self,
        severity: Severity,
        kind: DiagnosticKind,
        offset: usize,
        length: usize,
        message: impl Into<String>,
    ) {
        let message = message.into();
        log::debug!("{:?} {:?} at {}: {}", severity, kind, offset, message);
        self.sink.diagnostic(Diagnostic {
            severity,
            kind,
            offset,
            length,
            message,
        });
    }

    /// Turn a low-level error into a diagnostic and skip to the end of `view`
    ///
    /// # Returns
    /// The end offset of `view`, or the error itself when it is fatal.
    pub fn recover(&mut self, err: BerError, view: ByteView<'_>, offset: usize) -> BerResult<usize> {
        if err.is_fatal() {
            return Err(err);
        }
        let kind = match err {
            BerError::Truncated { .. } => DiagnosticKind::Truncated,
            BerError::LengthTooLarge { .. } | BerError::NoProgress { .. } => {
                DiagnosticKind::InvalidLength
            }
            _ => DiagnosticKind::InvalidEncoding,
        };
        let at = err.offset().unwrap_or(offset);
        self.report(
            Severity::Malformed,
            kind,
            at,
            view.remaining(at),
            err.to_string(),
        );
        Ok(view.end().max(offset))
    }

    /// Emit identifier and length items when `show_internals` is set
    pub fn internals(&mut self, header: &Header) {
        if !self.config.show_internals {
            return;
        }
        self.flush_deferred();
        let length_offset = header.length_offset;
        self.sink.item(&DecodedItem {
            name: "identifier",
            offset: header.offset,
            length: length_offset - header.offset,
            tag: Some(header.tag),
            value: Value::Identifier(header.tag),
        });
        self.sink.item(&DecodedItem {
            name: "length",
            offset: length_offset,
            length: header.content - length_offset,
            tag: None,
            value: Value::Length {
                length: header.length,
                indefinite: header.indefinite,
            },
        });
    }

    /// Emit the EOC marker item when `show_internals` is set
    pub fn eoc(&mut self, offset: usize) {
        if self.config.show_internals {
            self.emit(&DecodedItem {
                name: "eoc",
                offset,
                length: 2,
                tag: None,
                value: Value::Eoc,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::sink::Recorder;

    #[test]
    fn test_nested_restores_guard() {
        let mut recorder = Recorder::new();
        let mut cx = DecodeContext::new(&mut recorder, DecoderConfig::default());
        let depth = cx
            .nested(|cx| cx.nested(|cx| Ok(cx.guard().depth())))
            .unwrap();
        assert_eq!(depth, 2);
        assert_eq!(cx.guard().depth(), 0);
    }

    #[test]
    fn test_nested_stops_at_ceiling() {
        let mut recorder = Recorder::new();
        let config = DecoderConfig::default().with_max_depth(1);
        let mut cx = DecodeContext::new(&mut recorder, config);
        let result = cx.nested(|cx| cx.nested(|_| Ok(())));
        assert_eq!(result, Err(BerError::BoundsExceeded { depth: 2, limit: 1 }));
        assert_eq!(cx.guard().depth(), 0);
    }

    #[test]
    fn test_recover_reports_and_skips() {
        let mut recorder = Recorder::new();
        let data = [0x02, 0x05, 0x01];
        {
            let mut cx = DecodeContext::new(&mut recorder, DecoderConfig::default());
            let view = ByteView::new(&data);
            let err = BerError::Truncated {
                offset: 2,
                needed: 5,
                available: 1,
            };
            assert_eq!(cx.recover(err, view, 0), Ok(3));
            let fatal = BerError::BoundsExceeded { depth: 501, limit: 500 };
            assert!(cx.recover(fatal, view, 0).is_err());
        }
        assert_eq!(recorder.diagnostics.len(), 1);
        assert_eq!(recorder.diagnostics[0].kind, DiagnosticKind::Truncated);
        assert_eq!(recorder.diagnostics[0].offset, 2);
    }

    fn selector(name: &'static str) -> DecodedItem<'static> {
        DecodedItem {
            name,
            offset: 0,
            length: 3,
            tag: None,
            value: Value::Choice {
                value: 0,
                alternative: name,
            },
        }
    }

    #[test]
    fn test_deferred_composites() {
        let mut recorder = Recorder::new();
        {
            let mut cx = DecodeContext::new(&mut recorder, DecoderConfig::default());
            // Dropped: nothing emitted inside
            cx.enter_deferred(selector("dropped"));
            cx.leave_deferred(false);

            cx.enter_deferred(selector("outer"));
            cx.enter_deferred(selector("inner"));
            cx.emit(&selector("leaf"));
            cx.leave_deferred(true);
            cx.leave_deferred(true);

            // Kept although empty
            cx.enter_deferred(selector("empty"));
            cx.leave_deferred(true);
        }
        let names: Vec<_> = recorder.records.iter().map(|r| (r.item.name, r.level)).collect();
        assert_eq!(names, vec![("outer", 0), ("inner", 1), ("leaf", 2), ("empty", 0)]);
        assert_eq!(recorder.level(), 0);
    }

    #[test]
    fn test_internals_items() {
        let mut recorder = Recorder::new();
        let data = [0x9F, 0x21, 0x81, 0x01, 0x00];
        {
            let config = DecoderConfig::default().with_show_internals(true);
            let mut cx = DecodeContext::new(&mut recorder, config);
            let header = cx.header(ByteView::new(&data), 0).unwrap();
            cx.internals(&header);
        }
        let identifier = recorder.find("identifier").unwrap();
        assert_eq!(identifier.item.length, 2);
        let length = recorder.find("length").unwrap();
        assert_eq!(length.item.offset, 2);
        assert_eq!(length.item.length, 2);
    }
}
