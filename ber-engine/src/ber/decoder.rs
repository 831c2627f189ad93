//! Top-level BER decoder
//!
//! [`BerDecoder`] is the entry point for one message: it builds a fresh
//! [`DecodeContext`] per call, runs the root field decoder (or the generic
//! walker) and turns a fatal recursion error into a final diagnostic.
//!
//! # Usage Example
//!
//! ```rust
//! use ber_engine::ber::{BerDecoder, BerInteger, Recorder, Value};
//! use ber_core::DecoderConfig;
//!
//! static ROOT: BerInteger = BerInteger::new();
//!
//! let decoder = BerDecoder::with_config(DecoderConfig::default().with_show_internals(true));
//! let mut recorder = Recorder::new();
//! let next = decoder.decode(&[0x02, 0x01, 0x05], &ROOT, &mut recorder).unwrap();
//! assert_eq!(next, 3);
//! assert_eq!(recorder.values("message"), vec![&Value::Integer(5)]);
//! ```

use crate::ber::context::DecodeContext;
use crate::ber::primitive::{Locate, accept, skip_unexpected};
use crate::ber::schema::{FieldDecoder, Input};
use crate::ber::sink::{DiagnosticKind, Severity, Sink};
use crate::ber::types::BerTagClass;
use crate::ber::unknown::walk_unknown;
use crate::ber::view::ByteView;
use ber_core::{BerResult, DecoderConfig};

/// Name of the item produced by the root field
pub const ROOT_NAME: &str = "message";

/// BER decoder for whole messages
///
/// The decoder holds only its configuration and can be shared between
/// threads; every call decodes with its own context.
#[derive(Debug, Clone, Default)]
pub struct BerDecoder {
    config: DecoderConfig,
}

impl BerDecoder {
    /// Create a decoder with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode `data` with `root` as the outermost field
    ///
    /// # Returns
    /// The offset reached by the root decoder. Malformed input is reported
    /// to `sink` and does not fail the call.
    ///
    /// # Error Handling
    /// Returns [`ber_core::BerError::BoundsExceeded`] when the nesting ceiling is hit;
    /// a `BoundsExceeded` diagnostic is pushed to `sink` first.
    pub fn decode(&self, data: &[u8], root: &dyn FieldDecoder, sink: &mut dyn Sink) -> BerResult<usize> {
        let view = ByteView::new(data);
        let mut cx = DecodeContext::new(sink, self.config.clone());
        let result = root.decode(&mut cx, Input::new(view, 0, ROOT_NAME));
        finish(&mut cx, view, result)
    }

    /// Decode `data` without a schema, walking every TLV generically
    pub fn decode_unknown(&self, data: &[u8], sink: &mut dyn Sink) -> BerResult<usize> {
        let view = ByteView::new(data);
        let mut cx = DecodeContext::new(sink, self.config.clone());
        let mut offset = 0;
        let mut result = Ok(0);
        while offset < view.end() {
            result = walk_unknown(&mut cx, view, offset);
            match result {
                Ok(next) => offset = next,
                Err(_) => break,
            }
        }
        finish(&mut cx, view, result)
    }
}

fn finish(cx: &mut DecodeContext<'_>, view: ByteView<'_>, result: BerResult<usize>) -> BerResult<usize> {
    match result {
        Ok(next) => {
            if cx.store_mut().pending() > 0 {
                log::debug!("{} reassembly records left unfinished", cx.store_mut().pending());
            }
            Ok(next)
        }
        Err(err) if err.is_fatal() => {
            log::warn!("Decoding aborted: {}", err);
            cx.report(
                Severity::Malformed,
                DiagnosticKind::BoundsExceeded,
                0,
                view.end(),
                err.to_string(),
            );
            Err(err)
        }
        Err(err) => cx.recover(err, view, 0),
    }
}

/// Explicitly tagged field: `[class number] EXPLICIT inner`
///
/// Checks the outer tag, strips it and hands the content to `inner`.
#[derive(Clone, Copy)]
pub struct BerTagged {
    pub class: BerTagClass,
    pub number: u32,
    pub inner: &'static dyn FieldDecoder,
}

impl BerTagged {
    pub const fn new(class: BerTagClass, number: u32, inner: &'static dyn FieldDecoder) -> Self {
        Self {
            class,
            number,
            inner,
        }
    }

    pub const fn context(number: u32, inner: &'static dyn FieldDecoder) -> Self {
        Self::new(BerTagClass::ContextSpecific, number, inner)
    }
}

impl std::fmt::Debug for BerTagged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BerTagged")
            .field("class", &self.class)
            .field("number", &self.number)
            .finish_non_exhaustive()
    }
}

impl FieldDecoder for BerTagged {
    fn decode(&self, cx: &mut DecodeContext<'_>, input: Input<'_>) -> BerResult<usize> {
        // An implicit tag replaced ours; the content is the inner TLV
        if input.implicit {
            let content = Input::new(input.view, input.offset, input.name);
            return cx.with_optional(false, |cx| self.inner.decode(cx, content));
        }

        let view = input.view;
        let header = match cx.header(view, input.offset) {
            Ok(header) => header,
            Err(err) => return cx.recover(err, view, input.offset),
        };
        let expected = format!("[{} {}]", self.class.name(), self.number);
        let loc = if header.tag.class() == self.class && header.tag.number() == self.number {
            Locate::Found(accept(cx, view, &header, &expected))
        } else {
            Locate::Skipped(skip_unexpected(cx, view, &header, &expected)?)
        };
        let loc = match loc {
            Locate::Found(loc) => loc,
            Locate::Skipped(next) => return Ok(next),
        };

        let content = Input::new(view.limit(loc.content_end), loc.content, input.name);
        // The tag is present, so the inner value is not optional
        cx.nested(|cx| cx.with_optional(false, |cx| self.inner.decode(cx, content)))?;
        if loc.indefinite {
            cx.eoc(loc.content_end);
        }
        Ok(loc.end)
    }
}
