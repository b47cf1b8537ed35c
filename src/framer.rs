//! Escape-sequence framing for rendered markup
//!
//! Wraps a body in one of the two DomTerm envelopes:
//! - append: a new element the terminal keeps as a replace target for `key`
//! - overwrite: replaces whatever was last appended under `key`
//!
//! Bodies are passed through untouched. Embedded control bytes are not
//! filtered, so callers must only frame content they trust.

use std::fmt;
use std::io::Write;

use crate::escape;

/// Which envelope to emit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeKind {
    /// Append a new, replaceable element
    Append,
    /// Overwrite the element previously appended under the same key
    Overwrite,
}

impl EnvelopeKind {
    pub fn from_overwrite(overwrite: bool) -> Self {
        if overwrite {
            Self::Overwrite
        } else {
            Self::Append
        }
    }
}

/// A framed body ready to be written to the terminal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub kind: EnvelopeKind,
    pub key: &'a str,
    pub body: &'a str,
}

impl<'a> Envelope<'a> {
    pub fn new(body: &'a str, key: &'a str, overwrite: bool) -> Self {
        Self {
            kind: EnvelopeKind::from_overwrite(overwrite),
            key,
            body,
        }
    }
}

impl fmt::Display for Envelope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EnvelopeKind::Append => write!(
                f,
                concat!(
                    "{}<div class='can-replace-children' replace-key='{}' ",
                    "style='overflow-x: auto'>{}</div>{}",
                ),
                escape::HTML_START,
                self.key,
                self.body,
                escape::OSC_END
            ),
            EnvelopeKind::Overwrite => f.write_str(&escape::replace_html(self.key, self.body)),
        }
    }
}

/// Frame `body` for the slot `key` and return the emitted text
pub fn frame(body: &str, key: &str, overwrite: bool) -> String {
    Envelope::new(body, key, overwrite).to_string()
}

/// Frame `body` and write it to `out` in a single call
pub fn emit<W: Write + ?Sized>(
    out: &mut W,
    body: &str,
    key: &str,
    overwrite: bool,
) -> std::io::Result<()> {
    out.write_all(frame(body, key, overwrite).as_bytes())?;
    out.flush()
}

/// Write markup in the basic print envelope (not replaceable)
pub fn print_html<W: Write + ?Sized>(out: &mut W, body: &str) -> std::io::Result<()> {
    out.write_all(escape::html(body).as_bytes())?;
    out.flush()
}
