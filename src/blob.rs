//! Size-bounded blob encoding for inline images
//!
//! A figure serializes itself into a [`BlobSink`] which refuses to grow past
//! its byte budget. The first write that would cross the limit discards
//! everything buffered so far and poisons the sink, so peak memory never
//! exceeds the limit even for very large figures.
//!
//! Vector output skips the data URI: the markup is captured as text and
//! embedded directly, starting at its root `<svg` element.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use base64::Engine;

use crate::error::{DisplayError, Result};
use crate::figure::Figure;

/// Default byte budget for a single blob (25 MB)
pub const DEFAULT_SIZE_LIMIT: usize = 25_000_000;

/// Root tag searched for when trimming vector markup
const SVG_ROOT: &str = "<svg";

/// Output format requested from a figure
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    /// Inline vector markup
    Svg,
    /// Portable document, embedded as `application/pdf`
    Pdf,
    /// Any other format, embedded as `image/<name>`
    Raster(String),
}

impl ImageFormat {
    /// Parse a format name ("png", "SVG", "jpeg", ...)
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "svg" => Self::Svg,
            "pdf" => Self::Pdf,
            other => Self::Raster(other.to_string()),
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext.to_lowercase().as_str() {
                "jpg" => Self::Raster("jpeg".to_string()),
                other => Self::parse(other),
            })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::Raster(name) => name,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Svg)
    }

    /// MIME type for the data URI, or None for inline vector markup
    pub fn content_type(&self) -> Option<String> {
        match self {
            Self::Svg => None,
            Self::Pdf => Some("application/pdf".to_string()),
            Self::Raster(name) => Some(format!("image/{}", name)),
        }
    }
}

impl Default for ImageFormat {
    fn default() -> Self {
        Self::Raster("png".to_string())
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Write sink that aborts once cumulative bytes exceed its limit.
///
/// Finalizing consumes the sink, so it can only produce one payload.
#[derive(Debug)]
pub struct BlobSink {
    buf: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl BlobSink {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            overflowed: false,
        }
    }

    /// Bytes currently buffered
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether a write has crossed the limit
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Finalize the sink, returning the buffered bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.overflowed {
            return Err(DisplayError::Oversize { limit: self.limit });
        }
        Ok(self.buf)
    }
}

impl Write for BlobSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.overflowed || self.buf.len() + data.len() > self.limit {
            self.overflowed = true;
            self.buf = Vec::new();
            return Err(io::Error::other(DisplayError::Oversize { limit: self.limit }));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Extra attributes for the inline `<img>` element
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageAttrs {
    /// Let the user hide the image by clicking it
    pub toggle: bool,
    /// Keep the image when the terminal leaves the page
    pub exit_page: bool,
    /// Alternate text
    pub title: Option<String>,
    /// Stretch to the full terminal width
    pub fullscreen: bool,
}

impl ImageAttrs {
    fn render(&self) -> String {
        let mut attrs = String::new();
        if self.toggle {
            attrs.push_str(" toggle='yes'");
        }
        if self.exit_page {
            attrs.push_str(" exit_page='yes'");
        }
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            attrs.push_str(&format!(" alt='{}'", quote_attr(title)));
        }
        if self.fullscreen {
            attrs.push_str(" style='width: 100%'");
        }
        attrs
    }
}

fn quote_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('\'', "&#39;")
        .replace('<', "&lt;")
}

/// A content-typed payload that fit within its byte budget
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    content_type: String,
    data: Vec<u8>,
    size_limit: usize,
}

impl Blob {
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Raw bytes, never longer than `size_limit`
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size_limit(&self) -> usize {
        self.size_limit
    }

    /// Base64 form of the payload as embedded in the data URI
    pub fn payload(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Inline `<img>` markup carrying the payload as a data URI
    pub fn to_html(&self, attrs: &ImageAttrs) -> String {
        format!(
            "<img{} src=\"data:{};base64,{}\"/>",
            attrs.render(),
            self.content_type,
            self.payload()
        )
    }
}

/// Result of encoding a figure
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Encoded {
    /// Binary payload for a data URI
    Image(Blob),
    /// Vector markup starting at its root element
    Markup(String),
}

impl Encoded {
    pub fn to_html(&self, attrs: &ImageAttrs) -> String {
        match self {
            Self::Image(blob) => blob.to_html(attrs),
            Self::Markup(markup) => markup.clone(),
        }
    }
}

/// Build a blob from bytes already in memory
pub fn encode_bytes(content_type: &str, data: &[u8], size_limit: usize) -> Result<Blob> {
    let mut sink = BlobSink::new(size_limit);
    // The only possible write failure is the overflow, reported by finish()
    let _ = sink.write_all(data);
    Ok(Blob {
        content_type: content_type.to_string(),
        data: sink.finish()?,
        size_limit,
    })
}

/// Stream `source` through a bounded sink and encode it for embedding
pub fn encode<F: Figure + ?Sized>(
    source: &F,
    format: &ImageFormat,
    size_limit: usize,
) -> Result<Encoded> {
    let data = capture(source, format, size_limit)?;
    match format.content_type() {
        None => {
            let markup = String::from_utf8(data)?;
            Ok(Encoded::Markup(strip_to_root(&markup).to_string()))
        }
        Some(content_type) => Ok(Encoded::Image(Blob {
            content_type,
            data,
            size_limit,
        })),
    }
}

/// File-output mode: save straight to `path`, no protocol framing
pub fn write_file<F: Figure + ?Sized>(source: &F, path: &Path, format: &ImageFormat) -> Result<()> {
    log::debug!("saving figure to {} as {}", path.display(), format);
    source.save_to(path, format)?;
    Ok(())
}

fn capture<F: Figure + ?Sized>(
    source: &F,
    format: &ImageFormat,
    size_limit: usize,
) -> Result<Vec<u8>> {
    let mut sink = BlobSink::new(size_limit);
    if let Err(e) = source.write_to(&mut sink, format) {
        if sink.is_overflowed() {
            return Err(DisplayError::Oversize { limit: size_limit });
        }
        return Err(DisplayError::Io(e));
    }
    sink.finish()
}

/// Drop any prolog (XML declaration, doctype, comments) before the root tag
pub fn strip_to_root(markup: &str) -> &str {
    match markup.find(SVG_ROOT) {
        Some(start) => &markup[start..],
        None => markup,
    }
}
