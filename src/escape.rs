//! DomTerm escape sequence constants and helpers
//!
//! This module centralizes every control sequence inlay writes, providing
//! readable names for the raw OSC/CSI codes of the display protocol.

// === HTML Envelopes ===

/// Start of an append envelope (OSC 72), followed by markup and BEL
pub const HTML_START: &str = "\x1b]72;";

/// Start of an overwrite envelope (OSC 721), followed by `key;markup` and BEL
pub const REPLACE_START: &str = "\x1b]721;";

/// Terminator for OSC sequences
pub const OSC_END: &str = "\x07";

/// Insert markup as-is (OSC 72)
#[inline]
pub fn html(body: &str) -> String {
    format!("{}{}{}", HTML_START, body, OSC_END)
}

/// Replace the children of the element tagged with `key` (OSC 721)
#[inline]
pub fn replace_html(key: &str, body: &str) -> String {
    format!("{}{};{}{}", REPLACE_START, key, body, OSC_END)
}

// === OSC 8 Hyperlinks ===

/// Close an open OSC 8 hyperlink
pub const HYPERLINK_END: &str = "\x1b]8;;\x07";

/// Open an OSC 8 hyperlink pointing at `uri`
#[inline]
pub fn hyperlink_start(uri: &str) -> String {
    format!("\x1b]8;;{}\x07", uri)
}

/// Wrap text in an OSC 8 hyperlink (clickable in supporting terminals)
#[inline]
pub fn hyperlink(uri: &str, text: &str) -> String {
    format!("{}{}{}", hyperlink_start(uri), text, HYPERLINK_END)
}

// === Styled Regions ===

/// Begin a styled region (error output styling)
pub const STYLED_START: &str = "\x1b[12u";

/// End a styled region
pub const STYLED_END: &str = "\x1b[11u";

/// Wrap a single physical line in a styled region
#[inline]
pub fn styled(line: &str) -> String {
    format!("{}{}{}", STYLED_START, line, STYLED_END)
}

// === Pretty-printing ===

/// Start a pretty-printing group (OSC 110)
pub const GROUP_START: &str = "\x1b]110\x07";

/// End the innermost pretty-printing group (OSC 111)
pub const GROUP_END: &str = "\x1b]111\x07";

/// Adjust indentation relative to the current position (OSC 112)
#[inline]
pub fn indent(delta: usize) -> String {
    format!("\x1b]112;{}\x07", delta)
}

/// Fill-style line break (OSC 115)
///
/// The parameter is the comma-separated JSON strings `pre-break, post-break,
/// non-break`: text inserted before a taken break, after it, and in place of
/// the break when the group fits on one line.
#[inline]
pub fn fill_break(pre_break: &str, post_break: &str, non_break: &str) -> String {
    format!(
        "\x1b]115;{},{},{}\x07",
        json_string(pre_break),
        json_string(post_break),
        json_string(non_break)
    )
}

fn json_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}
