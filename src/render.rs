//! Bounded recursive rendering of structured values
//!
//! Produces pretty-printing markup for DomTerm: every container is a group
//! (OSC 110/111) with an indentation marker and fill-style line breaks between
//! elements, so the terminal decides the layout for its current width.
//!
//! Output size depends only on the render budget, never on the input:
//! - nesting stops at `depth`; deeper non-empty containers become `[...]`
//! - at most `max_items` / `max_entries` elements per container
//! - text longer than `max_string` columns is cut
//!
//! Rendering never fails. There is no cycle detection; the depth budget is
//! the only bound.

mod order;
mod value;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::escape;

pub use order::KeyOrder;
pub use value::{Capability, Value};

/// Marker for anything left out
pub const ELLIPSIS: &str = "...";

/// Render budget.
///
/// Copied, never mutated: each level of recursion gets its own copy with
/// one less unit of depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderContext {
    /// Container levels still allowed to expand
    pub depth: usize,
    /// Elements shown per sequence
    pub max_items: usize,
    /// Entries shown per mapping
    pub max_entries: usize,
    /// Display columns shown per text value
    pub max_string: usize,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            depth: 4,
            max_items: 20,
            max_entries: 12,
            max_string: 80,
        }
    }
}

impl RenderContext {
    /// Budget for the children of a container at this level
    pub fn descend(self) -> Self {
        Self {
            depth: self.depth.saturating_sub(1),
            ..self
        }
    }
}

/// Render `value` within the budget of `ctx`
pub fn render(value: &Value, ctx: RenderContext) -> String {
    let mut out = String::new();
    render_into(&mut out, value, ctx);
    out
}

fn render_into(out: &mut String, value: &Value, ctx: RenderContext) {
    match value.capability() {
        Capability::Rich(markup) => out.push_str(&escape::html(markup)),
        Capability::Plain(Value::List(items)) => render_sequence(out, ("[", "]"), items, ctx),
        Capability::Plain(Value::Tuple(items)) => render_sequence(out, ("(", ")"), items, ctx),
        Capability::Plain(Value::Map(entries)) => render_mapping(out, entries, ctx),
        Capability::Plain(scalar) => out.push_str(&scalar_text(scalar, ctx.max_string)),
    }
}

/// Open a group, or return false after writing the collapsed form
fn open_container(
    out: &mut String,
    brackets: (&str, &str),
    len: usize,
    ctx: RenderContext,
) -> bool {
    let (open, close) = brackets;
    if len == 0 {
        out.push_str(open);
        out.push_str(close);
        return false;
    }
    if ctx.depth == 0 {
        out.push_str(open);
        out.push_str(ELLIPSIS);
        out.push_str(close);
        return false;
    }
    out.push_str(escape::GROUP_START);
    out.push_str(&escape::indent(open.width()));
    out.push_str(open);
    true
}

fn separator(out: &mut String) {
    out.push(',');
    out.push_str(&escape::fill_break("", "", " "));
}

fn close_container(out: &mut String, close: &str, shown: usize, total: usize) {
    if total > shown {
        if shown > 0 {
            separator(out);
        }
        out.push_str(ELLIPSIS);
    }
    out.push_str(close);
    out.push_str(escape::GROUP_END);
}

fn render_sequence(out: &mut String, brackets: (&str, &str), items: &[Value], ctx: RenderContext) {
    if !open_container(out, brackets, items.len(), ctx) {
        return;
    }
    let child = ctx.descend();
    let shown = items.len().min(ctx.max_items);
    for (i, item) in items.iter().take(shown).enumerate() {
        if i > 0 {
            separator(out);
        }
        render_into(out, item, child);
    }
    // one-element tuples keep their trailing comma
    if brackets.0 == "(" && items.len() == 1 && shown == 1 {
        out.push(',');
    }
    close_container(out, brackets.1, shown, items.len());
}

fn render_mapping(out: &mut String, entries: &[(Value, Value)], ctx: RenderContext) {
    if !open_container(out, ("{", "}"), entries.len(), ctx) {
        return;
    }
    let child = ctx.descend();
    let shown = entries.len().min(ctx.max_entries);
    for (i, (key, value)) in order::ordered(entries).into_iter().take(shown).enumerate() {
        if i > 0 {
            separator(out);
        }
        render_into(out, key, child);
        out.push_str(": ");
        render_into(out, value, child);
    }
    close_container(out, "}", shown, entries.len());
}

/// Generic bounded text for a non-container value
fn scalar_text(value: &Value, max_string: usize) -> String {
    match value {
        Value::Str(s) => quote_bounded(s, max_string),
        other => other.to_string(),
    }
}

fn quote_bounded(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return format!("{:?}", s);
    }
    let budget = max_width.saturating_sub(ELLIPSIS.len());
    let mut width = 0;
    let mut end = 0;
    for (idx, ch) in s.char_indices() {
        let w = ch.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        end = idx + ch.len_utf8();
    }
    let mut quoted = format!("{:?}", s.get(..end).unwrap_or_default());
    quoted.insert_str(quoted.len() - 1, ELLIPSIS);
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(n: i64) -> Value {
        Value::List((0..n).map(Value::Int).collect())
    }

    fn nested(depth: usize) -> Value {
        let mut value = Value::Int(0);
        for _ in 0..depth {
            value = Value::List(vec![value]);
        }
        value
    }

    /// Visible text as a plain terminal would show it (markers are ignored)
    fn visible(rendered: &str) -> String {
        let mut parser = vt100::Parser::new(24, 200, 0);
        parser.process(rendered.as_bytes());
        parser.screen().contents()
    }

    #[test]
    fn test_scalars() {
        let ctx = RenderContext::default();
        assert_eq!(render(&Value::Null, ctx), "None");
        assert_eq!(render(&Value::Bool(false), ctx), "False");
        assert_eq!(render(&Value::Int(-7), ctx), "-7");
        assert_eq!(render(&Value::Float(1.0), ctx), "1.0");
        assert_eq!(render(&Value::from("a\"b"), ctx), "\"a\\\"b\"");
    }

    #[test]
    fn test_list_markers() {
        let out = render(&ints(2), RenderContext::default());
        assert_eq!(
            out,
            "\x1b]110\x07\x1b]112;1\x07[0,\x1b]115;\"\",\"\",\" \"\x071]\x1b]111\x07"
        );
        assert_eq!(visible(&out), "[0,1]");
    }

    #[test]
    fn test_rich_takes_precedence() {
        let value = Value::List(vec![Value::Rich("<b>x</b>".into())]);
        let out = render(&value, RenderContext::default());
        assert!(out.contains("\x1b]72;<b>x</b>\x07"));
        assert_eq!(
            render(&Value::Rich("<i/>".into()), RenderContext::default()),
            "\x1b]72;<i/>\x07"
        );
    }

    #[test]
    fn test_item_cap_appends_ellipsis() {
        let ctx = RenderContext {
            max_items: 3,
            ..Default::default()
        };
        assert_eq!(visible(&render(&ints(10), ctx)), "[0,1,2,...]");
        assert_eq!(visible(&render(&ints(3), ctx)), "[0,1,2]");
    }

    #[test]
    fn test_zero_item_cap() {
        let ctx = RenderContext {
            max_items: 0,
            ..Default::default()
        };
        assert_eq!(visible(&render(&ints(4), ctx)), "[...]");
    }

    #[test]
    fn test_depth_truncation_counts() {
        for budget in 0..4 {
            let ctx = RenderContext {
                depth: budget,
                ..Default::default()
            };
            let out = render(&nested(6), ctx);
            assert_eq!(out.matches(escape::GROUP_START).count(), budget);
            assert_eq!(out.matches(escape::GROUP_END).count(), budget);
            assert_eq!(out.matches(ELLIPSIS).count(), 1);
        }
    }

    #[test]
    fn test_depth_zero_empty_container() {
        let ctx = RenderContext {
            depth: 0,
            ..Default::default()
        };
        assert_eq!(render(&Value::List(vec![]), ctx), "[]");
        assert_eq!(render(&ints(1), ctx), "[...]");
        assert_eq!(render(&Value::map([("a", Value::Null)]), ctx), "{...}");
    }

    #[test]
    fn test_output_bounded_by_budget() {
        let ctx = RenderContext {
            max_items: 5,
            ..Default::default()
        };
        let small = render(&ints(6), ctx);
        let huge = render(&ints(100_000), ctx);
        assert_eq!(small, huge);
    }

    #[test]
    fn test_wide_nested_output_is_bounded() {
        let ctx = RenderContext {
            depth: 2,
            max_items: 3,
            ..Default::default()
        };
        let row = ints(1000);
        let grid = Value::List(vec![row; 1000]);
        assert_eq!(
            visible(&render(&grid, ctx)),
            "[[0,1,2,...],[0,1,2,...],[0,1,2,...],...]"
        );
    }

    #[test]
    fn test_mapping_sorted_and_capped() {
        let ctx = RenderContext {
            max_entries: 2,
            ..Default::default()
        };
        let value = Value::map([("c", Value::Int(3)), ("a", Value::Int(1)), ("b", Value::Int(2))]);
        assert_eq!(visible(&render(&value, ctx)), "{\"a\": 1,\"b\": 2,...}");
    }

    #[test]
    fn test_mapping_with_incomparable_keys() {
        let value = Value::Map(vec![
            (Value::from("z"), Value::Int(1)),
            (Value::Int(5), Value::Int(2)),
            (Value::Tuple(vec![Value::Null]), Value::Int(3)),
        ]);
        assert_eq!(
            visible(&render(&value, RenderContext::default())),
            "{\"z\": 1,5: 2,(None,): 3}"
        );
    }

    #[test]
    fn test_mapping_with_huge_numeric_keys() {
        let base = 1_i64 << 53;
        let entries: Vec<(Value, Value)> = (0..200)
            .flat_map(|k| [Value::Int(base + k), Value::Float((base + k) as f64)])
            .map(|key| (key, Value::Null))
            .collect();
        let ctx = RenderContext {
            max_entries: 3,
            ..Default::default()
        };
        let out = visible(&render(&Value::Map(entries), ctx));
        assert_eq!(
            out,
            "{9007199254740992: None,9007199254740992.0: None,9007199254740992.0: None,...}"
        );
    }

    #[test]
    fn test_singleton_tuple() {
        let value = Value::Tuple(vec![Value::Int(1)]);
        assert_eq!(visible(&render(&value, RenderContext::default())), "(1,)");
    }

    #[test]
    fn test_long_text_is_cut() {
        let ctx = RenderContext {
            max_string: 8,
            ..Default::default()
        };
        assert_eq!(render(&Value::from("abcdefghijkl"), ctx), "\"abcde...\"");
        assert_eq!(render(&Value::from("abcdefgh"), ctx), "\"abcdefgh\"");
    }

    #[test]
    fn test_wide_chars_count_columns() {
        let ctx = RenderContext {
            max_string: 7,
            ..Default::default()
        };
        // each ideograph is two columns wide
        assert_eq!(render(&Value::from("日本語テキスト"), ctx), "\"日本...\"");
    }

    #[test]
    fn test_self_similar_structure_is_truncated() {
        // stand-in for a self-referential list: as deep as anything can get
        let ctx = RenderContext {
            depth: 3,
            max_items: 2,
            ..Default::default()
        };
        let out = render(&nested(500), ctx);
        assert_eq!(visible(&out), "[[[[...]]]]");
    }
}
