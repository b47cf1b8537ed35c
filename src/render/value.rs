//! Structured values accepted by the renderer

use std::fmt;

/// A value to display.
///
/// Containers keep their own order. Mapping keys are arbitrary values, so a
/// mapping may hold keys that cannot be ordered against each other.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Map(Vec<(Value, Value)>),
    /// Pre-formatted markup supplied by the value itself
    Rich(String),
}

/// How a value asks to be displayed, resolved once at render entry
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Capability<'a> {
    /// The value supplies its own markup
    Rich(&'a str),
    /// Generic formatting applies
    Plain(&'a Value),
}

impl Value {
    pub fn capability(&self) -> Capability<'_> {
        match self {
            Self::Rich(markup) => Capability::Rich(markup),
            other => Capability::Plain(other),
        }
    }

    /// Shorthand for a mapping with text keys
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Self::Str(k.into()), v))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::Str(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (Self::Str(k), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Plain, unbounded textual form
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{:?}", n),
            Self::Str(s) => write!(f, "{:?}", s),
            Self::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Self::Rich(markup) => f.write_str(markup),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_keeps_key_order() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"b": 1, "a": [true, null, 2.5]}"#).unwrap();
        assert_eq!(
            Value::from(json),
            Value::Map(vec![
                (Value::from("b"), Value::Int(1)),
                (
                    Value::from("a"),
                    Value::List(vec![Value::Bool(true), Value::Null, Value::Float(2.5)])
                ),
            ])
        );
    }

    #[test]
    fn test_display_plain_form() {
        let value = Value::map([
            ("n", Value::Tuple(vec![Value::Int(1)])),
            ("s", Value::from("hi")),
        ]);
        assert_eq!(value.to_string(), r#"{"n": (1,), "s": "hi"}"#);
    }

    #[test]
    fn test_capability() {
        assert_eq!(Value::Rich("<b/>".into()).capability(), Capability::Rich("<b/>"));
        let plain = Value::Int(3);
        assert_eq!(plain.capability(), Capability::Plain(&plain));
    }
}
