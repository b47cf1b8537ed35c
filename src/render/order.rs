//! Best-effort ordering of mapping keys

use std::cmp::Ordering;

use super::value::Value;

/// Whether a mapping's keys can be put in a total order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOrder {
    Ordered,
    /// Mixed or incomparable keys: keep iteration order
    Unordered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyClass {
    Number,
    Text,
}

fn key_class(key: &Value) -> Option<KeyClass> {
    match key {
        Value::Bool(_) | Value::Int(_) => Some(KeyClass::Number),
        Value::Float(n) if !n.is_nan() => Some(KeyClass::Number),
        Value::Str(_) => Some(KeyClass::Text),
        _ => None,
    }
}

impl KeyOrder {
    /// Decide once per mapping: all numbers, or all text
    pub fn of(entries: &[(Value, Value)]) -> Self {
        let mut classes = entries.iter().map(|(k, _)| key_class(k));
        let Some(first) = classes.next() else {
            return Self::Ordered;
        };
        if first.is_some() && classes.all(|c| c == first) {
            Self::Ordered
        } else {
            Self::Unordered
        }
    }
}

/// A numeric key, compared by exact value
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

fn as_number(key: &Value) -> Option<Number> {
    match key {
        Value::Bool(b) => Some(Number::Int(i64::from(*b))),
        Value::Int(n) => Some(Number::Int(*n)),
        Value::Float(n) => Some(Number::Float(*n)),
        _ => None,
    }
}

/// Exact comparison of an integer with a non-NaN float
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first float above every i64
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal),
        other => other,
    }
}

fn compare_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        (Number::Float(x), Number::Float(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Number::Int(x), Number::Float(y)) => cmp_int_float(x, y),
        (Number::Float(x), Number::Int(y)) => cmp_int_float(y, x).reverse(),
    }
}

/// Compare two keys of the same class.
///
/// Numbers compare by exact value, so ints beyond 2^53 still order
/// consistently against floats.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => compare_numbers(x, y),
            _ => Ordering::Equal,
        },
    }
}

/// Entries in display order
pub fn ordered(entries: &[(Value, Value)]) -> Vec<&(Value, Value)> {
    let mut refs: Vec<_> = entries.iter().collect();
    match KeyOrder::of(entries) {
        KeyOrder::Ordered => refs.sort_by(|a, b| compare(&a.0, &b.0)),
        KeyOrder::Unordered => {}
    }
    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(keys: Vec<Value>) -> Vec<(Value, Value)> {
        keys.into_iter().map(|k| (k, Value::Null)).collect()
    }

    #[test]
    fn test_text_keys_sort() {
        let e = entries(vec!["b".into(), "a".into(), "c".into()]);
        let keys: Vec<_> = ordered(&e).iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["\"a\"", "\"b\"", "\"c\""]);
    }

    #[test]
    fn test_mixed_numbers_sort() {
        let e = entries(vec![Value::Float(2.5), Value::Int(1), Value::Bool(true), Value::Int(-3)]);
        let keys: Vec<_> = ordered(&e).iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["-3", "1", "True", "2.5"]);
    }

    #[test]
    fn test_incomparable_keys_keep_iteration_order() {
        let e = entries(vec!["b".into(), Value::Int(1), Value::Null]);
        assert_eq!(KeyOrder::of(&e), KeyOrder::Unordered);
        let keys: Vec<_> = ordered(&e).iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["\"b\"", "1", "None"]);
    }

    #[test]
    fn test_nan_key_is_unordered() {
        let e = entries(vec![Value::Float(f64::NAN), Value::Int(1)]);
        assert_eq!(KeyOrder::of(&e), KeyOrder::Unordered);
    }

    #[test]
    fn test_large_ints_against_floats() {
        let big = 1_i64 << 53;
        let e = entries(vec![Value::Int(big + 1), Value::Float(big as f64), Value::Int(big)]);
        let keys: Vec<_> = ordered(&e).into_iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![Value::Float(big as f64), Value::Int(big), Value::Int(big + 1)]
        );
    }

    #[test]
    fn test_exact_int_float_comparison() {
        assert_eq!(cmp_int_float(3, 2.5), Ordering::Greater);
        assert_eq!(cmp_int_float(-3, -2.5), Ordering::Less);
        assert_eq!(cmp_int_float(2, 2.0), Ordering::Equal);
        assert_eq!(cmp_int_float(0, -0.0), Ordering::Equal);
        assert_eq!(cmp_int_float(i64::MAX, 9.3e18), Ordering::Less);
        assert_eq!(cmp_int_float(i64::MIN, -9.3e18), Ordering::Greater);
        assert_eq!(cmp_int_float(i64::MAX, f64::INFINITY), Ordering::Less);
        assert_eq!(cmp_int_float((1 << 53) + 1, (1_i64 << 53) as f64), Ordering::Greater);
    }

    #[test]
    fn test_dense_mixed_keys_sort_in_any_rotation() {
        let base = 1_i64 << 53;
        let mut e: Vec<(Value, Value)> = (0..200)
            .flat_map(|k| [Value::Int(base + k), Value::Float((base + k) as f64)])
            .map(|key| (key, Value::Null))
            .collect();
        for _ in 0..50 {
            e.rotate_left(7);
            let sorted = ordered(&e);
            assert_eq!(sorted.len(), e.len());
            for pair in sorted.windows(2) {
                assert_ne!(compare(&pair[0].0, &pair[1].0), Ordering::Greater);
            }
        }
    }

    #[test]
    fn test_tuple_keys_are_unordered() {
        let e = entries(vec![Value::Tuple(vec![Value::Int(1)])]);
        assert_eq!(KeyOrder::of(&e), KeyOrder::Unordered);
    }
}
