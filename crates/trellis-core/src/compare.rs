//! Comparison semantics shared by every assertion.
//!
//! Equality is parameterized over two independent axes:
//!
//! - [`Strictness`]: strict equality never coerces, loose equality treats
//!   `null`/`undefined` as equal and compares numbers with numeric strings
//!   and booleans after conversion.
//! - [`Depth`]: shallow comparison checks containers by identity, deep
//!   comparison walks arrays in order and objects by key set.
//!
//! Containment layers a [`Containment`] mode and a [`Quantifier`] on top of a
//! [`Comparison`]. None of these functions fail: values that cannot be
//! compared are simply unequal.

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Strict,
    Loose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Shallow,
    Deep,
}

/// How a multi-needle check combines per-needle results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Any,
}

/// Whether needles must appear in haystack order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Each needle may appear anywhere.
    Unordered,
    /// Needles must appear as a subsequence of the haystack.
    Ordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub strictness: Strictness,
    pub depth: Depth,
}

impl Comparison {
    pub const STRICT: Comparison = Comparison::new(Strictness::Strict, Depth::Shallow);
    pub const LOOSE: Comparison = Comparison::new(Strictness::Loose, Depth::Shallow);
    pub const DEEP: Comparison = Comparison::new(Strictness::Strict, Depth::Deep);
    pub const LOOSE_DEEP: Comparison = Comparison::new(Strictness::Loose, Depth::Deep);

    pub const fn new(strictness: Strictness, depth: Depth) -> Self {
        Self { strictness, depth }
    }

    /// Returns true if `a` and `b` are equal under this comparison.
    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        if a.same_container(b) {
            return true;
        }

        match (a, b) {
            (Value::Array(xs), Value::Array(ys)) => {
                self.depth == Depth::Deep
                    && xs.len() == ys.len()
                    && xs.iter().zip(ys.iter()).all(|(x, y)| self.equals(x, y))
            }
            (Value::Object(xs), Value::Object(ys)) => {
                self.depth == Depth::Deep
                    && xs.len() == ys.len()
                    && xs.iter().all(|(key, x)| ys.get(key).is_some_and(|y| self.equals(x, y)))
            }
            _ if a.is_container() || b.is_container() => false,
            _ => match self.strictness {
                Strictness::Strict => strict_scalar(a, b),
                Strictness::Loose => loose_scalar(a, b),
            },
        }
    }

    /// Checks whether `haystack` contains `needles`.
    ///
    /// A non-array `needles` is treated as a single needle. An empty needle
    /// list is vacuously contained under both quantifiers. A non-array
    /// haystack contains nothing.
    pub fn includes(
        &self,
        haystack: &Value,
        needles: &Value,
        containment: Containment,
        quantifier: Quantifier,
    ) -> bool {
        let needles = as_needles(needles);
        if needles.is_empty() {
            return true;
        }

        let Some(haystack) = haystack.as_array() else {
            return false;
        };

        match (quantifier, containment) {
            (Quantifier::Any, _) => needles
                .iter()
                .any(|needle| haystack.iter().any(|item| self.equals(item, needle))),
            (Quantifier::All, Containment::Unordered) => needles
                .iter()
                .all(|needle| haystack.iter().any(|item| self.equals(item, needle))),
            (Quantifier::All, Containment::Ordered) => self.is_subsequence(haystack, needles),
        }
    }

    /// Greedy subsequence match: taking the earliest haystack position for
    /// each needle leaves the longest remaining suffix, so it finds a match
    /// whenever one exists.
    fn is_subsequence(&self, haystack: &[Value], needles: &[Value]) -> bool {
        let mut position = 0;
        for needle in needles {
            match haystack[position..]
                .iter()
                .position(|item| self.equals(item, needle))
            {
                Some(offset) => position += offset + 1,
                None => return false,
            }
        }
        true
    }
}

fn as_needles(needles: &Value) -> &[Value] {
    match needles {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

/// Numbers compare by value with `NaN` equal to itself.
fn same_number(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn strict_scalar(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => same_number(*x, *y),
        (Value::String(x), Value::String(y)) => x == y,
        _ => false,
    }
}

fn loose_scalar(a: &Value, b: &Value) -> bool {
    if a.is_nullish() || b.is_nullish() {
        return a.is_nullish() && b.is_nullish();
    }

    if std::mem::discriminant(a) == std::mem::discriminant(b) {
        return strict_scalar(a, b);
    }

    match (coerce_number(a), coerce_number(b)) {
        (Some(x), Some(y)) => same_number(x, y),
        _ => false,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => numeric_string(s),
        _ => None,
    }
}

/// Reads a string as a number the way loose equality does. Only decimal
/// literals, `0x` hex and the exact spellings `Infinity`/`-Infinity` count;
/// nothing coerces to NaN.
fn numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    match trimmed {
        "" => return Some(0.0),
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }

    let decimal = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'));
    if !decimal {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}
