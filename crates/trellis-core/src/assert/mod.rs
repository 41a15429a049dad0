//! The assertion catalogue.
//!
//! Every check returns `Ok(())` or an [`AssertionError`] describing the
//! actual value, the expected value and a message template. Negated checks
//! reuse the exact computation of their positive form, so for any input
//! exactly one of `x` and `not_x` succeeds.
//!
//! ```ignore
//! use trellis_core::assert;
//!
//! assert::equal(1, 1)?;
//! assert::includes_deep(Value::array([1, 2, 3]), Value::array([3, 1]))?;
//! ```

mod equality;
mod includes;
mod keys;
mod numeric;
mod types;

pub use equality::*;
pub use includes::*;
pub use keys::*;
pub use numeric::*;
pub use types::*;

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::value::Value;

/// Result of a single check.
pub type AssertResult = Result<(), AssertionError>;

/// A failed check.
///
/// The message is rendered eagerly from the template, replacing each
/// `{name}` placeholder with the display form of the matching parameter.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct AssertionError {
    pub message: String,
    pub template: String,
    pub actual: Option<Value>,
    pub expected: Option<Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
}

impl AssertionError {
    /// Creates an error carrying an actual and an expected value.
    pub fn new(template: impl Into<String>, actual: Value, expected: Value) -> Self {
        Self::build(template.into(), Some(actual), Some(expected), BTreeMap::new())
    }

    /// Creates an error from arbitrary named parameters. The `actual` and
    /// `expected` parameters, when present, populate the dedicated fields.
    pub fn with_params<I, K>(template: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut params: BTreeMap<String, Value> =
            params.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let actual = params.remove("actual");
        let expected = params.remove("expected");
        Self::build(template.into(), actual, expected, params)
    }

    fn build(
        template: String,
        actual: Option<Value>,
        expected: Option<Value>,
        params: BTreeMap<String, Value>,
    ) -> Self {
        let message = render(&template, |name| match name {
            "actual" => actual.as_ref(),
            "expected" => expected.as_ref(),
            other => params.get(other),
        });

        Self {
            message,
            template,
            actual,
            expected,
            params,
        }
    }
}

/// Renders `{name}` placeholders in a single pass over the template, so
/// substituted text is never scanned again. Unknown placeholders are kept.
fn render<'v>(template: &str, lookup: impl Fn(&str) -> Option<&'v Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let value = tail
            .find('}')
            .and_then(|close| lookup(&tail[1..close]).map(|value| (close, value)));
        match value {
            Some((close, value)) => {
                out.push_str(&value.to_string());
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Turns a computed check result into an assertion outcome.
pub(crate) fn check(passed: bool, template: &str, actual: Value, expected: Value) -> AssertResult {
    if passed {
        Ok(())
    } else {
        Err(AssertionError::new(template, actual, expected))
    }
}

/// Fails unconditionally with a custom template.
pub fn fail<I, K>(template: &str, params: I) -> AssertResult
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Err(AssertionError::with_params(template, params))
}

/// Checks that a value is truthy.
pub fn ok(value: impl Into<Value>) -> AssertResult {
    truthiness(value.into(), false)
}

/// Checks that a value is falsy.
pub fn not_ok(value: impl Into<Value>) -> AssertResult {
    truthiness(value.into(), true)
}

fn truthiness(value: Value, negate: bool) -> AssertResult {
    let template = if negate {
        "Expected {actual} to not be ok"
    } else {
        "Expected {actual} to be ok"
    };
    check(value.is_truthy() != negate, template, value, Value::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_rendering() {
        let err =
            AssertionError::new("Expected {actual} to equal {expected}", 1.into(), "1".into());
        assert_eq!(err.message, "Expected 1 to equal \"1\"");
        assert_eq!(err.template, "Expected {actual} to equal {expected}");
    }

    #[test]
    fn test_substituted_text_is_not_rendered_again() {
        let err = AssertionError::new(
            "Expected {actual} to equal {expected}",
            "{expected}".into(),
            2.into(),
        );
        assert_eq!(err.message, "Expected \"{expected}\" to equal 2");

        let err = fail("{missing} {x} {", [("x", Value::from("{x}"))]).unwrap_err();
        assert_eq!(err.message, "{missing} \"{x}\" {");
    }

    #[test]
    fn test_custom_params() {
        let err = fail("Expected {actual} to be a nope", [("actual", Value::from("yep"))])
            .unwrap_err();
        assert_eq!(err.message, "Expected \"yep\" to be a nope");
        assert!(err.expected.is_none());
        assert!(err.params.is_empty());
    }

    #[test]
    fn test_ok_pairs() {
        assert!(ok(1).is_ok());
        assert!(not_ok(1).is_err());
        assert!(ok("").is_err());
        assert!(not_ok(Value::Null).is_ok());
    }
}
