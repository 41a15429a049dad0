use super::{AssertResult, AssertionError};
use crate::compare::Comparison;
use crate::value::Value;

fn key_present(object: &Value, key: &str) -> bool {
    object.as_object().is_some_and(|map| map.contains_key(key))
}

/// Checks that an object has `key`.
pub fn has_key(object: impl Into<Value>, key: &str) -> AssertResult {
    key_check(object.into(), key, false)
}

/// Checks that an object lacks `key`. Non-objects have no keys.
pub fn not_has_key(object: impl Into<Value>, key: &str) -> AssertResult {
    key_check(object.into(), key, true)
}

fn key_check(object: Value, key: &str, negate: bool) -> AssertResult {
    if key_present(&object, key) != negate {
        return Ok(());
    }
    let template = if negate {
        "Expected {actual} to not have key {key}"
    } else {
        "Expected {actual} to have key {key}"
    };
    Err(AssertionError::with_params(
        template,
        [("actual", object), ("key", Value::from(key))],
    ))
}

fn value_check(
    comparison: Comparison,
    negate: bool,
    template: &str,
    object: Value,
    key: &str,
    expected: Value,
) -> AssertResult {
    let matches = object
        .as_object()
        .and_then(|map| map.get(key))
        .is_some_and(|found| comparison.equals(found, &expected));

    if matches != negate {
        return Ok(());
    }
    Err(AssertionError::with_params(
        template,
        [
            ("actual", object),
            ("expected", expected),
            ("key", Value::from(key)),
        ],
    ))
}

/// Checks that `object[key]` strictly equals `expected`.
pub fn has_key_value(
    object: impl Into<Value>,
    key: &str,
    expected: impl Into<Value>,
) -> AssertResult {
    value_check(
        Comparison::STRICT,
        false,
        "Expected {actual} to have key {key} equal to {expected}",
        object.into(),
        key,
        expected.into(),
    )
}

pub fn not_has_key_value(
    object: impl Into<Value>,
    key: &str,
    expected: impl Into<Value>,
) -> AssertResult {
    value_check(
        Comparison::STRICT,
        true,
        "Expected {actual} to not have key {key} equal to {expected}",
        object.into(),
        key,
        expected.into(),
    )
}

/// Checks that `object[key]` deeply equals `expected`.
pub fn has_key_value_deep(
    object: impl Into<Value>,
    key: &str,
    expected: impl Into<Value>,
) -> AssertResult {
    value_check(
        Comparison::DEEP,
        false,
        "Expected {actual} to have key {key} deeply equal to {expected}",
        object.into(),
        key,
        expected.into(),
    )
}

pub fn not_has_key_value_deep(
    object: impl Into<Value>,
    key: &str,
    expected: impl Into<Value>,
) -> AssertResult {
    value_check(
        Comparison::DEEP,
        true,
        "Expected {actual} to not have key {key} deeply equal to {expected}",
        object.into(),
        key,
        expected.into(),
    )
}
