use std::any::{type_name, Any};

use super::{check, AssertResult, AssertionError};
use crate::value::Value;

/// Checks that `value` has the named type tag (see [`Value::type_tag`]).
pub fn type_of(value: impl Into<Value>, expected: &str) -> AssertResult {
    let value = value.into();
    check(
        value.type_tag() == expected,
        "Expected typeof {actual} to be {expected}",
        value,
        expected.into(),
    )
}

pub fn not_type_of(value: impl Into<Value>, expected: &str) -> AssertResult {
    let value = value.into();
    check(
        value.type_tag() != expected,
        "Expected typeof {actual} to not be {expected}",
        value,
        expected.into(),
    )
}

macro_rules! kind_pair {
    ($pos:ident, $neg:ident, $name:literal, $test:expr) => {
        pub fn $pos(value: impl Into<Value>) -> AssertResult {
            let value = value.into();
            check(
                $test(&value),
                concat!("Expected {actual} to be ", $name),
                value,
                Value::Undefined,
            )
        }

        pub fn $neg(value: impl Into<Value>) -> AssertResult {
            let value = value.into();
            check(
                !$test(&value),
                concat!("Expected {actual} to not be ", $name),
                value,
                Value::Undefined,
            )
        }
    };
}

kind_pair!(boolean, not_boolean, "a boolean", |v: &Value| matches!(v, Value::Bool(_)));
kind_pair!(number, not_number, "a number", |v: &Value| matches!(v, Value::Number(_)));
kind_pair!(string, not_string, "a string", |v: &Value| matches!(v, Value::String(_)));
kind_pair!(array, not_array, "an array", |v: &Value| matches!(v, Value::Array(_)));
kind_pair!(object, not_object, "an object", |v: &Value| v.type_tag() == "object");
kind_pair!(null, not_null, "null", |v: &Value| matches!(v, Value::Null));
kind_pair!(undefined, not_undefined, "undefined", |v: &Value| matches!(v, Value::Undefined));
kind_pair!(is_true, not_true, "true", |v: &Value| matches!(v, Value::Bool(true)));
kind_pair!(is_false, not_false, "false", |v: &Value| matches!(v, Value::Bool(false)));

/// Checks that a value is neither `null` nor `undefined`.
pub fn exists(value: impl Into<Value>) -> AssertResult {
    let value = value.into();
    check(!value.is_nullish(), "Expected {actual} to exist", value, Value::Undefined)
}

pub fn not_exists(value: impl Into<Value>) -> AssertResult {
    let value = value.into();
    check(value.is_nullish(), "Expected {actual} to not exist", value, Value::Undefined)
}

fn instance(is: bool, negate: bool, template: &str, expected: &str) -> AssertResult {
    if is != negate {
        Ok(())
    } else {
        Err(AssertionError::with_params(
            template,
            [("expected", Value::from(expected))],
        ))
    }
}

/// Checks that a type-erased value is an instance of `T`.
pub fn instance_of<T: Any>(value: &dyn Any) -> AssertResult {
    instance(
        value.is::<T>(),
        false,
        "Expected value to be an instance of {expected}",
        type_name::<T>(),
    )
}

pub fn not_instance_of<T: Any>(value: &dyn Any) -> AssertResult {
    instance(
        value.is::<T>(),
        true,
        "Expected value to not be an instance of {expected}",
        type_name::<T>(),
    )
}
