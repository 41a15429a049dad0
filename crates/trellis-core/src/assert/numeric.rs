use super::{AssertResult, AssertionError};
use crate::value::Value;

fn threshold(passed: bool, template: &str, params: [(&str, f64); 2]) -> AssertResult {
    if passed {
        Ok(())
    } else {
        Err(AssertionError::with_params(
            template,
            params.map(|(name, n)| (name, Value::from(n))),
        ))
    }
}

/// Checks `actual > expected`.
pub fn above(actual: f64, expected: f64) -> AssertResult {
    threshold(
        actual > expected,
        "Expected {actual} to be above {expected}",
        [("actual", actual), ("expected", expected)],
    )
}

/// Checks `actual < expected`.
pub fn below(actual: f64, expected: f64) -> AssertResult {
    threshold(
        actual < expected,
        "Expected {actual} to be below {expected}",
        [("actual", actual), ("expected", expected)],
    )
}

/// Checks `actual >= expected`.
pub fn at_least(actual: f64, expected: f64) -> AssertResult {
    threshold(
        actual >= expected,
        "Expected {actual} to be at least {expected}",
        [("actual", actual), ("expected", expected)],
    )
}

/// Checks `actual <= expected`.
pub fn at_most(actual: f64, expected: f64) -> AssertResult {
    threshold(
        actual <= expected,
        "Expected {actual} to be at most {expected}",
        [("actual", actual), ("expected", expected)],
    )
}

/// Checks `lower <= actual <= upper`.
pub fn between(actual: f64, lower: f64, upper: f64) -> AssertResult {
    if actual >= lower && actual <= upper {
        return Ok(());
    }
    Err(AssertionError::with_params(
        "Expected {actual} to be between {lower} and {upper}",
        [
            ("actual", Value::from(actual)),
            ("lower", Value::from(lower)),
            ("upper", Value::from(upper)),
        ],
    ))
}

fn closeness(actual: f64, expected: f64, epsilon: f64, negate: bool) -> AssertResult {
    let close = (actual - expected).abs() <= epsilon;
    if close != negate {
        return Ok(());
    }
    let template = if negate {
        "Expected {actual} to not be within {epsilon} of {expected}"
    } else {
        "Expected {actual} to be within {epsilon} of {expected}"
    };
    Err(AssertionError::with_params(
        template,
        [
            ("actual", Value::from(actual)),
            ("expected", Value::from(expected)),
            ("epsilon", Value::from(epsilon)),
        ],
    ))
}

/// Checks `|actual - expected| <= epsilon`.
pub fn close_to(actual: f64, expected: f64, epsilon: f64) -> AssertResult {
    closeness(actual, expected, epsilon, false)
}

pub fn not_close_to(actual: f64, expected: f64, epsilon: f64) -> AssertResult {
    closeness(actual, expected, epsilon, true)
}
