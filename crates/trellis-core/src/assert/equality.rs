use super::{check, AssertResult};
use crate::compare::Comparison;
use crate::value::Value;

fn compare(
    comparison: Comparison,
    negate: bool,
    template: &str,
    actual: Value,
    expected: Value,
) -> AssertResult {
    let equal = comparison.equals(&actual, &expected);
    check(equal != negate, template, actual, expected)
}

macro_rules! equality_pair {
    ($(#[$doc:meta])* $pos:ident, $neg:ident, $comparison:expr, $how:literal) => {
        $(#[$doc])*
        pub fn $pos(actual: impl Into<Value>, expected: impl Into<Value>) -> AssertResult {
            compare(
                $comparison,
                false,
                concat!("Expected {actual} to ", $how, " {expected}"),
                actual.into(),
                expected.into(),
            )
        }

        /// Negation of the check above, using the same comparison.
        pub fn $neg(actual: impl Into<Value>, expected: impl Into<Value>) -> AssertResult {
            compare(
                $comparison,
                true,
                concat!("Expected {actual} to not ", $how, " {expected}"),
                actual.into(),
                expected.into(),
            )
        }
    };
}

equality_pair!(
    /// Strict equality; containers compare by identity.
    equal,
    not_equal,
    Comparison::STRICT,
    "equal"
);

equality_pair!(
    /// Loose equality with scalar coercion; containers compare by identity.
    equal_loose,
    not_equal_loose,
    Comparison::LOOSE,
    "loosely equal"
);

equality_pair!(
    /// Strict structural equality.
    deep_equal,
    not_deep_equal,
    Comparison::DEEP,
    "deeply equal"
);

equality_pair!(
    /// Structural equality with scalar coercion at every level.
    deep_equal_loose,
    not_deep_equal_loose,
    Comparison::LOOSE_DEEP,
    "loosely deeply equal"
);
