//! Containment checks.
//!
//! Each family has four members: `includes*` (every needle present),
//! `includes*_any` (at least one needle present), `not_includes*_all`
//! (negation of the first) and `not_includes*` (negation of the second,
//! i.e. no needle present). A non-array needle is a single needle.

use super::{check, AssertResult};
use crate::compare::{Comparison, Containment, Quantifier};
use crate::value::Value;

fn contains(
    comparison: Comparison,
    containment: Containment,
    quantifier: Quantifier,
    negate: bool,
    template: &str,
    haystack: Value,
    needles: Value,
) -> AssertResult {
    let found = comparison.includes(&haystack, &needles, containment, quantifier);
    check(found != negate, template, haystack, needles)
}

macro_rules! includes_family {
    (
        $all:ident, $any:ident, $not_all:ident, $not_any:ident,
        $comparison:expr, $containment:expr, $how:literal
    ) => {
        pub fn $all(haystack: impl Into<Value>, needles: impl Into<Value>) -> AssertResult {
            contains(
                $comparison,
                $containment,
                Quantifier::All,
                false,
                concat!("Expected {actual} to have all values ", $how, "in {expected}"),
                haystack.into(),
                needles.into(),
            )
        }

        pub fn $any(haystack: impl Into<Value>, needles: impl Into<Value>) -> AssertResult {
            contains(
                $comparison,
                $containment,
                Quantifier::Any,
                false,
                concat!("Expected {actual} to have any value ", $how, "in {expected}"),
                haystack.into(),
                needles.into(),
            )
        }

        pub fn $not_all(haystack: impl Into<Value>, needles: impl Into<Value>) -> AssertResult {
            contains(
                $comparison,
                $containment,
                Quantifier::All,
                true,
                concat!("Expected {actual} to not have all values ", $how, "in {expected}"),
                haystack.into(),
                needles.into(),
            )
        }

        pub fn $not_any(haystack: impl Into<Value>, needles: impl Into<Value>) -> AssertResult {
            contains(
                $comparison,
                $containment,
                Quantifier::Any,
                true,
                concat!("Expected {actual} to not have any value ", $how, "in {expected}"),
                haystack.into(),
                needles.into(),
            )
        }
    };
}

includes_family!(
    includes,
    includes_any,
    not_includes_all,
    not_includes,
    Comparison::STRICT,
    Containment::Unordered,
    ""
);

includes_family!(
    includes_loose,
    includes_loose_any,
    not_includes_loose_all,
    not_includes_loose,
    Comparison::LOOSE,
    Containment::Unordered,
    "loosely "
);

includes_family!(
    includes_deep,
    includes_deep_any,
    not_includes_deep_all,
    not_includes_deep,
    Comparison::DEEP,
    Containment::Unordered,
    "deeply "
);

includes_family!(
    includes_loose_deep,
    includes_loose_deep_any,
    not_includes_loose_deep_all,
    not_includes_loose_deep,
    Comparison::LOOSE_DEEP,
    Containment::Unordered,
    "loosely deeply "
);

includes_family!(
    includes_match,
    includes_match_any,
    not_includes_match_all,
    not_includes_match,
    Comparison::DEEP,
    Containment::Ordered,
    "matching in order "
);

includes_family!(
    includes_match_loose,
    includes_match_loose_any,
    not_includes_match_loose_all,
    not_includes_match_loose,
    Comparison::LOOSE_DEEP,
    Containment::Ordered,
    "loosely matching in order "
);
