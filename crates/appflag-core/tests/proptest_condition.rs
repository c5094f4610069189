// crates/appflag-core/tests/proptest_condition.rs
// ============================================================================
// Module: Condition Property-Based Tests
// Description: Property tests for condition evaluation stability.
// Purpose: Detect panics and equality invariants across wide input ranges.
// ============================================================================

//! Property-based tests for condition evaluator invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use appflag_core::EvaluationContext;
use appflag_core::evaluate_condition;
use proptest::prelude::*;
use serde_json::Value;

proptest! {
    #[test]
    fn arbitrary_conditions_never_panic(condition in ".*", key in "[a-z]{1,6}", value in ".*") {
        let ctx = EvaluationContext::new().with_attribute(key, value);
        let _ = evaluate_condition(&condition, &ctx);
    }

    #[test]
    fn equality_matches_iff_strings_are_equal(
        actual in "[A-Za-z0-9 _-]{0,12}",
        expected in "[A-Za-z0-9 _-]{0,12}",
    ) {
        let ctx = EvaluationContext::new().with_attribute("attr", actual.clone());
        let condition = format!("attr == \"{expected}\"");
        prop_assert_eq!(evaluate_condition(&condition, &ctx), actual == expected);
    }

    #[test]
    fn nested_paths_resolve_at_any_depth(depth in 1_usize .. 6, literal in "[a-z]{1,8}") {
        let mut value = Value::String(literal.clone());
        let mut path = Vec::new();
        for level in (0 .. depth).rev() {
            let key = format!("k{level}");
            let mut map = serde_json::Map::new();
            map.insert(key.clone(), value);
            value = Value::Object(map);
            path.insert(0, key);
        }
        let ctx = EvaluationContext::from_value(value).expect("object context");
        let condition = format!("{} == '{literal}'", path.join("."));
        prop_assert!(evaluate_condition(&condition, &ctx));
    }

    #[test]
    fn numbers_never_equal_their_string_form(number in any::<i64>()) {
        let ctx = EvaluationContext::new().with_attribute("n", number);
        let condition = format!("n == \"{number}\"");
        prop_assert!(!evaluate_condition(&condition, &ctx));
    }
}
