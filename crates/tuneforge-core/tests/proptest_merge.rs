// crates/tuneforge-core/tests/proptest_merge.rs
// ============================================================================
// Module: Merge Property-Based Tests
// Description: Property tests for deep-merge identity and idempotence.
// Purpose: Detect mutation and conflict-policy violations on random records.
// ============================================================================

//! Property-based tests for the deep merge.

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

use proptest::prelude::*;
use serde_json::Map;
use serde_json::Value;
use tuneforge_core::runtime::MergeOptions;
use tuneforge_core::runtime::merge_into;

/// Strategy for scalar JSON values.
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|v| Value::Number(v.into())),
        "[a-z]{0,12}".prop_map(Value::String),
    ]
}

/// Strategy for flat records small enough to stay inside the size budget.
fn flat_record_strategy() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,8}", scalar_strategy(), 0 .. 24)
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn merging_an_empty_overlay_is_identity(base in flat_record_strategy()) {
        let mut merged = base.clone();
        let outcome = merge_into(&mut merged, &Map::new(), &MergeOptions::default());
        prop_assert!(outcome.is_ok());
        prop_assert_eq!(merged, base);
    }

    #[test]
    fn merging_a_record_onto_itself_is_idempotent(base in flat_record_strategy()) {
        let mut merged = base.clone();
        let outcome = merge_into(&mut merged, &base, &MergeOptions::default());
        prop_assert!(outcome.is_ok());
        prop_assert_eq!(merged, base);
    }

    #[test]
    fn merged_base_contains_every_overlay_key(
        base in flat_record_strategy(),
        overlay in flat_record_strategy(),
    ) {
        let mut merged = base.clone();
        let outcome = merge_into(&mut merged, &overlay, &MergeOptions::default());
        prop_assert!(outcome.is_ok());
        for (key, value) in &overlay {
            prop_assert_eq!(merged.get(key), Some(value));
        }
        for key in base.keys() {
            prop_assert!(merged.contains_key(key));
        }
    }
}
