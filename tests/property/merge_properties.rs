// Copyright (c) 2025 - Cowboy AI, Inc.

//! Property-Based Tests for the Ontology Merge

use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::{json, Value};

use cim_inventory_graph::ontology::merge_records;
use cim_inventory_graph::Record;

// ============================================================================
// Strategies
// ============================================================================

fn arb_field() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        "[a-z]{1,6}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

/// Projected records sharing a small pool of identities
fn arb_records() -> impl Strategy<Value = Vec<Record>> {
    let email = prop_oneof![
        3 => (0..4u8).prop_map(|n| json!(format!("user{}@corp.io", n))),
        1 => Just(Value::Null),
    ];
    prop::collection::vec((email, arb_field(), arb_field()), 0..12).prop_map(|rows| {
        rows.into_iter()
            .map(|(email, name, active)| {
                let mut record = Record::new();
                record.insert("email".to_string(), email);
                record.insert("name".to_string(), name);
                record.insert("active".to_string(), active);
                record
            })
            .collect()
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: one output per distinct identity, in first-appearance order
    #[test]
    fn prop_merge_yields_distinct_identities(records in arb_records()) {
        let merged = merge_records("email", records.clone());

        let mut seen = BTreeSet::new();
        let expected: Vec<Value> = records
            .iter()
            .filter_map(|record| record.get("email").filter(|email| !email.is_null()))
            .filter(|email| seen.insert(email.to_string()))
            .cloned()
            .collect();
        let actual: Vec<Value> = merged.iter().map(|record| record["email"].clone()).collect();
        prop_assert_eq!(actual, expected);
    }

    /// Property: each merged field holds the first non-null value for its identity
    #[test]
    fn prop_first_non_null_wins(records in arb_records()) {
        let merged = merge_records("email", records.clone());

        for output in &merged {
            let group: Vec<&Record> = records
                .iter()
                .filter(|record| record.get("email") == output.get("email"))
                .collect();
            for field in ["name", "active"] {
                let expected = group
                    .iter()
                    .filter_map(|record| record.get(field))
                    .find(|value| !value.is_null())
                    .cloned()
                    .unwrap_or(Value::Null);
                prop_assert_eq!(output.get(field).cloned().unwrap_or(Value::Null), expected);
            }
        }
    }

    /// Property: merging is stable under re-merging its own output
    #[test]
    fn prop_merge_is_idempotent(records in arb_records()) {
        let once = merge_records("email", records);
        let twice = merge_records("email", once.clone());
        prop_assert_eq!(twice, once);
    }
}
