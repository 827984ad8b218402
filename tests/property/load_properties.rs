// Copyright (c) 2025 - Cowboy AI, Inc.

//! Property-Based Tests for Loading and Cleanup
//!
//! These tests verify that loads are idempotent, that chunking never changes
//! the resulting graph, and that a cleanup job leaves exactly the nodes the
//! latest sync run reported.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::fixtures::*;
use cim_inventory_graph::{
    CommonJobParameters, GraphJob, GraphStore, Loader, LoaderConfig, MemoryGraphStore, Record,
};

// ============================================================================
// Strategies
// ============================================================================

fn arb_state() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("pending"), Just("running"), Just("stopped")]
}

fn arb_groups() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec((1..=4u8).prop_map(|n| format!("sg-{}", n)), 0..4)
}

/// Instance records with unique ids drawn from `i-0`..`i-11`
fn arb_instances() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::btree_map(0..12u8, (arb_state(), arb_groups()), 0..8).prop_map(|map| {
        map.into_iter()
            .map(|(n, (state, groups))| {
                record(json!({
                    "InstanceId": format!("i-{}", n),
                    "State": state,
                    "GroupIds": groups,
                }))
            })
            .collect()
    })
}

fn instance_ids(records: &[Record]) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(|record| record.get("InstanceId").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

async fn seeded_loader(batch_size: usize) -> (Arc<MemoryGraphStore>, Loader) {
    let store = Arc::new(MemoryGraphStore::new());
    let config = LoaderConfig {
        batch_size,
        ..LoaderConfig::default()
    };
    let loader = Loader::new(store.clone(), config);
    load_accounts(&loader, TAG_1).await;
    load_security_groups(&loader, ACCOUNT_A, 3, TAG_1).await;
    (store, loader)
}

/// Edges as comparable `(start, end)` pairs, sorted
async fn edge_pairs(store: &MemoryGraphStore, rel_label: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<_> = store
        .relationships(rel_label)
        .await
        .into_iter()
        .map(|edge| (edge.start_id.to_string(), edge.end_id.to_string()))
        .collect();
    pairs.sort();
    pairs
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: loading the same records twice under one tag changes nothing
    #[test]
    fn prop_load_is_idempotent(records in arb_instances()) {
        tokio_test::block_on(async {
            let (store, loader) = seeded_loader(10_000).await;
            let schema = ec2_instance_schema();

            loader.load(&schema, &records, &account_params(ACCOUNT_A), TAG_1).await.unwrap();
            let nodes = store.fetch_nodes("EC2Instance").await.unwrap();
            let edges = store.relationships("MEMBER_OF_EC2_SECURITY_GROUP").await;

            loader.load(&schema, &records, &account_params(ACCOUNT_A), TAG_1).await.unwrap();
            prop_assert_eq!(store.fetch_nodes("EC2Instance").await.unwrap(), nodes);
            prop_assert_eq!(store.relationships("MEMBER_OF_EC2_SECURITY_GROUP").await, edges);
            prop_assert_eq!(store.count_nodes("EC2Instance").await, records.len());
            Ok(())
        })?;
    }

    /// Property: the batch size never changes the resulting graph
    #[test]
    fn prop_chunking_does_not_change_result(
        records in arb_instances(),
        batch_size in 1..5usize,
    ) {
        tokio_test::block_on(async {
            let (whole, whole_loader) = seeded_loader(10_000).await;
            let (chunked, chunked_loader) = seeded_loader(batch_size).await;
            let schema = ec2_instance_schema();

            let whole_summary = whole_loader
                .load(&schema, &records, &account_params(ACCOUNT_A), TAG_1)
                .await
                .unwrap();
            let chunked_summary = chunked_loader
                .load(&schema, &records, &account_params(ACCOUNT_A), TAG_1)
                .await
                .unwrap();

            prop_assert_eq!(whole_summary, chunked_summary);
            prop_assert_eq!(
                edge_pairs(&chunked, "MEMBER_OF_EC2_SECURITY_GROUP").await,
                edge_pairs(&whole, "MEMBER_OF_EC2_SECURITY_GROUP").await
            );
            Ok(())
        })?;
    }

    /// Property: after cleanup exactly the latest run's instances survive
    #[test]
    fn prop_cleanup_keeps_only_current_run(
        previous in arb_instances(),
        current in arb_instances(),
    ) {
        tokio_test::block_on(async {
            let (store, loader) = seeded_loader(10_000).await;
            let schema = ec2_instance_schema();

            loader.load(&schema, &previous, &account_params(ACCOUNT_A), TAG_1).await.unwrap();
            loader.load(&schema, &current, &account_params(ACCOUNT_A), TAG_2).await.unwrap();
            let common = CommonJobParameters::new(TAG_2).with_sub_resource("AWS_ID", ACCOUNT_A);
            GraphJob::from_node_schema(&schema, &common)
                .run(store.as_ref())
                .await
                .unwrap();

            let surviving: BTreeSet<String> = store
                .fetch_nodes("EC2Instance")
                .await
                .unwrap()
                .iter()
                .filter_map(|node| node.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            prop_assert_eq!(surviving, instance_ids(&current));

            for edge in store.relationships("MEMBER_OF_EC2_SECURITY_GROUP").await {
                prop_assert_eq!(edge.properties.get("lastupdated"), Some(&json!(TAG_2)));
            }
            Ok(())
        })?;
    }
}
