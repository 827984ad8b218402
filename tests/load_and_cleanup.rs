// Copyright (c) 2025 - Cowboy AI, Inc.

//! Integration tests for the load / cleanup cycle
//!
//! These tests verify the complete flow against the in-memory store:
//! 1. Load records → nodes and relationships marked with the run's tag
//! 2. Run the cleanup job → everything not marked by this run is swept
//! 3. Reload → idempotent upserts

mod fixtures;

use pretty_assertions::assert_eq;
use serde_json::json;

use cim_inventory_graph::{CommonJobParameters, GraphJob, Parameters};
use fixtures::*;

fn instance(id: &str, state: &str, groups: &[&str]) -> cim_inventory_graph::Record {
    record(json!({"InstanceId": id, "State": state, "GroupIds": groups}))
}

fn cleanup(account: &str, tag: i64) -> CommonJobParameters {
    CommonJobParameters::new(tag).with_sub_resource("AWS_ID", account)
}

#[tokio::test]
async fn test_reload_with_same_tag_is_idempotent() {
    let (store, loader) = memory_loader();
    load_accounts(&loader, TAG_1).await;
    load_security_groups(&loader, ACCOUNT_A, 2, TAG_1).await;
    let records = vec![instance("i-1", "running", &["sg-1", "sg-2"])];

    loader
        .load(&ec2_instance_schema(), &records, &account_params(ACCOUNT_A), TAG_1)
        .await
        .unwrap();
    let first_node = store.node("EC2Instance", "i-1").await.unwrap();
    let first_edges = store.relationships("MEMBER_OF_EC2_SECURITY_GROUP").await;

    loader
        .load(&ec2_instance_schema(), &records, &account_params(ACCOUNT_A), TAG_1)
        .await
        .unwrap();
    let second_node = store.node("EC2Instance", "i-1").await.unwrap();

    assert_eq!(second_node, first_node);
    assert_eq!(second_node.get("state"), Some(&json!("running")));
    assert_eq!(second_node.get("region"), Some(&json!("us-east-1")));
    assert!(second_node.get("firstseen").is_some());
    assert_eq!(store.relationships("MEMBER_OF_EC2_SECURITY_GROUP").await, first_edges);
    assert_eq!(store.count_nodes("EC2Instance").await, 1);
    assert_eq!(store.count_relationships("RESOURCE").await, 3);
}

#[tokio::test]
async fn test_unreported_nodes_are_swept() {
    let (store, loader) = memory_loader();
    load_accounts(&loader, TAG_1).await;
    load_security_groups(&loader, ACCOUNT_A, 1, TAG_1).await;
    let schema = ec2_instance_schema();

    loader
        .load(
            &schema,
            &[instance("i-1", "running", &["sg-1"]), instance("i-2", "running", &["sg-1"])],
            &account_params(ACCOUNT_A),
            TAG_1,
        )
        .await
        .unwrap();
    loader
        .load(&schema, &[instance("i-1", "stopped", &["sg-1"])], &account_params(ACCOUNT_A), TAG_2)
        .await
        .unwrap();

    GraphJob::from_node_schema(&schema, &cleanup(ACCOUNT_A, TAG_2))
        .run(store.as_ref())
        .await
        .unwrap();

    let survivor = store.node("EC2Instance", "i-1").await.unwrap();
    assert_eq!(survivor.get("state"), Some(&json!("stopped")));
    assert_eq!(survivor.get("lastupdated"), Some(&json!(TAG_2)));
    assert!(store.node("EC2Instance", "i-2").await.is_none());

    let edges = store.relationships("MEMBER_OF_EC2_SECURITY_GROUP").await;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].start_id, json!("i-1"));
}

#[tokio::test]
async fn test_cleanup_only_touches_its_sub_resource() {
    let (store, loader) = memory_loader();
    load_accounts(&loader, TAG_1).await;
    let schema = ec2_instance_schema();
    loader
        .load(&schema, &[instance("i-a", "running", &[])], &account_params(ACCOUNT_A), TAG_1)
        .await
        .unwrap();
    loader
        .load(&schema, &[instance("i-b", "running", &[])], &account_params(ACCOUNT_B), TAG_1)
        .await
        .unwrap();

    GraphJob::from_node_schema(&schema, &cleanup(ACCOUNT_B, TAG_2))
        .run(store.as_ref())
        .await
        .unwrap();
    assert!(store.node("EC2Instance", "i-a").await.is_some());
    assert!(store.node("EC2Instance", "i-b").await.is_none());

    GraphJob::from_node_schema(&schema, &cleanup(ACCOUNT_A, TAG_2))
        .run(store.as_ref())
        .await
        .unwrap();
    assert_eq!(store.count_nodes("EC2Instance").await, 0);
    assert_eq!(store.count_nodes("AWSAccount").await, 2);
}

#[tokio::test]
async fn test_one_to_many_fans_out_to_existing_targets_only() {
    let (store, loader) = memory_loader();
    load_accounts(&loader, TAG_1).await;
    load_security_groups(&loader, ACCOUNT_A, 3, TAG_1).await;

    let summary = loader
        .load(
            &ec2_instance_schema(),
            &[instance("i-1", "running", &["sg-1", "sg-2", "sg-3", "sg-404"])],
            &account_params(ACCOUNT_A),
            TAG_1,
        )
        .await
        .unwrap();

    let edges = store.relationships("MEMBER_OF_EC2_SECURITY_GROUP").await;
    let mut targets: Vec<_> = edges.iter().map(|edge| edge.end_id.clone()).collect();
    targets.sort_by_key(|id| id.to_string());
    assert_eq!(targets, vec![json!("sg-1"), json!("sg-2"), json!("sg-3")]);
    // three group edges plus the account edge
    assert_eq!(summary.relationships, 4);
}

#[tokio::test]
async fn test_stale_relationship_swept_while_node_survives() {
    let (store, loader) = memory_loader();
    load_accounts(&loader, TAG_1).await;
    load_security_groups(&loader, ACCOUNT_A, 2, TAG_1).await;
    let schema = ec2_instance_schema();

    loader
        .load(&schema, &[instance("i-1", "running", &["sg-1", "sg-2"])], &account_params(ACCOUNT_A), TAG_1)
        .await
        .unwrap();
    loader
        .load(&schema, &[instance("i-1", "running", &["sg-1"])], &account_params(ACCOUNT_A), TAG_2)
        .await
        .unwrap();
    GraphJob::from_node_schema(&schema, &cleanup(ACCOUNT_A, TAG_2))
        .run(store.as_ref())
        .await
        .unwrap();

    let edges = store.relationships("MEMBER_OF_EC2_SECURITY_GROUP").await;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].end_id, json!("sg-1"));
    assert_eq!(edges[0].properties.get("lastupdated"), Some(&json!(TAG_2)));
    assert!(store.node("EC2Instance", "i-1").await.is_some());
}

#[tokio::test]
async fn test_end_to_end_single_relationship() {
    let (store, loader) = memory_loader();
    store.seed_node(&["T"], record(json!({"id": "t1", "tid": "t1"}))).await;

    loader
        .load(
            &resource_schema(),
            &[record(json!({"id": "r1", "name": "n1", "target_id": "t1"}))],
            &Parameters::new(),
            TAG_1,
        )
        .await
        .unwrap();

    let node = store.node("Resource", "r1").await.unwrap();
    assert_eq!(node.get("name"), Some(&json!("n1")));
    let edges = store.relationships("POINTS_TO").await;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].start_id, json!("r1"));
    assert_eq!(edges[0].end_id, json!("t1"));
    assert_eq!(edges[0].properties.get("lastupdated"), Some(&json!(TAG_1)));
    assert!(edges[0].properties.get("firstseen").is_some());
}

#[tokio::test]
async fn test_extra_labels_applied_to_every_loaded_node() {
    let (store, loader) = memory_loader();
    load_accounts(&loader, TAG_1).await;

    loader
        .load(
            &s3_bucket_schema(),
            &[record(json!({"Name": "logs"})), record(json!({"Name": "backups"}))],
            &account_params(ACCOUNT_A),
            TAG_1,
        )
        .await
        .unwrap();

    assert_eq!(store.count_nodes("S3Bucket").await, 2);
    assert_eq!(store.count_nodes("Storage").await, 2);
    assert_eq!(store.count_nodes("Asset").await, 2);
    let logs = store.node("S3Bucket", "logs").await.unwrap();
    assert!(logs.labels.contains("Storage"));
}

#[tokio::test]
async fn test_case_insensitive_and_fuzzy_targets_are_matched() {
    let (store, loader) = memory_loader();
    load_accounts(&loader, TAG_1).await;
    store
        .seed_node(&["Human"], record(json!({"id": "h1", "email": "Ann.Lee@Corp.io"})))
        .await;
    store
        .seed_node(&["Team"], record(json!({"id": "t1", "name": "Platform Engineering"})))
        .await;
    store
        .seed_node(&["Team"], record(json!({"id": "t2", "name": "Data"})))
        .await;

    let summary = loader
        .load(
            &s3_bucket_schema(),
            &[
                record(json!({"Name": "logs", "OwnerEmail": "ann.lee@corp.io", "TeamTag": "PLATFORM"})),
                record(json!({"Name": "scratch", "OwnerEmail": "bob@corp.io", "TeamTag": "security"})),
            ],
            &account_params(ACCOUNT_A),
            TAG_1,
        )
        .await
        .unwrap();

    let owned = store.relationships("OWNED_BY").await;
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].start_id, json!("logs"));
    assert_eq!(owned[0].end_id, json!("h1"));

    let teams = store.relationships("BELONGS_TO_TEAM").await;
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].start_id, json!("logs"));
    assert_eq!(teams[0].end_id, json!("t1"));

    // two RESOURCE edges plus one owner and one team
    assert_eq!(summary.relationships, 4);
}

#[tokio::test]
async fn test_matchlinks_are_swept_per_sub_resource() {
    let (store, loader) = memory_loader();
    for (label, arn) in [
        ("AWSRole", "arn:role/a"),
        ("AWSRole", "arn:role/b"),
        ("AWSPrincipal", "arn:user/1"),
        ("AWSPrincipal", "arn:user/2"),
    ] {
        store.seed_node(&[label], record(json!({"id": arn, "arn": arn}))).await;
    }
    let link = role_trust_matchlink();
    let scope = |account: &str| {
        Parameters::new()
            .with("_sub_resource_label", "AWSAccount")
            .with("_sub_resource_id", account)
    };
    let trust = |role: &str, principal: &str| record(json!({"RoleArn": role, "PrincipalArn": principal}));

    loader
        .load_matchlinks(
            &link,
            &[trust("arn:role/a", "arn:user/1"), trust("arn:role/a", "arn:user/2")],
            &scope(ACCOUNT_A),
            TAG_1,
        )
        .await
        .unwrap();
    loader
        .load_matchlinks(&link, &[trust("arn:role/b", "arn:user/1")], &scope(ACCOUNT_B), TAG_1)
        .await
        .unwrap();
    let summary = loader
        .load_matchlinks(&link, &[trust("arn:role/a", "arn:user/1")], &scope(ACCOUNT_A), TAG_2)
        .await
        .unwrap();
    assert_eq!(summary.relationships, 1);

    let common = CommonJobParameters::new(TAG_2)
        .with("_sub_resource_label", "AWSAccount")
        .with("_sub_resource_id", ACCOUNT_A);
    GraphJob::from_matchlink(&link, &common)
        .unwrap()
        .run(store.as_ref())
        .await
        .unwrap();

    let mut remaining: Vec<(String, String)> = store
        .relationships("TRUSTS_AWS_PRINCIPAL")
        .await
        .into_iter()
        .map(|edge| (edge.start_id.to_string(), edge.end_id.to_string()))
        .collect();
    remaining.sort();
    assert_eq!(
        remaining,
        vec![
            ("\"arn:role/a\"".to_string(), "\"arn:user/1\"".to_string()),
            ("\"arn:role/b\"".to_string(), "\"arn:user/1\"".to_string()),
        ]
    );
}
