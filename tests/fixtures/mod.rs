// Copyright (c) 2025 - Cowboy AI, Inc.

//! Test Fixtures for cim-inventory-graph
//!
//! Provides deterministic schemas, records and tags shared by the
//! integration tests. All tags are fixed constants so runs are reproducible.
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;

use cim_inventory_graph::schema::*;
use cim_inventory_graph::{Loader, LoaderConfig, MemoryGraphStore, Parameters, Record};

pub const ACCOUNT_A: &str = "000000000001";
pub const ACCOUNT_B: &str = "000000000002";

// Fixed sync run tags (UNIX seconds)
pub const TAG_1: i64 = 1_768_824_000;
pub const TAG_2: i64 = TAG_1 + 3_600;

/// Build a record from a JSON object literal
pub fn record(value: Value) -> Record {
    value
        .as_object()
        .cloned()
        .expect("record fixtures must be JSON objects")
}

fn lastupdated_only(owner: &str) -> RelationshipProperties {
    RelationshipProperties::new(owner, [("lastupdated", PropertyRef::batch("lastupdated"))])
        .expect("Invalid relationship properties")
}

/// `(:AWSAccount)-[:RESOURCE]->(node)` matched by `$AWS_ID`
pub fn account_resource() -> RelationshipSchema {
    RelationshipSchema::new(
        "AWSAccount",
        NodeMatcher::new("RESOURCE", [("id", PropertyRef::batch("AWS_ID"))])
            .expect("Invalid matcher"),
        "RESOURCE",
        LinkDirection::Inward,
        lastupdated_only("RESOURCE"),
    )
    .expect("Invalid relationship")
}

/// Top-level tenant nodes, swept graph-wide
pub fn aws_account_schema() -> NodeSchema {
    NodeSchema::builder(
        "AWSAccount",
        NodeProperties::new(
            "AWSAccount",
            [
                ("id", PropertyRef::field("id")),
                ("lastupdated", PropertyRef::batch("lastupdated")),
                ("name", PropertyRef::field("name")),
            ],
        )
        .expect("Invalid node properties"),
    )
    .scoped_cleanup(false)
    .build()
    .expect("Invalid AWSAccount schema")
}

pub fn security_group_schema() -> NodeSchema {
    NodeSchema::builder(
        "EC2SecurityGroup",
        NodeProperties::new(
            "EC2SecurityGroup",
            [
                ("id", PropertyRef::field("GroupId")),
                ("lastupdated", PropertyRef::batch("lastupdated")),
                ("name", PropertyRef::field("GroupName")),
            ],
        )
        .expect("Invalid node properties"),
    )
    .sub_resource(account_resource())
    .build()
    .expect("Invalid EC2SecurityGroup schema")
}

/// Instances fan out to every security group listed in `GroupIds`
pub fn ec2_instance_schema() -> NodeSchema {
    NodeSchema::builder(
        "EC2Instance",
        NodeProperties::new(
            "EC2Instance",
            [
                ("id", PropertyRef::field("InstanceId")),
                ("lastupdated", PropertyRef::batch("lastupdated")),
                ("state", PropertyRef::field("State")),
                ("region", PropertyRef::batch("Region")),
            ],
        )
        .expect("Invalid node properties"),
    )
    .sub_resource(account_resource())
    .relationship(
        RelationshipSchema::new(
            "EC2SecurityGroup",
            NodeMatcher::new(
                "MEMBER_OF_EC2_SECURITY_GROUP",
                [("id", PropertyRef::field("GroupIds").one_to_many())],
            )
            .expect("Invalid matcher"),
            "MEMBER_OF_EC2_SECURITY_GROUP",
            LinkDirection::Outward,
            lastupdated_only("MEMBER_OF_EC2_SECURITY_GROUP"),
        )
        .expect("Invalid relationship"),
    )
    .build()
    .expect("Invalid EC2Instance schema")
}

/// `Resource` nodes pointing at pre-existing `T` nodes by `tid`
pub fn resource_schema() -> NodeSchema {
    NodeSchema::builder(
        "Resource",
        NodeProperties::new(
            "Resource",
            [
                ("id", PropertyRef::field("id")),
                ("lastupdated", PropertyRef::batch("lastupdated")),
                ("name", PropertyRef::field("name")),
            ],
        )
        .expect("Invalid node properties"),
    )
    .relationship(
        RelationshipSchema::new(
            "T",
            NodeMatcher::new("POINTS_TO", [("tid", PropertyRef::field("target_id"))])
                .expect("Invalid matcher"),
            "POINTS_TO",
            LinkDirection::Outward,
            lastupdated_only("POINTS_TO"),
        )
        .expect("Invalid relationship"),
    )
    .scoped_cleanup(false)
    .build()
    .expect("Invalid Resource schema")
}

/// Buckets labelled `Storage`, linked to owners by email and teams by name fragment
pub fn s3_bucket_schema() -> NodeSchema {
    NodeSchema::builder(
        "S3Bucket",
        NodeProperties::new(
            "S3Bucket",
            [
                ("id", PropertyRef::field("Name")),
                ("lastupdated", PropertyRef::batch("lastupdated")),
            ],
        )
        .expect("Invalid node properties"),
    )
    .extra_label("Storage")
    .extra_label("Asset")
    .sub_resource(account_resource())
    .relationship(
        RelationshipSchema::new(
            "Human",
            NodeMatcher::new("OWNED_BY", [("email", PropertyRef::field("OwnerEmail").case_insensitive())])
                .expect("Invalid matcher"),
            "OWNED_BY",
            LinkDirection::Outward,
            lastupdated_only("OWNED_BY"),
        )
        .expect("Invalid relationship"),
    )
    .relationship(
        RelationshipSchema::new(
            "Team",
            NodeMatcher::new(
                "BELONGS_TO_TEAM",
                [("name", PropertyRef::field("TeamTag").fuzzy_case_insensitive())],
            )
            .expect("Invalid matcher"),
            "BELONGS_TO_TEAM",
            LinkDirection::Outward,
            lastupdated_only("BELONGS_TO_TEAM"),
        )
        .expect("Invalid relationship"),
    )
    .build()
    .expect("Invalid S3Bucket schema")
}

/// `(:AWSRole)-[:TRUSTS_AWS_PRINCIPAL]->(:AWSPrincipal)` loaded per account
pub fn role_trust_matchlink() -> RelationshipSchema {
    RelationshipSchema::match_link(
        "AWSRole",
        NodeMatcher::new("TRUSTS_AWS_PRINCIPAL", [("arn", PropertyRef::field("RoleArn"))])
            .expect("Invalid matcher"),
        "AWSPrincipal",
        NodeMatcher::new("TRUSTS_AWS_PRINCIPAL", [("arn", PropertyRef::field("PrincipalArn"))])
            .expect("Invalid matcher"),
        "TRUSTS_AWS_PRINCIPAL",
        LinkDirection::Outward,
        RelationshipProperties::new(
            "TRUSTS_AWS_PRINCIPAL",
            [
                ("lastupdated", PropertyRef::batch("lastupdated")),
                ("_sub_resource_label", PropertyRef::batch("_sub_resource_label")),
                ("_sub_resource_id", PropertyRef::batch("_sub_resource_id")),
            ],
        )
        .expect("Invalid relationship properties"),
    )
    .expect("Invalid match-link")
}

/// A loader over a fresh in-memory store
pub fn memory_loader() -> (Arc<MemoryGraphStore>, Loader) {
    let store = Arc::new(MemoryGraphStore::new());
    let loader = Loader::new(store.clone(), LoaderConfig::default());
    (store, loader)
}

/// Batch parameters for account-scoped loads
pub fn account_params(account: &str) -> Parameters {
    Parameters::new()
        .with("AWS_ID", account)
        .with("Region", "us-east-1")
}

/// Load both fixture accounts under `tag`
pub async fn load_accounts(loader: &Loader, tag: i64) {
    loader
        .load(
            &aws_account_schema(),
            &[
                record(serde_json::json!({"id": ACCOUNT_A, "name": "prod"})),
                record(serde_json::json!({"id": ACCOUNT_B, "name": "staging"})),
            ],
            &Parameters::new(),
            tag,
        )
        .await
        .expect("Failed to load accounts");
}

/// Load security groups `sg-1`..=`sg-{count}` into `account` under `tag`
pub async fn load_security_groups(loader: &Loader, account: &str, count: usize, tag: i64) {
    let groups: Vec<Record> = (1..=count)
        .map(|i| {
            record(serde_json::json!({
                "GroupId": format!("sg-{}", i),
                "GroupName": format!("group-{}", i),
            }))
        })
        .collect();
    loader
        .load(&security_group_schema(), &groups, &account_params(account), tag)
        .await
        .expect("Failed to load security groups");
}
