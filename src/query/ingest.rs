// Copyright (c) 2025 - Cowboy AI, Inc.

//! Load statements: node upserts, embedded relationships and match-links

use super::{MatchLinkUpsert, NodeUpsert, RelationshipUpsert, Statement};
use crate::errors::SchemaResult;
use crate::schema::{NodeSchema, RelationshipSchema};

/// Statements loading one batch of `schema` records
///
/// Order is fixed: node upsert, each other relationship in declaration
/// order, then the sub-resource relationship.
pub fn compile_node_load(schema: &NodeSchema) -> Vec<Statement> {
    let mut statements = vec![Statement::UpsertNodes(NodeUpsert {
        label: schema.label().to_string(),
        extra_labels: schema.extra_labels().to_vec(),
        properties: schema.properties().clone(),
    })];

    statements.extend(schema.relationships().map(|relationship| {
        Statement::UpsertRelationships(RelationshipUpsert {
            node_label: schema.label().to_string(),
            node_id: schema.properties().id().clone(),
            relationship: relationship.clone(),
        })
    }));

    statements
}

/// Statement loading standalone relationships between existing nodes
pub fn compile_matchlink(relationship: &RelationshipSchema) -> SchemaResult<Statement> {
    let (source_label, source_matcher) = relationship.match_link_source()?;
    Ok(Statement::UpsertMatchLinks(MatchLinkUpsert {
        source_label: source_label.to_string(),
        source_matcher: source_matcher.clone(),
        relationship: relationship.clone(),
    }))
}
