// Copyright (c) 2025 - Cowboy AI, Inc.

//! Staleness sweeps
//!
//! A node or relationship is stale when its `lastupdated` is absent or
//! differs from `$UPDATE_TAG`. Sweeps delete at most `$LIMIT_SIZE` entities
//! per execution and are meant to be repeated until nothing is affected.

use super::{EdgePattern, MatchLinkSweep, NodeSweep, RelationshipSweep, Statement, SweepScope};
use crate::errors::{SchemaError, SchemaResult};
use crate::schema::{NodeSchema, PropertyRef, RelationshipSchema, SUB_RESOURCE_ID, SUB_RESOURCE_LABEL};

fn edge_of(relationship: &RelationshipSchema) -> EdgePattern {
    EdgePattern {
        rel_label: relationship.rel_label().to_string(),
        direction: relationship.direction(),
        other_label: relationship.target_label().to_string(),
    }
}

/// Scope of the schema's sweeps, `None` for graph-wide cleanup
fn sweep_scope(schema: &NodeSchema) -> Option<SweepScope> {
    if !schema.scoped_cleanup() {
        return None;
    }
    schema.sub_resource_relationship().map(|rel| SweepScope {
        rel_label: rel.rel_label().to_string(),
        owner_label: rel.target_label().to_string(),
        owner_matcher: rel.target_matcher().clone(),
    })
}

/// Cleanup sweeps for a node schema
///
/// Stale nodes go first (with all their relationships), then stale
/// relationships of surviving nodes, then stale sub-resource edges.
pub fn compile_cleanup(schema: &NodeSchema) -> Vec<Statement> {
    let label = schema.label().to_string();
    let scope = sweep_scope(schema);

    let mut statements = vec![Statement::SweepNodes(NodeSweep {
        label: label.clone(),
        scope: scope.clone(),
    })];

    statements.extend(schema.other_relationships().iter().map(|relationship| {
        Statement::SweepRelationships(RelationshipSweep::Edge {
            label: label.clone(),
            scope: scope.clone(),
            edge: edge_of(relationship),
        })
    }));

    match (scope, schema.sub_resource_relationship()) {
        (Some(scope), _) => statements.push(Statement::SweepRelationships(
            RelationshipSweep::ScopeEdge { label, scope },
        )),
        (None, Some(relationship)) => statements.push(Statement::SweepRelationships(
            RelationshipSweep::Edge {
                label,
                scope: None,
                edge: edge_of(relationship),
            },
        )),
        (None, None) => {}
    }

    statements
}

fn scope_property(relationship: &RelationshipSchema, name: &str) -> SchemaResult<PropertyRef> {
    relationship
        .properties()
        .get(name)
        .cloned()
        .ok_or_else(|| SchemaError::MissingProperty {
            owner: relationship.rel_label().to_string(),
            property: name.to_string(),
        })
}

/// Sweep of stale match-links owned by one sub-resource
pub fn compile_matchlink_cleanup(relationship: &RelationshipSchema) -> SchemaResult<Statement> {
    let (source_label, _) = relationship.match_link_source()?;
    Ok(Statement::SweepMatchLinks(MatchLinkSweep {
        source_label: source_label.to_string(),
        edge: edge_of(relationship),
        scope_label: scope_property(relationship, SUB_RESOURCE_LABEL)?,
        scope_id: scope_property(relationship, SUB_RESOURCE_ID)?,
    }))
}
