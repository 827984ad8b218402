// Copyright (c) 2025 - Cowboy AI, Inc.

//! Index statements

use super::{IndexTarget, Statement};
use crate::errors::SchemaResult;
use crate::schema::{NodeMatcher, NodeSchema, RelationshipSchema, ID, LASTUPDATED};

#[derive(Default)]
struct IndexSet {
    targets: Vec<IndexTarget>,
}

impl IndexSet {
    fn add(&mut self, label: &str, property: &str) {
        let target = IndexTarget {
            label: label.to_string(),
            property: property.to_string(),
        };
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }

    fn add_matcher(&mut self, label: &str, matcher: &NodeMatcher) {
        for key in matcher.keys() {
            self.add(label, key);
        }
    }

    fn into_statements(self) -> Vec<Statement> {
        self.targets.into_iter().map(Statement::CreateIndex).collect()
    }
}

/// Index statements for a node schema, deduplicated in first-seen order
///
/// Covers the node's `id` and `lastupdated`, properties flagged
/// `extra_index`, `id` under every extra label, and the matcher keys of
/// every relationship target.
pub fn compile_indexes(schema: &NodeSchema) -> Vec<Statement> {
    let mut set = IndexSet::default();
    set.add(schema.label(), ID);
    set.add(schema.label(), LASTUPDATED);
    for (name, property) in schema.properties().iter() {
        if property.has_extra_index() {
            set.add(schema.label(), name);
        }
    }
    for label in schema.extra_labels() {
        set.add(label, ID);
    }
    for relationship in schema.relationships() {
        set.add_matcher(relationship.target_label(), relationship.target_matcher());
    }
    set.into_statements()
}

/// Index statements for both endpoints of a match-link
pub fn compile_matchlink_indexes(relationship: &RelationshipSchema) -> SchemaResult<Vec<Statement>> {
    let (source_label, source_matcher) = relationship.match_link_source()?;
    let mut set = IndexSet::default();
    set.add_matcher(source_label, source_matcher);
    set.add_matcher(relationship.target_label(), relationship.target_matcher());
    Ok(set.into_statements())
}
