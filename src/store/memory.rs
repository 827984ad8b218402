// Copyright (c) 2025 - Cowboy AI, Inc.

//! In-process property graph
//!
//! Interprets the statement IR directly with the same matching and staleness
//! rules the rendered Cypher expresses. Each `execute` call works on a copy
//! of the graph that replaces the live one only when every statement
//! succeeded. Raw query text cannot be interpreted and is rejected.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::{GraphStore, StatementSummary};
use crate::errors::{GraphError, GraphResult};
use crate::query::{
    BoundStatement, IndexTarget, MatchLinkSweep, MatchLinkUpsert, NodeSweep, NodeUpsert,
    PropertyLink, RelationshipSweep, RelationshipUpsert, Statement, SweepScope,
};
use crate::record::{
    Parameters, Record, BATCH_PARAMETER, LIMIT_SIZE_PARAMETER, UPDATE_TAG_PARAMETER,
};
use crate::schema::{
    LinkDirection, MatchMode, NodeMatcher, RelationshipSchema, FIRSTSEEN, ID, LASTUPDATED,
    SUB_RESOURCE_ID, SUB_RESOURCE_LABEL,
};

const STORE_NAME: &str = "memory";

type Key = u64;

/// A node as stored in the memory graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredNode {
    pub labels: BTreeSet<String>,
    pub properties: Record,
}

impl StoredNode {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct StoredRelationship {
    rel_label: String,
    start: Key,
    end: Key,
    properties: Record,
}

/// A relationship with both endpoints identified by their `id`
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipView {
    pub rel_label: String,
    pub start_id: Value,
    pub end_id: Value,
    pub properties: Record,
}

/// Cypher equality: null never equals anything, integers compare with floats
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => left == right,
    }
}

fn predicate_holds(actual: Option<&Value>, expected: Option<&Value>, mode: MatchMode) -> bool {
    let (Some(actual), Some(expected)) = (actual, expected) else {
        return false;
    };
    match mode {
        MatchMode::Exact => values_equal(actual, expected),
        MatchMode::CaseInsensitive => match (actual.as_str(), expected.as_str()) {
            (Some(a), Some(e)) => a.to_lowercase() == e.to_lowercase(),
            _ => false,
        },
        MatchMode::FuzzyCaseInsensitive => match (actual.as_str(), expected.as_str()) {
            (Some(a), Some(e)) => a.to_lowercase().contains(&e.to_lowercase()),
            _ => false,
        },
    }
}

/// Elements a one-to-many value unwinds to; a scalar counts as one element
fn unwind(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter(|item| !item.is_null()).collect(),
        Some(value) => vec![value],
    }
}

fn is_stale(properties: &Record, tag: &Value) -> bool {
    match properties.get(LASTUPDATED) {
        None | Some(Value::Null) => true,
        Some(value) => !tag.is_null() && !values_equal(value, tag),
    }
}

fn node_matches(
    node: &StoredNode,
    matcher: &NodeMatcher,
    record: &Record,
    params: &Parameters,
    candidate: Option<&Value>,
) -> bool {
    matcher.iter().all(|(key, property)| {
        let expected = if property.is_one_to_many() {
            candidate
        } else {
            property.resolve(record, params).present()
        };
        predicate_holds(node.get(key), expected, property.match_mode())
    })
}

/// `SET x.name = value`, where a null value removes the property
fn assign(properties: &mut Record, name: &str, value: Option<&Value>) {
    match value {
        Some(value) => {
            properties.insert(name.to_string(), value.clone());
        }
        None => {
            properties.remove(name);
        }
    }
}

fn invalid(parameter: &str, reason: &str) -> GraphError {
    GraphError::InvalidParameter {
        parameter: parameter.to_string(),
        reason: reason.to_string(),
    }
}

fn parameter<'a>(params: &'a Parameters, name: &str) -> GraphResult<&'a Value> {
    params.get(name).ok_or_else(|| invalid(name, "not bound"))
}

fn batch(params: &Parameters) -> GraphResult<Vec<&Record>> {
    match parameter(params, BATCH_PARAMETER)? {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or_else(|| invalid(BATCH_PARAMETER, "every element must be an object"))
            })
            .collect(),
        _ => Err(invalid(BATCH_PARAMETER, "must be a list of records")),
    }
}

fn limit_size(params: &Parameters) -> GraphResult<usize> {
    parameter(params, LIMIT_SIZE_PARAMETER)?
        .as_u64()
        .map(|limit| limit as usize)
        .ok_or_else(|| invalid(LIMIT_SIZE_PARAMETER, "must be a non-negative integer"))
}

#[derive(Debug, Clone, Default)]
struct Graph {
    nodes: BTreeMap<Key, StoredNode>,
    relationships: BTreeMap<Key, StoredRelationship>,
    indexes: BTreeSet<IndexTarget>,
    next_key: Key,
}

impl Graph {
    fn labelled<'a>(&'a self, label: &'a str) -> impl Iterator<Item = (Key, &'a StoredNode)> + 'a {
        self.nodes
            .iter()
            .filter(move |(_, node)| node.has_label(label))
            .map(|(key, node)| (*key, node))
    }

    fn has_label(&self, key: Key, label: &str) -> bool {
        self.nodes.get(&key).is_some_and(|node| node.has_label(label))
    }

    fn find_node(&self, label: &str, id: &Value) -> Option<Key> {
        self.labelled(label)
            .find(|(_, node)| node.get(ID).is_some_and(|value| values_equal(value, id)))
            .map(|(key, _)| key)
    }

    fn allocate(&mut self) -> Key {
        self.next_key += 1;
        self.next_key
    }

    fn insert_node(&mut self, node: StoredNode) -> Key {
        let key = self.allocate();
        self.nodes.insert(key, node);
        key
    }

    fn merge_node(&mut self, label: &str, id: &Value, now: i64) -> Key {
        if let Some(key) = self.find_node(label, id) {
            return key;
        }
        let mut node = StoredNode::default();
        node.labels.insert(label.to_string());
        node.properties.insert(ID.to_string(), id.clone());
        node.properties.insert(FIRSTSEEN.to_string(), Value::from(now));
        self.insert_node(node)
    }

    fn merge_relationship(
        &mut self,
        rel_label: &str,
        start: Key,
        end: Key,
        now: i64,
    ) -> &mut StoredRelationship {
        let existing = self
            .relationships
            .iter()
            .find(|(_, r)| r.rel_label == rel_label && r.start == start && r.end == end)
            .map(|(key, _)| *key);
        let key = existing.unwrap_or_else(|| self.allocate());
        self.relationships.entry(key).or_insert_with(|| {
            let mut properties = Record::new();
            properties.insert(FIRSTSEEN.to_string(), Value::from(now));
            StoredRelationship {
                rel_label: rel_label.to_string(),
                start,
                end,
                properties,
            }
        })
    }

    fn detach_delete(&mut self, key: Key) {
        self.relationships.retain(|_, r| r.start != key && r.end != key);
        self.nodes.remove(&key);
    }

    /// Nodes located by `matcher`, one entry per matching (element, node) row
    fn matching_nodes(
        &self,
        label: &str,
        matcher: &NodeMatcher,
        record: &Record,
        params: &Parameters,
    ) -> Vec<Key> {
        let candidates: Vec<Option<&Value>> = match matcher.one_to_many() {
            Some((_, property)) => unwind(property.resolve(record, params).present())
                .into_iter()
                .map(Some)
                .collect(),
            None => vec![None],
        };

        let mut keys = Vec::new();
        for candidate in candidates {
            let before = keys.len();
            keys.extend(
                self.labelled(label)
                    .filter(|(_, node)| node_matches(node, matcher, record, params, candidate))
                    .map(|(key, _)| key),
            );
            if let (Some(candidate), true) = (candidate, keys.len() == before) {
                debug!(label, %candidate, "No target for one-to-many element");
            }
        }
        keys
    }

    /// Whether `(s:owner)-[:rel]->(node)` exists for an owner matching `scope`
    fn owned_by(&self, node: Key, scope: &SweepScope, params: &Parameters) -> bool {
        let no_record = Record::new();
        self.relationships.values().any(|r| {
            r.rel_label == scope.rel_label
                && r.end == node
                && self.nodes.get(&r.start).is_some_and(|owner| {
                    owner.has_label(&scope.owner_label)
                        && node_matches(owner, &scope.owner_matcher, &no_record, params, None)
                })
        })
    }

    fn link(
        &mut self,
        relationship: &RelationshipSchema,
        node: Key,
        other: Key,
        record: &Record,
        params: &Parameters,
        now: i64,
    ) {
        let (start, end) = match relationship.direction() {
            LinkDirection::Outward => (node, other),
            LinkDirection::Inward => (other, node),
        };
        let stored = self.merge_relationship(relationship.rel_label(), start, end, now);
        for (name, property) in relationship.properties().iter() {
            assign(
                &mut stored.properties,
                name,
                property.resolve(record, params).present(),
            );
        }
    }

    fn apply(&mut self, statement: &Statement, params: &Parameters, now: i64) -> GraphResult<u64> {
        match statement {
            Statement::CreateIndex(target) => {
                self.indexes.insert(target.clone());
                Ok(0)
            }
            Statement::UpsertNodes(upsert) => self.upsert_nodes(upsert, params, now),
            Statement::UpsertRelationships(upsert) => self.upsert_relationships(upsert, params, now),
            Statement::UpsertMatchLinks(upsert) => self.upsert_matchlinks(upsert, params, now),
            Statement::SweepNodes(sweep) => self.sweep_nodes(sweep, params),
            Statement::SweepRelationships(sweep) => self.sweep_relationships(sweep, params),
            Statement::SweepMatchLinks(sweep) => self.sweep_matchlinks(sweep, params),
            Statement::LinkByProperty(link) => self.link_by_property(link, params, now),
            Statement::Raw(_) => Err(GraphError::UnsupportedStatement {
                store: STORE_NAME.to_string(),
                statement: statement.kind().to_string(),
            }),
        }
    }

    fn upsert_nodes(&mut self, upsert: &NodeUpsert, params: &Parameters, now: i64) -> GraphResult<u64> {
        let mut affected = 0;
        for record in batch(params)? {
            let id = upsert
                .properties
                .id()
                .resolve(record, params)
                .present()
                .ok_or_else(|| {
                    GraphError::Query(format!("cannot merge {} node with a null id", upsert.label))
                })?;
            let key = self.merge_node(&upsert.label, id, now);
            if let Some(node) = self.nodes.get_mut(&key) {
                for (name, property) in upsert.properties.iter().filter(|(name, _)| *name != ID) {
                    assign(&mut node.properties, name, property.resolve(record, params).present());
                }
                node.labels.extend(upsert.extra_labels.iter().cloned());
            }
            affected += 1;
        }
        Ok(affected)
    }

    fn upsert_relationships(
        &mut self,
        upsert: &RelationshipUpsert,
        params: &Parameters,
        now: i64,
    ) -> GraphResult<u64> {
        let relationship = &upsert.relationship;
        let mut affected = 0;
        for record in batch(params)? {
            let Some(id) = upsert.node_id.resolve(record, params).present() else {
                continue;
            };
            let Some(node) = self.find_node(&upsert.node_label, id) else {
                continue;
            };
            let targets = self.matching_nodes(
                relationship.target_label(),
                relationship.target_matcher(),
                record,
                params,
            );
            for target in targets {
                self.link(relationship, node, target, record, params, now);
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn upsert_matchlinks(
        &mut self,
        upsert: &MatchLinkUpsert,
        params: &Parameters,
        now: i64,
    ) -> GraphResult<u64> {
        let relationship = &upsert.relationship;
        let mut affected = 0;
        for record in batch(params)? {
            let sources =
                self.matching_nodes(&upsert.source_label, &upsert.source_matcher, record, params);
            if sources.is_empty() {
                continue;
            }
            let targets = self.matching_nodes(
                relationship.target_label(),
                relationship.target_matcher(),
                record,
                params,
            );
            for source in &sources {
                for target in &targets {
                    self.link(relationship, *source, *target, record, params, now);
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }

    fn sweep_nodes(&mut self, sweep: &NodeSweep, params: &Parameters) -> GraphResult<u64> {
        let tag = parameter(params, UPDATE_TAG_PARAMETER)?;
        let limit = limit_size(params)?;
        let stale: Vec<Key> = self
            .labelled(&sweep.label)
            .filter(|(key, node)| {
                is_stale(&node.properties, tag)
                    && sweep
                        .scope
                        .as_ref()
                        .map_or(true, |scope| self.owned_by(*key, scope, params))
            })
            .map(|(key, _)| key)
            .take(limit)
            .collect();
        for key in &stale {
            self.detach_delete(*key);
        }
        Ok(stale.len() as u64)
    }

    fn sweep_relationships(&mut self, sweep: &RelationshipSweep, params: &Parameters) -> GraphResult<u64> {
        let tag = parameter(params, UPDATE_TAG_PARAMETER)?;
        let limit = limit_size(params)?;
        let no_record = Record::new();
        let stale: Vec<Key> = match sweep {
            RelationshipSweep::ScopeEdge { label, scope } => self
                .relationships
                .iter()
                .filter(|(_, r)| {
                    r.rel_label == scope.rel_label
                        && is_stale(&r.properties, tag)
                        && self.has_label(r.end, label)
                        && self.nodes.get(&r.start).is_some_and(|owner| {
                            owner.has_label(&scope.owner_label)
                                && node_matches(owner, &scope.owner_matcher, &no_record, params, None)
                        })
                })
                .map(|(key, _)| *key)
                .take(limit)
                .collect(),
            RelationshipSweep::Edge { label, scope, edge } => self
                .relationships
                .iter()
                .filter(|(_, r)| {
                    let (node, other) = match edge.direction {
                        LinkDirection::Outward => (r.start, r.end),
                        LinkDirection::Inward => (r.end, r.start),
                    };
                    r.rel_label == edge.rel_label
                        && is_stale(&r.properties, tag)
                        && self.has_label(node, label)
                        && self.has_label(other, &edge.other_label)
                        && scope
                            .as_ref()
                            .map_or(true, |scope| self.owned_by(node, scope, params))
                })
                .map(|(key, _)| *key)
                .take(limit)
                .collect(),
        };
        for key in &stale {
            self.relationships.remove(key);
        }
        Ok(stale.len() as u64)
    }

    fn sweep_matchlinks(&mut self, sweep: &MatchLinkSweep, params: &Parameters) -> GraphResult<u64> {
        let tag = parameter(params, UPDATE_TAG_PARAMETER)?;
        let limit = limit_size(params)?;
        let no_record = Record::new();
        let scope_label = sweep.scope_label.resolve(&no_record, params).present();
        let scope_id = sweep.scope_id.resolve(&no_record, params).present();
        let edge = &sweep.edge;

        let stale: Vec<Key> = self
            .relationships
            .iter()
            .filter(|(_, r)| {
                let (source, other) = match edge.direction {
                    LinkDirection::Outward => (r.start, r.end),
                    LinkDirection::Inward => (r.end, r.start),
                };
                r.rel_label == edge.rel_label
                    && is_stale(&r.properties, tag)
                    && self.has_label(source, &sweep.source_label)
                    && self.has_label(other, &edge.other_label)
                    && predicate_holds(r.properties.get(SUB_RESOURCE_LABEL), scope_label, MatchMode::Exact)
                    && predicate_holds(r.properties.get(SUB_RESOURCE_ID), scope_id, MatchMode::Exact)
            })
            .map(|(key, _)| *key)
            .take(limit)
            .collect();
        for key in &stale {
            self.relationships.remove(key);
        }
        Ok(stale.len() as u64)
    }

    fn link_by_property(&mut self, link: &PropertyLink, params: &Parameters, now: i64) -> GraphResult<u64> {
        let tag = parameter(params, UPDATE_TAG_PARAMETER)?.clone();
        let mut pairs = Vec::new();
        for (from_key, from) in self.labelled(&link.from_label) {
            let Some(value) = from.get(&link.from_property).filter(|value| !value.is_null()) else {
                continue;
            };
            for (to_key, to) in self.labelled(&link.to_label) {
                if predicate_holds(to.get(&link.to_property), Some(value), link.match_mode) {
                    pairs.push((from_key, to_key));
                }
            }
        }
        for (start, end) in &pairs {
            let stored = self.merge_relationship(&link.rel_label, *start, *end, now);
            stored.properties.insert(LASTUPDATED.to_string(), tag.clone());
        }
        Ok(pairs.len() as u64)
    }
}

/// Property graph held in process memory
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graph: Mutex<Graph>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node directly, bypassing schemas and tags
    pub async fn seed_node(&self, labels: &[&str], properties: Record) {
        let node = StoredNode {
            labels: labels.iter().map(|label| label.to_string()).collect(),
            properties,
        };
        self.graph.lock().await.insert_node(node);
    }

    /// Node with `label` whose `id` equals `id`
    pub async fn node(&self, label: &str, id: impl Into<Value>) -> Option<StoredNode> {
        let graph = self.graph.lock().await;
        let key = graph.find_node(label, &id.into())?;
        graph.nodes.get(&key).cloned()
    }

    pub async fn count_nodes(&self, label: &str) -> usize {
        self.graph.lock().await.labelled(label).count()
    }

    /// Every relationship of type `rel_label`, in creation order
    pub async fn relationships(&self, rel_label: &str) -> Vec<RelationshipView> {
        let graph = self.graph.lock().await;
        let id_of = |key: Key| {
            graph
                .nodes
                .get(&key)
                .and_then(|node| node.get(ID))
                .cloned()
                .unwrap_or(Value::Null)
        };
        graph
            .relationships
            .values()
            .filter(|r| r.rel_label == rel_label)
            .map(|r| RelationshipView {
                rel_label: r.rel_label.clone(),
                start_id: id_of(r.start),
                end_id: id_of(r.end),
                properties: r.properties.clone(),
            })
            .collect()
    }

    pub async fn count_relationships(&self, rel_label: &str) -> usize {
        self.graph
            .lock()
            .await
            .relationships
            .values()
            .filter(|r| r.rel_label == rel_label)
            .count()
    }

    pub async fn indexes(&self) -> Vec<IndexTarget> {
        self.graph.lock().await.indexes.iter().cloned().collect()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    fn name(&self) -> &str {
        STORE_NAME
    }

    async fn execute(&self, statements: &[BoundStatement]) -> GraphResult<Vec<StatementSummary>> {
        let mut graph = self.graph.lock().await;
        let mut working = graph.clone();
        let now = Utc::now().timestamp_millis();

        let mut summaries = Vec::with_capacity(statements.len());
        for bound in statements {
            bound.check_parameters()?;
            let affected = working.apply(&bound.statement, &bound.parameters, now)?;
            debug!(
                store = STORE_NAME,
                statement = bound.statement.kind(),
                affected,
                "Executed statement"
            );
            summaries.push(StatementSummary { affected });
        }

        *graph = working;
        Ok(summaries)
    }

    async fn fetch_nodes(&self, label: &str) -> GraphResult<Vec<Record>> {
        Ok(self
            .graph
            .lock()
            .await
            .labelled(label)
            .map(|(_, node)| node.properties.clone())
            .collect())
    }
}
