// Copyright (c) 2025 - Cowboy AI, Inc.

//! Query compiler
//!
//! Compiles schemas into [`Statement`]s: a small intermediate form that the
//! Neo4j store renders to Cypher and the in-memory store interprets
//! directly. Compilation is pure; binding parameters and running the
//! statements is the job of [`crate::loader`] and [`crate::job`].
//!
//! # Wire contract
//!
//! Rendered statements iterate the record batch as `item`
//! (`UNWIND $DictList AS item`) and reference per-batch values as
//! `$<name>`. Write statements end with `RETURN count(*) AS affected`.
//!
//! ```text
//! NodeSchema ──compile_node_load──> [UpsertNodes, UpsertRelationships…]
//!            ──compile_indexes────> [CreateIndex…]
//!            ──compile_cleanup────> [SweepNodes, SweepRelationships…]
//! ```

pub mod cleanup;
pub mod cypher;
pub mod index;
pub mod ingest;

pub use cleanup::{compile_cleanup, compile_matchlink_cleanup};
pub use index::{compile_indexes, compile_matchlink_indexes};
pub use ingest::{compile_matchlink, compile_node_load};

use serde::{Deserialize, Serialize};

use crate::errors::{GraphError, GraphResult};
use crate::record::Parameters;
use crate::schema::{LinkDirection, MatchMode, NodeMatcher, NodeProperties, PropertyRef, RelationshipSchema};

/// A compiled statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Ensure an index on `(label, property)`
    CreateIndex(IndexTarget),
    /// Locate-or-create nodes by id and set their properties
    UpsertNodes(NodeUpsert),
    /// Locate-or-create one embedded relationship per record and target
    UpsertRelationships(RelationshipUpsert),
    /// Locate-or-create standalone relationships between existing nodes
    UpsertMatchLinks(MatchLinkUpsert),
    /// Delete stale nodes and their relationships
    SweepNodes(NodeSweep),
    /// Delete stale relationships of a node type
    SweepRelationships(RelationshipSweep),
    /// Delete stale match-links of one sub-resource
    SweepMatchLinks(MatchLinkSweep),
    /// Link every node of one label to nodes of another sharing a property value
    LinkByProperty(PropertyLink),
    /// Literal query text from a job definition
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexTarget {
    pub label: String,
    pub property: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeUpsert {
    pub label: String,
    pub extra_labels: Vec<String>,
    pub properties: NodeProperties,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipUpsert {
    /// Label of the node being loaded
    pub node_label: String,
    /// Id reference of the node being loaded
    pub node_id: PropertyRef,
    pub relationship: RelationshipSchema,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchLinkUpsert {
    pub source_label: String,
    pub source_matcher: NodeMatcher,
    pub relationship: RelationshipSchema,
}

/// The owning sub-resource a sweep is restricted to
///
/// Matches `(n)<-[:rel_label]-(s:owner_label)` where `s` satisfies
/// `owner_matcher`.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepScope {
    pub rel_label: String,
    pub owner_label: String,
    pub owner_matcher: NodeMatcher,
}

/// A relationship hanging off the swept node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePattern {
    pub rel_label: String,
    pub direction: LinkDirection,
    pub other_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSweep {
    pub label: String,
    pub scope: Option<SweepScope>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelationshipSweep {
    /// Stale edges to the scoping sub-resource itself
    ScopeEdge { label: String, scope: SweepScope },
    /// Stale edges of `label` nodes matching `edge`, optionally scoped
    Edge {
        label: String,
        scope: Option<SweepScope>,
        edge: EdgePattern,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchLinkSweep {
    pub source_label: String,
    pub edge: EdgePattern,
    /// Reference compared against `r._sub_resource_label`
    pub scope_label: PropertyRef,
    /// Reference compared against `r._sub_resource_id`
    pub scope_id: PropertyRef,
}

/// Links every `from_label` node to every `to_label` node whose properties agree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyLink {
    pub from_label: String,
    pub from_property: String,
    pub rel_label: String,
    pub to_label: String,
    pub to_property: String,
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl Statement {
    /// Cypher text of this statement
    pub fn cypher(&self) -> String {
        cypher::render(self)
    }

    /// Short name used in logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::CreateIndex(_) => "create_index",
            Statement::UpsertNodes(_) => "upsert_nodes",
            Statement::UpsertRelationships(_) => "upsert_relationships",
            Statement::UpsertMatchLinks(_) => "upsert_match_links",
            Statement::SweepNodes(_) => "sweep_nodes",
            Statement::SweepRelationships(_) => "sweep_relationships",
            Statement::SweepMatchLinks(_) => "sweep_match_links",
            Statement::LinkByProperty(_) => "link_by_property",
            Statement::Raw(_) => "raw",
        }
    }

    /// Schema statements cannot share a transaction with data writes
    pub fn is_schema_change(&self) -> bool {
        matches!(self, Statement::CreateIndex(_))
    }

    /// Every `$name` the rendered text references
    pub fn parameters(&self) -> Vec<String> {
        cypher::referenced_parameters(&self.cypher())
    }
}

/// A statement together with the values it is executed with
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub statement: Statement,
    pub parameters: Parameters,
}

impl BoundStatement {
    pub fn new(statement: Statement, parameters: Parameters) -> Self {
        Self {
            statement,
            parameters,
        }
    }

    /// Fail before execution if a referenced parameter is unbound
    pub fn check_parameters(&self) -> GraphResult<()> {
        match self
            .statement
            .parameters()
            .into_iter()
            .find(|name| !self.parameters.contains(name))
        {
            Some(parameter) => Err(GraphError::MissingParameter {
                statement: self.statement.kind().to_string(),
                parameter,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_parameters_reports_first_unbound() {
        let bound = BoundStatement::new(
            Statement::Raw("MATCH (n:AWSAccount {id: $AWS_ID}) WHERE n.lastupdated <> $UPDATE_TAG DETACH DELETE n".to_string()),
            Parameters::new().with("UPDATE_TAG", 1),
        );
        let err = bound.check_parameters().unwrap_err();
        assert!(matches!(
            err,
            GraphError::MissingParameter { ref parameter, .. } if parameter == "AWS_ID"
        ));

        let bound = BoundStatement::new(
            bound.statement.clone(),
            Parameters::new().with("UPDATE_TAG", 1).with("AWS_ID", "123"),
        );
        assert!(bound.check_parameters().is_ok());
    }

    #[test]
    fn test_quoted_dollar_needs_no_binding() {
        let bound = BoundStatement::new(
            Statement::Raw(
                "MATCH (n:Tag) WHERE n.key = 'cost$center' AND n.lastupdated <> $UPDATE_TAG\n\
                 WITH n LIMIT $LIMIT_SIZE DETACH DELETE n RETURN count(*) AS affected"
                    .to_string(),
            ),
            Parameters::new().with("UPDATE_TAG", 2).with("LIMIT_SIZE", 100),
        );
        assert!(bound.check_parameters().is_ok());
    }
}
