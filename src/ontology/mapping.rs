// Copyright (c) 2025 - Cowboy AI, Inc.

//! Field, node and relationship mappings from provider labels to a concept

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::query::{PropertyLink, Statement};
use crate::record::Record;
use crate::schema::MatchMode;

/// Transformation applied to a source field while projecting it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialHandling {
    /// Ignore the source and always produce this value
    StaticValue(Value),
    /// Truthiness of the source value
    ToBoolean,
    /// Negated truthiness of the source value
    InvertBoolean,
    /// True if the source or any of `extra_fields` is truthy
    OrBoolean { extra_fields: Vec<String> },
    /// True if neither the source nor any of `extra_fields` is truthy
    NorBoolean { extra_fields: Vec<String> },
    /// True if the source equals one of `accepted`
    EqualBoolean { accepted: Vec<Value> },
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

impl SpecialHandling {
    pub fn apply(&self, node: &Record, node_field: &str) -> Value {
        let value = node.get(node_field).filter(|value| !value.is_null());
        let any_of = |extra: &[String]| {
            truthy(value) || extra.iter().any(|field| truthy(node.get(field)))
        };
        match self {
            SpecialHandling::StaticValue(fixed) => fixed.clone(),
            SpecialHandling::ToBoolean => match value {
                Some(_) => Value::Bool(truthy(value)),
                None => Value::Null,
            },
            SpecialHandling::InvertBoolean => match value {
                Some(_) => Value::Bool(!truthy(value)),
                None => Value::Null,
            },
            SpecialHandling::OrBoolean { extra_fields } => Value::Bool(any_of(extra_fields)),
            SpecialHandling::NorBoolean { extra_fields } => Value::Bool(!any_of(extra_fields)),
            SpecialHandling::EqualBoolean { accepted } => {
                Value::Bool(value.is_some_and(|value| accepted.contains(value)))
            }
        }
    }
}

/// One ontology field read from one node property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyFieldMapping {
    pub ontology_field: String,
    pub node_field: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub handling: Option<SpecialHandling>,
}

impl OntologyFieldMapping {
    pub fn new(ontology_field: impl Into<String>, node_field: impl Into<String>) -> Self {
        Self {
            ontology_field: ontology_field.into(),
            node_field: node_field.into(),
            required: false,
            handling: None,
        }
    }

    /// Records without this field are dropped instead of merged
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn handling(mut self, handling: SpecialHandling) -> Self {
        self.handling = Some(handling);
        self
    }

    pub fn project(&self, node: &Record) -> Value {
        match &self.handling {
            Some(handling) => handling.apply(node, &self.node_field),
            None => node.get(&self.node_field).cloned().unwrap_or(Value::Null),
        }
    }
}

/// How nodes of one provider label project onto the concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyNodeMapping {
    pub node_label: String,
    pub fields: Vec<OntologyFieldMapping>,
    /// Whether these nodes may create concept nodes, or only be linked to them
    #[serde(default = "default_eligible")]
    pub eligible_for_source: bool,
}

fn default_eligible() -> bool {
    true
}

impl OntologyNodeMapping {
    pub fn new(node_label: impl Into<String>, fields: Vec<OntologyFieldMapping>) -> Self {
        Self {
            node_label: node_label.into(),
            fields,
            eligible_for_source: true,
        }
    }

    pub fn link_only(mut self) -> Self {
        self.eligible_for_source = false;
        self
    }

    /// Project one node, or `None` when a required field is null
    pub fn project(&self, node: &Record) -> Option<Record> {
        let mut projected = Record::new();
        for field in &self.fields {
            let value = field.project(node);
            if field.required && value.is_null() {
                let id = node.get("id").cloned().unwrap_or(Value::Null);
                debug!(
                    "Dropping {} node {}: required field '{}' is missing",
                    self.node_label, id, field.node_field
                );
                return None;
            }
            projected.insert(field.ontology_field.clone(), value);
        }
        Some(projected)
    }
}

/// What a relationship mapping runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelQuery {
    Link(PropertyLink),
    /// Literal Cypher; runs only on Cypher stores
    Raw { query: String },
}

/// Statement linking concept nodes to provider nodes after a merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyRelMapping {
    pub comment: String,
    pub query: RelQuery,
}

impl OntologyRelMapping {
    pub fn link(comment: impl Into<String>, link: PropertyLink) -> Self {
        Self {
            comment: comment.into(),
            query: RelQuery::Link(link),
        }
    }

    pub fn raw(comment: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            query: RelQuery::Raw { query: query.into() },
        }
    }

    /// `(concept)-[rel_label]->(node_label)` wherever the two properties agree
    pub fn link_by_property(
        comment: impl Into<String>,
        concept_label: &str,
        concept_field: &str,
        rel_label: &str,
        node_label: &str,
        node_field: &str,
        match_mode: MatchMode,
    ) -> Self {
        Self::link(
            comment,
            PropertyLink {
                from_label: concept_label.to_string(),
                from_property: concept_field.to_string(),
                rel_label: rel_label.to_string(),
                to_label: node_label.to_string(),
                to_property: node_field.to_string(),
                match_mode,
            },
        )
    }

    pub fn statement(&self) -> Statement {
        match &self.query {
            RelQuery::Link(link) => Statement::LinkByProperty(link.clone()),
            RelQuery::Raw { query } => Statement::Raw(query.clone()),
        }
    }
}

/// Everything one source module contributes to a concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyMapping {
    pub module: String,
    pub nodes: Vec<OntologyNodeMapping>,
    #[serde(default)]
    pub rels: Vec<OntologyRelMapping>,
}

impl OntologyMapping {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            nodes: Vec::new(),
            rels: Vec::new(),
        }
    }

    pub fn node(mut self, node: OntologyNodeMapping) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn rel(mut self, rel: OntologyRelMapping) -> Self {
        self.rels.push(rel);
        self
    }
}
