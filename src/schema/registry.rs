// Copyright (c) 2025 - Cowboy AI, Inc.

//! Process-wide schema registry
//!
//! Built once at startup. Holds exactly one schema per resource type (and
//! optional variant) and refuses schemas that share a primary label while
//! disagreeing on how cleanup is scoped, since their sweeps would delete
//! each other's nodes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::node::NodeSchema;
use crate::errors::{SchemaError, SchemaResult};

/// How cleanup for a label is scoped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupScope {
    /// Graph-wide sweep
    Unscoped,
    /// Sweep restricted through `(owner)-[:rel_label]->(node)`
    Scoped { rel_label: String, owner_label: String },
}

impl CleanupScope {
    pub fn of(schema: &NodeSchema) -> Self {
        match (schema.scoped_cleanup(), schema.sub_resource_relationship()) {
            (true, Some(rel)) => CleanupScope::Scoped {
                rel_label: rel.rel_label().to_string(),
                owner_label: rel.target_label().to_string(),
            },
            _ => CleanupScope::Unscoped,
        }
    }
}

impl fmt::Display for CleanupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupScope::Unscoped => write!(f, "unscoped"),
            CleanupScope::Scoped {
                rel_label,
                owner_label,
            } => write!(f, "(:{})-[:{}]->", owner_label, rel_label),
        }
    }
}

/// Registry of node schemas keyed by resource type
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, NodeSchema>,
    scopes: HashMap<String, CleanupScope>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the schema's own label
    pub fn register(&mut self, schema: NodeSchema) -> SchemaResult<()> {
        let key = schema.label().to_string();
        self.insert(key, schema)
    }

    /// Register a variant of a resource type, keyed `label/variant`
    pub fn register_variant(&mut self, variant: &str, schema: NodeSchema) -> SchemaResult<()> {
        let key = format!("{}/{}", schema.label(), variant);
        self.insert(key, schema)
    }

    fn insert(&mut self, key: String, schema: NodeSchema) -> SchemaResult<()> {
        if self.schemas.contains_key(&key) {
            return Err(SchemaError::DuplicateSchema { key });
        }
        let incoming = CleanupScope::of(&schema);
        if let Some(existing) = self.scopes.get(schema.label()) {
            if *existing != incoming {
                return Err(SchemaError::LabelScopeConflict {
                    label: schema.label().to_string(),
                    existing: existing.to_string(),
                    incoming: incoming.to_string(),
                });
            }
        }
        self.scopes.insert(schema.label().to_string(), incoming);
        self.schemas.insert(key, schema);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&NodeSchema> {
        self.schemas.get(key)
    }

    /// Cleanup scope agreed by every schema sharing `label`
    pub fn scope_of(&self, label: &str) -> Option<&CleanupScope> {
        self.scopes.get(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeSchema)> {
        self.schemas.iter().map(|(key, schema)| (key.as_str(), schema))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
