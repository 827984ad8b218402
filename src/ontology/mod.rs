// Copyright (c) 2025 - Cowboy AI, Inc.

//! Ontology merge layer
//!
//! Builds provider-neutral concept nodes (for example `User`) out of nodes
//! several ingestion modules already loaded (`OktaUser`, `GitHubUser`, ...).
//!
//! ```text
//! fetch source nodes ─> project fields ─> merge by id ─> Loader::load ─> rel mappings
//! ```
//!
//! Mapping tables live in an [`OntologyRegistry`] built once at startup and
//! handed to [`OntologySync`] by reference.

pub mod mapping;
pub mod merge;
pub mod sync;

pub use mapping::{
    OntologyFieldMapping, OntologyMapping, OntologyNodeMapping, OntologyRelMapping,
    RelQuery, SpecialHandling,
};
pub use merge::merge_records;
pub use sync::{OntologySummary, OntologySync};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{OntologyError, OntologyResult, SchemaError};
use crate::schema::{NodeProperties, NodeSchema, PropertyRef, ID, LASTUPDATED};

/// A provider-neutral node type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyConcept {
    /// Name used to look the concept up, e.g. `users`
    pub name: String,
    /// Label of the merged nodes, e.g. `User`
    pub label: String,
    /// Ontology field identifying a merged node, e.g. `email`
    pub id_field: String,
}

impl OntologyConcept {
    pub fn new(name: impl Into<String>, label: impl Into<String>, id_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            id_field: id_field.into(),
        }
    }
}

/// Concepts and their per-module mapping tables
#[derive(Debug, Default)]
pub struct OntologyRegistry {
    concepts: BTreeMap<String, OntologyConcept>,
    mappings: BTreeMap<String, BTreeMap<String, OntologyMapping>>,
}

impl OntologyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_concept(&mut self, concept: OntologyConcept) -> OntologyResult<()> {
        if self.concepts.contains_key(&concept.name) {
            return Err(SchemaError::DuplicateSchema { key: concept.name }.into());
        }
        self.mappings.insert(concept.name.clone(), BTreeMap::new());
        self.concepts.insert(concept.name.clone(), concept);
        Ok(())
    }

    /// Attach a module's mapping to a registered concept
    pub fn register_mapping(&mut self, concept: &str, mapping: OntologyMapping) -> OntologyResult<()> {
        let modules = self
            .mappings
            .get_mut(concept)
            .ok_or_else(|| OntologyError::UnknownConcept(concept.to_string()))?;
        if modules.contains_key(&mapping.module) {
            return Err(SchemaError::DuplicateSchema {
                key: format!("{}/{}", concept, mapping.module),
            }
            .into());
        }
        modules.insert(mapping.module.clone(), mapping);
        Ok(())
    }

    pub fn concept(&self, name: &str) -> OntologyResult<&OntologyConcept> {
        self.concepts
            .get(name)
            .ok_or_else(|| OntologyError::UnknownConcept(name.to_string()))
    }

    pub fn mapping(&self, concept: &str, module: &str) -> OntologyResult<&OntologyMapping> {
        self.mappings
            .get(concept)
            .ok_or_else(|| OntologyError::UnknownConcept(concept.to_string()))?
            .get(module)
            .ok_or_else(|| OntologyError::UnknownModule {
                concept: concept.to_string(),
                module: module.to_string(),
            })
    }

    /// Registered modules of a concept, in name order
    pub fn modules(&self, concept: &str) -> OntologyResult<Vec<&str>> {
        Ok(self
            .mappings
            .get(concept)
            .ok_or_else(|| OntologyError::UnknownConcept(concept.to_string()))?
            .keys()
            .map(String::as_str)
            .collect())
    }

    /// Schema the merged concept nodes are loaded with
    ///
    /// Properties are the union of every module's ontology fields, modules
    /// taken in name order. Concept nodes have no owning sub-resource, so
    /// cleanup is unscoped.
    pub fn node_schema(&self, concept: &str) -> OntologyResult<NodeSchema> {
        let definition = self.concept(concept)?;
        let mut entries = vec![
            (ID.to_string(), PropertyRef::field(definition.id_field.clone())),
            (LASTUPDATED.to_string(), PropertyRef::batch(LASTUPDATED)),
        ];
        let fields = self
            .mappings
            .get(concept)
            .into_iter()
            .flat_map(|modules| modules.values())
            .flat_map(|mapping| mapping.nodes.iter())
            .flat_map(|node| node.fields.iter())
            .map(|field| field.ontology_field.as_str());
        for field in fields {
            if field != ID && field != LASTUPDATED && !entries.iter().any(|(name, _)| name == field) {
                entries.push((field.to_string(), PropertyRef::field(field)));
            }
        }

        let properties = NodeProperties::new(&definition.label, entries)?;
        Ok(NodeSchema::builder(definition.label.clone(), properties)
            .scoped_cleanup(false)
            .build()?)
    }
}
