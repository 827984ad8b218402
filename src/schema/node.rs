// Copyright (c) 2025 - Cowboy AI, Inc.

//! Node schemas

use super::properties::NodeProperties;
use super::relationship::RelationshipSchema;
use super::validate_identifier;
use crate::errors::{SchemaError, SchemaResult};

/// Immutable description of one resource type
///
/// Built once per resource type through [`NodeSchema::builder`] and reused
/// for every batch of that type.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSchema {
    label: String,
    properties: NodeProperties,
    extra_labels: Vec<String>,
    sub_resource_relationship: Option<RelationshipSchema>,
    other_relationships: Vec<RelationshipSchema>,
    scoped_cleanup: bool,
}

impl NodeSchema {
    pub fn builder(label: impl Into<String>, properties: NodeProperties) -> NodeSchemaBuilder {
        NodeSchemaBuilder {
            label: label.into(),
            properties,
            extra_labels: Vec::new(),
            sub_resource_relationship: None,
            other_relationships: Vec::new(),
            scoped_cleanup: true,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn properties(&self) -> &NodeProperties {
        &self.properties
    }

    pub fn extra_labels(&self) -> &[String] {
        &self.extra_labels
    }

    pub fn sub_resource_relationship(&self) -> Option<&RelationshipSchema> {
        self.sub_resource_relationship.as_ref()
    }

    pub fn other_relationships(&self) -> &[RelationshipSchema] {
        &self.other_relationships
    }

    /// Whether cleanup is restricted to the owning sub-resource
    pub fn scoped_cleanup(&self) -> bool {
        self.scoped_cleanup
    }

    /// Embedded relationships in load order: others first, sub-resource last
    pub fn relationships(&self) -> impl Iterator<Item = &RelationshipSchema> {
        self.other_relationships
            .iter()
            .chain(self.sub_resource_relationship.iter())
    }
}

/// Builder for [`NodeSchema`]; all checks run in [`NodeSchemaBuilder::build`]
#[derive(Debug, Clone)]
pub struct NodeSchemaBuilder {
    label: String,
    properties: NodeProperties,
    extra_labels: Vec<String>,
    sub_resource_relationship: Option<RelationshipSchema>,
    other_relationships: Vec<RelationshipSchema>,
    scoped_cleanup: bool,
}

impl NodeSchemaBuilder {
    /// Apply `label` to every loaded node in addition to the primary label
    pub fn extra_label(mut self, label: impl Into<String>) -> Self {
        self.extra_labels.push(label.into());
        self
    }

    /// The owning tenant/account/project relationship
    pub fn sub_resource(mut self, relationship: RelationshipSchema) -> Self {
        self.sub_resource_relationship = Some(relationship);
        self
    }

    pub fn relationship(mut self, relationship: RelationshipSchema) -> Self {
        self.other_relationships.push(relationship);
        self
    }

    /// Defaults to `true`; pass `false` for types without a tenant-like owner
    pub fn scoped_cleanup(mut self, scoped: bool) -> Self {
        self.scoped_cleanup = scoped;
        self
    }

    pub fn build(self) -> SchemaResult<NodeSchema> {
        let owner = self.label.as_str();
        validate_identifier(owner, owner)?;

        for (i, extra) in self.extra_labels.iter().enumerate() {
            validate_identifier(owner, extra)?;
            if extra == owner || self.extra_labels[..i].contains(extra) {
                return Err(SchemaError::DuplicateProperty {
                    owner: owner.to_string(),
                    property: format!(":{}", extra),
                });
            }
        }

        if let Some(sub_resource) = &self.sub_resource_relationship {
            if sub_resource.is_match_link() {
                return Err(SchemaError::EmbeddedMatchLink {
                    owner: owner.to_string(),
                    rel_label: sub_resource.rel_label().to_string(),
                });
            }
            sub_resource.validate_as_sub_resource(owner)?;
        } else if self.scoped_cleanup {
            return Err(SchemaError::ScopedCleanupWithoutSubResource {
                owner: owner.to_string(),
            });
        }

        if let Some(rel) = self.other_relationships.iter().find(|rel| rel.is_match_link()) {
            return Err(SchemaError::EmbeddedMatchLink {
                owner: owner.to_string(),
                rel_label: rel.rel_label().to_string(),
            });
        }

        Ok(NodeSchema {
            label: self.label,
            properties: self.properties,
            extra_labels: self.extra_labels,
            sub_resource_relationship: self.sub_resource_relationship,
            other_relationships: self.other_relationships,
            scoped_cleanup: self.scoped_cleanup,
        })
    }
}
