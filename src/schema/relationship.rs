// Copyright (c) 2025 - Cowboy AI, Inc.

//! Relationship schemas

use serde::{Deserialize, Serialize};

use super::properties::{NodeMatcher, RelationshipProperties};
use super::property_ref::MatchMode;
use super::validate_identifier;
use crate::errors::{SchemaError, SchemaResult};

/// Direction of a relationship relative to the node being loaded
///
/// - `Inward`: `(loaded)<-[:REL]-(target)`
/// - `Outward`: `(loaded)-[:REL]->(target)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    Inward,
    Outward,
}

/// How a relationship's target (and, for match-links, source) is found
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipSchema {
    target_label: String,
    target_matcher: NodeMatcher,
    rel_label: String,
    direction: LinkDirection,
    properties: RelationshipProperties,
    source_label: Option<String>,
    source_matcher: Option<NodeMatcher>,
}

impl RelationshipSchema {
    /// Relationship embedded in a node schema; the source is the loaded node
    pub fn new(
        target_label: impl Into<String>,
        target_matcher: NodeMatcher,
        rel_label: impl Into<String>,
        direction: LinkDirection,
        properties: RelationshipProperties,
    ) -> SchemaResult<Self> {
        let schema = Self {
            target_label: target_label.into(),
            target_matcher,
            rel_label: rel_label.into(),
            direction,
            properties,
            source_label: None,
            source_matcher: None,
        };
        validate_identifier(&schema.rel_label, &schema.rel_label)?;
        validate_identifier(&schema.rel_label, &schema.target_label)?;
        Ok(schema)
    }

    /// Standalone relationship connecting two already-loaded nodes
    ///
    /// The properties must carry `_sub_resource_label` and `_sub_resource_id`
    /// so that cleanup can scope the relationship itself.
    pub fn match_link(
        source_label: impl Into<String>,
        source_matcher: NodeMatcher,
        target_label: impl Into<String>,
        target_matcher: NodeMatcher,
        rel_label: impl Into<String>,
        direction: LinkDirection,
        properties: RelationshipProperties,
    ) -> SchemaResult<Self> {
        let mut schema = Self::new(target_label, target_matcher, rel_label, direction, properties)?;
        let source_label = source_label.into();
        validate_identifier(&schema.rel_label, &source_label)?;
        schema.properties.require_match_link_scope(&schema.rel_label)?;
        schema.source_label = Some(source_label);
        schema.source_matcher = Some(source_matcher);
        Ok(schema)
    }

    pub fn target_label(&self) -> &str {
        &self.target_label
    }

    pub fn target_matcher(&self) -> &NodeMatcher {
        &self.target_matcher
    }

    pub fn rel_label(&self) -> &str {
        &self.rel_label
    }

    pub fn direction(&self) -> LinkDirection {
        self.direction
    }

    pub fn properties(&self) -> &RelationshipProperties {
        &self.properties
    }

    pub fn source_label(&self) -> Option<&str> {
        self.source_label.as_deref()
    }

    pub fn source_matcher(&self) -> Option<&NodeMatcher> {
        self.source_matcher.as_ref()
    }

    pub fn is_match_link(&self) -> bool {
        self.source_label.is_some()
    }

    /// Source endpoint of a match-link
    pub(crate) fn match_link_source(&self) -> SchemaResult<(&str, &NodeMatcher)> {
        match (self.source_label.as_deref(), self.source_matcher.as_ref()) {
            (Some(label), Some(matcher)) => Ok((label, matcher)),
            _ => Err(SchemaError::MissingMatchLinkSource {
                owner: self.rel_label.clone(),
            }),
        }
    }

    /// Checks for use as the owning tenant relationship of `owner`
    ///
    /// The cleanup job scopes its sweep through this relationship, binding the
    /// matcher from common job parameters, so identity must be exact and come
    /// from batch parameters.
    pub(crate) fn validate_as_sub_resource(&self, owner: &str) -> SchemaResult<()> {
        if self.direction != LinkDirection::Inward {
            return Err(SchemaError::SubResourceDirection {
                owner: owner.to_string(),
                rel_label: self.rel_label.clone(),
            });
        }
        for (name, property) in self.target_matcher.iter() {
            let reason = if property.match_mode() != MatchMode::Exact {
                Some("must use exact matching")
            } else if property.is_one_to_many() {
                Some("cannot be one-to-many")
            } else if !property.is_batch_parameter() {
                Some("must be a batch parameter")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(SchemaError::SubResourceMatcher {
                    owner: owner.to_string(),
                    property: name.to_string(),
                    reason: reason.to_string(),
                });
            }
        }
        Ok(())
    }
}
