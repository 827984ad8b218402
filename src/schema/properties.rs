// Copyright (c) 2025 - Cowboy AI, Inc.

//! Ordered property mappings for nodes, relationships and node matchers

use std::collections::HashSet;

use super::property_ref::PropertyRef;
use crate::errors::{SchemaError, SchemaResult};

/// Node identity property, mandatory on every node type
pub const ID: &str = "id";

/// Per-run marker, mandatory on every node and relationship
pub const LASTUPDATED: &str = "lastupdated";

/// Set once by the Loader when an entity is created
pub const FIRSTSEEN: &str = "firstseen";

/// Match-link property naming the owning sub-resource's label
pub const SUB_RESOURCE_LABEL: &str = "_sub_resource_label";

/// Match-link property naming the owning sub-resource's id
pub const SUB_RESOURCE_ID: &str = "_sub_resource_id";

type Entries = Vec<(String, PropertyRef)>;

fn collect_entries<I, S>(owner: &str, entries: I, reserve_firstseen: bool) -> SchemaResult<Entries>
where
    I: IntoIterator<Item = (S, PropertyRef)>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut collected = Vec::new();
    for (name, property) in entries {
        let name = name.into();
        if reserve_firstseen && name == FIRSTSEEN {
            return Err(SchemaError::ReservedProperty {
                owner: owner.to_string(),
                property: name,
            });
        }
        super::validate_identifier(owner, &name)?;
        property.validate(owner, &name)?;
        if !seen.insert(name.clone()) {
            return Err(SchemaError::DuplicateProperty {
                owner: owner.to_string(),
                property: name,
            });
        }
        collected.push((name, property));
    }
    Ok(collected)
}

fn require(owner: &str, entries: &Entries, property: &str) -> SchemaResult<()> {
    if entries.iter().any(|(name, _)| name == property) {
        Ok(())
    } else {
        Err(SchemaError::MissingProperty {
            owner: owner.to_string(),
            property: property.to_string(),
        })
    }
}

fn lookup<'a>(entries: &'a Entries, property: &str) -> Option<&'a PropertyRef> {
    entries
        .iter()
        .find(|(name, _)| name == property)
        .map(|(_, property)| property)
}

/// Properties written on a node, always including `id` and `lastupdated`
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProperties {
    entries: Entries,
    id_index: usize,
}

impl NodeProperties {
    /// Validate and build the mapping; `owner` names the node label in errors
    pub fn new<I, S>(owner: &str, entries: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = (S, PropertyRef)>,
        S: Into<String>,
    {
        let entries = collect_entries(owner, entries, true)?;
        require(owner, &entries, LASTUPDATED)?;
        let id_index = entries
            .iter()
            .position(|(name, _)| name == ID)
            .ok_or_else(|| SchemaError::MissingProperty {
                owner: owner.to_string(),
                property: ID.to_string(),
            })?;
        Ok(Self { entries, id_index })
    }

    pub fn id(&self) -> &PropertyRef {
        &self.entries[self.id_index].1
    }

    pub fn get(&self, name: &str) -> Option<&PropertyRef> {
        lookup(&self.entries, name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyRef)> {
        self.entries.iter().map(|(name, property)| (name.as_str(), property))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Properties written on a relationship, always including `lastupdated`
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipProperties {
    entries: Entries,
}

impl RelationshipProperties {
    pub fn new<I, S>(owner: &str, entries: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = (S, PropertyRef)>,
        S: Into<String>,
    {
        let entries = collect_entries(owner, entries, true)?;
        require(owner, &entries, LASTUPDATED)?;
        Ok(Self { entries })
    }

    /// Match-links carry their own cleanup scope
    ///
    /// The match-link sweep reads the scope properties without a record, so
    /// both must come from batch parameters.
    pub(crate) fn require_match_link_scope(&self, owner: &str) -> SchemaResult<()> {
        for property in [SUB_RESOURCE_LABEL, SUB_RESOURCE_ID] {
            require(owner, &self.entries, property)?;
            if lookup(&self.entries, property).is_some_and(|p| !p.is_batch_parameter()) {
                return Err(SchemaError::SubResourceMatcher {
                    owner: owner.to_string(),
                    property: property.to_string(),
                    reason: "must be a batch parameter".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PropertyRef> {
        lookup(&self.entries, name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyRef)> {
        self.entries.iter().map(|(name, property)| (name.as_str(), property))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Locates the other endpoint of a relationship by node property
///
/// Keys are properties of the node being matched; values say where the
/// expected value comes from. Used for both target and source matchers.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMatcher {
    entries: Entries,
}

/// Target-side matcher of a relationship
pub type TargetNodeMatcher = NodeMatcher;

/// Source-side matcher of a match-link
pub type SourceNodeMatcher = NodeMatcher;

impl NodeMatcher {
    pub fn new<I, S>(owner: &str, entries: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = (S, PropertyRef)>,
        S: Into<String>,
    {
        let entries = collect_entries(owner, entries, false)?;
        if entries.is_empty() {
            return Err(SchemaError::MissingProperty {
                owner: owner.to_string(),
                property: "<matcher key>".to_string(),
            });
        }
        if entries.iter().filter(|(_, p)| p.is_one_to_many()).count() > 1 {
            return Err(SchemaError::MultipleOneToMany {
                owner: owner.to_string(),
            });
        }
        Ok(Self { entries })
    }

    /// The property expanded into one match per list element, if any
    pub fn one_to_many(&self) -> Option<(&str, &PropertyRef)> {
        self.iter().find(|(_, property)| property.is_one_to_many())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyRef)> {
        self.entries.iter().map(|(name, property)| (name.as_str(), property))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
