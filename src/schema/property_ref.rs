// Copyright (c) 2025 - Cowboy AI, Inc.

//! Property references
//!
//! A [`PropertyRef`] says where a property's value comes from while a batch
//! is loaded: a field of the record being loaded (`item.<name>` in statement
//! text) or a value bound once for the whole batch (`$<name>`). The matching
//! modifiers only matter when the reference is part of a node matcher.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::errors::{SchemaError, SchemaResult};
use crate::record::{Parameters, Record};

/// Where a property value is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// `record[name]`, different for every record in the batch
    RecordField,
    /// `params[name]`, the same for every record in the batch
    BatchParameter,
}

/// Predicate used when the reference locates another node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Plain equality
    #[default]
    Exact,
    /// Equality after lower-casing both sides
    CaseInsensitive,
    /// Substring containment after lower-casing both sides
    FuzzyCaseInsensitive,
}

impl MatchMode {
    pub fn is_case_insensitive(&self) -> bool {
        !matches!(self, MatchMode::Exact)
    }
}

/// How many target nodes one record value identifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// The field holds a single identifying value
    #[default]
    One,
    /// The field holds a list; one relationship per resolvable element
    OneToMany,
}

/// Result of resolving a reference against a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Value(&'a Value),
    /// The record (or parameter mapping) has no such key
    Missing,
}

impl<'a> Resolved<'a> {
    /// The value, treating JSON `null` like a missing key
    pub fn present(self) -> Option<&'a Value> {
        match self {
            Resolved::Value(Value::Null) | Resolved::Missing => None,
            Resolved::Value(value) => Some(value),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Resolved::Missing)
    }
}

/// Typed indirection to a property's value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyRef {
    name: String,
    source: ValueSource,
    #[serde(default)]
    extra_index: bool,
    #[serde(default)]
    match_mode: MatchMode,
    #[serde(default)]
    cardinality: Cardinality,
}

impl PropertyRef {
    /// Reference to `record[name]`
    pub fn field(name: impl Into<String>) -> Self {
        Self::with_source(name, ValueSource::RecordField)
    }

    /// Reference to the batch parameter `name`
    pub fn batch(name: impl Into<String>) -> Self {
        Self::with_source(name, ValueSource::BatchParameter)
    }

    fn with_source(name: impl Into<String>, source: ValueSource) -> Self {
        Self {
            name: name.into(),
            source,
            extra_index: false,
            match_mode: MatchMode::Exact,
            cardinality: Cardinality::One,
        }
    }

    /// Also create an index on the property this reference populates
    pub fn extra_index(mut self) -> Self {
        self.extra_index = true;
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.match_mode = MatchMode::CaseInsensitive;
        self
    }

    pub fn fuzzy_case_insensitive(mut self) -> Self {
        self.match_mode = MatchMode::FuzzyCaseInsensitive;
        self
    }

    pub fn one_to_many(mut self) -> Self {
        self.cardinality = Cardinality::OneToMany;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> ValueSource {
        self.source
    }

    pub fn has_extra_index(&self) -> bool {
        self.extra_index
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_one_to_many(&self) -> bool {
        self.cardinality == Cardinality::OneToMany
    }

    pub fn is_batch_parameter(&self) -> bool {
        self.source == ValueSource::BatchParameter
    }

    /// Reject modifier combinations that have no defined matching semantics
    pub(crate) fn validate(&self, owner: &str, property: &str) -> SchemaResult<()> {
        super::validate_identifier(owner, &self.name)?;
        if self.is_one_to_many() && self.match_mode.is_case_insensitive() {
            return Err(SchemaError::IncompatibleModifiers {
                owner: owner.to_string(),
                property: property.to_string(),
                reason: format!(
                    "one-to-many cannot be combined with {:?} matching",
                    self.match_mode
                ),
            });
        }
        Ok(())
    }

    /// Look the value up in the record or the batch parameters
    pub fn resolve<'a>(&self, record: &'a Record, params: &'a Parameters) -> Resolved<'a> {
        let found = match self.source {
            ValueSource::RecordField => record.get(&self.name),
            ValueSource::BatchParameter => params.get(&self.name),
        };
        found.map_or(Resolved::Missing, Resolved::Value)
    }

    /// Token embedded in statement text for this reference
    pub fn render(&self) -> String {
        match self.source {
            ValueSource::RecordField => format!("item.{}", self.name),
            ValueSource::BatchParameter => format!("${}", self.name),
        }
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
