// Copyright (c) 2025 - Cowboy AI, Inc.

//! Error types for schema definition, graph execution and ontology merging

use thiserror::Error;

/// Definition-time errors raised while constructing schemas
///
/// These indicate a programming mistake in a sync module. They are never
/// retried and always name the offending schema (`owner`) and field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A reserved property name was declared by a schema author
    #[error("{owner}: property '{property}' is reserved and set automatically")]
    ReservedProperty { owner: String, property: String },

    /// A mandatory property is absent
    #[error("{owner}: mandatory property '{property}' is missing")]
    MissingProperty { owner: String, property: String },

    /// The same property was declared twice in one mapping
    #[error("{owner}: property '{property}' is declared more than once")]
    DuplicateProperty { owner: String, property: String },

    /// Matching modifiers that cannot be combined
    #[error("{owner}: property '{property}' has incompatible modifiers: {reason}")]
    IncompatibleModifiers {
        owner: String,
        property: String,
        reason: String,
    },

    /// A label or property name that cannot be embedded in statement text
    #[error("{owner}: '{identifier}' is not a valid graph identifier")]
    InvalidIdentifier { owner: String, identifier: String },

    /// More than one one-to-many property in a single matcher
    #[error("{owner}: a matcher may contain at most one one-to-many property")]
    MultipleOneToMany { owner: String },

    /// The sub-resource relationship must point at the loaded node
    #[error("{owner}: sub-resource relationship '{rel_label}' must be inward")]
    SubResourceDirection { owner: String, rel_label: String },

    /// The sub-resource matcher is unusable as a cleanup scope
    #[error("{owner}: sub-resource matcher property '{property}' {reason}")]
    SubResourceMatcher {
        owner: String,
        property: String,
        reason: String,
    },

    /// A match-link was embedded in a node schema
    #[error("{owner}: relationship '{rel_label}' is a match-link and cannot be embedded")]
    EmbeddedMatchLink { owner: String, rel_label: String },

    /// Scoped cleanup was requested without anything to scope by
    #[error("{owner}: scoped cleanup requires a sub-resource relationship")]
    ScopedCleanupWithoutSubResource { owner: String },

    /// A match-link was used without a source endpoint
    #[error("{owner}: match-link requires a source label and source matcher")]
    MissingMatchLinkSource { owner: String },

    /// Two schemas share a primary label but disagree on cleanup scoping
    #[error("label '{label}' is already registered with scope {existing}, refusing scope {incoming}")]
    LabelScopeConflict {
        label: String,
        existing: String,
        incoming: String,
    },

    /// A schema was registered twice under the same key
    #[error("schema '{key}' is already registered")]
    DuplicateSchema { key: String },
}

/// Execution errors surfaced to the calling sync module
#[derive(Debug, Error)]
pub enum GraphError {
    /// Graph store is unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Neo4j driver error
    #[cfg(feature = "neo4j")]
    #[error("Neo4j database error: {0}")]
    Database(#[from] neo4rs::Error),

    /// The store rejected or failed a statement
    #[error("Query error: {0}")]
    Query(String),

    /// The store cannot interpret this kind of statement
    #[error("Unsupported statement for {store}: {statement}")]
    UnsupportedStatement { store: String, statement: String },

    /// A statement references a parameter the caller did not bind
    #[error("Statement '{statement}' requires parameter '${parameter}'")]
    MissingParameter { statement: String, parameter: String },

    /// A bound parameter has the wrong shape
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading a job document failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A schema could not be compiled into statements
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors from the ontology merge pass
#[derive(Debug, Error)]
pub enum OntologyError {
    /// No concept with this name is registered
    #[error("Unknown ontology concept: {0}")]
    UnknownConcept(String),

    /// No mapping for this module under the concept
    #[error("No ontology mapping for module '{module}' under concept '{concept}'")]
    UnknownModule { concept: String, module: String },

    /// A mapping produced an invalid node schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Loading or reading back failed
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for schema construction
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for graph execution
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type for ontology operations
pub type OntologyResult<T> = Result<T, OntologyError>;
