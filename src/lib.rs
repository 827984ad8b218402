// Copyright (c) 2025 - Cowboy AI, Inc.

//! Declarative inventory graph loading
//!
//! Ingestion modules describe their resource types as [`schema::NodeSchema`]s.
//! The [`query`] compiler turns a schema into idempotent batch upserts and
//! staleness sweeps, the [`loader::Loader`] runs the upserts against a
//! [`store::GraphStore`], and [`job::GraphJob`]s delete whatever the current
//! sync run did not touch.
//!
//! ```text
//! records ──Loader::load──> GraphStore   (marks: lastupdated = tag)
//!                            │
//! GraphJob::from_node_schema ┘           (sweeps: lastupdated <> tag)
//! ```
//!
//! The [`ontology`] layer builds provider-neutral concept nodes from what
//! the ingestion modules loaded.

pub mod config;
pub mod errors;
pub mod job;
pub mod loader;
pub mod ontology;
pub mod query;
pub mod record;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use config::{Credentials, GraphConfig, LoaderConfig, Neo4jConfig};
pub use errors::{
    GraphError, GraphResult, OntologyError, OntologyResult, SchemaError, SchemaResult,
};
pub use job::{CommonJobParameters, GraphJob, GraphStatement, JobDefinition, StatementDefinition};
pub use loader::{LoadSummary, Loader};
pub use record::{update_tag_now, Parameters, Record};
pub use store::{GraphStore, MemoryGraphStore, StatementSummary};
#[cfg(feature = "neo4j")]
pub use store::Neo4jGraphStore;
