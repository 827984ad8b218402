// Copyright (c) 2025 - Cowboy AI, Inc.

//! Graph stores
//!
//! A [`GraphStore`] executes bound statements against a property graph.
//! Every call to [`GraphStore::execute`] is one transaction: either all of
//! its statements take effect or none do.
//!
//! ```text
//! Loader / GraphJob ──[BoundStatement]──> GraphStore
//!                                          ├─ MemoryGraphStore (IR interpreter)
//!                                          └─ Neo4jGraphStore  (Cypher over Bolt)
//! ```

pub mod memory;
#[cfg(feature = "neo4j")]
pub mod neo4j;

pub use memory::MemoryGraphStore;
#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jGraphStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::GraphResult;
use crate::query::BoundStatement;
use crate::record::Record;

/// Outcome of one executed statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSummary {
    /// Rows reported by `RETURN count(*) AS affected` (0 when absent)
    pub affected: u64,
}

/// Executes statements against a property graph
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Store name used in logs and errors
    fn name(&self) -> &str;

    /// Run `statements` in order inside one transaction
    async fn execute(&self, statements: &[BoundStatement]) -> GraphResult<Vec<StatementSummary>>;

    /// Properties of every node carrying `label`
    async fn fetch_nodes(&self, label: &str) -> GraphResult<Vec<Record>>;

    /// Verify the store is reachable
    async fn health_check(&self) -> GraphResult<()> {
        Ok(())
    }
}
