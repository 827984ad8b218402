// Copyright (c) 2025 - Cowboy AI, Inc.

//! Loader: executes compiled load statements against a graph store
//!
//! One call to [`Loader::load`] is one unit of execution. Records are split
//! into `UNWIND` batches, and every batch of every statement runs inside a
//! single store transaction, so either the whole call is visible or none of
//! it is. The Loader never retries; failures go back to the calling sync.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::errors::GraphResult;
use crate::query::{
    compile_indexes, compile_matchlink, compile_matchlink_indexes, compile_node_load,
    BoundStatement, Statement,
};
use crate::record::{Parameters, Record, BATCH_PARAMETER, LASTUPDATED_PARAMETER};
use crate::schema::{NodeSchema, RelationshipSchema};
use crate::store::GraphStore;

/// What one load call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Records passed in by the caller
    pub received: usize,
    /// Records dropped because their `id` was missing or null
    pub skipped: usize,
    /// Records sent to the store
    pub loaded: usize,
    /// Relationship rows written across all relationship statements
    pub relationships: u64,
}

/// Executes load statements in batches
#[derive(Clone)]
pub struct Loader {
    store: Arc<dyn GraphStore>,
    config: LoaderConfig,
}

impl Loader {
    pub fn new(store: Arc<dyn GraphStore>, config: LoaderConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Create the indexes `schema` relies on, one transaction per index
    pub async fn ensure_indexes(&self, schema: &NodeSchema) -> GraphResult<usize> {
        self.run_indexes(compile_indexes(schema)).await
    }

    /// Create the indexes a match-link relies on
    pub async fn ensure_matchlink_indexes(&self, relationship: &RelationshipSchema) -> GraphResult<usize> {
        self.run_indexes(compile_matchlink_indexes(relationship)?).await
    }

    async fn run_indexes(&self, statements: Vec<Statement>) -> GraphResult<usize> {
        let count = statements.len();
        for statement in statements {
            self.store
                .execute(&[BoundStatement::new(statement, Parameters::new())])
                .await?;
        }
        debug!("Ensured {} indexes", count);
        Ok(count)
    }

    /// Load `records` as nodes of `schema` with their embedded relationships
    ///
    /// `params` supplies every batch parameter the schema references except
    /// `lastupdated`, which is bound to `update_tag`.
    pub async fn load(
        &self,
        schema: &NodeSchema,
        records: &[Record],
        params: &Parameters,
        update_tag: i64,
    ) -> GraphResult<LoadSummary> {
        self.ensure_indexes(schema).await?;

        let id = schema.properties().id();
        let (kept, skipped): (Vec<&Record>, Vec<&Record>) = records
            .iter()
            .partition(|record| id.resolve(record, params).present().is_some());
        for _ in &skipped {
            warn!("Skipping {} record without '{}'", schema.label(), id.name());
        }

        let statements = compile_node_load(schema);
        let executed = self.execute_batches(&statements, &kept, params, update_tag).await?;

        let summary = LoadSummary {
            received: records.len(),
            skipped: skipped.len(),
            loaded: kept.len(),
            relationships: executed
                .iter()
                .filter(|(statement, _)| !matches!(statement, Statement::UpsertNodes(_)))
                .map(|(_, affected)| affected)
                .sum(),
        };
        info!(
            "Loaded {} {} nodes ({} skipped, {} relationships) with tag {}",
            summary.loaded,
            schema.label(),
            summary.skipped,
            summary.relationships,
            update_tag
        );
        Ok(summary)
    }

    /// Load standalone relationships between already loaded nodes
    pub async fn load_matchlinks(
        &self,
        relationship: &RelationshipSchema,
        records: &[Record],
        params: &Parameters,
        update_tag: i64,
    ) -> GraphResult<LoadSummary> {
        self.ensure_matchlink_indexes(relationship).await?;

        let statements = [compile_matchlink(relationship)?];
        let kept: Vec<&Record> = records.iter().collect();
        let executed = self.execute_batches(&statements, &kept, params, update_tag).await?;

        let summary = LoadSummary {
            received: records.len(),
            skipped: 0,
            loaded: records.len(),
            relationships: executed.iter().map(|(_, affected)| affected).sum(),
        };
        info!(
            "Loaded {} {} match-links with tag {}",
            summary.relationships,
            relationship.rel_label(),
            update_tag
        );
        Ok(summary)
    }

    /// Bind every statement to every batch and run them in one transaction
    ///
    /// Parameters are checked before anything executes, even for an empty
    /// record list.
    async fn execute_batches<'a>(
        &self,
        statements: &'a [Statement],
        records: &[&Record],
        params: &Parameters,
        update_tag: i64,
    ) -> GraphResult<Vec<(&'a Statement, u64)>> {
        let mut base = params.clone();
        base.insert(LASTUPDATED_PARAMETER, update_tag);
        base.insert(BATCH_PARAMETER, Value::Array(Vec::new()));
        for statement in statements {
            BoundStatement::new(statement.clone(), base.clone()).check_parameters()?;
        }
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut bound = Vec::new();
        let mut order = Vec::new();
        for chunk in records.chunks(self.config.batch_size.max(1)) {
            let batch: Vec<Value> = chunk.iter().map(|record| Value::Object((*record).clone())).collect();
            let chunk_params = base.clone().with(BATCH_PARAMETER, Value::Array(batch));
            for statement in statements {
                bound.push(BoundStatement::new(statement.clone(), chunk_params.clone()));
                order.push(statement);
            }
        }

        debug!(
            "Executing {} statements over {} records on {}",
            bound.len(),
            records.len(),
            self.store.name()
        );
        let summaries = self.store.execute(&bound).await?;
        Ok(order
            .into_iter()
            .zip(summaries)
            .map(|(statement, summary)| (statement, summary.affected))
            .collect())
    }
}
