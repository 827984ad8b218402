// Copyright (c) 2025 - Cowboy AI, Inc.

//! Graph jobs: cleanup sweeps and ad-hoc statement lists
//!
//! A job is a named list of statements executed in order with a shared
//! parameter mapping. Cleanup jobs are compiled from schemas; other jobs are
//! read from JSON documents:
//!
//! ```json
//! {
//!   "name": "Link users to accounts",
//!   "statements": [
//!     { "query": "MATCH ... RETURN count(*) AS affected", "iterative": true, "iterationsize": 500 }
//!   ]
//! }
//! ```
//!
//! Iterative statements are repeated until they report zero affected rows,
//! with `$LIMIT_SIZE` bound to their iteration size.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::LoaderConfig;
use crate::errors::{GraphResult, SchemaResult};
use crate::query::{compile_cleanup, compile_matchlink_cleanup, BoundStatement, Statement};
use crate::record::{Parameters, LIMIT_SIZE_PARAMETER, UPDATE_TAG_PARAMETER};
use crate::schema::{NodeSchema, RelationshipSchema};
use crate::store::GraphStore;

fn default_iteration_size() -> usize {
    LoaderConfig::default().cleanup_iteration_size
}

/// One statement of a job document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementDefinition {
    pub query: String,
    #[serde(default)]
    pub iterative: bool,
    #[serde(default = "default_iteration_size")]
    pub iterationsize: usize,
}

/// A job document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    pub statements: Vec<StatementDefinition>,
}

impl JobDefinition {
    pub fn from_json(text: &str) -> GraphResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> GraphResult<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> GraphResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parameters every job run receives
///
/// Always binds `UPDATE_TAG` and `LIMIT_SIZE`. Scoped resource types also
/// bind the owning sub-resource's id under a resource-specific name.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonJobParameters {
    pub update_tag: i64,
    pub limit_size: usize,
    pub sub_resource: Option<(String, Value)>,
    pub extra: Parameters,
}

impl CommonJobParameters {
    pub fn new(update_tag: i64) -> Self {
        Self {
            update_tag,
            limit_size: default_iteration_size(),
            sub_resource: None,
            extra: Parameters::new(),
        }
    }

    /// Parameters whose `LIMIT_SIZE` follows the loader's cleanup iteration size
    pub fn from_config(update_tag: i64, config: &LoaderConfig) -> Self {
        Self::new(update_tag).with_limit_size(config.cleanup_iteration_size)
    }

    /// Bind the owning sub-resource, e.g. `("AWS_ID", "1234")`
    pub fn with_sub_resource(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sub_resource = Some((name.into(), value.into()));
        self
    }

    pub fn with_limit_size(mut self, limit_size: usize) -> Self {
        self.limit_size = limit_size;
        self
    }

    /// Any further binding a job statement needs
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name, value);
        self
    }

    pub fn to_parameters(&self) -> Parameters {
        let mut params = self.extra.clone();
        if let Some((name, value)) = &self.sub_resource {
            params.insert(name.clone(), value.clone());
        }
        params.insert(UPDATE_TAG_PARAMETER, self.update_tag);
        params.insert(LIMIT_SIZE_PARAMETER, self.limit_size as u64);
        params
    }
}

/// A statement with its parameters and iteration policy
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStatement {
    statement: Statement,
    parameters: Parameters,
    iterative: bool,
    iteration_size: usize,
}

impl GraphStatement {
    /// Run-once statement
    pub fn new(statement: Statement, parameters: Parameters) -> Self {
        Self {
            statement,
            parameters,
            iterative: false,
            iteration_size: default_iteration_size(),
        }
    }

    /// Repeat while rows are affected, `iteration_size` at a time
    pub fn iterative(mut self, iteration_size: usize) -> Self {
        self.iterative = true;
        self.iteration_size = iteration_size.max(1);
        self
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn is_iterative(&self) -> bool {
        self.iterative
    }

    fn bound(&self) -> BoundStatement {
        let mut parameters = self.parameters.clone();
        if self.iterative {
            parameters.insert(LIMIT_SIZE_PARAMETER, self.iteration_size as u64);
        }
        BoundStatement::new(self.statement.clone(), parameters)
    }

    /// Execute, returning the total number of affected rows
    pub async fn run(&self, store: &dyn GraphStore) -> GraphResult<u64> {
        let bound = self.bound();
        let mut total = 0;
        loop {
            let affected: u64 = store
                .execute(std::slice::from_ref(&bound))
                .await?
                .iter()
                .map(|summary| summary.affected)
                .sum();
            total += affected;
            if !self.iterative || affected == 0 {
                break;
            }
            debug!("{} affected {} rows, repeating", self.statement.kind(), affected);
        }
        Ok(total)
    }

    pub fn to_definition(&self) -> StatementDefinition {
        StatementDefinition {
            query: self.statement.cypher(),
            iterative: self.iterative,
            iterationsize: self.iteration_size,
        }
    }
}

/// A named list of statements run in order
#[derive(Debug, Clone, PartialEq)]
pub struct GraphJob {
    name: String,
    statements: Vec<GraphStatement>,
}

impl GraphJob {
    pub fn new(name: impl Into<String>, statements: Vec<GraphStatement>) -> Self {
        Self {
            name: name.into(),
            statements,
        }
    }

    /// Cleanup job sweeping stale nodes and relationships of `schema`
    pub fn from_node_schema(schema: &NodeSchema, common: &CommonJobParameters) -> Self {
        let parameters = common.to_parameters();
        let statements = compile_cleanup(schema)
            .into_iter()
            .map(|statement| {
                GraphStatement::new(statement, parameters.clone()).iterative(common.limit_size)
            })
            .collect();
        Self::new(format!("Cleanup {}", schema.label()), statements)
    }

    /// Cleanup job sweeping stale match-links of one sub-resource
    ///
    /// `common` must bind `_sub_resource_label` and `_sub_resource_id`.
    pub fn from_matchlink(
        relationship: &RelationshipSchema,
        common: &CommonJobParameters,
    ) -> SchemaResult<Self> {
        let statement = compile_matchlink_cleanup(relationship)?;
        Ok(Self::new(
            format!("Cleanup {} match-links", relationship.rel_label()),
            vec![GraphStatement::new(statement, common.to_parameters()).iterative(common.limit_size)],
        ))
    }

    /// Job from a document; every statement shares the common parameters
    pub fn from_definition(definition: &JobDefinition, common: &CommonJobParameters) -> Self {
        let parameters = common.to_parameters();
        let statements = definition
            .statements
            .iter()
            .map(|def| {
                let statement = GraphStatement::new(Statement::Raw(def.query.clone()), parameters.clone());
                if def.iterative {
                    statement.iterative(def.iterationsize)
                } else {
                    statement
                }
            })
            .collect();
        Self::new(definition.name.clone(), statements)
    }

    pub fn to_definition(&self) -> JobDefinition {
        JobDefinition {
            name: self.name.clone(),
            statements: self.statements.iter().map(GraphStatement::to_definition).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn statements(&self) -> &[GraphStatement] {
        &self.statements
    }

    /// Run every statement in order; the first failure aborts the job
    ///
    /// All referenced parameters are checked before anything executes.
    pub async fn run(&self, store: &dyn GraphStore) -> GraphResult<u64> {
        for statement in &self.statements {
            statement.bound().check_parameters()?;
        }

        info!("Starting job '{}' ({} statements)", self.name, self.statements.len());
        let mut total = 0;
        for statement in &self.statements {
            total += statement.run(store).await?;
        }
        info!("Finished job '{}': {} rows affected", self.name, total);
        Ok(total)
    }
}
