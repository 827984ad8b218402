// Copyright (c) 2025 - Cowboy AI, Inc.

//! Neo4j-backed graph store
//!
//! Renders statements to Cypher, converts JSON parameters to Bolt values and
//! runs every `execute` call in one explicit transaction.
//!
//! ```rust,no_run
//! use cim_inventory_graph::config::Neo4jConfig;
//! use cim_inventory_graph::store::{GraphStore, Neo4jGraphStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Neo4jGraphStore::connect(Neo4jConfig::from_env()).await?;
//!     store.health_check().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use neo4rs::{
    BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType,
    ConfigBuilder, Graph, Query, Txn,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{GraphStore, StatementSummary};
use crate::config::Neo4jConfig;
use crate::errors::{GraphError, GraphResult};
use crate::query::BoundStatement;
use crate::record::Record;

const STORE_NAME: &str = "neo4j";

fn to_bolt(value: &Value) -> GraphResult<BoltType> {
    let bolt = match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(v) => BoltType::Boolean(BoltBoolean::new(*v)),
        Value::Number(v) => {
            if let Some(i) = v.as_i64() {
                BoltType::Integer(BoltInteger::new(i))
            } else if let Some(f) = v.as_f64() {
                BoltType::Float(BoltFloat::new(f))
            } else {
                return Err(GraphError::InvalidParameter {
                    parameter: v.to_string(),
                    reason: "number is not representable in Bolt".to_string(),
                });
            }
        }
        Value::String(v) => BoltType::String(BoltString::new(v)),
        Value::Array(items) => BoltType::List(BoltList {
            value: items.iter().map(to_bolt).collect::<GraphResult<_>>()?,
        }),
        Value::Object(map) => BoltType::Map(BoltMap {
            value: map
                .iter()
                .map(|(k, v)| Ok((BoltString::new(k), to_bolt(v)?)))
                .collect::<GraphResult<_>>()?,
        }),
    };
    Ok(bolt)
}

fn to_query(bound: &BoundStatement) -> GraphResult<Query> {
    let mut query = Query::new(bound.statement.cypher());
    for (name, value) in bound.parameters.iter() {
        query = query.param(name, to_bolt(value)?);
    }
    Ok(query)
}

/// Run one statement inside `txn`, summing the `affected` column if present
async fn run_in(txn: &mut Txn, bound: &BoundStatement) -> GraphResult<u64> {
    let mut rows = txn.execute(to_query(bound)?).await?;
    let mut affected = 0u64;
    while let Some(row) = rows.next(txn.handle()).await? {
        if let Ok(count) = row.get::<i64>("affected") {
            affected += count.max(0) as u64;
        }
    }
    Ok(affected)
}

/// Graph store backed by a Neo4j server
pub struct Neo4jGraphStore {
    graph: Arc<Graph>,
    config: Neo4jConfig,
}

impl Neo4jGraphStore {
    /// Connect to Neo4j
    pub async fn connect(config: Neo4jConfig) -> GraphResult<Self> {
        info!("Connecting to Neo4j at {}", config.uri);

        let (user, password) = config.auth();
        let driver_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(user)
            .password(password)
            .db(config.database.as_str())
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;
        let graph = Graph::connect(driver_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        Ok(Self {
            graph: Arc::new(graph),
            config,
        })
    }

    pub fn config(&self) -> &Neo4jConfig {
        &self.config
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    fn name(&self) -> &str {
        STORE_NAME
    }

    async fn execute(&self, statements: &[BoundStatement]) -> GraphResult<Vec<StatementSummary>> {
        for bound in statements {
            bound.check_parameters()?;
        }
        let schema_changes = statements.iter().filter(|b| b.statement.is_schema_change()).count();
        if schema_changes > 0 && schema_changes < statements.len() {
            return Err(GraphError::Query(
                "schema statements cannot share a transaction with data writes".to_string(),
            ));
        }

        let mut txn = self.graph.start_txn().await?;
        let mut summaries = Vec::with_capacity(statements.len());
        for bound in statements {
            match run_in(&mut txn, bound).await {
                Ok(affected) => {
                    debug!(
                        store = STORE_NAME,
                        statement = bound.statement.kind(),
                        affected,
                        "Executed statement"
                    );
                    summaries.push(StatementSummary { affected });
                }
                Err(e) => {
                    if let Err(rollback) = txn.rollback().await {
                        warn!("Rollback after failed {} failed: {}", bound.statement.kind(), rollback);
                    }
                    return Err(e);
                }
            }
        }
        txn.commit().await?;
        Ok(summaries)
    }

    async fn fetch_nodes(&self, label: &str) -> GraphResult<Vec<Record>> {
        crate::schema::validate_identifier(label, label).map_err(|e| GraphError::InvalidParameter {
            parameter: "label".to_string(),
            reason: e.to_string(),
        })?;

        let query = Query::new(format!("MATCH (n:{}) RETURN properties(n) AS props", label));
        let mut rows = self.graph.execute(query).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            let props = row
                .get::<Value>("props")
                .map_err(|e| GraphError::Query(e.to_string()))?;
            if let Value::Object(record) = props {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn health_check(&self) -> GraphResult<()> {
        self.graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))
    }
}
