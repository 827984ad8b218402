// Copyright (c) 2025 - Cowboy AI, Inc.

//! Graph Job Runner
//!
//! Runs a job definition document against Neo4j with the common job
//! parameters of the current sync run.
//!
//! Run with: cargo run --bin graph-job --features neo4j -- <job.json> [NAME=VALUE ...]
//!
//! `NAME=VALUE` pairs are bound as extra parameters; values that parse as
//! JSON keep their type, anything else is bound as a string.
//!
//! Environment:
//! - `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD`, `NEO4J_DATABASE`
//! - `UPDATE_TAG` (defaults to the current UNIX time)
//! - `GRAPH_LOAD_BATCH_SIZE`, `GRAPH_CLEANUP_ITERATION_SIZE` (default 10000 and 100)

use anyhow::{bail, Context, Result};
use cim_inventory_graph::{
    update_tag_now, CommonJobParameters, GraphConfig, GraphJob, GraphStore, JobDefinition,
    Neo4jGraphStore,
};
use serde_json::Value;
use tracing::info;

fn parse_binding(arg: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = arg.split_once('=') else {
        bail!("expected NAME=VALUE, got '{}'", arg);
    };
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: graph-job <job.json> [NAME=VALUE ...]")?;

    let update_tag = match std::env::var("UPDATE_TAG") {
        Ok(raw) => raw.parse().context("UPDATE_TAG must be an integer")?,
        Err(_) => update_tag_now(),
    };
    let config = GraphConfig::from_env()?;

    let mut common = CommonJobParameters::from_config(update_tag, &config.loader);
    for arg in args {
        let (name, value) = parse_binding(&arg)?;
        common = common.with(name, value);
    }

    let definition = JobDefinition::from_file(&path)
        .await
        .with_context(|| format!("Failed to read job definition {}", path))?;
    let job = GraphJob::from_definition(&definition, &common);

    let store = Neo4jGraphStore::connect(config.neo4j)
        .await
        .context("Failed to connect to Neo4j")?;
    store.health_check().await.context("Neo4j health check failed")?;

    info!("Running job '{}' with update tag {}", job.name(), update_tag);
    let affected = job
        .run(&store)
        .await
        .with_context(|| format!("Job '{}' failed", job.name()))?;
    info!("Job '{}' complete: {} rows affected", job.name(), affected);

    Ok(())
}
