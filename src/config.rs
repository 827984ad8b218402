// Copyright (c) 2025 - Cowboy AI, Inc.

//! Graph configuration
//!
//! [`GraphConfig`] groups everything a sync run needs: where the Neo4j server
//! is and how large load batches and cleanup iterations are. Each section
//! can be built in code, deserialized from JSON with missing fields falling
//! back to defaults, or read from the environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::errors::{GraphError, GraphResult};

const DEFAULT_URI: &str = "bolt://localhost:7687";
const DEFAULT_DATABASE: &str = "neo4j";

fn default_uri() -> String {
    DEFAULT_URI.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_batch_size() -> usize {
    10_000
}

fn default_cleanup_iteration_size() -> usize {
    100
}

/// Basic auth for the Neo4j server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// Where the inventory graph lives
///
/// `credentials` is `None` for servers started with `NEO4J_AUTH=none`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neo4jConfig {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default = "default_database")]
    pub database: String,
}

impl Neo4jConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            user: user.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// User and password handed to the driver; empty when unauthenticated
    pub fn auth(&self) -> (&str, &str) {
        match &self.credentials {
            Some(credentials) => (credentials.user.as_str(), credentials.password.as_str()),
            None => ("", ""),
        }
    }

    /// Read `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD` and `NEO4J_DATABASE`
    ///
    /// Credentials are only set when `NEO4J_USER` is.
    pub fn from_env() -> Self {
        let mut config = Self::new(env::var("NEO4J_URI").unwrap_or_else(|_| default_uri()));
        if let Ok(user) = env::var("NEO4J_USER") {
            config = config.with_credentials(user, env::var("NEO4J_PASSWORD").unwrap_or_default());
        }
        if let Ok(database) = env::var("NEO4J_DATABASE") {
            config = config.with_database(database);
        }
        config
    }
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            credentials: None,
            database: default_database(),
        }
    }
}

/// Batching behaviour of loads and cleanup jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Records sent per `UNWIND` batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// `LIMIT_SIZE` bound for iterative cleanup statements
    #[serde(default = "default_cleanup_iteration_size")]
    pub cleanup_iteration_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            cleanup_iteration_size: default_cleanup_iteration_size(),
        }
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> GraphResult<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            GraphError::Configuration(format!("{} must be a positive integer, got '{}'", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

impl LoaderConfig {
    /// Read `GRAPH_LOAD_BATCH_SIZE` and `GRAPH_CLEANUP_ITERATION_SIZE`
    pub fn from_env() -> GraphResult<Self> {
        let config = Self {
            batch_size: parse_env("GRAPH_LOAD_BATCH_SIZE", default_batch_size())?,
            cleanup_iteration_size: parse_env(
                "GRAPH_CLEANUP_ITERATION_SIZE",
                default_cleanup_iteration_size(),
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GraphResult<()> {
        if self.batch_size == 0 || self.cleanup_iteration_size == 0 {
            return Err(GraphError::Configuration(
                "batch sizes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Full configuration of a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

impl GraphConfig {
    pub fn from_env() -> GraphResult<Self> {
        Ok(Self {
            neo4j: Neo4jConfig::from_env(),
            loader: LoaderConfig::from_env()?,
        })
    }

    pub fn from_json(text: &str) -> GraphResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.loader.validate()?;
        Ok(config)
    }
}
