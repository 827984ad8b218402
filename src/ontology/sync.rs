// Copyright (c) 2025 - Cowboy AI, Inc.

//! Building concept nodes from already-ingested provider nodes

use serde::{Deserialize, Serialize};
use tracing::info;

use super::merge::merge_records;
use super::OntologyRegistry;
use crate::errors::OntologyResult;
use crate::job::{CommonJobParameters, GraphStatement};
use crate::loader::{LoadSummary, Loader};
use crate::record::{Parameters, Record};

/// What one ontology sync did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologySummary {
    /// Concept records left after merging
    pub merged: usize,
    pub load: LoadSummary,
    /// Relationship rows written by the rel mappings
    pub links: u64,
}

/// Runs the ontology pass for one concept at a time
pub struct OntologySync<'a> {
    registry: &'a OntologyRegistry,
    loader: Loader,
}

impl<'a> OntologySync<'a> {
    pub fn new(registry: &'a OntologyRegistry, loader: Loader) -> Self {
        Self { registry, loader }
    }

    /// Read back, project and merge the source nodes of `source_modules`
    pub async fn collect(&self, concept: &str, source_modules: &[&str]) -> OntologyResult<Vec<Record>> {
        let definition = self.registry.concept(concept)?;
        let mut projected = Vec::new();
        for module in source_modules {
            let mapping = self.registry.mapping(concept, module)?;
            for node_mapping in mapping.nodes.iter().filter(|node| node.eligible_for_source) {
                let nodes = self.loader.store().fetch_nodes(&node_mapping.node_label).await?;
                projected.extend(nodes.iter().filter_map(|node| node_mapping.project(node)));
            }
        }
        Ok(merge_records(&definition.id_field, projected))
    }

    /// Merge, load the concept nodes under `update_tag`, then run every rel
    /// mapping of `source_modules`
    pub async fn run(
        &self,
        concept: &str,
        source_modules: &[&str],
        update_tag: i64,
    ) -> OntologyResult<OntologySummary> {
        let schema = self.registry.node_schema(concept)?;
        let records = self.collect(concept, source_modules).await?;
        let load = self
            .loader
            .load(&schema, &records, &Parameters::new(), update_tag)
            .await?;

        let parameters = CommonJobParameters::new(update_tag).to_parameters();
        let mut links = 0;
        for module in source_modules {
            for rel in &self.registry.mapping(concept, module)?.rels {
                info!("Running ontology link for {}: {}", module, rel.comment);
                links += GraphStatement::new(rel.statement(), parameters.clone())
                    .run(self.loader.store().as_ref())
                    .await?;
            }
        }

        let summary = OntologySummary {
            merged: records.len(),
            load,
            links,
        };
        info!(
            "Ontology sync of {} from {:?}: {} merged, {} links",
            concept, source_modules, summary.merged, summary.links
        );
        Ok(summary)
    }
}
