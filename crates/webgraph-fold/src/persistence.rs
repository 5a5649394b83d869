use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::explore::WebGraph;

/// Binary image of a [`WebGraph`], edges kept as a plain list.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub labels: Vec<String>,    // indexed by vertex id
    pub edges: Vec<(u32, u32)>, // (from, to)
}

impl GraphSnapshot {
    pub fn from_graph(graph: &WebGraph) -> Self {
        Self {
            labels: graph.labels().to_vec(),
            edges: graph.edges().collect(),
        }
    }

    pub fn into_graph(self) -> Result<WebGraph> {
        WebGraph::from_parts(self.labels, self.edges)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let data = bincode::serialize(self)?;
        fs::write(path, data).with_context(|| format!("Failed to write snapshot: {:?}", path))?;
        info!("Graph saved to {:?}", path);
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("Failed to read snapshot: {:?}", path))?;
        let snapshot: GraphSnapshot = bincode::deserialize(&data)
            .with_context(|| format!("Invalid snapshot: {:?}", path))?;
        info!("Graph loaded from {:?}", path);
        Ok(snapshot)
    }
}
