//! Read-only exploration of a (host or domain) web graph held in memory.
//!
//! Vertex labels are reversed host or domain names, sorted lexicographically
//! so that vertex ids follow label order. Label lookups are binary searches
//! and all hosts below a name prefix form one contiguous id interval.

pub mod csr;

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ingest;
use crate::merge::shared_values;
use crate::names::top_level_domain;
use csr::Csr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebGraph {
    labels: Vec<String>,
    successors: Csr,
    predecessors: Csr,
}

impl WebGraph {
    /// Build a graph from labels indexed by vertex id and `(from, to)` edges.
    pub fn from_parts(labels: Vec<String>, edges: Vec<(u32, u32)>) -> Result<Self> {
        if let Some(pair) = labels.windows(2).find(|pair| pair[0] >= pair[1]) {
            bail!(
                "Vertex labels are not sorted: {:?} >= {:?}",
                pair[0],
                pair[1]
            );
        }
        let num_nodes = labels.len();
        if let Some(&(from, to)) = edges
            .iter()
            .find(|&&(from, to)| from as usize >= num_nodes || to as usize >= num_nodes)
        {
            bail!(
                "Edge {} -> {} refers to unknown vertex, graph has {} vertices",
                from,
                to,
                num_nodes
            );
        }
        let successors = Csr::from_pairs(num_nodes, edges);
        let predecessors = successors.transpose();
        Ok(Self {
            labels,
            successors,
            predecessors,
        })
    }

    /// Load from a vertex file (`<id>\t<label>[\t...]`) and an edge file
    /// (`<from>\t<to>`).
    pub fn load(vertices: &Path, edges: &Path) -> Result<Self> {
        let labels = ingest::read_vertices(vertices)?;
        let edges = ingest::read_edges(edges)?;
        let graph = Self::from_parts(labels, edges)?;
        info!(
            "Loaded graph with {} vertices and {} edges",
            graph.num_nodes(),
            graph.num_edges()
        );
        Ok(graph)
    }

    pub fn num_nodes(&self) -> usize {
        self.labels.len()
    }

    pub fn num_edges(&self) -> usize {
        self.successors.num_edges()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.successors.edges()
    }

    pub fn vertex_label_to_id(&self, label: &str) -> Option<u32> {
        self.labels
            .binary_search_by(|probe| probe.as_str().cmp(label))
            .ok()
            .map(|id| id as u32)
    }

    pub fn vertex_id_to_label(&self, id: u32) -> Option<&str> {
        self.labels.get(id as usize).map(String::as_str)
    }

    pub fn outdegree(&self, id: u32) -> usize {
        self.successors.degree(id)
    }

    pub fn indegree(&self, id: u32) -> usize {
        self.predecessors.degree(id)
    }

    pub fn successors(&self, id: u32) -> &[u32] {
        self.successors.neighbors(id)
    }

    pub fn predecessors(&self, id: u32) -> &[u32] {
        self.predecessors.neighbors(id)
    }

    /// Ids of all vertices whose label starts with `prefix`.
    pub fn prefix_interval(&self, prefix: &str) -> Range<u32> {
        let start = self
            .labels
            .partition_point(|label| label.as_str() < prefix);
        let len = self.labels[start..].partition_point(|label| label.starts_with(prefix));
        start as u32..(start + len) as u32
    }

    pub fn successors_with_prefix(&self, id: u32, prefix: &str) -> &[u32] {
        within(self.successors(id), self.prefix_interval(prefix))
    }

    pub fn predecessors_with_prefix(&self, id: u32, prefix: &str) -> &[u32] {
        within(self.predecessors(id), self.prefix_interval(prefix))
    }

    /// Successors shared by `min_shared..=max_shared` of the given vertices.
    ///
    /// With `k` vertices, `(k, k)` yields the intersection of their successor
    /// lists and `(1, k)` the union.
    pub fn shared_successors(&self, ids: &[u32], min_shared: usize, max_shared: usize) -> Vec<u32> {
        shared_values(
            ids.iter().map(|&id| self.successors(id).iter().copied()),
            min_shared,
            max_shared,
        )
    }

    pub fn shared_predecessors(
        &self,
        ids: &[u32],
        min_shared: usize,
        max_shared: usize,
    ) -> Vec<u32> {
        shared_values(
            ids.iter().map(|&id| self.predecessors(id).iter().copied()),
            min_shared,
            max_shared,
        )
    }

    /// Number of successors per top-level domain, most frequent first.
    pub fn successor_tld_counts(&self, id: u32) -> Vec<(String, usize)> {
        self.tld_counts(self.successors(id))
    }

    pub fn predecessor_tld_counts(&self, id: u32) -> Vec<(String, usize)> {
        self.tld_counts(self.predecessors(id))
    }

    fn tld_counts(&self, ids: &[u32]) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in ids.iter().filter_map(|&id| self.vertex_id_to_label(id)) {
            *counts.entry(top_level_domain(label)).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(tld, count)| (tld.to_string(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }
}

/// Sub-slice of sorted `ids` falling into `range`.
fn within(ids: &[u32], range: Range<u32>) -> &[u32] {
    let start = ids.partition_point(|&id| id < range.start);
    let end = ids.partition_point(|&id| id < range.end);
    &ids[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Result<WebGraph> {
        let labels = ["com.example", "com.example.www", "com.other", "org.example", "uk.co.example"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let edges = vec![
            (0, 2),
            (0, 3),
            (0, 4),
            (1, 0),
            (1, 2),
            (1, 3),
            (2, 3),
            (4, 3),
            (4, 0),
        ];
        WebGraph::from_parts(labels, edges)
    }

    #[test]
    fn test_lookup_and_degrees() -> Result<()> {
        let graph = graph()?;
        assert_eq!(graph.num_nodes(), 5);
        assert_eq!(graph.num_edges(), 9);
        assert_eq!(graph.vertex_label_to_id("com.other"), Some(2));
        assert_eq!(graph.vertex_label_to_id("com.missing"), None);
        assert_eq!(graph.vertex_id_to_label(4), Some("uk.co.example"));
        assert_eq!(graph.vertex_id_to_label(5), None);
        assert_eq!(graph.outdegree(0), 3);
        assert_eq!(graph.indegree(3), 4);
        assert_eq!(graph.successors(4), &[0, 3]);
        assert_eq!(graph.predecessors(0), &[1, 4]);
        Ok(())
    }

    #[test]
    fn test_prefix() -> Result<()> {
        let graph = graph()?;
        assert_eq!(graph.prefix_interval("com.example"), 0..2);
        assert_eq!(graph.prefix_interval("com."), 0..3);
        assert_eq!(graph.prefix_interval("net."), 3..3);
        assert_eq!(graph.successors_with_prefix(1, "com."), &[0, 2]);
        assert_eq!(graph.predecessors_with_prefix(3, "com.example"), &[0, 1]);
        Ok(())
    }

    #[test]
    fn test_shared() -> Result<()> {
        let graph = graph()?;
        assert_eq!(graph.shared_successors(&[0, 1], 2, 2), vec![2, 3]);
        assert_eq!(graph.shared_successors(&[0, 1], 1, 2), vec![0, 2, 3, 4]);
        assert_eq!(graph.shared_successors(&[0, 1], 1, 1), vec![0, 4]);
        assert_eq!(graph.shared_predecessors(&[2, 3], 2, 2), vec![0, 1]);
        Ok(())
    }

    #[test]
    fn test_tld_counts() -> Result<()> {
        let graph = graph()?;
        assert_eq!(
            graph.successor_tld_counts(0),
            vec![("com".to_string(), 1), ("org".to_string(), 1), ("uk".to_string(), 1)]
        );
        assert_eq!(
            graph.predecessor_tld_counts(3),
            vec![("com".to_string(), 3), ("uk".to_string(), 1)]
        );
        Ok(())
    }

    #[test]
    fn test_invalid_parts() {
        let unsorted = vec!["org.example".to_string(), "com.example".to_string()];
        assert!(WebGraph::from_parts(unsorted, vec![]).is_err());
        let labels = vec!["com.example".to_string()];
        assert!(WebGraph::from_parts(labels, vec![(0, 1)]).is_err());
    }
}
