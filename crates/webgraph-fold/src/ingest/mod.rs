use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub mod extractor;

use extractor::{EdgeExtractor, Extractor, VertexExtractor};

fn extract_file<E: Extractor>(extractor: &E, path: &Path) -> Result<Vec<E::Record>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    extractor
        .extract(BufReader::new(file))
        .with_context(|| format!("Failed to read file: {:?}", path))
}

/// Vertex labels of a graph file, indexed by vertex id.
pub fn read_vertices(path: &Path) -> Result<Vec<String>> {
    extract_file(&VertexExtractor::new(), path)
}

pub fn read_edges(path: &Path) -> Result<Vec<(u32, u32)>> {
    extract_file(&EdgeExtractor::new(), path)
}
