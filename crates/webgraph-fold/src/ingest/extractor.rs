use std::io::Read;

use anyhow::{bail, Context, Result};
use tracing::warn;

/// Reads records of a tab-separated graph file.
pub trait Extractor {
    type Record;

    fn extract<R: Read>(&self, reader: R) -> Result<Vec<Self::Record>>;
}

fn reader_builder(delimiter: u8) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false);
    builder
}

/// Vertex file: `<id>\t<label>[\t...]`, ids `0..n` in line order.
///
/// Yields the labels, indexed by vertex id.
pub struct VertexExtractor {
    pub delimiter: u8,
}

impl Default for VertexExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexExtractor {
    pub fn new() -> Self {
        Self { delimiter: b'\t' }
    }
}

impl Extractor for VertexExtractor {
    type Record = String;

    fn extract<R: Read>(&self, reader: R) -> Result<Vec<String>> {
        let mut rdr = reader_builder(self.delimiter).from_reader(reader);
        let mut labels = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result?;
            let (id, label) = match (record.get(0), record.get(1)) {
                (Some(id), Some(label)) => (id, label),
                _ => {
                    warn!("Skipping vertex line {} without label", line + 1);
                    continue;
                }
            };
            let id: usize = id
                .trim()
                .parse()
                .with_context(|| format!("Invalid vertex id on line {}: {:?}", line + 1, id))?;
            if id != labels.len() {
                bail!(
                    "Vertex ids must be consecutive, expected {} but got {} on line {}",
                    labels.len(),
                    id,
                    line + 1
                );
            }
            labels.push(label.to_string());
        }

        Ok(labels)
    }
}

/// Edge file: `<from id>\t<to id>`.
pub struct EdgeExtractor {
    pub delimiter: u8,
}

impl Default for EdgeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeExtractor {
    pub fn new() -> Self {
        Self { delimiter: b'\t' }
    }
}

impl Extractor for EdgeExtractor {
    type Record = (u32, u32);

    fn extract<R: Read>(&self, reader: R) -> Result<Vec<(u32, u32)>> {
        let mut rdr = reader_builder(self.delimiter).from_reader(reader);
        let mut edges = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result?;
            if let (Some(from), Some(to)) = (record.get(0), record.get(1)) {
                let parse = |value: &str| -> Result<u32> {
                    value
                        .trim()
                        .parse()
                        .with_context(|| format!("Invalid vertex id on line {}: {:?}", line + 1, value))
                };
                edges.push((parse(from)?, parse(to)?));
            }
        }

        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertices() -> Result<()> {
        let input = "0\tcom.example\t3\n1\torg.example\t1\n2\torg.\"quoted\"\n";
        let labels = VertexExtractor::new().extract(input.as_bytes())?;
        assert_eq!(labels, vec!["com.example", "org.example", "org.\"quoted\""]);
        Ok(())
    }

    #[test]
    fn test_vertices_gap_fails() {
        let input = "0\tcom.example\n2\torg.example\n";
        assert!(VertexExtractor::new().extract(input.as_bytes()).is_err());
    }

    #[test]
    fn test_edges() -> Result<()> {
        let input = "0\t1\n1\t0\nbroken\n";
        let edges = EdgeExtractor::new().extract(input.as_bytes())?;
        assert_eq!(edges, vec![(0, 1), (1, 0)]);
        assert!(EdgeExtractor::new().extract("0\tx\n".as_bytes()).is_err());
        Ok(())
    }
}
