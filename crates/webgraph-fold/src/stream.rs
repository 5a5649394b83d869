//! Line-oriented driver feeding vertex and edge streams through the folder.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::config::FoldConfig;
use crate::error::{FoldError, Result};
use crate::folder::id_map::{FlatIds, IdStore, PagedIds};
use crate::folder::{DomainFolder, EdgeFolder, FoldStats};
use crate::suffix::DomainResolver;

const NODE_REPORT_INTERVAL: u64 = 500_000;
const EDGE_REPORT_INTERVAL: u64 = 5_000_000;

/// Fold all vertex lines from `input` into domain vertex lines written to
/// `output`, then flush the remaining domains.
///
/// Returns the folder for the edge pass. On error the output is incomplete
/// and must be discarded.
pub fn fold_nodes<R, S, In, Out>(
    mut folder: DomainFolder<R, S>,
    input: In,
    mut output: Out,
) -> Result<EdgeFolder<S>>
where
    R: DomainResolver,
    S: IdStore,
    In: BufRead,
    Out: Write,
{
    for line in input.lines() {
        let line = line?;
        for vertex in folder.convert_node(&line)? {
            writeln!(output, "{}", vertex)?;
        }
        let lines = folder.stats().node_lines;
        if lines % NODE_REPORT_INTERVAL == 0 {
            let stats = folder.stats();
            info!(
                "Processed {} node input lines, mapped to {} domains, domain queue usage: {} (max. {})",
                lines,
                stats.domains,
                folder.queue_len(),
                stats.max_queue_used
            );
        }
    }
    let (rest, edges) = folder.finish_nodes()?;
    for vertex in rest {
        writeln!(output, "{}", vertex)?;
    }
    output.flush()?;
    info!("Finished conversion of nodes/vertices");
    Ok(edges)
}

/// Fold all edge lines from `input` into domain edges written to `output`.
pub fn fold_edges<S, In, Out>(edges: &mut EdgeFolder<S>, input: In, mut output: Out) -> Result<()>
where
    S: IdStore,
    In: BufRead,
    Out: Write,
{
    for line in input.lines() {
        let line = line?;
        if let Some(edge) = edges.convert_edge(&line)? {
            writeln!(output, "{}", edge)?;
        }
        let lines = edges.stats().edge_lines;
        if lines % EDGE_REPORT_INTERVAL == 0 {
            info!(
                "Processed {} edge input lines, last edge from node id = {}",
                lines,
                edges.last_from().map_or(-1, |id| id as i64)
            );
        }
    }
    output.flush()?;
    info!(
        "Finished conversion of edges: {} input lines, {} domain edges",
        edges.stats().edge_lines,
        edges.stats().edges_written
    );
    Ok(())
}

/// Input and output files of a folding run.
#[derive(Debug, Clone)]
pub struct FoldPaths {
    pub nodes_in: PathBuf,
    pub nodes_out: PathBuf,
    pub edges_in: PathBuf,
    pub edges_out: PathBuf,
}

/// Fold the host graph files into domain graph files.
///
/// The id map backing is chosen from the configured capacity. Each output is
/// written to a temporary file next to its target and moved into place only
/// when its pass succeeds, a failed pass leaves no file behind.
pub fn fold_files<R: DomainResolver>(
    config: FoldConfig,
    resolver: R,
    paths: &FoldPaths,
) -> Result<FoldStats> {
    if config.needs_paged_ids() {
        fold_files_with::<R, PagedIds>(config, resolver, paths)
    } else {
        fold_files_with::<R, FlatIds>(config, resolver, paths)
    }
}

fn fold_files_with<R, S>(config: FoldConfig, resolver: R, paths: &FoldPaths) -> Result<FoldStats>
where
    R: DomainResolver,
    S: IdStore,
{
    let folder: DomainFolder<R, S> = DomainFolder::new(config, resolver)?;

    let mut nodes_out = temp_output(&paths.nodes_out)?;
    let mut edges = fold_nodes(
        folder,
        open_input(&paths.nodes_in)?,
        BufWriter::new(nodes_out.as_file_mut()),
    )?;
    nodes_out
        .persist(&paths.nodes_out)
        .map_err(|e| FoldError::Io(e.error))?;

    let mut edges_out = temp_output(&paths.edges_out)?;
    fold_edges(
        &mut edges,
        open_input(&paths.edges_in)?,
        BufWriter::new(edges_out.as_file_mut()),
    )?;
    edges_out
        .persist(&paths.edges_out)
        .map_err(|e| FoldError::Io(e.error))?;

    Ok(edges.into_stats())
}

fn open_input(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/// Temporary file in the directory of `path`, removed on drop unless persisted.
fn temp_output(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    Ok(NamedTempFile::new_in(dir)?)
}
