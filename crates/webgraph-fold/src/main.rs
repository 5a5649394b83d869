use std::env;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use webgraph_fold::persistence::GraphSnapshot;
use webgraph_fold::{fold_files, FoldConfig, FoldPaths, SuffixList, WebGraph};

const SUFFIX_LIST_ENV: &str = "WEBGRAPH_SUFFIX_LIST";
const DEFAULT_SUFFIX_LIST: &str = "public_suffix_list.dat";

#[derive(Parser)]
#[command(name = "webgraph")]
#[command(about = "Host-to-domain folding and link exploration for web graphs", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a host-level graph into a domain-level graph
    Fold(FoldArgs),
    /// List successors or predecessors of a vertex
    Neighbors(NeighborsArgs),
    /// List vertices linked from (or to) several vertices
    Shared(SharedArgs),
    /// Save a graph as binary snapshot for faster loading
    Snapshot {
        /// Vertex file (<id>\t<label>)
        vertices: PathBuf,
        /// Edge file (<from>\t<to>)
        edges: PathBuf,
        /// Snapshot output path
        output: PathBuf,
    },
}

#[derive(Args)]
struct FoldArgs {
    /// Count hosts per domain (additional column in <NODES_OUT>)
    #[arg(short = 'c', long = "count-hosts")]
    count_hosts: bool,
    /// Convert to private domains (include suffixes from the PRIVATE
    /// division of the public suffix list)
    #[arg(long = "private-domains", alias = "private")]
    private_domains: bool,
    /// Output host names equal to multi-part public suffixes (e.g. `gov.uk`)
    /// as domain names. No further validation (DNS lookup) is performed.
    #[arg(
        long = "multipart-suffixes-as-domains",
        alias = "no-strict-domain-validate"
    )]
    multipart_suffixes_as_domains: bool,
    /// Public suffix list file [env: WEBGRAPH_SUFFIX_LIST]
    #[arg(long)]
    suffix_list: Option<PathBuf>,
    /// Write run statistics as JSON
    #[arg(long)]
    stats: Option<PathBuf>,
    /// Max. number of host vertices (all host ids must be lower)
    max_size: u64,
    /// Host vertices, sorted by reversed host name
    nodes_in: PathBuf,
    /// Domain vertices output
    nodes_out: PathBuf,
    /// Host edges, sorted by from and to id
    edges_in: PathBuf,
    /// Domain edges output
    edges_out: PathBuf,
}

#[derive(Args)]
struct GraphArgs {
    /// Vertex file (<id>\t<label>)
    #[arg(long, requires = "edges", conflicts_with = "snapshot")]
    vertices: Option<PathBuf>,
    /// Edge file (<from>\t<to>)
    #[arg(long, requires = "vertices")]
    edges: Option<PathBuf>,
    /// Binary graph snapshot
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

impl GraphArgs {
    fn load(&self) -> Result<WebGraph> {
        match (&self.snapshot, &self.vertices, &self.edges) {
            (Some(snapshot), _, _) => GraphSnapshot::load_from_file(snapshot)?.into_graph(),
            (None, Some(vertices), Some(edges)) => WebGraph::load(vertices, edges),
            _ => bail!("Either --snapshot or --vertices and --edges are required"),
        }
    }
}

#[derive(Args)]
struct NeighborsArgs {
    #[command(flatten)]
    graph: GraphArgs,
    /// Vertex label (reversed host or domain name)
    label: String,
    /// Follow incoming instead of outgoing links
    #[arg(long)]
    predecessors: bool,
    /// Only neighbors whose label starts with this prefix
    #[arg(long)]
    prefix: Option<String>,
    /// Print the number of neighbors per top-level domain instead
    #[arg(long)]
    tld_counts: bool,
}

#[derive(Args)]
struct SharedArgs {
    #[command(flatten)]
    graph: GraphArgs,
    /// Vertex labels
    #[arg(required = true)]
    labels: Vec<String>,
    /// Follow incoming instead of outgoing links
    #[arg(long)]
    predecessors: bool,
    /// Min. number of vertices sharing a neighbor (default: all)
    #[arg(long)]
    min: Option<usize>,
    /// Max. number of vertices sharing a neighbor (default: all)
    #[arg(long)]
    max: Option<usize>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Fold(args) => run_fold(&args),
        Commands::Neighbors(args) => run_neighbors(&args),
        Commands::Shared(args) => run_shared(&args),
        Commands::Snapshot {
            vertices,
            edges,
            output,
        } => WebGraph::load(&vertices, &edges)
            .and_then(|graph| GraphSnapshot::from_graph(&graph).save_to_file(&output)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_fold(args: &FoldArgs) -> Result<()> {
    let suffix_list = args.suffix_list.clone().unwrap_or_else(|| {
        PathBuf::from(env::var(SUFFIX_LIST_ENV).unwrap_or_else(|_| DEFAULT_SUFFIX_LIST.to_string()))
    });
    let resolver = SuffixList::from_file(&suffix_list)?;

    let config = FoldConfig::new(args.max_size)
        .with_count_hosts(args.count_hosts)
        .with_private_domains(args.private_domains)
        .with_multi_part_suffixes_as_domains(args.multipart_suffixes_as_domains);

    let paths = FoldPaths {
        nodes_in: args.nodes_in.clone(),
        nodes_out: args.nodes_out.clone(),
        edges_in: args.edges_in.clone(),
        edges_out: args.edges_out.clone(),
    };
    let stats = fold_files(config, resolver, &paths)
        .with_context(|| format!("Failed to fold {:?} and {:?}", args.nodes_in, args.edges_in))?;

    if let Some(path) = &args.stats {
        fs::write(path, serde_json::to_string_pretty(&stats)?)
            .with_context(|| format!("Failed to write statistics: {:?}", path))?;
    }
    Ok(())
}

fn lookup(graph: &WebGraph, label: &str) -> Result<u32> {
    match graph.vertex_label_to_id(label) {
        Some(id) => Ok(id),
        None => bail!("Vertex not found: {}", label),
    }
}

fn print_vertices(graph: &WebGraph, ids: &[u32]) -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for &id in ids {
        writeln!(out, "{}\t{}", id, graph.vertex_id_to_label(id).unwrap_or_default())?;
    }
    out.flush()?;
    Ok(())
}

fn run_neighbors(args: &NeighborsArgs) -> Result<()> {
    let graph = args.graph.load()?;
    let id = lookup(&graph, &args.label)?;

    if args.tld_counts {
        let counts = if args.predecessors {
            graph.predecessor_tld_counts(id)
        } else {
            graph.successor_tld_counts(id)
        };
        let mut out = BufWriter::new(io::stdout().lock());
        for (tld, count) in counts {
            writeln!(out, "{}\t{}", tld, count)?;
        }
        out.flush()?;
        return Ok(());
    }

    let ids = match (&args.prefix, args.predecessors) {
        (Some(prefix), true) => graph.predecessors_with_prefix(id, prefix),
        (Some(prefix), false) => graph.successors_with_prefix(id, prefix),
        (None, true) => graph.predecessors(id),
        (None, false) => graph.successors(id),
    };
    print_vertices(&graph, ids)
}

fn run_shared(args: &SharedArgs) -> Result<()> {
    let graph = args.graph.load()?;
    let ids = args
        .labels
        .iter()
        .map(|label| lookup(&graph, label))
        .collect::<Result<Vec<_>>>()?;

    let min = args.min.unwrap_or(ids.len());
    let max = args.max.unwrap_or(ids.len());
    if min > max {
        bail!("--min ({}) must not exceed --max ({})", min, max);
    }

    let shared = if args.predecessors {
        graph.shared_predecessors(&ids, min, max)
    } else {
        graph.shared_successors(&ids, min, max)
    };
    print_vertices(&graph, &shared)
}
