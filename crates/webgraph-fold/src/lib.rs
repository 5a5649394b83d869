//! Tools for web graphs whose vertices are host names in reverse domain name
//! notation: folding a host graph into a domain graph, and counting merges of
//! sorted adjacency lists for link exploration.

pub mod config;
pub mod error;
pub mod explore;
pub mod folder;
pub mod ingest;
pub mod merge;
pub mod names;
pub mod persistence;
pub mod stream;
pub mod suffix;

pub use config::FoldConfig;
pub use error::{FoldError, Result};
pub use explore::WebGraph;
pub use folder::id_map::{FlatIds, IdStore, PagedIds, FLAT_ID_LIMIT};
pub use folder::{DomainEdge, DomainFolder, DomainVertex, EdgeFolder, FoldStats};
pub use merge::{shared_values, CountingMerge};
pub use stream::{fold_files, FoldPaths};
pub use suffix::{DomainResolver, SuffixList};
