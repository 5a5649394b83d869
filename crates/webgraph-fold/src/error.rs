//! Error types for the host-to-domain conversion.

use thiserror::Error;

/// Errors that abort a folding pass.
///
/// Unmappable hosts are not errors: they are logged and counted, and the host
/// is left out of the domain graph.
#[derive(Debug, Error)]
pub enum FoldError {
    #[error("Reversed host names in input are not properly sorted: {previous} <> {current}")]
    UnsortedInput { previous: String, current: String },

    #[error("Host id {id} exceeds host vertex capacity {capacity}")]
    CapacityExceeded { id: u64, capacity: u64 },

    #[error("The {store} host id map holds {available} hosts, {configured} are configured")]
    StoreTooSmall {
        store: &'static str,
        configured: u64,
        available: u64,
    },

    #[error("Invalid vertex id in line: <{line}>")]
    InvalidId { line: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FoldError>;
