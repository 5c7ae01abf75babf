//! Error types for telemux
//!
//! Only failures that must stop a run live here. Per-line problems (bad field
//! counts, non-numeric values, undecodable bytes) are absorbed where they occur
//! and never become an `Error`.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that escalate past the ingest and analysis cores
#[derive(Debug, Error)]
pub enum Error {
    /// The input transport failed while reading
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// A sink for a new kind could not be opened or created
    #[error("cannot open sink for kind '{kind}': {source}")]
    SinkAcquire {
        kind: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing or flushing an already-open sink failed
    #[error("write to sink for kind '{kind}' failed: {source}")]
    SinkWrite {
        kind: String,
        #[source]
        source: std::io::Error,
    },

    /// The analysis input file could not be opened or read
    #[error("cannot read analysis input {}: {source}", path.display())]
    AnalysisInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The statistics backend rejected its input
    #[error("statistics error: {0}")]
    Statistics(String),

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, Error>;
