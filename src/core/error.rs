//! Error taxonomy for the extraction pipeline.
//!
//! - `ExtractError`: fatal for the whole run (configuration, worker faults).
//! - `WorkerFault`: a worker could not produce a result for its file.
//! - `ParseFault`: a single parser failed on a single file. Collected, never fatal.
//! - `ParserError`: what a parser returns for malformed content.
//! - `CompileError`: a catalog could not be read back by its compiler.
//!
//! Destination-level I/O failures are reported by the task with `anyhow` context,
//! so that one failing destination never aborts its siblings.

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

/// Errors that abort an extraction run.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No compiler configured. Raised before any extraction work begins.
    #[error("no compiler configured")]
    MissingCompiler,

    #[error("failed to spawn extraction worker {index}")]
    Spawn {
        index: usize,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Worker(#[from] WorkerFault),

    #[error("failed to resolve input {pattern:?}: {message}")]
    Input { pattern: String, message: String },

    #[error("failed to access cache file {}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A worker failed to answer for the file it was assigned.
///
/// Any fault rejects the whole run: results of already completed chunks are discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerFault {
    #[error("worker {worker} exited before answering for {file}")]
    Exited { worker: usize, file: String },

    #[error("worker {worker} timed out after {timeout:?} on {file}")]
    Timeout {
        worker: usize,
        file: String,
        timeout: Duration,
    },

    #[error("worker {worker} failed to read {file}: {message}")]
    Read {
        worker: usize,
        file: String,
        message: String,
    },

    #[error("worker {worker} was cancelled while processing {file}")]
    Cancelled { worker: usize, file: String },
}

/// One parser failed on one file. The other parsers' results for that file are kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{parser} parser failed on {file}: {message}")]
pub struct ParseFault {
    pub parser: String,
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("syntax error: {0}")]
    Syntax(String),
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid PO syntax at line {line}: {message}")]
    Po { line: usize, message: String },

    #[error("invalid PO catalog: {0}")]
    PoCatalog(String),

    #[error("failed to stage PO catalog")]
    PoScratch(#[from] io::Error),

    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("root of a JSON catalog must be an object")]
    NotAnObject,
}
