//! Messages exchanged between the orchestrator and its workers.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::core::{TranslationMap, error::ParseFault};

/// Shared flag telling a worker to stop working on a request.
///
/// Workers check it between parsers, so a cancelled request stops at the next
/// parser boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A file to extract from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileInput {
    /// Content already read by the caller.
    Content { file_path: String, content: String },
    /// The worker reads the file itself.
    Path { file_path: String },
}

impl FileInput {
    pub fn path(file_path: impl Into<String>) -> Self {
        Self::Path {
            file_path: file_path.into(),
        }
    }

    pub fn content(file_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Content {
            file_path: file_path.into(),
            content: content.into(),
        }
    }

    pub fn file_path(&self) -> &str {
        match self {
            Self::Content { file_path, .. } | Self::Path { file_path } => file_path,
        }
    }
}

#[derive(Debug)]
pub struct WorkRequest {
    pub id: u64,
    pub input: FileInput,
    /// Replaces the worker's marker parser for the rest of its lifetime.
    pub custom_marker: Option<String>,
    pub cancel: CancellationToken,
}

/// What a worker produced for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileOutput {
    /// Non-empty results, one per parser, in parser order.
    pub translations: Vec<TranslationMap>,
    pub parse_faults: Vec<ParseFault>,
}

#[derive(Debug)]
pub struct WorkResponse {
    pub id: u64,
    pub outcome: Result<FileOutput, crate::core::error::WorkerFault>,
}
