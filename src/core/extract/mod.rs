//! Parallel extraction over a fixed pool of worker threads.
//!
//! Files are dispatched in chunks of exactly one file per worker. A chunk must
//! settle before the next one starts, and results are gathered in worker order,
//! so the output never depends on which worker finished first.
//!
//! Any [`WorkerFault`] rejects the whole run: the chunk's outstanding requests
//! are cancelled and nothing extracted so far is returned.

mod protocol;
mod worker;

use std::{
    fs,
    num::NonZeroUsize,
    thread,
    time::{Duration, Instant},
};

pub use protocol::{CancellationToken, FileInput, FileOutput, WorkRequest, WorkResponse};

use crate::core::{
    TranslationCollection, TranslationMap,
    cache::{Cache, cache_key},
    error::{ExtractError, ParseFault, WorkerFault},
    parsers::{Extract, ParserName, ParserRegistry},
};
use worker::WorkerHandle;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Pool size for a machine with `parallelism` logical CPUs: three quarters of them, at least one.
pub fn pool_size(parallelism: usize) -> usize {
    (parallelism * 3 / 4).max(1)
}

pub fn default_pool_size() -> usize {
    pool_size(thread::available_parallelism().map_or(1, NonZeroUsize::get))
}

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub pool_size: usize,
    /// Longest a chunk may take to settle.
    pub timeout: Duration,
    pub parsers: Vec<ParserName>,
    pub custom_marker: Option<String>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            timeout: DEFAULT_TIMEOUT,
            parsers: ParserName::all(),
            custom_marker: None,
        }
    }
}

/// Output of a successful run.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Per-parser, per-file key maps in file submission order.
    pub translations: Vec<TranslationMap>,
    pub parse_faults: Vec<ParseFault>,
    pub files: usize,
    pub cache_hits: usize,
}

impl Extraction {
    /// Aggregate everything into one collection.
    pub fn collection(&self) -> TranslationCollection {
        TranslationCollection::from_partials(self.translations.iter().cloned())
    }
}

pub struct Orchestrator {
    workers: Vec<WorkerHandle>,
    timeout: Duration,
    custom_marker: Option<String>,
    /// Parser configuration, part of every cache key.
    configuration: String,
    next_id: u64,
}

/// A file waiting for a worker, with the cache key to store its result under.
struct Pending {
    index: usize,
    input: FileInput,
    cache_key: Option<String>,
}

impl Orchestrator {
    /// Spawn the worker pool. Workers live until [`Orchestrator::shutdown`] or drop.
    pub fn new(options: OrchestratorOptions) -> Result<Self, ExtractError> {
        let registry = ParserRegistry::with_parsers(&options.parsers);
        let workers = (0..options.pool_size.max(1))
            .map(|index| WorkerHandle::spawn(index, registry.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let parsers: Vec<&str> = registry.iter().map(|parser| parser.name()).collect();
        let configuration = format!(
            "{}|{}",
            options.custom_marker.as_deref().unwrap_or_default(),
            parsers.join(",")
        );

        Ok(Self {
            workers,
            timeout: options.timeout,
            custom_marker: options.custom_marker,
            configuration,
            next_id: 0,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }

    /// Extract keys from `files`.
    ///
    /// Cached results are used where the cache has them. `progress` is called
    /// with `(processed, total)` once for cache hits and after every chunk.
    pub fn parse(
        &mut self,
        files: Vec<FileInput>,
        cache: &mut dyn Cache<Vec<TranslationMap>>,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<Extraction, ExtractError> {
        let total = files.len();
        let mut results: Vec<Option<Vec<TranslationMap>>> = vec![None; total];
        let mut pending = Vec::new();
        let mut cache_hits = 0;

        for (index, input) in files.into_iter().enumerate() {
            if !cache.enabled() {
                pending.push(Pending {
                    index,
                    input,
                    cache_key: None,
                });
                continue;
            }
            let input = with_content(input);
            let key = match &input {
                FileInput::Content { file_path, content } => {
                    Some(cache_key(file_path, content, &self.configuration))
                }
                // Unreadable here: let the worker report it.
                FileInput::Path { .. } => None,
            };
            if let Some(hit) = key.as_deref().and_then(|key| cache.get(key)) {
                results[index] = Some(hit);
                cache_hits += 1;
            } else {
                pending.push(Pending {
                    index,
                    input,
                    cache_key: key,
                });
            }
        }
        if cache_hits > 0 {
            progress(cache_hits, total);
        }

        let mut parse_faults = Vec::new();
        let mut to_cache = Vec::new();
        let mut processed = cache_hits;
        let mut pending = pending.into_iter().peekable();
        while pending.peek().is_some() {
            let chunk: Vec<Pending> = pending.by_ref().take(self.workers.len()).collect();
            processed += chunk.len();

            let outputs = self.run_chunk(&chunk)?;
            for (item, output) in chunk.into_iter().zip(outputs) {
                if output.parse_faults.is_empty()
                    && let Some(key) = item.cache_key
                {
                    to_cache.push((key, output.translations.clone()));
                }
                parse_faults.extend(output.parse_faults);
                results[item.index] = Some(output.translations);
            }
            progress(processed, total);
        }

        // Only a completed run may touch the cache.
        for (key, translations) in to_cache {
            cache.set(&key, translations);
        }

        Ok(Extraction {
            translations: results.into_iter().flatten().flatten().collect(),
            parse_faults,
            files: total,
            cache_hits,
        })
    }

    /// Dispatch one file to each worker and wait for all of them.
    fn run_chunk(&mut self, chunk: &[Pending]) -> Result<Vec<FileOutput>, WorkerFault> {
        let cancel = CancellationToken::new();
        let first_id = self.next_id;
        self.next_id += chunk.len() as u64;

        let mut dispatched = Vec::with_capacity(chunk.len());
        for (offset, (worker, item)) in self.workers.iter().zip(chunk).enumerate() {
            let id = first_id + offset as u64;
            let request = WorkRequest {
                id,
                input: item.input.clone(),
                custom_marker: self.custom_marker.clone(),
                cancel: cancel.clone(),
            };
            if let Err(fault) = worker.send(request) {
                cancel.cancel();
                return Err(fault);
            }
            dispatched.push((worker, id, item.input.file_path()));
        }

        let deadline = Instant::now() + self.timeout;
        let mut outputs = Vec::with_capacity(dispatched.len());
        for (worker, id, file) in dispatched {
            match worker.receive(id, file, deadline, self.timeout) {
                Ok(output) => outputs.push(output),
                Err(fault) => {
                    cancel.cancel();
                    return Err(fault);
                }
            }
        }
        Ok(outputs)
    }

    /// Stop every worker and wait for them to exit.
    pub fn shutdown(self) {
        for worker in self.workers {
            worker.join();
        }
    }
}

/// Read a path-only input so its content can be hashed. Unreadable files stay path-only.
fn with_content(input: FileInput) -> FileInput {
    match input {
        FileInput::Path { file_path } => match fs::read(&file_path) {
            Ok(bytes) => FileInput::Content {
                file_path,
                content: String::from_utf8_lossy(&bytes).into_owned(),
            },
            Err(_) => FileInput::Path { file_path },
        },
        content => content,
    }
}
