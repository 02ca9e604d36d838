//! The extract task: resolve inputs, run the orchestrator, save every destination.
//!
//! Destinations are saved in parallel, each on its own: a failing destination is
//! reported in [`TaskOutcome::destinations`] and never affects the others.

pub mod files;
pub mod output;

use std::{path::PathBuf, time::Duration};

use rayon::prelude::*;

pub use files::{DEFAULT_PATTERNS, resolve_inputs};
pub use output::{Destination, SaveOutcome, resolve_destination, save};

use crate::core::{
    TranslationMap,
    cache::{Cache, NullCache},
    compilers::{Compile, Compiler},
    error::{ExtractError, ParseFault},
    extract::{DEFAULT_TIMEOUT, FileInput, Orchestrator, OrchestratorOptions, default_pool_size},
    parsers::ParserName,
    post_process::PostProcessor,
};

/// Result of saving one destination.
#[derive(Debug)]
pub struct DestinationReport {
    pub destination: String,
    pub result: anyhow::Result<SaveOutcome>,
}

#[derive(Debug)]
pub struct TaskOutcome {
    /// Number of input files.
    pub files: usize,
    /// Number of distinct keys extracted.
    pub count: usize,
    pub cache_hits: usize,
    pub pool_size: usize,
    pub parse_faults: Vec<ParseFault>,
    /// One report per output, in output order.
    pub destinations: Vec<DestinationReport>,
    /// Set when every destination was saved but the cache could not be written.
    pub cache_error: Option<ExtractError>,
}

impl TaskOutcome {
    pub fn has_failed_destinations(&self) -> bool {
        self.destinations.iter().any(|report| report.result.is_err())
    }
}

pub struct ExtractTask {
    inputs: Vec<String>,
    outputs: Vec<String>,
    base_dir: PathBuf,
    patterns: Vec<String>,
    replace: bool,
    parsers: Vec<ParserName>,
    custom_marker: Option<String>,
    post_processors: Vec<PostProcessor>,
    compiler: Option<Compiler>,
    cache: Box<dyn Cache<Vec<TranslationMap>>>,
    pool_size: usize,
    timeout: Duration,
}

impl ExtractTask {
    /// A task over `inputs`, relative to the working directory, writing to `outputs`.
    pub fn new(inputs: Vec<String>, outputs: Vec<String>) -> Self {
        Self {
            inputs,
            outputs,
            base_dir: PathBuf::new(),
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            replace: false,
            parsers: ParserName::all(),
            custom_marker: None,
            post_processors: Vec::new(),
            compiler: None,
            cache: Box::new(NullCache),
            pool_size: default_pool_size(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn patterns(mut self, patterns: Vec<String>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn parsers(mut self, parsers: Vec<ParserName>) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn custom_marker(mut self, marker: Option<String>) -> Self {
        self.custom_marker = marker;
        self
    }

    pub fn post_processors(mut self, post_processors: Vec<PostProcessor>) -> Self {
        self.post_processors = post_processors;
        self
    }

    pub fn compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = Some(compiler);
        self
    }

    pub fn cache(mut self, cache: Box<dyn Cache<Vec<TranslationMap>>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the task. `progress` receives `(processed, total)` file counts.
    ///
    /// Extraction-level failures abort with an error before anything is written.
    pub fn execute(mut self, progress: impl FnMut(usize, usize)) -> Result<TaskOutcome, ExtractError> {
        let compiler = self.compiler.take().ok_or(ExtractError::MissingCompiler)?;

        let files = resolve_inputs(&self.base_dir, &self.inputs, &self.patterns)?;
        let inputs: Vec<FileInput> = files
            .iter()
            .map(|file| FileInput::path(self.base_dir.join(file).to_string_lossy()))
            .collect();

        let mut orchestrator = Orchestrator::new(OrchestratorOptions {
            pool_size: self.pool_size,
            timeout: self.timeout,
            parsers: self.parsers.clone(),
            custom_marker: self.custom_marker.clone(),
        })?;
        let pool_size = orchestrator.pool_size();
        // On error the orchestrator is dropped without joining, so a stuck worker cannot block exit.
        let extraction = orchestrator.parse(inputs, self.cache.as_mut(), progress)?;
        orchestrator.shutdown();

        let extracted = extraction.collection();
        let destinations: Vec<DestinationReport> = self
            .outputs
            .par_iter()
            .map(|output| {
                let destination = resolve_destination(&self.base_dir, output, compiler.extension());
                let result = save(
                    &destination,
                    &extracted,
                    &compiler,
                    &self.post_processors,
                    self.replace,
                );
                DestinationReport {
                    destination: destination.display,
                    result,
                }
            })
            .collect();

        let mut outcome = TaskOutcome {
            files: extraction.files,
            count: extracted.count(),
            cache_hits: extraction.cache_hits,
            pool_size,
            parse_faults: extraction.parse_faults,
            destinations,
            cache_error: None,
        };
        if !outcome.has_failed_destinations() {
            outcome.cache_error = self.cache.persist().err();
        }
        Ok(outcome)
    }
}
