//! Report formatting and printing utilities.
//!
//! Separate from the task so the extractor can be used as a library. Every
//! `print_*` function has a `print_*_to` twin writing to any `Write`.

use std::{
    io::{self, Write},
    path::Path,
};

use colored::Colorize;

use crate::{
    config::CONFIG_FILE_NAME,
    core::{
        compilers::Format,
        error::{ExtractError, ParseFault},
        parsers::ParserName,
    },
    task::{DestinationReport, TaskOutcome},
};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

const PROGRESS_MARK: &str = "\u{25cf}"; // ●
const DONE_MARK: &str = "\u{2714}"; // ✔

/// Rewrite the progress line on stderr.
pub fn print_progress(processed: usize, total: usize) {
    let mut stderr = io::stderr().lock();
    print_progress_to(processed, total, &mut stderr);
    let _ = stderr.flush();
}

/// Print the progress line to a custom writer. The line ends when `processed == total`.
pub fn print_progress_to<W: Write>(processed: usize, total: usize, writer: &mut W) {
    let percent = if total == 0 {
        100
    } else {
        processed * 100 / total
    };
    let line = format!("{processed}/{total} ({percent}%)");
    if processed >= total {
        let _ = writeln!(writer, "\r{} {}", DONE_MARK.green(), line);
    } else {
        let _ = write!(writer, "\r{} {}", PROGRESS_MARK.yellow(), line);
    }
}

/// Print where the configuration came from.
pub fn print_config_source_to<W: Write>(path: Option<&Path>, writer: &mut W) {
    let _ = match path {
        Some(path) => writeln!(writer, "Using config from {}", path.display()),
        None => writeln!(writer, "No {} found, using defaults", CONFIG_FILE_NAME),
    };
}

/// Print the catalog format and the parsers that will run.
pub fn print_settings_to<W: Write>(format: Format, parsers: &[ParserName], writer: &mut W) {
    let parsers: Vec<&str> = parsers.iter().map(ParserName::as_str).collect();
    let _ = writeln!(
        writer,
        "Writing {} catalogs, parsers: {}",
        format.as_str(),
        parsers.join(", ")
    );
}

/// Print the outcome of a task: string count, one line per destination,
/// then warnings on stderr.
pub fn print_outcome(outcome: &TaskOutcome, verbose: bool) {
    print_outcome_to(
        outcome,
        verbose,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    );
}

pub fn print_outcome_to<O: Write, E: Write>(
    outcome: &TaskOutcome,
    verbose: bool,
    out: &mut O,
    err: &mut E,
) {
    if verbose {
        let _ = writeln!(
            out,
            "Extracted from {} {} with {} {} ({} cached)",
            outcome.files,
            if outcome.files == 1 { "file" } else { "files" },
            outcome.pool_size,
            if outcome.pool_size == 1 {
                "worker"
            } else {
                "workers"
            },
            outcome.cache_hits
        );
    }
    let _ = writeln!(out, "Found {} strings.", outcome.count);
    print_destinations_to(&outcome.destinations, out);

    if verbose {
        print_parse_faults_to(&outcome.parse_faults, err);
    } else {
        print_parse_warning_to(outcome.parse_faults.len(), verbose, err);
    }
    if let Some(cache_error) = &outcome.cache_error {
        print_cache_warning_to(cache_error, err);
    }
}

/// Print one status line per destination.
pub fn print_destinations_to<W: Write>(destinations: &[DestinationReport], writer: &mut W) {
    if destinations.is_empty() {
        return;
    }
    let _ = writeln!(writer, "Saving:");
    for report in destinations {
        match &report.result {
            Ok(outcome) => {
                let status = format!("[{}]", outcome);
                let _ = writeln!(writer, "- {} {}", report.destination, status.green());
            }
            Err(error) => {
                let _ = writeln!(writer, "- {} {}", report.destination, "[ERROR]".red());
                let _ = writeln!(writer, "  {} {:#}", FAILURE_MARK.red(), error);
            }
        }
    }
}

/// Print a warning about parser faults.
pub fn print_parse_warning_to<W: Write>(count: usize, verbose: bool, writer: &mut W) {
    if count > 0 && !verbose {
        let _ = writeln!(
            writer,
            "{} {} parser error(s) (use {} for details)",
            "warning:".bold().yellow(),
            count,
            "-v".cyan()
        );
    }
}

pub fn print_parse_faults_to<W: Write>(faults: &[ParseFault], writer: &mut W) {
    for fault in faults {
        let _ = writeln!(writer, "{} {}", "warning:".bold().yellow(), fault);
    }
}

pub fn print_cache_warning_to<W: Write>(error: &ExtractError, writer: &mut W) {
    let _ = writeln!(
        writer,
        "{} {}: {}",
        "warning:".bold().yellow(),
        error,
        std::error::Error::source(error)
            .map(ToString::to_string)
            .unwrap_or_default()
    );
}
