//! Input file resolution.
//!
//! An input is one of:
//! - a directory: walked recursively, files matching any of the patterns are kept
//! - a glob pattern: expanded, directories dropped
//! - a file: taken as-is

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use glob::{Pattern, glob};
use walkdir::WalkDir;

use crate::core::error::ExtractError;

pub const DEFAULT_PATTERNS: &[&str] = &["**/*.html", "**/*.ts"];

/// Check if an input contains glob wildcards (* or ?).
fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?')
}

/// Forward slashes everywhere, so patterns behave the same on every platform.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Render `path` relative to `base_dir` when it lies inside it.
fn display_path(base_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base_dir).unwrap_or(path);
    normalize_separators(&relative.to_string_lossy())
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, ExtractError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(&normalize_separators(pattern)).map_err(|e| ExtractError::Input {
                pattern: pattern.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// Resolve `inputs` against `base_dir`. Results are deduplicated and sorted.
pub fn resolve_inputs(
    base_dir: &Path,
    inputs: &[String],
    patterns: &[String],
) -> Result<Vec<String>, ExtractError> {
    let patterns = compile_patterns(patterns)?;
    let mut files: BTreeSet<String> = BTreeSet::new();

    for input in inputs {
        let normalized = normalize_separators(input);
        if is_glob_pattern(&normalized) {
            for path in expand_glob(base_dir, &normalized)? {
                files.insert(display_path(base_dir, &path));
            }
            continue;
        }

        let path = base_dir.join(&normalized);
        if path.is_dir() {
            for file in walk_dir(&path, &patterns) {
                files.insert(display_path(base_dir, &file));
            }
        } else if path.is_file() {
            files.insert(display_path(base_dir, &path));
        } else {
            return Err(ExtractError::Input {
                pattern: input.clone(),
                message: "no such file or directory".to_string(),
            });
        }
    }

    Ok(files.into_iter().collect())
}

fn expand_glob(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ExtractError> {
    let full_pattern = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        normalize_separators(&base_dir.join(pattern).to_string_lossy())
    };
    let entries = glob(&full_pattern).map_err(|e| ExtractError::Input {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    Ok(entries.flatten().filter(|path| path.is_file()).collect())
}

fn walk_dir(dir: &Path, patterns: &[Pattern]) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let relative = display_path(dir, entry.path());
            patterns.iter().any(|pattern| pattern.matches(&relative))
        })
        .map(|entry| entry.into_path())
        .collect()
}
