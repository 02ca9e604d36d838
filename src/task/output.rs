//! Output destinations: where a catalog is written and how.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use super::files::normalize_separators;
use crate::core::{
    TranslationCollection,
    compilers::{Compile, Compiler},
    post_process::{PostProcessor, run_chain},
};

const DEFAULT_FILE_STEM: &str = "strings";

/// What saving did to the destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// There was no file.
    Created,
    /// The previous file was overwritten.
    Replaced,
    /// The previous file was merged into the new catalog.
    Merged,
}

impl SaveOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveOutcome::Created => "CREATED",
            SaveOutcome::Replaced => "REPLACED",
            SaveOutcome::Merged => "MERGED",
        }
    }
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Path as shown to the user.
    pub display: String,
    pub path: PathBuf,
}

/// Resolve an output argument. An existing directory gets `strings.<extension>` inside it.
pub fn resolve_destination(base_dir: &Path, output: &str, extension: &str) -> Destination {
    let path = base_dir.join(output);
    if path.is_dir() {
        let file_name = format!("{DEFAULT_FILE_STEM}.{extension}");
        let display = normalize_separators(output);
        let display = format!("{}/{file_name}", display.trim_end_matches('/'));
        return Destination {
            display,
            path: path.join(file_name),
        };
    }
    Destination {
        display: normalize_separators(output),
        path,
    }
}

/// Merge `extracted` with the catalog at `destination`, run the post-processors
/// and write the result.
///
/// The existing catalog is only read when `replace` is false.
pub fn save(
    destination: &Destination,
    extracted: &TranslationCollection,
    compiler: &Compiler,
    processors: &[PostProcessor],
    replace: bool,
) -> Result<SaveOutcome> {
    let exists = destination.path.is_file();
    let existing = if exists && !replace {
        let contents = fs::read_to_string(&destination.path)
            .with_context(|| format!("Failed to read {}", destination.display))?;
        compiler
            .parse(&contents)
            .with_context(|| format!("Failed to parse {}", destination.display))?
    } else {
        TranslationCollection::new()
    };

    let draft = extracted.union(&existing);
    let catalog = run_chain(processors, draft, extracted, &existing);
    let output = compiler
        .compile(&catalog)
        .with_context(|| format!("Failed to compile {}", destination.display))?;

    if let Some(dir) = destination.path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    fs::write(&destination.path, output)
        .with_context(|| format!("Failed to write {}", destination.display))?;

    Ok(match (exists, replace) {
        (false, _) => SaveOutcome::Created,
        (true, true) => SaveOutcome::Replaced,
        (true, false) => SaveOutcome::Merged,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::core::{
        TranslationEntry,
        compilers::{CompilerOptions, Format},
        post_process::PurgeObsoleteKeys,
    };

    fn json() -> Compiler {
        Compiler::new(
            Format::Json,
            &CompilerOptions {
                indentation: "  ".to_string(),
                ..Default::default()
            },
        )
    }

    fn extracted() -> TranslationCollection {
        let mut collection = TranslationCollection::new();
        collection.add("HELLO", TranslationEntry::with_source("a.html"));
        collection.add("BYE", TranslationEntry::with_source("b.html"));
        collection
    }

    #[test]
    fn test_directory_output_gets_default_file_name() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("i18n")).unwrap();

        let destination = resolve_destination(dir.path(), "i18n/", "po");
        assert_eq!(destination.display, "i18n/strings.po");
        assert_eq!(destination.path, dir.path().join("i18n").join("strings.po"));

        let destination = resolve_destination(dir.path(), "i18n/en.json", "json");
        assert_eq!(destination.display, "i18n/en.json");
        assert_eq!(destination.path, dir.path().join("i18n/en.json"));
    }

    #[test]
    fn test_created_in_new_directory() {
        let dir = tempdir().unwrap();
        let destination = resolve_destination(dir.path(), "deep/nested/en.json", "json");

        let outcome = save(&destination, &extracted(), &json(), &[], false).unwrap();
        assert_eq!(outcome, SaveOutcome::Created);
        assert_eq!(
            fs::read_to_string(&destination.path).unwrap(),
            "{\n  \"HELLO\": \"\",\n  \"BYE\": \"\"\n}\n"
        );
    }

    #[test]
    fn test_merged_keeps_existing_values() {
        let dir = tempdir().unwrap();
        let destination = resolve_destination(dir.path(), "fr.json", "json");
        fs::write(&destination.path, "{\"HELLO\": \"Bonjour\", \"OLD\": \"Vieux\"}").unwrap();

        let outcome = save(&destination, &extracted(), &json(), &[], false).unwrap();
        assert_eq!(outcome, SaveOutcome::Merged);
        assert_eq!(
            fs::read_to_string(&destination.path).unwrap(),
            "{\n  \"HELLO\": \"Bonjour\",\n  \"BYE\": \"\",\n  \"OLD\": \"Vieux\"\n}\n"
        );
    }

    #[test]
    fn test_merged_with_purge() {
        let dir = tempdir().unwrap();
        let destination = resolve_destination(dir.path(), "fr.json", "json");
        fs::write(&destination.path, "{\"HELLO\": \"Bonjour\", \"OLD\": \"Vieux\"}").unwrap();

        let processors: Vec<PostProcessor> = vec![PurgeObsoleteKeys.into()];
        save(&destination, &extracted(), &json(), &processors, false).unwrap();
        assert_eq!(
            fs::read_to_string(&destination.path).unwrap(),
            "{\n  \"HELLO\": \"Bonjour\",\n  \"BYE\": \"\"\n}\n"
        );
    }

    #[test]
    fn test_replaced_ignores_existing_file() {
        let dir = tempdir().unwrap();
        let destination = resolve_destination(dir.path(), "fr.json", "json");
        fs::write(&destination.path, "not even json").unwrap();

        let outcome = save(&destination, &extracted(), &json(), &[], true).unwrap();
        assert_eq!(outcome, SaveOutcome::Replaced);
        assert_eq!(
            fs::read_to_string(&destination.path).unwrap(),
            "{\n  \"HELLO\": \"\",\n  \"BYE\": \"\"\n}\n"
        );
    }

    #[test]
    fn test_unparsable_existing_catalog_is_an_error() {
        let dir = tempdir().unwrap();
        let destination = resolve_destination(dir.path(), "fr.json", "json");
        fs::write(&destination.path, "not even json").unwrap();

        let err = save(&destination, &extracted(), &json(), &[], false).unwrap_err();
        assert!(err.to_string().contains("fr.json"));
        assert_eq!(fs::read_to_string(&destination.path).unwrap(), "not even json");
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(SaveOutcome::Created.to_string(), "CREATED");
        assert_eq!(SaveOutcome::Replaced.to_string(), "REPLACED");
        assert_eq!(SaveOutcome::Merged.to_string(), "MERGED");
    }
}
