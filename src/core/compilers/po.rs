//! Gettext PO catalogs, read and written through `polib`.
//!
//! Written catalogs carry a header with the MIME version, content type and
//! transfer encoding, then one message per key:
//!
//! ```text
//! #: src/app/app.component.html src/app/app.component.ts
//! msgctxt "domain"
//! msgid "HELLO"
//! msgstr "Bonjour"
//! ```
//!
//! `msgctxt` is only written for a non-empty domain. On parse, messages of
//! other domains and obsolete (`#~`) entries are dropped, and plural messages
//! keep their last form.

use std::{fs, path::Path};

use polib::{
    catalog::Catalog,
    message::{Message, MessageView},
    metadata::CatalogMetadata,
    po_file,
};
use tempfile::TempDir;

use super::Compile;
use crate::core::{TranslationCollection, TranslationEntry, TranslationMap, error::CompileError};

/// Upper bound on `msgstr[N]` indices accepted from existing catalogs.
const MAX_PLURAL_FORMS: usize = 16;

const SCRATCH_FILE: &str = "catalog.po";

#[derive(Debug, Clone)]
pub struct PoCompiler {
    domain: String,
    source_locations: bool,
}

impl Default for PoCompiler {
    fn default() -> Self {
        Self::new("", true)
    }
}

impl PoCompiler {
    pub fn new(domain: &str, source_locations: bool) -> Self {
        Self {
            domain: domain.to_string(),
            source_locations,
        }
    }

    fn catalog(&self, collection: &TranslationCollection) -> Catalog {
        let mut metadata = CatalogMetadata::new();
        metadata.mime_version = "1.0".to_string();
        metadata.content_type = "text/plain; charset=utf-8".to_string();
        metadata.content_transfer_encoding = "8bit".to_string();

        let mut catalog = Catalog::new(metadata);
        for (key, entry) in collection.iter() {
            // The empty msgid is the header.
            if key.is_empty() {
                continue;
            }
            let source = if self.source_locations {
                entry.source_files.join(" ")
            } else {
                String::new()
            };
            let message = Message::build_singular()
                .with_source(source)
                .with_msgctxt(self.domain.clone())
                .with_msgid(key.to_string())
                .with_msgstr(entry.value.clone().unwrap_or_default())
                .done();
            catalog.append_or_update(message);
        }
        catalog
    }
}

impl Compile for PoCompiler {
    fn extension(&self) -> &str {
        "po"
    }

    fn compile(&self, collection: &TranslationCollection) -> Result<String, CompileError> {
        let scratch = TempDir::new()?;
        let path = scratch.path().join(SCRATCH_FILE);
        po_file::write(&self.catalog(collection), &path)?;
        Ok(fs::read_to_string(&path)?)
    }

    fn parse(&self, contents: &str) -> Result<TranslationCollection, CompileError> {
        let active = active_lines(contents)?;
        if active.trim().is_empty() {
            return Ok(TranslationCollection::new());
        }

        let scratch = TempDir::new()?;
        let path = scratch.path().join(SCRATCH_FILE);
        fs::write(&path, active)?;
        let catalog = read_catalog(&path)?;

        let mut values = TranslationMap::new();
        for message in catalog.messages() {
            if message.msgctxt() != self.domain || message.msgid().is_empty() {
                continue;
            }
            let value = if message.is_plural() {
                message
                    .msgstr_plural()
                    .ok()
                    .and_then(|forms| forms.last().cloned())
            } else {
                message.msgstr().ok().map(str::to_string)
            };
            let entry = TranslationEntry {
                value,
                source_files: message
                    .source()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
            };
            values.insert(message.msgid().to_string(), entry);
        }
        Ok(TranslationCollection::from_map(values))
    }
}

fn read_catalog(path: &Path) -> Result<Catalog, CompileError> {
    po_file::parse(path).map_err(|err| CompileError::PoCatalog(err.to_string()))
}

/// Drop obsolete entries and reject plural indices no catalog can carry.
fn active_lines(contents: &str) -> Result<String, CompileError> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    let mut active = String::with_capacity(contents.len());
    for (index, text) in contents.lines().enumerate() {
        let trimmed = text.trim_start();
        if trimmed.starts_with("#~") {
            // Keeps an obsolete entry from running into the next message.
            active.push('\n');
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("msgstr[") {
            check_plural_index(rest, index + 1)?;
        }
        active.push_str(text);
        active.push('\n');
    }
    Ok(active)
}

fn check_plural_index(rest: &str, line: usize) -> Result<(), CompileError> {
    let plural_index = rest
        .split_once(']')
        .and_then(|(index, _)| index.trim().parse::<usize>().ok());
    match plural_index {
        Some(index) if index < MAX_PLURAL_FORMS => Ok(()),
        _ => Err(CompileError::Po {
            line,
            message: format!(
                "plural form index must be below {MAX_PLURAL_FORMS}, found `msgstr[{rest}`"
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(value: Option<&str>, sources: &[&str]) -> TranslationEntry {
        TranslationEntry {
            value: value.map(String::from),
            source_files: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn collection() -> TranslationCollection {
        let mut collection = TranslationCollection::new();
        collection.add("HELLO", entry(Some("Bonjour"), &["src/a.html", "src/b.ts"]));
        collection.add("BYE", entry(None, &["src/c.ts"]));
        collection
    }

    #[test]
    fn test_compile() {
        let text = PoCompiler::default().compile(&collection()).unwrap();
        assert!(text.contains("Content-Type: text/plain; charset=utf-8"));
        assert!(text.contains("#: src/a.html src/b.ts"));
        assert!(text.contains("msgid \"HELLO\""));
        assert!(text.contains("msgstr \"Bonjour\""));
        assert!(text.contains("#: src/c.ts"));
        assert!(!text.contains("msgctxt"));
        assert!(text.find("HELLO") < text.find("BYE"));
    }

    #[test]
    fn test_compile_skips_empty_key() {
        let mut collection = collection();
        collection.add("", TranslationEntry::with_value("not a header"));
        let text = PoCompiler::default().compile(&collection).unwrap();
        assert!(!text.contains("not a header"));
    }

    #[test]
    fn test_compile_with_domain_without_locations() {
        let text = PoCompiler::new("app", false).compile(&collection()).unwrap();
        assert!(text.contains("msgctxt \"app\""));
        assert!(!text.contains("#:"));
    }

    #[test]
    fn test_round_trip() {
        let compiler = PoCompiler::default();
        let first = compiler.compile(&collection()).unwrap();
        let parsed = compiler.parse(&first).unwrap();
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["HELLO", "BYE"]);
        assert_eq!(parsed.get("HELLO"), Some(&entry(Some("Bonjour"), &["src/a.html", "src/b.ts"])));
        assert_eq!(parsed.get("BYE"), Some(&entry(Some(""), &["src/c.ts"])));
    }

    #[test]
    fn test_escaped_values_round_trip() {
        let mut collection = TranslationCollection::new();
        collection.add("SAY", TranslationEntry::with_value("He said \"hi\"\\\tok"));
        collection.add("LINES", TranslationEntry::with_value("one\ntwo"));
        let compiler = PoCompiler::new("", false);

        let parsed = compiler.parse(&compiler.compile(&collection).unwrap()).unwrap();
        assert_eq!(parsed, collection);
    }

    #[test]
    fn test_parse_filters_domain() {
        let contents = r#"msgid ""
msgstr ""
"Content-Type: text/plain; charset=utf-8\n"

msgctxt "admin"
msgid "ADMIN"
msgstr "Admin"

msgid "DEFAULT"
msgstr "Default"
"#;
        let default = PoCompiler::default().parse(contents).unwrap();
        assert_eq!(default.keys().collect::<Vec<_>>(), vec!["DEFAULT"]);

        let admin = PoCompiler::new("admin", true).parse(contents).unwrap();
        assert_eq!(admin.keys().collect::<Vec<_>>(), vec!["ADMIN"]);
    }

    #[test]
    fn test_parse_plural_keeps_last_form() {
        let contents = r#"msgid ""
msgstr ""
"Content-Type: text/plain; charset=utf-8\n"

msgid "ITEMS"
msgid_plural "ITEMS_PLURAL"
msgstr[0] "one item"
msgstr[1] "many items"

msgid "NEXT"
msgstr "next"
"#;
        let parsed = PoCompiler::default().parse(contents).unwrap();
        assert_eq!(parsed.get("ITEMS").unwrap().value.as_deref(), Some("many items"));
        assert_eq!(parsed.get("NEXT").unwrap().value.as_deref(), Some("next"));
    }

    #[test]
    fn test_parse_skips_obsolete_entries() {
        let contents = "#~ msgid \"GONE\"\n#~ msgstr \"Parti\"\n\nmsgid \"KEPT\"\nmsgstr \"\"\n";
        let parsed = PoCompiler::default().parse(contents).unwrap();
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["KEPT"]);
    }

    #[test]
    fn test_parse_obsolete_entry_directly_before_message() {
        let contents = "#~ msgid \"OLD\"\n#~ msgstr \"\"\nmsgid \"KEPT\"\nmsgstr \"\"\n";
        let parsed = PoCompiler::default().parse(contents).unwrap();
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["KEPT"]);
    }

    #[test]
    fn test_parse_rejects_out_of_range_plural_index() {
        for index in ["18446744073709551615", "4000000000", "99999999999999999999999", "x"] {
            let contents = format!("msgid \"a\"\nmsgid_plural \"b\"\nmsgstr[{index}] \"\"\n");
            let err = PoCompiler::default().parse(&contents).unwrap_err();
            assert!(matches!(err, CompileError::Po { line: 3, .. }), "{index}: {err}");
        }
    }

    #[test]
    fn test_parse_empty_catalog() {
        assert!(PoCompiler::default().parse("").unwrap().is_empty());
    }
}
