use serde::Serialize;
use serde_json::{Map, Value, ser::PrettyFormatter};

use super::Compile;
use crate::core::{TranslationCollection, TranslationEntry, TranslationMap, error::CompileError};

/// Flat `{ "KEY": "value" }` catalog.
#[derive(Debug, Clone)]
pub struct JsonCompiler {
    indentation: String,
}

impl JsonCompiler {
    pub fn new(indentation: &str) -> Self {
        Self {
            indentation: indentation.to_string(),
        }
    }
}

impl Compile for JsonCompiler {
    fn extension(&self) -> &str {
        "json"
    }

    fn compile(&self, collection: &TranslationCollection) -> Result<String, CompileError> {
        let map: Map<String, Value> = collection
            .iter()
            .map(|(key, entry)| (key.to_string(), entry_value(entry)))
            .collect();
        to_pretty_string(&Value::Object(map), &self.indentation)
    }

    fn parse(&self, contents: &str) -> Result<TranslationCollection, CompileError> {
        parse_catalog(contents)
    }
}

/// Catalog value of an entry. Untranslated keys are written as `""`.
pub(super) fn entry_value(entry: &TranslationEntry) -> Value {
    Value::String(entry.value.clone().unwrap_or_default())
}

/// Serialize with the given indentation and a trailing newline.
pub(super) fn to_pretty_string(value: &Value, indentation: &str) -> Result<String, CompileError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(indentation.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    let mut text = String::from_utf8_lossy(&buf).into_owned();
    text.push('\n');
    Ok(text)
}

/// Read a JSON catalog, flattening nested objects with `.`.
pub(super) fn parse_catalog(contents: &str) -> Result<TranslationCollection, CompileError> {
    if contents.trim().is_empty() {
        return Ok(TranslationCollection::new());
    }
    let Value::Object(root) = serde_json::from_str::<Value>(contents)? else {
        return Err(CompileError::NotAnObject);
    };
    let mut values = TranslationMap::new();
    flatten_object(&root, "", &mut values);
    Ok(TranslationCollection::from_map(values))
}

fn flatten_object(object: &Map<String, Value>, prefix: &str, out: &mut TranslationMap) {
    for (key, value) in object {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(nested) => flatten_object(nested, &path, out),
            Value::String(s) => {
                out.insert(path, TranslationEntry::with_value(s.as_str()));
            }
            Value::Null => {
                out.insert(path, TranslationEntry::default());
            }
            other => {
                out.insert(path, TranslationEntry::with_value(other.to_string()));
            }
        }
    }
}
