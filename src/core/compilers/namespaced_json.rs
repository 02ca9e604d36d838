use serde_json::{Map, Value};

use super::{
    Compile,
    json::{entry_value, parse_catalog, to_pretty_string},
};
use crate::core::{TranslationCollection, error::CompileError};

/// Nested catalog: `"a.b.c"` is written as `{ "a": { "b": { "c": ... } } }`.
#[derive(Debug, Clone)]
pub struct NamespacedJsonCompiler {
    indentation: String,
}

impl NamespacedJsonCompiler {
    pub fn new(indentation: &str) -> Self {
        Self {
            indentation: indentation.to_string(),
        }
    }
}

impl Compile for NamespacedJsonCompiler {
    fn extension(&self) -> &str {
        "json"
    }

    fn compile(&self, collection: &TranslationCollection) -> Result<String, CompileError> {
        let mut root = Map::new();
        for (key, entry) in collection.iter() {
            let path: Vec<&str> = key.split('.').collect();
            insert_nested(&mut root, &path, entry_value(entry));
        }
        to_pretty_string(&Value::Object(root), &self.indentation)
    }

    fn parse(&self, contents: &str) -> Result<TranslationCollection, CompileError> {
        parse_catalog(contents)
    }
}

/// Insert a value at a nested path, creating intermediate objects as needed.
///
/// A leaf in the way of a deeper key is replaced by an object.
fn insert_nested(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        // Keep existing children when a key is also a namespace.
        if !root.get(*first).is_some_and(Value::is_object) {
            root.insert(first.to_string(), value);
        }
        return;
    }

    let next_level = root
        .entry(first.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !next_level.is_object() {
        *next_level = Value::Object(Map::new());
    }
    if let Value::Object(inner) = next_level {
        insert_nested(inner, rest, value);
    }
}
