//! Catalog compilers.
//!
//! A compiler turns a [`TranslationCollection`] into catalog text and reads a
//! catalog it wrote back into a collection. The set of formats is closed and
//! selected by [`Format`].

pub mod json;
pub mod namespaced_json;
pub mod po;

use clap::ValueEnum;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

pub use json::JsonCompiler;
pub use namespaced_json::NamespacedJsonCompiler;
pub use po::PoCompiler;

use crate::core::{TranslationCollection, error::CompileError};

#[enum_dispatch]
pub trait Compile {
    /// File extension of the catalog, without the dot.
    fn extension(&self) -> &str;

    fn compile(&self, collection: &TranslationCollection) -> Result<String, CompileError>;

    fn parse(&self, contents: &str) -> Result<TranslationCollection, CompileError>;
}

#[enum_dispatch(Compile)]
#[derive(Debug, Clone)]
pub enum Compiler {
    Json(JsonCompiler),
    NamespacedJson(NamespacedJsonCompiler),
    Po(PoCompiler),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    #[default]
    Json,
    NamespacedJson,
    Po,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::NamespacedJson => "namespaced-json",
            Format::Po => "po",
        }
    }
}

/// Format-specific settings. Each compiler reads only the fields it needs.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    pub indentation: String,
    pub po_source_locations: bool,
    pub po_domain: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            indentation: "\t".to_string(),
            po_source_locations: true,
            po_domain: String::new(),
        }
    }
}

impl Compiler {
    pub fn new(format: Format, options: &CompilerOptions) -> Self {
        match format {
            Format::Json => JsonCompiler::new(&options.indentation).into(),
            Format::NamespacedJson => NamespacedJsonCompiler::new(&options.indentation).into(),
            Format::Po => PoCompiler::new(&options.po_domain, options.po_source_locations).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_by_format() {
        let options = CompilerOptions::default();
        let extensions: Vec<_> = [Format::Json, Format::NamespacedJson, Format::Po]
            .into_iter()
            .map(|format| Compiler::new(format, &options).extension().to_string())
            .collect();
        assert_eq!(extensions, vec!["json", "json", "po"]);
    }
}
