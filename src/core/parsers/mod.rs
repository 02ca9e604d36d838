//! Key extraction parsers.
//!
//! Each parser recognizes one call-site shape and returns the keys it found in a
//! single file:
//! - `pipe`: `'KEY' | translate` in templates
//! - `directive`: `translate` / `ngx-translate` attributes in templates
//! - `service`: `translate.get('KEY')` on an injected `TranslateService`
//! - `marker`: `marker('KEY')` imported from a marker package, or a custom function name
//!
//! Parsers are pure and independent: they share no state and may run on any thread.

pub mod directive;
pub mod marker;
pub mod pipe;
pub mod script;
pub mod service;
pub mod template;

use clap::ValueEnum;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

pub use directive::DirectiveParser;
pub use marker::{FunctionParser, MarkerParser};
pub use pipe::PipeParser;
pub use service::ServiceParser;

use crate::core::{TranslationCollection, error::ParserError};

/// Extract translation keys from one file.
#[enum_dispatch]
pub trait Extract {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Returns an empty collection when nothing is found.
    fn extract(&self, content: &str, file_path: &str)
    -> Result<TranslationCollection, ParserError>;
}

#[enum_dispatch(Extract)]
#[derive(Debug, Clone)]
pub enum Parser {
    Pipe(PipeParser),
    Directive(DirectiveParser),
    Service(ServiceParser),
    Marker(MarkerParser),
    Function(FunctionParser),
}

/// Registry slot names, in the fixed order parsers run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParserName {
    Pipe,
    Directive,
    Service,
    Marker,
}

impl ParserName {
    pub fn all() -> Vec<Self> {
        vec![Self::Pipe, Self::Directive, Self::Service, Self::Marker]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pipe => "pipe",
            Self::Directive => "directive",
            Self::Service => "service",
            Self::Marker => "marker",
        }
    }

    fn default_parser(self) -> Parser {
        match self {
            Self::Pipe => PipeParser.into(),
            Self::Directive => DirectiveParser.into(),
            Self::Service => ServiceParser.into(),
            Self::Marker => MarkerParser.into(),
        }
    }
}

/// Name-keyed, ordered set of parsers.
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    slots: Vec<(ParserName, Parser)>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_parsers(&ParserName::all())
    }
}

impl ParserRegistry {
    /// Registry with the default parser for each name, in fixed order whatever
    /// order the names are given in.
    pub fn with_parsers(names: &[ParserName]) -> Self {
        let mut names = names.to_vec();
        names.sort();
        names.dedup();
        Self {
            slots: names
                .into_iter()
                .map(|name| (name, name.default_parser()))
                .collect(),
        }
    }

    /// Replace the parser in an enabled slot. Disabled slots stay disabled.
    pub fn set(&mut self, name: ParserName, parser: Parser) {
        if let Some(slot) = self.slots.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = parser;
        }
    }

    /// Swap the marker slot for a parser recognizing calls to `function_name`.
    pub fn use_custom_marker(&mut self, function_name: &str) {
        self.set(
            ParserName::Marker,
            FunctionParser::new(function_name).into(),
        );
    }

    pub fn get(&self, name: ParserName) -> Option<&Parser> {
        self.slots.iter().find(|(n, _)| *n == name).map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parser> {
        self.slots.iter().map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Build a collection from keys found in `file_path`.
fn collect_keys<I>(keys: I, file_path: &str) -> TranslationCollection
where
    I: IntoIterator<Item = String>,
{
    let mut collection = TranslationCollection::new();
    collection.add_keys(keys, file_path);
    collection
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(registry: &ParserRegistry) -> Vec<&str> {
        registry.iter().map(|p| p.name()).collect()
    }

    #[test]
    fn test_default_registry_order() {
        let registry = ParserRegistry::default();
        assert_eq!(names(&registry), vec!["pipe", "directive", "service", "marker"]);
    }

    #[test]
    fn test_registry_order_is_fixed() {
        let registry = ParserRegistry::with_parsers(&[
            ParserName::Marker,
            ParserName::Pipe,
            ParserName::Marker,
        ]);
        assert_eq!(names(&registry), vec!["pipe", "marker"]);
    }

    #[test]
    fn test_custom_marker_replaces_marker_slot() {
        let mut registry = ParserRegistry::default();
        registry.use_custom_marker("_");
        assert_eq!(names(&registry), vec!["pipe", "directive", "service", "function"]);
        assert!(matches!(
            registry.get(ParserName::Marker),
            Some(Parser::Function(f)) if f.function_name() == "_"
        ));
    }

    #[test]
    fn test_custom_marker_does_not_enable_disabled_slot() {
        let mut registry = ParserRegistry::with_parsers(&[ParserName::Pipe]);
        registry.use_custom_marker("_");
        assert_eq!(names(&registry), vec!["pipe"]);
    }

    #[test]
    fn test_dispatch_through_enum() {
        let parser: Parser = PipeParser.into();
        let keys = parser
            .extract("{{ 'A' | translate }}", "a.html")
            .unwrap();
        assert_eq!(keys.keys().collect::<Vec<_>>(), vec!["A"]);
    }
}
