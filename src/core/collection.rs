//! Translation collection: the data model shared by parsers, post-processors and compilers.
//!
//! A collection maps a translation key (the literal extracted string) to a
//! [`TranslationEntry`]. Keys are exact-match, and the empty key is never stored:
//! every constructor and mutator filters it out.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw key map, as produced by a single parser for a single file.
pub type TranslationMap = IndexMap<String, TranslationEntry>;

/// Everything known about one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationEntry {
    /// Current translated text. `None` if the key was never translated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Files referencing this key, without duplicates.
    #[serde(default)]
    pub source_files: Vec<String>,
}

impl TranslationEntry {
    pub fn new(value: Option<String>) -> Self {
        Self {
            value,
            source_files: Vec::new(),
        }
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self::new(Some(value.into()))
    }

    pub fn with_source(source_file: impl Into<String>) -> Self {
        Self {
            value: None,
            source_files: vec![source_file.into()],
        }
    }

    /// An entry is untranslated when its value is absent or empty.
    pub fn is_untranslated(&self) -> bool {
        self.value.as_deref().is_none_or(str::is_empty)
    }

    /// Append a source file unless it is already recorded.
    pub fn add_source_file(&mut self, source_file: &str) {
        if !self.source_files.iter().any(|f| f == source_file) {
            self.source_files.push(source_file.to_string());
        }
    }

    fn absorb(&mut self, other: TranslationEntry) {
        if self.value.is_none() {
            self.value = other.value;
        }
        for file in &other.source_files {
            self.add_source_file(file);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationCollection {
    values: TranslationMap,
}

impl TranslationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from a raw map, dropping the empty key.
    pub fn from_map(mut values: TranslationMap) -> Self {
        values.shift_remove("");
        Self { values }
    }

    /// Aggregate per-parser, per-file partial maps into one collection.
    ///
    /// Maps are folded in the given order. A key found by several parsers or in
    /// several files keeps the first defined value and the union of all source
    /// files. Source files are sorted so that aggregation order never shows up
    /// in the output.
    pub fn from_partials<I>(partials: I) -> Self
    where
        I: IntoIterator<Item = TranslationMap>,
    {
        let mut collection = Self::new();
        for partial in partials {
            for (key, entry) in partial {
                collection.merge(key, entry);
            }
        }
        for entry in collection.values.values_mut() {
            entry.source_files.sort();
        }
        collection
    }

    /// Insert or replace an entry.
    pub fn add(&mut self, key: impl Into<String>, entry: TranslationEntry) {
        let key = key.into();
        if key.is_empty() {
            return;
        }
        self.values.insert(key, entry);
    }

    /// Record that `key` was found in `source_file`, creating the entry if needed.
    pub fn add_key(&mut self, key: impl Into<String>, source_file: &str) {
        self.merge(key.into(), TranslationEntry::with_source(source_file));
    }

    pub fn add_keys<I, S>(&mut self, keys: I, source_file: &str)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            self.add_key(key, source_file);
        }
    }

    /// Insert an entry, or fold it into the existing one: the first defined value
    /// is kept and source files are combined.
    pub fn merge(&mut self, key: String, entry: TranslationEntry) {
        if key.is_empty() {
            return;
        }
        match self.values.get_mut(&key) {
            Some(existing) => existing.absorb(entry),
            None => {
                self.values.insert(key, entry);
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<TranslationEntry> {
        self.values.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&TranslationEntry> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TranslationEntry)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> &TranslationMap {
        &self.values
    }

    pub fn into_map(self) -> TranslationMap {
        self.values
    }

    /// Keys of both collections.
    ///
    /// For a key present in both, the receiver's value wins when defined and its
    /// source files win when non-empty. Extraction output is the receiver and the
    /// existing catalog is `other`: fresh locations replace stale ones, while a
    /// human translation on disk is kept.
    pub fn union(&self, other: &TranslationCollection) -> TranslationCollection {
        let mut values = self.values.clone();
        for (key, theirs) in &other.values {
            match values.get_mut(key) {
                Some(ours) => {
                    if ours.value.is_none() {
                        ours.value.clone_from(&theirs.value);
                    }
                    if ours.source_files.is_empty() {
                        ours.source_files.clone_from(&theirs.source_files);
                    }
                }
                None => {
                    values.insert(key.clone(), theirs.clone());
                }
            }
        }
        Self { values }
    }

    /// Keys of the receiver that are also in `other`, with the receiver's entries.
    pub fn intersect(&self, other: &TranslationCollection) -> TranslationCollection {
        self.filter(|key, _| other.contains(key))
    }

    /// Keys of the receiver that are absent from `other`.
    pub fn subtract(&self, other: &TranslationCollection) -> TranslationCollection {
        self.filter(|key, _| !other.contains(key))
    }

    pub fn filter<F>(&self, mut predicate: F) -> TranslationCollection
    where
        F: FnMut(&str, &TranslationEntry) -> bool,
    {
        self.values
            .iter()
            .filter(|(k, v)| predicate(k, v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Rewrite every entry, keeping keys and order.
    pub fn map_entries<F>(self, mut f: F) -> TranslationCollection
    where
        F: FnMut(&str, TranslationEntry) -> TranslationEntry,
    {
        self.values
            .into_iter()
            .map(|(k, v)| {
                let entry = f(&k, v);
                (k, entry)
            })
            .collect()
    }

    pub fn sort_by_key<F>(mut self, mut compare: F) -> TranslationCollection
    where
        F: FnMut(&str, &str) -> Ordering,
    {
        self.values.sort_by(|a, _, b, _| compare(a, b));
        self
    }
}

impl FromIterator<(String, TranslationEntry)> for TranslationCollection {
    fn from_iter<T: IntoIterator<Item = (String, TranslationEntry)>>(iter: T) -> Self {
        let mut collection = Self::new();
        for (key, entry) in iter {
            collection.add(key, entry);
        }
        collection
    }
}

impl IntoIterator for TranslationCollection {
    type Item = (String, TranslationEntry);
    type IntoIter = indexmap::map::IntoIter<String, TranslationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
