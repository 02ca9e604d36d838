//! Transformations applied to the merged draft before it is compiled.
//!
//! Every processor sees the current draft plus the two inputs the draft was
//! built from: the freshly `extracted` keys and the `existing` catalog. The
//! chain folds left to right.

use std::cmp::Ordering;

use clap::ValueEnum;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::core::TranslationCollection;

#[enum_dispatch]
pub trait Process {
    fn name(&self) -> &str;

    fn process(
        &self,
        draft: TranslationCollection,
        extracted: &TranslationCollection,
        existing: &TranslationCollection,
    ) -> TranslationCollection;
}

#[enum_dispatch(Process)]
#[derive(Debug, Clone)]
pub enum PostProcessor {
    PurgeObsoleteKeys(PurgeObsoleteKeys),
    KeyAsDefaultValue(KeyAsDefaultValue),
    KeyAsInitialDefaultValue(KeyAsInitialDefaultValue),
    StringAsDefaultValue(StringAsDefaultValue),
    StripPrefix(StripPrefix),
    SortByKey(SortByKey),
}

/// Run the chain over `draft`.
pub fn run_chain(
    processors: &[PostProcessor],
    draft: TranslationCollection,
    extracted: &TranslationCollection,
    existing: &TranslationCollection,
) -> TranslationCollection {
    processors.iter().fold(draft, |draft, processor| {
        processor.process(draft, extracted, existing)
    })
}

/// Drop keys that no source file references any more.
#[derive(Debug, Clone, Copy, Default)]
pub struct PurgeObsoleteKeys;

impl Process for PurgeObsoleteKeys {
    fn name(&self) -> &str {
        "purge-obsolete-keys"
    }

    fn process(
        &self,
        draft: TranslationCollection,
        extracted: &TranslationCollection,
        _existing: &TranslationCollection,
    ) -> TranslationCollection {
        draft.intersect(extracted)
    }
}

/// Use the key itself as the value of every untranslated key.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyAsDefaultValue;

impl Process for KeyAsDefaultValue {
    fn name(&self) -> &str {
        "key-as-default-value"
    }

    fn process(
        &self,
        draft: TranslationCollection,
        _extracted: &TranslationCollection,
        _existing: &TranslationCollection,
    ) -> TranslationCollection {
        draft.map_entries(|key, mut entry| {
            if entry.is_untranslated() {
                entry.value = Some(key.to_string());
            }
            entry
        })
    }
}

/// Use the key as the value of keys that are new in this run.
///
/// Keys already present in the catalog keep whatever value they had, even an
/// empty one.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyAsInitialDefaultValue;

impl Process for KeyAsInitialDefaultValue {
    fn name(&self) -> &str {
        "key-as-initial-default-value"
    }

    fn process(
        &self,
        draft: TranslationCollection,
        _extracted: &TranslationCollection,
        existing: &TranslationCollection,
    ) -> TranslationCollection {
        draft.map_entries(|key, mut entry| {
            if !existing.contains(key) && entry.is_untranslated() {
                entry.value = Some(key.to_string());
            }
            entry
        })
    }
}

/// Use a fixed string as the value of every untranslated key.
#[derive(Debug, Clone)]
pub struct StringAsDefaultValue {
    value: String,
}

impl StringAsDefaultValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Process for StringAsDefaultValue {
    fn name(&self) -> &str {
        "string-as-default-value"
    }

    fn process(
        &self,
        draft: TranslationCollection,
        _extracted: &TranslationCollection,
        _existing: &TranslationCollection,
    ) -> TranslationCollection {
        draft.map_entries(|_, mut entry| {
            if entry.is_untranslated() {
                entry.value = Some(self.value.clone());
            }
            entry
        })
    }
}

/// Remove a prefix from every key.
///
/// When the stripped key collides with another one the entries are merged:
/// the first defined value wins and source files are combined.
#[derive(Debug, Clone)]
pub struct StripPrefix {
    prefix: String,
}

impl StripPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Process for StripPrefix {
    fn name(&self) -> &str {
        "strip-prefix"
    }

    fn process(
        &self,
        draft: TranslationCollection,
        _extracted: &TranslationCollection,
        _existing: &TranslationCollection,
    ) -> TranslationCollection {
        if self.prefix.is_empty() {
            return draft;
        }
        let mut result = TranslationCollection::new();
        for (key, entry) in draft {
            let key = key
                .strip_prefix(self.prefix.as_str())
                .map(String::from)
                .unwrap_or(key);
            result.merge(key, entry);
        }
        result
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortSensitivity {
    #[default]
    Sensitive,
    Insensitive,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SortByKey {
    sensitivity: SortSensitivity,
}

impl SortByKey {
    pub fn new(sensitivity: SortSensitivity) -> Self {
        Self { sensitivity }
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match self.sensitivity {
            SortSensitivity::Sensitive => a.cmp(b),
            SortSensitivity::Insensitive => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
        }
    }
}

impl Process for SortByKey {
    fn name(&self) -> &str {
        "sort-by-key"
    }

    fn process(
        &self,
        draft: TranslationCollection,
        _extracted: &TranslationCollection,
        _existing: &TranslationCollection,
    ) -> TranslationCollection {
        draft.sort_by_key(|a, b| self.compare(a, b))
    }
}
