//! Extraction cache.
//!
//! The orchestrator only talks to [`Cache`]; [`NullCache`] turns caching off
//! without changing anything else. [`FileCache`] keeps entries in a JSON file
//! between runs.

use std::{
    collections::HashMap,
    fs, io,
    io::Write,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::core::error::ExtractError;

const CACHE_VERSION: u32 = 1;

pub trait Cache<T>: Send {
    fn get(&mut self, key: &str) -> Option<T>;

    fn set(&mut self, key: &str, value: T);

    /// Write the cache to durable storage. Called once, after a successful run.
    fn persist(&mut self) -> Result<(), ExtractError>;

    /// Whether lookups can ever hit. Callers use it to skip computing keys.
    fn enabled(&self) -> bool {
        true
    }
}

/// A cache that never hits and never writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl<T> Cache<T> for NullCache {
    fn get(&mut self, _key: &str) -> Option<T> {
        None
    }

    fn set(&mut self, _key: &str, _value: T) {}

    fn persist(&mut self) -> Result<(), ExtractError> {
        Ok(())
    }

    fn enabled(&self) -> bool {
        false
    }
}

#[derive(Serialize, Deserialize)]
struct CacheFile<T> {
    version: u32,
    entries: IndexMap<String, T>,
}

/// JSON-file cache.
///
/// Entries read at open time are only carried over when they are looked up
/// during the run, so keys of deleted or changed files disappear on `persist`.
#[derive(Debug)]
pub struct FileCache<T> {
    path: PathBuf,
    previous: HashMap<String, T>,
    current: IndexMap<String, T>,
}

impl<T> FileCache<T>
where
    T: Serialize + DeserializeOwned + Clone + Send,
{
    /// Open the cache at `path`. A missing, corrupt or outdated file gives an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ExtractError> {
        let path = path.into();
        let previous = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CacheFile<T>>(&content) {
                Ok(file) if file.version == CACHE_VERSION => file.entries.into_iter().collect(),
                _ => HashMap::new(),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(ExtractError::Cache { path, source }),
        };
        Ok(Self {
            path,
            previous,
            current: IndexMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let file = CacheFile {
            version: CACHE_VERSION,
            entries: self.current.clone(),
        };
        let json = serde_json::to_string(&file)?;

        // Write next to the target and rename, so a crash never leaves a partial file.
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl<T> Cache<T> for FileCache<T>
where
    T: Serialize + DeserializeOwned + Clone + Send,
{
    fn get(&mut self, key: &str) -> Option<T> {
        if let Some(value) = self.current.get(key) {
            return Some(value.clone());
        }
        let value = self.previous.remove(key)?;
        self.current.insert(key.to_string(), value.clone());
        Some(value)
    }

    fn set(&mut self, key: &str, value: T) {
        self.current.insert(key.to_string(), value);
    }

    fn persist(&mut self) -> Result<(), ExtractError> {
        self.write().map_err(|source| ExtractError::Cache {
            path: self.path.clone(),
            source,
        })
    }
}

/// Cache key of a file: its path and a digest of its content and of the
/// parser configuration it was extracted with.
pub fn cache_key(file_path: &str, content: &str, configuration: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(configuration.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    format!("{file_path}:{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_null_cache_never_hits() {
        let mut cache = NullCache;
        Cache::<String>::set(&mut cache, "k", "v".to_string());
        assert_eq!(Cache::<String>::get(&mut cache, "k"), None);
        assert!(!Cache::<String>::enabled(&cache));
        assert!(Cache::<String>::persist(&mut cache).is_ok());
    }

    #[test]
    fn test_file_cache_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/cache.json");

        let mut cache = FileCache::<Vec<String>>::open(&path).unwrap();
        assert_eq!(cache.get("a"), None);
        cache.set("a", vec!["A".to_string()]);
        cache.persist().unwrap();

        let mut reopened = FileCache::<Vec<String>>::open(&path).unwrap();
        assert_eq!(reopened.get("a"), Some(vec!["A".to_string()]));
    }

    #[test]
    fn test_untouched_entries_are_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = FileCache::<u32>::open(&path).unwrap();
        cache.set("kept", 1);
        cache.set("stale", 2);
        cache.persist().unwrap();

        let mut second = FileCache::<u32>::open(&path).unwrap();
        assert_eq!(second.get("kept"), Some(1));
        second.persist().unwrap();

        let mut third = FileCache::<u32>::open(&path).unwrap();
        assert_eq!(third.get("kept"), Some(1));
        assert_eq!(third.get("stale"), None);
    }

    #[test]
    fn test_corrupt_or_outdated_file_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");

        fs::write(&path, "{ not json").unwrap();
        let mut cache = FileCache::<u32>::open(&path).unwrap();
        assert_eq!(cache.get("a"), None);

        fs::write(&path, r#"{"version": 0, "entries": {"a": 1}}"#).unwrap();
        let mut cache = FileCache::<u32>::open(&path).unwrap();
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_nothing_written_without_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let mut cache = FileCache::<u32>::open(&path).unwrap();
        cache.set("a", 1);
        drop(cache);
        assert!(!path.exists());
    }

    #[test]
    fn test_cache_key_depends_on_content_and_configuration() {
        let a = cache_key("src/a.ts", "content", "pipe,marker");
        assert!(a.starts_with("src/a.ts:"));
        assert_eq!(a.len(), "src/a.ts:".len() + 64);
        assert_eq!(a, cache_key("src/a.ts", "content", "pipe,marker"));
        assert_ne!(a, cache_key("src/a.ts", "changed", "pipe,marker"));
        assert_ne!(a, cache_key("src/a.ts", "content", "pipe"));
    }
}
