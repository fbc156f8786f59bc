//! Durable string-keyed storage
//!
//! The engine keeps two values here: the translation cache blob and the last
//! selected language. Backends behave like browser local storage: small,
//! synchronous, and allowed to refuse writes (quota, disabled storage).

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Process-local store, optionally with a byte quota over all values
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            values: RwLock::default(),
            quota: Some(quota),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(limit) = self.quota {
            let others: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded { needed, limit });
            }
        }
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Storage that refuses everything, like a browser with storage disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStore;

impl KeyValueStore for DisabledStore {
    fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Unavailable("storage is disabled".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("storage is disabled".to_string()))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// One file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    const EXTENSION: &'static str = "json";

    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, quota: None })
    }

    /// Limit the total size of all stored files
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Default location under the user's data directory
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join("page-i18n"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", key, Self::EXTENSION)))
    }

    fn used_bytes_except(&self, skip: &Path) -> StoreResult<usize> {
        let mut total = 0usize;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == skip || path.extension().and_then(|e| e.to_str()) != Some(Self::EXTENSION)
            {
                continue;
            }
            total += entry.metadata()?.len() as usize;
        }
        Ok(total)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        if let Some(limit) = self.quota {
            let needed = self.used_bytes_except(&path)? + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded { needed, limit });
            }
        }

        // Write to a sibling and rename so readers never see half a blob
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("selectedLanguage").unwrap(), None);
        store.set("selectedLanguage", "en").unwrap();
        assert_eq!(store.get("selectedLanguage").unwrap().as_deref(), Some("en"));
        store.set("selectedLanguage", "de").unwrap();
        assert_eq!(store.get("selectedLanguage").unwrap().as_deref(), Some("de"));
    }

    #[test]
    fn test_memory_store_quota() {
        let store = MemoryStore::with_quota(16);
        store.set("k", "0123456789").unwrap();
        // Overwriting the same key only counts the new value
        store.set("k", "abcdefghij").unwrap();
        assert!(matches!(
            store.set("other", "0123456789"),
            Err(StoreError::QuotaExceeded { limit: 16, .. })
        ));
    }

    #[test]
    fn test_disabled_store() {
        assert!(DisabledStore.get("x").is_err());
        assert!(matches!(
            DisabledStore.set("x", "y"),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("translationCache", r#"{"acasă":{"en":"Home"}}"#).unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("translationCache").unwrap().as_deref(),
            Some(r#"{"acasă":{"en":"Home"}}"#)
        );
        assert_eq!(reopened.get("selectedLanguage").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_file_store_quota() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap().with_quota(10);
        store.set("a", "12345").unwrap();
        store.set("a", "1234567890").unwrap();
        assert!(matches!(
            store.set("b", "1"),
            Err(StoreError::QuotaExceeded { needed: 11, limit: 10 })
        ));
        // The refused write leaves nothing behind
        assert_eq!(store.get("b").unwrap(), None);
    }
}
