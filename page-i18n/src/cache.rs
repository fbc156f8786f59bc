//! Translation cache
//!
//! Maps `lowercase(trim(source))` → target language → translated text. The
//! whole map is written through to a [`KeyValueStore`] as one JSON blob on
//! every insert and read back at startup, so translations survive reloads.
//!
//! The cache never fails. If the store refuses a write (quota exceeded,
//! storage disabled) the cache logs once, stops persisting, and keeps
//! working in memory for the rest of the session.
//!
//! Keys collapse case and surrounding whitespace, so "Contact" and
//! "CONTACT " share one entry even where a provider would translate them
//! differently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::store::KeyValueStore;

/// Store key of the serialized cache
pub const CACHE_STORE_KEY: &str = "translationCache";

type Records = HashMap<String, HashMap<String, String>>;

pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Clone)]
pub struct TranslationCache {
    records: Arc<RwLock<Records>>,
    store: Arc<dyn KeyValueStore>,
    degraded: Arc<AtomicBool>,
}

impl TranslationCache {
    /// Load the cache from `store`, starting empty if nothing usable is there
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mut degraded = false;
        let records = match store.get(CACHE_STORE_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<Records>(&blob) {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "ignoring malformed translation cache");
                    Records::new()
                }
            },
            Ok(None) => Records::new(),
            Err(e) => {
                warn!(store = store.name(), error = %e, "translation cache storage unavailable, using memory only");
                degraded = true;
                Records::new()
            }
        };

        debug!(entries = records.len(), store = store.name(), "loaded translation cache");
        Self {
            records: Arc::new(RwLock::new(records)),
            store,
            degraded: Arc::new(AtomicBool::new(degraded)),
        }
    }

    pub fn lookup(&self, text: &str, target: &str) -> Option<String> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(&normalize_key(text))
            .and_then(|by_lang| by_lang.get(target))
            .cloned()
    }

    pub fn store(&self, text: &str, target: &str, translated: &str) {
        self.store_many(std::iter::once((text, translated)), target);
    }

    /// Insert several translations for one target and persist once
    pub fn store_many<'a, I>(&self, pairs: I, target: &str)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let blob = {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            let mut inserted = false;
            for (text, translated) in pairs {
                let key = normalize_key(text);
                if key.is_empty() {
                    continue;
                }
                records
                    .entry(key)
                    .or_default()
                    .insert(target.to_string(), translated.to_string());
                inserted = true;
            }
            if !inserted || self.is_degraded() {
                return;
            }
            serde_json::to_string(&*records)
        };

        match blob {
            Ok(blob) => self.persist(&blob),
            Err(e) => warn!(error = %e, "failed to serialize translation cache"),
        }
    }

    fn persist(&self, blob: &str) {
        if let Err(e) = self.store.set(CACHE_STORE_KEY, blob) {
            if !self.degraded.swap(true, Ordering::Relaxed) {
                warn!(
                    store = self.store.name(),
                    error = %e,
                    "cannot persist translation cache, continuing in memory"
                );
            }
        }
    }

    /// Whether writes have stopped reaching durable storage
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Number of distinct normalized source texts
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every record, for inspection and tests
    pub fn records(&self) -> HashMap<String, HashMap<String, String>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("entries", &self.len())
            .field("store", &self.store.name())
            .field("degraded", &self.is_degraded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DisabledStore, FileStore, MemoryStore};

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Acasă \n"), "acasă");
        assert_eq!(normalize_key("CONTACT"), "contact");
    }

    #[test]
    fn test_store_then_lookup_normalized() {
        let cache = TranslationCache::load(Arc::new(MemoryStore::new()));
        cache.store("Acasă", "en", "Home");
        assert_eq!(cache.lookup("Acasă", "en").as_deref(), Some("Home"));
        assert_eq!(cache.lookup("  ACASĂ ", "en").as_deref(), Some("Home"));
        assert_eq!(cache.lookup("Acasă", "de"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_write_through_and_reload() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let cache = TranslationCache::load(store.clone());
        cache.store("Acasă", "en", "Home");
        cache.store("Acasă", "de", "Startseite");

        let blob = store.get(CACHE_STORE_KEY).unwrap().unwrap();
        let parsed: Records = serde_json::from_str(&blob).unwrap();
        assert_eq!(parsed["acasă"]["de"], "Startseite");

        let reloaded = TranslationCache::load(store);
        assert_eq!(reloaded.lookup("acasă", "en").as_deref(), Some("Home"));
    }

    #[test]
    fn test_survives_process_restart_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = Arc::new(FileStore::open(dir.path()).unwrap());
            TranslationCache::load(store).store("Contact", "en", "Contact");
        }
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let cache = TranslationCache::load(store);
        assert_eq!(cache.lookup("contact", "en").as_deref(), Some("Contact"));
    }

    #[test]
    fn test_malformed_blob_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(CACHE_STORE_KEY, "{not json").unwrap();
        let cache = TranslationCache::load(store);
        assert!(cache.is_empty());
        assert!(!cache.is_degraded());
    }

    #[test]
    fn test_disabled_storage_degrades_to_memory() {
        let cache = TranslationCache::load(Arc::new(DisabledStore));
        assert!(cache.is_degraded());
        cache.store("Servicii", "en", "Services");
        assert_eq!(cache.lookup("Servicii", "en").as_deref(), Some("Services"));
    }

    #[test]
    fn test_quota_exceeded_degrades_but_keeps_entries() {
        let store = Arc::new(MemoryStore::with_quota(64));
        let cache = TranslationCache::load(store.clone());
        cache.store("Acasă", "en", "Home");
        assert!(!cache.is_degraded());

        let long = "x".repeat(100);
        cache.store("Despre noi", "en", &long);
        assert!(cache.is_degraded());
        assert_eq!(cache.lookup("Despre noi", "en").as_deref(), Some(long.as_str()));

        // The last blob that fit is still what's on disk
        let persisted = store.get(CACHE_STORE_KEY).unwrap().unwrap();
        assert!(!persisted.contains("despre noi"));
    }

    #[test]
    fn test_store_many_persists_once() {
        let cache = TranslationCache::load(Arc::new(MemoryStore::new()));
        cache.store_many([("Acasă", "Home"), ("Contact", "Contact"), ("  ", "ignored")], "en");
        assert_eq!(cache.len(), 2);
        let records = cache.records();
        assert_eq!(records["contact"]["en"], "Contact");
    }

    #[test]
    fn test_idempotent_rewrite() {
        let cache = TranslationCache::load(Arc::new(MemoryStore::new()));
        cache.store("Acasă", "en", "Home");
        cache.store("acasă ", "en", "Home");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("ACASĂ", "en").as_deref(), Some("Home"));
    }
}
