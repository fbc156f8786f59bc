//! Translation orchestrator
//!
//! Owns the snapshot of the current route and moves the page between
//! languages:
//!
//! ```text
//! Idle(ro) ──route──▶ Snapshotting ──▶ Idle(ro) | Translating(L) ──▶ Idle(L)
//! Idle(*)  ──select ro──▶ Idle(ro)            (restore, no network)
//! Idle(*)  ──select L────▶ Translating(L) ──▶ Idle(L)
//! ```
//!
//! Every route change and every language selection starts a new pass and
//! bumps the generation counter. A pass re-checks its generation after each
//! suspension point (settle wait, batch request, inter-batch delay) and
//! stops without touching the page once a newer pass exists.
//!
//! Passes never fail. Provider failures leave the source text in place;
//! elements that left the document in the meantime are skipped.

use page_i18n_mt::{Gateway, ItemStatus};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::TranslationCache;
use crate::config::EngineConfig;
use crate::dom::{DenyList, Document};
use crate::language::{self, Language, SOURCE_LANGUAGE};
use crate::snapshot::{Snapshot, SnapshotEntry};
use crate::store::KeyValueStore;

/// Store key of the last selected language
pub const LANGUAGE_STORE_KEY: &str = "selectedLanguage";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle { language: String },
    Snapshotting,
    Translating { language: String },
}

/// What the UI layer gets to see
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub current_language: String,
    /// True only while a batch request is in flight
    pub is_translating: bool,
    pub snapshot_version: u64,
    pub generation: u64,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub entries: usize,
    pub from_cache: usize,
    pub from_gateway: usize,
    pub failed: usize,
    pub skipped_detached: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Route changed while the page is in the source language
    Captured { entries: usize },
    /// Original text written back
    Restored { entries: usize },
    Translated { language: String, stats: PassStats },
    /// Selection arrived while a route was still settling; the route pass
    /// will translate into it
    Deferred { language: String },
    /// A newer pass took over before this one finished
    Superseded { generation: u64 },
}

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub settle_delay: Duration,
    pub deny_list: DenyList,
    pub skip_tags: Vec<String>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        OrchestratorOptions::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for OrchestratorOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            settle_delay: config.settle_delay(),
            deny_list: config.deny_list.clone(),
            skip_tags: config.skip_tags.clone(),
        }
    }
}

pub struct Orchestrator<D: Document> {
    document: D,
    gateway: Gateway,
    cache: TranslationCache,
    store: Arc<dyn KeyValueStore>,
    options: OrchestratorOptions,
    snapshot: RefCell<Rc<Snapshot<D::Element>>>,
    generation: Cell<u64>,
    status: watch::Sender<SessionStatus>,
}

impl<D: Document> Orchestrator<D> {
    /// Build an orchestrator; the last selected language is read back from
    /// `store` and becomes the current language
    pub fn new(
        document: D,
        gateway: Gateway,
        cache: TranslationCache,
        store: Arc<dyn KeyValueStore>,
        options: OrchestratorOptions,
    ) -> Self {
        let language = Self::restore_language(store.as_ref());
        let (status, _) = watch::channel(SessionStatus {
            current_language: language.to_string(),
            is_translating: false,
            snapshot_version: 0,
            generation: 0,
            phase: Phase::Idle {
                language: language.to_string(),
            },
        });

        Self {
            document,
            gateway,
            cache,
            store,
            options,
            snapshot: RefCell::new(Rc::new(Snapshot::empty(0))),
            generation: Cell::new(0),
            status,
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn snapshot(&self) -> Rc<Snapshot<D::Element>> {
        self.snapshot.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub fn current_language(&self) -> String {
        self.status.borrow().current_language.clone()
    }

    pub fn is_translating(&self) -> bool {
        self.status.borrow().is_translating
    }

    /// The page now shows a different route: discard the snapshot, wait for
    /// the page to settle, capture again and re-apply the current language
    pub async fn route_changed(&self, path: &str) -> PassOutcome {
        let generation = self.begin_pass();
        debug!(path, generation, "route changed");

        // Give still-attached elements their source text back so a page
        // that was not re-rendered is never captured in translation
        let previous = self.snapshot.replace(Rc::new(Snapshot::empty(0)));
        for entry in previous.entries() {
            if self.document.contains(entry.element()) {
                entry.restore();
            }
        }

        self.status.send_modify(|s| {
            s.phase = Phase::Snapshotting;
            s.is_translating = false;
        });

        if !self.options.settle_delay.is_zero() {
            tokio::time::sleep(self.options.settle_delay).await;
        }
        if self.is_stale(generation) {
            return PassOutcome::Superseded { generation };
        }

        let version = self.status.borrow().snapshot_version + 1;
        let snapshot = Rc::new(Snapshot::capture(
            &self.document,
            &self.options.deny_list,
            &self.options.skip_tags,
            version,
        ));
        self.snapshot.replace(snapshot.clone());
        self.status.send_modify(|s| s.snapshot_version = version);

        let language = self.current_language();
        if language == SOURCE_LANGUAGE {
            self.finish(&language);
            info!(path, entries = snapshot.len(), "captured page in source language");
            return PassOutcome::Captured {
                entries: snapshot.len(),
            };
        }

        self.status.send_modify(|s| {
            s.phase = Phase::Translating {
                language: language.clone(),
            }
        });
        self.translate_pass(generation, &snapshot, &language).await
    }

    /// The user picked a language
    pub async fn select_language(&self, language: &Language) -> PassOutcome {
        let code = language.code.to_string();
        self.persist_language(&code);

        if self.status.borrow().phase == Phase::Snapshotting {
            debug!(language = %code, "route still settling, deferring selection");
            self.status
                .send_modify(|s| s.current_language = code.clone());
            return PassOutcome::Deferred { language: code };
        }

        let generation = self.begin_pass();
        let snapshot = self.snapshot();

        if language.is_source() {
            for entry in snapshot.entries() {
                if self.document.contains(entry.element()) {
                    entry.restore();
                }
            }
            self.finish(&code);
            info!(generation, entries = snapshot.len(), "restored source text");
            return PassOutcome::Restored {
                entries: snapshot.len(),
            };
        }

        self.status.send_modify(|s| {
            s.current_language = code.clone();
            s.phase = Phase::Translating {
                language: code.clone(),
            };
        });
        self.translate_pass(generation, &snapshot, &code).await
    }

    async fn translate_pass(
        &self,
        generation: u64,
        snapshot: &Snapshot<D::Element>,
        language: &str,
    ) -> PassOutcome {
        let entries = snapshot.entries();
        let mut stats = PassStats {
            entries: entries.len(),
            ..PassStats::default()
        };

        // Cached entries show up at once; the rest fall back to the source
        // text until their batch arrives, so nothing keeps showing another
        // language
        let mut pending: Vec<String> = Vec::new();
        let mut waiting: HashMap<&str, Vec<&SnapshotEntry<D::Element>>> = HashMap::new();
        for entry in entries {
            match self.cache.lookup(entry.source(), language) {
                Some(translated) => {
                    if self.write(entry, Some(&translated), &mut stats) {
                        stats.from_cache += 1;
                    }
                }
                None => {
                    self.write(entry, None, &mut stats);
                    let slot = waiting.entry(entry.source()).or_insert_with(|| {
                        pending.push(entry.source().to_string());
                        Vec::new()
                    });
                    slot.push(entry);
                }
            }
        }

        debug!(
            generation,
            language,
            cached = stats.from_cache,
            pending = pending.len(),
            "starting translation pass"
        );

        for (index, chunk) in pending.chunks(self.gateway.batch_size()).enumerate() {
            if index > 0 && !self.gateway.batch_delay().is_zero() {
                tokio::time::sleep(self.gateway.batch_delay()).await;
                if self.is_stale(generation) {
                    return PassOutcome::Superseded { generation };
                }
            }

            self.status.send_modify(|s| s.is_translating = true);
            let items = self.gateway.translate_chunk(chunk, language).await;

            // The translations are valid whoever asked for them
            self.cache.store_many(
                chunk
                    .iter()
                    .zip(&items)
                    .filter(|(_, item)| item.is_cacheable())
                    .map(|(source, item)| (source.as_str(), item.text.as_str())),
                language,
            );

            if self.is_stale(generation) {
                debug!(generation, language, "dropping results of superseded pass");
                return PassOutcome::Superseded { generation };
            }
            self.status.send_modify(|s| s.is_translating = false);

            for (source, item) in chunk.iter().zip(items) {
                let targets = waiting.get(source.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                if item.status == ItemStatus::Failed {
                    stats.failed += targets.len();
                    continue;
                }
                for entry in targets {
                    if self.write(entry, Some(&item.text), &mut stats) {
                        stats.from_gateway += 1;
                    }
                }
            }
        }

        self.finish(language);
        if stats.failed > 0 {
            warn!(language, failed = stats.failed, "some texts stay untranslated");
        }
        info!(
            generation,
            language,
            entries = stats.entries,
            from_cache = stats.from_cache,
            from_gateway = stats.from_gateway,
            "translation pass complete"
        );
        PassOutcome::Translated {
            language: language.to_string(),
            stats,
        }
    }

    /// Show `translated` (or the original when `None`) if the element is
    /// still on the page
    fn write(
        &self,
        entry: &SnapshotEntry<D::Element>,
        translated: Option<&str>,
        stats: &mut PassStats,
    ) -> bool {
        if !self.document.contains(entry.element()) {
            stats.skipped_detached += 1;
            return false;
        }
        match translated {
            Some(text) => entry.apply(text),
            None => entry.restore(),
        }
        true
    }

    fn begin_pass(&self) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.status.send_modify(|s| s.generation = generation);
        generation
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.get() != generation
    }

    fn finish(&self, language: &str) {
        self.status.send_modify(|s| {
            s.current_language = language.to_string();
            s.is_translating = false;
            s.phase = Phase::Idle {
                language: language.to_string(),
            };
        });
    }

    /// Last selected language from `store`, or the source language when
    /// nothing usable is stored
    pub fn restore_language(store: &dyn KeyValueStore) -> &'static str {
        match store.get(LANGUAGE_STORE_KEY) {
            Ok(Some(code)) => match language::find(code.trim()) {
                Some(lang) => lang.code,
                None => {
                    warn!(code = %code, "ignoring unknown stored language");
                    SOURCE_LANGUAGE
                }
            },
            Ok(None) => SOURCE_LANGUAGE,
            Err(e) => {
                warn!(error = %e, "cannot read selected language");
                SOURCE_LANGUAGE
            }
        }
    }

    fn persist_language(&self, code: &str) {
        if let Err(e) = self.store.set(LANGUAGE_STORE_KEY, code) {
            warn!(store = self.store.name(), error = %e, "cannot persist selected language");
        }
    }
}

impl<D: Document> std::fmt::Debug for Orchestrator<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("status", &self.status())
            .field("snapshot_entries", &self.snapshot.borrow().len())
            .field("gateway", &self.gateway)
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::HtmlDocument;
    use crate::language::find;
    use crate::store::{DisabledStore, MemoryStore};
    use page_i18n_mt::{GatewayConfig, MockMode, MockTranslator};

    fn options() -> OrchestratorOptions {
        OrchestratorOptions {
            settle_delay: Duration::ZERO,
            deny_list: DenyList::new(["HOLLEMAN"]),
            skip_tags: vec!["script".to_string(), "style".to_string()],
        }
    }

    fn build(
        html: &str,
        store: Arc<dyn KeyValueStore>,
        mock: &MockTranslator,
    ) -> Orchestrator<HtmlDocument> {
        let gateway = Gateway::new(
            Arc::new(mock.clone()),
            GatewayConfig {
                batch_delay: Duration::ZERO,
                ..GatewayConfig::default()
            },
        );
        let cache = TranslationCache::load(store.clone());
        Orchestrator::new(HtmlDocument::parse(html), gateway, cache, store, options())
    }

    #[tokio::test]
    async fn test_initial_status() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let orchestrator = build("<p>Acasă</p>", Arc::new(MemoryStore::new()), &mock);
        let status = orchestrator.status();
        assert_eq!(status.current_language, "ro");
        assert!(!status.is_translating);
        assert_eq!(
            status.phase,
            Phase::Idle {
                language: "ro".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_route_change_in_source_language_only_captures() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let orchestrator = build("<p>Acasă</p><p>Servicii</p>", Arc::new(MemoryStore::new()), &mock);
        let outcome = orchestrator.route_changed("/").await;
        assert_eq!(outcome, PassOutcome::Captured { entries: 2 });
        assert_eq!(orchestrator.status().snapshot_version, 1);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stored_language_is_restored_and_applied_on_route() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(LANGUAGE_STORE_KEY, "de").unwrap();
        let mock = MockTranslator::new(MockMode::Suffix);
        let orchestrator = build("<p id='p'>Acasă</p>", store, &mock);
        assert_eq!(orchestrator.current_language(), "de");

        orchestrator.route_changed("/").await;
        let p = orchestrator.document().element_by_id("p").unwrap();
        assert_eq!(p.direct_text(), "Acasă_de");
    }

    #[tokio::test]
    async fn test_unknown_stored_language_falls_back_to_source() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(LANGUAGE_STORE_KEY, "tlh").unwrap();
        let mock = MockTranslator::new(MockMode::Suffix);
        assert_eq!(build("<p>x</p>", store, &mock).current_language(), "ro");
    }

    #[tokio::test]
    async fn test_selection_is_persisted() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mock = MockTranslator::new(MockMode::Suffix);
        let orchestrator = build("<p>Acasă</p>", store.clone(), &mock);
        orchestrator.route_changed("/").await;
        orchestrator.select_language(find("en").unwrap()).await;
        assert_eq!(store.get(LANGUAGE_STORE_KEY).unwrap().as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_works_without_storage() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let orchestrator = build("<p id='p'>Acasă</p>", Arc::new(DisabledStore), &mock);
        orchestrator.route_changed("/").await;
        let outcome = orchestrator.select_language(find("it").unwrap()).await;
        assert!(matches!(outcome, PassOutcome::Translated { .. }));
        assert!(orchestrator.cache().is_degraded());
        assert_eq!(
            orchestrator.document().element_by_id("p").unwrap().direct_text(),
            "Acasă_it"
        );
    }

    #[tokio::test]
    async fn test_duplicate_texts_are_requested_once() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let orchestrator = build(
            "<a>Contact</a><h1>Contact</h1><p>Acasă</p>",
            Arc::new(MemoryStore::new()),
            &mock,
        );
        orchestrator.route_changed("/").await;
        let outcome = orchestrator.select_language(find("en").unwrap()).await;
        assert_eq!(mock.requested_texts(), vec!["Contact", "Acasă"]);
        match outcome {
            PassOutcome::Translated { stats, .. } => {
                assert_eq!(stats.entries, 3);
                assert_eq!(stats.from_gateway, 3);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detached_element_is_skipped() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let orchestrator = build(
            "<p id='a'>Acasă</p><p id='b'>Servicii</p>",
            Arc::new(MemoryStore::new()),
            &mock,
        );
        orchestrator.route_changed("/").await;
        let b = orchestrator.document().element_by_id("b").unwrap();
        orchestrator.document().remove(&b);

        match orchestrator.select_language(find("fr").unwrap()).await {
            PassOutcome::Translated { stats, .. } => {
                assert_eq!(stats.skipped_detached, 2);
                assert_eq!(stats.from_gateway, 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(b.direct_text(), "Servicii");
    }

    #[tokio::test]
    async fn test_selection_while_settling_is_deferred() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let gateway = Gateway::new(Arc::new(mock.clone()), GatewayConfig::default());
        let orchestrator = Orchestrator::new(
            HtmlDocument::parse("<p id='p'>Acasă</p>"),
            gateway,
            TranslationCache::load(store.clone()),
            store,
            OrchestratorOptions {
                settle_delay: Duration::from_millis(50),
                ..options()
            },
        );

        let (route, selection) = tokio::join!(orchestrator.route_changed("/"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            orchestrator.select_language(find("en").unwrap()).await
        });

        assert_eq!(
            selection,
            PassOutcome::Deferred {
                language: "en".to_string()
            }
        );
        assert!(matches!(route, PassOutcome::Translated { ref language, .. } if language == "en"));
        assert_eq!(
            orchestrator.document().element_by_id("p").unwrap().direct_text(),
            "Acasă_en"
        );
    }
}
