//! Route/language binding: the surface a page layer talks to
//!
//! Event methods resolve their input and spawn the pass on the current
//! [`tokio::task::LocalSet`], the way a click handler fires and forgets. The
//! returned handle can be awaited when the caller cares about the outcome.
//! Calling them outside a `LocalSet` panics, as `spawn_local` does.

use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::TranslationCache;
use crate::config::EngineConfig;
use crate::dom::Document;
use crate::error::EngineResult;
use crate::language::{self, LANGUAGES, Language};
use crate::orchestrator::{Orchestrator, OrchestratorOptions, PassOutcome, SessionStatus};
use crate::store::KeyValueStore;

pub struct LanguageBinding<D: Document + 'static> {
    orchestrator: Rc<Orchestrator<D>>,
}

impl<D: Document + 'static> Clone for LanguageBinding<D> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Rc::clone(&self.orchestrator),
        }
    }
}

impl<D: Document + 'static> LanguageBinding<D> {
    pub fn new(orchestrator: Orchestrator<D>) -> Self {
        Self {
            orchestrator: Rc::new(orchestrator),
        }
    }

    /// Wire a document to providers and storage as described by `config`
    pub fn from_config(config: &EngineConfig, document: D) -> EngineResult<Self> {
        let gateway = config.build_gateway()?;
        let store = config.open_store();
        Ok(Self::with_store(config, document, gateway, store))
    }

    pub fn with_store(
        config: &EngineConfig,
        document: D,
        gateway: page_i18n_mt::Gateway,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let cache = TranslationCache::load(store.clone());
        Self::new(Orchestrator::new(
            document,
            gateway,
            cache,
            store,
            OrchestratorOptions::from(config),
        ))
    }

    pub fn orchestrator(&self) -> &Orchestrator<D> {
        &self.orchestrator
    }

    /// Languages for a picker, source first
    pub fn languages(&self) -> &'static [Language] {
        LANGUAGES
    }

    pub fn current_language(&self) -> &'static Language {
        language::find(&self.orchestrator.current_language())
            .unwrap_or_else(language::source_language)
    }

    pub fn is_translating(&self) -> bool {
        self.orchestrator.is_translating()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.orchestrator.subscribe()
    }

    /// Switch the page to `code`; unknown codes are rejected before any work
    pub fn select_language(&self, code: &str) -> EngineResult<JoinHandle<PassOutcome>> {
        let language = language::resolve(code)?;
        debug!(code = language.code, "language selected");
        let orchestrator = Rc::clone(&self.orchestrator);
        Ok(tokio::task::spawn_local(async move {
            orchestrator.select_language(language).await
        }))
    }

    pub fn notify_route_changed(&self, path: impl Into<String>) -> JoinHandle<PassOutcome> {
        let path = path.into();
        let orchestrator = Rc::clone(&self.orchestrator);
        tokio::task::spawn_local(async move { orchestrator.route_changed(&path).await })
    }
}

impl<D: Document + 'static> std::fmt::Debug for LanguageBinding<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageBinding")
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}
