//! DOM-transparent page translation
//!
//! Pages are authored in Romanian. When a visitor picks another language the
//! engine rewrites the visible text of the live page in place: it snapshots
//! every text-bearing element once per route, serves what it can from a
//! persistent translation cache, sends the rest through the machine
//! translation [`page_i18n_mt::Gateway`], and puts the original text back
//! when the visitor returns to Romanian.
//!
//! # Example
//!
//! ```ignore
//! use page_i18n::{EngineConfig, HtmlDocument, LanguageBinding};
//! use tokio::task::LocalSet;
//!
//! let config = EngineConfig::default().with_env_overrides();
//! let document = HtmlDocument::parse("<nav><a>Acasă</a><a>Contact</a></nav>");
//! let binding = LanguageBinding::from_config(&config, document.clone())?;
//!
//! LocalSet::new()
//!     .run_until(async {
//!         binding.notify_route_changed("/").await?;
//!         binding.select_language("en")?.await?;
//!         println!("{}", document.to_html()?);
//!         Ok::<_, Box<dyn std::error::Error>>(())
//!     })
//!     .await?;
//! ```

pub mod binding;
pub mod cache;
pub mod config;
pub mod dom;
pub mod error;
pub mod html;
pub mod language;
pub mod orchestrator;
pub mod snapshot;
pub mod store;


pub use binding::LanguageBinding;
pub use cache::TranslationCache;
pub use config::{EngineConfig, ProviderConfig};
pub use dom::{DenyList, Document, ElementId, TextElement};
pub use error::{EngineError, EngineResult};
pub use html::{HtmlDocument, HtmlElement};
pub use language::{LANGUAGES, Language, SOURCE_LANGUAGE};
pub use orchestrator::{
    Orchestrator, OrchestratorOptions, PassOutcome, PassStats, Phase, SessionStatus,
};
pub use snapshot::{Snapshot, SnapshotEntry};
pub use store::{DisabledStore, FileStore, KeyValueStore, MemoryStore, StoreError, StoreResult};
