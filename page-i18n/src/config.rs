//! Engine configuration
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! none at all) works. A few environment variables override the file:
//!
//! - `PAGE_I18N_ENDPOINT`: use the HTTP batch endpoint as primary provider
//! - `GOOGLE_TRANSLATE_API_KEY`: key for a `google` provider without one
//! - `PAGE_I18N_STORE_DIR`: directory of the durable store

use page_i18n_mt::{
    Gateway, GatewayConfig, GoogleTranslateProvider, HttpBatchProvider, MachineTranslator,
    MockMode, MockTranslator, MyMemoryProvider,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::dom::DenyList;
use crate::error::{EngineError, EngineResult};
use crate::language;
use crate::store::{DisabledStore, FileStore, KeyValueStore};

pub const ENV_ENDPOINT: &str = "PAGE_I18N_ENDPOINT";
pub const ENV_GOOGLE_KEY: &str = "GOOGLE_TRANSLATE_API_KEY";
pub const ENV_STORE_DIR: &str = "PAGE_I18N_STORE_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    Http {
        endpoint: String,
    },
    Google {
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
    },
    #[serde(rename = "mymemory")]
    MyMemory {
        #[serde(default)]
        base_url: Option<String>,
    },
    /// Deterministic "<text>_<lang>" translations, for demos and tests
    Mock,
}

impl ProviderConfig {
    pub fn build(&self) -> EngineResult<Arc<dyn MachineTranslator>> {
        let provider: Arc<dyn MachineTranslator> = match self {
            ProviderConfig::Http { endpoint } => Arc::new(HttpBatchProvider::new(endpoint.clone())?),
            ProviderConfig::Google { api_key, base_url } => {
                let provider = match api_key {
                    Some(key) => GoogleTranslateProvider::new(key.clone())?,
                    None => GoogleTranslateProvider::from_env()?,
                };
                match base_url {
                    Some(url) => Arc::new(provider.with_base_url(url.clone())),
                    None => Arc::new(provider),
                }
            }
            ProviderConfig::MyMemory { base_url } => {
                let provider = MyMemoryProvider::new()?;
                match base_url {
                    Some(url) => Arc::new(provider.with_base_url(url.clone())),
                    None => Arc::new(provider),
                }
            }
            ProviderConfig::Mock => Arc::new(MockTranslator::new(MockMode::Suffix)),
        };
        Ok(provider)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub source_language: String,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub settle_delay_ms: u64,
    pub deny_list: DenyList,
    pub skip_tags: Vec<String>,
    pub store_dir: Option<PathBuf>,
    pub primary: ProviderConfig,
    pub secondary: Option<ProviderConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_language: language::SOURCE_LANGUAGE.to_string(),
            batch_size: 10,
            batch_delay_ms: 150,
            settle_delay_ms: 500,
            deny_list: DenyList::new(["HOLLEMAN"]),
            skip_tags: ["script", "style", "noscript"]
                .into_iter()
                .map(String::from)
                .collect(),
            store_dir: None,
            primary: ProviderConfig::Http {
                endpoint: "http://127.0.0.1:8080/translate".to_string(),
            },
            secondary: Some(ProviderConfig::MyMemory { base_url: None }),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(endpoint) = var(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.primary = ProviderConfig::Http { endpoint };
        }
        if let Some(key) = var(ENV_GOOGLE_KEY).filter(|v| !v.trim().is_empty()) {
            for provider in std::iter::once(&mut self.primary).chain(self.secondary.as_mut()) {
                if let ProviderConfig::Google { api_key, .. } = provider {
                    api_key.get_or_insert_with(|| key.clone());
                }
            }
        }
        if let Some(dir) = var(ENV_STORE_DIR).filter(|v| !v.trim().is_empty()) {
            self.store_dir = Some(PathBuf::from(dir));
        }
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        let source = language::resolve(&self.source_language)?;
        if !source.is_source() {
            return Err(EngineError::Config(format!(
                "source_language must be '{}', got '{}'",
                language::SOURCE_LANGUAGE,
                self.source_language
            )));
        }
        if self.batch_size == 0 {
            return Err(EngineError::Config("batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            source_locale: self.source_language.clone(),
            batch_size: self.batch_size,
            batch_delay: Duration::from_millis(self.batch_delay_ms),
        }
    }

    pub fn build_gateway(&self) -> EngineResult<Gateway> {
        let mut gateway = Gateway::new(self.primary.build()?, self.gateway_config());
        if let Some(secondary) = &self.secondary {
            gateway = gateway.with_secondary(secondary.build()?);
        }
        Ok(gateway)
    }

    /// Open the durable store; if that fails, hand out a store that refuses
    /// everything so the cache runs in memory
    pub fn open_store(&self) -> Arc<dyn KeyValueStore> {
        let Some(dir) = self.store_dir.clone().or_else(FileStore::default_dir) else {
            warn!("no data directory available, translations will not persist");
            return Arc::new(DisabledStore);
        };
        match FileStore::open(&dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot open store, translations will not persist");
                Arc::new(DisabledStore)
            }
        }
    }
}
