//! Translation provider gateway
//!
//! Chains a primary and an optional secondary [`MachineTranslator`] behind a
//! fail-open contract: whatever happens, every input string comes back, in
//! order, either translated or unchanged. Provider errors are logged and
//! never returned.
//!
//! A string goes to the secondary provider when the primary errors on it or
//! echoes it back unchanged (the primary cannot tell "nothing to translate"
//! apart from a silent failure). There are no retries beyond that.
//!
//! Large inputs are split into chunks of `batch_size`; consecutive chunks are
//! separated by `batch_delay` so the backend is not flooded.

use crate::translator::{MachineTranslator, normalize_locale};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of one string passing through the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    /// A provider produced a different string
    Translated { provider: String },
    /// Providers answered, but with the input itself
    Identical,
    /// No provider produced an answer; the text is the untouched input
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayItem {
    pub text: String,
    pub status: ItemStatus,
}

impl GatewayItem {
    fn unchanged(text: &str, status: ItemStatus) -> Self {
        Self {
            text: text.to_string(),
            status,
        }
    }

    /// Whether this answer may be remembered; failures must be retried later
    pub fn is_cacheable(&self) -> bool {
        !matches!(self.status, ItemStatus::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub source_locale: String,
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            source_locale: "ro".to_string(),
            batch_size: 10,
            batch_delay: Duration::from_millis(150),
        }
    }
}

#[derive(Clone)]
pub struct Gateway {
    primary: Arc<dyn MachineTranslator>,
    secondary: Option<Arc<dyn MachineTranslator>>,
    config: GatewayConfig,
}

/// Per-string state between the primary and the secondary attempt
enum Pending {
    Done(GatewayItem),
    Fallback { echoed: bool },
}

impl Gateway {
    pub fn new(primary: Arc<dyn MachineTranslator>, config: GatewayConfig) -> Self {
        Self {
            primary,
            secondary: None,
            config,
        }
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn MachineTranslator>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.config.batch_size.max(1)
    }

    pub fn batch_delay(&self) -> Duration {
        self.config.batch_delay
    }

    pub fn source_locale(&self) -> &str {
        &self.config.source_locale
    }

    /// Names of the configured providers, primary first
    pub fn provider_names(&self) -> Vec<String> {
        std::iter::once(&self.primary)
            .chain(self.secondary.as_ref())
            .map(|p| p.provider_name().to_string())
            .collect()
    }

    /// Translate every text, same length and order as the input
    pub async fn translate_batch(&self, texts: &[String], target_locale: &str) -> Vec<String> {
        self.translate_batch_detailed(texts, target_locale)
            .await
            .into_iter()
            .map(|item| item.text)
            .collect()
    }

    /// Like [`Gateway::translate_batch`], keeping the per-string status
    pub async fn translate_batch_detailed(
        &self,
        texts: &[String],
        target_locale: &str,
    ) -> Vec<GatewayItem> {
        let mut items = Vec::with_capacity(texts.len());
        for (index, chunk) in texts.chunks(self.batch_size()).enumerate() {
            if index > 0 && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
            items.extend(self.translate_chunk(chunk, target_locale).await);
        }
        items
    }

    /// Translate a single chunk: one primary request, then one secondary
    /// request for whatever the primary did not translate
    pub async fn translate_chunk(&self, texts: &[String], target_locale: &str) -> Vec<GatewayItem> {
        if texts.is_empty() {
            return Vec::new();
        }
        if normalize_locale(target_locale) == normalize_locale(&self.config.source_locale) {
            return texts
                .iter()
                .map(|t| GatewayItem::unchanged(t, ItemStatus::Identical))
                .collect();
        }

        let mut pending = self
            .attempt(self.primary.as_ref(), texts, target_locale)
            .await;

        let fallback: Vec<usize> = pending
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(p, Pending::Fallback { .. }))
            .map(|(i, _)| i)
            .collect();

        if let (Some(secondary), false) = (&self.secondary, fallback.is_empty()) {
            let retry: Vec<String> = fallback.iter().map(|&i| texts[i].clone()).collect();
            debug!(
                provider = secondary.provider_name(),
                count = retry.len(),
                "falling back to secondary provider"
            );
            let second = self.attempt(secondary.as_ref(), &retry, target_locale).await;
            for (&i, outcome) in fallback.iter().zip(second) {
                match outcome {
                    Pending::Done(item) => pending[i] = Pending::Done(item),
                    Pending::Fallback { echoed } => {
                        if let Pending::Fallback { echoed: first_echoed } = &mut pending[i] {
                            *first_echoed |= echoed;
                        }
                    }
                }
            }
        }

        pending
            .into_iter()
            .zip(texts)
            .map(|(p, text)| match p {
                Pending::Done(item) => item,
                Pending::Fallback { echoed: true } => {
                    GatewayItem::unchanged(text, ItemStatus::Identical)
                }
                Pending::Fallback { echoed: false } => {
                    GatewayItem::unchanged(text, ItemStatus::Failed)
                }
            })
            .collect()
    }

    async fn attempt(
        &self,
        provider: &dyn MachineTranslator,
        texts: &[String],
        target_locale: &str,
    ) -> Vec<Pending> {
        let results = provider
            .translate_each(texts, &self.config.source_locale, target_locale)
            .await;

        if results.len() != texts.len() {
            warn!(
                provider = provider.provider_name(),
                expected = texts.len(),
                actual = results.len(),
                "provider returned the wrong number of results"
            );
            return texts
                .iter()
                .map(|_| Pending::Fallback { echoed: false })
                .collect();
        }

        results
            .into_iter()
            .zip(texts)
            .map(|(result, text)| match result {
                Ok(translated) if translated.trim().is_empty() && !text.trim().is_empty() => {
                    Pending::Fallback { echoed: false }
                }
                Ok(translated) if translated == *text => Pending::Fallback { echoed: true },
                Ok(translated) => Pending::Done(GatewayItem {
                    text: translated,
                    status: ItemStatus::Translated {
                        provider: provider.provider_name().to_string(),
                    },
                }),
                Err(err) => {
                    warn!(
                        provider = provider.provider_name(),
                        target = target_locale,
                        error = %err,
                        "translation failed, keeping source text"
                    );
                    Pending::Fallback { echoed: false }
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("providers", &self.provider_names())
            .field("config", &self.config)
            .finish()
    }
}
