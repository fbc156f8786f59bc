//! Mock machine translator for tests
//!
//! Deterministic and network-free. Every call is recorded so tests can
//! assert exactly which strings reached the provider.
//!
//! ```ignore
//! let mock = MockTranslator::new(MockMode::Suffix);
//! let result = mock.translate("Acasă", "ro", "en").await.unwrap();
//! assert_eq!(result, "Acasă_en");
//! ```

use crate::error::{MtError, MtResult};
use crate::translator::MachineTranslator;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append the target locale: "Acasă" → "Acasă_en"
    Suffix,

    /// Predefined (text, target_locale) → translation, suffix otherwise
    Mappings(HashMap<(String, String), String>),

    /// Fail these texts, suffix the rest
    FailOn(HashSet<String>),

    /// Fail every request
    Error(String),

    /// Return input unchanged
    NoOp,
}

/// One recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub target_locale: String,
    pub texts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    delay: Duration,
    name: String,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay: Duration::ZERO,
            name: "Mock Translator".to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Simulate network latency, applied once per provider call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Distinguish two mocks chained as primary and secondary
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Convenience for `MockMode::Mappings` from `(source, target, translation)` triples
    pub fn with_mappings<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(text, target, translated)| {
                ((text.to_string(), target.to_string()), translated.to_string())
            })
            .collect();
        Self::new(MockMode::Mappings(map))
    }

    /// Calls received so far, oldest first
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every text received so far, across all calls
    pub fn requested_texts(&self) -> Vec<String> {
        self.calls().into_iter().flat_map(|c| c.texts).collect()
    }

    fn record(&self, texts: &[String], target_locale: &str) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MockCall {
                target_locale: target_locale.to_string(),
                texts: texts.to_vec(),
            });
    }

    async fn apply_delay(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::FailOn(failing) if failing.contains(text) => Err(
                MtError::TranslationError(format!("mock failure for '{}'", text)),
            ),
            MockMode::FailOn(_) => Ok(format!("{}_{}", text, target)),
            MockMode::Error(msg) => Err(MtError::TranslationError(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        self.record(&[text.to_string()], target_locale);
        self.apply_delay().await;
        self.apply_translation(text, target_locale)
    }

    async fn translate_each(
        &self,
        texts: &[String],
        _source_locale: &str,
        target_locale: &str,
    ) -> Vec<MtResult<String>> {
        self.record(texts, target_locale);
        self.apply_delay().await;
        texts
            .iter()
            .map(|text| self.apply_translation(text, target_locale))
            .collect()
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}
