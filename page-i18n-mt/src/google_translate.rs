//! Google Translate API v2 provider
//!
//! Loads the API key from `GOOGLE_TRANSLATE_API_KEY`. Requests are sent
//! with `format=text` so page strings come back without HTML escaping.

use crate::error::{MtError, MtResult};
use crate::translator::{MachineTranslator, fan_out, normalize_locale, validate_locale};
use async_trait::async_trait;
use serde_json::json;

#[derive(Clone)]
pub struct GoogleTranslateProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslateProvider {
    /// Google Translate v2 accepts up to 128 `q` values per request
    const MAX_TEXTS_PER_REQUEST: usize = 128;

    /// Per-string limit imposed by the API
    const MAX_CHARS_PER_STRING: usize = 30_000;

    const DEFAULT_BASE_URL: &'static str =
        "https://translation.googleapis.com/language/translate/v2";

    pub fn new(api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::ConfigError("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a provider from the `GOOGLE_TRANSLATE_API_KEY` environment variable
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var("GOOGLE_TRANSLATE_API_KEY").map_err(|_| {
            MtError::ConfigError(
                "GOOGLE_TRANSLATE_API_KEY environment variable not set".to_string(),
            )
        })?;

        Self::new(api_key)
    }

    /// Point the provider at a different deployment of the v2 API
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_chunks(texts: &[String]) -> std::slice::Chunks<'_, String> {
        texts.chunks(Self::MAX_TEXTS_PER_REQUEST)
    }

    async fn translate_request(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        let url = format!("{}?key={}", self.base_url, self.api_key);
        let body = json!({
            "q": texts,
            "source": normalize_locale(source_locale),
            "target": normalize_locale(target_locale),
            "format": "text"
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(if status.is_client_error() {
                MtError::ConfigError(format!("API client error ({}): {}", status, error_text))
            } else {
                MtError::TranslationError(format!("API server error ({}): {}", status, error_text))
            });
        }

        let json: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| MtError::MalformedResponse {
                    provider: self.provider_name().to_string(),
                    detail: e.to_string(),
                })?;

        Self::extract_translations(&json, texts.len())
    }

    fn extract_translations(json: &serde_json::Value, expected: usize) -> MtResult<Vec<String>> {
        let malformed = |detail: &str| MtError::MalformedResponse {
            provider: "Google Translate".to_string(),
            detail: detail.to_string(),
        };

        let translations = json["data"]["translations"]
            .as_array()
            .ok_or_else(|| malformed("missing 'data.translations' array"))?;

        if translations.len() != expected {
            return Err(MtError::LengthMismatch {
                expected,
                actual: translations.len(),
            });
        }

        translations
            .iter()
            .map(|t| {
                t["translatedText"]
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| malformed("missing 'translatedText' field"))
            })
            .collect()
    }
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let results = self
            .translate_batch(&[text.to_string()], source_locale, target_locale)
            .await?;
        Ok(results.into_iter().next().unwrap_or_default())
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        if let Some(i) = texts
            .iter()
            .position(|t| t.len() > Self::MAX_CHARS_PER_STRING)
        {
            return Err(MtError::TranslationError(format!(
                "Text at index {} exceeds maximum length of {} characters",
                i,
                Self::MAX_CHARS_PER_STRING
            )));
        }

        let mut all_results = Vec::with_capacity(texts.len());
        for chunk in Self::request_chunks(texts) {
            let chunk_results = self
                .translate_request(chunk, source_locale, target_locale)
                .await?;
            all_results.extend(chunk_results);
        }
        Ok(all_results)
    }

    async fn translate_each(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> Vec<MtResult<String>> {
        let result = self
            .translate_batch(texts, source_locale, target_locale)
            .await;
        fan_out(result, texts.len())
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}
