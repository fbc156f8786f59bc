//! HTTP batch translation endpoint
//!
//! Speaks the page-i18n wire contract:
//!
//! ```text
//! POST <endpoint>
//! { "texts": ["Acasă", "Contact"], "sourceLang": "ro", "targetLang": "en" }
//!
//! 200 OK
//! ["Home", "Contact"]
//! ```
//!
//! Anything other than a 2xx carrying a JSON array of strings of the same
//! length is reported as an error, which the gateway turns into "no
//! translation" for the whole request.

use crate::error::{MtError, MtResult};
use crate::translator::{MachineTranslator, fan_out, normalize_locale, validate_locale};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest<'a> {
    pub texts: &'a [String],
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Clone)]
pub struct HttpBatchProvider {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpBatchProvider {
    /// Timeout of the underlying HTTP client; the gateway itself has none
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(endpoint: impl Into<String>) -> MtResult<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(MtError::ConfigError(
                "Translation endpoint cannot be empty".to_string(),
            ));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(MtError::ConfigError(format!(
                "Translation endpoint must be an http(s) URL: {}",
                endpoint
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse_response(&self, body: &str, expected: usize) -> MtResult<Vec<String>> {
        let translations: Vec<String> =
            serde_json::from_str(body).map_err(|e| MtError::MalformedResponse {
                provider: self.provider_name().to_string(),
                detail: e.to_string(),
            })?;

        if translations.len() != expected {
            return Err(MtError::LengthMismatch {
                expected,
                actual: translations.len(),
            });
        }
        Ok(translations)
    }
}

impl std::fmt::Debug for HttpBatchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBatchProvider")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for HttpBatchProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        let results = self
            .translate_batch(&[text.to_string()], source_locale, target_locale)
            .await?;
        Ok(results.into_iter().next().unwrap_or_else(|| text.to_string()))
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = BatchRequest {
            texts,
            source_lang: normalize_locale(source_locale),
            target_lang: normalize_locale(target_locale),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(if status.is_client_error() {
                MtError::ConfigError(format!("Endpoint rejected request ({})", status))
            } else {
                MtError::TranslationError(format!("Endpoint server error ({})", status))
            });
        }

        let body = response.text().await?;
        self.parse_response(&body, texts.len())
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
        "HTTP batch"
    }
}
