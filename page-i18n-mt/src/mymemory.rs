//! MyMemory public translation API
//!
//! One GET per string, no key required. Used as the secondary provider:
//! it is slower and rate limited, but it often knows short UI strings the
//! primary echoes back untouched.

use crate::error::{MtError, MtResult};
use crate::translator::{MachineTranslator, normalize_locale, validate_locale};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_data: Option<ResponseData>,
    response_status: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    translated_text: String,
}

#[derive(Clone)]
pub struct MyMemoryProvider {
    client: reqwest::Client,
    base_url: String,
}

impl MyMemoryProvider {
    const DEFAULT_BASE_URL: &'static str = "https://api.mymemory.translated.net/get";

    /// The free tier rejects longer queries
    const MAX_CHARS_PER_STRING: usize = 500;

    pub fn new() -> MtResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn parse_body(body: &str) -> MtResult<String> {
        let malformed = |detail: String| MtError::MalformedResponse {
            provider: "MyMemory".to_string(),
            detail,
        };

        let parsed: MyMemoryResponse =
            serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;

        // responseStatus is a number on success and sometimes a string on errors
        let status = match &parsed.response_status {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.parse::<u64>().ok(),
            _ => None,
        };
        if status != Some(200) {
            return Err(MtError::TranslationError(format!(
                "MyMemory responded with status {}",
                parsed.response_status
            )));
        }

        parsed
            .response_data
            .map(|data| data.translated_text)
            .ok_or_else(|| malformed("missing 'responseData'".to_string()))
    }
}

impl std::fmt::Debug for MyMemoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MyMemoryProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for MyMemoryProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        if text.chars().count() > Self::MAX_CHARS_PER_STRING {
            return Err(MtError::TranslationError(format!(
                "Text exceeds maximum length of {} characters",
                Self::MAX_CHARS_PER_STRING
            )));
        }

        let langpair = format!(
            "{}|{}",
            normalize_locale(source_locale),
            normalize_locale(target_locale)
        );
        let url = reqwest::Url::parse_with_params(
            &self.base_url,
            &[("q", text), ("langpair", langpair.as_str())],
        )
        .map_err(|e| MtError::ConfigError(format!("Invalid MyMemory URL: {}", e)))?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(MtError::TranslationError(format!(
                "MyMemory HTTP error ({})",
                response.status()
            )));
        }

        let body = response.text().await?;
        Self::parse_body(&body)
    }

    fn provider_name(&self) -> &str {
        "MyMemory"
    }
}
