//! Machine translation trait and locale helpers
//!
//! `MachineTranslator` abstracts over translation backends (HTTP batch
//! endpoint, Google Translate, MyMemory, mock) so the gateway can chain a
//! primary and a secondary provider without knowing how either talks to
//! its service.
//!
//! # Example
//!
//! ```ignore
//! use page_i18n_mt::{HttpBatchProvider, MachineTranslator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = HttpBatchProvider::new("http://localhost:8080/translate")?;
//!     let texts = vec!["Acasă".to_string(), "Contact".to_string()];
//!     let results = provider.translate_batch(&texts, "ro", "en").await?;
//!     println!("{:?}", results);
//!     Ok(())
//! }
//! ```

use crate::error::{MtError, MtResult};
use async_trait::async_trait;
use futures::future::join_all;

/// Generic trait for machine translation providers
///
/// All methods are async to support network-bound backends.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate a single text string from source to target locale
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String>;

    /// Translate multiple strings, all-or-nothing
    ///
    /// Output order and length match the input. The default implementation
    /// issues one `translate` call per string, concurrently, and fails if
    /// any of them fails.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        self.translate_each(texts, source_locale, target_locale)
            .await
            .into_iter()
            .collect()
    }

    /// Translate multiple strings, keeping one result per input string
    ///
    /// This is what the gateway calls: a failure of one string must not hide
    /// the successes of the others. Providers with a native batch endpoint
    /// override this to send a single request and fan the outcome out.
    async fn translate_each(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> Vec<MtResult<String>> {
        let requests = texts
            .iter()
            .map(|text| self.translate(text, source_locale, target_locale));
        join_all(requests).await
    }

    /// Name used in logs to identify which provider handled a translation
    fn provider_name(&self) -> &str;
}

/// Fan a whole-batch result out into one result per input string
pub(crate) fn fan_out(result: MtResult<Vec<String>>, expected: usize) -> Vec<MtResult<String>> {
    match result {
        Ok(translations) if translations.len() == expected => {
            translations.into_iter().map(Ok).collect()
        }
        Ok(translations) => {
            let err = MtError::LengthMismatch {
                expected,
                actual: translations.len(),
            };
            vec![Err(err); expected]
        }
        Err(err) => vec![Err(err); expected],
    }
}

/// Normalize a locale code by stripping region and script information
///
/// `ro-RO` → `ro`, `zh-Hans` → `zh`, `EN` → `en`.
pub fn normalize_locale(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or(locale)
        .to_lowercase()
}

/// Validate that a locale code only contains alphanumerics, `-` and `_`
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Uppercase;

    #[async_trait]
    impl MachineTranslator for Uppercase {
        async fn translate(&self, text: &str, _: &str, _: &str) -> MtResult<String> {
            if text == "boom" {
                return Err(MtError::TranslationError("boom".to_string()));
            }
            Ok(text.to_uppercase())
        }

        fn provider_name(&self) -> &str {
            "Uppercase"
        }
    }

    #[test]
    fn test_normalize_locale_with_region() {
        assert_eq!(normalize_locale("ro-RO"), "ro");
        assert_eq!(normalize_locale("en-GB"), "en");
        assert_eq!(normalize_locale("de_AT"), "de");
    }

    #[test]
    fn test_normalize_locale_case_insensitive() {
        assert_eq!(normalize_locale("EN"), "en");
        assert_eq!(normalize_locale("Hu-HU"), "hu");
    }

    #[test]
    fn test_validate_locale() {
        assert!(validate_locale("ro").is_ok());
        assert!(validate_locale("en-US").is_ok());
        assert!(validate_locale("de_DE").is_ok());
        assert!(validate_locale("").is_err());
        assert!(matches!(
            validate_locale("fr#bad"),
            Err(MtError::InvalidLocale(msg)) if msg.contains("Invalid characters")
        ));
    }

    #[tokio::test]
    async fn test_default_translate_each_keeps_per_string_outcome() {
        let texts = vec!["unu".to_string(), "boom".to_string(), "trei".to_string()];
        let results = Uppercase.translate_each(&texts, "ro", "en").await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_deref(), Ok("UNU"));
        assert!(results[1].is_err());
        assert_eq!(results[2].as_deref(), Ok("TREI"));
    }

    #[tokio::test]
    async fn test_default_translate_batch_is_all_or_nothing() {
        let ok = vec!["unu".to_string(), "doi".to_string()];
        assert_eq!(
            Uppercase.translate_batch(&ok, "ro", "en").await.unwrap(),
            vec!["UNU", "DOI"]
        );

        let failing = vec!["unu".to_string(), "boom".to_string()];
        assert!(Uppercase.translate_batch(&failing, "ro", "en").await.is_err());
    }

    #[test]
    fn test_fan_out_length_mismatch() {
        let results = fan_out(Ok(vec!["a".to_string()]), 2);
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(MtError::LengthMismatch { expected: 2, actual: 1 }))));
    }
}
