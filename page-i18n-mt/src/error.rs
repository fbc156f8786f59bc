//! Error types for the machine translation layer
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MtError {
    /// Locale code is empty or contains invalid characters
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// Provider is misconfigured (missing key, bad endpoint, 4xx from the API)
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Transport failure before a response was received
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Provider answered with a server error or refused the text
    #[error("Translation error: {0}")]
    TranslationError(String),
    /// Provider answered 2xx but the payload could not be interpreted
    #[error("Malformed response from {provider}: {detail}")]
    MalformedResponse { provider: String, detail: String },
    /// Provider returned a different number of strings than it was sent
    #[error("Expected {expected} translations, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        MtError::NetworkError(err.to_string())
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
