use page_i18n_mt::MtError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by configuration, the language registry and page input.
///
/// Translation passes themselves never fail; see [`crate::PassOutcome`].
/// Storage problems are not errors either: the cache falls back to memory.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unknown language code: {0}")]
    UnknownLanguage(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Failed to read {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("Translation provider setup failed: {0}")]
    Provider(#[from] MtError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
