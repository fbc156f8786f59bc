//! Static language registry
//!
//! Pages are authored in Romanian; every other entry is a translation target.

use icu_locale::LanguageIdentifier;
use serde::Serialize;

use crate::error::{EngineError, EngineResult};

/// Code of the language pages are authored in
pub const SOURCE_LANGUAGE: &str = "ro";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub display_name: &'static str,
    pub native_display_name: &'static str,
    pub icon: &'static str,
}

impl Language {
    pub fn is_source(&self) -> bool {
        self.code == SOURCE_LANGUAGE
    }
}

pub static LANGUAGES: &[Language] = &[
    Language {
        code: "ro",
        display_name: "Romanian",
        native_display_name: "Română",
        icon: "/images/flags/ro.svg",
    },
    Language {
        code: "en",
        display_name: "English",
        native_display_name: "English",
        icon: "/images/flags/en.svg",
    },
    Language {
        code: "de",
        display_name: "German",
        native_display_name: "Deutsch",
        icon: "/images/flags/de.svg",
    },
    Language {
        code: "fr",
        display_name: "French",
        native_display_name: "Français",
        icon: "/images/flags/fr.svg",
    },
    Language {
        code: "it",
        display_name: "Italian",
        native_display_name: "Italiano",
        icon: "/images/flags/it.svg",
    },
    Language {
        code: "es",
        display_name: "Spanish",
        native_display_name: "Español",
        icon: "/images/flags/es.svg",
    },
    Language {
        code: "hu",
        display_name: "Hungarian",
        native_display_name: "Magyar",
        icon: "/images/flags/hu.svg",
    },
];

pub fn source_language() -> &'static Language {
    &LANGUAGES[0]
}

/// Look a language up by exact registry code
pub fn find(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|lang| lang.code == code)
}

/// Resolve any BCP 47 tag (`en-US`, `DE`, `ro_RO`) to a registry entry
pub fn resolve(tag: &str) -> EngineResult<&'static Language> {
    let normalized = tag.trim().replace('_', "-");
    let langid: LanguageIdentifier = normalized
        .parse()
        .map_err(|_| EngineError::UnknownLanguage(tag.to_string()))?;
    find(langid.language.as_str()).ok_or_else(|| EngineError::UnknownLanguage(tag.to_string()))
}
