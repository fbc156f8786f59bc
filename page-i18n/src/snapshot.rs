//! Snapshot of the original, untranslated text of the current page
//!
//! Captured once per route, right after the page settles, and used both as
//! the translation input and as the restoration source. Restoring writes
//! back the raw text segments, so an element returns to byte-identical text
//! nodes no matter how many times it was translated in between.

use std::collections::HashSet;
use tracing::debug;

use crate::dom::{DenyList, Document, ElementId, TextElement};

#[derive(Debug, Clone)]
pub struct SnapshotEntry<E> {
    element: E,
    id: ElementId,
    segments: Vec<String>,
    original: String,
    source: String,
}

impl<E: TextElement> SnapshotEntry<E> {
    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Exact original direct text, whitespace included
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Trimmed original text; what gets translated
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Put the original text nodes back
    pub fn restore(&self) {
        self.element.write_segments(&self.segments);
    }

    /// Show `translated` in place of the original text, keeping the
    /// original's surrounding whitespace so inline spacing survives
    pub fn apply(&self, translated: &str) {
        let leading_len = self.original.len() - self.original.trim_start().len();
        let trailing_start = self.original.trim_end().len();
        let leading = &self.original[..leading_len];
        let trailing = &self.original[trailing_start.max(leading_len)..];
        self.element
            .write_segments(&[format!("{}{}{}", leading, translated, trailing)]);
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot<E> {
    version: u64,
    entries: Vec<SnapshotEntry<E>>,
}

impl<E: TextElement> Snapshot<E> {
    /// A snapshot with nothing in it, used before the first route settles
    pub fn empty(version: u64) -> Self {
        Self {
            version,
            entries: Vec::new(),
        }
    }

    /// Read every translatable leaf text of `document`
    pub fn capture<D>(document: &D, deny_list: &DenyList, skip_tags: &[String], version: u64) -> Self
    where
        D: Document<Element = E>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        let mut denied = 0usize;

        for element in document.elements(skip_tags) {
            let id = element.id();
            if !seen.insert(id) {
                continue;
            }

            let segments = element.text_segments();
            if segments.is_empty() {
                continue;
            }
            let original = segments.concat();
            let source = original.trim();
            if source.is_empty() {
                continue;
            }
            if deny_list.contains(source) {
                denied += 1;
                continue;
            }

            let source = source.to_string();
            entries.push(SnapshotEntry {
                element,
                id,
                segments,
                original,
                source,
            });
        }

        debug!(version, entries = entries.len(), denied, "captured snapshot");
        Self { version, entries }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn entries(&self) -> &[SnapshotEntry<E>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&SnapshotEntry<E>> {
        self.entries.iter().find(|e| e.id == id)
    }
}
