//! Document abstraction the engine translates in place
//!
//! The orchestrator never sees a concrete DOM. A [`Document`] hands out its
//! text-bearing elements in document order; each [`TextElement`] exposes only
//! its *direct* text children as a list of segments, one per text node.
//! [`crate::html::HtmlDocument`] implements both over `markup5ever_rcdom`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identity of an element for the lifetime of one route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

pub trait TextElement: Clone {
    fn id(&self) -> ElementId;

    /// Lowercase tag name
    fn tag_name(&self) -> String;

    /// Contents of the text nodes whose parent is this element, in order
    fn text_segments(&self) -> Vec<String>;

    /// Overwrite the direct text nodes: segment `i` goes to text node `i`,
    /// text nodes beyond `segments.len()` are emptied, extra segments are
    /// dropped. Child elements are never touched.
    fn write_segments(&self, segments: &[String]);
}

pub trait Document {
    type Element: TextElement;

    /// Every element in document order, skipping the subtrees of `skip_tags`
    fn elements(&self, skip_tags: &[String]) -> Vec<Self::Element>;

    /// Whether the element still belongs to the live document
    fn contains(&self, element: &Self::Element) -> bool;
}

/// Literal strings that must never be translated (brand and legal names)
///
/// Matching is exact and case-sensitive against the trimmed text of an
/// element; a brand mentioned inside a longer sentence is not protected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct DenyList {
    literals: HashSet<String>,
}

impl DenyList {
    pub fn new<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            literals: literals.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, trimmed: &str) -> bool {
        self.literals.contains(trimmed)
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

impl From<Vec<String>> for DenyList {
    fn from(literals: Vec<String>) -> Self {
        Self::new(literals)
    }
}

impl From<DenyList> for Vec<String> {
    fn from(list: DenyList) -> Self {
        let mut literals: Vec<String> = list.literals.into_iter().collect();
        literals.sort();
        literals
    }
}
