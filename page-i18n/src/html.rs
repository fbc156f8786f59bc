//! HTML backend for [`Document`] built on `html5ever` and `markup5ever_rcdom`

use html5ever::parse_document;
use html5ever::serialize::{SerializeOpts, serialize};
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::{Document, ElementId, TextElement};
use crate::error::EngineResult;

/// A live, mutable HTML document
///
/// Cloning shares the same document. Loading a new page with
/// [`HtmlDocument::load`] replaces the tree; elements of the previous page
/// stop being [`Document::contains`]-ed.
#[derive(Clone)]
pub struct HtmlDocument {
    dom: Rc<RefCell<RcDom>>,
}

#[derive(Clone)]
pub struct HtmlElement {
    handle: Handle,
}

fn parse(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(html)
}

fn parent_of(node: &Handle) -> Option<Handle> {
    // `parent` is a Cell, so read it by taking and putting it back
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    node.parent.set(weak);
    parent
}

fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == attr_name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn collect_elements(node: &Handle, skip_tags: &[String], out: &mut Vec<HtmlElement>) {
    if let Some(name) = element_name(node) {
        if skip_tags.iter().any(|t| t.eq_ignore_ascii_case(&name)) {
            return;
        }
        out.push(HtmlElement {
            handle: node.clone(),
        });
    }
    for child in node.children.borrow().iter() {
        collect_elements(child, skip_tags, out);
    }
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            dom: Rc::new(RefCell::new(parse(html))),
        }
    }

    /// Replace the whole tree with a newly rendered page
    ///
    /// Dropping the previous tree empties its nodes: elements still held
    /// from the previous page read as having no text afterwards.
    pub fn load(&self, html: &str) {
        *self.dom.borrow_mut() = parse(html);
    }

    pub fn to_html(&self) -> EngineResult<String> {
        let document = self.dom.borrow().document.clone();
        let serializable: SerializableHandle = document.into();
        let mut buf: Vec<u8> = Vec::new();
        serialize(&mut buf, &serializable, SerializeOpts::default())?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// First element carrying `id="<id>"`
    pub fn element_by_id(&self, id: &str) -> Option<HtmlElement> {
        self.elements(&[])
            .into_iter()
            .find(|el| attr(&el.handle, "id").as_deref() == Some(id))
    }

    /// Detach an element from the tree, as a re-render would
    pub fn remove(&self, element: &HtmlElement) {
        if let Some(parent) = parent_of(&element.handle) {
            parent
                .children
                .borrow_mut()
                .retain(|child| !Rc::ptr_eq(child, &element.handle));
            element.handle.parent.set(None);
        }
    }
}

impl Document for HtmlDocument {
    type Element = HtmlElement;

    fn elements(&self, skip_tags: &[String]) -> Vec<HtmlElement> {
        let document = self.dom.borrow().document.clone();
        let mut out = Vec::new();
        collect_elements(&document, skip_tags, &mut out);
        out
    }

    fn contains(&self, element: &HtmlElement) -> bool {
        let root = self.dom.borrow().document.clone();
        let mut current = element.handle.clone();
        while let Some(parent) = parent_of(&current) {
            current = parent;
        }
        Rc::ptr_eq(&current, &root)
    }
}

impl HtmlElement {
    /// Concatenated direct text, as it currently reads
    pub fn direct_text(&self) -> String {
        self.text_segments().concat()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        attr(&self.handle, name)
    }
}

impl TextElement for HtmlElement {
    fn id(&self) -> ElementId {
        ElementId(Rc::as_ptr(&self.handle) as usize)
    }

    fn tag_name(&self) -> String {
        element_name(&self.handle).unwrap_or_default()
    }

    fn text_segments(&self) -> Vec<String> {
        self.handle
            .children
            .borrow()
            .iter()
            .filter_map(|child| match &child.data {
                NodeData::Text { contents } => Some(contents.borrow().to_string()),
                _ => None,
            })
            .collect()
    }

    fn write_segments(&self, segments: &[String]) {
        let children = self.handle.children.borrow();
        let text_nodes = children.iter().filter_map(|child| match &child.data {
            NodeData::Text { contents } => Some(contents),
            _ => None,
        });
        for (index, contents) in text_nodes.enumerate() {
            let mut tendril = contents.borrow_mut();
            tendril.clear();
            if let Some(segment) = segments.get(index) {
                tendril.push_slice(segment);
            }
        }
    }
}

impl std::fmt::Debug for HtmlElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlElement")
            .field("tag", &self.tag_name())
            .field("text", &self.direct_text())
            .finish()
    }
}

impl std::fmt::Debug for HtmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlDocument")
            .field("elements", &self.elements(&[]).len())
            .finish()
    }
}
