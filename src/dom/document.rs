use serde::Serialize;
use std::collections::BTreeMap;

use super::{DomError, Selector};

/// Handle to an element inside a [`Document`].
///
/// Handles stay valid for the lifetime of the document: elements are never
/// removed, only mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

/// A single element: tag, identity, classes, attributes, inline style, text.
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Serializable outline of an element subtree, used by `--dump`.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

/// In-memory page: an arena of elements rooted at `<body>`.
#[derive(Debug, Clone)]
pub struct Document {
    title: String,
    nodes: Vec<Element>,
}

impl Document {
    /// Create an empty page containing only `<body>`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            nodes: vec![Element {
                tag: "body".to_string(),
                ..Element::default()
            }],
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a new child element under `parent` and return its handle.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element {
            tag: tag.to_ascii_lowercase(),
            parent: Some(parent),
            ..Element::default()
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn element(&self, node: NodeId) -> &Element {
        &self.nodes[node.0]
    }

    fn element_mut(&mut self, node: NodeId) -> &mut Element {
        &mut self.nodes[node.0]
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Pre-order traversal of the subtree under `root` (root included).
    fn preorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        out
    }

    /// Every element, `<body>` first, in document order.
    pub fn document_order(&self) -> Vec<NodeId> {
        self.preorder(self.body())
    }

    /// First element in document order carrying `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.preorder(self.body())
            .into_iter()
            .find(|n| self.nodes[n.0].id.as_deref() == Some(id))
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// All elements matching `selector`, in document order, `<body>` included.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector: Selector = selector.parse()?;
        Ok(self
            .preorder(self.body())
            .into_iter()
            .filter(|n| selector.matches(&self.nodes[n.0]))
            .collect())
    }

    /// Descendants of `scope` (excluding `scope` itself) matching `selector`.
    pub fn query_within(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector: Selector = selector.parse()?;
        Ok(self
            .preorder(scope)
            .into_iter()
            .skip(1)
            .filter(|n| selector.matches(&self.nodes[n.0]))
            .collect())
    }

    fn sibling(&self, node: NodeId, offset: isize) -> Option<NodeId> {
        let parent = self.nodes[node.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let pos = siblings.iter().position(|&n| n == node)?;
        let target = pos.checked_add_signed(offset)?;
        siblings.get(target).copied()
    }

    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.sibling(node, 1)
    }

    pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.sibling(node, -1)
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn set_id(&mut self, node: NodeId, id: impl Into<String>) {
        self.element_mut(node).id = Some(id.into());
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).has_class(class)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let el = self.element_mut(node);
        if !el.has_class(class) {
            el.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.element_mut(node).classes.retain(|c| c != class);
    }

    /// Toggle `class`, returning whether it is present afterwards.
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            true
        }
    }

    pub fn set_class(&mut self, node: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.element(node).text
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        self.element_mut(node).text = text.into();
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).attr(name)
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.element(node).attrs.contains_key(name)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        self.element_mut(node)
            .attrs
            .insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        self.element_mut(node).attrs.remove(name);
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node).style(property)
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: Option<String>) {
        let style = &mut self.element_mut(node).style;
        match value {
            Some(value) if !value.is_empty() => {
                style.insert(property.to_string(), value);
            }
            _ => {
                style.remove(property);
            }
        }
    }

    /// Outline of the subtree under `node`.
    pub fn snapshot(&self, node: NodeId) -> NodeSnapshot {
        let el = self.element(node);
        NodeSnapshot {
            tag: el.tag.clone(),
            id: el.id.clone(),
            classes: el.classes.clone(),
            attrs: el.attrs.clone(),
            style: el.style.clone(),
            text: el.text.clone(),
            children: el.children.iter().map(|&c| self.snapshot(c)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new("test");
        let body = doc.body();
        let aside = doc.append(body, "aside");
        doc.set_id(aside, "sidebar");
        let button = doc.append(aside, "button");
        doc.add_class(button, "dropdown-btn");
        let menu = doc.append(aside, "ul");
        doc.add_class(menu, "sub-menu");
        (doc, aside, button, menu)
    }

    #[test]
    fn test_get_element_by_id() {
        let (doc, aside, _, _) = sample();
        assert_eq!(doc.get_element_by_id("sidebar"), Some(aside));
        assert_eq!(doc.get_element_by_id("missing"), None);
    }

    #[test]
    fn test_query_includes_body() {
        let (doc, _, _, _) = sample();
        assert_eq!(doc.query_selector("body").unwrap(), Some(doc.body()));
    }

    #[test]
    fn test_query_within_excludes_scope() {
        let (doc, aside, button, _) = sample();
        assert_eq!(doc.query_within(aside, "aside").unwrap(), vec![]);
        assert_eq!(doc.query_within(aside, ".dropdown-btn").unwrap(), vec![button]);
    }

    #[test]
    fn test_document_order_is_preorder() {
        let mut doc = Document::new("order");
        let body = doc.body();
        let first = doc.append(body, "div");
        let second = doc.append(body, "div");
        // Appended later but nested under the first div.
        let nested = doc.append(first, "div");
        assert_eq!(
            doc.query_selector_all("div").unwrap(),
            vec![first, nested, second]
        );
    }

    #[test]
    fn test_siblings() {
        let (doc, aside, button, menu) = sample();
        assert_eq!(doc.next_element_sibling(button), Some(menu));
        assert_eq!(doc.previous_element_sibling(menu), Some(button));
        assert_eq!(doc.next_element_sibling(menu), None);
        assert_eq!(doc.previous_element_sibling(button), None);
        assert_eq!(doc.next_element_sibling(doc.body()), None);
        assert_eq!(doc.next_element_sibling(aside), None);
    }

    #[test]
    fn test_class_ops_are_set_like() {
        let (mut doc, aside, _, _) = sample();
        doc.add_class(aside, "active");
        doc.add_class(aside, "active");
        assert_eq!(doc.element(aside).classes(), &["active".to_string()]);
        assert!(!doc.toggle_class(aside, "active"));
        assert!(doc.toggle_class(aside, "close"));
        assert!(doc.has_class(aside, "close"));
    }

    #[test]
    fn test_empty_style_value_removes_property() {
        let (mut doc, aside, _, _) = sample();
        doc.set_style(aside, "background-image", Some("url('x')".into()));
        assert_eq!(doc.style(aside, "background-image"), Some("url('x')"));
        doc.set_style(aside, "background-image", Some(String::new()));
        assert_eq!(doc.style(aside, "background-image"), None);
    }
}
