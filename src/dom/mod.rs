//! In-memory page model and the render/commit boundary.
//!
//! Components never mutate the page while deciding what to show. They
//! render their state into a list of [`DomOp`] values, and [`commit`]
//! applies that list to the [`Document`]. CSS class names used in the ops
//! (`active`, `close`, `show`, `rotate`, `current`) are the contract with
//! the stylesheet and must stay exactly as written.
//!
//! # Module Structure
//!
//! - `document` - element arena, queries, mutation
//! - `selector` - compound selector parsing and matching
//! - `fixture` - TOML page descriptions

mod document;
mod fixture;
mod selector;

pub use document::{Document, Element, NodeId, NodeSnapshot};
pub use fixture::{PageLoadError, DEFAULT_PAGE};
pub use selector::Selector;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Invalid selector: '{0}'")]
    InvalidSelector(String),
}

/// A single declarative change to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomOp {
    /// Ensure `class` is present (`on`) or absent.
    SetClass {
        node: NodeId,
        class: &'static str,
        on: bool,
    },
    SetText {
        node: NodeId,
        text: String,
    },
    /// Set an attribute, or remove it when `value` is `None`.
    SetAttr {
        node: NodeId,
        name: &'static str,
        value: Option<String>,
    },
    /// Set an inline style property, or remove it when `value` is `None`.
    SetStyle {
        node: NodeId,
        property: &'static str,
        value: Option<String>,
    },
}

impl DomOp {
    pub fn class(node: NodeId, class: &'static str, on: bool) -> Self {
        Self::SetClass { node, class, on }
    }

    pub fn text(node: NodeId, text: impl Into<String>) -> Self {
        Self::SetText {
            node,
            text: text.into(),
        }
    }

    pub fn attr(node: NodeId, name: &'static str, value: Option<String>) -> Self {
        Self::SetAttr { node, name, value }
    }

    pub fn style(node: NodeId, property: &'static str, value: Option<String>) -> Self {
        Self::SetStyle {
            node,
            property,
            value,
        }
    }
}

/// Apply a batch of ops to the document, in order.
pub fn commit(doc: &mut Document, ops: impl IntoIterator<Item = DomOp>) {
    for op in ops {
        match op {
            DomOp::SetClass { node, class, on } => doc.set_class(node, class, on),
            DomOp::SetText { node, text } => doc.set_text(node, text),
            DomOp::SetAttr {
                node,
                name,
                value: Some(value),
            } => doc.set_attr(node, name, value),
            DomOp::SetAttr {
                node,
                name,
                value: None,
            } => doc.remove_attr(node, name),
            DomOp::SetStyle {
                node,
                property,
                value,
            } => doc.set_style(node, property, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_applies_in_order() {
        let mut doc = Document::new("commit");
        let body = doc.body();
        let el = doc.append(body, "div");

        commit(
            &mut doc,
            vec![
                DomOp::class(el, "active", true),
                DomOp::class(el, "close", true),
                DomOp::class(el, "close", false),
                DomOp::text(el, "first"),
                DomOp::text(el, "second"),
                DomOp::attr(el, "aria-hidden", Some("true".into())),
                DomOp::style(el, "background-size", Some("cover".into())),
            ],
        );

        assert!(doc.has_class(el, "active"));
        assert!(!doc.has_class(el, "close"));
        assert_eq!(doc.text(el), "second");
        assert_eq!(doc.attr(el, "aria-hidden"), Some("true"));
        assert_eq!(doc.style(el, "background-size"), Some("cover"));

        commit(&mut doc, [DomOp::attr(el, "aria-hidden", None)]);
        assert!(!doc.has_attr(el, "aria-hidden"));
    }
}
