//! TOML page descriptions.
//!
//! A page file describes the server-rendered markup the components attach
//! to. The `<body>` element is implicit; its classes come from `body_class`.
//!
//! ```toml
//! title = "Dashboard"
//! body_class = ""
//!
//! [[children]]
//! tag = "aside"
//! id = "sidebar"
//!
//! [[children.children]]
//! tag = "button"
//! class = "dropdown-btn"
//! text = "Tasks"
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

use super::{Document, NodeId};

/// The page bundled with the binary, used when no `--page` is given.
pub const DEFAULT_PAGE: &str = include_str!("../../pages/dashboard.toml");

#[derive(Debug, Error)]
pub enum PageLoadError {
    #[error("Failed to read page file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in page file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Page file too large: {0}")]
    TooLarge(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PageSpec {
    title: String,
    body_class: String,
    children: Vec<ElementSpec>,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            body_class: String::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ElementSpec {
    tag: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    class: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    attrs: BTreeMap<String, String>,
    #[serde(default)]
    style: BTreeMap<String, String>,
    #[serde(default)]
    children: Vec<ElementSpec>,
}

impl Document {
    /// Maximum page file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Build a document from a TOML page description.
    pub fn from_toml(content: &str) -> Result<Self, PageLoadError> {
        let spec: PageSpec = toml::from_str(content)?;
        let mut doc = Document::new(spec.title);
        let body = doc.body();
        for class in spec.body_class.split_whitespace() {
            doc.add_class(body, class);
        }
        let mut seen_ids = HashSet::new();
        for child in &spec.children {
            doc.build(body, child, &mut seen_ids);
        }
        tracing::debug!(elements = doc.len(), title = %doc.title(), "Built page document");
        Ok(doc)
    }

    /// Read a page description from disk.
    pub fn load(path: &Path) -> Result<Self, PageLoadError> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > Self::MAX_FILE_SIZE {
            return Err(PageLoadError::TooLarge(format!(
                "Page file is {} bytes (max {} bytes)",
                meta.len(),
                Self::MAX_FILE_SIZE
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn build<'a>(&mut self, parent: NodeId, spec: &'a ElementSpec, seen_ids: &mut HashSet<&'a str>) {
        let node = self.append(parent, &spec.tag);
        if let Some(id) = &spec.id {
            if !seen_ids.insert(id.as_str()) {
                tracing::warn!(id = %id, "Duplicate element id in page, first one wins");
            }
            self.set_id(node, id.clone());
        }
        for class in spec.class.split_whitespace() {
            self.add_class(node, class);
        }
        if !spec.text.is_empty() {
            self.set_text(node, spec.text.clone());
        }
        for (name, value) in &spec.attrs {
            self.set_attr(node, name, value.clone());
        }
        for (property, value) in &spec.style {
            self.set_style(node, property, Some(value.clone()));
        }
        for child in &spec.children {
            self.build(node, child, seen_ids);
        }
    }
}
