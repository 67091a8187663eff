//! File previews for proof uploads and the profile avatar.
//!
//! A chosen file is read once and turned into a `data:` URL. Proof inputs
//! (`input[type=file][name=proof]` with `data-idx`) paint it as the
//! background of `#preview-<idx>`; the avatar input `#pfpInput` swaps the
//! `src` of `#pfpImage`.

use base64::Engine as _;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::dom::{Document, DomOp, NodeId};
use crate::error::ComponentError;

pub const PROOF_INPUT_SELECTOR: &str = "input[type=file][name=proof]";
pub const PREVIEW_ID_PREFIX: &str = "preview-";
pub const AVATAR_INPUT_ID: &str = "pfpInput";
pub const AVATAR_IMAGE_ID: &str = "pfpImage";
pub const AVATAR_EDIT_SELECTOR: &str = ".edit-pfp";

/// Largest file turned into a preview (10 MB).
pub const MAX_PREVIEW_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("File too large for preview: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("Element is not a bound file input")]
    NotBound,
}

/// MIME type guessed from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Read `path` into a data URL, enforcing [`MAX_PREVIEW_BYTES`].
pub fn read_data_url(path: &Path) -> Result<String, PreviewError> {
    let size = std::fs::metadata(path)?.len();
    if size > MAX_PREVIEW_BYTES {
        return Err(PreviewError::TooLarge {
            size,
            max: MAX_PREVIEW_BYTES,
        });
    }
    let bytes = std::fs::read(path)?;
    Ok(data_url(mime_for_path(path), &bytes))
}

/// Where a file input's selection is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    Proof { preview: NodeId },
    Avatar { image: NodeId },
}

impl UploadTarget {
    /// Ops showing `selection`, or clearing the preview when `None`.
    pub fn render(self, selection: Option<&str>) -> Vec<DomOp> {
        match (self, selection) {
            (UploadTarget::Proof { preview }, Some(url)) => vec![
                DomOp::style(preview, "background-image", Some(format!("url('{url}')"))),
                DomOp::style(preview, "background-size", Some("cover".into())),
                DomOp::style(preview, "background-position", Some("center".into())),
                DomOp::attr(preview, "aria-hidden", Some("false".into())),
            ],
            (UploadTarget::Proof { preview }, None) => vec![
                DomOp::style(preview, "background-image", None),
                DomOp::attr(preview, "aria-hidden", Some("true".into())),
            ],
            (UploadTarget::Avatar { image }, Some(url)) => {
                vec![DomOp::attr(image, "src", Some(url.to_string()))]
            }
            (UploadTarget::Avatar { .. }, None) => Vec::new(),
        }
    }
}

/// File inputs on the page and the elements that open them.
#[derive(Debug, Clone, Default)]
pub struct Uploads {
    targets: HashMap<NodeId, UploadTarget>,
    openers: HashMap<NodeId, NodeId>,
}

impl Uploads {
    /// Bind every proof input and the avatar controls that are present.
    pub fn mount(doc: &Document) -> Result<Self, ComponentError> {
        let mut uploads = Self::default();

        for input in doc.query_selector_all(PROOF_INPUT_SELECTOR)? {
            let Some(idx) = doc.attr(input, "data-idx") else {
                tracing::debug!(?input, "Proof input without data-idx, not bound");
                continue;
            };
            let preview_id = format!("{PREVIEW_ID_PREFIX}{idx}");
            match doc.get_element_by_id(&preview_id) {
                Some(preview) => {
                    uploads.targets.insert(input, UploadTarget::Proof { preview });
                }
                None => tracing::debug!(id = %preview_id, "Preview element missing"),
            }
        }

        if let (Some(input), Some(image)) = (
            doc.get_element_by_id(AVATAR_INPUT_ID),
            doc.get_element_by_id(AVATAR_IMAGE_ID),
        ) {
            uploads.targets.insert(input, UploadTarget::Avatar { image });
            uploads.openers.insert(image, input);
            for edit in doc.query_selector_all(AVATAR_EDIT_SELECTOR)? {
                uploads.openers.insert(edit, input);
            }
        }

        tracing::debug!(inputs = uploads.targets.len(), "File previews mounted");
        Ok(uploads)
    }

    pub fn target(&self, input: NodeId) -> Option<UploadTarget> {
        self.targets.get(&input).copied()
    }

    pub fn inputs(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.targets.keys().copied()
    }

    /// Input opened by clicking `node`, for controls that are not inputs.
    pub fn opener_target(&self, node: NodeId) -> Option<NodeId> {
        self.openers.get(&node).copied()
    }

    /// Ops for a new selection on `input`: `None` clears it.
    pub fn select(&self, input: NodeId, file: Option<&Path>) -> Result<Vec<DomOp>, PreviewError> {
        let target = self.target(input).ok_or(PreviewError::NotBound)?;
        let Some(path) = file else {
            return Ok(target.render(None));
        };
        let url = read_data_url(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!(file = %path.display(), bytes = url.len(), "Preview ready");
        let mut ops = vec![DomOp::attr(input, "value", Some(name))];
        ops.extend(target.render(Some(&url)));
        Ok(ops)
    }
}
