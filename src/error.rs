//! Component failure taxonomy.
//!
//! None of these are ever shown to the user as a failure message. Each one
//! degrades the component it came from and is logged; the rest of the page
//! keeps working.

use thiserror::Error;

use crate::dom::DomError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// A required anchor element is absent. The component disables itself.
    #[error("{component}: required element '{selector}' not found")]
    MissingElement {
        component: &'static str,
        selector: String,
    },

    /// Input could not be interpreted. The raw input is shown unchanged.
    #[error("Could not parse '{input}': {reason}")]
    ParseFailure { input: String, reason: String },

    /// The host cannot perform a reload. The last displayed value stays.
    #[error("Reload unavailable: {0}")]
    ReloadUnavailable(String),

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl ComponentError {
    pub fn missing(component: &'static str, selector: impl Into<String>) -> Self {
        Self::MissingElement {
            component,
            selector: selector.into(),
        }
    }
}
