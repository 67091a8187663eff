//! Binds activatable elements to component transitions.
//!
//! Pure adapter: it only knows which element maps to which [`Trigger`].
//! Every binding is optional, so a page missing any subset of controls
//! just has fewer bindings.

use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::navbar::NavbarToggle;
use crate::preview::Uploads;
use crate::sidebar::{Sidebar, SubmenuId};
use crate::wizard::Wizard;

const CHECKABLE_SELECTORS: [&str; 2] = ["input[type=checkbox]", "input[type=radio]"];

/// What activating a bound element does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    ToggleSidebar,
    ToggleSubmenu(SubmenuId),
    ToggleProfile,
    WizardNext,
    WizardPrev,
    WizardSubmit,
    /// Flip a checkbox, or select a radio within its group.
    Check(NodeId),
    /// Ask the host for a file for this input.
    OpenFilePicker(NodeId),
}

#[derive(Debug, Clone, Default)]
pub struct Glue {
    bindings: HashMap<NodeId, Trigger>,
}

impl Glue {
    pub fn bind(
        doc: &Document,
        sidebar: Option<&Sidebar>,
        navbar: Option<&NavbarToggle>,
        wizard: Option<&Wizard>,
        uploads: &Uploads,
    ) -> Self {
        let mut glue = Self::default();

        if let Some(sidebar) = sidebar {
            for control in [sidebar.toggle_control(), sidebar.menu_icon()]
                .into_iter()
                .flatten()
            {
                glue.bindings.insert(control, Trigger::ToggleSidebar);
            }
            for (id, header) in sidebar.headers() {
                glue.bindings.insert(header, Trigger::ToggleSubmenu(id));
            }
        }

        if let Some(navbar) = navbar {
            glue.bindings.insert(navbar.button(), Trigger::ToggleProfile);
        }

        if let Some(wizard) = wizard {
            glue.bindings.insert(wizard.next_button(), Trigger::WizardNext);
            glue.bindings.insert(wizard.prev_button(), Trigger::WizardPrev);
            glue.bindings.insert(wizard.submit_button(), Trigger::WizardSubmit);
        }

        for selector in CHECKABLE_SELECTORS {
            match doc.query_selector_all(selector) {
                Ok(nodes) => {
                    for node in nodes {
                        glue.bindings.insert(node, Trigger::Check(node));
                    }
                }
                Err(e) => tracing::warn!(selector, error = %e, "Checkable lookup failed"),
            }
        }

        for input in uploads.inputs() {
            glue.bindings.insert(input, Trigger::OpenFilePicker(input));
        }
        for node in doc.document_order() {
            if let Some(input) = uploads.opener_target(node) {
                glue.bindings.insert(node, Trigger::OpenFilePicker(input));
            }
        }

        tracing::debug!(bindings = glue.bindings.len(), "Event bindings ready");
        glue
    }

    pub fn trigger_for(&self, node: NodeId) -> Option<Trigger> {
        self.bindings.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound elements in document order, for keyboard focus cycling.
    pub fn targets(&self, doc: &Document) -> Vec<NodeId> {
        doc.document_order()
            .into_iter()
            .filter(|n| self.bindings.contains_key(n))
            .collect()
    }
}
