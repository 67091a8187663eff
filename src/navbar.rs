//! Profile menu toggle on the top navbar.
//!
//! Independent of the sidebar: its `active` flag has no relation to any
//! sidebar state.

use crate::dom::{Document, DomOp, NodeId};
use crate::error::ComponentError;

pub const BUTTON_ID: &str = "profile-button";
pub const NAVBAR_ID: &str = "navbar";

#[derive(Debug, Clone)]
pub struct NavbarToggle {
    button: NodeId,
    navbar: NodeId,
    active: bool,
}

impl NavbarToggle {
    pub fn mount(doc: &Document) -> Result<Self, ComponentError> {
        let button = doc
            .get_element_by_id(BUTTON_ID)
            .ok_or_else(|| ComponentError::missing("navbar", format!("#{BUTTON_ID}")))?;
        let navbar = doc
            .get_element_by_id(NAVBAR_ID)
            .ok_or_else(|| ComponentError::missing("navbar", format!("#{NAVBAR_ID}")))?;
        Ok(Self {
            button,
            navbar,
            active: doc.has_class(navbar, "active"),
        })
    }

    pub fn button(&self) -> NodeId {
        self.button
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn toggle(&mut self) -> Vec<DomOp> {
        self.active = !self.active;
        vec![DomOp::class(self.navbar, "active", self.active)]
    }
}
