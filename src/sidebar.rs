//! Collapsible navigation sidebar with mutually exclusive submenus.
//!
//! One canonical state machine for every page that carries the sidebar.
//! State is read from the markup once at mount; after that the markup only
//! ever reflects [`SidebarState`] through [`Sidebar::render`].
//!
//! Visual contract:
//!
//! | element                 | class    | on when                      |
//! |-------------------------|----------|------------------------------|
//! | sidebar root            | `active` | expanded                     |
//! | sidebar root            | `close`  | icon-only sub-state          |
//! | `<body>`, mirrors       | `active` | expanded                     |
//! | submenu panel           | `show`   | it is the active submenu     |
//! | submenu header          | `rotate` | it is the active submenu     |
//! | toggle control          | `rotate` | toggle indicator is rotated  |

use crate::dom::{Document, DomOp, NodeId};
use crate::error::ComponentError;

pub const ROOT_ID: &str = "sidebar";
pub const ROOT_FALLBACK_SELECTOR: &str = "aside";
pub const TOGGLE_ID: &str = "toggle-btn";
pub const MENU_ICON_ID: &str = "menu-icon";
pub const HEADER_SELECTOR: &str = ".dropdown-btn";

/// Default companion panels that mirror the sidebar's `active` class.
pub const DEFAULT_MIRRORS: [&str; 2] = [".home-content-left", ".home-content-right"];

const COMPONENT: &str = "sidebar";

/// Position of a submenu among the sidebar's headers, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmenuId(pub usize);

/// Sidebar model.
///
/// Invariant: `active_submenu.is_some()` implies `expanded`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidebarState {
    pub expanded: bool,
    pub active_submenu: Option<SubmenuId>,
    /// Collapsed-to-icons modifier (`close`), independent of `expanded`.
    pub icon_only: bool,
    pub toggle_rotated: bool,
}

impl SidebarState {
    /// Expand a collapsed sidebar, or collapse an expanded one.
    /// Either way every submenu ends up closed.
    pub fn toggle_sidebar(&mut self) {
        self.expanded = !self.expanded;
        self.icon_only = !self.expanded;
        self.active_submenu = None;
    }

    /// Open `id` (closing whichever submenu was open) or close it if it is
    /// already the open one. Opening always leaves the sidebar expanded and
    /// clears the icon-only modifier.
    pub fn toggle_submenu(&mut self, id: SubmenuId) {
        if self.active_submenu == Some(id) {
            self.active_submenu = None;
            return;
        }
        self.active_submenu = Some(id);
        self.expanded = true;
        if self.icon_only {
            self.icon_only = false;
            self.toggle_rotated = false;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Submenu {
    header: NodeId,
    panel: NodeId,
}

/// The mounted sidebar: resolved anchors plus current state.
#[derive(Debug, Clone)]
pub struct Sidebar {
    root: NodeId,
    body: NodeId,
    toggle: Option<NodeId>,
    menu_icon: Option<NodeId>,
    mirrors: Vec<NodeId>,
    submenus: Vec<Submenu>,
    state: SidebarState,
}

impl Sidebar {
    /// Resolve anchors and read the initial state from the markup.
    ///
    /// The sidebar root and `<body>` are required; everything else is
    /// optional. Mirror selectors that fail to parse are skipped.
    pub fn mount(doc: &Document, mirror_selectors: &[String]) -> Result<Self, ComponentError> {
        let root = match doc.get_element_by_id(ROOT_ID) {
            Some(root) => root,
            None => doc
                .query_selector(ROOT_FALLBACK_SELECTOR)?
                .ok_or_else(|| ComponentError::missing(COMPONENT, format!("#{ROOT_ID}")))?,
        };
        let body = doc
            .query_selector("body")?
            .ok_or_else(|| ComponentError::missing(COMPONENT, "body"))?;

        let toggle = doc.get_element_by_id(TOGGLE_ID);
        let menu_icon = doc.get_element_by_id(MENU_ICON_ID);

        let mut mirrors = Vec::new();
        for selector in mirror_selectors {
            match doc.query_selector(selector) {
                Ok(Some(node)) => mirrors.push(node),
                Ok(None) => {
                    tracing::debug!(selector = %selector, "Mirror element not on this page");
                }
                Err(e) => tracing::warn!(selector = %selector, error = %e, "Skipping mirror"),
            }
        }

        let mut submenus = Vec::new();
        for header in doc.query_within(root, HEADER_SELECTOR)? {
            match doc.next_element_sibling(header) {
                Some(panel) => submenus.push(Submenu { header, panel }),
                None => tracing::debug!(?header, "Submenu header has no panel, not bound"),
            }
        }

        let expanded = doc.has_class(root, "active");
        let mut active_submenu = submenus
            .iter()
            .position(|s| doc.has_class(s.panel, "show"))
            .map(SubmenuId);
        if active_submenu.is_some() && !expanded {
            tracing::warn!("Submenu open while sidebar collapsed, closing it");
            active_submenu = None;
        }

        let state = SidebarState {
            expanded,
            active_submenu,
            icon_only: doc.has_class(root, "close"),
            toggle_rotated: toggle.is_some_and(|t| doc.has_class(t, "rotate")),
        };
        tracing::debug!(
            submenus = submenus.len(),
            mirrors = mirrors.len(),
            expanded = state.expanded,
            "Sidebar mounted"
        );

        Ok(Self {
            root,
            body,
            toggle,
            menu_icon,
            mirrors,
            submenus,
            state,
        })
    }

    pub fn state(&self) -> &SidebarState {
        &self.state
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn toggle_control(&self) -> Option<NodeId> {
        self.toggle
    }

    pub fn menu_icon(&self) -> Option<NodeId> {
        self.menu_icon
    }

    pub fn submenu_count(&self) -> usize {
        self.submenus.len()
    }

    /// Header elements with their submenu ids, in document order.
    pub fn headers(&self) -> impl Iterator<Item = (SubmenuId, NodeId)> + '_ {
        self.submenus
            .iter()
            .enumerate()
            .map(|(i, s)| (SubmenuId(i), s.header))
    }

    pub fn toggle_sidebar(&mut self) -> Vec<DomOp> {
        self.state.toggle_sidebar();
        tracing::debug!(expanded = self.state.expanded, "Sidebar toggled");
        self.render()
    }

    /// Unknown ids are ignored.
    pub fn toggle_submenu(&mut self, id: SubmenuId) -> Vec<DomOp> {
        if id.0 >= self.submenus.len() {
            tracing::debug!(submenu = id.0, "No such submenu");
            return Vec::new();
        }
        self.state.toggle_submenu(id);
        tracing::debug!(submenu = id.0, active = ?self.state.active_submenu, "Submenu toggled");
        self.render()
    }

    /// Full visual state as class operations.
    pub fn render(&self) -> Vec<DomOp> {
        let s = &self.state;
        let mut ops = Vec::with_capacity(4 + self.mirrors.len() + 2 * self.submenus.len());
        ops.push(DomOp::class(self.root, "active", s.expanded));
        ops.push(DomOp::class(self.root, "close", s.icon_only));
        ops.push(DomOp::class(self.body, "active", s.expanded));
        for &mirror in &self.mirrors {
            ops.push(DomOp::class(mirror, "active", s.expanded));
        }
        for (i, submenu) in self.submenus.iter().enumerate() {
            let open = s.active_submenu == Some(SubmenuId(i));
            ops.push(DomOp::class(submenu.panel, "show", open));
            ops.push(DomOp::class(submenu.header, "rotate", open));
        }
        if let Some(toggle) = self.toggle {
            ops.push(DomOp::class(toggle, "rotate", s.toggle_rotated));
        }
        ops
    }
}
