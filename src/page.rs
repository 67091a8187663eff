//! A mounted page: the document plus every component attached to it.
//!
//! Each component mounts on its own. One that cannot find its anchors is
//! logged and left out; the rest of the page still works. All mutation
//! goes through a component's ops and [`commit`].

use chrono::TimeZone;
use std::fmt::Display;
use std::path::Path;

use crate::countdown::CountdownKind;
use crate::dom::{commit, Document, DomOp, NodeId};
use crate::error::ComponentError;
use crate::glue::{Glue, Trigger};
use crate::localize;
use crate::navbar::NavbarToggle;
use crate::preview::{PreviewError, Uploads};
use crate::sidebar::{Sidebar, DEFAULT_MIRRORS};
use crate::wizard::Wizard;

/// Classes that hide an element unless a companion class is present,
/// either on the element itself or on its parent.
struct DisplayRule {
    class: &'static str,
    shown_by: &'static str,
    on_parent: bool,
}

const DISPLAY_RULES: [DisplayRule; 3] = [
    DisplayRule {
        class: "sub-menu",
        shown_by: "show",
        on_parent: false,
    },
    DisplayRule {
        class: "step",
        shown_by: "current",
        on_parent: false,
    },
    DisplayRule {
        class: "profile-menu",
        shown_by: "active",
        on_parent: true,
    },
];

/// Mount-time settings.
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub mirror_selectors: Vec<String>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            mirror_selectors: DEFAULT_MIRRORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Result of activating an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Nothing is bound there, or its component is disabled.
    Ignored,
    Updated,
    /// The host should ask for a file for this input.
    PickFile(NodeId),
    /// A message for the user; the page did not change.
    Notice(String),
}

fn mount_or_warn<T>(component: &'static str, result: Result<T, ComponentError>) -> Option<T> {
    match result {
        Ok(mounted) => Some(mounted),
        Err(e) => {
            tracing::warn!(component, error = %e, "Component disabled");
            None
        }
    }
}

pub struct Page {
    doc: Document,
    sidebar: Option<Sidebar>,
    navbar: Option<NavbarToggle>,
    wizard: Option<Wizard>,
    uploads: Uploads,
    glue: Glue,
    countdowns: Vec<(CountdownKind, NodeId)>,
}

impl Page {
    /// Mount every component on `doc`, localizing timestamps into `tz`.
    pub fn mount<Tz>(mut doc: Document, options: &PageOptions, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let sidebar = mount_or_warn("sidebar", Sidebar::mount(&doc, &options.mirror_selectors));
        let navbar = mount_or_warn("navbar", NavbarToggle::mount(&doc));
        let wizard = mount_or_warn("wizard", Wizard::mount(&doc));
        let uploads = mount_or_warn("preview", Uploads::mount(&doc)).unwrap_or_default();

        if let Some(ops) = mount_or_warn("localize", localize::localize_all(&doc, tz)) {
            commit(&mut doc, ops);
        }
        if let Some(sidebar) = &sidebar {
            commit(&mut doc, sidebar.render());
        }
        if let Some(wizard) = &wizard {
            commit(&mut doc, wizard.render());
        }

        let countdowns = CountdownKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let display = doc.get_element_by_id(kind.display_id());
                if display.is_none() {
                    let e = ComponentError::missing("countdown", format!("#{}", kind.display_id()));
                    tracing::warn!(kind = kind.name(), error = %e, "Component disabled");
                }
                display.map(|node| (kind, node))
            })
            .collect();

        let glue = Glue::bind(
            &doc,
            sidebar.as_ref(),
            navbar.as_ref(),
            wizard.as_ref(),
            &uploads,
        );

        tracing::info!(
            title = %doc.title(),
            sidebar = sidebar.is_some(),
            navbar = navbar.is_some(),
            wizard = wizard.is_some(),
            bindings = glue.len(),
            "Page mounted"
        );

        Self {
            doc,
            sidebar,
            navbar,
            wizard,
            uploads,
            glue,
            countdowns,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn sidebar(&self) -> Option<&Sidebar> {
        self.sidebar.as_ref()
    }

    pub fn navbar(&self) -> Option<&NavbarToggle> {
        self.navbar.as_ref()
    }

    pub fn wizard(&self) -> Option<&Wizard> {
        self.wizard.as_ref()
    }

    /// Countdown kinds whose display element exists, with that element.
    pub fn countdowns(&self) -> &[(CountdownKind, NodeId)] {
        &self.countdowns
    }

    pub fn trigger_for(&self, node: NodeId) -> Option<Trigger> {
        self.glue.trigger_for(node)
    }

    /// Bound elements currently displayed, in document order.
    pub fn focus_targets(&self) -> Vec<NodeId> {
        self.glue
            .targets(&self.doc)
            .into_iter()
            .filter(|&n| self.is_displayed(n))
            .collect()
    }

    /// Whether `node` and all its ancestors would be displayed.
    pub fn is_displayed(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if !self.is_self_displayed(n) {
                return false;
            }
            current = self.doc.element(n).parent();
        }
        true
    }

    fn is_self_displayed(&self, node: NodeId) -> bool {
        let el = self.doc.element(node);
        if el.attr("hidden").is_some() {
            return false;
        }
        DISPLAY_RULES.iter().all(|rule| {
            if !el.has_class(rule.class) {
                return true;
            }
            let holder = if rule.on_parent { el.parent() } else { Some(node) };
            holder.is_some_and(|h| self.doc.has_class(h, rule.shown_by))
        })
    }

    /// Activate (click) an element.
    pub fn activate(&mut self, node: NodeId) -> Activation {
        match self.glue.trigger_for(node) {
            Some(trigger) => self.dispatch(trigger),
            None => Activation::Ignored,
        }
    }

    pub fn dispatch(&mut self, trigger: Trigger) -> Activation {
        let ops = match trigger {
            Trigger::ToggleSidebar => self.sidebar.as_mut().map(Sidebar::toggle_sidebar),
            Trigger::ToggleSubmenu(id) => self.sidebar.as_mut().map(|s| s.toggle_submenu(id)),
            Trigger::ToggleProfile => self.navbar.as_mut().map(NavbarToggle::toggle),
            Trigger::WizardNext => match self.wizard.as_mut() {
                Some(wizard) => match wizard.next(&self.doc) {
                    Ok(ops) => Some(ops),
                    Err(e) => return Activation::Notice(e.to_string()),
                },
                None => None,
            },
            Trigger::WizardPrev => self.wizard.as_mut().map(Wizard::prev),
            Trigger::WizardSubmit => match self.wizard.as_mut() {
                Some(wizard) if !wizard.is_submitted() => Some(wizard.submit()),
                _ => None,
            },
            Trigger::Check(node) => Some(self.check_ops(node)),
            Trigger::OpenFilePicker(input) => return Activation::PickFile(input),
        };
        match ops {
            Some(ops) => {
                commit(&mut self.doc, ops);
                Activation::Updated
            }
            None => Activation::Ignored,
        }
    }

    fn check_ops(&self, node: NodeId) -> Vec<DomOp> {
        let checked = self.doc.has_attr(node, "checked");
        if self.doc.attr(node, "type") != Some("radio") {
            return vec![DomOp::attr(node, "checked", (!checked).then(String::new))];
        }
        if checked {
            return Vec::new();
        }
        let mut ops = Vec::new();
        if let Some(name) = self.doc.attr(node, "name") {
            let group = format!("input[type=radio][name=\"{name}\"]");
            match self.doc.query_selector_all(&group) {
                Ok(radios) => ops.extend(
                    radios
                        .into_iter()
                        .filter(|&r| r != node)
                        .map(|r| DomOp::attr(r, "checked", None)),
                ),
                Err(e) => tracing::warn!(error = %e, "Radio group lookup failed"),
            }
        }
        ops.push(DomOp::attr(node, "checked", Some(String::new())));
        ops
    }

    /// A file was chosen (or the choice cleared) for `input`.
    ///
    /// On error the preview is left exactly as it was.
    pub fn choose_file(&mut self, input: NodeId, file: Option<&Path>) -> Result<(), PreviewError> {
        let ops = self.uploads.select(input, file)?;
        commit(&mut self.doc, ops);
        Ok(())
    }

    /// Write countdown text into its display element.
    pub fn set_countdown_text(&mut self, kind: CountdownKind, text: String) {
        if let Some(&(_, node)) = self.countdowns.iter().find(|(k, _)| *k == kind) {
            commit(&mut self.doc, [DomOp::text(node, text)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DEFAULT_PAGE;
    use crate::sidebar::SubmenuId;
    use chrono::Utc;

    fn bundled() -> Page {
        Page::mount(
            Document::from_toml(DEFAULT_PAGE).unwrap(),
            &PageOptions::default(),
            &Utc,
        )
    }

    fn by_id(page: &Page, id: &str) -> NodeId {
        page.document().get_element_by_id(id).unwrap()
    }

    #[test]
    fn test_bundled_page_mounts_everything() {
        let page = bundled();
        assert!(page.sidebar().is_some());
        assert!(page.navbar().is_some());
        assert!(page.wizard().is_some());
        assert_eq!(page.countdowns().len(), 2);
    }

    #[test]
    fn test_timestamps_localized_on_mount() {
        let page = bundled();
        let doc = page.document();
        let stamps = doc.query_selector_all("[data-utc-timestamp]").unwrap();
        assert_eq!(doc.text(stamps[0]), "Dec 9, 2025, 03:45 PM");
    }

    #[test]
    fn test_activate_submenu_header() {
        let mut page = bundled();
        let header = page.document().query_selector(".dropdown-btn").unwrap().unwrap();
        assert_eq!(page.activate(header), Activation::Updated);
        let state = page.sidebar().unwrap().state();
        assert_eq!(state.active_submenu, Some(SubmenuId(0)));
        assert!(state.expanded);
    }

    #[test]
    fn test_unbound_element_is_ignored() {
        let mut page = bundled();
        let body = page.document().body();
        assert_eq!(page.activate(body), Activation::Ignored);
    }

    #[test]
    fn test_profile_toggle_is_independent() {
        let mut page = bundled();
        let before = page.sidebar().unwrap().state().clone();
        page.activate(by_id(&page, "profile-button"));
        assert!(page.navbar().unwrap().is_active());
        assert_eq!(page.sidebar().unwrap().state(), &before);
    }

    #[test]
    fn test_radio_group_is_exclusive() {
        let mut page = bundled();
        let radios = page.document().query_selector_all("input[type=radio]").unwrap();
        page.activate(radios[0]);
        page.activate(radios[1]);
        assert!(!page.document().has_attr(radios[0], "checked"));
        assert!(page.document().has_attr(radios[1], "checked"));
        // Clicking a checked radio keeps it checked.
        page.activate(radios[1]);
        assert!(page.document().has_attr(radios[1], "checked"));
    }

    #[test]
    fn test_checkbox_flips() {
        let mut page = bundled();
        let checkbox = page
            .document()
            .query_selector("input[type=checkbox]")
            .unwrap()
            .unwrap();
        page.activate(checkbox);
        assert!(page.document().has_attr(checkbox, "checked"));
        page.activate(checkbox);
        assert!(!page.document().has_attr(checkbox, "checked"));
    }

    #[test]
    fn test_wizard_validation_notice() {
        let mut page = bundled();
        let next = page.wizard().unwrap().next_button();
        assert_eq!(
            page.activate(next),
            Activation::Notice("Please choose if you are a Student or a CIO.".into())
        );
    }

    #[test]
    fn test_submit_only_goes_out_once() {
        let mut page = bundled();
        let submit = page.wizard().unwrap().submit_button();
        assert_eq!(page.activate(submit), Activation::Updated);
        assert!(page.document().has_attr(submit, "disabled"));

        assert_eq!(page.activate(submit), Activation::Ignored);
        assert!(page.wizard().unwrap().is_submitted());
    }

    #[test]
    fn test_avatar_click_asks_for_file() {
        let mut page = bundled();
        let image = by_id(&page, "pfpImage");
        let input = by_id(&page, "pfpInput");
        assert_eq!(page.activate(image), Activation::PickFile(input));
    }

    #[test]
    fn test_display_rules() {
        let mut page = bundled();
        let panel = page.document().query_selector(".sub-menu").unwrap().unwrap();
        let menu = page.document().query_selector(".profile-menu").unwrap().unwrap();
        assert!(!page.is_displayed(panel));
        assert!(!page.is_displayed(menu));

        let header = page.document().query_selector(".dropdown-btn").unwrap().unwrap();
        page.activate(header);
        page.activate(by_id(&page, "profile-button"));
        assert!(page.is_displayed(panel));
        assert!(page.is_displayed(menu));
    }

    #[test]
    fn test_focus_skips_hidden_steps() {
        let page = bundled();
        let interests = page
            .document()
            .query_selector("input[type=checkbox]")
            .unwrap()
            .unwrap();
        assert!(!page.focus_targets().contains(&interests));
    }

    #[test]
    fn test_set_countdown_text() {
        let mut page = bundled();
        page.set_countdown_text(CountdownKind::Weekly, "01:00:00:00".into());
        let display = by_id(&page, "weekly-countdown");
        assert_eq!(page.document().text(display), "01:00:00:00");
    }
}
