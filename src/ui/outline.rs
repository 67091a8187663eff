//! Element tree to styled terminal lines.
//!
//! Each displayed element with something to show becomes one line,
//! indented by depth. Hidden subtrees (per the page's display rules) are
//! skipped entirely.

use crate::app::App;
use crate::theme::ColorPalette;
use navtick::countdown::CountdownKind;
use navtick::dom::{Document, Element, NodeId};
use ratatui::{
    style::Style,
    text::{Line, Span},
};

use super::text::{sanitize, truncate_to_width};

const INDENT: usize = 2;
const FOCUS_MARK: &str = "> ";

/// Rendered lines plus the index of the focused element's line, if shown.
pub(super) struct Outline {
    pub lines: Vec<Line<'static>>,
    pub focused: Option<usize>,
}

impl Outline {
    /// First line to show so the focused line stays inside `height` rows.
    pub fn scroll_for(&self, height: u16) -> u16 {
        let height = usize::from(height);
        let top = match self.focused {
            Some(idx) if height > 0 && idx >= height => idx + 1 - height,
            _ => 0,
        };
        u16::try_from(top).unwrap_or(u16::MAX)
    }
}

/// Lines for the subtrees under `roots`, each root at depth 0.
pub(super) fn outline(app: &App, roots: &[NodeId], width: u16) -> Outline {
    let mut out = Outline {
        lines: Vec::new(),
        focused: None,
    };
    for &root in roots {
        walk(app, root, 0, usize::from(width), &mut out);
    }
    out
}

fn walk(app: &App, node: NodeId, depth: usize, width: usize, out: &mut Outline) {
    if !app.page.is_displayed(node) {
        return;
    }
    let doc = app.page.document();
    let el = doc.element(node);

    let mut child_depth = depth;
    if let Some((text, style)) = label(doc, el, &app.palette) {
        if app.focused == Some(node) {
            out.focused = Some(out.lines.len());
        }
        out.lines.push(line(app, node, depth, width, &text, style));
        child_depth += 1;
    }
    for &child in el.children() {
        walk(app, child, child_depth, width, out);
    }
}

fn line(
    app: &App,
    node: NodeId,
    depth: usize,
    width: usize,
    label: &str,
    style: Style,
) -> Line<'static> {
    let focused = app.focused == Some(node);
    let mark = if focused { FOCUS_MARK } else { "" };
    let indent = " ".repeat((depth * INDENT).min(width / 2));
    let budget = width.saturating_sub(indent.len() + mark.len());
    let text = truncate_to_width(&sanitize(label), budget).into_owned();
    let style = if focused { app.palette.focused } else { style };
    Line::from(vec![
        Span::raw(indent),
        Span::styled(format!("{mark}{text}"), style),
    ])
}

/// What to show for an element, if anything.
pub(super) fn label(
    doc: &Document,
    el: &Element,
    palette: &ColorPalette,
) -> Option<(String, Style)> {
    let text = el.text();

    if let Some(kind) = CountdownKind::ALL
        .into_iter()
        .find(|k| el.id() == Some(k.display_id()))
    {
        let shown = if text.is_empty() { "--:--:--" } else { text };
        return Some((format!("{} reset in {}", kind.name(), shown), palette.countdown));
    }

    match el.tag() {
        "input" => Some(input_label(el, palette)),
        "button" if el.has_class("dropdown-btn") => {
            if el.has_class("rotate") {
                Some((format!("▾ {text}"), palette.sidebar_header_open))
            } else {
                Some((format!("▸ {text}"), palette.sidebar_item))
            }
        }
        "button" => {
            let style = if el.attr("disabled").is_some() {
                palette.control_disabled
            } else {
                palette.control
            };
            Some((format!("[{text}]"), style))
        }
        "img" => {
            let src = el.attr("src").unwrap_or_default();
            Some((format!("[img] {} ({})", text, describe_src(src)), palette.control))
        }
        "time" => Some((text.to_string(), palette.timestamp)),
        "h1" | "h2" | "h3" => Some((text.to_string(), palette.heading)),
        "li" if el.parent().is_some_and(|p| doc.has_class(p, "sub-menu")) => {
            Some((format!("- {text}"), palette.submenu_item))
        }
        "li" if el.parent().is_some_and(|p| doc.has_class(p, "profile-menu")) => {
            Some((format!("- {text}"), palette.navbar_menu))
        }
        _ if el.style("background-image").is_some() => {
            let preview = el.style("background-image").map(describe_src).unwrap_or_default();
            Some((format!("[preview] {preview}"), palette.body))
        }
        _ if el.attr("aria-hidden") == Some("true") => None,
        _ if !text.is_empty() => {
            let style = if el.parent() == Some(doc.body()) {
                palette.heading
            } else {
                palette.body
            };
            Some((text.to_string(), style))
        }
        _ => None,
    }
}

fn input_label(el: &Element, palette: &ColorPalette) -> (String, Style) {
    let text = el.text();
    let checked = el.attr("checked").is_some();
    match el.attr("type").unwrap_or("text") {
        "radio" => {
            let mark = if checked { "(*)" } else { "( )" };
            let style = if checked { palette.control_checked } else { palette.control };
            (format!("{mark} {text}"), style)
        }
        "checkbox" => {
            let mark = if checked { "[x]" } else { "[ ]" };
            let style = if checked { palette.control_checked } else { palette.control };
            (format!("{mark} {text}"), style)
        }
        "file" => {
            let value = el.attr("value").filter(|v| !v.is_empty());
            let chosen = value.unwrap_or("no file chosen");
            let label = if text.is_empty() { "Choose file" } else { text };
            (format!("[{label}: {chosen}]"), palette.control)
        }
        other => (format!("[{other}] {text}"), palette.control),
    }
}

/// Short form of an image source: data URLs show their type and size.
fn describe_src(src: &str) -> String {
    let inner = src
        .strip_prefix("url('")
        .and_then(|s| s.strip_suffix("')"))
        .unwrap_or(src);
    match inner.strip_prefix("data:") {
        Some(rest) => {
            let mime = rest.split(';').next().unwrap_or("unknown");
            format!("{mime}, {} bytes encoded", rest.len())
        }
        None => inner.to_string(),
    }
}
