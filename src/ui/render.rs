//! Render functions for the TUI.
//!
//! The screen mirrors the page's layout: navbar on top, sidebar on the
//! left sized by its state, everything else in the main panel, and the
//! status bar at the bottom.

use crate::app::App;
use navtick::dom::NodeId;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::outline::outline;
use super::text::truncate_to_width;
use super::{help, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 12;

/// Sidebar widths for the expanded, default and icon-only states.
const SIDEBAR_EXPANDED: u16 = 30;
const SIDEBAR_DEFAULT: u16 = 20;
const SIDEBAR_ICON_ONLY: u16 = 10;

/// Rows the navbar may grow to when its menu is open.
const NAVBAR_MAX_HEIGHT: u16 = 8;

const NAVBAR_ID: &str = "navbar";

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let doc = app.page.document();
    let navbar = doc.get_element_by_id(NAVBAR_ID);
    let sidebar = app.page.sidebar().map(|s| s.root());

    let navbar_outline =
        navbar.map(|n| outline(app, doc.element(n).children(), area.width.saturating_sub(2)));
    let navbar_height = navbar_outline
        .as_ref()
        .map(|o| (o.lines.len() as u16).saturating_add(2).min(NAVBAR_MAX_HEIGHT))
        .unwrap_or(0);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(navbar_height),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    if let Some(outline) = navbar_outline {
        let inner_height = rows[0].height.saturating_sub(2);
        let title = format!(" {} ", truncate_to_width(doc.title(), usize::from(area.width / 2)));
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.panel_border)
            .title(title);
        let scroll = outline.scroll_for(inner_height);
        let paragraph = Paragraph::new(outline.lines)
            .block(block)
            .style(app.palette.navbar)
            .scroll((scroll, 0));
        f.render_widget(paragraph, rows[0]);
    }

    let sidebar_width = match app.page.sidebar().map(|s| s.state()) {
        Some(state) if state.expanded => SIDEBAR_EXPANDED,
        Some(state) if state.icon_only => SIDEBAR_ICON_ONLY,
        Some(_) => SIDEBAR_DEFAULT,
        None => 0,
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(sidebar_width), Constraint::Min(20)])
        .split(rows[1]);

    if let Some(root) = sidebar {
        render_sidebar(f, app, root, columns[0]);
    }

    let main_roots: Vec<NodeId> = doc
        .element(doc.body())
        .children()
        .iter()
        .copied()
        .filter(|&n| Some(n) != navbar && Some(n) != sidebar)
        .collect();
    render_main(f, app, &main_roots, columns[1]);

    status::render(f, app, rows[2]);

    if app.show_help {
        help::render(f, app);
    }

    if app.picker.is_some() {
        render_picker_overlay(f, app);
    }
}

fn render_sidebar(f: &mut Frame, app: &App, root: NodeId, area: Rect) {
    let expanded = app.page.sidebar().is_some_and(|s| s.state().expanded);
    let border = if expanded {
        app.palette.panel_border_active
    } else {
        app.palette.panel_border
    };
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let outline = outline(app, app.page.document().element(root).children(), inner_width);
    let scroll = outline.scroll_for(inner_height);
    let paragraph = Paragraph::new(outline.lines)
        .block(Block::default().borders(Borders::ALL).border_style(border))
        .style(app.palette.sidebar_item)
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

fn render_main(f: &mut Frame, app: &App, roots: &[NodeId], area: Rect) {
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let outline = outline(app, roots, inner_width);
    let scroll = outline.scroll_for(inner_height);
    let paragraph = Paragraph::new(outline.lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border),
        )
        .style(app.palette.body)
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

/// File path prompt shown while choosing a file for an input.
fn render_picker_overlay(f: &mut Frame, app: &App) {
    let Some(picker) = &app.picker else {
        return;
    };
    let area = f.area();
    let width = area.width.saturating_sub(8).min(80);
    let overlay = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + area.height / 2 - 2,
        width,
        4,
    );
    f.render_widget(Clear, overlay);

    let budget = usize::from(width.saturating_sub(4));
    let shown = tail_to_width(&picker.buffer, budget);
    let lines = vec![
        Line::from(format!("{shown}_")),
        Line::from("Enter to confirm (empty clears), Esc to cancel"),
    ];
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.prompt)
                .title(" File path "),
        )
        .style(app.palette.body);
    f.render_widget(paragraph, overlay);
}

/// The end of `s` that fits in `max_width` columns; paths are read from the right.
fn tail_to_width(s: &str, max_width: usize) -> &str {
    use unicode_width::UnicodeWidthChar;
    let mut width = 0;
    let mut start = s.len();
    for (idx, c) in s.char_indices().rev() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        start = idx;
    }
    &s[start..]
}
