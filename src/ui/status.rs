use crate::app::App;
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

const HINTS: &str = "[Tab]focus [Enter]activate [s]idebar [1-9]submenu [p]rofile [n/b]form [r]eload [?]help [q]uit";
const PICKER_HINTS: &str = "Type a file path | ENTER confirm | ESC cancel";

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // Status bar needs at least 1 char width to be meaningful
    if area.width < 1 || area.height < 1 {
        return;
    }

    let (text, style): (Cow<'_, str>, _) = if let Some((msg, _)) = &app.status_message {
        (Cow::Borrowed(msg.as_ref()), app.palette.status_notice)
    } else if app.picker.is_some() {
        (Cow::Borrowed(PICKER_HINTS), app.palette.status_bar)
    } else {
        (Cow::Borrowed(HINTS), app.palette.status_bar)
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}
