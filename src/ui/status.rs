use crate::app::{App, Pane};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // Nothing to draw into
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.loading {
        Cow::Borrowed("Loading library...")
    } else if let Some(show) = app.shows.long_pressed_item() {
        Cow::Owned(format!("Marked: {} | [p]lay [s]hare [Esc]clear", show.title))
    } else {
        match app.focus {
            Pane::Shows => Cow::Borrowed(
                "[h/l]move [Enter]open [p]lay [s]hare [m]ark [Tab]episodes [?]help [q]uit",
            ),
            Pane::Episodes => {
                Cow::Borrowed("[j/k]move [Enter/p]lay [s]hare [Tab]shows [r]eload [?]help [q]uit")
            }
        }
    };

    f.render_widget(Paragraph::new(text).style(app.theme.status_bar), area);
}
