use crate::app::{App, Pane};
use crate::color::fallback_color;
use crate::library::Episode;
use crate::list::RowSlot;
use crate::util::{display_width, format_duration, relative_age, sanitize_line, truncate_to_width};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Width of the tinted accent bar at the start of each row.
const ACCENT_WIDTH: usize = 2;

/// Render the recent episode list
pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Pane::Episodes;
    let now = Utc::now();
    // borders + accent + gap
    let text_width = usize::from(area.width.saturating_sub(2)).saturating_sub(ACCENT_WIDTH + 1);

    let items: Vec<ListItem> = if app.episodes.is_empty() {
        let msg = if app.loading {
            "Loading..."
        } else {
            "No episodes"
        };
        vec![ListItem::new(Span::styled(msg, app.theme.episode_meta))]
    } else {
        app.episodes
            .real_items()
            .iter()
            .enumerate()
            .map(|(i, episode)| {
                let selected = focused && i == app.selected_episode;
                episode_row(app, episode, i, selected, text_width, now)
            })
            .collect()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            app.theme.panel_border_focused
        } else {
            app.theme.panel_border
        })
        .title(format!(" Recent episodes ({}) ", app.episodes.len()));

    let mut state = ListState::default();
    if !app.episodes.is_empty() {
        state.select(Some(app.selected_episode));
    }
    f.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn episode_row(
    app: &App,
    episode: &Episode,
    position: usize,
    selected: bool,
    width: usize,
    now: DateTime<Utc>,
) -> ListItem<'static> {
    let color = app
        .episode_rows
        .get(position)
        .and_then(RowSlot::color)
        .unwrap_or_else(|| fallback_color(&episode.seed));

    let mut meta = vec![sanitize_line(&episode.show_title).into_owned()];
    if let Some(published) = episode.published {
        meta.push(relative_age(published, now));
    }
    if let Some(secs) = episode.duration_secs {
        meta.push(format_duration(secs));
    }
    let meta = format!("  {}", meta.join(" · "));

    // Title gets whatever the metadata leaves over
    let title_width = width.saturating_sub(display_width(&meta)).max(width / 2);
    let title = sanitize_line(&episode.title);
    let title = truncate_to_width(&title, title_width).into_owned();
    let meta = truncate_to_width(&meta, width.saturating_sub(display_width(&title))).into_owned();

    let title_style = if selected {
        app.theme.episode_selected
    } else {
        app.theme.episode_title
    };

    ListItem::new(Line::from(vec![
        Span::styled(" ".repeat(ACCENT_WIDTH), Style::default().bg(app.theme.tint(color))),
        Span::raw(" "),
        Span::styled(title, title_style),
        Span::styled(meta, app.theme.episode_meta),
    ]))
}
