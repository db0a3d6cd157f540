//! Horizontal strip of show cards.
//!
//! Real shows render as covers over a title bar tinted with the row's
//! derived color. Placeholder cards pad short libraries and the trailing
//! card is a button.

use crate::app::{App, Pane};
use crate::color::{darken, fallback_color};
use crate::library::Show;
use crate::list::{ListItem, RowSlot, TrailingAction};
use crate::util::{display_width, sanitize_line, truncate_to_width};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use super::thumbnail::halfblock_lines;

/// Rows taken by the strip, borders included.
pub(super) const STRIP_HEIGHT: u16 = 11;

const CARD_WIDTH: u16 = 18;
const COVER_ROWS: u16 = 4;

/// Render the show strip
pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Pane::Shows;
    let title = if app.loading {
        " Shows (loading...) ".to_string()
    } else {
        format!(" Shows ({}) ", app.library.shows().len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            app.theme.panel_border_focused
        } else {
            app.theme.panel_border
        })
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width < CARD_WIDTH || inner.height < 3 {
        return;
    }

    let visible = usize::from(inner.width / CARD_WIDTH);
    let first = first_visible(app.selected_show, visible);

    for (col, position) in (first..app.shows.len()).take(visible).enumerate() {
        let card = Rect {
            x: inner.x + col as u16 * CARD_WIDTH,
            y: inner.y,
            width: CARD_WIDTH,
            height: inner.height,
        };
        let selected = focused && position == app.selected_show;
        match app.shows.kind_at(position) {
            Ok(ListItem::Real(show)) => render_show_card(f, app, show, position, selected, card),
            Ok(ListItem::Placeholder) => render_placeholder(f, app, card),
            Ok(ListItem::TrailingAction(action)) => render_action(f, app, action, selected, card),
            Err(e) => tracing::warn!(error = %e, "Show strip out of sync with list"),
        }
    }
}

/// First card index that keeps `selected` on screen.
fn first_visible(selected: usize, visible: usize) -> usize {
    selected.saturating_sub(visible.saturating_sub(1))
}

fn render_show_card(
    f: &mut Frame,
    app: &App,
    show: &Show,
    position: usize,
    selected: bool,
    area: Rect,
) {
    let slot = app.show_rows.get(position);
    let color = slot
        .and_then(RowSlot::color)
        .unwrap_or_else(|| fallback_color(&show.feed_url));
    let marked = app
        .shows
        .long_pressed_item()
        .is_some_and(|s| s.id == show.id);

    let (border_type, border_style) = if selected {
        (
            BorderType::Thick,
            app.theme.card_border_focused.add_modifier(Modifier::BOLD),
        )
    } else {
        (
            BorderType::Plain,
            Style::default().fg(app.theme.tint(darken(color, 0.6))),
        )
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(COVER_ROWS),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let tinted = app.theme.on_tint(color);
    match slot.and_then(RowSlot::cover) {
        Some(cover) => {
            let base = app.theme.base;
            let backdrop = (base.r, base.g, base.b);
            let lines = halfblock_lines(cover, rows[0].width, rows[0].height, backdrop);
            f.render_widget(Paragraph::new(lines), rows[0]);
        }
        None => {
            // No cover yet: initial on the tint
            let initial: String = show.title.chars().take(1).collect();
            let pad = "\n".repeat(usize::from(rows[0].height.saturating_sub(1) / 2));
            f.render_widget(
                Paragraph::new(format!("{pad}{initial}"))
                    .alignment(Alignment::Center)
                    .style(tinted.add_modifier(Modifier::BOLD)),
                rows[0],
            );
        }
    }

    let width = usize::from(rows[1].width);
    let budget = width * usize::from(rows[1].height);
    let prefix = if marked { "● " } else { "" };
    let title = sanitize_line(&show.title);
    let title = truncate_to_width(&title, budget.saturating_sub(display_width(prefix)));
    let title = format!("{prefix}{title}");
    f.render_widget(
        Paragraph::new(title)
            .wrap(Wrap { trim: true })
            .style(tinted),
        rows[1],
    );

    let meta = match app.library.episode_count(show.id) {
        0 => "No episodes".to_string(),
        1 => "1 episode".to_string(),
        n => format!("{n} episodes"),
    };
    f.render_widget(
        Paragraph::new(truncate_to_width(&meta, width).into_owned()).style(app.theme.card_meta),
        rows[2],
    );
}

fn render_placeholder(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.card_placeholder);
    let inner = block.inner(area);
    f.render_widget(block, area);
    let pad = "\n".repeat(usize::from(inner.height / 2));
    f.render_widget(
        Paragraph::new(format!("{pad}· · ·"))
            .alignment(Alignment::Center)
            .style(app.theme.card_placeholder),
        inner,
    );
}

fn render_action(f: &mut Frame, app: &App, action: &TrailingAction, selected: bool, area: Rect) {
    let style = if selected {
        app.theme.action_button_selected
    } else {
        app.theme.action_button
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if selected {
            BorderType::Thick
        } else {
            BorderType::Rounded
        })
        .border_style(style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let label = truncate_to_width(action.label(), usize::from(inner.width.saturating_sub(2))).into_owned();
    let pad = "\n".repeat(usize::from(inner.height / 2));
    f.render_widget(
        Paragraph::new(format!("{pad}{label} ›"))
            .alignment(Alignment::Center)
            .style(style),
        inner,
    );
}
