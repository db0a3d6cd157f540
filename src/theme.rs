//! Theme system for the TUI.
//!
//! Semantic roles map to ratatui `Style`s per [`ThemeVariant`]. Derived row
//! colors are translucent, so each palette also names the opaque base they
//! are composited onto before reaching the terminal.

use crate::color::{Rgb, Rgba};
use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

#[derive(Debug, Clone)]
pub struct ColorPalette {
    /// Opaque color derived backgrounds are blended over.
    pub base: Rgb,

    // -- Show strip --
    pub card_border_focused: Style,
    pub card_placeholder: Style,
    pub card_meta: Style,
    pub action_button: Style,
    pub action_button_selected: Style,

    // -- Episode list --
    pub episode_title: Style,
    pub episode_meta: Style,
    pub episode_selected: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub help_key: Style,
    pub help_text: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            base: Rgb::from_hex(0x1C1C1C),

            card_border_focused: Style::default().fg(Color::White),
            card_placeholder: Style::default().fg(Color::DarkGray),
            card_meta: Style::default().fg(Color::Gray),
            action_button: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            action_button_selected: Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            episode_title: Style::default().add_modifier(Modifier::BOLD),
            episode_meta: Style::default().fg(Color::DarkGray),
            episode_selected: Style::default().bg(Color::DarkGray).fg(Color::White),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
            help_key: Style::default().fg(Color::Yellow),
            help_text: Style::default(),
        }
    }

    fn light() -> Self {
        Self {
            base: Rgb::from_hex(0xF4F4F4),

            card_border_focused: Style::default().fg(Color::Black),
            card_placeholder: Style::default().fg(Color::Gray),
            card_meta: Style::default().fg(Color::DarkGray),
            action_button: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            action_button_selected: Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            episode_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            episode_meta: Style::default().fg(Color::DarkGray),
            episode_selected: Style::default().bg(Color::Blue).fg(Color::White),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
            help_key: Style::default().fg(Color::Magenta),
            help_text: Style::default().fg(Color::Black),
        }
    }

    /// Terminal color for a translucent derived color.
    pub fn tint(&self, color: Rgba) -> Color {
        to_color(color.composite_over(self.base))
    }

    /// Style for text painted on a derived background.
    pub fn on_tint(&self, color: Rgba) -> Style {
        let bg = color.composite_over(self.base);
        Style::default().bg(to_color(bg)).fg(text_on(bg))
    }
}

pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Black or white, whichever reads better on `bg`.
pub fn text_on(bg: Rgb) -> Color {
    // ITU-R BT.601 luma
    let luma = 299 * bg.r as u32 + 587 * bg.g as u32 + 114 * bg.b as u32;
    if luma > 150_000 {
        Color::Black
    } else {
        Color::White
    }
}
