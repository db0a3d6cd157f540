//! Terminal User Interface module.
//!
//! The home screen is two stacked lists: a horizontal strip of show cards
//! and a vertical list of recent episodes. Each row is tinted with a color
//! derived from its artwork.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `helpers` - Task spawning for library and artwork loads
//! - `render` - Layout and overlay dispatch
//! - `shows` - Show card strip widget
//! - `episodes` - Episode list widget
//! - `thumbnail` - Half-block cover rendering
//! - `status` - Status bar widget
//! - `help` - Keybinding overlay

mod episodes;
mod events;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod shows;
mod status;
mod thumbnail;

pub use loop_runner::{run, Action};
