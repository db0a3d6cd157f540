//! castgrid: a terminal podcast home screen.
//!
//! Shows and recent episodes are laid out as composite lists (real items,
//! placeholder padding and an optional trailing action), each row tinted
//! with a background color derived from its cover art or, failing that,
//! a stable color seeded from the show's feed URL.

pub mod app;
pub mod artwork;
pub mod color;
pub mod config;
pub mod keybindings;
pub mod library;
pub mod list;
pub mod palette;
pub mod theme;
pub mod ui;
pub mod util;
