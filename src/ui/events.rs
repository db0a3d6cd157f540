//! Application event handling.
//!
//! Applies background task results (library loads, artwork, palettes) to
//! the application state.

use crate::app::{App, AppEvent};

/// Handle one event from a background task.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::LibraryLoaded { generation, result } => {
            app.finish_library_load(generation, result);
        }
        AppEvent::ArtworkLoaded {
            pane,
            ticket,
            outcome,
        } => {
            app.on_artwork_loaded(pane, ticket, outcome);
            app.needs_redraw = true;
        }
        AppEvent::PaletteReady {
            pane,
            ticket,
            candidates,
        } => {
            app.on_palette_ready(pane, ticket, candidates);
        }
        AppEvent::ShowAllRequested => {
            tracing::debug!("Revealing all shows");
            app.reveal_all_shows();
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.set_status(format!("Internal error in {task}"));
        }
    }
}
