//! Background task spawning shared by the input and event handlers.

use crate::app::{App, AppEvent, Pane};
use crate::library::Library;
use crate::list::PendingLoad;
use crate::util::catch_task_panic;
use tokio::sync::mpsc;

/// Reload the library file in the background.
///
/// The result carries the load generation so an older reload finishing late
/// cannot overwrite a newer one.
pub(super) fn spawn_library_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let generation = app.begin_library_load();
    let path = app.library_path.clone();
    let tx = event_tx.clone();

    tracing::debug!(path = %path.display(), generation, "Spawning library load");

    tokio::spawn(async move {
        let result = match catch_task_panic(Library::load(&path)).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(panic_msg) => {
                tracing::error!(error = %panic_msg, "Library load task panicked");
                Err(format!("load task failed: {panic_msg}"))
            }
        };
        if let Err(e) = tx.send(AppEvent::LibraryLoaded { generation, result }).await {
            tracing::warn!(error = %e, "Failed to send library (receiver dropped)");
        }
    });
}

/// Start one artwork load per freshly bound row.
pub(super) fn spawn_artwork_loads(
    app: &App,
    loads: Vec<(Pane, PendingLoad)>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    for (pane, PendingLoad { ticket, artwork }) in loads {
        let loader = app.artwork.clone();
        let tx = event_tx.clone();

        tokio::spawn(async move {
            let event = match catch_task_panic(loader.load(artwork.as_deref())).await {
                Ok(outcome) => AppEvent::ArtworkLoaded {
                    pane,
                    ticket,
                    outcome,
                },
                Err(error) => {
                    tracing::error!(error = %error, slot = ticket.slot, "Artwork task panicked");
                    AppEvent::TaskPanicked {
                        task: "artwork load",
                        error,
                    }
                }
            };
            if tx.send(event).await.is_err() {
                tracing::debug!(slot = ticket.slot, "Artwork result dropped (receiver closed)");
            }
        });
    }
}

/// Re-sync row bindings and start any loads they need.
pub(super) fn refresh_rows(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let loads = app.sync_rows();
    if !loads.is_empty() {
        tracing::debug!(count = loads.len(), "Starting artwork loads");
        spawn_artwork_loads(app, loads, event_tx);
    }
}
