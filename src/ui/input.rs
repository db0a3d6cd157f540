//! Input handling for the TUI.
//!
//! Resolves key presses through the keybinding registry and applies the
//! resulting action to the focused pane.

use crate::app::{App, AppEvent, Command};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::spawn_library_load;
use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    // Help overlay captures all keys while visible
    if app.show_help {
        if matches!(
            app.keybindings.action_for_key(code, modifiers, KbContext::Help),
            Some(KbAction::Back | KbAction::ShowHelp)
        ) {
            app.show_help = false;
        }
        return Action::Continue;
    }

    let Some(action) = app
        .keybindings
        .action_for_key(code, modifiers, app.focus.context())
    else {
        return Action::Continue;
    };
    tracing::trace!(?action, focus = ?app.focus, "Key action");

    match action {
        KbAction::Quit => return Action::Quit,
        KbAction::NavLeft => app.nav_left(),
        KbAction::NavRight => app.nav_right(),
        KbAction::NavUp => app.nav_up(),
        KbAction::NavDown => app.nav_down(),
        KbAction::CycleFocus => app.cycle_focus(),
        KbAction::Select => app.activate_selected(),
        KbAction::Play => app.play(),
        KbAction::Share => app.share(),
        KbAction::LongPress => app.long_press(),
        KbAction::Reload => {
            if app.loading {
                app.set_status("Library is already loading");
            } else {
                app.dispatch(Command::Refresh);
                spawn_library_load(app, event_tx);
            }
        }
        KbAction::CycleTheme => {
            let name = app.cycle_theme();
            app.set_status(format!("Theme: {name}"));
        }
        KbAction::ShowHelp => app.show_help = true,
        KbAction::Back => {
            if app.shows.long_pressed_item().is_some() {
                app.shows.clear_long_press();
                app.set_status("Mark cleared");
            }
        }
    }
    Action::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Pane;
    use crate::config::Config;
    use crate::library::Library;
    use std::path::PathBuf;

    fn app_with_library() -> (App, mpsc::Sender<AppEvent>) {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = App::new(Config::default(), PathBuf::from("library.toml"), tx.clone()).unwrap();
        let library = Library::from_toml_str(
            r#"
[[show]]
id = 1
title = "One"
feed_url = "https://f.example/1"
[[show.episode]]
id = 10
title = "First"
[[show]]
id = 2
title = "Two"
feed_url = "https://f.example/2"
"#,
            None,
        )
        .unwrap();
        let generation = app.begin_library_load();
        app.finish_library_load(generation, Ok(library));
        (app, tx)
    }

    fn press(app: &mut App, tx: &mpsc::Sender<AppEvent>, code: KeyCode) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx)
    }

    #[test]
    fn quit_key_quits() {
        let (mut app, tx) = app_with_library();
        assert!(matches!(press(&mut app, &tx, KeyCode::Char('q')), Action::Quit));
    }

    #[test]
    fn arrows_move_through_strip() {
        let (mut app, tx) = app_with_library();
        press(&mut app, &tx, KeyCode::Right);
        press(&mut app, &tx, KeyCode::Char('l'));
        assert_eq!(app.selected_show, 2);
        press(&mut app, &tx, KeyCode::Left);
        assert_eq!(app.selected_show, 1);
    }

    #[test]
    fn tab_switches_panes() {
        let (mut app, tx) = app_with_library();
        press(&mut app, &tx, KeyCode::Tab);
        assert_eq!(app.focus, Pane::Episodes);
        // Strip-only keys do nothing in the episode list
        press(&mut app, &tx, KeyCode::Char('m'));
        assert!(app.shows.long_pressed_item().is_none());
    }

    #[test]
    fn help_overlay_swallows_keys() {
        let (mut app, tx) = app_with_library();
        press(&mut app, &tx, KeyCode::Char('?'));
        assert!(app.show_help);
        assert!(matches!(press(&mut app, &tx, KeyCode::Right), Action::Continue));
        assert_eq!(app.selected_show, 0);
        // q closes help rather than quitting
        assert!(matches!(press(&mut app, &tx, KeyCode::Char('q')), Action::Continue));
        assert!(!app.show_help);
    }

    #[test]
    fn mark_then_escape_clears() {
        let (mut app, tx) = app_with_library();
        press(&mut app, &tx, KeyCode::Char('m'));
        assert_eq!(app.shows.long_pressed_item().map(|s| s.id), Some(1));
        press(&mut app, &tx, KeyCode::Esc);
        assert!(app.shows.long_pressed_item().is_none());
    }

    #[test]
    fn theme_key_cycles() {
        let (mut app, tx) = app_with_library();
        handle_input(&mut app, KeyCode::Char('T'), KeyModifiers::SHIFT, &tx);
        assert_eq!(app.theme_variant.name(), "Light");
    }

    #[tokio::test]
    async fn reload_starts_loading() {
        let (mut app, tx) = app_with_library();
        press(&mut app, &tx, KeyCode::Char('r'));
        assert!(app.loading);
        // Current shows stay up while the reload runs
        assert_eq!(app.shows.real_items().len(), 2);

        press(&mut app, &tx, KeyCode::Char('r'));
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert_eq!(msg, "Library is already loading");
    }
}
