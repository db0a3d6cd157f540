use crate::artwork::{reject_private_host, ArtworkLoader, ArtworkOutcome};
use crate::color::ColorCandidateSet;
use crate::config::Config;
use crate::keybindings::{Context, KeybindingRegistry};
use crate::library::{Episode, Library, Show};
use crate::list::{
    BindTicket, CompositeList, ListChange, ListItem, PendingLoad, RowSlots, SubscriptionId,
    TrailingAction,
};
use crate::palette::PaletteExtractor;
use crate::theme::{ColorPalette, ThemeVariant};
use anyhow::Result;
use reqwest::redirect::Policy;
use reqwest::Url;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;

/// How long a status message stays up.
const STATUS_TTL: Duration = Duration::from_secs(3);

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Follow at most 3 redirects and stop on loops or private hosts.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if let Err(reason) = check_redirect(attempt.url(), attempt.previous()) {
            return attempt.error(reason);
        }
        tracing::debug!(
            to = %attempt.url(),
            hop = attempt.previous().len() + 1,
            "Following artwork redirect"
        );
        attempt.follow()
    })
}

/// Decide whether a redirect to `next` may be followed after `previous` hops.
fn check_redirect(next: &Url, previous: &[Url]) -> Result<(), String> {
    if previous.len() >= 3 {
        return Err("Too many redirects (max 3)".to_string());
    }
    if previous.iter().any(|prev| prev.as_str() == next.as_str()) {
        return Err("Redirect loop detected".to_string());
    }
    reject_private_host(next).map_err(|e| e.to_string())
}

// ============================================================================
// Panes, Commands and Events
// ============================================================================

/// The two lists on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    Shows,
    Episodes,
}

impl Pane {
    pub fn other(self) -> Self {
        match self {
            Self::Shows => Self::Episodes,
            Self::Episodes => Self::Shows,
        }
    }

    pub fn context(self) -> Context {
        match self {
            Self::Shows => Context::ShowStrip,
            Self::Episodes => Context::Episodes,
        }
    }
}

/// Outbound requests. Playback, navigation and sharing happen elsewhere;
/// the home screen only emits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play {
        episode_id: i64,
        title: Arc<str>,
        media_url: Option<Arc<str>>,
    },
    OpenShow {
        show_id: i64,
        title: Arc<str>,
    },
    Share {
        url: Arc<str>,
        title: Arc<str>,
    },
    Refresh,
}

impl Command {
    /// Status bar echo.
    pub fn describe(&self) -> String {
        match self {
            Self::Play { title, .. } => format!("Playing: {title}"),
            Self::OpenShow { title, .. } => format!("Opening: {title}"),
            Self::Share { url, title } => format!("Shared: {title} ({url})"),
            Self::Refresh => "Reloading library...".to_string(),
        }
    }
}

/// Receives outbound commands.
pub trait CommandSink: Send {
    fn dispatch(&self, command: &Command);
}

/// Default sink: records commands in the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl CommandSink for LogSink {
    fn dispatch(&self, command: &Command) {
        tracing::info!(?command, "Command dispatched");
    }
}

/// Events from background tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// Library (re)load finished. `generation` guards against an older
    /// reload finishing after a newer one.
    LibraryLoaded {
        generation: u64,
        result: Result<Library, String>,
    },
    ArtworkLoaded {
        pane: Pane,
        ticket: BindTicket,
        outcome: ArtworkOutcome,
    },
    PaletteReady {
        pane: Pane,
        ticket: BindTicket,
        candidates: Option<ColorCandidateSet>,
    },
    /// The "See more" card was activated.
    ShowAllRequested,
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

pub struct App {
    pub config: Config,
    pub library: Library,
    pub library_path: PathBuf,
    pub library_generation: u64,
    pub loading: bool,

    pub shows: CompositeList<Show>,
    pub episodes: CompositeList<Episode>,
    pub show_rows: RowSlots,
    pub episode_rows: RowSlots,
    /// Every show is listed and the "See more" card is gone.
    pub show_all: bool,

    pub artwork: ArtworkLoader,
    pub palette: PaletteExtractor,

    pub theme_variant: ThemeVariant,
    pub theme: ColorPalette,
    pub keybindings: KeybindingRegistry,

    pub focus: Pane,
    pub selected_show: usize,
    pub selected_episode: usize,
    pub show_help: bool,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,

    event_tx: mpsc::Sender<AppEvent>,
    commands: Box<dyn CommandSink>,
    rows_dirty: Arc<AtomicBool>,
    subscriptions: Vec<(Pane, SubscriptionId)>,
}

impl App {
    pub fn new(
        config: Config,
        library_path: PathBuf,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .user_agent(concat!("castgrid/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let artwork = ArtworkLoader::new(
            http_client,
            config.artwork_timeout(),
            config.max_artwork_bytes,
        );

        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
            ThemeVariant::Dark
        });

        let mut keybindings = KeybindingRegistry::new();
        for warning in keybindings.apply_overrides(&config.keybindings) {
            tracing::warn!("{}", warning);
        }

        let mut app = Self {
            palette: PaletteExtractor::new(config.palette_max_colors),
            config,
            library: Library::default(),
            library_path,
            library_generation: 0,
            loading: false,
            shows: CompositeList::new(),
            episodes: CompositeList::new(),
            show_rows: RowSlots::new(),
            episode_rows: RowSlots::new(),
            show_all: false,
            artwork,
            theme_variant,
            theme: theme_variant.palette(),
            keybindings,
            focus: Pane::Shows,
            selected_show: 0,
            selected_episode: 0,
            show_help: false,
            status_message: None,
            needs_redraw: true,
            event_tx,
            commands: Box::new(LogSink),
            rows_dirty: Arc::new(AtomicBool::new(true)),
            subscriptions: Vec::new(),
        };
        app.rebuild_lists();
        Ok(app)
    }

    /// Route outbound commands somewhere other than the log.
    pub fn set_command_sink(&mut self, sink: impl CommandSink + 'static) {
        self.commands = Box::new(sink);
    }

    // ------------------------------------------------------------------
    // Observer lifecycle
    // ------------------------------------------------------------------

    /// Subscribe row invalidation to both lists. Idempotent.
    pub fn attach(&mut self) {
        if !self.subscriptions.is_empty() {
            return;
        }
        let observer = |dirty: Arc<AtomicBool>| {
            move |change: ListChange| {
                tracing::trace!(version = change.version, len = change.len, "Rows invalidated");
                dirty.store(true, Ordering::Release);
            }
        };
        let shows = self.shows.subscribe(observer(Arc::clone(&self.rows_dirty)));
        let episodes = self.episodes.subscribe(observer(Arc::clone(&self.rows_dirty)));
        self.subscriptions = vec![(Pane::Shows, shows), (Pane::Episodes, episodes)];
        self.rows_dirty.store(true, Ordering::Release);
        tracing::debug!("Attached list observers");
    }

    pub fn detach(&mut self) {
        for (pane, id) in self.subscriptions.drain(..) {
            match pane {
                Pane::Shows => self.shows.unsubscribe(id),
                Pane::Episodes => self.episodes.unsubscribe(id),
            };
        }
        tracing::debug!("Detached list observers");
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Re-sync row bindings if a list changed since the last call. Returns
    /// artwork loads to start.
    pub fn sync_rows(&mut self) -> Vec<(Pane, PendingLoad)> {
        if !self.rows_dirty.swap(false, Ordering::AcqRel) {
            return Vec::new();
        }
        let shows = self.show_rows.sync(&self.shows);
        let episodes = self.episode_rows.sync(&self.episodes);
        self.needs_redraw = true;
        shows
            .into_iter()
            .map(|load| (Pane::Shows, load))
            .chain(episodes.into_iter().map(|load| (Pane::Episodes, load)))
            .collect()
    }

    pub fn rows(&self, pane: Pane) -> &RowSlots {
        match pane {
            Pane::Shows => &self.show_rows,
            Pane::Episodes => &self.episode_rows,
        }
    }

    fn rows_mut(&mut self, pane: Pane) -> &mut RowSlots {
        match pane {
            Pane::Shows => &mut self.show_rows,
            Pane::Episodes => &mut self.episode_rows,
        }
    }

    // ------------------------------------------------------------------
    // Library
    // ------------------------------------------------------------------

    /// Start a reload; returns the generation the result must carry.
    pub fn begin_library_load(&mut self) -> u64 {
        self.library_generation = self.library_generation.wrapping_add(1);
        self.loading = true;
        self.rebuild_lists();
        self.library_generation
    }

    /// Apply a load result. Results from superseded reloads are dropped.
    pub fn finish_library_load(&mut self, generation: u64, result: Result<Library, String>) {
        if generation != self.library_generation {
            tracing::debug!(
                generation,
                current = self.library_generation,
                "Ignoring stale library load (generation mismatch)"
            );
            return;
        }
        self.loading = false;
        match result {
            Ok(library) => {
                let count = library.shows().len();
                self.library = library;
                self.rebuild_lists();
                self.set_status(if count == 0 {
                    Cow::Borrowed("Library is empty")
                } else {
                    Cow::Owned(format!("Loaded {count} shows"))
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Library load failed");
                self.rebuild_lists();
                self.set_status(format!("Library error: {e}"));
            }
        }
    }

    /// Rebuild both composite lists from the library and display settings.
    pub fn rebuild_lists(&mut self) {
        let shows = self.library.shows();
        let preview = self.config.show_preview_count.max(1);
        let truncated = !self.show_all && shows.len() > preview;

        let visible: Vec<Show> = if truncated {
            shows[..preview].to_vec()
        } else {
            shows.to_vec()
        };
        let placeholders = self.config.min_show_cards.saturating_sub(visible.len());

        self.shows.set_real_items(visible);
        self.shows.set_placeholder_count(placeholders);
        self.shows.set_trailing_action(truncated.then(|| {
            let tx = self.event_tx.clone();
            let label = format!("See all {}", shows.len());
            TrailingAction::new(label, move || {
                if let Err(e) = tx.try_send(AppEvent::ShowAllRequested) {
                    tracing::warn!(error = %e, "Failed to queue show-all request");
                }
            })
        }));

        let episodes = self.library.recent_episodes(self.config.recent_episode_limit);
        self.episodes.set_real_items(episodes);

        self.clamp_selections();
        self.needs_redraw = true;
    }

    pub fn reveal_all_shows(&mut self) {
        if self.show_all {
            return;
        }
        self.show_all = true;
        self.rebuild_lists();
    }

    // ------------------------------------------------------------------
    // Async results
    // ------------------------------------------------------------------

    /// Attach decoded artwork and start palette extraction for the row.
    pub fn on_artwork_loaded(&mut self, pane: Pane, ticket: BindTicket, outcome: ArtworkOutcome) {
        let rows = self.rows_mut(pane);
        if !rows.is_current(&ticket) {
            tracing::debug!(?pane, slot = ticket.slot, "Ignoring stale artwork (generation mismatch)");
            return;
        }
        if let Some(image) = outcome.image() {
            rows.attach_cover(&ticket, Arc::clone(image));
        }

        let tx = self.event_tx.clone();
        self.palette.extract(&outcome, move |candidates| {
            let event = AppEvent::PaletteReady {
                pane,
                ticket,
                candidates,
            };
            // Artwork tasks can keep the channel full; wait for room.
            match tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    tokio::spawn(async move {
                        if tx.send(event).await.is_err() {
                            tracing::debug!("Event channel closed before palette delivery");
                        }
                    });
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!("Event channel closed before palette delivery");
                }
            }
        });
    }

    pub fn on_palette_ready(
        &mut self,
        pane: Pane,
        ticket: BindTicket,
        candidates: Option<ColorCandidateSet>,
    ) {
        if self.rows_mut(pane).apply_candidates(&ticket, candidates.as_ref()) {
            self.needs_redraw = true;
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn clamp_selections(&mut self) {
        self.selected_show = self.selected_show.min(self.shows.len().saturating_sub(1));
        self.selected_episode = self
            .selected_episode
            .min(self.episodes.len().saturating_sub(1));
    }

    pub fn cycle_focus(&mut self) {
        self.focus = self.focus.other();
    }

    pub fn nav_left(&mut self) {
        if self.focus == Pane::Shows {
            self.selected_show = self.selected_show.saturating_sub(1);
        }
    }

    pub fn nav_right(&mut self) {
        if self.focus == Pane::Shows && self.selected_show + 1 < self.shows.len() {
            self.selected_show += 1;
        }
    }

    pub fn nav_up(&mut self) {
        match self.focus {
            Pane::Episodes if self.selected_episode == 0 => self.focus = Pane::Shows,
            Pane::Episodes => self.selected_episode -= 1,
            Pane::Shows => {}
        }
    }

    pub fn nav_down(&mut self) {
        match self.focus {
            Pane::Shows if !self.episodes.is_empty() => self.focus = Pane::Episodes,
            Pane::Episodes if self.selected_episode + 1 < self.episodes.len() => {
                self.selected_episode += 1;
            }
            _ => {}
        }
    }

    pub fn selected_show_item(&self) -> Option<ListItem<'_, Show>> {
        self.shows.kind_at(self.selected_show).ok()
    }

    pub fn selected_episode(&self) -> Option<&Episode> {
        match self.episodes.kind_at(self.selected_episode).ok()? {
            ListItem::Real(episode) => Some(episode),
            _ => None,
        }
    }

    /// Long-pressed show if any, else the selected real show.
    fn target_show(&self) -> Option<&Show> {
        if let Some(show) = self.shows.long_pressed_item() {
            return Some(show);
        }
        match self.selected_show_item()? {
            ListItem::Real(show) => Some(show),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Enter: open the show, run the trailing action, or play the episode.
    pub fn activate_selected(&mut self) {
        match self.focus {
            Pane::Shows => match self.selected_show_item() {
                Some(ListItem::Real(show)) => {
                    let command = Command::OpenShow {
                        show_id: show.id,
                        title: Arc::clone(&show.title),
                    };
                    self.dispatch(command);
                }
                Some(ListItem::TrailingAction(action)) => {
                    tracing::debug!(label = action.label(), "Running trailing action");
                    action.run();
                }
                Some(ListItem::Placeholder) | None => {}
            },
            Pane::Episodes => {
                if let Some(command) = self.selected_episode().map(play_command) {
                    self.dispatch(command);
                }
            }
        }
    }

    /// Play the latest episode of the target show, or open it when it has
    /// none. In the episode list, play the selected episode.
    pub fn play(&mut self) {
        let command = match self.focus {
            Pane::Shows => {
                let Some(show) = self.target_show() else {
                    return;
                };
                match self.library.latest_episode(show.id) {
                    Some(episode) => play_command(episode),
                    None => Command::OpenShow {
                        show_id: show.id,
                        title: Arc::clone(&show.title),
                    },
                }
            }
            Pane::Episodes => match self.selected_episode() {
                Some(episode) => play_command(episode),
                None => return,
            },
        };
        self.shows.clear_long_press();
        self.dispatch(command);
    }

    pub fn share(&mut self) {
        let target = match self.focus {
            Pane::Shows => self
                .target_show()
                .map(|s| (Some(Arc::clone(&s.feed_url)), Arc::clone(&s.title))),
            Pane::Episodes => self
                .selected_episode()
                .map(|e| (e.share_url().map(Arc::from), Arc::clone(&e.title))),
        };
        match target {
            Some((Some(url), title)) => {
                self.shows.clear_long_press();
                self.dispatch(Command::Share { url, title });
            }
            Some((None, _)) => self.set_status("Nothing to share for this episode"),
            None => {}
        }
    }

    pub fn long_press(&mut self) {
        if self.focus != Pane::Shows {
            return;
        }
        match self.shows.record_long_press(self.selected_show) {
            Ok(Some(show)) => {
                let msg = format!("Marked: {} (p to play, s to share)", show.title);
                self.set_status(msg);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Long-press on invalid position"),
        }
    }

    /// Send a command out and echo it in the status bar.
    pub fn dispatch(&mut self, command: Command) {
        self.commands.dispatch(&command);
        self.set_status(command.describe());
    }

    // ------------------------------------------------------------------
    // Theme and status
    // ------------------------------------------------------------------

    pub fn set_theme(&mut self, variant: ThemeVariant) {
        self.theme_variant = variant;
        self.theme = variant.palette();
        self.needs_redraw = true;
    }

    /// Returns the new theme's name.
    pub fn cycle_theme(&mut self) -> &'static str {
        let next = self.theme_variant.next();
        self.set_theme(next);
        next.name()
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Drop an expired status message. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        match &self.status_message {
            Some((_, at)) if at.elapsed() >= STATUS_TTL => {
                self.status_message = None;
                true
            }
            _ => false,
        }
    }
}

fn play_command(episode: &Episode) -> Command {
    Command::Play {
        episode_id: episode.id,
        title: Arc::clone(&episode.title),
        media_url: episode.media_url.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::ArtworkError;
    use crate::color::{derive_background_color, fallback_color};
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Command>>>);

    impl CommandSink for Recorder {
        fn dispatch(&self, command: &Command) {
            self.0.lock().unwrap().push(command.clone());
        }
    }

    fn library(shows: usize) -> Library {
        let mut toml = String::new();
        for i in 1..=shows {
            toml.push_str(&format!(
                "[[show]]\nid = {i}\ntitle = \"Show {i}\"\nfeed_url = \"https://feeds.example.com/{i}.xml\"\n"
            ));
            if i % 2 == 1 {
                toml.push_str(&format!(
                    "[[show.episode]]\nid = {}\ntitle = \"Ep {i}\"\npublished = \"2024-01-{:02}T00:00:00Z\"\nmedia_url = \"https://cdn.example.com/{i}.mp3\"\n",
                    i * 100,
                    i
                ));
            }
        }
        Library::from_toml_str(&toml, None).unwrap()
    }

    fn app_with(shows: usize) -> (App, mpsc::Receiver<AppEvent>, Recorder) {
        let (tx, rx) = mpsc::channel(64);
        let mut app = App::new(Config::default(), PathBuf::from("library.toml"), tx).unwrap();
        let recorder = Recorder::default();
        app.set_command_sink(recorder.clone());
        let generation = app.begin_library_load();
        app.finish_library_load(generation, Ok(library(shows)));
        (app, rx, recorder)
    }

    fn commands(recorder: &Recorder) -> Vec<Command> {
        recorder.0.lock().unwrap().clone()
    }

    #[test]
    fn few_shows_are_padded_with_placeholders() {
        let (app, _rx, _) = app_with(2);
        assert_eq!(app.shows.len(), 6);
        assert_eq!(app.shows.placeholder_count(), 4);
        assert!(app.shows.trailing_action().is_none());
    }

    #[test]
    fn loading_shows_only_placeholders() {
        let (tx, _rx) = mpsc::channel(4);
        let mut app = App::new(Config::default(), PathBuf::from("x"), tx).unwrap();
        app.begin_library_load();
        assert_eq!(app.shows.len(), 6);
        assert!(matches!(app.shows.kind_at(0), Ok(ListItem::Placeholder)));
        assert!(app.episodes.is_empty());
    }

    #[test]
    fn many_shows_get_see_more_card() {
        let (app, _rx, _) = app_with(10);
        assert_eq!(app.shows.len(), 9);
        let Ok(ListItem::TrailingAction(action)) = app.shows.kind_at(8) else {
            panic!("expected trailing action at 8");
        };
        assert_eq!(action.label(), "See all 10");
    }

    #[test]
    fn see_more_requests_and_reveals_all() {
        let (mut app, mut rx, _) = app_with(10);
        app.selected_show = 8;
        app.activate_selected();
        assert!(matches!(rx.try_recv(), Ok(AppEvent::ShowAllRequested)));

        app.reveal_all_shows();
        assert_eq!(app.shows.len(), 10);
        assert!(app.shows.trailing_action().is_none());
    }

    #[test]
    fn stale_library_load_is_ignored() {
        let (mut app, _rx, _) = app_with(1);
        let old = app.begin_library_load();
        let new = app.begin_library_load();
        app.finish_library_load(old, Ok(library(5)));
        assert!(app.loading);
        app.finish_library_load(new, Ok(library(3)));
        assert_eq!(app.shows.real_items().len(), 3);
    }

    #[test]
    fn enter_on_show_opens_it() {
        let (mut app, _rx, recorder) = app_with(3);
        app.activate_selected();
        assert_eq!(
            commands(&recorder),
            vec![Command::OpenShow {
                show_id: 1,
                title: Arc::from("Show 1")
            }]
        );
        assert!(app.status_message.is_some());
    }

    #[test]
    fn enter_on_placeholder_does_nothing() {
        let (mut app, _rx, recorder) = app_with(2);
        app.selected_show = 4;
        app.activate_selected();
        assert!(commands(&recorder).is_empty());
    }

    #[test]
    fn play_falls_back_to_open_without_episodes() {
        let (mut app, _rx, recorder) = app_with(2);
        app.play();
        app.selected_show = 1;
        app.play();
        let sent = commands(&recorder);
        assert!(matches!(&sent[0], Command::Play { episode_id: 100, .. }));
        assert!(matches!(&sent[1], Command::OpenShow { show_id: 2, .. }));
    }

    #[test]
    fn long_pressed_show_is_the_share_target() {
        let (mut app, _rx, recorder) = app_with(3);
        app.selected_show = 2;
        app.long_press();
        app.selected_show = 0;
        app.share();
        assert_eq!(
            commands(&recorder),
            vec![Command::Share {
                url: Arc::from("https://feeds.example.com/3.xml"),
                title: Arc::from("Show 3"),
            }]
        );
        assert!(app.shows.long_pressed_item().is_none());
    }

    #[test]
    fn long_press_on_placeholder_is_ignored() {
        let (mut app, _rx, _) = app_with(1);
        app.selected_show = 3;
        app.long_press();
        assert!(app.shows.long_pressed_item().is_none());
    }

    #[test]
    fn episode_enter_plays() {
        let (mut app, _rx, recorder) = app_with(3);
        app.nav_down();
        assert_eq!(app.focus, Pane::Episodes);
        app.activate_selected();
        // Newest first: show 3's episode.
        assert!(matches!(
            commands(&recorder)[0],
            Command::Play { episode_id: 300, .. }
        ));
    }

    #[test]
    fn navigation_is_clamped() {
        let (mut app, _rx, _) = app_with(2);
        app.nav_left();
        assert_eq!(app.selected_show, 0);
        for _ in 0..20 {
            app.nav_right();
        }
        assert_eq!(app.selected_show, 5);
        app.nav_down();
        app.nav_down();
        app.nav_down();
        assert_eq!(app.selected_episode, 0);
        app.nav_up();
        assert_eq!(app.focus, Pane::Shows);
    }

    #[test]
    fn attach_detach_controls_row_invalidation() {
        let (mut app, _rx, _) = app_with(2);
        app.attach();
        assert!(app.is_attached());
        let loads = app.sync_rows();
        assert_eq!(loads.iter().filter(|(p, _)| *p == Pane::Shows).count(), 2);
        assert!(app.sync_rows().is_empty());

        app.reveal_all_shows();
        // Same shows: the sync runs but nothing needs loading.
        assert!(app.sync_rows().is_empty());

        app.detach();
        assert!(!app.is_attached());
        assert_eq!(app.shows.observer_count(), 0);
        app.rebuild_lists();
        assert!(app.sync_rows().is_empty());
    }

    #[tokio::test]
    async fn failed_artwork_leaves_seeded_fallback() {
        let (mut app, mut rx, _) = app_with(1);
        app.attach();
        let loads = app.sync_rows();
        let (pane, load) = loads[0].clone();
        assert_eq!(pane, Pane::Shows);

        app.on_artwork_loaded(pane, load.ticket, ArtworkOutcome::Failed(ArtworkError::Missing));
        let Some(AppEvent::PaletteReady { ticket, candidates, .. }) = rx.recv().await else {
            panic!("expected palette event");
        };
        assert!(candidates.is_none());
        app.on_palette_ready(pane, ticket, candidates);

        let seed = "https://feeds.example.com/1.xml";
        assert_eq!(
            app.show_rows.get(0).unwrap().color(),
            Some(derive_background_color(None, seed))
        );
        assert_eq!(derive_background_color(None, seed), fallback_color(seed));
    }

    #[tokio::test]
    async fn decoded_artwork_attaches_cover_then_colors_row() {
        let (mut app, mut rx, _) = app_with(1);
        app.attach();
        let (pane, load) = app.sync_rows()[0].clone();
        let image = RgbaImage::from_pixel(6, 6, Rgba([30, 60, 220, 255]));
        app.on_artwork_loaded(pane, load.ticket, ArtworkOutcome::Decoded(Arc::new(image)));
        assert!(app.show_rows.get(0).unwrap().cover().is_some());

        let Some(AppEvent::PaletteReady { ticket, candidates, .. }) = rx.recv().await else {
            panic!("expected palette event");
        };
        assert!(candidates.is_some());
        app.on_palette_ready(pane, ticket, candidates);
        assert!(app.show_rows.get(0).unwrap().palette_applied());
    }

    #[test]
    fn reload_rebinds_rows_whose_artwork_or_feed_changed() {
        let parse = |toml: &str| Library::from_toml_str(toml, None).map_err(|e| e.to_string());
        let (tx, _rx) = mpsc::channel(64);
        let mut app = App::new(Config::default(), PathBuf::from("library.toml"), tx).unwrap();
        app.attach();

        let generation = app.begin_library_load();
        app.finish_library_load(
            generation,
            parse("[[show]]\nid = 1\ntitle = \"A\"\nfeed_url = \"https://a.example/feed\"\nartwork = \"https://cdn.example.com/old.png\"\n"),
        );
        let first = app.sync_rows();
        assert_eq!(first.len(), 1);

        let generation = app.begin_library_load();
        app.finish_library_load(
            generation,
            parse("[[show]]\nid = 1\ntitle = \"A\"\nfeed_url = \"https://zz.example/q\"\nartwork = \"https://cdn.example.com/new.png\"\n"),
        );
        let second = app.sync_rows();

        assert_eq!(second.len(), 1);
        let (pane, load) = &second[0];
        assert_eq!(*pane, Pane::Shows);
        assert_eq!(load.artwork.as_deref(), Some("https://cdn.example.com/new.png"));
        assert_eq!(
            app.show_rows.get(0).unwrap().color(),
            Some(derive_background_color(None, "https://zz.example/q"))
        );
        assert!(!app.show_rows.is_current(&first[0].1.ticket));
    }

    #[tokio::test]
    async fn palette_result_survives_a_full_channel() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut app = App::new(Config::default(), PathBuf::from("library.toml"), tx).unwrap();
        let generation = app.begin_library_load();
        app.finish_library_load(generation, Ok(library(1)));
        app.attach();
        let (pane, load) = app.sync_rows()[0].clone();

        app.event_tx.try_send(AppEvent::ShowAllRequested).unwrap();
        let image = RgbaImage::from_pixel(6, 6, Rgba([200, 40, 40, 255]));
        app.on_artwork_loaded(pane, load.ticket, ArtworkOutcome::Decoded(Arc::new(image)));

        assert!(matches!(rx.recv().await, Some(AppEvent::ShowAllRequested)));
        let next = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        let Ok(Some(AppEvent::PaletteReady { ticket, candidates, .. })) = next else {
            panic!("palette result was not delivered");
        };
        assert_eq!(ticket, load.ticket);
        app.on_palette_ready(pane, ticket, candidates);
        assert!(app.show_rows.get(0).unwrap().palette_applied());
    }

    #[test]
    fn redirects_to_private_hosts_are_refused() {
        let url = |s: &str| Url::parse(s).unwrap();
        let start = [url("https://cdn.example.com/a.png")];

        assert_eq!(check_redirect(&url("https://img.example.net/a.png"), &start), Ok(()));
        for target in [
            "http://127.0.0.1/cover.png",
            "http://169.254.169.254/latest/meta-data",
            "http://10.0.0.5/a.png",
            "http://localhost:8080/a.png",
            "http://[::1]/a.png",
        ] {
            assert!(check_redirect(&url(target), &start).is_err(), "{target}");
        }
    }

    #[test]
    fn redirect_limits_and_loops() {
        let url = |s: &str| Url::parse(s).unwrap();
        let hops: Vec<Url> = (0..3)
            .map(|i| url(&format!("https://cdn.example.com/{i}.png")))
            .collect();
        assert!(check_redirect(&url("https://cdn.example.com/next.png"), &hops).is_err());
        assert!(check_redirect(&hops[0], &hops[..2]).is_err());
        assert_eq!(check_redirect(&hops[2], &hops[..2]), Ok(()));
    }

    #[test]
    fn status_expires() {
        let (mut app, _rx, _) = app_with(1);
        app.set_status("hello");
        assert!(!app.clear_expired_status());
        app.status_message = Some((Cow::Borrowed("old"), Instant::now() - STATUS_TTL));
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }

    #[test]
    fn theme_cycles() {
        let (mut app, _rx, _) = app_with(1);
        assert_eq!(app.cycle_theme(), "Light");
        assert_eq!(app.theme_variant, ThemeVariant::Light);
    }
}
