//! Read-only podcast library.
//!
//! Shows and their episodes come from a `library.toml` file maintained by
//! whatever syncs subscriptions. This module only reads it: the UI consumes
//! the ordered show and episode sequences and never writes back.

mod file;

use crate::list::{Identified, Themed};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Largest library file accepted (4 MiB).
const MAX_LIBRARY_SIZE: u64 = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Failed to read library: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid library file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate {kind} id {id} in library")]
    DuplicateId { kind: &'static str, id: i64 },

    #[error("Library file too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },
}

// ============================================================================
// Entities
// ============================================================================

/// A subscribed show.
#[derive(Debug, Clone, PartialEq)]
pub struct Show {
    pub id: i64,
    pub title: Arc<str>,
    /// Canonical feed URL; also the fallback color seed.
    pub feed_url: Arc<str>,
    pub artwork: Option<Arc<str>>,
    pub link: Option<Arc<str>>,
}

impl Identified for Show {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Themed for Show {
    fn color_seed(&self) -> &str {
        &self.feed_url
    }

    fn artwork(&self) -> Option<&str> {
        self.artwork.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub id: i64,
    pub show_id: i64,
    pub show_title: Arc<str>,
    pub title: Arc<str>,
    pub published: Option<DateTime<Utc>>,
    pub media_url: Option<Arc<str>>,
    pub link: Option<Arc<str>>,
    /// Episode artwork, or the show's when the episode has none.
    pub artwork: Option<Arc<str>>,
    pub duration_secs: Option<u64>,
    /// The owning show's feed URL.
    pub seed: Arc<str>,
}

impl Episode {
    /// URL handed to the share sheet: media first, then the web page.
    pub fn share_url(&self) -> Option<&str> {
        self.media_url.as_deref().or(self.link.as_deref())
    }
}

impl Identified for Episode {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Themed for Episode {
    fn color_seed(&self) -> &str {
        &self.seed
    }

    fn artwork(&self) -> Option<&str> {
        self.artwork.as_deref()
    }
}

// ============================================================================
// Library
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Library {
    shows: Vec<Show>,
    /// Per show, in file order.
    episodes: HashMap<i64, Vec<Episode>>,
}

impl Library {
    /// Read and validate a library file.
    ///
    /// A missing file is an empty library. Relative artwork paths are
    /// resolved against the file's directory.
    pub async fn load(path: &Path) -> Result<Self, LibraryError> {
        let content = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.len() > MAX_LIBRARY_SIZE => {
                return Err(LibraryError::TooLarge {
                    size: meta.len(),
                    max: MAX_LIBRARY_SIZE,
                });
            }
            Ok(_) => tokio::fs::read_to_string(path).await,
            Err(e) => Err(e),
        };

        let content = match content {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No library file, starting empty");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let library = Self::from_toml_str(&content, path.parent())?;
        tracing::info!(
            path = %path.display(),
            shows = library.shows.len(),
            episodes = library.episodes.values().map(Vec::len).sum::<usize>(),
            "Loaded library"
        );
        Ok(library)
    }

    /// Parse library TOML. `base_dir` anchors relative artwork paths.
    pub fn from_toml_str(content: &str, base_dir: Option<&Path>) -> Result<Self, LibraryError> {
        let raw: file::LibraryFile = toml::from_str(content)?;
        let resolve = |artwork: Option<String>| -> Option<Arc<str>> {
            let artwork = artwork.filter(|a| !a.trim().is_empty())?;
            Some(Arc::from(resolve_artwork(&artwork, base_dir).as_str()))
        };

        let mut show_ids = HashSet::new();
        let mut episode_ids = HashSet::new();
        let mut shows = Vec::with_capacity(raw.show.len());
        let mut episodes = HashMap::new();

        for raw_show in raw.show {
            if !show_ids.insert(raw_show.id) {
                return Err(LibraryError::DuplicateId {
                    kind: "show",
                    id: raw_show.id,
                });
            }
            let show = Show {
                id: raw_show.id,
                title: Arc::from(raw_show.title.as_str()),
                feed_url: Arc::from(raw_show.feed_url.as_str()),
                artwork: resolve(raw_show.artwork),
                link: raw_show.link.map(Arc::from),
            };

            let mut show_episodes = Vec::with_capacity(raw_show.episode.len());
            for raw_episode in raw_show.episode {
                if !episode_ids.insert(raw_episode.id) {
                    return Err(LibraryError::DuplicateId {
                        kind: "episode",
                        id: raw_episode.id,
                    });
                }
                show_episodes.push(Episode {
                    id: raw_episode.id,
                    show_id: show.id,
                    show_title: Arc::clone(&show.title),
                    title: Arc::from(raw_episode.title.as_str()),
                    published: raw_episode.published,
                    media_url: raw_episode.media_url.map(Arc::from),
                    link: raw_episode.link.map(Arc::from),
                    artwork: resolve(raw_episode.artwork).or_else(|| show.artwork.clone()),
                    duration_secs: raw_episode.duration_secs,
                    seed: Arc::clone(&show.feed_url),
                });
            }

            episodes.insert(show.id, show_episodes);
            shows.push(show);
        }

        Ok(Self { shows, episodes })
    }

    /// Shows in file order.
    pub fn shows(&self) -> &[Show] {
        &self.shows
    }

    pub fn episode_count(&self, show_id: i64) -> usize {
        self.episodes.get(&show_id).map_or(0, Vec::len)
    }

    /// Newest episode of a show. Undated episodes lose to dated ones; among
    /// equals the one listed first wins.
    pub fn latest_episode(&self, show_id: i64) -> Option<&Episode> {
        self.episodes
            .get(&show_id)?
            .iter()
            .rev()
            .max_by_key(|e| e.published)
    }

    /// Up to `limit` episodes across all shows, newest first.
    pub fn recent_episodes(&self, limit: usize) -> Vec<Episode> {
        let mut all: Vec<&Episode> = self
            .shows
            .iter()
            .filter_map(|s| self.episodes.get(&s.id))
            .flatten()
            .collect();
        // Stable sort keeps file order among equal dates.
        all.sort_by(|a, b| b.published.cmp(&a.published));
        all.into_iter().take(limit).cloned().collect()
    }
}

/// Anchor a relative local path at `base_dir`; URLs and absolute paths pass
/// through unchanged.
fn resolve_artwork(artwork: &str, base_dir: Option<&Path>) -> String {
    let trimmed = artwork.trim();
    if trimmed.contains("://") {
        return trimmed.to_owned();
    }
    let path = PathBuf::from(trimmed);
    match base_dir {
        Some(base) if path.is_relative() => base.join(path).to_string_lossy().into_owned(),
        _ => trimmed.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
[[show]]
id = 1
title = "Night Signals"
feed_url = "https://feeds.example.com/night-signals.xml"
artwork = "https://cdn.example.com/night.jpg"

[[show.episode]]
id = 11
title = "Pilot"
published = "2024-05-01T08:00:00Z"
media_url = "https://cdn.example.com/ns-1.mp3"
duration_secs = 1800

[[show.episode]]
id = 12
title = "Second Light"
published = "2024-05-08T08:00:00Z"
artwork = "covers/second.png"
link = "https://example.com/ns/2"

[[show]]
id = 2
title = "Quiet Hours"
feed_url = "https://feeds.example.com/quiet.xml"

[[show.episode]]
id = 21
title = "Undated"
"#;

    fn sample() -> Library {
        Library::from_toml_str(SAMPLE, Some(Path::new("/home/u/.config/castgrid"))).unwrap()
    }

    #[test]
    fn shows_keep_file_order() {
        let lib = sample();
        let titles: Vec<&str> = lib.shows().iter().map(|s| &*s.title).collect();
        assert_eq!(titles, vec!["Night Signals", "Quiet Hours"]);
        assert_eq!(lib.episode_count(1), 2);
        assert_eq!(lib.episode_count(2), 1);
        assert_eq!(lib.episode_count(99), 0);
    }

    #[test]
    fn episodes_inherit_show_artwork_and_seed() {
        let lib = sample();
        let recent = lib.recent_episodes(10);
        let pilot = recent.iter().find(|e| e.id == 11).unwrap();
        assert_eq!(pilot.artwork.as_deref(), Some("https://cdn.example.com/night.jpg"));
        assert_eq!(&*pilot.seed, "https://feeds.example.com/night-signals.xml");
        assert_eq!(&*pilot.show_title, "Night Signals");
    }

    #[test]
    fn relative_artwork_is_resolved() {
        let lib = sample();
        let second = lib.latest_episode(1).unwrap();
        assert_eq!(second.id, 12);
        assert_eq!(
            second.artwork.as_deref(),
            Some("/home/u/.config/castgrid/covers/second.png")
        );
    }

    #[test]
    fn recent_episodes_newest_first_undated_last() {
        let ids: Vec<i64> = sample().recent_episodes(10).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![12, 11, 21]);
        assert_eq!(sample().recent_episodes(1).len(), 1);
    }

    #[test]
    fn latest_episode_of_undated_show() {
        assert_eq!(sample().latest_episode(2).map(|e| e.id), Some(21));
    }

    #[test]
    fn share_url_prefers_media() {
        let lib = sample();
        let recent = lib.recent_episodes(10);
        let by_id = |id| recent.iter().find(|e| e.id == id).unwrap();
        assert_eq!(by_id(11).share_url(), Some("https://cdn.example.com/ns-1.mp3"));
        assert_eq!(by_id(12).share_url(), Some("https://example.com/ns/2"));
        assert_eq!(by_id(21).share_url(), None);
    }

    #[test]
    fn duplicate_show_id_rejected() {
        let content = r#"
[[show]]
id = 1
title = "A"
feed_url = "https://a.example/feed"

[[show]]
id = 1
title = "B"
feed_url = "https://b.example/feed"
"#;
        assert!(matches!(
            Library::from_toml_str(content, None),
            Err(LibraryError::DuplicateId { kind: "show", id: 1 })
        ));
    }

    #[test]
    fn duplicate_episode_id_across_shows_rejected() {
        let content = r#"
[[show]]
id = 1
title = "A"
feed_url = "https://a.example/feed"
[[show.episode]]
id = 5
title = "x"

[[show]]
id = 2
title = "B"
feed_url = "https://b.example/feed"
[[show.episode]]
id = 5
title = "y"
"#;
        assert!(matches!(
            Library::from_toml_str(content, None),
            Err(LibraryError::DuplicateId {
                kind: "episode",
                id: 5
            })
        ));
    }

    #[test]
    fn bad_timestamp_is_parse_error() {
        let content = r#"
[[show]]
id = 1
title = "A"
feed_url = "https://a.example/feed"
[[show.episode]]
id = 5
title = "x"
published = "last tuesday"
"#;
        assert!(matches!(
            Library::from_toml_str(content, None),
            Err(LibraryError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_empty_library() {
        let lib = Library::load(Path::new("/tmp/castgrid_test_no_library.toml"))
            .await
            .unwrap();
        assert!(lib.shows().is_empty());
        assert!(lib.recent_episodes(5).is_empty());
    }

    #[tokio::test]
    async fn load_reads_file() {
        let dir = std::env::temp_dir().join("castgrid_library_test_load");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("library.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let lib = Library::load(&path).await.unwrap();
        assert_eq!(lib.shows().len(), 2);
        let expected = dir.join("covers/second.png");
        assert_eq!(
            lib.latest_episode(1).and_then(|e| e.artwork.as_deref()),
            expected.to_str()
        );

        std::fs::remove_dir_all(&dir).ok();
    }
}
