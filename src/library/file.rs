//! On-disk shape of `library.toml`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LibraryFile {
    pub show: Vec<ShowEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ShowEntry {
    pub id: i64,
    pub title: String,
    pub feed_url: String,
    #[serde(default)]
    pub artwork: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub episode: Vec<EpisodeEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct EpisodeEntry {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub artwork: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<u64>,
}
