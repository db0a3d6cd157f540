//! Configuration file parser for ~/.config/castgrid/config.toml.
//!
//! Every key is optional. A missing or blank file yields `Config::default()`;
//! unknown keys are logged and ignored.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// "dark" or "light".
    pub theme: String,

    /// The show strip is padded with placeholder cards up to this many.
    pub min_show_cards: usize,

    /// Shows listed before a "See more" card is appended.
    pub show_preview_count: usize,

    /// Episodes kept in the recent-episodes list.
    pub recent_episode_limit: usize,

    /// Quantization resolution for palette extraction.
    pub palette_max_colors: usize,

    pub artwork_timeout_secs: u64,

    pub max_artwork_bytes: usize,

    /// Action name → key string overrides.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            min_show_cards: 6,
            show_preview_count: 8,
            recent_episode_limit: 50,
            palette_max_colors: crate::palette::DEFAULT_MAX_COLORS,
            artwork_timeout_secs: crate::artwork::DEFAULT_ARTWORK_TIMEOUT.as_secs(),
            max_artwork_bytes: crate::artwork::DEFAULT_MAX_ARTWORK_BYTES,
            keybindings: HashMap::new(),
        }
    }
}

const KNOWN_KEYS: [&str; 8] = [
    "theme",
    "min_show_cards",
    "show_preview_count",
    "recent_episode_limit",
    "palette_max_colors",
    "artwork_timeout_secs",
    "max_artwork_bytes",
    "keybindings",
];

/// Upper bound accepted for `palette_max_colors`.
const MAX_PALETTE_COLORS: usize = 256;

impl Config {
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing, empty or whitespace-only file → defaults
    /// - Larger than 1 MiB → [`ConfigError::TooLarge`]
    /// - Invalid TOML or wrong value types → [`ConfigError::Parse`]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge {
                    size: meta.len(),
                    max: Self::MAX_FILE_SIZE,
                });
            }
            Ok(_) => std::fs::read_to_string(path),
            Err(e) => Err(e),
        };

        let content = match content {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys().filter(|k| !KNOWN_KEYS.contains(&k.as_str())) {
                tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            }
        }

        let config = toml::from_str::<Config>(&content)?.normalized();
        tracing::info!(
            path = %path.display(),
            theme = %config.theme,
            palette_max_colors = config.palette_max_colors,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Clamp values that would make the app misbehave.
    fn normalized(mut self) -> Self {
        if self.palette_max_colors == 0 || self.palette_max_colors > MAX_PALETTE_COLORS {
            let clamped = self.palette_max_colors.clamp(1, MAX_PALETTE_COLORS);
            tracing::warn!(
                configured = self.palette_max_colors,
                using = clamped,
                "palette_max_colors out of range"
            );
            self.palette_max_colors = clamped;
        }
        if self.artwork_timeout_secs == 0 {
            tracing::warn!("artwork_timeout_secs = 0, using 1");
            self.artwork_timeout_secs = 1;
        }
        self
    }

    pub fn artwork_timeout(&self) -> Duration {
        Duration::from_secs(self.artwork_timeout_secs)
    }
}
