//! Configuration management for lyricscout.
//!
//! Configuration is read from `~/.config/lyricscout/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! Environment variables and CLI flags are applied on top by [`crate::cli`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dispatch::AcquisitionMode;
use crate::fetcher::ApiConfig;
use crate::scraper::ScraperConfig;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub acquisition: AcquisitionConfig,
    pub api: ApiConfig,
    pub scraper: ScraperConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Strategy used when a request does not name one
    pub mode: AcquisitionMode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path when `None`.
    ///
    /// A missing default file is created with comments. A missing explicit
    /// file is an error. Missing fields use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let p = Self::default_config_path()?;
                if !p.exists() {
                    Self::create_default_config(&p)?;
                    return Ok(Self::default());
                }
                p
            }
        };

        Self::from_file(&config_path)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/lyricscout/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("lyricscout").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# lyricscout configuration
#
# Environment variables override the file:
#   LYRICSCOUT_MODE  acquisition.mode
#   API_URL          api.base_url (a full prefix like ".../search?q=" also works)
#   GENIUS_TOKEN     api.token
#   PORT             server.port

[acquisition]
# Lookup strategy: "api" (search API) or "browser" (headless Chrome)
mode = "api"

[api]
base_url = "https://api.genius.com"
search_path = "/search"

# Bearer token for the search API
token = ""

# Per-request timeout in seconds
timeout_secs = 10

# Strip "(Official Video)", "[Lyrics]", "feat. X" from titles before searching
optimize_query = false

[scraper]
# Run browser in headless mode (no visible window)
headless = true

# Bound on each wait-for-element step (milliseconds)
element_timeout_ms = 10000

# Bound on each page navigation (seconds)
navigation_timeout_secs = 30

# How often a pending element wait re-queries the page (milliseconds)
poll_interval_ms = 250

# Maximum concurrent browser pages
max_concurrency = 5

# How long a lookup may wait for a free page (seconds)
acquire_timeout_secs = 30

search_url = "https://www.google.com/search"
lyrics_domain = "genius.com"

# CSS selectors, tried in priority order
result_selectors = [
    "#search div.g a[href^=\"http\"]:has(h3)",
    "#rso a[href^=\"http\"]:has(h3)",
    "#search a[href*=\"genius.com\"]",
]
no_results_selectors = [
    "#topstuff .card-section",
    "#botstuff .card-section",
]
lyrics_selectors = [
    "div[class*=\"Lyrics__Root\"]",
    "div[data-lyrics-container=\"true\"]",
    "#lyrics-root",
    "main section",
]
title_selectors = [
    "h1[class*=\"__Title\"]",
    "h1[class*=\"Title\"]",
]
artist_selectors = [
    "a[href*=\"/artists/\"][class*=\"Artist\"]",
]

# Extra host/path substrings to block on top of the built-in list
extra_blocked = []

[server]
host = "0.0.0.0"
port = 8000
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
