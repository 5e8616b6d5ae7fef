use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the browser-navigation strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Bound on each wait-for-element step in milliseconds (default: 10000)
    pub element_timeout_ms: u64,

    /// Bound on each page navigation in seconds (default: 30)
    pub navigation_timeout_secs: u64,

    /// How often a pending element wait re-queries the page (default: 250)
    pub poll_interval_ms: u64,

    /// Maximum concurrent browser pages (default: 5)
    pub max_concurrency: usize,

    /// How long a lookup may wait for a free page slot in seconds (default: 30)
    pub acquire_timeout_secs: u64,

    /// Search engine results endpoint, queried with `?q=`
    pub search_url: String,

    /// Domain the search is restricted to with `site:`
    pub lyrics_domain: String,

    /// Selectors for the first organic result link, in priority order
    pub result_selectors: Vec<String>,

    /// Selectors that only match when the search returned nothing
    pub no_results_selectors: Vec<String>,

    /// Selectors for the lyrics body, in priority order
    pub lyrics_selectors: Vec<String>,

    /// Selectors for the song title heading
    pub title_selectors: Vec<String>,

    /// Selectors for the artist link
    pub artist_selectors: Vec<String>,

    /// Extra host/path substrings appended to the built-in block list
    pub extra_blocked: Vec<String>,

    /// Path to a Chrome/Chromium binary; autodetected when unset
    pub chrome_executable: Option<String>,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            element_timeout_ms: 10_000,
            navigation_timeout_secs: 30,
            poll_interval_ms: 250,
            max_concurrency: 5,
            acquire_timeout_secs: 30,
            search_url: "https://www.google.com/search".to_string(),
            lyrics_domain: "genius.com".to_string(),
            result_selectors: vec![
                "#search div.g a[href^=\"http\"]:has(h3)".to_string(),
                "#rso a[href^=\"http\"]:has(h3)".to_string(),
                "#search a[href*=\"genius.com\"]".to_string(),
            ],
            no_results_selectors: vec![
                "#topstuff .card-section".to_string(),
                "#botstuff .card-section".to_string(),
            ],
            lyrics_selectors: vec![
                "div[class*=\"Lyrics__Root\"]".to_string(),
                "div[data-lyrics-container=\"true\"]".to_string(),
                "#lyrics-root".to_string(),
                "main section".to_string(),
            ],
            title_selectors: vec![
                "h1[class*=\"__Title\"]".to_string(),
                "h1[class*=\"Title\"]".to_string(),
            ],
            artist_selectors: vec!["a[href*=\"/artists/\"][class*=\"Artist\"]".to_string()],
            extra_blocked: Vec::new(),
            chrome_executable: None,
            user_agent: Some(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
        }
    }
}

impl ScraperConfig {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}
