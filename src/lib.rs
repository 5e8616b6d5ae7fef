//! # lyricscout
//!
//! Resolve a free-text song title to its lyrics, title, artist and source URL.
//!
//! ## Architecture
//!
//! Two interchangeable lookup strategies behind one dispatcher:
//!
//! ```text
//! POST /songdata → LookupRequest → Dispatcher ─┬─ ApiLookupEngine   (search API + page fetch)
//!                                              └─ NavigationEngine  (headless browser scrape)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # One lookup through the API
//! GENIUS_TOKEN=... lyricscout lookup "Bohemian Rhapsody"
//!
//! # Same through the browser strategy
//! lyricscout --mode browser lookup "Bohemian Rhapsody" --json
//!
//! # Serve POST /songdata on port 8000
//! lyricscout serve
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: TOML configuration
//! - [`dispatch`]: Strategy selection
//! - [`domain`]: Lookup request and result models
//! - [`fetcher`]: Lyrics-API strategy
//! - [`scraper`]: Browser-navigation strategy
//! - [`server`]: HTTP front end

use async_trait::async_trait;

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the configured engines
/// into a [`Dispatcher`](dispatch::Dispatcher) and owns the browser handle.
pub mod app;

/// Command-line interface using clap.
///
/// - `lookup <title>` - Resolve one title and print it
/// - `serve` - Run the HTTP front end
/// - `config` - Show the effective configuration
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/lyricscout/config.toml`, creating a commented
/// default on first run.
pub mod config;

/// Acquisition dispatcher.
pub mod dispatch;

/// Core domain models.
///
/// - [`LookupRequest`](domain::LookupRequest): Validated inbound title
/// - [`LyricResult`](domain::LyricResult): Lyrics and song metadata
pub mod domain;

/// Lyrics-API lookup.
///
/// - [`ApiLookupEngine`](fetcher::ApiLookupEngine): search endpoint + lyrics page fetch
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based client with status classification
pub mod fetcher;

/// Browser-navigation lookup.
///
/// Uses headless Chrome via chromiumoxide to search the web, open the first
/// lyrics-site result and read the fields off the rendered page.
///
/// - [`NavigationEngine`](scraper::NavigationEngine): the lookup strategy
/// - [`BrowserHandle`](scraper::BrowserHandle): shared, capacity-bounded browser
/// - [`ResourceFilter`](scraper::ResourceFilter): request interception policy
pub mod scraper;

/// HTTP front end built on axum.
pub mod server;

use crate::app::AcquisitionError;
use crate::domain::LyricResult;

/// A strategy that resolves a title to a complete [`LyricResult`].
#[async_trait]
pub trait LyricsSource: Send + Sync {
    async fn lookup(&self, title: &str) -> Result<LyricResult, AcquisitionError>;
}
