//! Browser-navigation lookup strategy.
//!
//! Used when the lyrics API is unavailable or not configured: search the web
//! for the title, open the first lyrics-site result and read the fields off
//! the rendered page.
//!
//! # Architecture
//!
//! ```text
//! title → search page → first result → lyrics page → field extractors → LyricResult
//!                 └──── ResourceFilter on every request ────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lyricscout::scraper::{BrowserHandle, ChromeBrowser, NavigationEngine, ScraperConfig};
//! use lyricscout::LyricsSource;
//!
//! let config = ScraperConfig::default();
//! let chrome = Arc::new(ChromeBrowser::launch(&config).await?);
//! let handle = Arc::new(BrowserHandle::new(chrome, config.max_concurrency, config.acquire_timeout()));
//! let engine = NavigationEngine::new(handle.clone(), config);
//!
//! let result = engine.lookup("Bohemian Rhapsody").await?;
//! handle.shutdown().await?;
//! ```

mod chrome;
mod config;
mod engine;
pub mod extractor;
pub mod filter;
pub mod session;

pub use chrome::{ChromeBrowser, ChromePage};
pub use config::ScraperConfig;
pub use engine::NavigationEngine;
pub use extractor::{ExtractorSet, Field, FieldExtractor, SelectorExtractor, Source};
pub use filter::{BlockList, Decision, ResourceFilter, ResourceKind};
pub use session::{BrowserHandle, ElementProbe, ExtractionSession, PageFactory, PageSession, SessionError};
