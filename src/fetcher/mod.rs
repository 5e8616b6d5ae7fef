//! Lyrics-API lookup strategy: one search call, one page fetch.

mod api;
mod config;
pub mod http_fetcher;
pub mod lyrics_page;
pub mod query;

pub use api::ApiLookupEngine;
pub use config::ApiConfig;
pub use http_fetcher::HttpFetcher;
