use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::app::AcquisitionError;
use crate::domain::LyricResult;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::lyrics_page::extract_lyrics;
use crate::fetcher::query::optimize_title;
use crate::fetcher::ApiConfig;
use crate::LyricsSource;

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: Option<SearchResponse>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    result: SongHit,
}

#[derive(Debug, Deserialize)]
struct SongHit {
    title: Option<String>,
    title_with_featured: Option<String>,
    url: String,
    primary_artist: Option<Artist>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

impl SongHit {
    fn display_title(&self) -> String {
        self.title_with_featured
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or_default()
            .to_string()
    }

    fn artist(&self) -> String {
        self.primary_artist
            .as_ref()
            .map(|a| a.name.clone())
            .unwrap_or_default()
    }
}

/// Lyrics lookup against a Genius-compatible search API
pub struct ApiLookupEngine {
    fetcher: HttpFetcher,
    config: ApiConfig,
}

impl ApiLookupEngine {
    pub fn new(config: ApiConfig) -> reqwest::Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self { fetcher, config })
    }

    /// `{base_url}{search_path}?q=<title>`
    pub fn search_url(&self, title: &str) -> Result<String, AcquisitionError> {
        let mut url = self.config.search_base().map_err(|e| {
            AcquisitionError::upstream(format!("Invalid API URL {}: {}", self.config.base_url, e))
        })?;

        let query = if self.config.optimize_query {
            optimize_title(title)
        } else {
            title.to_string()
        };
        url.query_pairs_mut().append_pair("q", &query);
        Ok(url.into())
    }

    async fn first_hit(&self, title: &str) -> Result<SongHit, AcquisitionError> {
        let url = self.search_url(title)?;
        debug!("API search: {}", url);

        let body = self.fetcher.get_json(&url, self.config.credential()).await?;
        let envelope: SearchEnvelope = serde_json::from_value(body).map_err(|e| {
            AcquisitionError::upstream(format!("Unexpected search response shape: {}", e))
        })?;

        envelope
            .response
            .and_then(|r| r.hits.into_iter().next())
            .map(|hit| hit.result)
            .ok_or_else(|| AcquisitionError::not_found("Song could not be found"))
    }
}

#[async_trait]
impl LyricsSource for ApiLookupEngine {
    async fn lookup(&self, title: &str) -> Result<LyricResult, AcquisitionError> {
        let hit = self.first_hit(title).await?;
        debug!("First hit: {}", hit.url);

        let page = self.fetcher.get_text(&hit.url).await?;
        let lyrics = extract_lyrics(&page).ok_or_else(|| {
            AcquisitionError::extraction(format!("No lyrics found on {}", hit.url))
        })?;

        let result = LyricResult::complete(lyrics, hit.display_title(), hit.artist(), hit.url)?;
        info!("Found \"{}\" by {}", result.song_title, result.artist);
        Ok(result)
    }
}
