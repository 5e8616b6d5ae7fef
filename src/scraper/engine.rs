use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::app::AcquisitionError;
use crate::domain::LyricResult;
use crate::scraper::extractor::{wait_for_any, ExtractorSet, Field, WaitOutcome, PROBE_GRACE};
use crate::scraper::filter::{BlockList, ResourceFilter};
use crate::scraper::session::{BrowserHandle, ExtractionSession, SessionError};
use crate::scraper::ScraperConfig;
use crate::LyricsSource;

/// Web search + page scrape lookup strategy
pub struct NavigationEngine {
    handle: Arc<BrowserHandle>,
    filter: Arc<ResourceFilter>,
    extractors: ExtractorSet,
    config: ScraperConfig,
}

impl NavigationEngine {
    pub fn new(handle: Arc<BrowserHandle>, config: ScraperConfig) -> Self {
        let filter = ResourceFilter::new(BlockList::with_extra(config.extra_blocked.clone()));
        let extractors = ExtractorSet::from_config(&config);
        Self {
            handle,
            filter: Arc::new(filter),
            extractors,
            config,
        }
    }

    /// Replace the field extractors
    pub fn with_extractors(mut self, extractors: ExtractorSet) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn handle(&self) -> &Arc<BrowserHandle> {
        &self.handle
    }

    /// `<search_url>?q=<title> lyrics site:<domain>`
    pub fn search_url(&self, title: &str) -> Result<String, AcquisitionError> {
        let mut url = Url::parse(&self.config.search_url).map_err(|e| {
            AcquisitionError::extraction(format!(
                "Invalid search URL {}: {}",
                self.config.search_url, e
            ))
        })?;
        url.query_pairs_mut().append_pair(
            "q",
            &format!("{} lyrics site:{}", title, self.config.lyrics_domain),
        );
        Ok(url.into())
    }

    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T, AcquisitionError>
    where
        F: Future<Output = Result<T, SessionError>>,
    {
        let limit = self.config.navigation_timeout();
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| AcquisitionError::timeout(format!("{} timed out after {:?}", what, limit)))?
            .map_err(AcquisitionError::from)
    }

    /// Wait for the first organic result and return its selector and target URL
    async fn locate_result(
        &self,
        session: &ExtractionSession,
    ) -> Result<(String, String), AcquisitionError> {
        let wait = self.config.element_timeout();
        let poll = self.config.poll_interval();

        let outcome = tokio::time::timeout(
            wait + PROBE_GRACE,
            wait_for_any(
                session.page()?,
                &self.config.result_selectors,
                &self.config.no_results_selectors,
                wait,
                poll,
            ),
        )
        .await
        .map_err(|_| timed_out(wait))??;

        match outcome {
            WaitOutcome::Found(selector, probe) => {
                let href = probe
                    .href
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| {
                        AcquisitionError::extraction(format!(
                            "First search result ({}) has no link target",
                            selector
                        ))
                    })?;
                Ok((selector, href))
            }
            WaitOutcome::Marker(marker) => {
                debug!("Search returned no results (marker {})", marker);
                Err(AcquisitionError::not_found("No search results for this title"))
            }
            WaitOutcome::TimedOut | WaitOutcome::Missing => {
                debug!(
                    "No result link matched (tried: {})",
                    self.config.result_selectors.join(", ")
                );
                Err(timed_out(wait))
            }
        }
    }

    /// The lookup steps, run against an already opened session
    async fn drive(
        &self,
        session: &mut ExtractionSession,
        title: &str,
    ) -> Result<LyricResult, AcquisitionError> {
        session
            .page_mut()?
            .install_filter(self.filter.clone())
            .await?;

        let search_url = self.search_url(title)?;
        debug!("Searching: {}", search_url);
        self.bounded("Search navigation", session.page()?.goto(&search_url))
            .await?;

        let (selector, source_url) = self.locate_result(session).await?;
        debug!("First result: {}", source_url);
        self.bounded("Result navigation", session.page()?.click(&selector))
            .await?;

        let wait = self.config.element_timeout();
        let page = session.page()?;
        let lyrics = self.extractors.extract(Field::Lyrics, page, wait).await?;
        let song_title = self.extractors.extract(Field::SongTitle, page, wait).await?;
        let artist = self.extractors.extract(Field::Artist, page, wait).await?;

        LyricResult::complete(lyrics, song_title, artist, source_url)
    }
}

fn timed_out(wait: Duration) -> AcquisitionError {
    AcquisitionError::timeout(format!(
        "Timed out after {:?} waiting for the first search result",
        wait
    ))
}

#[async_trait]
impl LyricsSource for NavigationEngine {
    async fn lookup(&self, title: &str) -> Result<LyricResult, AcquisitionError> {
        let mut session = self.handle.open_session().await?;
        let outcome = self.drive(&mut session, title).await;
        session.release().await;

        if let Ok(ref result) = outcome {
            info!("Scraped \"{}\" by {}", result.song_title, result.artist);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::app::ErrorKind;
    use crate::scraper::session::fake::{Element, FakeBrowser, Script};

    const SEARCH: &str = "https://www.google.com/search";
    const SONG: &str = "https://genius.com/Queen-bohemian-rhapsody-lyrics";

    fn config() -> ScraperConfig {
        ScraperConfig {
            element_timeout_ms: 60,
            poll_interval_ms: 5,
            navigation_timeout_secs: 1,
            acquire_timeout_secs: 1,
            max_concurrency: 2,
            result_selectors: vec!["#search a.result".into(), "#rso a".into()],
            no_results_selectors: vec!["#topstuff .card-section".into()],
            lyrics_selectors: vec!["div.Lyrics__Root".into(), "section".into()],
            title_selectors: vec!["h1.SongHeader__Title".into()],
            artist_selectors: vec!["a.HeaderArtist".into()],
            ..Default::default()
        }
    }

    fn result_link(selector: &str) -> (String, String, Element) {
        (
            SEARCH.into(),
            selector.into(),
            Element::Link {
                text: "Queen – Bohemian Rhapsody Lyrics | Genius".into(),
                href: SONG.into(),
            },
        )
    }

    fn song_page() -> Vec<(String, String, Element)> {
        vec![
            (
                SONG.into(),
                "div.Lyrics__Root".into(),
                Element::Text("Is this the real life?\nIs this just fantasy?".into()),
            ),
            (
                SONG.into(),
                "h1.SongHeader__Title".into(),
                Element::Text("Bohemian Rhapsody".into()),
            ),
            (
                SONG.into(),
                "a.HeaderArtist".into(),
                Element::Link {
                    text: "Queen".into(),
                    href: "https://genius.com/artists/Queen".into(),
                },
            ),
        ]
    }

    fn happy_script() -> Script {
        let mut elements = vec![result_link("#search a.result")];
        elements.extend(song_page());
        Script {
            elements,
            links: HashMap::from([("#search a.result".to_string(), SONG.to_string())]),
            ..Default::default()
        }
    }

    fn engine(browser: Arc<FakeBrowser>) -> NavigationEngine {
        let config = config();
        let handle = Arc::new(BrowserHandle::new(
            browser,
            config.max_concurrency,
            config.acquire_timeout(),
        ));
        NavigationEngine::new(handle, config)
    }

    fn assert_released(browser: &FakeBrowser) {
        assert_eq!(browser.opened(), 1);
        assert_eq!(browser.closed(), 1);
    }

    #[tokio::test]
    async fn test_successful_scrape() {
        let browser = Arc::new(FakeBrowser::new(happy_script()));
        let result = engine(browser.clone()).lookup("Bohemian Rhapsody").await.unwrap();

        assert_eq!(result.song_title, "Bohemian Rhapsody");
        assert_eq!(result.artist, "Queen");
        assert_eq!(result.source_url, SONG);
        assert!(result.lyrics.starts_with("Is this the real life?"));
        assert_released(&browser);
    }

    #[tokio::test]
    async fn test_filter_installed_before_navigation() {
        let browser = Arc::new(FakeBrowser::new(happy_script()));
        engine(browser.clone()).lookup("Bohemian Rhapsody").await.unwrap();

        assert_eq!(browser.counters.filters_installed.load(Ordering::SeqCst), 1);
        assert!(browser.counters.filter_before_nav.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_search_query_shape() {
        let browser = Arc::new(FakeBrowser::new(happy_script()));
        engine(browser.clone()).lookup("Bohemian Rhapsody").await.unwrap();

        let visited = browser.counters.visited.lock().unwrap().clone();
        assert_eq!(
            visited[0],
            "https://www.google.com/search?q=Bohemian+Rhapsody+lyrics+site%3Agenius.com"
        );
        assert_eq!(visited[1], SONG);
    }

    #[tokio::test]
    async fn test_fallback_result_selector() {
        let mut elements = vec![result_link("#rso a")];
        elements.extend(song_page());
        let browser = Arc::new(FakeBrowser::new(Script {
            elements,
            links: HashMap::from([("#rso a".to_string(), SONG.to_string())]),
            ..Default::default()
        }));

        let result = engine(browser.clone()).lookup("Bohemian Rhapsody").await.unwrap();
        assert_eq!(result.source_url, SONG);
        assert_released(&browser);
    }

    #[tokio::test]
    async fn test_slow_results_page_times_out_and_releases() {
        let browser = Arc::new(FakeBrowser::new(Script {
            loading: vec![SEARCH.into()],
            ..happy_script()
        }));

        let err = engine(browser.clone()).lookup("Bohemian Rhapsody").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionTimeout);
        assert_released(&browser);
    }

    #[tokio::test]
    async fn test_no_results_marker_is_not_found() {
        let browser = Arc::new(FakeBrowser::new(Script {
            elements: vec![(
                SEARCH.into(),
                "#topstuff .card-section".into(),
                Element::Text("Your search did not match any documents.".into()),
            )],
            ..Default::default()
        }));

        let err = engine(browser.clone()).lookup("zzzznonexistentsong1234").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_released(&browser);
    }

    #[tokio::test]
    async fn test_loaded_results_page_without_link_is_timeout() {
        let browser = Arc::new(FakeBrowser::new(Script::default()));

        let err = engine(browser.clone()).lookup("Bohemian Rhapsody").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionTimeout);
        assert!(err.message.contains("first search result"));
        assert_released(&browser);
    }

    #[tokio::test]
    async fn test_missing_artist_is_failure_not_partial_success() {
        let mut script = happy_script();
        script.elements.retain(|(_, sel, _)| sel != "a.HeaderArtist");
        let browser = Arc::new(FakeBrowser::new(script));

        let err = engine(browser.clone()).lookup("Bohemian Rhapsody").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionFailure);
        assert!(err.message.contains("artist"));
        assert_released(&browser);
    }

    #[tokio::test]
    async fn test_slow_lyrics_page_times_out() {
        let browser = Arc::new(FakeBrowser::new(Script {
            loading: vec![SONG.into()],
            ..happy_script()
        }));

        let err = engine(browser.clone()).lookup("Bohemian Rhapsody").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionTimeout);
        assert_released(&browser);
    }

    #[tokio::test]
    async fn test_unreachable_search_is_upstream_error() {
        let browser = Arc::new(FakeBrowser::new(Script {
            unreachable: vec![SEARCH.into()],
            ..Default::default()
        }));

        let err = engine(browser.clone()).lookup("Bohemian Rhapsody").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamError);
        assert_released(&browser);
    }

    #[tokio::test]
    async fn test_cancelled_lookup_releases_session() {
        let browser = Arc::new(FakeBrowser::new(Script {
            loading: vec![SEARCH.into()],
            ..Default::default()
        }));
        let engine = engine(browser.clone());

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), engine.lookup("Bohemian Rhapsody")).await;
        assert!(cancelled.is_err());
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_released(&browser);
        assert_eq!(engine.handle().available(), 2);
    }

    #[tokio::test]
    async fn test_repeated_lookups_each_release() {
        let browser = Arc::new(FakeBrowser::new(happy_script()));
        let engine = engine(browser.clone());

        let first = engine.lookup("Bohemian Rhapsody").await.unwrap();
        let second = engine.lookup("Bohemian Rhapsody").await.unwrap();
        assert_eq!(first.song_title, second.song_title);
        assert_eq!(first.artist, second.artist);
        assert_eq!(first.source_url, second.source_url);
        assert_eq!(browser.opened(), 2);
        assert_eq!(browser.closed(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_browser() {
        let browser = Arc::new(FakeBrowser::new(happy_script()));
        let engine = Arc::new(engine(browser.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.lookup("Bohemian Rhapsody").await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(browser.opened(), 4);
        assert_eq!(browser.closed(), 4);
    }
}
