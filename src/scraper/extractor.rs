use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::app::AcquisitionError;
use crate::scraper::session::{ElementProbe, PageSession, SessionError};
use crate::scraper::ScraperConfig;

/// Fields read off a lyrics page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Lyrics,
    SongTitle,
    Artist,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Lyrics => "lyrics",
            Field::SongTitle => "song title",
            Field::Artist => "artist",
        })
    }
}

/// Slack on top of an element wait before a hung probe is cut off.
pub const PROBE_GRACE: Duration = Duration::from_secs(1);

/// What a bounded element wait ended with.
#[derive(Debug)]
pub enum WaitOutcome {
    /// An element matched; carries the selector that hit.
    Found(String, ElementProbe),
    /// A marker selector matched instead (e.g. "no results").
    Marker(String),
    /// Deadline passed while the document was still loading.
    TimedOut,
    /// Deadline passed on a fully loaded document.
    Missing,
}

/// Poll `selectors` in order until one matches, a `markers` selector matches,
/// or `wait` elapses.
pub async fn wait_for_any(
    page: &dyn PageSession,
    selectors: &[String],
    markers: &[String],
    wait: Duration,
    poll: Duration,
) -> Result<WaitOutcome, SessionError> {
    let deadline = Instant::now() + wait;

    loop {
        for selector in selectors {
            if let Some(probe) = probe_settled(page, selector).await? {
                return Ok(WaitOutcome::Found(selector.clone(), probe));
            }
        }
        for marker in markers {
            if probe_settled(page, marker).await?.is_some() {
                return Ok(WaitOutcome::Marker(marker.clone()));
            }
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }

    match page.is_loaded().await {
        Ok(true) => Ok(WaitOutcome::Missing),
        Ok(false) | Err(SessionError::Protocol(_)) => Ok(WaitOutcome::TimedOut),
        Err(e) => Err(e),
    }
}

/// One probe, where a protocol error counts as "not there yet".
///
/// The document is swapped out mid-navigation ("Execution context was
/// destroyed"); only a closed browser or a failed navigation ends the wait.
async fn probe_settled(
    page: &dyn PageSession,
    selector: &str,
) -> Result<Option<ElementProbe>, SessionError> {
    match page.probe(selector).await {
        Err(SessionError::Protocol(e)) => {
            debug!("Probe for {} failed, retrying: {}", selector, e);
            Ok(None)
        }
        other => other,
    }
}

/// Reads one field from the current page.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    fn field(&self) -> Field;

    async fn extract(&self, page: &dyn PageSession, wait: Duration) -> Result<String, AcquisitionError>;
}

/// Which part of the matched element holds the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Text,
    Href,
}

/// Extractor driven by an ordered list of CSS selectors.
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    field: Field,
    selectors: Vec<String>,
    source: Source,
    poll: Duration,
}

impl SelectorExtractor {
    pub fn new(field: Field, selectors: Vec<String>, source: Source, poll: Duration) -> Self {
        Self {
            field,
            selectors,
            source,
            poll,
        }
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }
}

#[async_trait]
impl FieldExtractor for SelectorExtractor {
    fn field(&self) -> Field {
        self.field
    }

    async fn extract(&self, page: &dyn PageSession, wait: Duration) -> Result<String, AcquisitionError> {
        let outcome = tokio::time::timeout(
            wait + PROBE_GRACE,
            wait_for_any(page, &self.selectors, &[], wait, self.poll),
        )
        .await
        .map_err(|_| {
            AcquisitionError::timeout(format!("Timed out after {:?} waiting for {}", wait, self.field))
        })??;

        match outcome {
            WaitOutcome::Found(selector, probe) => {
                let value = match self.source {
                    Source::Text => probe.text,
                    Source::Href => probe.href,
                };
                let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
                if value.is_empty() {
                    return Err(AcquisitionError::extraction(format!(
                        "Found {} element ({}) but it was empty",
                        self.field, selector
                    )));
                }
                Ok(value)
            }
            WaitOutcome::TimedOut => Err(AcquisitionError::timeout(format!(
                "Timed out after {:?} waiting for {} (page still loading)",
                wait, self.field
            ))),
            WaitOutcome::Missing | WaitOutcome::Marker(_) => Err(AcquisitionError::extraction(format!(
                "No {} element on page (tried: {})",
                self.field,
                self.selectors.join(", ")
            ))),
        }
    }
}

/// Field extractors keyed by field.
pub struct ExtractorSet {
    extractors: HashMap<Field, Box<dyn FieldExtractor>>,
}

impl ExtractorSet {
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Selector-based extractors for all three fields, from configuration.
    pub fn from_config(config: &ScraperConfig) -> Self {
        let poll = config.poll_interval();
        Self::empty()
            .with(SelectorExtractor::new(
                Field::Lyrics,
                config.lyrics_selectors.clone(),
                Source::Text,
                poll,
            ))
            .with(SelectorExtractor::new(
                Field::SongTitle,
                config.title_selectors.clone(),
                Source::Text,
                poll,
            ))
            .with(SelectorExtractor::new(
                Field::Artist,
                config.artist_selectors.clone(),
                Source::Text,
                poll,
            ))
    }

    /// Register `extractor`, replacing any previous one for the same field.
    pub fn with(mut self, extractor: impl FieldExtractor + 'static) -> Self {
        self.extractors.insert(extractor.field(), Box::new(extractor));
        self
    }

    pub fn get(&self, field: Field) -> Option<&dyn FieldExtractor> {
        self.extractors.get(&field).map(|e| e.as_ref())
    }

    pub async fn extract(
        &self,
        field: Field,
        page: &dyn PageSession,
        wait: Duration,
    ) -> Result<String, AcquisitionError> {
        let extractor = self.get(field).ok_or_else(|| {
            AcquisitionError::extraction(format!("No extractor registered for {}", field))
        })?;
        extractor.extract(page, wait).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ErrorKind;
    use crate::scraper::session::fake::{Element, FakeBrowser, Script};
    use crate::scraper::session::PageFactory;

    const PAGE: &str = "https://genius.com/Queen-bohemian-rhapsody-lyrics";

    fn sel(s: &str) -> Vec<String> {
        vec![s.to_string()]
    }

    async fn page_with(script: Script) -> Box<dyn PageSession> {
        let browser = FakeBrowser::new(script);
        let page = browser.open_page().await.unwrap();
        page.goto(PAGE).await.unwrap();
        page
    }

    #[tokio::test]
    async fn test_extracts_trimmed_text() {
        let page = page_with(Script {
            elements: vec![(PAGE.into(), "h1.title".into(), Element::Text("  Bohemian Rhapsody\n".into()))],
            ..Default::default()
        })
        .await;

        let extractor = SelectorExtractor::new(Field::SongTitle, sel("h1.title"), Source::Text, Duration::from_millis(5));
        let value = extractor.extract(page.as_ref(), Duration::from_millis(50)).await.unwrap();
        assert_eq!(value, "Bohemian Rhapsody");
    }

    #[tokio::test]
    async fn test_falls_back_to_later_selector() {
        let page = page_with(Script {
            elements: vec![(PAGE.into(), "section".into(), Element::Text("Is this the real life?".into()))],
            ..Default::default()
        })
        .await;

        let extractor = SelectorExtractor::new(
            Field::Lyrics,
            vec!["div.lyrics-root".into(), "section".into()],
            Source::Text,
            Duration::from_millis(5),
        );
        let value = extractor.extract(page.as_ref(), Duration::from_millis(50)).await.unwrap();
        assert_eq!(value, "Is this the real life?");
    }

    #[tokio::test]
    async fn test_missing_on_loaded_page_is_failure() {
        let page = page_with(Script::default()).await;
        let extractor = SelectorExtractor::new(Field::Artist, sel("a.artist"), Source::Text, Duration::from_millis(5));

        let err = extractor.extract(page.as_ref(), Duration::from_millis(30)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionFailure);
        assert!(err.message.contains("a.artist"));
    }

    #[tokio::test]
    async fn test_missing_on_loading_page_is_timeout() {
        let page = page_with(Script {
            loading: vec![PAGE.into()],
            ..Default::default()
        })
        .await;
        let extractor = SelectorExtractor::new(Field::Lyrics, sel("div.lyrics"), Source::Text, Duration::from_millis(5));

        let err = extractor.extract(page.as_ref(), Duration::from_millis(30)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionTimeout);
    }

    #[tokio::test]
    async fn test_empty_element_is_failure() {
        let page = page_with(Script {
            elements: vec![(PAGE.into(), "a.artist".into(), Element::Text("   ".into()))],
            ..Default::default()
        })
        .await;
        let extractor = SelectorExtractor::new(Field::Artist, sel("a.artist"), Source::Text, Duration::from_millis(5));

        let err = extractor.extract(page.as_ref(), Duration::from_millis(30)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionFailure);
    }

    #[tokio::test]
    async fn test_href_source() {
        let page = page_with(Script {
            elements: vec![(
                PAGE.into(),
                "a.artist".into(),
                Element::Link {
                    text: "Queen".into(),
                    href: "https://genius.com/artists/Queen".into(),
                },
            )],
            ..Default::default()
        })
        .await;
        let extractor = SelectorExtractor::new(Field::Artist, sel("a.artist"), Source::Href, Duration::from_millis(5));

        let value = extractor.extract(page.as_ref(), Duration::from_millis(30)).await.unwrap();
        assert_eq!(value, "https://genius.com/artists/Queen");
    }

    #[tokio::test]
    async fn test_wait_reports_marker() {
        let page = page_with(Script {
            elements: vec![(PAGE.into(), "#no-results".into(), Element::Text("nothing".into()))],
            ..Default::default()
        })
        .await;

        let outcome = wait_for_any(
            page.as_ref(),
            &sel("a.result"),
            &sel("#no-results"),
            Duration::from_millis(30),
            Duration::from_millis(5),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, WaitOutcome::Marker(m) if m == "#no-results"));
    }

    #[tokio::test]
    async fn test_protocol_error_during_wait_keeps_polling() {
        let page = page_with(Script {
            elements: vec![(PAGE.into(), "h1.title".into(), Element::Text("Bohemian Rhapsody".into()))],
            flaky_probes: 2,
            ..Default::default()
        })
        .await;
        let extractor = SelectorExtractor::new(Field::SongTitle, sel("h1.title"), Source::Text, Duration::from_millis(5));

        let value = extractor.extract(page.as_ref(), Duration::from_millis(100)).await.unwrap();
        assert_eq!(value, "Bohemian Rhapsody");
    }

    #[tokio::test]
    async fn test_persistent_protocol_errors_wait_out_the_deadline() {
        let page = page_with(Script {
            flaky_probes: usize::MAX,
            ..Default::default()
        })
        .await;
        let extractor = SelectorExtractor::new(Field::Lyrics, sel("div.lyrics"), Source::Text, Duration::from_millis(5));

        let started = Instant::now();
        let err = extractor.extract(page.as_ref(), Duration::from_millis(40)).await.unwrap_err();
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(err.kind, ErrorKind::ExtractionFailure);
        assert!(err.message.contains("No lyrics element"));
    }

    #[tokio::test]
    async fn test_navigation_error_ends_wait() {
        let page = page_with(Script {
            broken_probes: true,
            ..Default::default()
        })
        .await;

        let err = wait_for_any(
            page.as_ref(),
            &sel("a.result"),
            &[],
            Duration::from_secs(5),
            Duration::from_millis(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SessionError::Navigation(_)));
    }

    #[test]
    fn test_default_set_covers_every_field() {
        let set = ExtractorSet::from_config(&ScraperConfig::default());
        for field in [Field::Lyrics, Field::SongTitle, Field::Artist] {
            assert_eq!(set.get(field).map(|e| e.field()), Some(field));
        }
    }

    #[tokio::test]
    async fn test_unregistered_field_is_failure() {
        let page = page_with(Script::default()).await;
        let err = ExtractorSet::empty()
            .extract(Field::Lyrics, page.as_ref(), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionFailure);
    }
}
