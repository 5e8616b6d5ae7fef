//! Routes a validated lookup to exactly one strategy.

use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app::AcquisitionError;
use crate::domain::{LookupRequest, LyricResult};
use crate::LyricsSource;

/// Which lookup strategy serves a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionMode {
    /// Search API plus lyrics page fetch
    #[default]
    Api,
    /// Headless browser search and scrape
    Browser,
}

impl AcquisitionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionMode::Api => "api",
            AcquisitionMode::Browser => "browser",
        }
    }
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Dispatcher {
    default_mode: AcquisitionMode,
    api: Option<Arc<dyn LyricsSource>>,
    browser: Option<Arc<dyn LyricsSource>>,
}

impl Dispatcher {
    pub fn new(default_mode: AcquisitionMode) -> Self {
        Self {
            default_mode,
            api: None,
            browser: None,
        }
    }

    pub fn with_api(mut self, engine: Arc<dyn LyricsSource>) -> Self {
        self.api = Some(engine);
        self
    }

    pub fn with_browser(mut self, engine: Arc<dyn LyricsSource>) -> Self {
        self.browser = Some(engine);
        self
    }

    pub fn default_mode(&self) -> AcquisitionMode {
        self.default_mode
    }

    fn engine(&self, mode: AcquisitionMode) -> Option<&Arc<dyn LyricsSource>> {
        match mode {
            AcquisitionMode::Api => self.api.as_ref(),
            AcquisitionMode::Browser => self.browser.as_ref(),
        }
    }

    /// Run the lookup with the engine for `mode`. Failures are logged and
    /// returned unchanged; there is no fallback to the other strategy.
    pub async fn acquire(
        &self,
        request: &LookupRequest,
        mode: AcquisitionMode,
    ) -> Result<LyricResult, AcquisitionError> {
        let outcome = match self.engine(mode) {
            Some(engine) => {
                debug!("Looking up \"{}\" via {}", request.title(), mode);
                engine
                    .lookup(request.title())
                    .await
                    .and_then(|result| result.ensure_complete().map(|_| result))
            }
            None => Err(AcquisitionError::unavailable(format!(
                "Lookup mode '{}' is not configured",
                mode
            ))),
        };

        if let Err(ref e) = outcome {
            warn!(
                kind = %e.kind,
                mode = %mode,
                title = request.title(),
                "Lookup failed: {}",
                e.message
            );
        }
        outcome
    }

    /// [`acquire`](Self::acquire) with the configured default mode
    pub async fn acquire_default(
        &self,
        request: &LookupRequest,
    ) -> Result<LyricResult, AcquisitionError> {
        self.acquire(request, self.default_mode).await
    }
}
