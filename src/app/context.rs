use std::sync::Arc;

use tracing::{info, warn};

use crate::app::error::{Result, ScoutError};
use crate::config::Config;
use crate::dispatch::{AcquisitionMode, Dispatcher};
use crate::fetcher::ApiLookupEngine;
use crate::scraper::{BrowserHandle, ChromeBrowser, NavigationEngine};

pub struct AppContext {
    pub config: Config,
    pub dispatcher: Arc<Dispatcher>,
    browser: Option<Arc<BrowserHandle>>,
}

impl AppContext {
    /// Build the engines for the configured mode.
    ///
    /// The API engine is always available. Chrome is only launched when the
    /// configured mode is `browser`.
    pub async fn new(config: Config) -> Result<Self> {
        let mode = config.acquisition.mode;
        let api = Arc::new(ApiLookupEngine::new(config.api.clone())?);
        let mut dispatcher = Dispatcher::new(mode).with_api(api);

        if mode == AcquisitionMode::Api && config.api.credential().is_none() {
            warn!("No API token configured; the search endpoint may reject requests");
        }

        let browser = match mode {
            AcquisitionMode::Browser => {
                let chrome = Arc::new(ChromeBrowser::launch(&config.scraper).await?);
                let handle = Arc::new(BrowserHandle::new(
                    chrome,
                    config.scraper.max_concurrency,
                    config.scraper.acquire_timeout(),
                ));
                let engine = NavigationEngine::new(handle.clone(), config.scraper.clone());
                dispatcher = dispatcher.with_browser(Arc::new(engine));
                Some(handle)
            }
            AcquisitionMode::Api => None,
        };

        info!("Lookup mode: {}", mode);
        Ok(Self {
            config,
            dispatcher: Arc::new(dispatcher),
            browser,
        })
    }

    /// Close the shared browser, if one was launched.
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(handle) = &self.browser {
            info!("Shutting down browser");
            handle
                .shutdown()
                .await
                .map_err(|e| ScoutError::Browser(e.to_string()))?;
        }
        Ok(())
    }
}
