use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
    RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::app::{Result, ScoutError};
use crate::scraper::config::ScraperConfig;
use crate::scraper::filter::{Decision, ResourceFilter, ResourceKind};
use crate::scraper::session::{ElementProbe, PageFactory, PageSession, SessionError};

/// Chrome instance shared by every navigation lookup
pub struct ChromeBrowser {
    browser: RwLock<Option<Browser>>,
    handler: JoinHandle<()>,
    user_agent: Option<String>,
}

impl ChromeBrowser {
    /// Launch Chrome with the given configuration
    pub async fn launch(config: &ScraperConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer");

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScoutError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            ScoutError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // A single page fault surfaces here as an event error; keep draining.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("Browser handler error: {}", e);
                }
            }
            debug!("Browser handler loop ended");
        });

        info!("Browser launched (headless: {})", config.headless);

        Ok(Self {
            browser: RwLock::new(Some(browser)),
            handler,
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait]
impl PageFactory for ChromeBrowser {
    async fn open_page(&self) -> std::result::Result<Box<dyn PageSession>, SessionError> {
        let guard = self.browser.read().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| SessionError::Closed("browser has been shut down".into()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Closed(format!("Failed to create page: {}", e)))?;

        if let Some(ref ua) = self.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| SessionError::Protocol(format!("Failed to set user agent: {}", e)))?;
        }

        Ok(Box::new(ChromePage {
            page,
            interceptor: None,
        }))
    }

    async fn shutdown(&self) -> std::result::Result<(), SessionError> {
        let Some(mut browser) = self.browser.write().await.take() else {
            return Ok(());
        };

        let closed = browser
            .close()
            .await
            .map_err(|e| SessionError::Protocol(format!("Failed to close browser: {}", e)));
        if let Err(e) = browser.wait().await {
            warn!("Failed to reap browser process: {}", e);
        }
        self.handler.abort();
        info!("Browser shut down");
        closed.map(|_| ())
    }
}

/// One Chrome tab driven through CDP
pub struct ChromePage {
    page: Page,
    interceptor: Option<JoinHandle<()>>,
}

impl ChromePage {
    /// JavaScript returning text and absolute href of the first match
    fn probe_script(selector: &str) -> String {
        // serde_json produces a valid JS string literal
        let selector = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
        format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                if (!el) {{
                    return {{ found: false, text: null, href: null }};
                }}
                return {{
                    found: true,
                    text: el.innerText ?? el.textContent ?? null,
                    href: typeof el.href === 'string' ? el.href : null
                }};
            }})()
            "#
        )
    }
}

#[derive(serde::Deserialize)]
struct ProbeResult {
    found: bool,
    #[serde(flatten)]
    element: ElementProbe,
}

#[async_trait]
impl PageSession for ChromePage {
    async fn install_filter(
        &mut self,
        filter: Arc<ResourceFilter>,
    ) -> std::result::Result<(), SessionError> {
        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| SessionError::Protocol(format!("Failed to listen for requests: {}", e)))?;

        let pattern = RequestPattern::builder()
            .url_pattern("*")
            .request_stage(RequestStage::Request)
            .build();
        self.page
            .execute(EnableParams::builder().pattern(pattern).build())
            .await
            .map_err(|e| SessionError::Protocol(format!("Failed to enable interception: {}", e)))?;

        let page = self.page.clone();
        self.interceptor = Some(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let kind = ResourceKind::from_name(&format!("{:?}", event.resource_type));
                let decision = filter.decide(kind, &event.request.url);

                let sent = match decision {
                    Decision::Allow => page
                        .execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ()),
                    Decision::Abort => {
                        debug!("Blocked {:?} request to {}", kind, event.request.url);
                        page.execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ())
                    }
                };

                if let Err(e) = sent {
                    debug!("Could not resolve paused request: {}", e);
                }
            }
        }));

        Ok(())
    }

    async fn goto(&self, url: &str) -> std::result::Result<(), SessionError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn probe(&self, selector: &str) -> std::result::Result<Option<ElementProbe>, SessionError> {
        let result: ProbeResult = self
            .page
            .evaluate(Self::probe_script(selector))
            .await
            .map_err(|e| SessionError::Protocol(format!("Script execution failed: {}", e)))?
            .into_value()
            .map_err(|e| SessionError::Protocol(format!("Failed to parse result: {:?}", e)))?;

        Ok(result.found.then_some(result.element))
    }

    async fn is_loaded(&self) -> std::result::Result<bool, SessionError> {
        let state: String = self
            .page
            .evaluate("document.readyState")
            .await
            .map_err(|e| SessionError::Protocol(format!("Script execution failed: {}", e)))?
            .into_value()
            .map_err(|e| SessionError::Protocol(format!("Failed to parse result: {:?}", e)))?;
        Ok(state == "complete")
    }

    async fn click(&self, selector: &str) -> std::result::Result<(), SessionError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| SessionError::Protocol(format!("Element {} not found: {}", selector, e)))?;

        element
            .click()
            .await
            .map_err(|e| SessionError::Protocol(format!("Click on {} failed: {}", selector, e)))?;

        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| SessionError::Navigation(format!("Navigation after click failed: {}", e)))?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> std::result::Result<(), SessionError> {
        let ChromePage { page, interceptor } = *self;
        if let Some(interceptor) = interceptor {
            interceptor.abort();
        }
        let result = page
            .close()
            .await
            .map_err(|e| SessionError::Protocol(format!("Failed to close page: {}", e)));
        if let Err(ref e) = result {
            warn!("{}", e);
        }
        result
    }
}
