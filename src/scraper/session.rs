//! Page sessions and the shared browser handle they are spawned from.
//!
//! A [`BrowserHandle`] wraps one automation engine instance (a
//! [`PageFactory`]) and hands out at most `max_concurrency` live
//! [`ExtractionSession`]s at a time. Each session owns one page for one
//! lookup and is closed exactly once, either through
//! [`ExtractionSession::release`] or, if the lookup future is dropped, from
//! its `Drop` impl.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::app::AcquisitionError;
use crate::scraper::filter::ResourceFilter;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The page could not load a URL (DNS, connection, net::ERR_*).
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Protocol-level failure talking to the page.
    #[error("Browser protocol error: {0}")]
    Protocol(String),

    /// The browser is gone or refused to open a page.
    #[error("Browser unavailable: {0}")]
    Closed(String),
}

impl From<SessionError> for AcquisitionError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Navigation(_) => AcquisitionError::upstream(e.to_string()),
            SessionError::Protocol(_) => AcquisitionError::extraction(e.to_string()),
            SessionError::Closed(_) => AcquisitionError::unavailable(e.to_string()),
        }
    }
}

/// Snapshot of the first element matching a selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ElementProbe {
    /// Rendered text (`innerText`)
    pub text: Option<String>,
    /// Absolute link target, for anchors
    pub href: Option<String>,
}

/// One isolated browser page.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Route every outgoing request of this page through `filter`.
    async fn install_filter(&mut self, filter: Arc<ResourceFilter>) -> Result<(), SessionError>;

    /// Navigate and wait for the load to finish.
    async fn goto(&self, url: &str) -> Result<(), SessionError>;

    /// First element matching `selector`, if any is currently in the DOM.
    async fn probe(&self, selector: &str) -> Result<Option<ElementProbe>, SessionError>;

    /// Whether the document has finished loading.
    async fn is_loaded(&self) -> Result<bool, SessionError>;

    /// Click the first element matching `selector` and wait for the navigation it triggers.
    async fn click(&self, selector: &str) -> Result<(), SessionError>;

    async fn close(self: Box<Self>) -> Result<(), SessionError>;
}

/// Something that can open pages: the automation engine instance.
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn open_page(&self) -> Result<Box<dyn PageSession>, SessionError>;

    /// Tear the engine down. Called once at process shutdown.
    async fn shutdown(&self) -> Result<(), SessionError>;
}

/// Process-wide browser handle with bounded page capacity.
pub struct BrowserHandle {
    factory: Arc<dyn PageFactory>,
    permits: Arc<Semaphore>,
    acquire_timeout: Duration,
}

impl BrowserHandle {
    pub fn new(factory: Arc<dyn PageFactory>, max_sessions: usize, acquire_timeout: Duration) -> Self {
        Self {
            factory,
            permits: Arc::new(Semaphore::new(max_sessions.max(1))),
            acquire_timeout,
        }
    }

    /// Free session slots right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Open a page for one lookup, waiting for capacity up to the acquire timeout.
    pub async fn open_session(&self) -> Result<ExtractionSession, AcquisitionError> {
        let permit = tokio::time::timeout(self.acquire_timeout, self.permits.clone().acquire_owned())
            .await
            .map_err(|_| {
                AcquisitionError::unavailable(format!(
                    "Browser at capacity: no session slot within {:?}",
                    self.acquire_timeout
                ))
            })?
            .map_err(|_| AcquisitionError::unavailable("Browser handle is shut down"))?;

        let page = self.factory.open_page().await?;
        debug!("Opened extraction session ({} slots left)", self.available());

        Ok(ExtractionSession {
            page: Some(page),
            permit: Some(permit),
        })
    }

    /// Stop handing out sessions and tear the engine down.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.permits.close();
        self.factory.shutdown().await
    }
}

impl fmt::Debug for BrowserHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserHandle")
            .field("available", &self.available())
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

/// A page bound to one in-flight lookup.
pub struct ExtractionSession {
    page: Option<Box<dyn PageSession>>,
    permit: Option<OwnedSemaphorePermit>,
}

impl ExtractionSession {
    pub fn page(&self) -> Result<&dyn PageSession, SessionError> {
        self.page.as_deref().ok_or_else(released)
    }

    pub fn page_mut(&mut self) -> Result<&mut dyn PageSession, SessionError> {
        match self.page.as_deref_mut() {
            Some(page) => Ok(page),
            None => Err(released()),
        }
    }

    /// Close the page and give the slot back.
    pub async fn release(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!("Failed to close extraction session: {}", e);
            }
        }
        self.permit.take();
        debug!("Released extraction session");
    }
}

fn released() -> SessionError {
    SessionError::Closed("extraction session already released".into())
}

impl fmt::Debug for ExtractionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionSession")
            .field("open", &self.page.is_some())
            .field("holds_slot", &self.permit.is_some())
            .finish()
    }
}

impl Drop for ExtractionSession {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        let permit = self.permit.take();

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = page.close().await {
                        warn!("Failed to close abandoned extraction session: {}", e);
                    }
                    drop(permit);
                });
            }
            Err(_) => warn!("Extraction session dropped outside a runtime; page left open"),
        }
    }
}
