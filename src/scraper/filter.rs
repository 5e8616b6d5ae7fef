//! Per-request allow/abort policy applied while a page is being automated.

use url::Url;

/// Analytics, ad and tracking endpoints suppressed during navigation.
const DEFAULT_BLOCKED: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "googletagservices.com",
    "googlesyndication.com",
    "googleadservices.com",
    "doubleclick.net",
    "adservice.google.com",
    "pagead2.googlesyndication.com",
    "connect.facebook.net",
    "facebook.com/tr",
    "amazon-adsystem.com",
    "adnxs.com",
    "scorecardresearch.com",
    "quantserve.com",
    "quantcount.com",
    "chartbeat.com",
    "chartbeat.net",
    "hotjar.com",
    "taboola.com",
    "outbrain.com",
    "moatads.com",
    "criteo.com",
    "criteo.net",
    "rubiconproject.com",
    "pubmatic.com",
    "casalemedia.com",
    "openx.net",
    "indexww.com",
    "bidswitch.net",
    "sharethrough.com",
    "zergnet.com",
    "newrelic.com",
    "nr-data.net",
    "sentry.io",
    "mixpanel.com",
    "segment.io",
    "cdn.segment.com",
    "branch.io",
    "/ads/",
    "/pixel",
];

/// Resource categories as reported by the automation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    Xhr,
    Fetch,
    Other,
    /// Any category without a dedicated variant (websocket, ping, manifest, ...)
    Unlisted,
}

impl ResourceKind {
    /// Parse a CDP / puppeteer style resource type name, case-insensitively.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "document" => ResourceKind::Document,
            "stylesheet" => ResourceKind::Stylesheet,
            "image" => ResourceKind::Image,
            "media" => ResourceKind::Media,
            "font" => ResourceKind::Font,
            "script" => ResourceKind::Script,
            "xhr" => ResourceKind::Xhr,
            "fetch" => ResourceKind::Fetch,
            "other" => ResourceKind::Other,
            _ => ResourceKind::Unlisted,
        }
    }

    fn is_allowed(&self) -> bool {
        matches!(
            self,
            ResourceKind::Document
                | ResourceKind::Script
                | ResourceKind::Xhr
                | ResourceKind::Fetch
                | ResourceKind::Other
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Abort,
}

/// Immutable set of blocked host/path substrings.
#[derive(Debug, Clone)]
pub struct BlockList {
    entries: Vec<String>,
}

impl Default for BlockList {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED.iter().copied())
    }
}

impl BlockList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(Into::into)
            .filter(|e: &String| !e.is_empty())
            .collect();
        Self { entries }
    }

    /// The built-in list extended with `extra` entries.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        list.entries
            .extend(extra.into_iter().map(Into::into).filter(|e: &String| !e.is_empty()));
        list
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `host_path` contains any entry as a substring.
    pub fn matches(&self, host_path: &str) -> bool {
        self.entries.iter().any(|entry| host_path.contains(entry.as_str()))
    }
}

/// Reduce a request URL to `host + path`, dropping scheme, query and fragment.
fn host_and_path(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) if url.host_str().is_some() => {
            format!("{}{}", url.host_str().unwrap_or_default(), url.path())
        }
        _ => {
            let without_scheme = raw.split_once("://").map_or(raw, |(_, rest)| rest);
            let end = without_scheme
                .find(['?', '#'])
                .unwrap_or(without_scheme.len());
            without_scheme[..end].to_string()
        }
    }
}

/// The allow/abort predicate consulted for every outgoing request.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    blocklist: BlockList,
}

impl ResourceFilter {
    pub fn new(blocklist: BlockList) -> Self {
        Self { blocklist }
    }

    pub fn blocklist(&self) -> &BlockList {
        &self.blocklist
    }

    pub fn decide(&self, kind: ResourceKind, url: &str) -> Decision {
        if !kind.is_allowed() {
            return Decision::Abort;
        }
        if self.blocklist.matches(&host_and_path(url)) {
            return Decision::Abort;
        }
        Decision::Allow
    }
}
