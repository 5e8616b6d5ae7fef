use std::fmt;

use serde::Deserialize;
use url::Url;

/// Configuration for the lyrics-API strategy
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, e.g. `https://api.genius.com`. A full search prefix such as
    /// `https://api.genius.com/search?q=` is also accepted.
    pub base_url: String,

    /// Search endpoint path appended to `base_url`
    pub search_path: String,

    /// Bearer credential for the search endpoint
    pub token: Option<String>,

    /// Per-request timeout in seconds (default: 10)
    pub timeout_secs: u64,

    /// Strip "(Official Video)"-style noise from titles before searching
    pub optimize_query: bool,

    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.genius.com".to_string(),
            search_path: "/search".to_string(),
            token: None,
            timeout_secs: 10,
            optimize_query: false,
            user_agent: concat!("lyricscout/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    /// Full search endpoint URL
    pub fn search_endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.search_path.trim_start_matches('/')
        )
    }

    /// Search URL without the `q` parameter.
    ///
    /// When `base_url` already carries a query it is taken as the whole
    /// search prefix and `search_path` is not appended.
    pub fn search_base(&self) -> Result<Url, url::ParseError> {
        let mut base = Url::parse(&self.base_url)?;
        if base.query().is_none() {
            return Url::parse(&self.search_endpoint());
        }

        let kept: Vec<(String, String)> = base
            .query_pairs()
            .filter(|(k, _)| k != "q")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        base.set_query(None);
        if !kept.is_empty() {
            base.query_pairs_mut().extend_pairs(kept);
        }
        Ok(base)
    }

    /// The configured token, ignoring blank values
    pub fn credential(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("search_path", &self.search_path)
            .field("token", &self.credential().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("optimize_query", &self.optimize_query)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_endpoint_joins_cleanly() {
        let mut config = ApiConfig::default();
        assert_eq!(config.search_endpoint(), "https://api.genius.com/search");

        config.base_url = "http://127.0.0.1:9000/".into();
        config.search_path = "search".into();
        assert_eq!(config.search_endpoint(), "http://127.0.0.1:9000/search");
    }

    #[test]
    fn test_search_base_from_root() {
        let config = ApiConfig::default();
        assert_eq!(
            config.search_base().unwrap().as_str(),
            "https://api.genius.com/search"
        );
    }

    #[test]
    fn test_search_base_from_full_prefix() {
        let config = ApiConfig {
            base_url: "https://api.genius.com/search?q=".into(),
            ..Default::default()
        };
        assert_eq!(
            config.search_base().unwrap().as_str(),
            "https://api.genius.com/search"
        );

        let config = ApiConfig {
            base_url: "http://127.0.0.1:9000/v2/search?per_page=5&q=".into(),
            ..Default::default()
        };
        assert_eq!(
            config.search_base().unwrap().as_str(),
            "http://127.0.0.1:9000/v2/search?per_page=5"
        );
    }

    #[test]
    fn test_blank_token_is_no_credential() {
        let config = ApiConfig {
            token: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(config.credential(), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ApiConfig {
            token: Some("secret-token".into()),
            ..Default::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("<redacted>"));
    }
}
