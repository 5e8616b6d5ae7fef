use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use crate::app::AcquisitionError;
use crate::fetcher::ApiConfig;

/// reqwest client shared by the two API calls of a lookup
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ApiConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }

    /// GET a JSON document, authenticating with `token` when given
    pub async fn get_json(&self, url: &str, token: Option<&str>) -> Result<Value, AcquisitionError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut request = self.client.get(url).headers(headers);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = check_status(request.send().await?).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| AcquisitionError::upstream(format!("Malformed upstream response: {}", e)))
    }

    /// GET a page body as text
    pub async fn get_text(&self, url: &str) -> Result<String, AcquisitionError> {
        let response = check_status(self.client.get(url).send().await?).await?;
        Ok(response.text().await?)
    }
}

/// Pass 2xx responses through; classify everything else
async fn check_status(response: Response) -> Result<Response, AcquisitionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = upstream_message(&body).unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(AcquisitionError::auth(format!("Upstream rejected credential: {}", detail)))
        }
        _ => Err(AcquisitionError::upstream(format!(
            "Upstream returned {}: {}",
            status.as_u16(),
            detail
        ))),
    }
}

/// Error text from an upstream error body, when it carries one
pub(crate) fn upstream_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = [
        value.get("error_description"),
        value.get("error"),
        value.pointer("/meta/message"),
    ]
    .into_iter()
    .flatten()
    .find_map(|v| v.as_str().filter(|s| !s.is_empty()).map(str::to_string));
    message
}
