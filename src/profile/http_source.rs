//! HTTP implementation of [`ProfileSource`] against the analysis service.
//!
//! Endpoints:
//! - `GET {api}/data/{username}`: stored record, 404 when absent or expired
//! - `GET {api}/analyze/{username}`: full analysis, `{status, message, data}`
//! - `GET {api}/health`: service health
//!
//! ureq is synchronous, so every request runs on the blocking pool via
//! `spawn_blocking`.

use gitfolio_config::Config;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use ureq::Agent;

use super::source::{ProfileSource, SourceError};
use super::types::{ComputeResponse, ProfileRecord};
use crate::http::HttpResponse;

/// Analysis service client.
#[derive(Clone)]
pub struct HttpProfileSource {
    api_base: String,
    allow_http: bool,
    max_response_bytes: u64,
    /// Agent for cheap reads, bounded by `cache_timeout_secs`.
    cache_agent: Agent,
    /// Agent for the compute trigger; unbounded unless configured.
    compute_agent: Agent,
}

impl HttpProfileSource {
    pub fn new(config: &Config) -> Self {
        Self {
            api_base: config.api_base().to_string(),
            allow_http: config.allow_http,
            max_response_bytes: config.max_response_bytes as u64,
            cache_agent: crate::http::agent(Some(config.cache_timeout())),
            compute_agent: crate::http::agent(config.compute_timeout()),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build `{api_base}/{segments...}` with each segment percent-encoded.
    ///
    /// Empty, `.` and `..` segments are rejected; the URL parser would
    /// otherwise collapse them into a different route.
    pub fn endpoint(&self, segments: &[&str]) -> Result<String, SourceError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(SourceError::InvalidUrl(format!(
                "path segment '{}' is not allowed",
                bad
            )));
        }
        let mut url = url::Url::parse(&self.api_base)
            .map_err(|e| SourceError::InvalidUrl(format!("'{}': {}", self.api_base, e)))?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                SourceError::InvalidUrl(format!("'{}' cannot be a base URL", self.api_base))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url.to_string())
    }

    /// Query the service's health endpoint.
    pub async fn health(&self) -> Result<serde_json::Value, SourceError> {
        let url = self.endpoint(&["health"])?;
        let response = self.fetch(&self.cache_agent, url).await?;
        if !response.is_success() {
            return Err(status_error(&response));
        }
        decode(&response)
    }

    async fn fetch(&self, agent: &Agent, url: String) -> Result<HttpResponse, SourceError> {
        crate::http::validate_api_url(&url, self.allow_http).map_err(SourceError::InvalidUrl)?;

        let agent = agent.clone();
        let limit = self.max_response_bytes;
        crate::debug_log!("HTTP", "GET {}", url);
        tokio::task::spawn_blocking(move || {
            crate::http::get(&agent, &url, "application/json", limit)
        })
        .await
        .map_err(|e| SourceError::Transport(format!("request task failed: {e}")))?
        .map_err(SourceError::Transport)
    }
}

impl ProfileSource for HttpProfileSource {
    async fn cached_profile(&self, username: &str) -> Result<ProfileRecord, SourceError> {
        let url = self.endpoint(&["data", username])?;
        let response = self.fetch(&self.cache_agent, url).await?;

        match response.status {
            404 => Err(SourceError::NotFound {
                username: username.to_string(),
            }),
            _ if response.is_success() => decode(&response),
            _ => Err(status_error(&response)),
        }
    }

    async fn compute_profile(&self, username: &str) -> Result<ComputeResponse, SourceError> {
        let url = self.endpoint(&["analyze", username])?;
        let response = self.fetch(&self.compute_agent, url).await?;

        if response.is_success() {
            decode(&response)
        } else {
            Err(status_error(&response))
        }
    }

    fn name(&self) -> &str {
        &self.api_base
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, SourceError> {
    serde_json::from_slice(&response.body).map_err(|e| SourceError::Decode(e.to_string()))
}

fn status_error(response: &HttpResponse) -> SourceError {
    SourceError::Status {
        status: response.status,
        detail: error_detail(&response.body),
    }
}

/// Extract the service's `{"detail": ...}` error message, if any.
fn error_detail(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => String::new(),
    }
}
