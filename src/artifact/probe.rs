//! Existence probes for chart artifacts.
//!
//! A probe fetches the artifact and decodes it as an image. Success means the
//! caller can render the URL without a broken-image flash. "Not generated
//! yet" and "gone for good" look the same from here (both are failed probes).

use std::future::Future;

use gitfolio_config::Config;
use thiserror::Error;
use ureq::Agent;

/// Why a probe failed. Every variant counts as one failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("invalid artifact URL: {0}")]
    InvalidUrl(String),

    #[error("artifact request returned HTTP {0}")]
    Status(u16),

    #[error("artifact request failed: {0}")]
    Transport(String),

    #[error("artifact is not a decodable image: {0}")]
    Decode(String),
}

/// Checks whether an artifact URL currently resolves to valid content.
pub trait ArtifactProbe: Send + Sync + 'static {
    fn probe(&self, url: &str) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// Fetch-and-decode probe over HTTP.
#[derive(Clone)]
pub struct HttpImageProbe {
    agent: Agent,
    allow_http: bool,
    max_bytes: u64,
}

impl HttpImageProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            agent: crate::http::agent(Some(config.cache_timeout())),
            allow_http: config.allow_http,
            max_bytes: config.artifacts.max_image_bytes as u64,
        }
    }
}

impl ArtifactProbe for HttpImageProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        crate::http::validate_api_url(url, self.allow_http).map_err(ProbeError::InvalidUrl)?;

        let agent = self.agent.clone();
        let url_owned = url.to_string();
        let limit = self.max_bytes;
        let (width, height) = tokio::task::spawn_blocking(move || {
            let response = crate::http::get(&agent, &url_owned, "image/*", limit)
                .map_err(ProbeError::Transport)?;
            if !response.is_success() {
                return Err(ProbeError::Status(response.status));
            }
            decode_dimensions(&response.body)
        })
        .await
        .map_err(|e| ProbeError::Transport(format!("probe task failed: {e}")))??;

        crate::debug_log!("ARTIFACT", "{} decoded as {}x{}", url, width, height);
        Ok(())
    }
}

/// Decode image bytes, returning the dimensions.
pub fn decode_dimensions(bytes: &[u8]) -> Result<(u32, u32), ProbeError> {
    image::load_from_memory(bytes)
        .map(|img| (img.width(), img.height()))
        .map_err(|e| ProbeError::Decode(e.to_string()))
}
