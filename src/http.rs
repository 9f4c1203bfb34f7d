//! HTTP client helper with native-tls support.
//!
//! Builds ureq agents for the analysis service and chart probes, enforces the
//! URL scheme policy, and performs size-limited GET requests. Non-2xx
//! responses are returned as data rather than errors so callers can tell a
//! 404 cache miss from a transport failure.

use std::time::Duration;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("gitfolio/", env!("CARGO_PKG_VERSION"));

/// Loopback hosts that may be reached over plain HTTP without opting in.
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]", "::1"];

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body (bounded by the caller's limit).
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 text, lossily converted.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Validate that a URL may be requested.
///
/// Enforces:
/// - `https` is always allowed
/// - `http` is allowed for loopback hosts, or for any host when `allow_http`
/// - every other scheme (ftp, file://, ...) is rejected
pub fn validate_api_url(url: &str, allow_http: bool) -> Result<(), String> {
    let parsed = url::Url::parse(url).map_err(|e| format!("Invalid URL '{}': {}", url, e))?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" => {
            let host = parsed.host_str().unwrap_or("");
            if allow_http || LOOPBACK_HOSTS.contains(&host) {
                Ok(())
            } else {
                Err(format!(
                    "Insecure HTTP to '{}' rejected. Use HTTPS, or set `allow_http: true` \
                     in the config to permit it. URL: {}",
                    host, url
                ))
            }
        }
        scheme => Err(format!(
            "Unsupported URL scheme '{}'; only http and https are allowed. URL: {}",
            scheme, url
        )),
    }
}

/// Create an HTTP agent configured with native-tls.
///
/// `timeout` becomes the global per-request timeout; `None` leaves the
/// transport default in place. Status codes are not turned into errors.
pub fn agent(timeout: Option<Duration>) -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .timeout_global(timeout)
        .http_status_as_error(false)
        .build()
        .into()
}

/// Perform a GET request and read at most `limit` bytes of the body.
///
/// Blocking; async callers run this inside `spawn_blocking`.
///
/// # Errors
///
/// Returns an error string if the connection fails (DNS, connect, TLS,
/// timeout) or the body cannot be read within `limit`. HTTP error statuses
/// are reported through [`HttpResponse::status`].
pub fn get(agent: &Agent, url: &str, accept: &str, limit: u64) -> Result<HttpResponse, String> {
    let mut response = agent
        .get(url)
        .header("User-Agent", USER_AGENT)
        .header("Accept", accept)
        .call()
        .map_err(|e| format!("Request to '{}' failed: {}", url, e))?;

    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .with_config()
        .limit(limit)
        .read_to_vec()
        .map_err(|e| {
            format!(
                "Failed to read response body from '{}': {}. \
                 The response may have been truncated or exceeded {} bytes.",
                url, e, limit
            )
        })?;

    crate::debug_trace!("HTTP", "GET {} -> {} ({} bytes)", url, status, body.len());

    Ok(HttpResponse { status, body })
}
