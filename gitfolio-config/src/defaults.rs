//! Default value functions for configuration.
//!
//! Each function backs a `#[serde(default = "crate::defaults::...")]`
//! attribute on a `Config` field, so a partial config file picks up the
//! same values as `Config::default()`.

pub fn api_url() -> String {
    "http://localhost:8000".to_string()
}

pub fn cache_timeout_secs() -> u64 {
    10
}

pub fn max_response_bytes() -> usize {
    10 * 1024 * 1024
}

/// Wait after a fresh analysis before publishing the record (ms).
pub fn settle_delay_ms() -> u64 {
    500
}

pub fn artifact_max_retries() -> u32 {
    5
}

pub fn artifact_base_delay_ms() -> u64 {
    300
}

/// Head start given to the backend before the first chart probe (ms).
pub fn artifact_initial_delay_ms() -> u64 {
    200
}

pub fn artifact_max_image_bytes() -> usize {
    20 * 1024 * 1024
}
