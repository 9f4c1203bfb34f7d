//! Shared integration test helpers for gitfolio.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{MockProbe, MockSource, profile_record};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a subset
//! of helpers are used per file.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use gitfolio::artifact::{ArtifactProbe, ProbeError};
use gitfolio::profile::{ComputeResponse, ProfileRecord, ProfileSource, SourceError};
use parking_lot::Mutex;

/// Analysis service stand-in with a stored-profile map and a compute script.
#[derive(Default)]
pub struct MockSource {
    stored: Mutex<HashMap<String, ProfileRecord>>,
    /// Records the compute trigger produces, keyed by username.
    computed: Mutex<HashMap<String, ProfileRecord>>,
    /// How long the compute trigger takes.
    compute_latency: Duration,
    cache_calls: AtomicUsize,
    compute_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stored(self, record: ProfileRecord) -> Self {
        self.stored.lock().insert(record.username.clone(), record);
        self
    }

    pub fn with_computed(self, record: ProfileRecord) -> Self {
        self.computed.lock().insert(record.username.clone(), record);
        self
    }

    pub fn with_compute_latency(mut self, latency: Duration) -> Self {
        self.compute_latency = latency;
        self
    }

    pub fn cache_calls(&self) -> usize {
        self.cache_calls.load(Ordering::SeqCst)
    }

    pub fn compute_calls(&self) -> usize {
        self.compute_calls.load(Ordering::SeqCst)
    }
}

impl ProfileSource for MockSource {
    async fn cached_profile(&self, username: &str) -> Result<ProfileRecord, SourceError> {
        self.cache_calls.fetch_add(1, Ordering::SeqCst);
        let found = self.stored.lock().get(username).cloned();
        found.ok_or_else(|| SourceError::NotFound {
            username: username.to_string(),
        })
    }

    async fn compute_profile(&self, username: &str) -> Result<ComputeResponse, SourceError> {
        self.compute_calls.fetch_add(1, Ordering::SeqCst);
        if !self.compute_latency.is_zero() {
            tokio::time::sleep(self.compute_latency).await;
        }
        let computed = self.computed.lock().get(username).cloned();
        match computed {
            Some(record) => {
                // Analysing also stores the profile, as the real service does.
                self.stored
                    .lock()
                    .insert(record.username.clone(), record.clone());
                Ok(ComputeResponse::success(record))
            }
            None => Err(SourceError::Status {
                status: 500,
                detail: format!("Analysis failed: GitHub API error: 404 {username}"),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock-service"
    }
}

/// Artifact host stand-in: each URL path becomes available after a number
/// of failed probes (or never, when unlisted).
#[derive(Default)]
pub struct MockProbe {
    /// Failures to report for a URL path before it resolves.
    ready_after: Mutex<HashMap<String, usize>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `path` resolve on probe `failures + 1`.
    pub fn available_after(self, path: &str, failures: usize) -> Self {
        self.ready_after.lock().insert(path.to_string(), failures);
        self
    }

    /// Probes issued for URLs whose path is `path`.
    pub fn calls_for(&self, path: &str) -> usize {
        self.calls.lock().get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

/// Strip scheme, host, and the cache-busting query from a probe URL.
fn url_path(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    let after_scheme = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    match after_scheme.find('/') {
        Some(idx) => after_scheme[idx..].to_string(),
        None => "/".to_string(),
    }
}

impl ArtifactProbe for MockProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        let path = url_path(url);
        let call = {
            let mut calls = self.calls.lock();
            let count = calls.entry(path.clone()).or_insert(0);
            *count += 1;
            *count
        };
        match self.ready_after.lock().get(&path) {
            Some(failures) if call > *failures => Ok(()),
            Some(_) => Err(ProbeError::Status(404)),
            None => Err(ProbeError::Decode("not an image".to_string())),
        }
    }
}

/// A record shaped like the analysis service's output.
pub fn profile_record(username: &str) -> ProfileRecord {
    let mut record = ProfileRecord::new(username);
    record.analyzed_at = Some("2024-01-01T00:00:00Z".to_string());
    record.payload.insert(
        "name".to_string(),
        serde_json::Value::String(username.to_string()),
    );
    record.payload.insert(
        "stats".to_string(),
        serde_json::json!({"total_repos": 7, "total_stars": 42, "followers": 3}),
    );
    record
}
