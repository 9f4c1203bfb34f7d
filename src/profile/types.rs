//! Profile record types exchanged with the analysis service.
//!
//! The client only interprets `username`, `analyzed_at`, and `charts`; every
//! other field of the service's JSON is carried through untouched in
//! [`ProfileRecord::payload`] for the rendering layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One analysed profile as produced by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// External key of the profile.
    pub username: String,

    /// Backend timestamp of the analysis (ISO 8601). Never validated locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<String>,

    /// Chart artifact paths, relative to the service base URL.
    #[serde(default)]
    pub charts: ChartRefs,

    /// Every other field (stats, languages, repositories, scores, ...).
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl ProfileRecord {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            analyzed_at: None,
            charts: ChartRefs::default(),
            payload: serde_json::Map::new(),
        }
    }

    /// Parsed `analyzed_at`, if present and RFC 3339.
    pub fn analyzed_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.analyzed_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// `analyzed_at` formatted for display, falling back to the raw text.
    pub fn analyzed_at_display(&self) -> Option<String> {
        match self.analyzed_at_utc() {
            Some(dt) => Some(dt.format("%Y-%m-%d %H:%M").to_string()),
            None => self.analyzed_at.clone(),
        }
    }

    /// Age of the analysis relative to `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.analyzed_at_utc().map(|at| now.signed_duration_since(at))
    }

    /// Look up an opaque payload field.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.payload.get(key)
    }
}

/// Kinds of chart artifact a profile may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Languages,
    Stars,
    Contributions,
}

impl ChartKind {
    /// All variants in display order.
    pub fn all() -> &'static [ChartKind] {
        &[ChartKind::Languages, ChartKind::Stars, ChartKind::Contributions]
    }

    /// Key used in the `charts` object.
    pub fn key(&self) -> &'static str {
        match self {
            ChartKind::Languages => "languages",
            ChartKind::Stars => "stars",
            ChartKind::Contributions => "contributions",
        }
    }

    /// Human-readable chart title.
    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Languages => "Language Distribution",
            ChartKind::Stars => "Star Growth Timeline",
            ChartKind::Contributions => "Contribution Activity",
        }
    }
}

/// Artifact reference paths from a profile's `charts` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributions: Option<String>,
}

impl ChartRefs {
    pub fn get(&self, kind: ChartKind) -> Option<&str> {
        let path = match kind {
            ChartKind::Languages => &self.languages,
            ChartKind::Stars => &self.stars,
            ChartKind::Contributions => &self.contributions,
        };
        path.as_deref().filter(|p| !p.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        ChartKind::all().iter().all(|kind| self.get(*kind).is_none())
    }

    /// Absolute, cache-busted URLs for every present chart.
    ///
    /// Each path is appended to `api_base` and suffixed with `t={stamp}` so a
    /// re-generated chart at the same path is not served from a stale cache.
    pub fn resolve(&self, api_base: &str, stamp: i64) -> Vec<(ChartKind, String)> {
        let base = api_base.trim_end_matches('/');
        ChartKind::all()
            .iter()
            .filter_map(|kind| {
                self.get(*kind).map(|path| {
                    let separator = if path.contains('?') { '&' } else { '?' };
                    let url = if path.starts_with("http://") || path.starts_with("https://") {
                        format!("{path}{separator}t={stamp}")
                    } else if path.starts_with('/') {
                        format!("{base}{path}{separator}t={stamp}")
                    } else {
                        format!("{base}/{path}{separator}t={stamp}")
                    };
                    (*kind, url)
                })
            })
            .collect()
    }
}

/// Current time as a cache-busting stamp (milliseconds since the epoch).
pub fn cache_bust_stamp() -> i64 {
    Utc::now().timestamp_millis()
}

/// Envelope returned by the compute trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<ProfileRecord>,
}

impl ComputeResponse {
    /// Wrap a record the way the service does on success.
    pub fn success(record: ProfileRecord) -> Self {
        Self {
            status: Some("success".to_string()),
            message: Some(format!("Successfully analyzed profile: {}", record.username)),
            data: Some(record),
        }
    }
}
