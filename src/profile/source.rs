//! The analysis-service collaborator consumed by the acquisition controller.

use std::future::Future;
use thiserror::Error;

use super::types::{ComputeResponse, ProfileRecord};

/// Errors reported by a [`ProfileSource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// No stored record for this username (an expected cache miss).
    #[error("no stored profile for '{username}'")]
    NotFound { username: String },

    /// The service answered with a non-success status.
    #[error("analysis service returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The endpoint URL was rejected before any request was made.
    #[error("invalid endpoint: {0}")]
    InvalidUrl(String),

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the expected JSON.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound { .. })
    }

    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            SourceError::Status { detail, .. } if !detail.is_empty() => detail.clone(),
            SourceError::Status { .. } => "Failed to analyze profile".to_string(),
            other => other.to_string(),
        }
    }
}

/// The two operations of the analysis service the client depends on.
///
/// Implementations must be cheap to share; the controller holds one behind
/// an `Arc` and may call it from spawned tasks.
pub trait ProfileSource: Send + Sync + 'static {
    /// Read a previously computed record. Must never trigger computation.
    fn cached_profile(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<ProfileRecord, SourceError>> + Send;

    /// Run a full analysis. Chart artifacts referenced by the returned
    /// record may not exist yet when this resolves.
    fn compute_profile(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<ComputeResponse, SourceError>> + Send;

    /// Source name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_service_detail() {
        let err = SourceError::Status {
            status: 500,
            detail: "Analysis failed: User not found".to_string(),
        };
        assert_eq!(err.user_message(), "Analysis failed: User not found");

        let bare = SourceError::Status {
            status: 502,
            detail: String::new(),
        };
        assert_eq!(bare.user_message(), "Failed to analyze profile");
    }

    #[test]
    fn test_not_found_classification() {
        let miss = SourceError::NotFound {
            username: "octocat".to_string(),
        };
        assert!(miss.is_not_found());
        assert!(!SourceError::Transport("refused".to_string()).is_not_found());
    }
}
