//! Acquisition state owned by a [`ProfileController`](super::ProfileController).
//!
//! `Idle -> Loading -> {Ready | Failed}`; a new acquisition moves any state
//! back to `Loading`. Transitions are pure functions of (state, event).

use std::sync::Arc;

use super::types::ProfileRecord;

/// Where a ready record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionPath {
    /// Stored record returned by the cache read.
    Cache,
    /// Fresh record produced by the compute trigger.
    Compute,
}

/// Coarse status, for consumers that only need `{status}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Mutually exclusive acquisition states.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AcquisitionState {
    #[default]
    Idle,
    Loading {
        username: String,
        /// Forced refresh rather than an initial load.
        refresh: bool,
    },
    Ready {
        record: Arc<ProfileRecord>,
        path: AcquisitionPath,
    },
    Failed {
        username: String,
        reason: String,
    },
}

/// Inputs to the acquisition state machine.
#[derive(Debug, Clone)]
pub enum AcquisitionEvent {
    Started { username: String, refresh: bool },
    Resolved { record: ProfileRecord, path: AcquisitionPath },
    Failed { username: String, reason: String },
}

impl AcquisitionState {
    /// Apply an event, producing the next state.
    ///
    /// A resolution always replaces the previous record; records are never
    /// merged.
    pub fn apply(&self, event: AcquisitionEvent) -> AcquisitionState {
        match event {
            AcquisitionEvent::Started { username, refresh } => {
                AcquisitionState::Loading { username, refresh }
            }
            AcquisitionEvent::Resolved { record, path } => AcquisitionState::Ready {
                record: Arc::new(record),
                path,
            },
            AcquisitionEvent::Failed { username, reason } => {
                AcquisitionState::Failed { username, reason }
            }
        }
    }

    pub fn status(&self) -> AcquisitionStatus {
        match self {
            AcquisitionState::Idle => AcquisitionStatus::Idle,
            AcquisitionState::Loading { .. } => AcquisitionStatus::Loading,
            AcquisitionState::Ready { .. } => AcquisitionStatus::Ready,
            AcquisitionState::Failed { .. } => AcquisitionStatus::Failed,
        }
    }

    /// The held record, when ready.
    pub fn record(&self) -> Option<&Arc<ProfileRecord>> {
        match self {
            AcquisitionState::Ready { record, .. } => Some(record),
            _ => None,
        }
    }

    /// The failure reason, when failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            AcquisitionState::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AcquisitionState::Loading { .. })
    }

    /// Whether a forced refresh is in flight (the trigger control should be
    /// disabled while this is true).
    pub fn is_refreshing(&self) -> bool {
        matches!(self, AcquisitionState::Loading { refresh: true, .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AcquisitionState::Ready { .. } | AcquisitionState::Failed { .. }
        )
    }
}
