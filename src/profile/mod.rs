//! Profile acquisition for generated portfolios.
//!
//! This module decides whether to reuse a stored profile or trigger a fresh
//! (slow) analysis on the service, and exposes the outcome as an owned state
//! machine:
//!
//! - **Types** (`types`): `ProfileRecord`, chart references, compute envelope
//! - **Source** (`source`): the service collaborator trait and its errors
//! - **HTTP source** (`http_source`): ureq-backed implementation
//! - **State** (`state`): `AcquisitionState` and its pure transitions
//! - **Controller** (`controller`): cache-or-compute orchestration with refresh

mod controller;
mod http_source;
mod source;
mod state;
mod types;

pub use controller::ProfileController;
pub use http_source::HttpProfileSource;
pub use source::{ProfileSource, SourceError};
pub use state::{AcquisitionEvent, AcquisitionPath, AcquisitionState, AcquisitionStatus};
pub use types::{ChartKind, ChartRefs, ComputeResponse, ProfileRecord, cache_bust_stamp};
