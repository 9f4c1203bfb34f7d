//! Client core for generated developer portfolios.
//!
//! [`profile`] acquires a profile record from the analysis service, reusing a
//! stored record when one exists. [`artifact`] loads the chart images that
//! record references, retrying while the service finishes rendering them.

/// Application version (root crate version).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[macro_use]
pub mod debug;

pub mod artifact;
pub mod cli;
pub mod http;
pub mod profile;
pub mod retry;
