//! Configuration system for the gitfolio portfolio client.
//!
//! This crate provides configuration loading, saving, and default values
//! for the client core. It includes:
//!
//! - Analysis service endpoint and transport limits
//! - Settle delay applied after a fresh analysis
//! - Artifact (chart) loader retry settings
//! - Log level selection

pub mod config;
pub mod defaults;
pub mod error;
mod types;

// Re-export main types for convenience
pub use config::{ArtifactConfig, Config};
pub use error::ConfigError;
pub use types::LogLevel;

/// Environment variable that overrides [`Config::api_url`].
pub const API_URL_ENV: &str = "GITFOLIO_API_URL";
