//! Command-line interface for gitfolio.
//!
//! `show` acquires a profile through the [`ProfileController`] and then loads
//! its charts through a [`ChartSet`]; `health` pings the analysis service.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gitfolio_config::Config;

use crate::artifact::{
    ArtifactLoadState, ArtifactLoader, ArtifactStatus, ChartSet, HttpImageProbe,
};
use crate::profile::{
    AcquisitionPath, AcquisitionState, ChartKind, HttpProfileSource, ProfileController,
    ProfileRecord,
};
use crate::retry::RetryPolicy;

/// gitfolio - Generated developer portfolios from GitHub profiles
#[derive(Parser, Debug)]
#[command(name = "gitfolio")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the analysis service (overrides config and GITFOLIO_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set debug log level (overrides config and RUST_LOG)
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevelArg>,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Show the portfolio for a GitHub user
    Show {
        /// GitHub username
        username: String,

        /// Re-run the analysis instead of using a stored profile
        #[arg(short, long)]
        refresh: bool,

        /// Skip loading chart images
        #[arg(long)]
        no_charts: bool,

        /// Print the profile record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the analysis service is reachable
    Health,
}

/// Load config for this invocation: file, then environment, then flags.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load()?,
    };
    config.apply_env_overrides();
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.trim().to_string();
    }
    config.validate()?;
    Ok(config)
}

/// Level from the config file, applied only when neither `--log-level` nor
/// `RUST_LOG` already chose one for the bridge.
pub fn config_log_level(
    cli: &Cli,
    config: &Config,
    rust_log_set: bool,
) -> Option<log::LevelFilter> {
    if cli.log_level.is_some() || rust_log_set {
        return None;
    }
    Some(config.log_level.to_level_filter())
}

/// Run the parsed command, returning the process exit code.
pub async fn run(cli: &Cli, config: &Config) -> Result<i32> {
    match &cli.command {
        Commands::Show {
            username,
            refresh,
            no_charts,
            json,
        } => show(config, username, *refresh, *no_charts, *json).await,
        Commands::Health => health(config).await,
    }
}

async fn show(
    config: &Config,
    username: &str,
    refresh: bool,
    no_charts: bool,
    json: bool,
) -> Result<i32> {
    let source = HttpProfileSource::new(config);
    let controller = ProfileController::from_config(source, config);

    if refresh {
        eprintln!("Re-analyzing {}...", username.trim());
    } else {
        eprintln!("Loading {}...", username.trim());
    }

    let (record, path) = match controller.acquire(username, refresh).await {
        AcquisitionState::Ready { record, path } => (record, path),
        AcquisitionState::Failed { reason, .. } => {
            eprintln!("gitfolio: error: {reason}");
            return Ok(1);
        }
        other => {
            eprintln!(
                "gitfolio: error: acquisition ended in {:?} state",
                other.status()
            );
            return Ok(1);
        }
    };

    if json {
        let text = serde_json::to_string_pretty(&*record).context("Failed to encode profile")?;
        println!("{text}");
    } else {
        print!("{}", render_summary(&record, path));
    }

    if no_charts {
        return Ok(0);
    }

    let loader = ArtifactLoader::new(
        HttpImageProbe::new(config),
        RetryPolicy::from_config(&config.artifacts),
    );
    let mut charts = ChartSet::spawn(&record, config.api_base(), &loader);
    if charts.is_empty() {
        eprintln!("No charts referenced by this profile.");
        return Ok(0);
    }
    for (kind, state) in charts.wait_all().await {
        eprintln!("{}", render_chart_line(kind, &state));
    }
    Ok(0)
}

async fn health(config: &Config) -> Result<i32> {
    let source = HttpProfileSource::new(config);
    match source.health().await {
        Ok(body) => {
            println!("{} is healthy: {}", source.api_base(), body);
            Ok(0)
        }
        Err(e) => {
            eprintln!("gitfolio: error: {} is not healthy: {}", source.api_base(), e);
            Ok(1)
        }
    }
}

/// Human-readable profile summary, one field per line.
pub fn render_summary(record: &ProfileRecord, path: AcquisitionPath) -> String {
    let mut out = String::new();
    let name = record
        .field("name")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(record.username.as_str());
    let _ = writeln!(out, "{} (@{})", name, record.username);

    if let Some(bio) = record
        .field("bio")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
    {
        let _ = writeln!(out, "  {bio}");
    }

    if let Some(stats) = record.field("stats").and_then(|v| v.as_object()) {
        for (key, label) in [
            ("total_repos", "Repositories"),
            ("total_stars", "Stars"),
            ("followers", "Followers"),
        ] {
            if let Some(value) = stats.get(key).and_then(|v| v.as_u64()) {
                let _ = writeln!(out, "  {label}: {value}");
            }
        }
    }

    let source = match path {
        AcquisitionPath::Cache => "stored profile",
        AcquisitionPath::Compute => "fresh analysis",
    };
    match record.analyzed_at_display() {
        Some(at) => {
            let _ = writeln!(out, "  Analyzed: {at} ({source})");
        }
        None => {
            let _ = writeln!(out, "  Source: {source}");
        }
    }
    out
}

/// One line describing a chart's terminal state.
pub fn render_chart_line(kind: ChartKind, state: &ArtifactLoadState) -> String {
    match &state.status {
        ArtifactStatus::Loaded(url) => format!("{}: {}", kind.title(), url),
        ArtifactStatus::Unavailable => format!(
            "{}: unavailable after {} retries",
            kind.title(),
            state.attempt
        ),
        ArtifactStatus::Pending => format!("{}: not loaded", kind.title()),
    }
}
