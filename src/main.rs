use anyhow::Result;
use clap::Parser;
use gitfolio::cli::{self, Cli, LogLevelArg};
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Routes log::info!() etc. to the temp-dir debug log; mirrors to stderr
    // when RUST_LOG is set. CLI --log-level takes precedence, then RUST_LOG,
    // then config (applied once loaded).
    gitfolio::debug::init_log_bridge(cli.log_level.map(LogLevelArg::to_level_filter));

    let config = cli::load_config(&cli)?;
    let rust_log_set = std::env::var_os("RUST_LOG").is_some();
    if let Some(level) = cli::config_log_level(&cli, &config, rust_log_set) {
        gitfolio::debug::set_log_level(level);
    }
    log::info!("Starting gitfolio {} against {}", gitfolio::VERSION, config.api_base());

    let runtime = Runtime::new()?;
    let result = runtime.block_on(cli::run(&cli, &config));

    // A probe stuck in spawn_blocking must not hold the process open.
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));

    let code = result?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
