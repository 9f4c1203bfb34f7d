use parking_lot::Mutex;
/// Debugging infrastructure for gitfolio
///
/// Controlled by DEBUG_LEVEL environment variable:
/// - 0 or unset: No debugging
/// - 1: Errors only
/// - 2: Info level (acquisition and chart lifecycle)
/// - 3: Debug level (individual probes, backoff delays)
/// - 4: Trace level (every state transition)
///
/// All output goes to `gitfolio_debug.log` in the system temp directory,
/// keeping stdout free for command output.
///
/// `init_log_bridge` additionally routes `log` crate records into the same
/// file, mirroring them to stderr when `RUST_LOG` is set.
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Debug level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl DebugLevel {
    fn from_env() -> Self {
        match std::env::var("DEBUG_LEVEL") {
            Ok(val) => Self::parse(&val),
            Err(_) => DebugLevel::Off,
        }
    }

    fn parse(val: &str) -> Self {
        match val.trim().parse::<u8>() {
            Ok(1) => DebugLevel::Error,
            Ok(2) => DebugLevel::Info,
            Ok(3) => DebugLevel::Debug,
            Ok(4) => DebugLevel::Trace,
            _ => DebugLevel::Off,
        }
    }

    fn from_log_level(level: log::Level) -> Self {
        match level {
            log::Level::Error => DebugLevel::Error,
            log::Level::Warn | log::Level::Info => DebugLevel::Info,
            log::Level::Debug => DebugLevel::Debug,
            log::Level::Trace => DebugLevel::Trace,
        }
    }

    fn from_level_filter(filter: log::LevelFilter) -> Self {
        match filter.to_level() {
            Some(level) => Self::from_log_level(level),
            None => DebugLevel::Off,
        }
    }
}

/// Path of the debug log file.
pub fn log_path() -> std::path::PathBuf {
    std::env::temp_dir().join("gitfolio_debug.log")
}

/// Global debug logger
struct DebugLogger {
    level: DebugLevel,
    file: Option<std::fs::File>,
}

impl DebugLogger {
    fn new() -> Self {
        let mut logger = DebugLogger {
            level: DebugLevel::Off,
            file: None,
        };
        logger.raise_level(DebugLevel::from_env());
        logger
    }

    /// Raise the active level, opening the log file on first use.
    fn raise_level(&mut self, level: DebugLevel) {
        if level <= self.level {
            return;
        }
        self.level = level;
        if self.file.is_some() {
            return;
        }

        // Silently fail if the log file can't be opened; logging must never
        // interfere with command output.
        if let Ok(f) = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(log_path())
        {
            self.file = Some(f);
            self.write_raw(&format!(
                "\n{}\ngitfolio debug session started at {} (level={:?})\n{}\n",
                "=".repeat(80),
                get_timestamp(),
                level,
                "=".repeat(80)
            ));
        }
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.file {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
    }

    fn log(&mut self, level: DebugLevel, category: &str, msg: &str) {
        if level <= self.level {
            let timestamp = get_timestamp();
            let level_str = match level {
                DebugLevel::Error => "ERROR",
                DebugLevel::Info => "INFO ",
                DebugLevel::Debug => "DEBUG",
                DebugLevel::Trace => "TRACE",
                DebugLevel::Off => return,
            };
            self.write_raw(&format!(
                "[{}] [{}] [{}] {}\n",
                timestamp, level_str, category, msg
            ));
        }
    }
}

static LOGGER: OnceLock<Mutex<DebugLogger>> = OnceLock::new();

fn get_logger() -> &'static Mutex<DebugLogger> {
    LOGGER.get_or_init(|| Mutex::new(DebugLogger::new()))
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Check if debugging is enabled at given level
pub fn is_enabled(level: DebugLevel) -> bool {
    let logger = get_logger().lock();
    level <= logger.level
}

/// Log a message at specified level
pub fn log(level: DebugLevel, category: &str, msg: &str) {
    let mut logger = get_logger().lock();
    logger.log(level, category, msg);
}

/// Log formatted message
pub fn logf(level: DebugLevel, category: &str, args: fmt::Arguments) {
    if is_enabled(level) {
        log(level, category, &format!("{}", args));
    }
}

// Convenience macros for logging
#[macro_export]
macro_rules! debug_error {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Error, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_info {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Info, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_log {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Debug, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_trace {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Trace, $category, format_args!($($arg)*))
    };
}

// ── log crate bridge ───────────────────────────────────────────────────

struct LogBridge {
    mirror_stderr: bool,
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = record.args().to_string();
        crate::debug::log(
            DebugLevel::from_log_level(record.level()),
            record.target(),
            &msg,
        );
        if self.mirror_stderr {
            eprintln!("[{}] {}: {}", record.level(), record.target(), msg);
        }
    }

    fn flush(&self) {}
}

/// Route `log` crate records into the debug log file.
///
/// `level` (from the CLI) takes precedence; otherwise `RUST_LOG` is
/// consulted as a plain level name. With neither, the bridge starts `Off`
/// until [`set_log_level`] applies the config. When `RUST_LOG` is set,
/// records are also mirrored to stderr. Calling this more than once only
/// updates the level.
pub fn init_log_bridge(level: Option<log::LevelFilter>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = resolve_filter(level, rust_log.as_deref());

    let bridge = LogBridge {
        mirror_stderr: rust_log.is_some(),
    };
    let _ = log::set_boxed_logger(Box::new(bridge));
    set_log_level(filter);
}

/// Apply a level chosen after startup, such as the config's `log_level`.
///
/// The debug file level is only ever raised, so `DEBUG_LEVEL` still wins
/// over a quieter setting.
pub fn set_log_level(filter: log::LevelFilter) {
    get_logger()
        .lock()
        .raise_level(DebugLevel::from_level_filter(filter));
    log::set_max_level(filter);
}

/// An unparseable `RUST_LOG` (e.g. `gitfolio=debug`) still enables warnings.
fn resolve_filter(level: Option<log::LevelFilter>, rust_log: Option<&str>) -> log::LevelFilter {
    level
        .or_else(|| rust_log.map(|v| parse_level_filter(v).unwrap_or(log::LevelFilter::Warn)))
        .unwrap_or(log::LevelFilter::Off)
}

fn parse_level_filter(value: &str) -> Option<log::LevelFilter> {
    value.trim().parse::<log::LevelFilter>().ok()
}
