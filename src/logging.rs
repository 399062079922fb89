//! Logging setup for tubetrend.
//!
//! Library code only emits `tracing` events. The binary installs one
//! subscriber on stderr, chosen from `--quiet` / `-v` / `-vv`, which
//! `TUBETREND_LOG`, `TUBETREND_LOG_FORMAT` and finally `RUST_LOG` override.
//!
//! ```rust
//! use tubetrend::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default());
//! tracing::info!("ready");
//! ```

use std::time::Instant;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, for reading a single run.
    Pretty,
    Compact,
    /// Compact plus thread ids and source locations.
    Full,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub timestamps: bool,
    /// Show the emitting module.
    pub target: bool,
    pub colors: bool,
}

impl Default for LogConfig {
    /// Warnings only, e.g. skipped video records.
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            timestamps: false,
            target: false,
            colors: true,
        }
    }
}

impl LogConfig {
    /// Preset for the CLI flags: quiet wins, then each `-v` adds detail.
    #[must_use]
    pub fn for_flags(quiet: bool, verbosity: u8) -> Self {
        let base = Self::default();
        match (quiet, verbosity) {
            (true, _) => Self {
                level: LogLevel::Error,
                ..base
            },
            (false, 0) => base,
            (false, 1) => Self {
                level: LogLevel::Debug,
                format: LogFormat::Pretty,
                timestamps: true,
                target: true,
                ..base
            },
            (false, _) => Self {
                level: LogLevel::Trace,
                format: LogFormat::Full,
                timestamps: true,
                target: true,
                ..base
            },
        }
    }

    #[must_use]
    pub const fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Apply `TUBETREND_LOG` / `TUBETREND_LOG_FORMAT`; unparsable values are
    /// ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(level) = env_parse("TUBETREND_LOG") {
            self.level = level;
        }
        if let Some(format) = env_parse("TUBETREND_LOG_FORMAT") {
            self.format = format;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

impl LogLevel {
    const fn directive(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Self::Off,
            "error" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            other => return Err(format!("unknown log level '{other}'")),
        };
        Ok(level)
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            "full" => Self::Full,
            other => return Err(format!("unknown log format '{other}'")),
        };
        Ok(format)
    }
}

/// `RUST_LOG` when set, otherwise this crate at `level`.
fn build_filter(level: LogLevel) -> EnvFilter {
    if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(format!("tubetrend={}", level.directive()))
    }
}

fn fmt_layer(config: &LogConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.colors)
        .with_target(config.target);

    match (config.format, config.timestamps) {
        (LogFormat::Full, _) => layer
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        (LogFormat::Pretty, true) => layer.pretty().boxed(),
        (LogFormat::Pretty, false) => layer.pretty().without_time().boxed(),
        (LogFormat::Compact, true) => layer.compact().boxed(),
        (LogFormat::Compact, false) => layer.compact().without_time().boxed(),
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(config: &LogConfig) {
    let layer = fmt_layer(config).with_filter(build_filter(config.level));
    tracing_subscriber::registry().with(layer).try_init().ok();
}

/// Install the subscriber for the CLI flags and environment.
pub fn init_cli_logging(quiet: bool, verbosity: u8, colors: bool) {
    let config = LogConfig::for_flags(quiet, verbosity)
        .with_colors(colors)
        .with_env_overrides();
    init_logging(&config);
}

/// Logs the start and outcome of a long-running operation with its duration.
pub struct OperationGuard {
    name: String,
    start: Instant,
}

impl OperationGuard {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        tracing::info!(operation = %name, "started");
        Self {
            name,
            start: Instant::now(),
        }
    }

    pub fn complete(self) {
        tracing::info!(
            operation = %self.name,
            elapsed_ms = self.start.elapsed().as_millis(),
            "finished"
        );
    }

    pub fn fail(self, error: &dyn std::error::Error) {
        tracing::error!(
            operation = %self.name,
            elapsed_ms = self.start.elapsed().as_millis(),
            %error,
            "failed"
        );
    }
}
