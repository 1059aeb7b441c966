//! Logging setup for tests that use request doubles.
//!
//! The request double emits `tracing` events at `debug` and `trace` level
//! when its state changes: header freeze, query cache population, stream
//! hand-off and multipart cursor movement. Nothing is printed unless a
//! subscriber is installed.
//!
//! ```
//! use testhost_core::logging::*;
//!
//! // Safe to call from every test; only the first call installs anything
//! LogConfig::new().level(LogLevel::Trace).format(LogFormat::Compact).init();
//!
//! debug!("Request double ready");
//! ```

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::{MakeWriter, TestWriter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

pub use tracing::{debug, error, info, trace, warn};

/// Verbosity threshold for captured events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Cursor movement, query parsing and stream hand-off
    Trace,
    /// Header freeze and reused stream sources
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    /// Directive text understood by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// How each event is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured, machine-readable
    Json,
    /// Multi-line, for reading a single failing test
    Pretty,
    /// One line per event
    Compact,
}

/// Test logging configuration.
///
/// Output goes through the test writer, so the harness captures it per
/// test and only shows it for failures.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Print the emitting module with each event
    pub targets: bool,
    /// Filter directives; takes precedence over `level` when valid
    pub env_filter: Option<String>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    /// Use filter directives such as `"testhost_core=trace"`.
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// The explicit directives if they parse, else `RUST_LOG`, else the
    /// configured level.
    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.as_str());
        match &self.env_filter {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }

    /// Build a subscriber that writes to `writer`.
    ///
    /// Use it with `tracing::subscriber::with_default` to scope logging to
    /// one block, or let [`LogConfig::init`] install it globally.
    pub fn subscriber<W>(&self, writer: W) -> Box<dyn Subscriber + Send + Sync>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let registry = tracing_subscriber::registry().with(self.env_filter());

        match self.format {
            LogFormat::Json => Box::new(
                registry.with(
                    fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(self.targets),
                ),
            ),
            LogFormat::Pretty => Box::new(
                registry.with(
                    fmt::layer()
                        .pretty()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(self.targets),
                ),
            ),
            LogFormat::Compact => Box::new(
                registry.with(
                    fmt::layer()
                        .compact()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(self.targets)
                        .with_file(false)
                        .with_line_number(false),
                ),
            ),
        }
    }

    /// Install the global subscriber, writing through the test writer.
    ///
    /// Returns `false` if a subscriber was already installed, which is the
    /// normal case for every test after the first.
    pub fn init(self) -> bool {
        tracing::subscriber::set_global_default(self.subscriber(TestWriter::default())).is_ok()
    }
}

impl Default for LogConfig {
    /// Compact output at INFO level
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            targets: true,
            env_filter: None,
        }
    }
}
