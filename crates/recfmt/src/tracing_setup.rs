//! Structured logging setup.
//!
//! Logs always go to stderr so that records printed on stdout stay
//! machine-readable.

use std::env;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// `EnvFilter` directive, e.g. `warn` or `recfmt=debug`.
    pub log_level: String,
    /// Output format.
    pub log_format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl TracingConfig {
    /// Read `RECFMT_LOG_LEVEL` and `RECFMT_LOG_FORMAT`.
    ///
    /// An unrecognised `RECFMT_LOG_FORMAT` is an error.
    pub fn from_env() -> Result<Self, TracingError> {
        let defaults = Self::default();
        let log_format = match env::var("RECFMT_LOG_FORMAT") {
            Ok(format) => format.parse()?,
            Err(_) => defaults.log_format,
        };
        Ok(Self {
            log_level: env::var("RECFMT_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
        })
    }

    /// Debug level, keeping the format.
    pub fn verbose(mut self) -> Self {
        self.log_level = "debug".to_string();
        self
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-field text with file and line.
    #[default]
    Text,
    /// Single-line text without targets.
    Compact,
}

impl FromStr for LogFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" => Ok(LogFormat::Text),
            "compact" => Ok(LogFormat::Compact),
            other => Err(TracingError::UnknownFormat(other.to_string())),
        }
    }
}

/// Tracing initialization errors.
#[derive(Debug, Error)]
pub enum TracingError {
    /// A global subscriber is already installed.
    #[error("Failed to initialize tracing: {0}")]
    InitError(String),

    /// Unrecognised log format name.
    #[error("unknown log format: {0}")]
    UnknownFormat(String),
}

/// Initialize tracing from the environment.
pub fn init_tracing() -> Result<(), TracingError> {
    init_tracing_with_config(&TracingConfig::from_env()?)
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level` when set. Fails if a
/// subscriber is already installed.
pub fn init_tracing_with_config(config: &TracingConfig) -> Result<(), TracingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let json = (config.log_format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
    });
    let text = (config.log_format == LogFormat::Text).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
    });
    let compact = (config.log_format == LogFormat::Compact).then(|| {
        fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .with(compact)
        .try_init()
        .map_err(|e| TracingError::InitError(e.to_string()))
}
