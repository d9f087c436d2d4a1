//! Tracing infrastructure.
//!
//! Structured logging for the sweep controller via the `tracing` and
//! `tracing-subscriber` crates:
//! - Multiple output formats (pretty, compact, JSON)
//! - Environment-based filtering (`RUST_LOG` wins over the configured level)
//! - Idempotent initialization, safe to call from tests and libraries
//!
//! # Example
//! ```no_run
//! use iv_sweep::logging::{self, LogConfig, OutputFormat};
//! use tracing::Level;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LogConfig::new(Level::DEBUG).with_format(OutputFormat::Json);
//! logging::init(config)?;
//! # Ok(())
//! # }
//! ```

use crate::config::LogSettings;
use tracing::Level;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Output format for tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed format with colors (for development)
    Pretty,
    /// Compact format (for production)
    Compact,
    /// JSON format for structured logging (for log aggregation)
    Json,
}

/// Tracing configuration options
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Level,
    /// Output format
    pub format: OutputFormat,
    /// Whether to enable ANSI colors (only for Pretty format)
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: OutputFormat::Compact,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// Create a config with the given level and default options.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Set output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable ANSI colors
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.with_ansi = enabled;
        self
    }

    /// Build a config from the `[logging]` settings table.
    pub fn from_settings(settings: &LogSettings) -> Result<Self, String> {
        Ok(Self {
            level: parse_log_level(&settings.level)?,
            format: parse_format(&settings.format)?,
            ..Default::default()
        })
    }
}

/// Initialize tracing from the `[logging]` settings table.
pub fn init_from_settings(settings: &LogSettings) -> Result<(), String> {
    init(LogConfig::from_settings(settings)?)
}

/// Initialize the global tracing subscriber.
///
/// Calling this more than once is harmless: an already-installed subscriber
/// is left in place, which is the expected situation in tests.
pub fn init(config: LogConfig) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_string(config.level)));

    match config.format {
        OutputFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_ansi(config.with_ansi)
                .with_filter(env_filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .or_else(already_initialized_is_ok)?;
        }
        OutputFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_ansi(false)
                .with_filter(env_filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .or_else(already_initialized_is_ok)?;
        }
        OutputFormat::Json => {
            let fmt_layer = fmt::layer().json().with_filter(env_filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .or_else(already_initialized_is_ok)?;
        }
    }

    Ok(())
}

fn already_initialized_is_ok(e: tracing_subscriber::util::TryInitError) -> Result<(), String> {
    if e.to_string()
        .contains("a global default trace dispatcher has already been set")
    {
        Ok(())
    } else {
        Err(format!("Failed to initialize tracing: {}", e))
    }
}

/// Parse log level string into tracing Level
fn parse_log_level(level: &str) -> Result<Level, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(format!(
            "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
            level
        )),
    }
}

/// Parse output format string
fn parse_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "pretty" => Ok(OutputFormat::Pretty),
        "compact" => Ok(OutputFormat::Compact),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!(
            "Invalid log format '{}'. Must be one of: pretty, compact, json",
            format
        )),
    }
}

fn level_to_filter_string(level: Level) -> String {
    match level {
        Level::TRACE => "trace".to_string(),
        Level::DEBUG => "debug".to_string(),
        Level::INFO => "info".to_string(),
        Level::WARN => "warn".to_string(),
        Level::ERROR => "error".to_string(),
    }
}
