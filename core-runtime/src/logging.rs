//! # Logging & Tracing Infrastructure
//!
//! Structured logging for the sync core, built on the `tracing` crate:
//! - Pretty, JSON, and compact output formats
//! - Module-level filtering via env-filter syntax
//! - Redaction of credential-bearing fields before they reach a sink
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_level(LogLevel::Debug);
//!
//! init_logging(config).expect("Failed to initialize logging");
//!
//! tracing::info!("sync core started");
//! ```
//!
//! The upload orchestrator writes one log line per state transition and per
//! file outcome, so an attempt's full history is reconstructible from the
//! log alone, replacing the dedicated upload log file older builds kept.

use crate::error::{Error, Result};
use tracing_subscriber::{
    filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Minimum level a record must have to be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Minimum log level
    pub level: LogLevel,
    /// Custom filter string (e.g., "core_sync=trace,bridge_traits=debug")
    pub filter: Option<String>,
    /// Display target module in logs
    pub display_target: bool,
    /// Display thread info
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set minimum log level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set custom filter string
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Enable or disable target display
    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    /// Enable or disable thread info
    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Initialize the logging system.
///
/// Call once during process startup; subsequent calls fail because the
/// global subscriber is already set.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    match config.format {
        LogFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(config.display_target)
                .with_thread_ids(config.display_thread_info)
                .with_thread_names(config.display_thread_info);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .map_err(|_| Error::LoggingInitialized)?;
        }
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(config.display_target)
                .with_thread_ids(config.display_thread_info);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .map_err(|_| Error::LoggingInitialized)?;
        }
        LogFormat::Compact => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(config.display_target)
                .with_thread_ids(config.display_thread_info);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .map_err(|_| Error::LoggingInitialized)?;
        }
    }

    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = if let Some(custom) = &config.filter {
        custom.clone()
    } else {
        let level = config.level.as_str();
        // Own crates at the configured level, everything else at warn
        format!(
            "warn,core_runtime={},core_sync={},bridge_traits={}",
            level, level, level
        )
    };

    EnvFilter::try_new(&filter_string)
        .map_err(|e| Error::Config(format!("invalid log filter: {}", e)))
}

/// Redact credential-bearing values before they reach a log sink.
///
/// The sync core logs session and backend interactions; field names that
/// smell like secrets are replaced wholesale, account names keep only their
/// first character.
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let lowered = field_name.to_lowercase();

    if lowered.contains("password") || lowered.contains("token") || lowered.contains("secret") {
        return "[REDACTED]".to_string();
    }

    if lowered == "user" || lowered == "email" || lowered == "account" {
        let mut chars = value.chars();
        return match chars.next() {
            Some(first) => format!("{}***[REDACTED]", first),
            None => String::new(),
        };
    }

    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.display_target);
        assert!(!config.display_thread_info);
    }

    #[test]
    fn test_builder_chaining() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_level(LogLevel::Debug)
            .with_filter("core_sync=trace")
            .with_thread_info(true);

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.filter.as_deref(), Some("core_sync=trace"));
        assert!(config.display_thread_info);
    }

    #[test]
    fn test_build_filter_defaults_to_own_crates() {
        let config = LoggingConfig::default().with_level(LogLevel::Trace);
        let filter = build_filter(&config).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("core_sync=trace"));
        assert!(rendered.contains("warn"));
    }

    #[test]
    fn test_build_filter_rejects_garbage() {
        let config = LoggingConfig::default().with_filter("core_sync=shouting");
        assert!(build_filter(&config).is_err());
    }

    #[test]
    fn test_redaction() {
        assert_eq!(redact_if_sensitive("session_token", "abc"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("password", "hunter2"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("user", "alice"), "a***[REDACTED]");
        assert_eq!(redact_if_sensitive("title", "invoice"), "invoice");
    }
}
