//! Structured logging with `tracing`.
//!
//! The wallet core logs operational events; it never logs key material,
//! share payloads, unlock secrets, or raw provider errors destined for
//! users. When values adjacent to secrets must be logged (key ids,
//! addresses), run them through [`redact_sensitive`].
//!
//! # Quick start
//!
//! ```no_run
//! use bursa::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default()).expect("logging init");
//! tracing::info!("wallet core started");
//! ```

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use bursa_core::LogSettings;

/// Errors from logging initialization.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The log file or its directory could not be created.
    #[error("failed to create log file: {0}")]
    FileCreation(String),

    /// The global subscriber was already set or rejected the config.
    #[error("failed to initialize logging: {0}")]
    SubscriberInit(String),

    /// The configuration contains an unknown level or format.
    #[error("invalid log configuration: {0}")]
    InvalidConfig(String),
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Everything, including per-operation detail.
    Trace,
    /// Developer diagnostics.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// Operation failures.
    Error,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(LogError::InvalidConfig(format!("unknown level {other:?}"))),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, for interactive use.
    #[default]
    Pretty,
    /// One JSON object per line, for ingestion.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(LogError::InvalidConfig(format!("unknown format {other:?}"))),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Minimum level to emit.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Log file path; stdout when `None`.
    pub file_path: Option<PathBuf>,
}

impl TryFrom<&LogSettings> for LogConfig {
    type Error = LogError;

    fn try_from(settings: &LogSettings) -> Result<Self, LogError> {
        Ok(Self {
            level: settings.level.parse()?,
            format: settings.format.parse()?,
            file_path: settings.file.clone(),
        })
    }
}

/// Install the global tracing subscriber.
///
/// Respects `RUST_LOG` when set; otherwise uses the configured level.
///
/// # Errors
///
/// Returns [`LogError::FileCreation`] when the log file cannot be opened
/// and [`LogError::SubscriberInit`] when a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()));

    let writer = match &config.file_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LogError::FileCreation(e.to_string()))?;
            }
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| LogError::FileCreation(e.to_string()))?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.file_path.is_none());

    let result = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| LogError::SubscriberInit(e.to_string()))
}

/// Redact a sensitive value for logging: keep the first and last four
/// characters, mask the middle. Values of eight characters or fewer are
/// fully masked.
#[must_use]
pub fn redact_sensitive(value: &str) -> String {
    if value.chars().count() <= 8 {
        return "***".to_string();
    }
    let head: String = value.chars().take(4).collect();
    let tail: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{head}***{tail}")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_redact_keeps_only_edges() {
        assert_eq!(redact_sensitive("sk-1234567890abcdef"), "sk-1***cdef");
    }

    #[test]
    fn test_redact_short_values_fully() {
        assert_eq!(redact_sensitive(""), "***");
        assert_eq!(redact_sensitive("secret"), "***");
        assert_eq!(redact_sensitive("12345678"), "***");
    }

    #[test]
    fn test_level_and_format_parsing() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("loud".parse::<LogLevel>().is_err());
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_config_from_core_settings() {
        let settings = LogSettings::default();
        let config = LogConfig::try_from(&settings).unwrap();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file_path.is_none());
    }
}
