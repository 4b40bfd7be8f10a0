//! Wallet configuration.
//!
//! Configuration is stored as TOML, by default at
//! `~/.bursa/config.toml`. The file covers everything the core needs at
//! construction time: where encrypted keys live, the default chain, risk
//! thresholds, and where the audit log is written.
//!
//! # Example
//!
//! ```rust
//! use bursa_core::config::WalletConfig;
//!
//! let config = WalletConfig::default()
//!     .with_default_chain("ethereum")
//!     .with_high_value_threshold("1000000000000000000");
//! config.validate().expect("default config is valid");
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::units::parse_amount;

/// Default config file name under the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Risk-analysis settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    /// Transfers above this amount (smallest unit, decimal or hex string)
    /// raise a "high value" alert.
    pub high_value_threshold: String,
    /// Recipients that raise a critical alert.
    pub deny_recipients: Vec<String>,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            // 1 unit of an 18-decimal native currency.
            high_value_threshold: "1000000000000000000".to_string(),
            deny_recipients: Vec::new(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Minimum level: "trace", "debug", "info", "warn", or "error".
    pub level: String,
    /// Output format: "pretty" or "json".
    pub format: String,
    /// Optional log file path; stdout when absent.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Top-level wallet configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Directory holding encrypted key files.
    pub keys_dir: PathBuf,
    /// Chain used when a command does not name one.
    pub default_chain: String,
    /// Directory for the tamper-evident audit log; disabled when absent.
    pub audit_dir: Option<PathBuf>,
    /// Risk-analysis settings.
    pub risk: RiskSettings,
    /// Logging settings.
    pub log: LogSettings,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keys_dir: PathBuf::from("~/.bursa/keys"),
            default_chain: "ethereum".to_string(),
            audit_dir: Some(PathBuf::from("~/.bursa/audit")),
            risk: RiskSettings::default(),
            log: LogSettings::default(),
        }
    }
}

impl WalletConfig {
    /// Set the keys directory.
    #[must_use]
    pub fn with_keys_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.keys_dir = dir.into();
        self
    }

    /// Set the default chain.
    #[must_use]
    pub fn with_default_chain(mut self, chain: impl Into<String>) -> Self {
        self.default_chain = chain.into();
        self
    }

    /// Set the high-value alert threshold (decimal or hex amount string).
    #[must_use]
    pub fn with_high_value_threshold(mut self, threshold: impl Into<String>) -> Self {
        self.risk.high_value_threshold = threshold.into();
        self
    }

    /// Set the recipient denylist.
    #[must_use]
    pub fn with_deny_recipients(mut self, recipients: Vec<String>) -> Self {
        self.risk.deny_recipients = recipients;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the default chain is
    /// empty, the risk threshold does not parse as an amount, or the log
    /// level/format is unknown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_chain.trim().is_empty() {
            return Err(ConfigError::invalid_value("default_chain", "must not be empty"));
        }
        if parse_amount(&self.risk.high_value_threshold).is_err() {
            return Err(ConfigError::invalid_value(
                "risk.high_value_threshold",
                "must be a decimal or 0x-hex integer",
            ));
        }
        match self.log.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::invalid_value(
                    "log.level",
                    format!("unknown level {other:?}"),
                ))
            }
        }
        match self.log.format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(ConfigError::invalid_value(
                    "log.format",
                    format!("unknown format {other:?}"),
                ))
            }
        }
        Ok(())
    }

    /// Load and validate a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on read failure, [`ConfigError::Parse`]
    /// on malformed TOML, and validation errors from [`Self::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config to a TOML file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on write failure and
    /// [`ConfigError::Parse`] if serialization fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::parse(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Default config file path: `~/.bursa/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HomeDirNotFound`] when the home directory
    /// cannot be determined.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(dirs::home_dir()
            .ok_or(ConfigError::HomeDirNotFound)?
            .join(".bursa")
            .join(CONFIG_FILE_NAME))
    }
}

/// Expand a leading `~` to the user's home directory.
///
/// Paths without a `~` prefix are returned unchanged.
///
/// # Errors
///
/// Returns [`ConfigError::HomeDirNotFound`] when expansion is needed but the
/// home directory cannot be determined.
pub fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
    let Ok(stripped) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
    Ok(home.join(stripped))
}
