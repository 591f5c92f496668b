use crate::error::ConfigError;
use analytics::AlertThresholds;
use core_types::Currency;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section is optional in the file; missing values fall back to the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub alerts: AlertThresholds,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Tunables for the analytics engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Periods per year used to annualize the Sharpe ratio (252 trading days).
    pub annualization_days: u32,
    /// Groups with fewer trades are not eligible for "best" / "worst" callouts.
    pub min_group_trades: usize,
}

/// How reports are rendered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub currency: Currency,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive such as `info` or `analytics=debug`. `RUST_LOG` takes precedence.
    pub filter: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            annualization_days: 252,
            min_group_trades: 3,
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency: Currency::Dollar,
            format: OutputFormat::Table,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
            file_prefix: "tradelog.log".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analytics.annualization_days == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.annualization_days must be at least 1".to_string(),
            ));
        }
        if self.analytics.min_group_trades == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.min_group_trades must be at least 1".to_string(),
            ));
        }
        self.alerts
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
