//! Configuration management for the biblioteca core

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Loan business rules
#[derive(Debug, Deserialize, Clone)]
pub struct LoanRulesConfig {
    /// Active loans a single member may hold at once
    pub max_loans_per_member: usize,
    /// Whole days after which an active loan counts as overdue
    pub overdue_after_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationsConfig {
    /// Auto-dismiss interval for transient UI messages
    pub dismiss_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub loans: LoanRulesConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix BIBLIOTECA_)
            .add_source(
                Environment::with_prefix("BIBLIOTECA")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for LoanRulesConfig {
    fn default() -> Self {
        Self {
            max_loans_per_member: 5,
            overdue_after_days: 30,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { dismiss_seconds: 3 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
