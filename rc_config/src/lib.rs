//! ABOUTME: Configuration management with validation and environment loading
//! ABOUTME: Handles all application settings from environment variables and files

use config::{Config as ConfigBuilder, Environment, File};
use rc_core::{Error, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main configuration struct
#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub database: DatabaseConfig,
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
    #[validate(nested)]
    pub status: StatusConfig,
    #[validate(nested)]
    pub listing: ListingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DatabaseConfig {
    /// Path to an existing SQLite database file
    #[validate(length(min = 1))]
    pub path: String,
    #[validate(range(min = 1, max = 100))]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "rollcall.db".to_string(),
            pool_size: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TelemetryConfig {
    /// "production" switches log output to JSON
    #[validate(length(min = 1))]
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
        }
    }
}

/// Thresholds for deriving an activist's status from attendance
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct StatusConfig {
    /// Days without attendance after which an activist is former
    #[validate(range(min = 1, max = 3650))]
    pub former_after_days: u32,
    /// Window since first event in which an activist can still be new
    #[validate(range(min = 1, max = 3650))]
    pub new_within_days: u32,
    /// Event count at which an activist stops being new
    #[validate(range(min = 1, max = 1000))]
    pub new_max_events: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            former_after_days: 60,
            new_within_days: 90,
            new_max_events: 5,
        }
    }
}

/// Range listing defaults
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ListingConfig {
    /// Page size used when the caller gives none; 0 means unlimited
    #[validate(range(min = 0, max = 10000))]
    pub default_limit: i64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}

impl Config {
    /// Load configuration from defaults, an optional rollcall config file, and the environment
    pub fn load() -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // Set defaults first
        builder = builder
            .set_default("database.path", "rollcall.db")?
            .set_default("database.pool_size", 5)?
            .set_default("telemetry.environment", "development")?
            .set_default("status.former_after_days", 60)?
            .set_default("status.new_within_days", 90)?
            .set_default("status.new_max_events", 5)?
            .set_default("listing.default_limit", 50)?;

        // Multi-word keys don't survive the "_" separator, map them by hand
        let overrides = [
            ("ROLLCALL_DATABASE_POOL_SIZE", "database.pool_size"),
            ("ROLLCALL_STATUS_FORMER_AFTER_DAYS", "status.former_after_days"),
            ("ROLLCALL_STATUS_NEW_WITHIN_DAYS", "status.new_within_days"),
            ("ROLLCALL_STATUS_NEW_MAX_EVENTS", "status.new_max_events"),
            ("ROLLCALL_LISTING_DEFAULT_LIMIT", "listing.default_limit"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        // Optional rollcall.toml (or .json/.yaml) in the working directory
        builder = builder.add_source(File::with_name("rollcall").required(false));

        // Load from environment variables with ROLLCALL_ prefix (highest priority)
        builder = builder.add_source(
            Environment::with_prefix("ROLLCALL")
                .try_parsing(true)
                .separator("_"),
        );

        let config = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build config: {}", e)))?;

        let parsed: Config = config
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to deserialize config: {}", e)))?;

        parsed
            .validate()
            .map_err(|e| Error::Config(format!("Config validation failed: {}", e)))?;

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Use a mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "ROLLCALL_DATABASE_PATH",
        "ROLLCALL_DATABASE_POOL_SIZE",
        "ROLLCALL_TELEMETRY_ENVIRONMENT",
        "ROLLCALL_STATUS_FORMER_AFTER_DAYS",
        "ROLLCALL_LISTING_DEFAULT_LIMIT",
    ];

    fn clear_vars() {
        for key in VARS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_config_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_vars();

        let config = Config::load().expect("Should load with defaults");

        assert_eq!(config.database.path, "rollcall.db");
        assert_eq!(config.database.pool_size, 5);
        assert_eq!(config.telemetry.environment, "development");
        assert_eq!(config.status.former_after_days, 60);
        assert_eq!(config.status.new_within_days, 90);
        assert_eq!(config.status.new_max_events, 5);
        assert_eq!(config.listing.default_limit, 50);
    }

    #[test]
    fn test_config_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_vars();

        env::set_var("ROLLCALL_DATABASE_PATH", "/tmp/chapter.db");
        env::set_var("ROLLCALL_STATUS_FORMER_AFTER_DAYS", "30");
        env::set_var("ROLLCALL_LISTING_DEFAULT_LIMIT", "0");

        let config = Config::load().expect("Should load from env");

        assert_eq!(config.database.path, "/tmp/chapter.db");
        assert_eq!(config.status.former_after_days, 30);
        assert_eq!(config.listing.default_limit, 0);

        clear_vars();
    }

    #[test]
    fn test_config_validation_failure() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_vars();

        env::set_var("ROLLCALL_DATABASE_POOL_SIZE", "200"); // Invalid - too big

        let result = Config::load();
        assert!(matches!(result, Err(Error::Config(_))));

        clear_vars();
    }

    #[test]
    fn test_negative_default_limit_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_vars();

        env::set_var("ROLLCALL_LISTING_DEFAULT_LIMIT", "-1");

        assert!(Config::load().is_err());

        clear_vars();
    }
}
