//! # App Configuration
//!
//! Settings for the state layer: where favorites live, how prices render,
//! what gets logged.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     CARTWISE_DB_PATH=/tmp/cartwise.db                                   │
//! │     CARTWISE_LOG=debug                                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/cartwise/cartwise.toml (Linux)                            │
//! │     ~/Library/Application Support/app.cartwise.cartwise/cartwise.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [storage]
//! database_path = "/data/cartwise.db"   # optional
//! favorites_key = "favorites"
//! max_connections = 2
//!
//! [display]
//! currency_symbol = "$"
//! currency_decimals = 2
//! unavailable_label = "Price unavailable"
//!
//! [logging]
//! filter = "info,cartwise=debug,sqlx=warn"
//! ```

use std::path::{Path, PathBuf};

use cartwise_core::{Money, FAVORITES_STORAGE_KEY, UNAVAILABLE_PRICE_LABEL};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StateError, StateResult};

/// Largest supported number of currency decimals.
const MAX_CURRENCY_DECIMALS: u8 = 4;

// =============================================================================
// Storage Settings
// =============================================================================

/// Where and how favorites are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file. `None` uses the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Key the favorites list is stored under.
    #[serde(default = "default_favorites_key")]
    pub favorites_key: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_favorites_key() -> String {
    FAVORITES_STORAGE_KEY.to_string()
}

fn default_max_connections() -> u32 {
    2
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            database_path: None,
            favorites_key: default_favorites_key(),
            max_connections: default_max_connections(),
        }
    }
}

impl StorageConfig {
    /// The configured database file, or `cartwise.db` in the platform data
    /// directory.
    pub fn resolved_database_path(&self) -> StateResult<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join("cartwise.db"))
            .ok_or_else(|| StateError::InvalidConfig("Could not determine app data directory".into()))
    }
}

// =============================================================================
// Display Settings
// =============================================================================

/// How prices are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Digits after the decimal point.
    #[serde(default = "default_currency_decimals")]
    pub currency_decimals: u8,

    /// Shown when a product has no usable price.
    #[serde(default = "default_unavailable_label")]
    pub unavailable_label: String,
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_currency_decimals() -> u8 {
    2
}

fn default_unavailable_label() -> String {
    UNAVAILABLE_PRICE_LABEL.to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            currency_symbol: default_currency_symbol(),
            currency_decimals: default_currency_decimals(),
            unavailable_label: default_unavailable_label(),
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,cartwise=debug,sqlx=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// App Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`cartwise.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StateResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Parses a config file without applying environment overrides.
    pub fn from_file(path: &Path) -> StateResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> StateResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StateError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StateError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| StateError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StateResult<()> {
        if self.storage.favorites_key.trim().is_empty() {
            return Err(StateError::InvalidConfig(
                "storage.favorites_key must not be empty".into(),
            ));
        }

        if self.storage.max_connections == 0 {
            return Err(StateError::InvalidConfig(
                "storage.max_connections must be greater than 0".into(),
            ));
        }

        if self.display.currency_decimals > MAX_CURRENCY_DECIMALS {
            return Err(StateError::InvalidConfig(format!(
                "display.currency_decimals must be at most {}, got {}",
                MAX_CURRENCY_DECIMALS, self.display.currency_decimals
            )));
        }

        Ok(())
    }

    /// Applies `CARTWISE_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("CARTWISE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(key) = var("CARTWISE_FAVORITES_KEY") {
            self.storage.favorites_key = key;
        }

        if let Some(filter) = var("CARTWISE_LOG") {
            self.logging.filter = filter;
        }

        if let Some(symbol) = var("CARTWISE_CURRENCY_SYMBOL") {
            self.display.currency_symbol = symbol;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("cartwise.toml"))
    }

    // =========================================================================
    // Price Display
    // =========================================================================

    /// Renders a price, or the unavailable label when there is none.
    ///
    /// ## Example
    /// ```rust
    /// use cartwise_core::Money;
    /// use cartwise_state::AppConfig;
    ///
    /// let config = AppConfig::default();
    /// assert_eq!(config.format_price(Some(Money::from_cents(1234))), "$12.34");
    /// assert_eq!(config.format_price(None), "Price unavailable");
    /// ```
    pub fn format_price(&self, price: Option<Money>) -> String {
        match price {
            Some(money) => self.format_money(money),
            None => self.display.unavailable_label.clone(),
        }
    }

    /// Formats an amount with the configured symbol and decimals.
    pub fn format_money(&self, money: Money) -> String {
        let decimals = u32::from(self.display.currency_decimals.min(MAX_CURRENCY_DECIMALS));
        let cents = i128::from(money.cents());

        // Money is held in hundredths; rescale to the display precision
        let scaled = match decimals {
            0 | 1 => {
                let divisor = 10_i128.pow(2 - decimals);
                (cents.abs() + divisor / 2) / divisor
            }
            _ => cents.abs() * 10_i128.pow(decimals - 2),
        };

        let sign = if cents < 0 && scaled != 0 { "-" } else { "" };
        let symbol = &self.display.currency_symbol;

        if decimals == 0 {
            return format!("{}{}{}", sign, symbol, scaled);
        }

        let divisor = 10_i128.pow(decimals);
        format!(
            "{}{}{}.{:0width$}",
            sign,
            symbol,
            scaled / divisor,
            scaled % divisor,
            width = decimals as usize
        )
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("app", "cartwise", "cartwise")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage.favorites_key, "favorites");
        assert_eq!(config.storage.max_connections, 2);
        assert_eq!(config.display.currency_symbol, "$");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_format_price() {
        let config = AppConfig::default();
        assert_eq!(config.format_price(Some(Money::from_cents(1234))), "$12.34");
        assert_eq!(config.format_price(Some(Money::from_cents(1))), "$0.01");
        assert_eq!(config.format_price(Some(Money::zero())), "$0.00");
        assert_eq!(config.format_price(Some(Money::from_cents(-1234))), "-$12.34");
        assert_eq!(config.format_price(None), "Price unavailable");
    }

    #[test]
    fn test_format_with_other_precision() {
        let mut config = AppConfig::default();
        config.display.currency_symbol = "€".to_string();

        config.display.currency_decimals = 0;
        assert_eq!(config.format_money(Money::from_cents(1250)), "€13");

        config.display.currency_decimals = 3;
        assert_eq!(config.format_money(Money::from_cents(1250)), "€12.500");
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.storage.favorites_key = "  ".to_string();
        assert!(config.validate().is_err());

        config.storage.favorites_key = "favorites".to_string();
        config.storage.max_connections = 0;
        assert!(config.validate().is_err());

        config.storage.max_connections = 1;
        config.display.currency_decimals = 5;
        assert!(config.validate().is_err());

        config.display.currency_decimals = 4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [display]
            currency_symbol = "£"
            "#,
        )
        .unwrap();

        assert_eq!(config.display.currency_symbol, "£");
        assert_eq!(config.display.currency_decimals, 2);
        assert_eq!(config.storage.favorites_key, "favorites");
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CARTWISE_DB_PATH", "/tmp/override.db"),
            ("CARTWISE_FAVORITES_KEY", "favs"),
            ("CARTWISE_LOG", "trace"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(
            config.storage.database_path,
            Some(PathBuf::from("/tmp/override.db"))
        );
        assert_eq!(config.storage.favorites_key, "favs");
        assert_eq!(config.logging.filter, "trace");
        assert_eq!(config.display.currency_symbol, "$");
    }

    #[test]
    fn test_save_then_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cartwise.toml");

        let mut config = AppConfig::default();
        config.storage.database_path = Some(dir.path().join("cartwise.db"));
        config.display.unavailable_label = "N/A".to_string();
        config.save(Some(path.clone())).unwrap();

        assert_eq!(AppConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cartwise.toml");
        std::fs::write(&path, "[storage]\nmax_connections = \"many\"").unwrap();

        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let storage = StorageConfig {
            database_path: Some(PathBuf::from("/tmp/x.db")),
            ..StorageConfig::default()
        };
        assert_eq!(
            storage.resolved_database_path().unwrap(),
            PathBuf::from("/tmp/x.db")
        );
    }
}
