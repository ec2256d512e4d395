//! Application configuration.

use crate::error::{ApiError, ApiResult};
use agora_ledger::InitialBalancePolicy;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration, loaded from a TOML file with per-field defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Listen port. Default: 8080.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the persisted JSON documents. Default: "data".
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Revaluation grid interval in minutes. Default: 10.
    #[serde(default = "default_grid_interval_minutes")]
    pub grid_interval_minutes: i64,
    /// Upper bound for a single deposit. Default: 100_000.
    #[serde(default = "default_deposit_cap")]
    pub deposit_cap: i64,
    /// How first-seen accounts are funded.
    #[serde(default)]
    pub initial_balance: InitialBalancePolicy,
    /// Identities allowed on admin routes. Default: none.
    #[serde(default)]
    pub admin_identities: Vec<String>,
    /// Default log filter when RUST_LOG is unset. Default: "info,agora=debug".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_grid_interval_minutes() -> i64 {
    10
}

fn default_deposit_cap() -> i64 {
    100_000
}

fn default_log_level() -> String {
    "info,agora=debug".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
            grid_interval_minutes: default_grid_interval_minutes(),
            deposit_cap: default_deposit_cap(),
            initial_balance: InitialBalancePolicy::default(),
            admin_identities: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Resolve the config path (CLI arg > `AGORA_CONFIG` > default) and
    /// load it, falling back to defaults when the file is absent.
    pub fn load(cli_path: Option<String>) -> ApiResult<Self> {
        let path = cli_path
            .or_else(|| std::env::var("AGORA_CONFIG").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if Path::new(&path).exists() {
            Self::from_file(&path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> ApiResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("Failed to read config: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| ApiError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn grid_interval(&self) -> Duration {
        Duration::minutes(self.grid_interval_minutes.max(1))
    }

    pub fn market_path(&self) -> PathBuf {
        self.data_dir.join("market.json")
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join("accounts.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.grid_interval_minutes, 10);
        assert_eq!(config.deposit_cap, 100_000);
        assert!(config.admin_identities.is_empty());
        assert_eq!(config.initial_balance.starting_balance(), 10_000);
        assert_eq!(config.market_path(), PathBuf::from("data/market.json"));
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(
            r#"
            port = 9000
            data_dir = "/var/lib/agora"
            grid_interval_minutes = 5
            deposit_cap = 50000
            admin_identities = ["ops-1", "ops-2"]

            [initial_balance]
            policy = "requires_approval"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.grid_interval(), Duration::minutes(5));
        assert_eq!(config.initial_balance, InitialBalancePolicy::RequiresApproval);
        assert_eq!(config.admin_identities, vec!["ops-1", "ops-2"]);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = toml::from_str("port = 3000").unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.deposit_cap, 100_000);
        assert!(config.initial_balance.credits_immediately());
    }
}
