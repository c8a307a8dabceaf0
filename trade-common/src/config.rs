//! Configuration loading and data root resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (database URL only; the data root has none)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the root of the CSV tree
pub const DATA_ROOT_ENV: &str = "TRADE_DATA_REPO_PATH";

/// Environment variable naming the data store connection string
pub const DATABASE_URL_ENV: &str = "TRADE_DATABASE_URL";

/// Settings read from the optional TOML config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root of the `year/<YYYY>/<CC>/<tradeflow>/` CSV tree
    #[serde(default)]
    pub data_root: Option<PathBuf>,

    /// sqlx connection string for the trade store
    #[serde(default)]
    pub database_url: Option<String>,

    /// Fallback tracing filter when RUST_LOG is unset
    #[serde(default)]
    pub log_filter: Option<String>,
}

/// Platform config file location: `<config_dir>/trade-import/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("trade-import").join("config.toml"))
}

/// Load the TOML config file
///
/// A missing file is not an error: it yields an empty config so the
/// service can still start from CLI/ENV settings. A file that exists but
/// does not parse is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No TOML config file, using defaults");
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Resolve the CSV data root
///
/// There is no compiled default: an import service without a data tree
/// refuses to start.
pub fn resolve_data_root(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_ROOT_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.data_root {
        return Ok(path.clone());
    }

    Err(Error::Config(format!(
        "{} environment variable not set (or pass --data-root, or set data_root in config.toml)",
        DATA_ROOT_ENV
    )))
}

/// Resolve the data store connection string
pub fn resolve_database_url(cli_arg: Option<&str>, toml_config: &TomlConfig) -> String {
    if let Some(url) = cli_arg {
        return url.to_string();
    }

    if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
        if !url.trim().is_empty() {
            return url;
        }
    }

    if let Some(url) = &toml_config.database_url {
        return url.clone();
    }

    default_database_url()
}

/// Compiled default: a SQLite file under the platform data directory
pub fn default_database_url() -> String {
    let db_path = dirs::data_local_dir()
        .map(|d| d.join("trade-import").join("trade.db"))
        .unwrap_or_else(|| PathBuf::from("./trade_data/trade.db"));
    format!("sqlite://{}?mode=rwc", db_path.display())
}
