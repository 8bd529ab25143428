//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable consulted for the root folder
pub const ROOT_ENV_VAR: &str = "ENCORE_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "encore.db";

/// Service configuration file name inside the root folder
pub const SERVICE_CONFIG_FILE: &str = "encore.toml";

/// Tunables for the ranking service.
///
/// Every field has a default so a missing or partial `encore.toml` still
/// yields a usable configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    /// Length of every top-N list (global metrics and the weekly leaderboard)
    pub leaderboard_size: usize,
    /// Songs with an id at or below this value are fixed drills and never
    /// become song of the week
    pub reserved_song_id_max: i64,
    /// Offset from UTC of the zone whose Monday 00:00 starts each week
    pub week_utc_offset_minutes: i32,
    pub scheduler_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5740,
            leaderboard_size: 10,
            reserved_song_id_max: 15,
            week_utc_offset_minutes: 0,
            scheduler_enabled: true,
        }
    }
}

impl ServiceConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ServiceConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.leaderboard_size == 0 {
            return Err(Error::Config("leaderboard_size must be at least 1".to_string()));
        }
        // chrono::FixedOffset rejects anything at or beyond a full day
        if self.week_utc_offset_minutes.abs() >= 24 * 60 {
            return Err(Error::Config(format!(
                "week_utc_offset_minutes out of range: {}",
                self.week_utc_offset_minutes
            )));
        }
        Ok(())
    }
}

/// Load `encore.toml` from the root folder.
///
/// A missing file is not an error: defaults are used and a message logged.
/// A file that exists but does not parse is reported as a config error.
pub fn load_service_config(root_folder: &Path) -> Result<ServiceConfig> {
    let path = root_folder.join(SERVICE_CONFIG_FILE);
    if !path.exists() {
        info!("No {} in {}, using defaults", SERVICE_CONFIG_FILE, root_folder.display());
        return Ok(ServiceConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config = ServiceConfig::from_toml_str(&content)?;
    info!("Loaded service configuration from {}", path.display());
    Ok(config)
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    match root_folder_from_config_file() {
        Ok(Some(path)) => return path,
        Ok(None) => {}
        Err(e) => warn!("Ignoring unreadable config file: {}", e),
    }

    default_root_folder()
}

/// Create the root folder if missing and return the database path inside it
pub fn ensure_root_folder(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join(DATABASE_FILE))
}

fn root_folder_from_config_file() -> Result<Option<PathBuf>> {
    let Some(config_path) = locate_config_file() else {
        return Ok(None);
    };

    let content = std::fs::read_to_string(&config_path)?;
    let value: toml::Value =
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;

    Ok(value
        .get("root_folder")
        .and_then(|v| v.as_str())
        .map(PathBuf::from))
}

/// User config first, then the system-wide file on Linux
fn locate_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("encore").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/encore/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("encore"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/encore"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("encore"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/encore"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("encore"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\encore"))
    } else {
        PathBuf::from("./encore_data")
    }
}
