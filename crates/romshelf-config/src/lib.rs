//! Configuration management for romshelf
//!
//! Handles launcher definitions, scan options and scraper settings.
//! Configuration lives in TOML files; environment variables prefixed with
//! `ROMSHELF` may override single values.

mod launcher;
mod scraper;

pub use launcher::{LauncherConfig, SourceConfig};
pub use scraper::{AssetKind, ScanPolicy, ScraperSettings, SelectionMode};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Layered configuration error: {0}")]
    Layered(#[from] config::ConfigError),
}

/// Standard configuration paths
pub const CONFIG_DIR: &str = "/etc/romshelf";
pub const USER_CONFIG_DIR: &str = ".config/romshelf";

/// Environment variable prefix for overrides (`ROMSHELF_SCAN__SKIP_ON_FAILURE`)
pub const ENV_PREFIX: &str = "ROMSHELF";

/// Library storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySettings {
    /// SQLite database holding every launcher's collection
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

fn default_database() -> PathBuf {
    PathBuf::from("romshelf.db")
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

/// Scan session options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Drop candidates whose scraping failed instead of aborting the scan
    #[serde(default = "default_skip_on_failure")]
    pub skip_on_failure: bool,
}

fn default_skip_on_failure() -> bool {
    true
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            skip_on_failure: default_skip_on_failure(),
        }
    }
}

/// Main romshelf configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RomshelfConfig {
    #[serde(default)]
    pub library: LibrarySettings,

    #[serde(default)]
    pub scan: ScanSettings,

    #[serde(default)]
    pub scraper: ScraperSettings,

    #[serde(default)]
    pub launchers: Vec<LauncherConfig>,
}

impl RomshelfConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a file and apply `ROMSHELF_*` environment overrides on top
    pub fn load_layered(path: &Path) -> Result<Self, ConfigError> {
        let layered = config::Config::builder()
            .add_source(
                config::File::from(path.to_path_buf())
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = layered.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        // Try user config first, then system config
        if let Some(home) = std::env::var_os("HOME") {
            let user_config = Path::new(&home).join(USER_CONFIG_DIR).join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        let system_config = Path::new(CONFIG_DIR).join("config.toml");
        if system_config.exists() {
            return Self::load(&system_config);
        }

        tracing::warn!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Find a launcher by id
    pub fn launcher(&self, id: &str) -> Option<&LauncherConfig> {
        self.launchers.iter().find(|l| l.id == id)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scraper.metadata_scraper.trim().is_empty() {
            return Err(ConfigError::Invalid("metadata_scraper is empty".into()));
        }
        if self.scraper.asset_scraper.trim().is_empty() {
            return Err(ConfigError::Invalid("asset_scraper is empty".into()));
        }

        let mut seen = HashSet::new();
        for launcher in &self.launchers {
            if launcher.id.trim().is_empty() {
                return Err(ConfigError::Invalid("launcher with empty id".into()));
            }
            if !seen.insert(launcher.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate launcher id '{}'",
                    launcher.id
                )));
            }
            if let Some(key) = launcher
                .asset_dirs
                .keys()
                .find(|key| AssetKind::from_key(key).is_none())
            {
                return Err(ConfigError::Invalid(format!(
                    "launcher '{}': unknown asset kind '{}'",
                    launcher.id, key
                )));
            }
        }

        Ok(())
    }
}
