//! Configuration management for MFLIX
//!
//! Handles config file loading/saving and data source selection.
//! Config is stored at ~/.config/mflix/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::catalog::{TabRules, TabRulesConfig};
use crate::player::PlayerType;
use crate::source::CatalogSource;

/// Environment variable overriding `database_url`
pub const DATABASE_URL_ENV: &str = "MFLIX_DATABASE_URL";

/// Default catalog node in the realtime database
pub const DEFAULT_CATALOG_PATH: &str = "movies";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Realtime database URL (e.g. https://mflix-default-rtdb.firebaseio.com)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Node holding the catalog records
    pub catalog_path: String,
    /// Local JSON export, used when no database URL is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    /// Local player (vlc, mpv)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    /// Follow live catalog updates in the TUI
    pub live: bool,
    /// Bucket rules per tab
    pub tabs: TabRulesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
            snapshot: None,
            player: None,
            live: true,
            tabs: TabRulesConfig::default(),
        }
    }
}

impl Config {
    /// Get config file path (~/.config/mflix/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mflix").join("config.toml"))
    }

    /// Load config from the default location, or defaults if not found
    pub fn load() -> Self {
        Self::path().map(|p| Self::load_from(&p)).unwrap_or_default()
    }

    /// Load config from a file; a missing or invalid file yields defaults
    pub fn load_from(path: &Path) -> Self {
        let Ok(text) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
            Self::default()
        })
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Database URL with fallback chain:
    /// 1. Environment variable MFLIX_DATABASE_URL
    /// 2. `database_url` from the config file
    pub fn database_url(&self) -> Option<String> {
        std::env::var(DATABASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.database_url.clone())
    }

    /// Catalog source: command line override, then database URL, then snapshot
    pub fn source(&self, cli_override: Option<&str>) -> Option<CatalogSource> {
        if let Some(location) = cli_override {
            return Some(CatalogSource::parse(location, &self.catalog_path));
        }
        if let Some(url) = self.database_url() {
            return Some(CatalogSource::Remote {
                url,
                path: self.catalog_path.clone(),
            });
        }
        self.snapshot.as_ref().map(|file| CatalogSource::File {
            file: file.clone(),
            node: self.catalog_path.clone(),
        })
    }

    /// Compiled tab bucket rules
    pub fn tab_rules(&self) -> TabRules {
        TabRules::from_config(&self.tabs)
    }

    /// Configured local player, VLC when unset or unknown
    pub fn player_type(&self) -> PlayerType {
        self.player
            .as_deref()
            .and_then(PlayerType::from_name)
            .unwrap_or_default()
    }
}
