//! GeoCam configuration.
//!
//! Loaded from `<config dir>/geocam/config.toml`. Every key is optional; a
//! missing file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::device::gallery::DirectoryGallery;
use crate::device::kv::SqliteKv;

pub const DEFAULT_ALBUM: &str = "GeoCam";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Where tethered photos arrive. Default: `<pictures>/GeoCam Inbox`.
    pub inbox_dir: Option<PathBuf>,
    /// Gallery root holding the album. Default: the pictures directory.
    pub gallery_dir: Option<PathBuf>,
    pub album_name: Option<String>,
    pub database_path: Option<PathBuf>,
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LocationConfig {
    pub enabled: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
        }
    }
}

impl Config {
    /// Load config from the default path, or defaults if there is none.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.config/geocam/config.toml` on Linux.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("geocam").join("config.toml"))
    }

    pub fn inbox_dir(&self) -> PathBuf {
        self.inbox_dir
            .clone()
            .unwrap_or_else(|| self.gallery_dir().join("GeoCam Inbox"))
    }

    pub fn gallery_dir(&self) -> PathBuf {
        self.gallery_dir
            .clone()
            .or_else(DirectoryGallery::default_root)
            .unwrap_or_else(|| PathBuf::from("Pictures"))
    }

    pub fn album_name(&self) -> &str {
        self.album_name.as_deref().unwrap_or(DEFAULT_ALBUM)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .or_else(SqliteKv::default_path)
            .unwrap_or_else(|| PathBuf::from("geocam.db"))
    }

    /// Where captured photos are kept before they reach the album
    pub fn capture_dir(&self) -> PathBuf {
        data_dir().join("captures")
    }

    /// Configured position, if both coordinates are set
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.location.latitude?, self.location.longitude?))
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("geocam"))
        .unwrap_or_else(|| PathBuf::from("geocam"))
}
