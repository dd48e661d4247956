//! Persisted user settings (installation path, language, window size).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "rwb-config.json";
pub const DEFAULT_LANGUAGE: &str = "zh";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub installation_path: Option<PathBuf>,
    pub language: String,
    pub window: WindowGeometry,
    /// RFC 3339 time of the last successful scan.
    pub last_scan: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            installation_path: None,
            language: DEFAULT_LANGUAGE.to_string(),
            window: WindowGeometry::default(),
            last_scan: None,
        }
    }
}

/// `Config` bound to its file; setters write through.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

pub fn default_config_path() -> PathBuf {
    match ProjectDirs::from("io", "railworks", "rwb") {
        Some(pd) => pd.config_dir().join(CONFIG_FILE),
        None => std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(CONFIG_FILE),
    }
}

impl ConfigStore {
    /// Missing or unreadable files give the defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = match read_config(&path) {
            Ok(Some(c)) => c,
            Ok(None) => {
                debug!("no config at {}, using defaults", path.display());
                Config::default()
            }
            Err(e) => {
                warn!("ignoring config {}: {}", path.display(), e);
                Config::default()
            }
        };
        Self { path, config }
    }

    pub fn open_default() -> Self {
        Self::load(default_config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.config)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn installation_path(&self) -> Option<&Path> {
        self.config
            .installation_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn set_installation_path(&mut self, path: impl Into<PathBuf>) -> Result<(), ConfigError> {
        self.config.installation_path = Some(path.into());
        self.save()
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    pub fn set_language(&mut self, tag: impl Into<String>) -> Result<(), ConfigError> {
        self.config.language = tag.into();
        self.save()
    }

    pub fn mark_scanned(&mut self, now: DateTime<Local>) -> Result<(), ConfigError> {
        self.config.last_scan = Some(now.to_rfc3339());
        self.save()
    }
}

fn read_config(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}
