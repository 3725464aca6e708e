//! Reader configuration.
//!
//! Loaded from `~/.hn_reader/config.json`. On first run the defaults are written there so the
//! user has a file to edit.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::BASE_URL;

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API root, without trailing slash
    pub base_url: String,
    /// Concurrent item fetches per page
    pub workers: usize,
    /// Stories per page
    pub per_page: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            workers: 10,
            per_page: 30,
            request_timeout_secs: 10,
            user_agent: concat!("hn-reader/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("base_url must not be empty".into()));
        }
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".into()));
        }
        if self.per_page == 0 {
            return Err(Error::Config("per_page must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// `~/.hn_reader/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let home_dir = dirs_next::home_dir()
            .ok_or_else(|| Error::Config("could not find home directory".into()))?;
        Ok(home_dir.join(".hn_reader").join(CONFIG_FILE))
    }

    /// Reads `path`, or writes the defaults to it when it does not exist yet.
    pub fn load_or_init(path: &Path, write_default: bool) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        if write_default {
            config.save(path)?;
            info!(path = %path.display(), "wrote default config");
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;

        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
