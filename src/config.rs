//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CatalogError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.jikan.moe/v4";
pub const DEFAULT_USER_AGENT: &str = concat!("anime_nexus/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base")]
    pub api_base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_base() -> String { DEFAULT_API_BASE.to_string() }
fn default_page_size() -> u32 { 20 }
fn default_timeout() -> u64 { 30 }
fn default_user_agent() -> String { DEFAULT_USER_AGENT.to_string() }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base(),
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            dark_mode: true,
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("anime_nexus");
        path.push("config.json");
        path
    }

    /// Load from the user config dir. A missing file means defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| CatalogError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()
    }

    fn validate(mut self) -> Result<Self> {
        if self.page_size == 0 || self.page_size > 25 {
            return Err(CatalogError::Config(format!(
                "page_size must be between 1 and 25, got {}",
                self.page_size
            )));
        }
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(CatalogError::Config(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            )));
        }
        self.api_base_url = trimmed.to_string();
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
