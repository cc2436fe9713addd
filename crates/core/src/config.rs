use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eviction::MAX_TABS;
use crate::session::HISTORY_LIMIT;
use crate::view::DEFAULT_PAGE_SIZE;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8076/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const BASE_URL_ENV: &str = "DBDESK_API_BASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config directory is unavailable for this platform")]
    ConfigDirUnavailable,
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceConfig {
    #[serde(default = "default_max_tabs")]
    pub max_tabs: usize,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            max_tabs: MAX_TABS,
            default_page_size: DEFAULT_PAGE_SIZE,
            history_limit: HISTORY_LIMIT,
            gateway: GatewayConfig::default(),
        }
    }
}

impl WorkspaceConfig {
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path()?;
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            if raw.trim().is_empty() {
                Self::default()
            } else {
                toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
        } else {
            Self::default()
        };

        if let Some(base_url) = env::var_os(BASE_URL_ENV) {
            config.gateway.base_url = base_url.to_string_lossy().into_owned();
        }
        config.clamp();
        Ok(config)
    }

    fn clamp(&mut self) {
        self.max_tabs = self.max_tabs.max(1);
        self.default_page_size = self.default_page_size.max(1);
        self.history_limit = self.history_limit.max(1);
    }
}

/// `DBDESK_CONFIG_DIR` names the directory itself; the platform defaults get a
/// `dbdesk` subdirectory.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    if let Some(custom) = env::var_os("DBDESK_CONFIG_DIR") {
        return Ok(PathBuf::from(custom));
    }

    let base_dir = if cfg!(target_os = "windows") {
        env::var_os("APPDATA")
            .map(PathBuf::from)
            .ok_or(ConfigError::ConfigDirUnavailable)?
    } else if let Some(xdg_config_home) = env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config_home)
    } else {
        let home = env::var_os("HOME").ok_or(ConfigError::ConfigDirUnavailable)?;
        PathBuf::from(home).join(".config")
    };

    Ok(base_dir.join("dbdesk"))
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_tabs() -> usize {
    MAX_TABS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_history_limit() -> usize {
    HISTORY_LIMIT
}
