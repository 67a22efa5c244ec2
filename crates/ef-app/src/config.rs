//! Catalog configuration: YAML file, then environment, then explicit overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const API_URL_ENV: &str = "EARTHFRAME_API_URL";
pub const STATE_DIR_ENV: &str = "EARTHFRAME_STATE_DIR";

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct CatalogConfig {
    pub api_url: String,
    pub timeout_ms: u64,
    /// Send `Cache-Control: no-cache` with list fetches.
    pub disable_cache: bool,
    pub state_dir: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            disable_cache: true,
            state_dir: PathBuf::from(".earthframe"),
        }
    }
}

/// Explicit values that win over both the file and the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub state_dir: Option<PathBuf>,
}

impl CatalogConfig {
    /// File, then process environment, then `overrides`; validated last.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> AppResult<Self> {
        Self::resolve(path, |key| std::env::var(key).ok(), overrides)
    }

    pub fn resolve<F>(
        path: Option<&Path>,
        lookup: F,
        overrides: &ConfigOverrides,
    ) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(lookup);
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.api_url {
            self.api_url = url.clone();
        }
        if let Some(dir) = &overrides.state_dir {
            self.state_dir = dir.clone();
        }
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let config: CatalogConfig = serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config YAML: {}", e)))?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.is_empty()) {
            tracing::debug!(api_url = %url, "api url from environment");
            self.api_url = url;
        }
        if let Some(dir) = lookup(STATE_DIR_ENV).filter(|v| !v.is_empty()) {
            self.state_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api_url must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(AppError::Config("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
