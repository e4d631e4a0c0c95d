use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};

/// Search-as-you-type tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub max_results_per_source: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            max_results_per_source: 5,
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Application configuration, loaded once at start-up
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub site_url: String,
    pub posts_page_size: u32,
    pub reports_page_size: u32,
    pub related_posts_limit: u32,
    pub backup_retention: usize,
    pub search: SearchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/trading_blog.db"),
            site_url: "http://localhost:3000".to_string(),
            posts_page_size: 9,
            reports_page_size: 10,
            related_posts_limit: 3,
            backup_retention: 5,
            search: SearchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; missing keys fall back to defaults
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(raw)
            .map_err(|e| AppError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.posts_page_size == 0 || self.reports_page_size == 0 {
            return Err(AppError::Config("page sizes must be positive".to_string()));
        }
        if self.search.max_results_per_source == 0 {
            return Err(AppError::Config(
                "search.max_results_per_source must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Site URL without a trailing slash
    pub fn site_root(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }
}
