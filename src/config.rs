//! Configuration Management
//!
//! Handles persistent configuration storage for lexdispatch.

use crate::api::credentials::{Credentials, DEFAULT_RESOURCE_URL};
use crate::resource::{PagingLimits, ValidationPolicy, MAX_PAGES, RETURN_ALL_PAGE_SIZE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

fn default_resource_url() -> String {
    DEFAULT_RESOURCE_URL.to_string()
}

fn default_page_size() -> u32 {
    RETURN_ALL_PAGE_SIZE
}

fn default_max_pages() -> u32 {
    MAX_PAGES
}

/// User configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API key sent as bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_resource_url")]
    pub resource_url: String,
    /// Page size while draining with `returnAll`
    #[serde(default = "default_page_size")]
    pub return_all_page_size: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default)]
    pub validation_policy: ValidationPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            resource_url: default_resource_url(),
            return_all_page_size: default_page_size(),
            max_pages: default_max_pages(),
            validation_policy: ValidationPolicy::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("resource_url", &self.resource_url)
            .field("return_all_page_size", &self.return_all_page_size)
            .field("max_pages", &self.max_pages)
            .field("validation_policy", &self.validation_policy)
            .finish()
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lexdispatch").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit file; missing or unreadable files give defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Credentials for the transport; an API key must be configured
    pub fn credentials(&self) -> Result<Credentials> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .context("No API key configured. Set LEXOFFICE_API_KEY or use --api-key")?;
        Ok(Credentials::new(api_key, &self.resource_url))
    }

    /// Copy to persist. The API key stays as it was on disk unless `include_api_key`.
    pub fn for_saving(&self, stored: &Config, include_api_key: bool) -> Config {
        let mut saved = self.clone();
        if !include_api_key {
            saved.api_key = stored.api_key.clone();
        }
        saved
    }

    pub fn paging_limits(&self) -> PagingLimits {
        PagingLimits {
            return_all_page_size: self.return_all_page_size,
            max_pages: self.max_pages,
        }
    }
}
