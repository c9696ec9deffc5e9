//! Declarative logger configuration.
//!
//! A `LoggerConfig` describes a category tree in YAML and is applied onto a
//! [`CategoryLogger`]:
//!
//! ```yaml
//! default_category: app
//! category_format: "[%s] "
//! children:
//!   app: [db, http]
//!   db: [db.pool]
//! enabled: [app]
//! disabled: [db.pool]
//! file_logs:
//!   db: [/var/log/app/db.log]
//! ```
//!
//! ## Layers
//!
//! Values are resolved in this priority order:
//! 1. Environment variables (`CATLOG_DEFAULT_CATEGORY`, `CATLOG_CATEGORY_FORMAT`)
//! 2. Values loaded from file
//! 3. Default values (empty)

use catlog_types::{CatlogError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::logger::CategoryLogger;

/// Environment variable overriding `default_category`.
pub const ENV_DEFAULT_CATEGORY: &str = "CATLOG_DEFAULT_CATEGORY";

/// Environment variable overriding `category_format`.
pub const ENV_CATEGORY_FORMAT: &str = "CATLOG_CATEGORY_FORMAT";

/// Category tree, flags and sinks to install on a logger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    /// Category used when a call names none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_category: Option<String>,

    /// Label template, e.g. `"[%s] "`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_format: Option<String>,

    /// Parent category to its children
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, Vec<String>>,

    /// Categories explicitly enabled
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enabled: Vec<String>,

    /// Categories explicitly disabled
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,

    /// Category to the files its lines are appended to
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub file_logs: IndexMap<String, Vec<PathBuf>>,
}

impl LoggerConfig {
    /// `~/.catlog/config.yml`, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".catlog").join("config.yml"))
    }

    /// Load from [`default_path`](Self::default_path) with environment
    /// overrides applied.
    pub fn load() -> Result<Self> {
        let config = match Self::default_path() {
            Some(path) => Self::load_from(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Load from a YAML file. A missing file yields the default config.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No logger config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CatlogError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml_str(&content).map_err(|e| {
            CatlogError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        debug!("Loaded logger config from {}", path.display());
        Ok(config)
    }

    /// Parse a YAML document. An empty document yields the default config.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the config to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_yaml_string()?).map_err(|e| {
            CatlogError::Config(format!("Failed to write config file {}: {}", path.display(), e))
        })
    }

    /// Apply `CATLOG_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are
    /// ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(category) = lookup(ENV_DEFAULT_CATEGORY) {
            debug!("{} overrides default category with '{}'", ENV_DEFAULT_CATEGORY, category);
            self.default_category = Some(category);
        }
        if let Some(format) = lookup(ENV_CATEGORY_FORMAT) {
            debug!("{} overrides category format with '{}'", ENV_CATEGORY_FORMAT, format);
            self.category_format = Some(format);
        }
        self
    }

    /// Install this config on `logger`: hierarchy first, then enabled and
    /// disabled flags, then file sinks, default category and label format.
    ///
    /// # Errors
    ///
    /// The first invalid category name, empty child list, self-parent or
    /// bad label format stops the application; earlier entries stay applied.
    pub fn apply(&self, logger: &CategoryLogger) -> Result<()> {
        for (parent, children) in &self.children {
            logger.add_category_children(parent, children)?;
        }
        logger.enable_categories(&self.enabled)?;
        logger.disable_categories(&self.disabled)?;
        for (category, paths) in &self.file_logs {
            for path in paths {
                logger.add_file_log(category, path)?;
            }
        }
        if let Some(category) = &self.default_category {
            logger.set_default_category(category)?;
        }
        if let Some(format) = &self.category_format {
            logger.set_category_format(format)?;
        }

        debug!(
            "Applied logger config: {} parents, {} enabled, {} disabled, {} file logs",
            self.children.len(),
            self.enabled.len(),
            self.disabled.len(),
            self.file_logs.values().map(Vec::len).sum::<usize>()
        );
        Ok(())
    }
}
