//! Kinship Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.kinship/config.toml`
//! - Local config: `.kinship/config.toml` (in the working directory)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::{ConfigLoader, ConfigScope};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration for Kinship.
///
/// Represents the fully merged configuration from all sources.
///
/// # Example TOML
///
/// ```toml
/// [storage]
/// data_dir = ".kinship"
/// database = "kinship.db"
///
/// [aggregator]
/// drain_page_size = 1000
/// timeout_secs = 30
///
/// [relationships]
/// min_page_size = 10
/// max_page_size = 1000
/// cursor_prefix = ""
///
/// [entities]
/// min_page_size = 1
/// max_page_size = 1000
/// cursor_prefix = "id:"
///
/// [logging]
/// level = "info"
/// format = "text"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct KinshipConfig {
    pub storage: StorageConfig,
    pub aggregator: AggregatorConfig,
    pub relationships: RelationshipSourceConfig,
    pub entities: EntitySourceConfig,
    pub logging: LoggingConfig,
}

/// Where the reference database lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for Kinship data (default: `.kinship`)
    pub data_dir: PathBuf,

    /// Database file, relative to `data_dir` unless absolute
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".kinship"),
            database: PathBuf::from("kinship.db"),
        }
    }
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Page size requested from each source while draining
    pub drain_page_size: u32,

    /// Per-request deadline in seconds (none when unset)
    pub timeout_secs: Option<u64>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            drain_page_size: 1000,
            timeout_secs: None,
        }
    }
}

/// Page-size bounds and token prefix for the relationship source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RelationshipSourceConfig {
    pub min_page_size: u32,
    pub max_page_size: u32,
    pub cursor_prefix: String,
}

impl Default for RelationshipSourceConfig {
    fn default() -> Self {
        Self {
            min_page_size: 10,
            max_page_size: 1000,
            cursor_prefix: String::new(),
        }
    }
}

/// Page-size bounds and token prefix for the entity source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EntitySourceConfig {
    pub min_page_size: u32,
    pub max_page_size: u32,
    pub cursor_prefix: String,
}

impl Default for EntitySourceConfig {
    fn default() -> Self {
        Self {
            min_page_size: 1,
            max_page_size: 1000,
            cursor_prefix: "id:".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,

    /// Log file path (optional)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override the data directory
    pub data_dir: Option<PathBuf>,

    /// Override the database file
    pub database: Option<PathBuf>,

    /// Override the drain page size
    pub drain_page_size: Option<u32>,

    /// Override the request deadline
    pub timeout_secs: Option<u64>,

    /// Override log level
    pub log_level: Option<String>,
}

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn check_source(
    section: &str,
    min_page_size: u32,
    max_page_size: u32,
    cursor_prefix: &str,
) -> Result<(), ConfigError> {
    if min_page_size == 0 {
        return Err(ConfigError::invalid_value(
            format!("{}.min_page_size", section),
            "must be at least 1",
        ));
    }
    if min_page_size > max_page_size {
        return Err(ConfigError::invalid_value(
            format!("{}.max_page_size", section),
            format!("{} is below min_page_size {}", max_page_size, min_page_size),
        ));
    }
    // tokens are trimmed before decoding
    if cursor_prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid_value(
            format!("{}.cursor_prefix", section),
            "must not contain whitespace",
        ));
    }
    Ok(())
}

impl KinshipConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref dir) = overrides.data_dir {
            self.storage.data_dir = dir.clone();
        }

        if let Some(ref database) = overrides.database {
            self.storage.database = database.clone();
        }

        if let Some(size) = overrides.drain_page_size {
            self.aggregator.drain_page_size = size;
        }

        if let Some(secs) = overrides.timeout_secs {
            self.aggregator.timeout_secs = Some(secs);
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_source(
            "relationships",
            self.relationships.min_page_size,
            self.relationships.max_page_size,
            &self.relationships.cursor_prefix,
        )?;
        check_source(
            "entities",
            self.entities.min_page_size,
            self.entities.max_page_size,
            &self.entities.cursor_prefix,
        )?;

        let drain = self.aggregator.drain_page_size;
        if drain == 0 {
            return Err(ConfigError::invalid_value(
                "aggregator.drain_page_size",
                "must be at least 1",
            ));
        }
        let floor = self
            .relationships
            .min_page_size
            .max(self.entities.min_page_size);
        if drain < floor {
            return Err(ConfigError::invalid_value(
                "aggregator.drain_page_size",
                format!("{} is below a source minimum page size of {}", drain, floor),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!(
                    "unknown level '{}'. Valid values: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Get the effective data directory for a working directory.
    pub fn data_dir(&self, root: &Path) -> PathBuf {
        if self.storage.data_dir.is_absolute() {
            self.storage.data_dir.clone()
        } else {
            root.join(&self.storage.data_dir)
        }
    }

    /// Get the database file path for a working directory.
    pub fn database_path(&self, root: &Path) -> PathBuf {
        if self.storage.database.is_absolute() {
            self.storage.database.clone()
        } else {
            self.data_dir(root).join(&self.storage.database)
        }
    }
}
