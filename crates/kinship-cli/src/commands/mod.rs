//! CLI command implementations
//!
//! This module contains all Kinship CLI command implementations.

pub mod config;
pub mod entities;
pub mod init;
pub mod related;
pub mod relationships;
pub mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use kinship_backend::BackendError;
use kinship_config::{ConfigLoader, KinshipConfig, LoggingConfig};
use kinship_core::{Entity, RelationshipRecord, SqliteStore};

use crate::GlobalOptions;

/// The directory commands resolve relative paths against.
pub fn working_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

/// Load configuration with optional config file override.
fn load_config(global: &GlobalOptions, root: &Path) -> Result<KinshipConfig> {
    let overrides = global.to_config_overrides(root);
    let loader = ConfigLoader::new();

    // An explicit config file replaces the global -> local merge
    if let Some(ref config_path) = global.config {
        return loader
            .load_file(config_path, Some(&overrides))
            .with_context(|| format!("Failed to load config file {}", config_path.display()));
    }

    loader
        .load(root, Some(&overrides))
        .context("Failed to load configuration")
}

/// Global options, the directory a command works in, and the configuration
/// loaded for that directory.
pub struct Session {
    pub global: GlobalOptions,
    pub root: PathBuf,
    config: Result<KinshipConfig>,
}

impl Session {
    /// Load the configuration for `root` once.
    pub fn open(global: GlobalOptions, root: PathBuf) -> Self {
        let config = load_config(&global, &root);
        Self {
            global,
            root,
            config,
        }
    }

    /// Logging settings, or the defaults when the configuration is unusable.
    pub fn logging(&self) -> LoggingConfig {
        self.config
            .as_ref()
            .map(|config| config.logging.clone())
            .unwrap_or_default()
    }

    /// The loaded configuration. A load failure surfaces here, in the command.
    pub fn config(&self) -> Result<&KinshipConfig> {
        self.config
            .as_ref()
            .map_err(|e| anyhow::anyhow!("{:#}", e))
    }

    /// Open the configured database, which must already exist.
    pub fn open_store(&self) -> Result<Arc<SqliteStore>> {
        open_database(self.config()?, &self.root)
    }

    pub fn quiet(&self) -> bool {
        self.global.quiet
    }
}

fn open_database(config: &KinshipConfig, root: &Path) -> Result<Arc<SqliteStore>> {
    let path = config.database_path(root);
    if !path.exists() {
        anyhow::bail!(
            "No database at {}. Run `kinship init` first.",
            path.display()
        );
    }

    let store = SqliteStore::open(&path)
        .map_err(BackendError::from)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}

/// Print entities as tab-separated rows.
pub fn print_entities(entities: &[Entity]) {
    for entity in entities {
        let name = format!("{} {}", entity.first_name, entity.last_name);
        println!(
            "{}\t{}\t{}\t{}",
            entity.id,
            entity.user_name,
            name.trim(),
            entity.email
        );
    }
}

/// Print relationships as tab-separated rows.
pub fn print_relationships(records: &[RelationshipRecord]) {
    for record in records {
        println!(
            "{}\t{} -> {}\t{}",
            record.id, record.sender_id, record.receiver_id, record.status
        );
    }
}
