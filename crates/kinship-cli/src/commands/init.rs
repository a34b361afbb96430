//! Initialize command - Create the database and a local config

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use kinship_backend::BackendError;
use kinship_config::{ConfigLoader, ConfigScope};
use kinship_core::{SqliteStore, STORE_SCHEMA_VERSION};
use tracing::info;

use super::{print_info, working_dir, Session};

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Recreate the database even if it already exists
    #[arg(long, short = 'f')]
    force: bool,
}

impl InitArgs {
    /// The directory to initialize, made absolute.
    pub fn root(&self) -> Result<PathBuf> {
        let root = if self.path.is_absolute() {
            self.path.clone()
        } else {
            working_dir()?.join(&self.path)
        };
        root.canonicalize()
            .context("Failed to resolve directory to initialize")
    }
}

/// Execute the init command in `session.root`
pub async fn execute(args: InitArgs, session: &Session) -> Result<()> {
    let root = &session.root;
    let db_path = session.config()?.database_path(root);

    if db_path.exists() {
        if !args.force {
            anyhow::bail!(
                "Database already exists at {}. Use --force to recreate it.",
                db_path.display()
            );
        }
        remove_database(&db_path)?;
        info!("Removed existing database at {}", db_path.display());
    }

    SqliteStore::open(&db_path)
        .map_err(BackendError::from)
        .with_context(|| format!("Failed to create database {}", db_path.display()))?;

    let config_path = if session.global.config.is_none() {
        Some(
            ConfigLoader::new()
                .init(ConfigScope::Local, root)
                .context("Failed to write local config")?,
        )
    } else {
        None
    };

    print_info(
        &format!(
            "Initialized Kinship database (schema {}) at {}",
            STORE_SCHEMA_VERSION,
            db_path.display()
        ),
        session.quiet(),
    );
    if let Some(path) = config_path {
        print_info(&format!("Config: {}", path.display()), session.quiet());
    }

    Ok(())
}

/// Remove a database file along with its WAL side files.
fn remove_database(db_path: &Path) -> Result<()> {
    std::fs::remove_file(db_path)
        .with_context(|| format!("Failed to remove {}", db_path.display()))?;

    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.as_os_str().to_owned();
        side.push(suffix);
        let side = PathBuf::from(side);
        if side.exists() {
            std::fs::remove_file(&side)
                .with_context(|| format!("Failed to remove {}", side.display()))?;
        }
    }
    Ok(())
}
