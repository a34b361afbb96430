//! Config command - View and initialize configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use kinship_config::{ConfigLoader, ConfigScope};
use serde::Serialize;

use super::{print_info, Session};

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show(ShowArgs),

    /// Show configuration file paths
    Path(PathArgs),

    /// Write a default configuration file if none exists
    Init(InitArgs),
}

/// Arguments for the show command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON instead of TOML
    #[arg(long)]
    json: bool,
}

/// Arguments for the path command
#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the init command
#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Initialize the global config (~/.kinship/config.toml) instead of local
    #[arg(long)]
    global: bool,
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    /// Global config file path
    pub global: Option<PathBuf>,
    /// Local config file path
    pub local: PathBuf,
    /// Whether global config exists
    pub global_exists: bool,
    /// Whether local config exists
    pub local_exists: bool,
    /// Explicit config file from --config
    pub explicit: Option<PathBuf>,
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommand, session: &Session) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, session).await,
        ConfigCommand::Path(args) => execute_path(args, session).await,
        ConfigCommand::Init(args) => execute_init(args, session).await,
    }
}

async fn execute_show(args: ShowArgs, session: &Session) -> Result<()> {
    let config = session.config()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!(
            "{}",
            toml::to_string_pretty(config).context("Failed to serialize configuration")?
        );
    }
    Ok(())
}

async fn execute_path(args: PathArgs, session: &Session) -> Result<()> {
    let loader = ConfigLoader::new();

    let global_path = loader.path(ConfigScope::Global, &session.root);
    let local_path = ConfigLoader::local_path(&session.root);
    let paths = ConfigPaths {
        global_exists: global_path.as_ref().is_some_and(|p| p.exists()),
        local_exists: local_path.exists(),
        global: global_path,
        local: local_path,
        explicit: session.global.config.clone(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }

    match paths.global {
        Some(ref path) => println!(
            "Global: {} ({})",
            path.display(),
            exists_label(paths.global_exists)
        ),
        None => println!("Global: (no home directory)"),
    }
    println!(
        "Local:  {} ({})",
        paths.local.display(),
        exists_label(paths.local_exists)
    );
    if let Some(ref explicit) = paths.explicit {
        println!("Using:  {} (--config)", explicit.display());
    }
    Ok(())
}

async fn execute_init(args: InitArgs, session: &Session) -> Result<()> {
    let scope = if args.global {
        ConfigScope::Global
    } else {
        ConfigScope::Local
    };
    let path = ConfigLoader::new()
        .init(scope, &session.root)
        .with_context(|| format!("Failed to initialize {} config", scope))?;

    print_info(&format!("Config: {}", path.display()), session.quiet());
    Ok(())
}

fn exists_label(exists: bool) -> &'static str {
    if exists {
        "exists"
    } else {
        "missing"
    }
}
