//! Kinship CLI - relationship aggregation over paginated stores
//!
//! A command-line interface for seeding the SQLite reference stores, paging
//! through them, and running the relationship aggregation.
//!
//! # Usage
//!
//! ```bash
//! # Create the database and a local config
//! kinship init
//!
//! # Add two users and befriend them
//! kinship entities add ada --first-name Ada --last-name Lovelace
//! kinship entities add grace
//! kinship relationships add 1 2
//! kinship relationships set-status 1 accepted
//!
//! # Friends of user 1, then everyone user 1 has no relationship with
//! kinship related 1
//! kinship related 1 --unrelated --output json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kinship_backend::{BackendError, ErrorCode};
use kinship_config::{ConfigOverrides, LogFormat, LoggingConfig};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;

use commands::Session;

/// Kinship - friend and stranger lookups over cursor-paginated sources
#[derive(Parser, Debug)]
#[command(name = "kinship")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Path to configuration file (replaces global and local config)
    #[arg(long, short = 'c', global = true, env = "KINSHIP_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the SQLite database
    #[arg(long, short = 'd', global = true, env = "KINSHIP_DATABASE")]
    database: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

impl GlobalOptions {
    /// Convert global options to config overrides.
    ///
    /// A relative `--database` is taken relative to `root`, not the data dir.
    pub fn to_config_overrides(&self, root: &Path) -> ConfigOverrides {
        ConfigOverrides {
            database: self.database.as_ref().map(|db| root.join(db)),
            log_level: if self.quiet {
                Some("error".to_string())
            } else if self.verbose {
                Some("debug".to_string())
            } else {
                None
            },
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database and a local config
    Init(commands::init::InitArgs),

    /// Add, show and list entities
    #[command(subcommand)]
    Entities(commands::entities::EntitiesCommand),

    /// Add, update and list relationships
    #[command(subcommand)]
    Relationships(commands::relationships::RelationshipsCommand),

    /// Fetch the friends of a subject, or everyone unrelated to it
    Related(commands::related::RelatedArgs),

    /// Show database location and row counts
    Status(commands::status::StatusArgs),

    /// View and initialize configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let Cli { command, global } = Cli::parse();

    let root = match command {
        Commands::Init(ref args) => args.root(),
        _ => commands::working_dir(),
    };
    let session = match root {
        Ok(root) => Session::open(global, root),
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // A broken config still gets default logging; the command reports the error
    if let Err(e) = init_tracing(&session.global, &session.logging()) {
        eprintln!("error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(command, &session).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

async fn run(command: Commands, session: &Session) -> Result<()> {
    match command {
        Commands::Init(args) => commands::init::execute(args, session).await,
        Commands::Entities(cmd) => commands::entities::execute(cmd, session).await,
        Commands::Relationships(cmd) => commands::relationships::execute(cmd, session).await,
        Commands::Related(args) => commands::related::execute(args, session).await,
        Commands::Status(args) => commands::status::execute(args, session).await,
        Commands::Config(cmd) => commands::config::execute(cmd, session).await,
    }
}

fn init_tracing(global: &GlobalOptions, logging: &LoggingConfig) -> Result<()> {
    let level = if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (writer, ansi) = match logging.file {
        Some(ref path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            (BoxMakeWriter::new(std::sync::Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer);

    match logging.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => {
            tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish())?
        }
    }
    Ok(())
}

/// Process exit status for a failed command.
fn exit_status(err: &anyhow::Error) -> u8 {
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<BackendError>())
        .map(BackendError::code);

    match code {
        Some(ErrorCode::InvalidArgument) => 3,
        Some(ErrorCode::NotFound) => 4,
        Some(ErrorCode::AlreadyExists) => 5,
        Some(ErrorCode::Cancelled) => 6,
        Some(ErrorCode::DeadlineExceeded) => 7,
        Some(ErrorCode::Internal) | None => 1,
    }
}
