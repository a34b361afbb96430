//! Status command - Show database location and row counts

use anyhow::{Context, Result};
use clap::Args;
use kinship_backend::BackendError;

use super::Session;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, session: &Session) -> Result<()> {
    let config = session.config()?;
    let db_path = config.database_path(&session.root);
    let initialized = db_path.exists();

    let (schema_version, stats) = if initialized {
        let store = session.open_store()?;
        let version = store
            .get_metadata("schema_version")
            .map_err(BackendError::from)
            .context("Failed to read schema version")?;
        let stats = store
            .stats()
            .map_err(BackendError::from)
            .context("Failed to read store statistics")?;
        (version, Some(stats))
    } else {
        (None, None)
    };

    if args.json {
        let status = serde_json::json!({
            "database": db_path,
            "initialized": initialized,
            "schema_version": schema_version,
            "stats": stats,
            "drain_page_size": config.aggregator.drain_page_size,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Kinship Status");
    println!("==============\n");
    println!("Database: {}", db_path.display());
    println!(
        "Status:   {}",
        if initialized {
            "Initialized"
        } else {
            "Not initialized (run `kinship init`)"
        }
    );

    if let Some(version) = schema_version {
        println!("Schema:   {}", version);
    }
    if let Some(stats) = stats {
        println!("\nEntities:      {}", stats.entity_count);
        println!("Relationships: {}", stats.relationship_count);
        println!("  accepted:    {}", stats.accepted_count);
        println!("  pending:     {}", stats.pending_count);
    }

    Ok(())
}
