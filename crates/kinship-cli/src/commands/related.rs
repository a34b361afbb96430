//! Related command - Run the relationship aggregation for one subject

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use kinship_backend::{
    Aggregator, CallContext, FetchRelatedRequest, SqliteEntitySource, SqliteRelationshipSource,
};
use tracing::warn;

use super::{print_entities, print_info, Session};

/// Output format for related entities
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated rows
    #[default]
    Text,
    /// JSON response object
    Json,
}

/// Arguments for the related command
#[derive(Args, Debug)]
pub struct RelatedArgs {
    /// Subject entity id
    subject_id: String,

    /// Return everyone the subject has no relationship with instead of friends
    #[arg(long)]
    unrelated: bool,

    /// Give up after this many seconds (overrides aggregator.timeout_secs)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Execute the related command
pub async fn execute(args: RelatedArgs, session: &Session) -> Result<()> {
    let config = session.config()?;
    let store = session.open_store()?;

    let aggregator = Aggregator::with_config(
        Arc::new(SqliteRelationshipSource::from_config(
            store.clone(),
            &config.relationships,
        )?),
        Arc::new(SqliteEntitySource::from_config(store, &config.entities)?),
        &config.aggregator,
    );

    let (mut ctx, cancel) = CallContext::cancellable();
    if let Some(secs) = args.timeout_secs.or(config.aggregator.timeout_secs) {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            cancel.cancel();
        }
    });

    let request = FetchRelatedRequest {
        subject_id: args.subject_id,
        show_related: !args.unrelated,
    };
    let result = aggregator.fetch(&ctx, &request).await;
    interrupt.abort();

    let response = result.with_context(|| {
        format!(
            "Failed to fetch {} of subject {}",
            if request.show_related { "friends" } else { "unrelated entities" },
            request.subject_id
        )
    })?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Text => {
            print_entities(&response.entities);
            print_info(
                &format!("{} entities", response.entities.len()),
                session.quiet(),
            );
        }
    }
    Ok(())
}
