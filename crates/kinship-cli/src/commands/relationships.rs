//! Relationships command - Add, update and list relationships

use anyhow::{Context, Result};
use clap::Subcommand;
use kinship_backend::{BackendError, CallContext, PaginatedList, SqliteRelationshipSource};
use kinship_core::{FieldMask, FilterSpec, Identifier, PageRequest, Predicate, RelationshipStatus};

use super::{print_info, print_relationships, Session};

/// Relationship commands
#[derive(Subcommand, Debug)]
pub enum RelationshipsCommand {
    /// Propose a relationship (starts pending)
    Add(AddArgs),

    /// Change the status of a relationship
    SetStatus(SetStatusArgs),

    /// List one page of relationships
    List(ListArgs),
}

/// Arguments for the add command
#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Proposing entity id
    sender: Identifier,

    /// Receiving entity id
    receiver: Identifier,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the set-status command
#[derive(clap::Args, Debug)]
pub struct SetStatusArgs {
    /// Relationship id
    id: Identifier,

    /// New status (pending, accepted, rejected)
    status: String,

    /// Fields to update, comma separated
    #[arg(long, value_delimiter = ',', default_value = "status")]
    mask: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the list command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only relationships proposed by this entity
    #[arg(long)]
    sender: Option<Identifier>,

    /// Only relationships received by this entity
    #[arg(long)]
    receiver: Option<Identifier>,

    /// Only relationships in this status (pending, accepted, rejected)
    #[arg(long)]
    status: Option<RelationshipStatus>,

    /// Number of relationships per page
    #[arg(long, short = 'n', default_value = "20")]
    page_size: u32,

    /// Continuation token from a previous page
    #[arg(long, default_value = "")]
    token: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute a relationships command
pub async fn execute(cmd: RelationshipsCommand, session: &Session) -> Result<()> {
    match cmd {
        RelationshipsCommand::Add(args) => execute_add(args, session).await,
        RelationshipsCommand::SetStatus(args) => execute_set_status(args, session).await,
        RelationshipsCommand::List(args) => execute_list(args, session).await,
    }
}

async fn execute_add(args: AddArgs, session: &Session) -> Result<()> {
    let store = session.open_store()?;

    let record = store
        .create_relationship(args.sender, args.receiver)
        .map_err(BackendError::from)
        .context("Failed to create relationship")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!(
            "Created relationship {} ({} -> {}, {})",
            record.id, record.sender_id, record.receiver_id, record.status
        );
    }
    Ok(())
}

async fn execute_set_status(args: SetStatusArgs, session: &Session) -> Result<()> {
    let store = session.open_store()?;

    let mask = FieldMask::new(args.mask.iter().map(|path| path.trim()));
    let record = store
        .update_relationship(args.id, &args.status, &mask)
        .map_err(BackendError::from)
        .context("Failed to update relationship")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Relationship {} is now {}", record.id, record.status);
    }
    Ok(())
}

async fn execute_list(args: ListArgs, session: &Session) -> Result<()> {
    let store = session.open_store()?;
    let source =
        SqliteRelationshipSource::from_config(store, &session.config()?.relationships)?;

    let mut filter = FilterSpec::all();
    if let Some(sender) = args.sender {
        filter = filter.and(Predicate::sender_is(sender));
    }
    if let Some(receiver) = args.receiver {
        filter = filter.and(Predicate::receiver_is(receiver));
    }
    if let Some(status) = args.status {
        filter = filter.and(Predicate::status_is(status));
    }

    let request = PageRequest::first(filter, args.page_size).resume(args.token);
    let page = source
        .list(&CallContext::background(), request)
        .await
        .context("Failed to list relationships")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    print_relationships(&page.items);
    if page.is_last() {
        print_info("(last page)", session.quiet());
    } else {
        println!("next token: {}", page.next_token);
    }
    Ok(())
}
