//! Entities command - Add, show and list entities

use anyhow::{Context, Result};
use clap::Subcommand;
use kinship_backend::{BackendError, CallContext, PaginatedList, SqliteEntitySource};
use kinship_core::{Field, FilterSpec, Identifier, NewEntity, PageRequest, Predicate};

use super::{print_entities, print_info, Session};

/// Entity commands
#[derive(Subcommand, Debug)]
pub enum EntitiesCommand {
    /// Add an entity
    Add(AddArgs),

    /// Show one entity
    Get(GetArgs),

    /// List one page of entities
    List(ListArgs),
}

/// Arguments for the add command
#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Unique user name
    user_name: String,

    #[arg(long, default_value = "")]
    first_name: String,

    #[arg(long, default_value = "")]
    last_name: String,

    /// Unique email address
    #[arg(long, default_value = "")]
    email: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the get command
#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Entity id
    id: Identifier,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the list command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Number of entities per page
    #[arg(long, short = 'n', default_value = "20")]
    page_size: u32,

    /// Continuation token from a previous page
    #[arg(long, default_value = "")]
    token: String,

    /// Match user name exactly
    #[arg(long)]
    user_name: Option<String>,

    /// Match first name (case-insensitive)
    #[arg(long)]
    first_name: Option<String>,

    /// Match last name (case-insensitive)
    #[arg(long)]
    last_name: Option<String>,

    /// Match email exactly
    #[arg(long)]
    email: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute an entities command
pub async fn execute(cmd: EntitiesCommand, session: &Session) -> Result<()> {
    match cmd {
        EntitiesCommand::Add(args) => execute_add(args, session).await,
        EntitiesCommand::Get(args) => execute_get(args, session).await,
        EntitiesCommand::List(args) => execute_list(args, session).await,
    }
}

async fn execute_add(args: AddArgs, session: &Session) -> Result<()> {
    let store = session.open_store()?;

    let entity = store
        .create_entity(&NewEntity {
            first_name: args.first_name,
            last_name: args.last_name,
            user_name: args.user_name,
            email: args.email,
        })
        .map_err(BackendError::from)
        .context("Failed to create entity")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entity)?);
    } else {
        println!("Created entity {} ({})", entity.id, entity.user_name);
    }
    Ok(())
}

async fn execute_get(args: GetArgs, session: &Session) -> Result<()> {
    let store = session.open_store()?;

    let entity = store
        .get_entity(args.id)
        .map_err(BackendError::from)
        .context("Failed to get entity")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entity)?);
    } else {
        print_entities(std::slice::from_ref(&entity));
    }
    Ok(())
}

async fn execute_list(args: ListArgs, session: &Session) -> Result<()> {
    let store = session.open_store()?;
    let source = SqliteEntitySource::from_config(store, &session.config()?.entities)?;

    let filter: FilterSpec = [
        (Field::UserName, args.user_name),
        (Field::FirstName, args.first_name),
        (Field::LastName, args.last_name),
        (Field::Email, args.email),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|v| Predicate::text_equals(field, v)))
    .collect();

    let request = PageRequest::first(filter, args.page_size).resume(args.token);
    let page = source
        .list(&CallContext::background(), request)
        .await
        .context("Failed to list entities")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    print_entities(&page.items);
    if page.is_last() {
        print_info("(last page)", session.quiet());
    } else {
        println!("next token: {}", page.next_token);
    }
    Ok(())
}
