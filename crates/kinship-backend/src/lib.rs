//! Kinship Backend - paginated sources and relationship aggregation
//!
//! This crate provides:
//! - [`PaginatedList`]: the one-method capability every upstream source implements
//! - [`PageDrain`] / [`drain_all`]: walk a source page by page until exhausted
//! - [`RelationshipResolver`]: compute the friend set or involved set of a subject
//! - [`Aggregator`]: resolve a relationship set and fetch the matching entities
//! - [`CallContext`]: cancellation and deadline threaded through every upstream call
//!
//! ## Sources
//!
//! - [`SqliteRelationshipSource`] / [`SqliteEntitySource`]: the SQLite reference stores
//! - [`InMemorySource`]: a fixed record vector, for tests and embedding applications
//!
//! ## Example
//!
//! ```ignore
//! use kinship_backend::{Aggregator, CallContext, SqliteEntitySource, SqliteRelationshipSource};
//! use kinship_config::KinshipConfig;
//! use kinship_core::SqliteStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = KinshipConfig::default();
//!     let store = Arc::new(SqliteStore::open("kinship.db".as_ref())?);
//!
//!     let aggregator = Aggregator::new(
//!         Arc::new(SqliteRelationshipSource::from_config(store.clone(), &config.relationships)?),
//!         Arc::new(SqliteEntitySource::from_config(store, &config.entities)?),
//!     );
//!
//!     let friends = aggregator
//!         .fetch_related_entities(&CallContext::background(), "1", true)
//!         .await?;
//!     println!("{} friends", friends.len());
//!     Ok(())
//! }
//! ```

mod aggregator;
mod context;
mod drain;
mod error;
mod local;
mod memory;
mod resolver;
mod traits;
mod types;

pub use aggregator::Aggregator;
pub use context::{CallContext, CancelHandle};
pub use drain::{drain_all, PageDrain};
pub use error::{BackendError, ErrorCode, Phase};
pub use local::{SqliteEntitySource, SqliteRelationshipSource};
pub use memory::InMemorySource;
pub use resolver::{Direction, RelationshipResolver, ResolveMode};
pub use traits::PaginatedList;
pub use types::*;

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
