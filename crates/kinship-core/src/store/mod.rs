//! SQLite reference stores
//!
//! One database file holds both the entity store and the relationship store.
//! Both are listed through the same seek-pagination contract as every other
//! source: normalise the page size, decode the token, apply the filter as a
//! conjunction of bound-parameter clauses, over-fetch one row.

mod error;
mod query;
mod schema;
mod sqlite;

pub use error::StoreError;
pub use schema::{
    ENTITY_COLUMNS, RELATIONSHIP_COLUMNS, SCHEMA_CREATE_ENTITIES, SCHEMA_CREATE_INDEXES,
    SCHEMA_CREATE_METADATA, SCHEMA_CREATE_RELATIONSHIPS, STORE_SCHEMA_VERSION,
};
pub use sqlite::{SqliteStore, StoreStats};
