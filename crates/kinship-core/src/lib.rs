//! Kinship Core - the data model shared by every paginated source
//!
//! This crate provides:
//! - [`Identifier`]: 64-bit ids transported as decimal strings
//! - [`CursorCodec`]: opaque continuation tokens naming the last-seen id
//! - [`FilterSpec`]: a closed set of typed predicates combined with AND
//! - [`Page`] / [`PageRequest`] / [`PageSizeLimits`]: the seek-pagination contract
//! - [`RelationshipRecord`] and [`Entity`]: the two record kinds being listed
//! - [`store`]: SQLite reference stores implementing the list contract

pub mod cursor;
pub mod filter;
pub mod id;
pub mod page;
pub mod record;
pub mod store;

// Re-exports for convenience
pub use cursor::{ContinuationToken, Cursor, CursorCodec, CursorError};
pub use filter::{Field, FieldValue, FilterError, FilterSpec, Predicate, Record};
pub use id::{IdParseError, Identifier};
pub use page::{Page, PageRequest, PageSizeError, PageSizeLimits};
pub use record::{
    Entity, FieldMask, NewEntity, RelationshipRecord, RelationshipStatus, StatusParseError,
};
pub use store::{SqliteStore, StoreError, StoreStats, STORE_SCHEMA_VERSION};
