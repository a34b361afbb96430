//! SQLite schema for the reference stores.

/// Schema version recorded in `store_metadata`
pub const STORE_SCHEMA_VERSION: &str = "1.0";

/// SQL to create the entities table
///
/// `email` is nullable so entities without an address do not collide on the
/// unique index. It reads back as an empty string.
pub const SCHEMA_CREATE_ENTITIES: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    user_name TEXT NOT NULL UNIQUE,
    email TEXT UNIQUE,
    created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER))
)
"#;

/// SQL to create the relationships table
///
/// `blocked` is accepted for rows written by older deployments and reads back
/// as `rejected`.
pub const SCHEMA_CREATE_RELATIONSHIPS: &str = r#"
CREATE TABLE IF NOT EXISTS relationships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sender_id INTEGER NOT NULL REFERENCES entities(id),
    receiver_id INTEGER NOT NULL REFERENCES entities(id),
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'accepted', 'rejected', 'blocked')),
    created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER)),

    UNIQUE(sender_id, receiver_id),
    CHECK (sender_id <> receiver_id)
)
"#;

/// SQL to create indexes for the filtered listings
pub const SCHEMA_CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_relationships_sender ON relationships(sender_id, status);
CREATE INDEX IF NOT EXISTS idx_relationships_receiver ON relationships(receiver_id, status);
CREATE INDEX IF NOT EXISTS idx_entities_first_name ON entities(LOWER(first_name));
CREATE INDEX IF NOT EXISTS idx_entities_last_name ON entities(LOWER(last_name));
"#;

/// SQL to create the metadata table
pub const SCHEMA_CREATE_METADATA: &str = r#"
CREATE TABLE IF NOT EXISTS store_metadata (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)
"#;

/// Column list for entity queries (in order for row mapping)
pub const ENTITY_COLUMNS: &str =
    "id, first_name, last_name, user_name, COALESCE(email, ''), created_at";

/// Column list for relationship queries (in order for row mapping)
pub const RELATIONSHIP_COLUMNS: &str = "id, sender_id, receiver_id, status, created_at";
