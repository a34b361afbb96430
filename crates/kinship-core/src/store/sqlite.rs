//! SQLite-backed entity and relationship stores.

use super::error::StoreError;
use super::query::{entity_clause, relationship_clause, SqlWhere};
use super::schema::{
    ENTITY_COLUMNS, RELATIONSHIP_COLUMNS, SCHEMA_CREATE_ENTITIES, SCHEMA_CREATE_INDEXES,
    SCHEMA_CREATE_METADATA, SCHEMA_CREATE_RELATIONSHIPS, STORE_SCHEMA_VERSION,
};
use crate::cursor::CursorCodec;
use crate::filter::{Predicate, Record};
use crate::id::Identifier;
use crate::page::{Page, PageRequest, PageSizeLimits};
use crate::record::{
    Entity, FieldMask, NewEntity, RelationshipRecord, RelationshipStatus,
    UPDATABLE_RELATIONSHIP_FIELDS,
};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A SQLite database holding both reference stores.
///
/// The connection is guarded by a mutex; callers on an async runtime should
/// invoke it from a blocking task.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Row counts for a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub entity_count: usize,
    pub relationship_count: usize,
    pub accepted_count: usize,
    pub pending_count: usize,
}

impl SqliteStore {
    /// Open (creating if needed) a store database.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::configure_connection(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        debug!("Opened store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::configure_connection(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn configure_connection(conn: &Connection) -> SqliteResult<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        // Relationship parties must exist
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        Ok(())
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        {
            let conn = self.conn.lock();
            conn.execute(SCHEMA_CREATE_ENTITIES, [])?;
            conn.execute(SCHEMA_CREATE_RELATIONSHIPS, [])?;
            conn.execute(SCHEMA_CREATE_METADATA, [])?;
            conn.execute_batch(SCHEMA_CREATE_INDEXES)?;
        }

        match self.get_metadata("schema_version")? {
            Some(found) if found != STORE_SCHEMA_VERSION => {
                Err(StoreError::SchemaVersionMismatch {
                    expected: STORE_SCHEMA_VERSION.to_string(),
                    found,
                })
            }
            Some(_) => Ok(()),
            None => self.set_metadata("schema_version", STORE_SCHEMA_VERSION),
        }
    }

    /// Database file path (`None` for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // =========================================================================
    // Metadata Operations
    // =========================================================================

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self
            .conn
            .lock()
            .query_row(
                "SELECT value FROM store_metadata WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO store_metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // =========================================================================
    // Entity Operations
    // =========================================================================

    /// Insert an entity. Duplicate user names or emails fail with `AlreadyExists`.
    pub fn create_entity(&self, entity: &NewEntity) -> Result<Entity, StoreError> {
        if entity.user_name.trim().is_empty() {
            return Err(StoreError::invalid_argument("user name is required"));
        }

        let sql = format!(
            "INSERT INTO entities (first_name, last_name, user_name, email) \
             VALUES (?1, ?2, ?3, NULLIF(?4, '')) RETURNING {}",
            ENTITY_COLUMNS
        );
        self.conn
            .lock()
            .query_row(
                &sql,
                params![
                    entity.first_name,
                    entity.last_name,
                    entity.user_name,
                    entity.email
                ],
                Self::row_to_entity,
            )
            .map_err(|e| StoreError::from_constraint(e, "entity"))
    }

    pub fn get_entity(&self, id: Identifier) -> Result<Entity, StoreError> {
        let sql = format!("SELECT {} FROM entities WHERE id = ?1", ENTITY_COLUMNS);
        self.conn
            .lock()
            .query_row(&sql, [id.get()], Self::row_to_entity)
            .optional()?
            .ok_or_else(|| StoreError::not_found(format!("entity {}", id)))
    }

    /// List one page of entities.
    pub fn list_entities(
        &self,
        request: &PageRequest,
        limits: &PageSizeLimits,
        codec: &CursorCodec,
    ) -> Result<Page<Entity>, StoreError> {
        self.list_page(
            "entities",
            ENTITY_COLUMNS,
            request,
            limits,
            codec,
            entity_clause,
            Self::row_to_entity,
        )
    }

    fn row_to_entity(row: &rusqlite::Row<'_>) -> SqliteResult<Entity> {
        Ok(Entity {
            id: Identifier::new(row.get(0)?),
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            user_name: row.get(3)?,
            email: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    // =========================================================================
    // Relationship Operations
    // =========================================================================

    /// Record a new pending relationship from `sender` to `receiver`.
    pub fn create_relationship(
        &self,
        sender: Identifier,
        receiver: Identifier,
    ) -> Result<RelationshipRecord, StoreError> {
        if sender == receiver {
            return Err(StoreError::invalid_argument(
                "sender and receiver must be different entities",
            ));
        }

        let sql = format!(
            "INSERT INTO relationships (sender_id, receiver_id, status) \
             VALUES (?1, ?2, 'pending') RETURNING {}",
            RELATIONSHIP_COLUMNS
        );
        self.conn
            .lock()
            .query_row(
                &sql,
                params![sender.get(), receiver.get()],
                Self::row_to_relationship,
            )
            .map_err(|e| StoreError::from_constraint(e, "relationship"))
    }

    /// Update the fields of a relationship named in `mask`.
    ///
    /// `status` is the only updatable field.
    pub fn update_relationship(
        &self,
        id: Identifier,
        status: &str,
        mask: &FieldMask,
    ) -> Result<RelationshipRecord, StoreError> {
        mask.validate(UPDATABLE_RELATIONSHIP_FIELDS)
            .map_err(StoreError::InvalidArgument)?;
        let status = status
            .parse::<RelationshipStatus>()
            .map_err(|e| StoreError::invalid_argument(e.to_string()))?;

        let sql = format!(
            "UPDATE relationships SET status = ?1 WHERE id = ?2 RETURNING {}",
            RELATIONSHIP_COLUMNS
        );
        self.conn
            .lock()
            .query_row(
                &sql,
                params![status.as_str(), id.get()],
                Self::row_to_relationship,
            )
            .optional()
            .map_err(|e| StoreError::from_constraint(e, "relationship"))?
            .ok_or_else(|| StoreError::not_found(format!("relationship {}", id)))
    }

    /// List one page of relationships.
    pub fn list_relationships(
        &self,
        request: &PageRequest,
        limits: &PageSizeLimits,
        codec: &CursorCodec,
    ) -> Result<Page<RelationshipRecord>, StoreError> {
        self.list_page(
            "relationships",
            RELATIONSHIP_COLUMNS,
            request,
            limits,
            codec,
            relationship_clause,
            Self::row_to_relationship,
        )
    }

    fn row_to_relationship(row: &rusqlite::Row<'_>) -> SqliteResult<RelationshipRecord> {
        let sender: i64 = row.get(1)?;
        let receiver: i64 = row.get(2)?;
        let status: String = row.get(3)?;
        Ok(RelationshipRecord {
            id: Identifier::new(row.get(0)?),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            status: RelationshipStatus::from_stored(&status),
            created_at: row.get(4)?,
        })
    }

    // =========================================================================
    // Shared listing
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    fn list_page<T: Record>(
        &self,
        table: &str,
        columns: &str,
        request: &PageRequest,
        limits: &PageSizeLimits,
        codec: &CursorCodec,
        translate: fn(&Predicate, &mut SqlWhere),
        map_row: fn(&rusqlite::Row<'_>) -> SqliteResult<T>,
    ) -> Result<Page<T>, StoreError> {
        let page_size = limits.normalize(request.page_size)?;
        let cursor = codec.decode(&request.token)?;
        let filter = SqlWhere::build::<T>(&request.filter, cursor, translate)?;

        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY id ASC LIMIT {}",
            columns,
            table,
            filter.clause(),
            u64::from(page_size) + 1
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(filter.values()), map_row)?
            .collect::<SqliteResult<Vec<T>>>()?;

        debug!(
            "Listed {} {} rows (page size {}, cursor {:?})",
            rows.len().min(page_size as usize),
            table,
            page_size,
            cursor
        );
        Ok(Page::from_overfetch(rows, page_size, codec))
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn.lock();
        let count = |sql: &str| -> Result<usize, StoreError> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(StoreStats {
            entity_count: count("SELECT COUNT(*) FROM entities")?,
            relationship_count: count("SELECT COUNT(*) FROM relationships")?,
            accepted_count: count("SELECT COUNT(*) FROM relationships WHERE status = 'accepted'")?,
            pending_count: count("SELECT COUNT(*) FROM relationships WHERE status = 'pending'")?,
        })
    }
}
