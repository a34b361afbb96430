//! SQLite-backed sources.
//!
//! Both sources share one [`SqliteStore`]; queries run on the blocking pool
//! and are raced against the request's [`CallContext`].

use std::sync::Arc;

use async_trait::async_trait;
use kinship_config::{EntitySourceConfig, RelationshipSourceConfig};
use kinship_core::{
    CursorCodec, Entity, Page, PageRequest, PageSizeLimits, RelationshipRecord, SqliteStore,
    StoreError,
};

use crate::context::CallContext;
use crate::error::BackendError;
use crate::traits::PaginatedList;

/// Relationship records served from the `relationships` table.
#[derive(Debug, Clone)]
pub struct SqliteRelationshipSource {
    store: Arc<SqliteStore>,
    limits: PageSizeLimits,
    codec: CursorCodec,
}

impl SqliteRelationshipSource {
    pub fn new(store: Arc<SqliteStore>, limits: PageSizeLimits, codec: CursorCodec) -> Self {
        Self {
            store,
            limits,
            codec,
        }
    }

    pub fn from_config(
        store: Arc<SqliteStore>,
        config: &RelationshipSourceConfig,
    ) -> Result<Self, BackendError> {
        let limits = PageSizeLimits::new(config.min_page_size, config.max_page_size)?;
        Ok(Self::new(
            store,
            limits,
            CursorCodec::new(config.cursor_prefix.clone()),
        ))
    }

    pub fn limits(&self) -> PageSizeLimits {
        self.limits
    }
}

#[async_trait]
impl PaginatedList<RelationshipRecord> for SqliteRelationshipSource {
    async fn list(
        &self,
        ctx: &CallContext,
        request: PageRequest,
    ) -> Result<Page<RelationshipRecord>, BackendError> {
        let store = Arc::clone(&self.store);
        let limits = self.limits;
        let codec = self.codec.clone();

        blocking_list(ctx, move || {
            store.list_relationships(&request, &limits, &codec)
        })
        .await
    }

    fn source_name(&self) -> &str {
        "relationships"
    }
}

/// Entities served from the `entities` table.
#[derive(Debug, Clone)]
pub struct SqliteEntitySource {
    store: Arc<SqliteStore>,
    limits: PageSizeLimits,
    codec: CursorCodec,
}

impl SqliteEntitySource {
    pub fn new(store: Arc<SqliteStore>, limits: PageSizeLimits, codec: CursorCodec) -> Self {
        Self {
            store,
            limits,
            codec,
        }
    }

    pub fn from_config(
        store: Arc<SqliteStore>,
        config: &EntitySourceConfig,
    ) -> Result<Self, BackendError> {
        let limits = PageSizeLimits::new(config.min_page_size, config.max_page_size)?;
        Ok(Self::new(
            store,
            limits,
            CursorCodec::new(config.cursor_prefix.clone()),
        ))
    }

    pub fn limits(&self) -> PageSizeLimits {
        self.limits
    }
}

#[async_trait]
impl PaginatedList<Entity> for SqliteEntitySource {
    async fn list(&self, ctx: &CallContext, request: PageRequest) -> Result<Page<Entity>, BackendError> {
        let store = Arc::clone(&self.store);
        let limits = self.limits;
        let codec = self.codec.clone();

        blocking_list(ctx, move || store.list_entities(&request, &limits, &codec)).await
    }

    fn source_name(&self) -> &str {
        "entities"
    }
}

async fn blocking_list<T, F>(ctx: &CallContext, query: F) -> Result<Page<T>, BackendError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<Page<T>, StoreError> + Send + 'static,
{
    ctx.run(async move {
        tokio::task::spawn_blocking(query)
            .await
            .map_err(|e| BackendError::internal(format!("Store query task panicked: {}", e)))?
            .map_err(BackendError::from)
    })
    .await
}
