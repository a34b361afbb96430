//! Relationship aggregation across the relationship and entity sources.
//!
//! Resolves a subject's relationship set, then drains the entity source either
//! restricted to that set (friends) or unfiltered with the set excluded
//! (everyone the subject has no relationship with).

use std::collections::HashSet;
use std::sync::Arc;

use kinship_config::AggregatorConfig;
use kinship_core::{Entity, FilterSpec, Identifier, Predicate, RelationshipRecord};
use tracing::{info, warn};

use crate::context::CallContext;
use crate::drain::drain_all;
use crate::error::{BackendError, Phase};
use crate::resolver::{RelationshipResolver, ResolveMode};
use crate::traits::PaginatedList;
use crate::types::{FetchRelatedRequest, FetchRelatedResponse};

/// Page size requested from each source while draining.
pub const DEFAULT_DRAIN_PAGE_SIZE: u32 = 1000;

/// Aggregates entities across a relationship source and an entity source.
///
/// Holds no per-request state; one instance can serve concurrent requests.
pub struct Aggregator {
    relationships: Arc<dyn PaginatedList<RelationshipRecord>>,
    entities: Arc<dyn PaginatedList<Entity>>,
    drain_page_size: u32,
}

impl Aggregator {
    pub fn new(
        relationships: Arc<dyn PaginatedList<RelationshipRecord>>,
        entities: Arc<dyn PaginatedList<Entity>>,
    ) -> Self {
        Self {
            relationships,
            entities,
            drain_page_size: DEFAULT_DRAIN_PAGE_SIZE,
        }
    }

    /// Create an aggregator using the configured drain page size.
    pub fn with_config(
        relationships: Arc<dyn PaginatedList<RelationshipRecord>>,
        entities: Arc<dyn PaginatedList<Entity>>,
        config: &AggregatorConfig,
    ) -> Self {
        Self::new(relationships, entities).with_drain_page_size(config.drain_page_size)
    }

    pub fn with_drain_page_size(mut self, page_size: u32) -> Self {
        self.drain_page_size = page_size;
        self
    }

    pub fn drain_page_size(&self) -> u32 {
        self.drain_page_size
    }

    /// Fetch the entities related to `subject_id`.
    ///
    /// With `show_related` the result is the subject's confirmed friends;
    /// without it, every entity that shares no relationship record with the
    /// subject (the subject itself excluded). Entities come back in entity
    /// source order.
    pub async fn fetch_related_entities(
        &self,
        ctx: &CallContext,
        subject_id: &str,
        show_related: bool,
    ) -> Result<Vec<Entity>, BackendError> {
        let subject = parse_subject(subject_id)?;

        let entities = if show_related {
            self.fetch_friends(ctx, subject).await?
        } else {
            self.fetch_unrelated(ctx, subject).await?
        };

        info!(
            "Aggregated {} entities for subject {} (show_related={})",
            entities.len(),
            subject,
            show_related
        );
        Ok(entities)
    }

    /// Request/response form of [`Aggregator::fetch_related_entities`].
    pub async fn fetch(
        &self,
        ctx: &CallContext,
        request: &FetchRelatedRequest,
    ) -> Result<FetchRelatedResponse, BackendError> {
        let entities = self
            .fetch_related_entities(ctx, &request.subject_id, request.show_related)
            .await?;
        Ok(FetchRelatedResponse { entities })
    }

    /// Resolve the relationship set of `subject_id` without fetching entities.
    pub async fn resolve(
        &self,
        ctx: &CallContext,
        subject_id: &str,
        mode: ResolveMode,
    ) -> Result<HashSet<Identifier>, BackendError> {
        let subject = parse_subject(subject_id)?;
        self.resolve_subject(ctx, subject, mode).await
    }

    async fn resolve_subject(
        &self,
        ctx: &CallContext,
        subject: Identifier,
        mode: ResolveMode,
    ) -> Result<HashSet<Identifier>, BackendError> {
        RelationshipResolver::new(self.relationships.as_ref(), self.drain_page_size)
            .resolve(ctx, subject, mode)
            .await
    }

    async fn fetch_friends(
        &self,
        ctx: &CallContext,
        subject: Identifier,
    ) -> Result<Vec<Entity>, BackendError> {
        let friends = self.resolve_subject(ctx, subject, ResolveMode::Friends).await?;
        if friends.is_empty() {
            return Ok(Vec::new());
        }

        let filter = FilterSpec::all().and(Predicate::id_in(friends));
        self.drain_entities(ctx, subject, filter, Phase::FriendEntities)
            .await
    }

    async fn fetch_unrelated(
        &self,
        ctx: &CallContext,
        subject: Identifier,
    ) -> Result<Vec<Entity>, BackendError> {
        let involved = self.resolve_subject(ctx, subject, ResolveMode::Involved).await?;

        let mut entities = self
            .drain_entities(ctx, subject, FilterSpec::all(), Phase::AllEntities)
            .await?;
        entities.retain(|entity| !involved.contains(&entity.id));
        Ok(entities)
    }

    async fn drain_entities(
        &self,
        ctx: &CallContext,
        subject: Identifier,
        filter: FilterSpec,
        phase: Phase,
    ) -> Result<Vec<Entity>, BackendError> {
        drain_all(self.entities.as_ref(), ctx, filter, self.drain_page_size)
            .await
            .map_err(|e| {
                warn!("Entity drain failed for subject {}: {}", subject, e);
                e.during(phase)
            })
    }
}

/// Validate a request-level subject id before any upstream call.
fn parse_subject(subject_id: &str) -> Result<Identifier, BackendError> {
    if subject_id.is_empty() {
        return Err(BackendError::invalid_argument("subject id is required"));
    }
    Identifier::parse(subject_id)
        .map_err(|e| BackendError::invalid_argument(format!("subject id: {}", e)))
}
