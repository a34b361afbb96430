//! Common test utilities for kinship-backend integration tests.
//!
//! Provides record builders and a scripted source that counts calls and can
//! fail, hang, or stop advancing on demand.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use kinship_backend::{Aggregator, BackendError, CallContext, InMemorySource, PaginatedList};
use kinship_core::{Entity, Page, PageRequest, PageSizeLimits, Record, RelationshipRecord, RelationshipStatus};

/// Entities with ids `ids`, named `user<id>`.
pub fn entities(ids: impl IntoIterator<Item = i64>) -> Vec<Entity> {
    ids.into_iter()
        .map(|id| Entity::new(id, format!("user{}", id)))
        .collect()
}

pub fn rel(id: i64, sender: &str, receiver: &str, status: RelationshipStatus) -> RelationshipRecord {
    RelationshipRecord::new(id, sender, receiver, status)
}

pub fn accepted(id: i64, sender: i64, receiver: i64) -> RelationshipRecord {
    rel(id, &sender.to_string(), &receiver.to_string(), RelationshipStatus::Accepted)
}

pub fn pending(id: i64, sender: i64, receiver: i64) -> RelationshipRecord {
    rel(id, &sender.to_string(), &receiver.to_string(), RelationshipStatus::Pending)
}

pub fn ids(entities: &[Entity]) -> Vec<i64> {
    entities.iter().map(|e| e.id.get()).collect()
}

/// How a [`ScriptedSource`] misbehaves.
#[derive(Debug, Clone, Copy, Default)]
pub enum Script {
    #[default]
    Honest,
    /// Fail the n-th call (1-based) with an internal error
    FailOn(usize),
    /// Never answer the n-th call (1-based)
    HangOn(usize),
    /// Echo the request token back once past the first page
    StuckToken,
}

/// An in-memory source with a call counter and a failure script.
pub struct ScriptedSource<T> {
    inner: InMemorySource<T>,
    script: Script,
    calls: AtomicUsize,
}

impl<T: Record> ScriptedSource<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            inner: InMemorySource::new(records),
            script: Script::Honest,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.script = script;
        self
    }

    pub fn with_limits(mut self, min: u32, max: u32) -> Self {
        self.inner = self.inner.with_limits(PageSizeLimits::new(min, max).unwrap());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Record> PaginatedList<T> for ScriptedSource<T> {
    async fn list(&self, ctx: &CallContext, request: PageRequest) -> Result<Page<T>, BackendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        match self.script {
            Script::FailOn(n) if n == call => {
                Err(BackendError::internal(format!("scripted failure on call {}", call)))
            }
            Script::HangOn(n) if n == call => {
                ctx.run(std::future::pending::<Result<Page<T>, BackendError>>())
                    .await
            }
            Script::StuckToken if !request.token.is_empty() => {
                let mut page = self.inner.page(&request)?;
                page.next_token = request.token.clone();
                Ok(page)
            }
            _ => self.inner.list(ctx, request).await,
        }
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}

/// Wire two scripted sources into an aggregator, keeping handles for inspection.
pub fn aggregator(
    relationships: ScriptedSource<RelationshipRecord>,
    entities: ScriptedSource<Entity>,
    drain_page_size: u32,
) -> (
    Aggregator,
    Arc<ScriptedSource<RelationshipRecord>>,
    Arc<ScriptedSource<Entity>>,
) {
    let relationships = Arc::new(relationships);
    let entities = Arc::new(entities);
    let aggregator = Aggregator::new(relationships.clone(), entities.clone())
        .with_drain_page_size(drain_page_size);
    (aggregator, relationships, entities)
}
