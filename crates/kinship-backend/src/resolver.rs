//! Relationship set resolution.
//!
//! Turns the relationship records of a subject into a set of counterpart
//! identifiers by draining the relationship source once per direction.

use std::collections::HashSet;
use std::fmt;

use kinship_core::{FilterSpec, Identifier, Predicate, RelationshipRecord, RelationshipStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::CallContext;
use crate::drain::drain_all;
use crate::error::{BackendError, Phase};
use crate::traits::PaginatedList;

/// Which relationship set to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    /// Counterparts of accepted relationships, never the subject itself
    Friends,
    /// Everyone sharing any relationship record with the subject, plus the subject
    Involved,
}

impl ResolveMode {
    /// The phase reported when the relationship source fails.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Friends => Phase::FriendRelationships,
            Self::Involved => Phase::InvolvedRelationships,
        }
    }
}

/// The side of a relationship the subject is queried on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The subject proposed the relationship
    Sent,
    /// The subject received the proposal
    Received,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Sent, Direction::Received];

    fn subject_is(&self, subject: Identifier) -> Predicate {
        match self {
            Self::Sent => Predicate::sender_is(subject),
            Self::Received => Predicate::receiver_is(subject),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sent => "sender",
            Self::Received => "receiver",
        })
    }
}

/// Computes relationship sets against one relationship source.
pub struct RelationshipResolver<'a> {
    source: &'a dyn PaginatedList<RelationshipRecord>,
    page_size: u32,
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(source: &'a dyn PaginatedList<RelationshipRecord>, page_size: u32) -> Self {
        Self { source, page_size }
    }

    /// Resolve the `mode` set of `subject`.
    ///
    /// The sender-side drain completes before the receiver-side drain starts.
    /// A source failure aborts resolution and is reported as the mode's phase;
    /// cancellation and deadline errors are returned unchanged.
    pub async fn resolve(
        &self,
        ctx: &CallContext,
        subject: Identifier,
        mode: ResolveMode,
    ) -> Result<HashSet<Identifier>, BackendError> {
        let mut resolved = HashSet::new();
        if mode == ResolveMode::Involved {
            resolved.insert(subject);
        }

        for direction in Direction::BOTH {
            let records = self
                .drain_direction(ctx, subject, direction, mode)
                .await
                .map_err(|e| {
                    warn!(
                        "Relationship drain failed for subject {} as {}: {}",
                        subject, direction, e
                    );
                    e.during(mode.phase())
                })?;

            debug!(
                "Subject {} as {}: {} relationship records",
                subject,
                direction,
                records.len()
            );

            for record in &records {
                match mode {
                    ResolveMode::Friends => {
                        insert_counterpart(&mut resolved, record, subject, direction)
                    }
                    ResolveMode::Involved => insert_parties(&mut resolved, record),
                }
            }
        }

        Ok(resolved)
    }

    async fn drain_direction(
        &self,
        ctx: &CallContext,
        subject: Identifier,
        direction: Direction,
        mode: ResolveMode,
    ) -> Result<Vec<RelationshipRecord>, BackendError> {
        let mut filter = FilterSpec::all().and(direction.subject_is(subject));
        if mode == ResolveMode::Friends {
            filter = filter.and(Predicate::status_is(RelationshipStatus::Accepted));
        }
        drain_all(self.source, ctx, filter, self.page_size).await
    }
}

/// Insert the other party of an accepted relationship.
fn insert_counterpart(
    resolved: &mut HashSet<Identifier>,
    record: &RelationshipRecord,
    subject: Identifier,
    direction: Direction,
) {
    let raw = match direction {
        Direction::Sent => &record.receiver_id,
        Direction::Received => &record.sender_id,
    };

    match Identifier::parse(raw) {
        Ok(id) if id == subject => {
            warn!(
                "Skipping self-referential relationship {} of subject {}",
                record.id, subject
            );
        }
        Ok(id) => {
            resolved.insert(id);
        }
        Err(e) => {
            warn!(
                "Skipping relationship {} with malformed {} id: {}",
                record.id,
                match direction {
                    Direction::Sent => Direction::Received,
                    Direction::Received => Direction::Sent,
                },
                e
            );
        }
    }
}

/// Insert both parties of a relationship, skipping malformed ones.
fn insert_parties(resolved: &mut HashSet<Identifier>, record: &RelationshipRecord) {
    for (side, raw) in [
        (Direction::Sent, &record.sender_id),
        (Direction::Received, &record.receiver_id),
    ] {
        match Identifier::parse(raw) {
            Ok(id) => {
                resolved.insert(id);
            }
            Err(e) => warn!(
                "Skipping malformed {} id of relationship {}: {}",
                side, record.id, e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySource;
    use kinship_core::PageSizeLimits;

    fn ids(values: &[i64]) -> HashSet<Identifier> {
        values.iter().copied().map(Identifier::new).collect()
    }

    fn source(records: Vec<RelationshipRecord>) -> InMemorySource<RelationshipRecord> {
        InMemorySource::new(records).with_limits(PageSizeLimits::new(1, 1000).unwrap())
    }

    #[tokio::test]
    async fn test_friends_takes_counterparts() {
        let source = source(vec![
            RelationshipRecord::new(1, "1", "2", RelationshipStatus::Accepted),
            RelationshipRecord::new(2, "3", "1", RelationshipStatus::Accepted),
            RelationshipRecord::new(3, "1", "4", RelationshipStatus::Pending),
        ]);
        let resolver = RelationshipResolver::new(&source, 1);

        let friends = resolver
            .resolve(&CallContext::background(), Identifier::new(1), ResolveMode::Friends)
            .await
            .unwrap();
        assert_eq!(friends, ids(&[2, 3]));
    }

    #[tokio::test]
    async fn test_friends_skips_malformed_and_self() {
        let source = source(vec![
            RelationshipRecord::new(1, "1", "oops", RelationshipStatus::Accepted),
            RelationshipRecord::new(2, "1", "1", RelationshipStatus::Accepted),
            RelationshipRecord::new(3, "1", "5", RelationshipStatus::Accepted),
        ]);
        let resolver = RelationshipResolver::new(&source, 10);

        let friends = resolver
            .resolve(&CallContext::background(), Identifier::new(1), ResolveMode::Friends)
            .await
            .unwrap();
        assert_eq!(friends, ids(&[5]));
    }

    #[tokio::test]
    async fn test_involved_includes_subject_without_records() {
        let source = source(Vec::new());
        let resolver = RelationshipResolver::new(&source, 10);

        let involved = resolver
            .resolve(&CallContext::background(), Identifier::new(9), ResolveMode::Involved)
            .await
            .unwrap();
        assert_eq!(involved, ids(&[9]));
    }

    #[tokio::test]
    async fn test_involved_ignores_status() {
        let source = source(vec![
            RelationshipRecord::new(1, "1", "2", RelationshipStatus::Pending),
            RelationshipRecord::new(2, "3", "1", RelationshipStatus::Rejected),
            RelationshipRecord::new(3, "4", "x", RelationshipStatus::Accepted),
            RelationshipRecord::new(4, "1", "bad", RelationshipStatus::Accepted),
        ]);
        let resolver = RelationshipResolver::new(&source, 10);

        let involved = resolver
            .resolve(&CallContext::background(), Identifier::new(1), ResolveMode::Involved)
            .await
            .unwrap();
        assert_eq!(involved, ids(&[1, 2, 3]));
    }

    #[tokio::test]
    async fn test_source_failure_reports_phase() {
        let source = source(Vec::new()).with_limits(PageSizeLimits::new(50, 100).unwrap());
        let resolver = RelationshipResolver::new(&source, 10);

        let err = resolver
            .resolve(&CallContext::background(), Identifier::new(1), ResolveMode::Involved)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::Upstream {
                phase: Phase::InvolvedRelationships
            }
        ));
    }
}
