//! In-memory paginated source.

use async_trait::async_trait;
use kinship_core::{Cursor, CursorCodec, Page, PageRequest, PageSizeLimits, Record};

use crate::context::CallContext;
use crate::error::BackendError;
use crate::traits::PaginatedList;

/// A source over a fixed vector of records.
///
/// Follows the same contract as the SQLite sources: page sizes are checked
/// against the configured limits, tokens carry the configured prefix, and
/// every predicate must be supported by the record kind.
#[derive(Debug, Clone)]
pub struct InMemorySource<T> {
    records: Vec<T>,
    limits: PageSizeLimits,
    codec: CursorCodec,
}

impl<T: Record> InMemorySource<T> {
    /// Create a source; records are sorted by key.
    pub fn new(mut records: Vec<T>) -> Self {
        records.sort_by_key(|record| record.key());
        Self {
            records,
            limits: PageSizeLimits::default(),
            codec: CursorCodec::plain(),
        }
    }

    pub fn with_limits(mut self, limits: PageSizeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_codec(mut self, codec: CursorCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Serve one page synchronously.
    pub fn page(&self, request: &PageRequest) -> Result<Page<T>, BackendError> {
        let page_size = self.limits.normalize(request.page_size)?;
        let cursor = self.codec.decode(&request.token)?;
        let predicates = request.filter.predicates();
        for predicate in predicates {
            T::check(predicate)?;
        }

        let mut rows = Vec::with_capacity(page_size as usize + 1);
        for record in &self.records {
            if let Cursor::After(last_seen) = cursor {
                if record.key() <= last_seen {
                    continue;
                }
            }
            if predicates.iter().all(|p| record.matches(p)) {
                rows.push(record.clone());
                if rows.len() > page_size as usize {
                    break;
                }
            }
        }

        Ok(Page::from_overfetch(rows, page_size, &self.codec))
    }
}

#[async_trait]
impl<T: Record> PaginatedList<T> for InMemorySource<T> {
    async fn list(&self, ctx: &CallContext, request: PageRequest) -> Result<Page<T>, BackendError> {
        ctx.check()?;
        self.page(&request)
    }

    fn source_name(&self) -> &str {
        T::SOURCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinship_core::{
        Field, FilterSpec, Identifier, Predicate, RelationshipRecord, RelationshipStatus,
    };
    use pretty_assertions::assert_eq;

    fn relationships() -> InMemorySource<RelationshipRecord> {
        InMemorySource::new(vec![
            RelationshipRecord::new(3, "1", "4", RelationshipStatus::Accepted),
            RelationshipRecord::new(1, "1", "2", RelationshipStatus::Accepted),
            RelationshipRecord::new(2, "5", "1", RelationshipStatus::Pending),
        ])
    }

    #[test]
    fn test_records_are_sorted() {
        let ids: Vec<i64> = relationships().records().iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_filtered_page() {
        let source = relationships();
        let filter = FilterSpec::all()
            .and(Predicate::sender_is(Identifier::new(1)))
            .and(Predicate::status_is(RelationshipStatus::Accepted));

        let page = source.page(&PageRequest::first(filter, 10)).unwrap();
        let ids: Vec<i64> = page.items.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(page.is_last());
    }

    #[test]
    fn test_seek_after_token() {
        let source = relationships().with_codec(CursorCodec::new("rel:"));
        let first = source.page(&PageRequest::first(FilterSpec::all(), 1)).unwrap();
        assert_eq!(first.next_token, "rel:1");

        let second = source
            .page(&PageRequest::first(FilterSpec::all(), 1).resume(first.next_token))
            .unwrap();
        assert_eq!(second.items[0].id, Identifier::new(2));
    }

    #[test]
    fn test_rejects_foreign_token_and_predicate() {
        let source = relationships();

        let err = source
            .page(&PageRequest::first(FilterSpec::all(), 1).resume("id:1"))
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidArgument(_)));

        let filter = FilterSpec::all().and(Predicate::text_equals(Field::UserName, "x"));
        let err = source.page(&PageRequest::first(filter, 5)).unwrap_err();
        assert!(matches!(err, BackendError::InvalidArgument(_)));
    }

    #[test]
    fn test_list_honours_cancelled_context() {
        let source = relationships();
        let (ctx, handle) = CallContext::cancellable();
        handle.cancel();

        let result = tokio_test::block_on(source.list(&ctx, PageRequest::first(FilterSpec::all(), 5)));
        assert!(matches!(result, Err(BackendError::Cancelled)));
    }
}
