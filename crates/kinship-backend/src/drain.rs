//! Draining a paginated source.
//!
//! A drain starts from the empty token and follows `next_token` until a page
//! comes back with an empty one. Pages are fetched strictly one after another.

use futures::stream::{self, Stream, TryStreamExt};
use kinship_core::{FilterSpec, Page, PageRequest};
use tracing::debug;

use crate::context::CallContext;
use crate::error::BackendError;
use crate::traits::PaginatedList;

/// A restartable walk over every page a source holds for one filter.
pub struct PageDrain<'a, T> {
    source: &'a dyn PaginatedList<T>,
    ctx: &'a CallContext,
    filter: FilterSpec,
    page_size: u32,
}

impl<'a, T: Send + 'a> PageDrain<'a, T> {
    pub fn new(
        source: &'a dyn PaginatedList<T>,
        ctx: &'a CallContext,
        filter: FilterSpec,
        page_size: u32,
    ) -> Self {
        Self {
            source,
            ctx,
            filter,
            page_size,
        }
    }

    /// Lazy stream of pages. Each call starts again from the first page.
    ///
    /// The stream ends after the page with an empty token and yields at most
    /// one error, after which it is exhausted.
    pub fn pages(&self) -> impl Stream<Item = Result<Page<T>, BackendError>> + Send + 'a {
        let source = self.source;
        let ctx = self.ctx;
        let first = PageRequest::first(self.filter.clone(), self.page_size);

        stream::try_unfold(Some(first), move |state| async move {
            let Some(request) = state else {
                return Ok::<_, BackendError>(None);
            };

            let page = source.list(ctx, request.clone()).await?;
            debug!(
                "{}: fetched {} items (token '{}' -> '{}')",
                source.source_name(),
                page.len(),
                request.token,
                page.next_token
            );

            if page.is_last() {
                return Ok(Some((page, None)));
            }
            if page.next_token == request.token {
                return Err(BackendError::internal(format!(
                    "{} source returned a continuation token that does not advance",
                    source.source_name()
                )));
            }

            let next = request.resume(page.next_token.clone());
            Ok(Some((page, Some(next))))
        })
    }

    /// Accumulate every item of every page.
    ///
    /// The first error aborts the drain; items from earlier pages are dropped.
    pub async fn collect(self) -> Result<Vec<T>, BackendError> {
        self.pages()
            .try_fold(Vec::new(), |mut items, page| async move {
                items.extend(page.items);
                Ok(items)
            })
            .await
    }
}

/// Drain `source` for `filter`, requesting `page_size` items per page.
pub async fn drain_all<T: Send + 'static>(
    source: &dyn PaginatedList<T>,
    ctx: &CallContext,
    filter: FilterSpec,
    page_size: u32,
) -> Result<Vec<T>, BackendError> {
    PageDrain::new(source, ctx, filter, page_size).collect().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySource;
    use futures::StreamExt;
    use kinship_core::{Entity, Identifier, PageSizeLimits, Predicate};

    fn source(n: i64) -> InMemorySource<Entity> {
        InMemorySource::new((1..=n).map(|id| Entity::new(id, format!("user{}", id))).collect())
    }

    #[tokio::test]
    async fn test_drain_collects_every_page() {
        let source = source(10);
        let ctx = CallContext::background();

        let items = drain_all(&source, &ctx, FilterSpec::all(), 3).await.unwrap();
        let ids: Vec<i64> = items.iter().map(|e| e.id.get()).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_page_stream_is_restartable() {
        let source = source(5);
        let ctx = CallContext::background();
        let drain = PageDrain::new(&source, &ctx, FilterSpec::all(), 2);

        let first: Vec<_> = drain.pages().collect().await;
        let second: Vec<_> = drain.pages().collect().await;
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
        assert!(first.last().unwrap().as_ref().unwrap().is_last());
    }

    #[tokio::test]
    async fn test_drain_respects_filter() {
        let source = source(20);
        let ctx = CallContext::background();
        let filter = FilterSpec::all().and(Predicate::id_in([
            Identifier::new(2),
            Identifier::new(19),
            Identifier::new(40),
        ]));

        let items = drain_all(&source, &ctx, filter, 1).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_drain_propagates_rejected_page_size() {
        let source = source(3).with_limits(PageSizeLimits::new(10, 100).unwrap());
        let ctx = CallContext::background();

        let err = drain_all(&source, &ctx, FilterSpec::all(), 5).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidArgument(_)));
    }
}
