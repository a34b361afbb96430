//! The paginated list capability.

use std::sync::Arc;

use async_trait::async_trait;
use kinship_core::{Page, PageRequest};

use crate::context::CallContext;
use crate::error::BackendError;

/// One upstream source of records, listed a page at a time.
///
/// Implementations normalise the page size against their own limits, decode
/// the token they issued earlier, apply the filter as a conjunction and
/// return items in ascending id order. `next_token` is empty on the final
/// page. Implementations must tolerate concurrent calls.
#[async_trait]
pub trait PaginatedList<T>: Send + Sync {
    /// Fetch one page.
    async fn list(&self, ctx: &CallContext, request: PageRequest) -> Result<Page<T>, BackendError>;

    /// Short name used in logs.
    fn source_name(&self) -> &str;
}

#[async_trait]
impl<T, L> PaginatedList<T> for Arc<L>
where
    T: Send + 'static,
    L: PaginatedList<T> + ?Sized,
{
    async fn list(&self, ctx: &CallContext, request: PageRequest) -> Result<Page<T>, BackendError> {
        (**self).list(ctx, request).await
    }

    fn source_name(&self) -> &str {
        (**self).source_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinship_core::{Entity, RelationshipRecord};

    // Both record kinds must be usable behind a trait object
    fn _assert_object_safe(_: &dyn PaginatedList<Entity>, _: &dyn PaginatedList<RelationshipRecord>) {}
}
