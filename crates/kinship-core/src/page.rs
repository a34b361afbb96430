//! Page request/response types and page-size limits.

use crate::cursor::{ContinuationToken, CursorCodec};
use crate::filter::{FilterSpec, Record};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One page fetch: filter, requested size and where to resume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub filter: FilterSpec,
    pub page_size: u32,
    /// Empty for the first page
    #[serde(default)]
    pub token: ContinuationToken,
}

impl PageRequest {
    /// Request for the first page.
    pub fn first(filter: FilterSpec, page_size: u32) -> Self {
        Self {
            filter,
            page_size,
            token: ContinuationToken::new(),
        }
    }

    /// The same request resumed at `token`.
    pub fn resume(&self, token: impl Into<ContinuationToken>) -> Self {
        Self {
            filter: self.filter.clone(),
            page_size: self.page_size,
            token: token.into(),
        }
    }
}

/// A page of items in ascending key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Empty when this is the final page
    pub next_token: ContinuationToken,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: impl Into<ContinuationToken>) -> Self {
        Self {
            items,
            next_token: next_token.into(),
        }
    }

    /// A final page.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, ContinuationToken::new())
    }

    pub fn is_last(&self) -> bool {
        self.next_token.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Record> Page<T> {
    /// Build a page from a `page_size + 1` over-fetch.
    ///
    /// When the extra row is present it is dropped and the token names the
    /// last row kept; otherwise this is the final page.
    pub fn from_overfetch(mut rows: Vec<T>, page_size: u32, codec: &CursorCodec) -> Self {
        let page_size = page_size as usize;
        if rows.len() <= page_size {
            return Self::last(rows);
        }
        rows.truncate(page_size);
        let next_token = rows
            .last()
            .map(|last| codec.encode(last.key()))
            .unwrap_or_default();
        Self::new(rows, next_token)
    }
}

/// Errors for page sizes and limit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageSizeError {
    #[error("page size must be at least {min}, got {requested}")]
    BelowMinimum { requested: u32, min: u32 },

    #[error("invalid page size limits: min {min}, max {max}")]
    InvalidLimits { min: u32, max: u32 },
}

/// Page-size bounds enforced by one source.
///
/// Requests below `min` are rejected, requests above `max` are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSizeLimits {
    min: u32,
    max: u32,
}

impl PageSizeLimits {
    pub fn new(min: u32, max: u32) -> Result<Self, PageSizeError> {
        if min == 0 || min > max {
            return Err(PageSizeError::InvalidLimits { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// The size a source will actually serve for `requested`.
    pub fn normalize(&self, requested: u32) -> Result<u32, PageSizeError> {
        if requested < self.min {
            return Err(PageSizeError::BelowMinimum {
                requested,
                min: self.min,
            });
        }
        Ok(requested.min(self.max))
    }
}

impl Default for PageSizeLimits {
    fn default() -> Self {
        Self { min: 1, max: 1000 }
    }
}
