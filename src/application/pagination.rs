//! Shared offset pagination helpers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard ceiling on page size; prevents unbounded fetches regardless of the
/// configured default.
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Validated offset/limit pair. Constructed only through [`PageParams::new`]
/// so `limit` is always within `1..=MAX_PAGE_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    offset: u64,
    limit: u32,
}

impl PageParams {
    pub fn new(offset: u64, limit: u32) -> Self {
        Self {
            offset,
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Interpret a page number (not an offset) against a limit, the shape the
    /// read endpoint accepts.
    pub fn from_page(page: u64, limit: u32) -> Self {
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        Self {
            offset: page.saturating_mul(u64::from(limit)),
            limit,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows each source must supply before a global merge can be sliced
    /// correctly: never fewer than `offset + limit`.
    pub fn fetch_window(&self) -> u64 {
        self.offset.saturating_add(u64::from(self.limit))
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_LIMIT)
    }
}

/// One page of results plus the bookkeeping the dashboard client needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u32,
    pub has_more: bool,
}

impl<T> PaginatedResult<T> {
    /// Assemble a page, deriving `has_more` from the invariant
    /// `has_more == offset + limit < total`.
    pub fn new(data: Vec<T>, total: u64, params: PageParams) -> Self {
        debug_assert!(data.len() <= params.limit() as usize);
        Self {
            data,
            total,
            offset: params.offset(),
            limit: params.limit(),
            has_more: params.offset().saturating_add(u64::from(params.limit())) < total,
        }
    }

    pub fn empty(params: PageParams) -> Self {
        Self::new(Vec::new(), 0, params)
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid page parameter `{field}`: {message}")]
    InvalidParameter {
        field: &'static str,
        message: String,
    },
}

impl PaginationError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            message: message.into(),
        }
    }
}
