//! This module defines the common functionality for paging data.

use serde::{Deserialize, Serialize};

/// The number of rows returned by a listing when the request does not
/// specify a limit.
pub const DEFAULT_PAGE_LIMIT: u64 = 10;

/// The `limit`/`offset` query parameters accepted by listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageQuery {
    /// The maximum number of rows to return.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// The number of rows to skip from the start of the result set.
    #[serde(default)]
    pub offset: u64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_LIMIT
}

/// The pagination block included alongside a page of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// The limit the page was produced with.
    pub limit: u64,
    /// The offset the page was produced with.
    pub offset: u64,
    /// The total number of rows in the (unsliced) result set.
    pub total: u64,
}

/// A page of rows and the pagination block describing it, serialized as
/// `{"data": [...], "pagination": {...}}`.
#[derive(Debug, PartialEq, Serialize)]
pub struct Paginated<T> {
    /// The rows on this page.
    pub data: Vec<T>,
    /// Where this page sits in the full result set.
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    /// Wrap a page of rows produced by `query` over a result set of `total`
    /// rows.
    pub fn new(data: Vec<T>, query: PageQuery, total: u64) -> Self {
        Self {
            data,
            pagination: Pagination {
                limit: query.limit,
                offset: query.offset,
                total,
            },
        }
    }
}
