//! Page-number pagination helpers.

#![allow(missing_docs)]

use serde::Serialize;

/// A one-based page request after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// One-based page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
}

impl PageRequest {
    /// Clamp raw caller input: page to at least 1, limit to `1..=max_limit`.
    #[must_use]
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64, max_limit: u64) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));
        Self { page, limit }
    }

    /// Rows to skip before this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u64,
    pub limit: u64,
    /// Total matching rows across all pages.
    pub total: u64,
    /// Number of pages at this limit.
    pub pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    /// Build metadata for `request` given the total row count.
    #[must_use]
    pub const fn new(request: PageRequest, total: u64) -> Self {
        let pages = total.div_ceil(request.limit);
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages,
            has_next: request.page < pages,
            has_prev: request.page > 1,
        }
    }
}

/// A page of items with its metadata.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Position of this page in the full result.
    pub info: PageInfo,
}

impl<T> Paged<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            info: PageInfo::new(request, total),
        }
    }

    /// Convert each item, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            info: self.info,
        }
    }
}
