//! Port interfaces for paged vendor order listings

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orderbridge_domain::constants::DEFAULT_PAGE_SIZE;
use orderbridge_domain::Result;

use crate::mapping::Platform;

/// Position of the next page to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageCursor {
    Offset { offset: i64, limit: i64 },
    /// 1-based page number.
    Page { page: i64, per_page: i64 },
}

/// Paging metadata reported by the vendor alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageInfo {
    Offset { offset: i64, limit: i64, total: i64 },
    PageNumber { page: i64, per_page: i64, total_pages: i64 },
}

impl PageInfo {
    /// Cursor for the following page, or `None` when this was the last one.
    ///
    /// A non-positive page size is replaced by the default so a misbehaving
    /// vendor cannot stall the run on the same offset.
    #[must_use]
    pub fn next_cursor(&self) -> Option<PageCursor> {
        match *self {
            Self::Offset { offset, limit, total } => {
                let limit = effective_page_size(limit);
                let next = offset.saturating_add(limit);
                (next < total).then_some(PageCursor::Offset { offset: next, limit })
            }
            Self::PageNumber { page, per_page, total_pages } => (page < total_pages)
                .then_some(PageCursor::Page {
                    page: page + 1,
                    per_page: effective_page_size(per_page),
                }),
        }
    }
}

/// `size` if positive, otherwise the default page size.
#[must_use]
pub const fn effective_page_size(size: i64) -> i64 {
    if size > 0 {
        size
    } else {
        DEFAULT_PAGE_SIZE
    }
}

/// Caller-supplied filters for a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncParams {
    pub page_size: i64,
    pub updated_since: Option<DateTime<Utc>>,
}

impl Default for SyncParams {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, updated_since: None }
    }
}

/// One page of raw vendor orders, each kept as the exact bytes received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPage {
    pub orders: Vec<Vec<u8>>,
    pub info: PageInfo,
}

/// A vendor order listing API bound to one integration.
#[async_trait]
pub trait OrderSource: Send + Sync {
    fn platform(&self) -> Platform;

    /// Bearer token (or equivalent credential) for page requests.
    /// `force_refresh` bypasses any cached value.
    async fn access_token(&self, force_refresh: bool) -> Result<String>;

    /// Cursor of the first page. Offset-based unless overridden.
    fn first_cursor(&self, page_size: i64) -> PageCursor {
        PageCursor::Offset { offset: 0, limit: effective_page_size(page_size) }
    }

    /// # Errors
    /// `OrderBridgeError::TokenExpired` when the vendor rejects `token`; the
    /// sync engine refreshes once and refetches the same cursor.
    async fn fetch_page(
        &self,
        token: &str,
        cursor: &PageCursor,
        params: &SyncParams,
    ) -> Result<OrderPage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_paging_stops_once_total_is_covered() {
        let first = PageInfo::Offset { offset: 0, limit: 50, total: 120 };
        assert_eq!(first.next_cursor(), Some(PageCursor::Offset { offset: 50, limit: 50 }));

        let second = PageInfo::Offset { offset: 50, limit: 50, total: 120 };
        assert_eq!(second.next_cursor(), Some(PageCursor::Offset { offset: 100, limit: 50 }));

        let last = PageInfo::Offset { offset: 100, limit: 50, total: 120 };
        assert_eq!(last.next_cursor(), None);

        let exact = PageInfo::Offset { offset: 50, limit: 50, total: 100 };
        assert_eq!(exact.next_cursor(), None);
    }

    #[test]
    fn page_number_paging_stops_at_total_pages() {
        let info = PageInfo::PageNumber { page: 2, per_page: 20, total_pages: 3 };
        assert_eq!(info.next_cursor(), Some(PageCursor::Page { page: 3, per_page: 20 }));

        let last = PageInfo::PageNumber { page: 3, per_page: 20, total_pages: 3 };
        assert_eq!(last.next_cursor(), None);

        let empty = PageInfo::PageNumber { page: 1, per_page: 20, total_pages: 0 };
        assert_eq!(empty.next_cursor(), None);
    }

    #[test]
    fn non_positive_page_size_falls_back_to_default() {
        let info = PageInfo::Offset { offset: 0, limit: 0, total: 500 };
        assert_eq!(
            info.next_cursor(),
            Some(PageCursor::Offset { offset: DEFAULT_PAGE_SIZE, limit: DEFAULT_PAGE_SIZE })
        );
        assert_eq!(effective_page_size(-3), DEFAULT_PAGE_SIZE);
    }
}
