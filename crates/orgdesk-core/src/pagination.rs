//! Pagination types for list operations.

use crate::{Sort, SortColumn};
use serde::{Deserialize, Serialize};

/// Raw list query parameters as received from the client.
///
/// Every value is kept as text so that malformed input falls back to a
/// default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
}

/// Page size defaults and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingPolicy {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for PagingPolicy {
    fn default() -> Self {
        Self {
            default_size: PageRequest::DEFAULT_SIZE,
            max_size: PageRequest::MAX_SIZE,
        }
    }
}

/// A request for a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// The page number (1-indexed).
    pub page: u64,
    /// The number of items per page.
    pub per_page: u64,
}

impl PageRequest {
    /// The default page size.
    pub const DEFAULT_SIZE: u64 = 10;
    /// The maximum allowed page size.
    pub const MAX_SIZE: u64 = 100;

    /// Creates a new page request, clamped to at least page 1 and one item.
    #[must_use]
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Builds a page request from raw parameters, using the policy for
    /// missing, malformed, or out-of-range sizes.
    #[must_use]
    pub fn from_params(params: &ListParams, policy: PagingPolicy) -> Self {
        let per_page = parse_positive(params.per_page.as_deref())
            .unwrap_or(policy.default_size)
            .min(policy.max_size);
        let page = parse_positive(params.page.as_deref()).unwrap_or(1);
        Self::new(page, per_page)
    }

    /// Returns the offset for database queries, saturating for absurd page
    /// numbers so they simply land past the last row.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_SIZE)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).filter(|v| *v > 0)
}

/// A page of results in the shape list endpoints return.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub current_page: u64,
    pub data: Vec<T>,
    pub per_page: u64,
    pub total: u64,
    pub last_page: u64,
    /// 1-based position of the first item, absent on an empty page.
    pub from: Option<u64>,
    /// 1-based position of the last item, absent on an empty page.
    pub to: Option<u64>,
}

impl<T> Page<T> {
    /// Creates a new page.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        let last_page = total.div_ceil(request.per_page).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = request.offset().saturating_add(1);
            (Some(from), Some(from.saturating_add(data.len() as u64 - 1)))
        };

        Self {
            current_page: request.page,
            data,
            per_page: request.per_page,
            total,
            last_page,
            from,
            to,
        }
    }

    /// Creates an empty page.
    #[must_use]
    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Maps the page content to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            current_page: self.current_page,
            data: self.data.into_iter().map(f).collect(),
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
        }
    }

    /// Replaces the content, keeping the page metadata. `data` is expected
    /// to hold one item per original item, in order.
    #[must_use]
    pub fn with_data<U>(self, data: Vec<U>) -> Page<U> {
        Page {
            current_page: self.current_page,
            data,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
        }
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A fully parsed list query: page, allow-listed sort, and optional search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery<S> {
    pub page: PageRequest,
    pub sort: Sort<S>,
    /// Trimmed, never empty.
    pub search: Option<String>,
}

impl<S: SortColumn> ListQuery<S> {
    /// Parses raw parameters, never failing: every malformed value falls
    /// back to its default.
    #[must_use]
    pub fn from_params(params: &ListParams, policy: PagingPolicy) -> Self {
        Self {
            page: PageRequest::from_params(params, policy),
            sort: Sort::from_params(params.sort_by.as_deref(), params.sort_order.as_deref()),
            search: params
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    /// Drops the search term, for resources that do not support one.
    #[must_use]
    pub fn without_search(mut self) -> Self {
        self.search = None;
        self
    }
}

impl<S: SortColumn> Default for ListQuery<S> {
    fn default() -> Self {
        Self::from_params(&ListParams::default(), PagingPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SortDirection, UserSort};

    fn params(per_page: Option<&str>, page: Option<&str>) -> ListParams {
        ListParams {
            per_page: per_page.map(str::to_string),
            page: page.map(str::to_string),
            ..ListParams::default()
        }
    }

    #[test]
    fn test_page_request_defaults() {
        let req = PageRequest::from_params(&ListParams::default(), PagingPolicy::default());
        assert_eq!(req, PageRequest { page: 1, per_page: 10 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_page_request_offset() {
        let req = PageRequest::from_params(&params(Some("15"), Some("3")), PagingPolicy::default());
        assert_eq!(req.offset(), 30);
        assert_eq!(req.limit(), 15);
    }

    #[test]
    fn test_page_request_caps_size() {
        let req = PageRequest::from_params(&params(Some("5000"), None), PagingPolicy::default());
        assert_eq!(req.per_page, PageRequest::MAX_SIZE);
    }

    #[test]
    fn test_page_request_ignores_garbage() {
        let req = PageRequest::from_params(&params(Some("lots"), Some("-2")), PagingPolicy::default());
        assert_eq!(req, PageRequest::default());
        let req = PageRequest::from_params(&params(Some("0"), Some("0")), PagingPolicy::default());
        assert_eq!(req, PageRequest::default());
    }

    #[test]
    fn test_huge_page_number_does_not_overflow() {
        let req = PageRequest::from_params(&params(Some("10"), Some("18446744073709551615")), PagingPolicy::default());
        assert_eq!(req.page, u64::MAX);
        assert_eq!(req.offset(), u64::MAX);

        let page: Page<u8> = Page::empty(req);
        assert_eq!(page.current_page, u64::MAX);
        assert_eq!(page.from, None);

        let page = Page::new(vec![1u8], req, 3);
        assert_eq!(page.from, Some(u64::MAX));
        assert_eq!(page.to, Some(u64::MAX));
    }

    #[test]
    fn test_page_shape() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(2, 3), 8);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.from, Some(4));
        assert_eq!(page.to, Some(6));
    }

    #[test]
    fn test_empty_page() {
        let page: Page<u8> = Page::empty(PageRequest::default());
        assert_eq!(page.last_page, 1);
        assert_eq!(page.from, None);
        assert!(page.is_empty());
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2], PageRequest::default(), 2).map(|n| n * 10);
        assert_eq!(page.data, vec![10, 20]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_list_query_search_trimmed() {
        let params = ListParams {
            search: Some("  ada ".to_string()),
            sort_by: Some("u_name".to_string()),
            sort_order: Some("DESC".to_string()),
            ..ListParams::default()
        };
        let query: ListQuery<UserSort> = ListQuery::from_params(&params, PagingPolicy::default());
        assert_eq!(query.search.as_deref(), Some("ada"));
        assert_eq!(query.sort.column, UserSort::Name);
        assert_eq!(query.sort.direction, SortDirection::Desc);
        assert_eq!(query.without_search().search, None);
    }

    #[test]
    fn test_list_query_blank_search_ignored() {
        let params = ListParams {
            search: Some("   ".to_string()),
            ..ListParams::default()
        };
        let query: ListQuery<UserSort> = ListQuery::from_params(&params, PagingPolicy::default());
        assert_eq!(query.search, None);
    }
}
