// Pagination - Shared "fetch one extra row" paging for every listing
// Callers query `limit()` rows at `offset()` and hand the rows to `split_page`

use serde::Serialize;

/// Page size used by every listing endpoint
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Page size of the first feed page shown to anonymous visitors
pub const PREVIEW_PAGE_SIZE: i64 = 20;

/// Forward-only pagination signal returned with every listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    pub current_page: i64,
    pub has_next: bool,
}

/// A bounded slice of a collection plus its pagination signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

impl<T> Page<T> {
    /// Relabel an anonymous preview page as the last default-sized page it
    /// covers, so that `current_page + 1` continues the feed without
    /// repeating rows
    pub fn into_preview(mut self) -> Self {
        self.pagination.current_page = PREVIEW_PAGE_SIZE / DEFAULT_PAGE_SIZE;
        self
    }
}

/// Requested page number and page size, already coerced into a valid range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    per_page: i64,
}

impl PageRequest {
    /// Build a request, coercing non-positive page numbers to 1
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Parse a raw `page` query value. Missing, non-numeric and non-positive
    /// values all mean the first page.
    pub fn parse(raw: Option<&str>, per_page: i64) -> Self {
        let page = raw
            .and_then(|value| value.trim().parse::<i64>().ok())
            .unwrap_or(1);
        Self::new(page, per_page)
    }

    pub fn first(per_page: i64) -> Self {
        Self::new(1, per_page)
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Rows to fetch: one more than the page size, so the extra row tells us
    /// whether another page exists without a COUNT query
    pub fn limit(&self) -> i64 {
        self.per_page.saturating_add(1)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// Turn the `limit()` rows fetched for `request` into a page
pub fn split_page<T>(mut rows: Vec<T>, request: &PageRequest) -> Page<T> {
    let per_page = usize::try_from(request.per_page()).unwrap_or(usize::MAX);
    let has_next = rows.len() > per_page;
    rows.truncate(per_page);

    Page {
        items: rows,
        pagination: PaginationInfo {
            current_page: request.page(),
            has_next,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emulates `LIMIT limit OFFSET offset` over a collection of `total` rows
    fn fetch(total: i64, request: &PageRequest) -> Vec<i64> {
        (0..total)
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect()
    }

    #[test]
    fn test_parse_coerces_bad_input_to_first_page() {
        assert_eq!(PageRequest::parse(None, 10).page(), 1);
        assert_eq!(PageRequest::parse(Some("abc"), 10).page(), 1);
        assert_eq!(PageRequest::parse(Some("0"), 10).page(), 1);
        assert_eq!(PageRequest::parse(Some("-3"), 10).page(), 1);
        assert_eq!(PageRequest::parse(Some("1.5"), 10).page(), 1);
        assert_eq!(PageRequest::parse(Some(" 3 "), 10).page(), 3);
    }

    #[test]
    fn test_offset_and_limit() {
        let request = PageRequest::new(3, 10);
        assert_eq!(request.offset(), 20);
        assert_eq!(request.limit(), 11);

        let huge = PageRequest::new(i64::MAX, 10);
        assert_eq!(huge.offset(), i64::MAX);
    }

    #[test]
    fn test_empty_collection() {
        let request = PageRequest::first(10);
        let page = split_page(fetch(0, &request), &request);
        assert!(page.items.is_empty());
        assert!(!page.pagination.has_next);
        assert_eq!(page.pagination.current_page, 1);
    }

    #[test]
    fn test_page_sizes_and_has_next_across_boundaries() {
        for per_page in [1_i64, 3, 10, 20] {
            for total in [0_i64, 1, per_page - 1, per_page, per_page + 1, 2 * per_page, 2 * per_page + 1, 35] {
                for page in 1..=5_i64 {
                    let request = PageRequest::new(page, per_page);
                    let result = split_page(fetch(total, &request), &request);

                    let expected_len = per_page.min((total - (page - 1) * per_page).max(0));
                    assert_eq!(
                        result.items.len() as i64,
                        expected_len,
                        "per_page={per_page} total={total} page={page}"
                    );
                    assert_eq!(
                        result.pagination.has_next,
                        total > page * per_page,
                        "per_page={per_page} total={total} page={page}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let request = PageRequest::new(9, 10);
        let page = split_page(fetch(15, &request), &request);
        assert!(page.items.is_empty());
        assert!(!page.pagination.has_next);
        assert_eq!(page.pagination.current_page, 9);
    }

    #[test]
    fn test_preview_continues_at_the_next_default_page() {
        let preview_request = PageRequest::first(PREVIEW_PAGE_SIZE);
        let preview = split_page(fetch(35, &preview_request), &preview_request).into_preview();
        assert_eq!(preview.items.len(), 20);
        assert!(preview.pagination.has_next);

        let next = PageRequest::new(preview.pagination.current_page + 1, DEFAULT_PAGE_SIZE);
        let rest = split_page(fetch(35, &next), &next);
        assert_eq!(rest.items.first(), Some(&20));
        assert!(rest.items.iter().all(|row| !preview.items.contains(row)));
    }
}
