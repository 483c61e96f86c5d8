//! Pagination utilities for the tag listing

/// Page size used when the client does not ask for one
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page size served; larger requests are clamped
pub const MAX_PAGE_SIZE: i64 = 100;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    pub page_size: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Number of items skipped before this page
    pub offset: i64,
}

impl Pagination {
    /// Slice `items` down to this page
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let page_size = usize::try_from(self.page_size).unwrap_or(0);
        items.into_iter().skip(offset).take(page_size).collect()
    }
}

/// Calculate pagination metadata from total results and requested page
///
/// Pages below 1 are treated as page 1. Pages past the end are kept as
/// requested and simply yield no items. `page_size` must already be
/// validated to `1..=MAX_PAGE_SIZE`.
///
/// # Examples
/// ```
/// use tagsense_reader::pagination::calculate_pagination;
///
/// // 120 tags in pages of 50 = 3 pages (50 + 50 + 20)
/// let p = calculate_pagination(120, 2, 50);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 50);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64, page_size: i64) -> Pagination {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let total_pages = (total_results + page_size - 1) / page_size;
    let page = requested_page.max(1);
    // Saturates for absurd page numbers; such pages are simply empty
    let offset = (page - 1).saturating_mul(page_size);

    Pagination {
        page,
        page_size,
        total_pages,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(120, 2, 50);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 50);
    }

    #[test]
    fn test_pagination_page_below_one() {
        let p = calculate_pagination(120, 0, 50);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);

        let p = calculate_pagination(120, -4, 50);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn test_pagination_past_end_is_empty() {
        let p = calculate_pagination(10, 5, 50);
        assert_eq!(p.page, 5);
        assert_eq!(p.total_pages, 1);
        assert!(p.apply((0..10).collect::<Vec<_>>()).is_empty());
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 1, 50);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_exact_page_boundary() {
        let p = calculate_pagination(100, 2, 50);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.apply((0..100).collect::<Vec<_>>()), (50..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_pagination_huge_page_does_not_overflow() {
        let p = calculate_pagination(120, i64::MAX, 50);
        assert_eq!(p.page, i64::MAX);
        assert_eq!(p.offset, i64::MAX);
        assert!(p.apply((0..120).collect::<Vec<_>>()).is_empty());
    }

    #[test]
    fn test_pagination_clamps_page_size() {
        let p = calculate_pagination(500, 1, 1000);
        assert_eq!(p.page_size, MAX_PAGE_SIZE);
        assert_eq!(p.total_pages, 5);
    }
}
