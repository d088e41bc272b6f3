//! Pagination over sorted post lists

use serde::Serialize;

/// Splits a post list into fixed-size pages and names their URLs
pub struct Paginator {
    total: usize,
    per_page: usize,
    pagination_dir: String,
}

/// Pagination state handed to templates
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    /// 1-based current page
    pub current: usize,
    pub total_pages: usize,
    pub per_page: usize,
    /// Path of the newer page, absent on page 1
    pub prev: Option<String>,
    /// Path of the older page, absent on the last page
    pub next: Option<String>,
}

impl Paginator {
    /// A `per_page` of zero is treated as one so slicing always advances.
    pub fn new(total: usize, per_page: usize, pagination_dir: &str) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
            pagination_dir: pagination_dir.trim_matches('/').to_string(),
        }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of pages; an empty list still has one (empty) page
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.per_page).max(1)
    }

    /// Clamp a 1-based page number into the valid range
    pub fn clamp_page(&self, page: usize) -> usize {
        page.clamp(1, self.page_count())
    }

    /// Items belonging to a 1-based page; pages outside the range are
    /// empty, not clamped
    pub fn slice<'a, T>(&self, items: &'a [T], page: usize) -> &'a [T] {
        if page == 0 {
            return &[];
        }
        let start = (page - 1) * self.per_page;
        if start >= items.len() {
            return &[];
        }
        let end = (start + self.per_page).min(items.len());
        &items[start..end]
    }

    /// Site-relative path of a page: `/` for page 1, `/page/3/` beyond
    pub fn page_path(&self, page: usize) -> String {
        let page = self.clamp_page(page);
        if page == 1 {
            "/".to_string()
        } else {
            format!("/{}/{}/", self.pagination_dir, page)
        }
    }

    pub fn context(&self, page: usize) -> PageContext {
        let page = self.clamp_page(page);
        let total_pages = self.page_count();
        PageContext {
            current: page,
            total_pages,
            per_page: self.per_page,
            prev: (page > 1).then(|| self.page_path(page - 1)),
            next: (page < total_pages).then(|| self.page_path(page + 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(Paginator::new(0, 10, "page").page_count(), 1);
        assert_eq!(Paginator::new(10, 10, "page").page_count(), 1);
        assert_eq!(Paginator::new(11, 10, "page").page_count(), 2);
        assert_eq!(Paginator::new(25, 10, "page").page_count(), 3);
    }

    #[test]
    fn test_zero_per_page_clamped() {
        let paginator = Paginator::new(3, 0, "page");
        assert_eq!(paginator.per_page(), 1);
        assert_eq!(paginator.page_count(), 3);
    }

    #[test]
    fn test_slice_windows() {
        let items: Vec<usize> = (0..25).collect();
        let paginator = Paginator::new(items.len(), 10, "page");
        assert_eq!(paginator.slice(&items, 1), &items[0..10]);
        assert_eq!(paginator.slice(&items, 2), &items[10..20]);
        assert_eq!(paginator.slice(&items, 3), &items[20..25]);
        // Out-of-range pages are empty, not clamped
        assert!(paginator.slice(&items, 4).is_empty());
        assert!(paginator.slice(&items, 99).is_empty());
        assert!(paginator.slice(&items, 0).is_empty());
    }

    #[test]
    fn test_page_paths() {
        let paginator = Paginator::new(25, 10, "page");
        assert_eq!(paginator.page_path(1), "/");
        assert_eq!(paginator.page_path(2), "/page/2/");
        assert_eq!(paginator.page_path(3), "/page/3/");
    }

    #[test]
    fn test_context_links() {
        let paginator = Paginator::new(25, 10, "page");
        let first = paginator.context(1);
        assert_eq!(first.prev, None);
        assert_eq!(first.next, Some("/page/2/".to_string()));

        let middle = paginator.context(2);
        assert_eq!(middle.prev, Some("/".to_string()));
        assert_eq!(middle.next, Some("/page/3/".to_string()));

        let last = paginator.context(3);
        assert_eq!(last.prev, Some("/page/2/".to_string()));
        assert_eq!(last.next, None);
    }
}
