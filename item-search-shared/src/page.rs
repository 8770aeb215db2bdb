//! Page requests and result pages.

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not supply a usable one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A zero-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn of(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// Build a request from caller input that may be missing or negative.
    ///
    /// A missing or negative page becomes page 0 and a missing or negative
    /// size becomes [`DEFAULT_PAGE_SIZE`]. A size of 0 is passed through and
    /// rejected later by the query builder.
    pub fn normalized(page: Option<i64>, size: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 0).map(|p| p as usize).unwrap_or(0);
        let size = size
            .filter(|s| *s >= 0)
            .map(|s| s as usize)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self { page, size }
    }

    /// Index of the first element of this page in the full result set.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::of(0, DEFAULT_PAGE_SIZE)
    }
}

/// One page of a result set.
///
/// The content is materialized, so iterating twice yields the same elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    request: PageRequest,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            request,
            total_elements,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.content.iter()
    }

    /// Zero-based page index.
    pub fn number(&self) -> usize {
        self.request.page
    }

    pub fn size(&self) -> usize {
        self.request.size
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// `ceil(total_elements / size)`, or 0 when there is nothing to page.
    pub fn total_pages(&self) -> u64 {
        let size = self.request.size as u64;
        if size == 0 || self.total_elements == 0 {
            return 0;
        }
        self.total_elements.div_ceil(size)
    }

    pub fn has_next(&self) -> bool {
        (self.request.page as u64 + 1) < self.total_pages()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            request: self.request,
            total_elements: self.total_elements,
        }
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_defaults() {
        assert_eq!(PageRequest::normalized(None, None), PageRequest::of(0, 10));
        assert_eq!(PageRequest::normalized(Some(-1), Some(-5)), PageRequest::of(0, 10));
        assert_eq!(PageRequest::normalized(Some(2), Some(100)), PageRequest::of(2, 100));
        assert_eq!(PageRequest::normalized(Some(0), Some(0)), PageRequest::of(0, 0));
    }

    #[test]
    fn test_total_pages() {
        let page: Page<u32> = Page::new(vec![], PageRequest::of(0, 100), 995);
        assert_eq!(page.total_pages(), 10);

        let page: Page<u32> = Page::new(vec![], PageRequest::of(0, 100), 1000);
        assert_eq!(page.total_pages(), 10);

        let page: Page<u32> = Page::empty(PageRequest::of(0, 100));
        assert_eq!(page.total_pages(), 0);
        assert!(!page.has_next());
    }

    #[test]
    fn test_has_next() {
        let first: Page<u32> = Page::new(vec![1, 2, 3], PageRequest::of(0, 3), 5);
        let last: Page<u32> = Page::new(vec![4, 5], PageRequest::of(1, 3), 5);

        assert!(first.has_next());
        assert!(!last.has_next());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let page = Page::new(vec!["a", "b"], PageRequest::of(0, 2), 2);

        let first: Vec<_> = page.iter().collect();
        let second: Vec<_> = (&page).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![&"a", &"b"]);
    }

    #[test]
    fn test_offset_and_map() {
        assert_eq!(PageRequest::of(3, 20).offset(), 60);

        let page = Page::new(vec![1, 2], PageRequest::of(1, 2), 4).map(|n| n * 10);
        assert_eq!(page.content(), &[10, 20]);
        assert_eq!(page.number(), 1);
        assert_eq!(page.total_elements(), 4);
    }
}
