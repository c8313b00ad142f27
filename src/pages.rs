//! Load-more pagination for indexer lists.

/// A list filled one indexer page at a time.
///
/// `next_request` hands out the page to fetch (at most one in flight);
/// a page shorter than `per_page` means the list is complete.
#[derive(Debug, Clone)]
pub struct PagedList<T> {
    items: Vec<T>,
    per_page: u32,
    next_page: u32,
    loading: bool,
    no_more: bool,
}

impl<T> PagedList<T> {
    pub fn new(per_page: u32) -> Self {
        Self {
            items: Vec::new(),
            per_page: per_page.max(1),
            next_page: 1,
            loading: false,
            no_more: false,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn no_more(&self) -> bool {
        self.no_more
    }

    /// Page number to fetch next, or `None` when loading or exhausted.
    pub fn next_request(&mut self) -> Option<u32> {
        if self.loading || self.no_more {
            return None;
        }
        self.loading = true;
        Some(self.next_page)
    }

    pub fn on_page(&mut self, page: Vec<T>) {
        if page.len() < self.per_page as usize {
            self.no_more = true;
        }
        self.items.extend(page);
        self.next_page += 1;
        self.loading = false;
    }

    /// The in-flight page failed; it may be requested again.
    pub fn on_failed(&mut self) {
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_accumulate_until_short_page() {
        let mut l = PagedList::new(3);
        assert_eq!(l.next_request(), Some(1));
        assert_eq!(l.next_request(), None, "one page in flight at a time");
        l.on_page(vec![1, 2, 3]);
        assert!(!l.no_more());

        assert_eq!(l.next_request(), Some(2));
        l.on_page(vec![4]);
        assert!(l.no_more());
        assert_eq!(l.items(), &[1, 2, 3, 4]);
        assert_eq!(l.next_request(), None);
    }

    #[test]
    fn failed_page_can_be_retried() {
        let mut l: PagedList<u8> = PagedList::new(6);
        assert_eq!(l.next_request(), Some(1));
        l.on_failed();
        assert_eq!(l.next_request(), Some(1));
    }

    #[test]
    fn empty_first_page_is_final() {
        let mut l: PagedList<u8> = PagedList::new(6);
        l.next_request();
        l.on_page(Vec::new());
        assert!(l.no_more());
        assert!(l.items().is_empty());
    }
}
