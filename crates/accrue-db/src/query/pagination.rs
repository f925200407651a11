//! Page-windowed results.

use serde::Serialize;

/// One page of results plus the total-count metadata needed to render
/// navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthAwarePage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    /// Request parameter the page number was read from.
    pub page_name: String,
}

impl<T> LengthAwarePage<T> {
    /// Last page number; `1` for an empty result.
    pub fn last_page(&self) -> u64 {
        self.total.div_ceil(self.per_page.max(1)).max(1)
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page()
    }

    /// 1-based position of the first item on this page.
    pub fn from(&self) -> Option<u64> {
        (!self.items.is_empty()).then(|| self.offset() + 1)
    }

    /// 1-based position of the last item on this page.
    pub fn to(&self) -> Option<u64> {
        (!self.items.is_empty()).then(|| self.offset() + self.items.len() as u64)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> LengthAwarePage<U> {
        LengthAwarePage {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
            page_name: self.page_name,
        }
    }

    fn offset(&self) -> u64 {
        (self.current_page.saturating_sub(1)).saturating_mul(self.per_page)
    }
}
