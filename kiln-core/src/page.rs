//! Fixed-size paging over an in-memory sequence.
//!
//! [`Pager`] slices a pre-loaded, ordered sequence (typically the ids returned by a query)
//! into pages of a fixed size, so large result sets can be processed in bounded chunks.
//!
//! # Example
//!
//! ```ignore
//! use kiln::page::Pager;
//!
//! let ids: Vec<i64> = (0..8).collect();
//! let mut pager = Pager::new(&ids, 3)?;
//!
//! assert_eq!(pager.next_page(), Some(&[0, 1, 2][..]));
//! assert_eq!(pager.next_page(), Some(&[3, 4, 5][..]));
//! assert_eq!(pager.next_page(), Some(&[6, 7][..]));
//! assert_eq!(pager.next_page(), None);
//!
//! pager.reset();
//! assert_eq!(pager.next_page(), Some(&[0, 1, 2][..]));
//! ```

use std::cmp::min;

use crate::error::{StoreError, StoreResult};

/// A cursor handing out consecutive fixed-size pages of a borrowed slice.
///
/// The page size is fixed at construction. The current page only moves forward through
/// [`next_page`](Pager::next_page) or back to zero through [`reset`](Pager::reset); once the
/// source is exhausted every further call returns `None`.
#[derive(Debug, Clone)]
pub struct Pager<'a, T> {
    source: &'a [T],
    page_size: usize,
    page: usize,
}

impl<'a, T> Pager<'a, T> {
    /// Creates a pager over `source`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] if `page_size` is zero.
    pub fn new(source: &'a [T], page_size: usize) -> StoreResult<Self> {
        if page_size < 1 {
            return Err(StoreError::invalid("page size must be a positive number"));
        }

        Ok(Self { source, page_size, page: 0 })
    }

    /// Returns the configured page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the number of pages requested since construction or the last reset.
    pub fn current_page(&self) -> usize {
        self.page
    }

    /// Moves the cursor back to the first page.
    pub fn reset(&mut self) {
        self.page = 0;
    }

    /// Returns the next page, or `None` once the source is exhausted.
    ///
    /// Every call advances the current page, including calls returning `None`.
    pub fn next_page(&mut self) -> Option<&'a [T]> {
        let len = self.source.len();
        let start = self.page.saturating_mul(self.page_size);
        let stop = start.saturating_add(self.page_size);
        self.page += 1;

        // one page holds everything
        if self.page == 1 && self.page_size >= len {
            return Some(self.source);
        }

        if start >= len {
            return None;
        }

        Some(&self.source[start..min(stop, len)])
    }
}

impl<'a, T> Iterator for Pager<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        self.next_page()
    }
}
