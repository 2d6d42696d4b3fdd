//! Paged scan over the row keys of a column family.
//!
//! Same refetch/overlap scheme as [`PagedCursor`](crate::PagedCursor), over
//! primary keys instead of a row's columns. Two differences: the first page
//! is fetched when the cursor is built, so an empty key space is known
//! immediately, and the range is always ascending with a fixed end.

use crate::cursor::Cursor;
use crate::error::CursorError;
use crate::fetcher::KeyRangeFetcher;
use crate::page::validate_page_size;
use crate::paged::Page;

/// Eager paged scan over row keys in `[start, end]`.
pub struct KeyRangeCursor<F: KeyRangeFetcher> {
    fetcher: F,
    end: Option<F::Key>,
    page_size: usize,
    page: Page<F::Key>,
    /// Last key handed out, the start of the next refetch.
    last_key: Option<F::Key>,
    /// Start of the page currently buffered.
    page_start: Option<F::Key>,
    next_key: Option<F::Key>,
    skip_overlap: bool,
    exhausted: bool,
    fetches: usize,
}

impl<F: KeyRangeFetcher> std::fmt::Debug for KeyRangeCursor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRangeCursor")
            .field("end", &self.end)
            .field("page_size", &self.page_size)
            .field("last_key", &self.last_key)
            .field("next_key", &self.next_key)
            .field("exhausted", &self.exhausted)
            .field("fetches", &self.fetches)
            .finish_non_exhaustive()
    }
}

impl<F: KeyRangeFetcher> KeyRangeCursor<F> {
    /// Builds the cursor and fetches the first page of keys.
    ///
    /// # Errors
    ///
    /// [`CursorError::Configuration`] for a page size below
    /// [`MIN_PAGE_SIZE`](crate::MIN_PAGE_SIZE); otherwise whatever the first
    /// fetch raises.
    pub fn new(
        fetcher: F,
        start: Option<F::Key>,
        end: Option<F::Key>,
        page_size: usize,
    ) -> Result<Self, CursorError> {
        let page_size = validate_page_size(page_size)?;
        let mut cursor = Self {
            fetcher,
            end,
            page_size,
            page: Page::empty(),
            last_key: None,
            page_start: start,
            next_key: None,
            skip_overlap: false,
            exhausted: false,
            fetches: 0,
        };
        cursor.fetch_page()?;
        cursor.advance()?;
        Ok(cursor)
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    fn fetch_page(&mut self) -> Result<(), CursorError> {
        let first = self.fetches == 0;
        self.fetches += 1;

        let batch = match self.fetcher.fetch_keys(
            self.page_start.as_ref(),
            self.end.as_ref(),
            self.page_size,
        ) {
            Ok(batch) => batch,
            Err(err) => {
                tracing::warn!(
                    fetch = self.fetches,
                    start = ?self.page_start,
                    error = %err,
                    "key range fetch failed; cursor exhausted"
                );
                self.exhaust();
                return Err(CursorError::Transport(err));
            }
        };
        let page = match Page::from_batch(batch, self.page_size) {
            Ok(page) => page,
            Err(err) => {
                self.exhaust();
                return Err(err);
            }
        };

        tracing::debug!(
            fetch = self.fetches,
            start = ?self.page_start,
            end = ?self.end,
            limit = self.page_size,
            fetched = page.len(),
            "fetched key page"
        );

        self.page = page;
        // Every continuation, including the first one, restarts at the last
        // key already delivered.
        self.skip_overlap = !first;
        Ok(())
    }

    /// Pulls the next key into `next_key`, refetching as pages run out.
    fn advance(&mut self) -> Result<(), CursorError> {
        while !self.exhausted && self.next_key.is_none() {
            if let Some(key) = self.page.next() {
                if std::mem::take(&mut self.skip_overlap) && self.last_key.as_ref() == Some(&key) {
                    tracing::trace!(key = ?key, "skipping key page overlap");
                    continue;
                }
                self.next_key = Some(key);
            } else if self.page.wants_refetch() {
                self.page_start.clone_from(&self.last_key);
                self.fetch_page()?;
            } else {
                tracing::trace!(fetches = self.fetches, "key range exhausted");
                self.exhausted = true;
            }
        }
        Ok(())
    }

    fn exhaust(&mut self) {
        self.exhausted = true;
        self.page = Page::empty();
        self.next_key = None;
    }
}

impl<F: KeyRangeFetcher> Cursor for KeyRangeCursor<F> {
    type Item = F::Key;

    fn has_more(&mut self) -> Result<bool, CursorError> {
        self.advance()?;
        Ok(self.next_key.is_some())
    }

    fn next_entry(&mut self) -> Result<F::Key, CursorError> {
        self.advance()?;
        let key = self.next_key.take().ok_or(CursorError::Exhausted)?;
        self.last_key = Some(key.clone());
        Ok(key)
    }
}
