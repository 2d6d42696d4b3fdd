//! Paginated slice scan over a [`RangeFetcher`].
//!
//! [`PagedCursor`] stitches successive bounded fetches into one logical
//! forward scan. Slice queries are inclusive of their start bound, so every
//! refetch starts at the last key already delivered and the first entry of
//! the new page is the previous page's last one. The cursor drops that
//! overlap once per refetch.
//!
//! A page is *full* when the store returned exactly `page_size` entries
//! (overlap included); only a full page can be followed by more data. At
//! most one page is buffered at any time.

use std::vec;

use crate::bound::Finish;
use crate::cursor::Cursor;
use crate::error::CursorError;
use crate::fetcher::{Batch, RangeEntry, RangeFetcher};
use crate::page::PageSpec;

type KeyOf<F> = <<F as RangeFetcher>::Entry as RangeEntry>::Key;

/// Entries are delivered per batch; this tracks what is left of one.
pub(crate) struct Page<E> {
    entries: vec::IntoIter<E>,
    full: bool,
}

impl<E> Page<E> {
    pub(crate) fn empty() -> Self {
        Self {
            entries: Vec::new().into_iter(),
            full: false,
        }
    }

    /// Wraps a fetched batch, rejecting batches longer than requested.
    pub(crate) fn from_batch(batch: Batch<E>, limit: usize) -> Result<Self, CursorError> {
        let entries = batch.unwrap_or_default();
        if entries.len() > limit {
            return Err(CursorError::invariant(format!(
                "fetch returned {} entries for a limit of {limit}",
                entries.len()
            )));
        }
        Ok(Self {
            full: entries.len() == limit,
            entries: entries.into_iter(),
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn next(&mut self) -> Option<E> {
        self.entries.next()
    }

    /// Fully consumed and full: more entries may exist past it.
    pub(crate) fn wants_refetch(&self) -> bool {
        self.full && self.entries.as_slice().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing fetched yet.
    Pending,
    /// A page is buffered.
    Active,
    /// Terminal. No further fetches are issued.
    Exhausted,
}

/// Lazy paged scan over one row's ordered entries.
///
/// No fetch happens at construction; the first `has_more()` issues it.
/// The finish bound is evaluated before every fetch, so a
/// [`DynamicBound`](crate::DynamicBound) moves the window as the scan
/// proceeds. If such a bound never stops producing new entries the cursor
/// never ends; stopping is then up to the caller.
///
/// ```
/// use widerow_core::{fetch_fn, Cursor, PageSpec, PagedCursor, ScanRange};
///
/// let row: Vec<(String, i64)> = (0..23).map(|i| (format!("a{i:03}"), i)).collect();
/// let fetcher = fetch_fn::<_, (String, i64)>(move |start, finish, _reversed, limit| {
///     Ok(Some(
///         row.iter()
///             .filter(|(k, _)| start.map_or(true, |s| k >= s))
///             .filter(|(k, _)| finish.map_or(true, |f| k <= f))
///             .take(limit)
///             .cloned()
///             .collect(),
///     ))
/// });
///
/// let mut cursor = PagedCursor::new(fetcher, PageSpec::new(ScanRange::all(), 10_usize)).unwrap();
/// let mut names = Vec::new();
/// while cursor.has_more().unwrap() {
///     names.push(cursor.next_entry().unwrap().0);
/// }
/// assert_eq!(names.len(), 23);
/// assert_eq!(cursor.fetch_count(), 3);
/// ```
pub struct PagedCursor<F: RangeFetcher> {
    fetcher: F,
    /// Initial start, then the key of the last delivered entry.
    start: Option<KeyOf<F>>,
    finish: Finish<KeyOf<F>>,
    reversed: bool,
    page_size: usize,
    page: Page<F::Entry>,
    /// Entry already pulled from the page and ready for `next_entry()`.
    ready: Option<F::Entry>,
    /// Drop the first entry of the current page if it equals `start`.
    skip_overlap: bool,
    state: State,
    fetches: usize,
    delivered: usize,
}

impl<F: RangeFetcher> PagedCursor<F> {
    /// Creates a cursor primed with `spec`. Performs no fetch.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Configuration`] if `spec.page_size` is below
    /// [`MIN_PAGE_SIZE`](crate::MIN_PAGE_SIZE).
    pub fn new(fetcher: F, spec: PageSpec<KeyOf<F>>) -> Result<Self, CursorError> {
        let page_size = spec.validate()?;
        Ok(Self {
            fetcher,
            start: spec.range.start,
            finish: spec.range.finish,
            reversed: spec.range.reversed,
            page_size,
            page: Page::empty(),
            ready: None,
            skip_overlap: false,
            state: State::Pending,
            fetches: 0,
            delivered: 0,
        })
    }

    /// Number of fetches issued so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Number of entries handed out so far.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Key of the last delivered entry (or the initial start before any).
    #[must_use]
    pub fn last_key(&self) -> Option<&KeyOf<F>> {
        self.start.as_ref()
    }

    fn fetch_page(&mut self) -> Result<(), CursorError> {
        let refetch = self.state == State::Active;
        let finish = self.finish.evaluate();
        self.fetches += 1;

        let batch = match self.fetcher.fetch(
            self.start.as_ref(),
            finish.as_ref(),
            self.reversed,
            self.page_size,
        ) {
            Ok(batch) => batch,
            Err(err) => {
                tracing::warn!(
                    fetch = self.fetches,
                    start = ?self.start,
                    error = %err,
                    "page fetch failed; cursor exhausted"
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
            start = ?self.start,
            finish = ?finish,
            reversed = self.reversed,
            limit = self.page_size,
            fetched = page.len(),
            "fetched page"
        );

        self.page = page;
        self.skip_overlap = refetch;
        self.state = State::Active;
        Ok(())
    }

    fn exhaust(&mut self) {
        self.state = State::Exhausted;
        self.page = Page::empty();
        self.ready = None;
    }
}

impl<F: RangeFetcher> Cursor for PagedCursor<F> {
    type Item = F::Entry;

    fn has_more(&mut self) -> Result<bool, CursorError> {
        loop {
            match self.state {
                State::Exhausted => return Ok(false),
                State::Pending => self.fetch_page()?,
                State::Active => {
                    if self.ready.is_some() {
                        return Ok(true);
                    }
                    if let Some(entry) = self.page.next() {
                        if std::mem::take(&mut self.skip_overlap)
                            && self.start.as_ref() == Some(entry.key())
                        {
                            tracing::trace!(key = ?entry.key(), "skipping page overlap");
                            continue;
                        }
                        self.ready = Some(entry);
                        return Ok(true);
                    }
                    if self.page.wants_refetch() {
                        self.fetch_page()?;
                    } else {
                        tracing::trace!(
                            fetches = self.fetches,
                            delivered = self.delivered,
                            "range exhausted"
                        );
                        self.exhaust();
                    }
                }
            }
        }
    }

    fn next_entry(&mut self) -> Result<F::Entry, CursorError> {
        if !self.has_more()? {
            return Err(CursorError::Exhausted);
        }
        let entry = self.ready.take().ok_or(CursorError::Exhausted)?;
        self.start = Some(entry.key().clone());
        self.delivered += 1;
        Ok(entry)
    }
}
