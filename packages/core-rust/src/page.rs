//! Page sizing for paged scans.
//!
//! Two layers:
//!
//! - [`PageSize`] is the configuration surface. It never fails: values
//!   `<= 0` mean unbounded and `1` is promoted to `2`.
//! - [`PageSpec`] is what a cursor is built from. Its raw `page_size` is
//!   validated when the cursor is constructed.

use serde::{Deserialize, Serialize};

use crate::bound::ScanRange;
use crate::error::CursorError;

/// Smallest page a cursor can work with: one entry of overlap plus at least
/// one new entry per refetch.
pub const MIN_PAGE_SIZE: usize = 2;

/// Normalized number of entries requested per fetch.
///
/// Serializes as the raw integer it was configured with (`0` for
/// unbounded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct PageSize(usize);

impl PageSize {
    /// Fetch everything in one page.
    pub const UNBOUNDED: Self = Self(usize::MAX);

    /// Normalizes a configured value: `<= 0` is unbounded, `1` becomes `2`.
    #[must_use]
    pub fn from_config(value: i64) -> Self {
        if value <= 0 {
            return Self::UNBOUNDED;
        }
        let size = usize::try_from(value).unwrap_or(usize::MAX);
        Self(size.max(MIN_PAGE_SIZE))
    }

    /// Entries requested per fetch.
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }

    #[must_use]
    pub fn is_unbounded(self) -> bool {
        self.0 == usize::MAX
    }
}

impl From<i64> for PageSize {
    fn from(value: i64) -> Self {
        Self::from_config(value)
    }
}

impl From<PageSize> for i64 {
    fn from(size: PageSize) -> Self {
        if size.is_unbounded() {
            0
        } else {
            i64::try_from(size.0).unwrap_or(i64::MAX)
        }
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> Self {
        size.0
    }
}

/// Everything a cursor needs to know about the scan it performs.
#[derive(Debug)]
pub struct PageSpec<K> {
    /// Bounds and direction.
    pub range: ScanRange<K>,
    /// Entries requested per fetch. Must be at least [`MIN_PAGE_SIZE`].
    pub page_size: usize,
}

impl<K: Clone> PageSpec<K> {
    #[must_use]
    pub fn new(range: ScanRange<K>, page_size: impl Into<usize>) -> Self {
        Self {
            range,
            page_size: page_size.into(),
        }
    }

    /// Checks the page size, returning it on success.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Configuration`] if fewer than
    /// [`MIN_PAGE_SIZE`] entries would be fetched per page.
    pub fn validate(&self) -> Result<usize, CursorError> {
        validate_page_size(self.page_size)
    }
}

pub(crate) fn validate_page_size(page_size: usize) -> Result<usize, CursorError> {
    if page_size < MIN_PAGE_SIZE {
        return Err(CursorError::configuration(format!(
            "at least {MIN_PAGE_SIZE} entries must be fetched each time, got {page_size}"
        )));
    }
    Ok(page_size)
}
