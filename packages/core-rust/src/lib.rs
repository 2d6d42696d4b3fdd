//! widerow core: paginated range-scan cursors over ordered remote stores.
//!
//! A [`PagedCursor`] turns one logical range scan over a row into a lazy
//! sequence of bounded fetches, hiding the one-entry overlap between pages.
//! [`KeyRangeCursor`] does the same over row keys.

pub mod bound;
pub mod clock;
pub mod cursor;
pub mod error;
pub mod fetcher;
pub mod key_range;
pub mod page;
pub mod paged;

pub use bound::{DynamicBound, Finish, ScanRange};
pub use clock::{ClockSource, ManualClock, SystemClock};
pub use cursor::{BoxCursor, Cursor, CursorIter, EmptyCursor, Transformed};
pub use error::CursorError;
pub use fetcher::{
    fetch_fn, key_fetch_fn, single_entry, Batch, FnFetcher, FnKeyFetcher, KeyRangeFetcher,
    RangeEntry, RangeFetcher,
};
pub use key_range::KeyRangeCursor;
pub use page::{PageSize, PageSpec, MIN_PAGE_SIZE};
pub use paged::PagedCursor;
