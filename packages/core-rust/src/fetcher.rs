//! The seam between cursors and the storage client.
//!
//! A [`RangeFetcher`] performs exactly one remote slice query per call. It is
//! supplied by the storage-client layer and bound to one row (or super
//! column) of one column family; the cursor only decides *which* range to ask
//! for next. [`KeyRangeFetcher`] is the same seam over the row-key space.

use std::fmt::Debug;
use std::marker::PhantomData;

use crate::error::CursorError;

/// An entry returned by a slice query, identified by its key.
///
/// Cursors never look inside entries. Two entries with equal keys are the
/// same entry; that is all the overlap skip relies on.
pub trait RangeEntry {
    /// Column name, super-column name, counter name or row key.
    type Key: Clone + PartialEq + Debug;

    fn key(&self) -> &Self::Key;
}

impl<K, V> RangeEntry for (K, V)
where
    K: Clone + PartialEq + Debug,
{
    type Key = K;

    fn key(&self) -> &K {
        &self.0
    }
}

/// One ordered batch as returned by a fetch. `None` is an absent result,
/// which cursors treat exactly like an empty batch.
pub type Batch<E> = Option<Vec<E>>;

/// Single-query slice access for one row.
///
/// Contract: return at most `limit` entries in comparator order (descending
/// when `reversed`), including `start` if it exists, and nothing past
/// `finish`. Both bounds are inclusive; `None` is unbounded.
pub trait RangeFetcher {
    type Entry: RangeEntry;

    /// Issues one remote query.
    ///
    /// # Errors
    ///
    /// Any transport or remote failure. Cursors surface it as
    /// [`CursorError::Transport`] and do not retry.
    fn fetch(
        &mut self,
        start: Option<&<Self::Entry as RangeEntry>::Key>,
        finish: Option<&<Self::Entry as RangeEntry>::Key>,
        reversed: bool,
        limit: usize,
    ) -> anyhow::Result<Batch<Self::Entry>>;
}

impl<T: RangeFetcher + ?Sized> RangeFetcher for Box<T> {
    type Entry = T::Entry;

    fn fetch(
        &mut self,
        start: Option<&<Self::Entry as RangeEntry>::Key>,
        finish: Option<&<Self::Entry as RangeEntry>::Key>,
        reversed: bool,
        limit: usize,
    ) -> anyhow::Result<Batch<Self::Entry>> {
        (**self).fetch(start, finish, reversed, limit)
    }
}

/// Single-query access to a range of row keys in one column family.
///
/// Same contract as [`RangeFetcher`], ascending only.
pub trait KeyRangeFetcher {
    type Key: Clone + PartialEq + Debug;

    /// Issues one remote key-range query.
    ///
    /// # Errors
    ///
    /// Any transport or remote failure.
    fn fetch_keys(
        &mut self,
        start: Option<&Self::Key>,
        end: Option<&Self::Key>,
        limit: usize,
    ) -> anyhow::Result<Batch<Self::Key>>;
}

impl<T: KeyRangeFetcher + ?Sized> KeyRangeFetcher for Box<T> {
    type Key = T::Key;

    fn fetch_keys(
        &mut self,
        start: Option<&Self::Key>,
        end: Option<&Self::Key>,
        limit: usize,
    ) -> anyhow::Result<Batch<Self::Key>> {
        (**self).fetch_keys(start, end, limit)
    }
}

/// [`RangeFetcher`] backed by a closure. See [`fetch_fn`].
pub struct FnFetcher<F, E> {
    f: F,
    _entry: PhantomData<fn() -> E>,
}

/// Wraps a closure as a [`RangeFetcher`].
///
/// ```
/// use widerow_core::{fetch_fn, Cursor, PageSpec, PagedCursor, ScanRange};
///
/// let names: Vec<(u32, ())> = (0..5).map(|n| (n, ())).collect();
/// let fetcher = fetch_fn::<_, (u32, ())>(move |start, _finish, _reversed, limit| {
///     let from = start.copied().unwrap_or(0);
///     Ok(Some(names.iter().filter(|(k, _)| *k >= from).take(limit).cloned().collect()))
/// });
/// let cursor = PagedCursor::new(fetcher, PageSpec::new(ScanRange::all(), 2_usize)).unwrap();
/// let keys: Vec<u32> = cursor.transform(|(k, ())| k).try_collect_vec().unwrap();
/// assert_eq!(keys, vec![0, 1, 2, 3, 4]);
/// ```
pub fn fetch_fn<F, E>(f: F) -> FnFetcher<F, E>
where
    E: RangeEntry,
    F: FnMut(Option<&E::Key>, Option<&E::Key>, bool, usize) -> anyhow::Result<Batch<E>>,
{
    FnFetcher {
        f,
        _entry: PhantomData,
    }
}

impl<F, E> RangeFetcher for FnFetcher<F, E>
where
    E: RangeEntry,
    F: FnMut(Option<&E::Key>, Option<&E::Key>, bool, usize) -> anyhow::Result<Batch<E>>,
{
    type Entry = E;

    fn fetch(
        &mut self,
        start: Option<&E::Key>,
        finish: Option<&E::Key>,
        reversed: bool,
        limit: usize,
    ) -> anyhow::Result<Batch<E>> {
        (self.f)(start, finish, reversed, limit)
    }
}

/// [`KeyRangeFetcher`] backed by a closure. See [`key_fetch_fn`].
pub struct FnKeyFetcher<F, K> {
    f: F,
    _key: PhantomData<fn() -> K>,
}

/// Wraps a closure as a [`KeyRangeFetcher`].
pub fn key_fetch_fn<F, K>(f: F) -> FnKeyFetcher<F, K>
where
    K: Clone + PartialEq + Debug,
    F: FnMut(Option<&K>, Option<&K>, usize) -> anyhow::Result<Batch<K>>,
{
    FnKeyFetcher {
        f,
        _key: PhantomData,
    }
}

impl<F, K> KeyRangeFetcher for FnKeyFetcher<F, K>
where
    K: Clone + PartialEq + Debug,
    F: FnMut(Option<&K>, Option<&K>, usize) -> anyhow::Result<Batch<K>>,
{
    type Key = K;

    fn fetch_keys(
        &mut self,
        start: Option<&K>,
        end: Option<&K>,
        limit: usize,
    ) -> anyhow::Result<Batch<K>> {
        (self.f)(start, end, limit)
    }
}

/// Unwraps the result of a lookup that asked for exactly one key.
///
/// # Errors
///
/// Returns [`CursorError::InvariantViolation`] if the store answered with
/// more than one entry.
pub fn single_entry<E>(batch: Batch<E>) -> Result<Option<E>, CursorError> {
    let Some(mut entries) = batch else {
        return Ok(None);
    };
    if entries.len() > 1 {
        return Err(CursorError::invariant(format!(
            "lookup by key returned {} entries, expected at most one",
            entries.len()
        )));
    }
    Ok(entries.pop())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_entries_are_keyed_by_first_field() {
        let entry = ("a001".to_string(), 42_i64);
        assert_eq!(entry.key(), "a001");
    }

    #[test]
    fn fn_fetcher_forwards_arguments() {
        let mut seen = Vec::new();
        {
            let mut fetcher = fetch_fn::<_, (u8, ())>(|start, finish, reversed, limit| {
                seen.push((start.copied(), finish.copied(), reversed, limit));
                Ok(Some(vec![(1_u8, ())]))
            });
            let batch = fetcher.fetch(Some(&3), None, true, 10).unwrap();
            assert_eq!(batch.map(|b| b.len()), Some(1));
        }
        assert_eq!(seen, vec![(Some(3), None, true, 10)]);
    }

    #[test]
    fn boxed_fetchers_are_fetchers() {
        let mut fetcher: Box<dyn RangeFetcher<Entry = (u8, ())>> =
            Box::new(fetch_fn::<_, (u8, ())>(|_, _, _, _| Ok(None)));
        assert!(fetcher.fetch(None, None, false, 2).unwrap().is_none());

        let mut keys: Box<dyn KeyRangeFetcher<Key = u8>> =
            Box::new(key_fetch_fn::<_, u8>(|_, _, _| Ok(Some(vec![1, 2]))));
        assert_eq!(keys.fetch_keys(None, None, 2).unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn single_entry_accepts_zero_or_one() {
        assert_eq!(single_entry::<u8>(None).unwrap(), None);
        assert_eq!(single_entry::<u8>(Some(vec![])).unwrap(), None);
        assert_eq!(single_entry(Some(vec![9_u8])).unwrap(), Some(9));
    }

    #[test]
    fn single_entry_rejects_many() {
        let err = single_entry(Some(vec![1_u8, 2])).unwrap_err();
        assert!(matches!(err, CursorError::InvariantViolation { .. }));
    }
}
