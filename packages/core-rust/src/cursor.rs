//! The pull-based cursor contract and the small adapters built on it.
//!
//! [`Cursor`] is deliberately narrower than [`Iterator`]: `has_more()` may
//! block on a remote fetch and can fail, and `next_entry()` past the end is a
//! contract violation rather than a `None`. [`CursorIter`] bridges to the
//! std iterator world for callers that prefer `for` loops.

use std::marker::PhantomData;

use crate::error::CursorError;

/// A lazy, forward-only, single-pass sequence of entries.
pub trait Cursor {
    type Item;

    /// Returns `true` if `next_entry()` will produce an entry.
    ///
    /// This is where remote fetches happen.
    ///
    /// # Errors
    ///
    /// Surfaces fetch failures as [`CursorError::Transport`] and broken
    /// store contracts as [`CursorError::InvariantViolation`].
    fn has_more(&mut self) -> Result<bool, CursorError>;

    /// Produces the next entry.
    ///
    /// # Errors
    ///
    /// [`CursorError::Exhausted`] if `has_more()` would return `false`, plus
    /// anything `has_more()` can return.
    fn next_entry(&mut self) -> Result<Self::Item, CursorError>;

    /// Lazily maps every entry through `f` at consumption time.
    fn transform<U, F>(self, f: F) -> Transformed<Self, F>
    where
        Self: Sized,
        F: FnMut(Self::Item) -> U,
    {
        Transformed { inner: self, f }
    }

    /// Views the cursor as a std iterator of `Result`s, fused after the
    /// first error.
    fn into_results(self) -> CursorIter<Self>
    where
        Self: Sized,
    {
        CursorIter {
            inner: self,
            done: false,
        }
    }

    /// Drains the cursor into a vector.
    ///
    /// # Errors
    ///
    /// The first error raised while draining.
    fn try_collect_vec(mut self) -> Result<Vec<Self::Item>, CursorError>
    where
        Self: Sized,
    {
        let mut out = Vec::new();
        while self.has_more()? {
            out.push(self.next_entry()?);
        }
        Ok(out)
    }

    /// Type-erases the cursor.
    fn boxed<'a>(self) -> BoxCursor<'a, Self::Item>
    where
        Self: Sized + Send + 'a,
    {
        Box::new(self)
    }
}

/// Type-erased cursor, as handed out by facades.
pub type BoxCursor<'a, T> = Box<dyn Cursor<Item = T> + Send + 'a>;

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    type Item = C::Item;

    fn has_more(&mut self) -> Result<bool, CursorError> {
        (**self).has_more()
    }

    fn next_entry(&mut self) -> Result<Self::Item, CursorError> {
        (**self).next_entry()
    }
}

/// Cursor applying a mapping to each entry of another cursor.
/// See [`Cursor::transform`].
pub struct Transformed<C, F> {
    inner: C,
    f: F,
}

impl<C, F, U> Cursor for Transformed<C, F>
where
    C: Cursor,
    F: FnMut(C::Item) -> U,
{
    type Item = U;

    fn has_more(&mut self) -> Result<bool, CursorError> {
        self.inner.has_more()
    }

    fn next_entry(&mut self) -> Result<U, CursorError> {
        self.inner.next_entry().map(&mut self.f)
    }
}

/// A cursor over nothing. Never fetches.
pub struct EmptyCursor<T> {
    _item: PhantomData<fn() -> T>,
}

impl<T> EmptyCursor<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { _item: PhantomData }
    }
}

impl<T> Default for EmptyCursor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Cursor for EmptyCursor<T> {
    type Item = T;

    fn has_more(&mut self) -> Result<bool, CursorError> {
        Ok(false)
    }

    fn next_entry(&mut self) -> Result<T, CursorError> {
        Err(CursorError::Exhausted)
    }
}

/// [`Iterator`] view of a cursor. See [`Cursor::into_results`].
pub struct CursorIter<C> {
    inner: C,
    done: bool,
}

impl<C: Cursor> Iterator for CursorIter<C> {
    type Item = Result<C::Item, CursorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.has_more() {
            Ok(true) => {
                let item = self.inner.next_entry();
                if item.is_err() {
                    self.done = true;
                }
                Some(item)
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<C: Cursor> std::iter::FusedIterator for CursorIter<C> {}
