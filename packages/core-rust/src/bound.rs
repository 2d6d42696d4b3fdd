//! Range bounds for slice scans.
//!
//! A scan starts at an optional concrete key and finishes at a [`Finish`]
//! bound, which is either fixed for the lifetime of the cursor or computed
//! afresh before every fetch by a [`DynamicBound`].
//!
//! Bounds follow the store's slice semantics: both ends are inclusive, and
//! when a scan is reversed `start` is the upper end and `finish` the lower.

use std::fmt;

/// Zero-argument function producing the finish bound for the next fetch.
///
/// Called immediately before each fetch, never cached. `None` means
/// unbounded in the scan direction. Any state it carries (a clock, a
/// counter) belongs to the caller.
pub type DynamicBound<K> = Box<dyn FnMut() -> Option<K> + Send>;

/// Finish bound of a scan.
pub enum Finish<K> {
    /// A constant bound; `None` is unbounded.
    Fixed(Option<K>),
    /// A bound re-evaluated before every fetch.
    Dynamic(DynamicBound<K>),
}

impl<K: Clone> Finish<K> {
    /// Unbounded finish.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::Fixed(None)
    }

    /// Finish at a constant key.
    #[must_use]
    pub fn at(key: K) -> Self {
        Self::Fixed(Some(key))
    }

    /// Finish at whatever `f` returns when the next fetch is built.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: FnMut() -> Option<K> + Send + 'static,
    {
        Self::Dynamic(Box::new(f))
    }

    /// Produces the bound for the fetch about to be issued.
    pub fn evaluate(&mut self) -> Option<K> {
        match self {
            Self::Fixed(key) => key.clone(),
            Self::Dynamic(f) => f(),
        }
    }

    /// Returns `true` if this bound moves between fetches.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl<K: Clone> Default for Finish<K> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<K: fmt::Debug> fmt::Debug for Finish<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(key) => f.debug_tuple("Fixed").field(key).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl<K> From<Option<K>> for Finish<K> {
    fn from(key: Option<K>) -> Self {
        Self::Fixed(key)
    }
}

/// Start, finish and direction of a slice scan, without the page size.
///
/// ```
/// use widerow_core::ScanRange;
///
/// let range = ScanRange::all().starting_at("a010").finishing_at("a020");
/// assert_eq!(range.start, Some("a010"));
/// assert!(!range.reversed);
/// ```
#[derive(Debug)]
pub struct ScanRange<K> {
    /// Inclusive start. `None` starts at the first (or, reversed, last) entry.
    pub start: Option<K>,
    /// Inclusive finish, possibly dynamic.
    pub finish: Finish<K>,
    /// Iterate in descending comparator order.
    pub reversed: bool,
}

impl<K: Clone> ScanRange<K> {
    /// The whole ordered range, ascending.
    #[must_use]
    pub fn all() -> Self {
        Self {
            start: None,
            finish: Finish::unbounded(),
            reversed: false,
        }
    }

    /// Inclusive range between two optional keys, ascending.
    #[must_use]
    pub fn between(start: Option<K>, finish: Option<K>) -> Self {
        Self {
            start,
            finish: Finish::Fixed(finish),
            reversed: false,
        }
    }

    #[must_use]
    pub fn starting_at(mut self, key: K) -> Self {
        self.start = Some(key);
        self
    }

    #[must_use]
    pub fn finishing_at(mut self, key: K) -> Self {
        self.finish = Finish::at(key);
        self
    }

    #[must_use]
    pub fn finishing_with(mut self, finish: Finish<K>) -> Self {
        self.finish = finish;
        self
    }

    /// Iterate in descending order. `start` becomes the upper end.
    #[must_use]
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }
}

impl<K: Ord> ScanRange<K> {
    /// Returns `true` if both bounds are fixed and cross in traversal
    /// order, so that no entry can fall between them.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        let (Some(start), Finish::Fixed(Some(finish))) = (&self.start, &self.finish) else {
            return false;
        };
        if self.reversed {
            start < finish
        } else {
            start > finish
        }
    }
}

impl<K: Clone> Default for ScanRange<K> {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_finish_evaluates_to_same_key() {
        let mut finish = Finish::at(7_u32);
        assert_eq!(finish.evaluate(), Some(7));
        assert_eq!(finish.evaluate(), Some(7));
        assert!(!finish.is_dynamic());
    }

    #[test]
    fn dynamic_finish_is_called_on_every_evaluation() {
        let mut next = 0_u32;
        let mut finish = Finish::dynamic(move || {
            next += 10;
            Some(next)
        });
        assert!(finish.is_dynamic());
        assert_eq!(finish.evaluate(), Some(10));
        assert_eq!(finish.evaluate(), Some(20));
    }

    #[test]
    fn scan_range_builders() {
        let range = ScanRange::all().starting_at(5).finishing_at(1).reversed();
        assert_eq!(range.start, Some(5));
        assert!(range.reversed);
        let mut finish = range.finish;
        assert_eq!(finish.evaluate(), Some(1));
    }

    #[test]
    fn crossed_bounds_follow_direction() {
        assert!(ScanRange::between(Some(5), Some(1)).is_crossed());
        assert!(!ScanRange::between(Some(1), Some(5)).is_crossed());
        assert!(!ScanRange::between(Some(5), Some(1)).reversed().is_crossed());
        assert!(ScanRange::between(Some(1), Some(5)).reversed().is_crossed());
        assert!(!ScanRange::between(Some(3), Some(3)).is_crossed());
        assert!(!ScanRange::all().starting_at(9).is_crossed());
        let moving = ScanRange::all()
            .starting_at(9)
            .finishing_with(Finish::dynamic(|| Some(1)));
        assert!(!moving.is_crossed());
    }

    #[test]
    fn debug_hides_dynamic_closure() {
        let finish: Finish<u8> = Finish::dynamic(|| None);
        assert_eq!(format!("{finish:?}"), "Dynamic(..)");
        assert_eq!(format!("{:?}", Finish::at(1_u8)), "Fixed(Some(1))");
    }
}
