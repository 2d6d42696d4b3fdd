//! Wall-clock sources for time-bounded scans.
//!
//! Rows keyed by time (time UUIDs, epoch millis) are often scanned "up to
//! now", where now keeps moving while the scan pages through. [`Finish::until_now`]
//! builds a [`DynamicBound`](crate::DynamicBound) that re-reads the clock
//! before every fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::bound::Finish;

/// Abstraction over the system clock for dependency injection.
///
/// The default implementation ([`SystemClock`]) delegates to
/// `std::time::SystemTime`; tests use [`ManualClock`].
pub trait ClockSource: Send + Sync {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now(&self) -> u64;
}

/// Reads the real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> u64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by_ms: u64) {
        self.millis.fetch_add(by_ms, Ordering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

impl<K: Clone> Finish<K> {
    /// Finish at the key for the current time, re-read before every fetch.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use widerow_core::{Finish, ManualClock};
    ///
    /// let clock = Arc::new(ManualClock::new(1_000));
    /// let mut finish = Finish::until_now(Arc::clone(&clock), |ms| ms);
    /// assert_eq!(finish.evaluate(), Some(1_000));
    /// clock.advance(5);
    /// assert_eq!(finish.evaluate(), Some(1_005));
    /// ```
    pub fn until_now<C, F>(clock: C, mut to_key: F) -> Self
    where
        C: ClockSource + 'static,
        F: FnMut(u64) -> K + Send + 'static,
    {
        Self::dynamic(move || Some(to_key(clock.now())))
    }
}
