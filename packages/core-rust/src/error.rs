//! Error taxonomy for paged range scans.

/// Errors surfaced by cursors and the single-key lookup path.
///
/// All variants are raised synchronously from the call that triggered them:
/// cursor construction for [`Configuration`](CursorError::Configuration),
/// `has_more()` / `next_entry()` for the rest. Nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    /// The page settings cannot be honored (e.g. fewer than two
    /// entries per fetch).
    #[error("invalid page configuration: {reason}")]
    Configuration { reason: String },

    /// `next_entry()` was called although `has_more()` would return `false`.
    #[error("cursor is exhausted")]
    Exhausted,

    /// The underlying fetch failed. The cursor is exhausted afterwards.
    #[error("fetch failed: {0:#}")]
    Transport(anyhow::Error),

    /// A fetched batch broke the store contract (more entries than requested).
    #[error("store invariant violated: {reason}")]
    InvariantViolation { reason: String },
}

impl CursorError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub(crate) fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`CursorError::Exhausted`].
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}
