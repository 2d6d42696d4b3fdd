//! Byte-level access to a wide-column store.
//!
//! [`ColumnStore`] is the remote-store seam: one keyspace, raw byte keys,
//! one query per call. Typed access lives above it, in the fetchers and
//! facades. All operations are synchronous.

pub mod memory;

use crate::schema::ColumnFamilyDef;

pub use memory::MemoryStore;

/// Stored value of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Bytes(Vec<u8>),
    Counter(i64),
}

/// A column as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: Vec<u8>,
    pub value: CellValue,
}

/// A super column as stored, with all its sub-columns in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSuperColumn {
    pub name: Vec<u8>,
    pub columns: Vec<RawColumn>,
}

/// Addresses the columns of one row, or of one super column in a row.
#[derive(Debug, Clone, Copy)]
pub struct RowPath<'a> {
    pub family: &'a str,
    pub row: &'a [u8],
    /// `Some` to address the sub-columns of a super column.
    pub super_column: Option<&'a [u8]>,
}

impl<'a> RowPath<'a> {
    #[must_use]
    pub fn row(family: &'a str, row: &'a [u8]) -> Self {
        Self {
            family,
            row,
            super_column: None,
        }
    }

    #[must_use]
    pub fn super_column(family: &'a str, row: &'a [u8], super_column: &'a [u8]) -> Self {
        Self {
            family,
            row,
            super_column: Some(super_column),
        }
    }
}

/// One slice request. Both bounds are inclusive; when `reversed`, `start`
/// is the upper bound and results come in descending order.
#[derive(Debug, Clone, Copy)]
pub struct SliceQuery<'a> {
    pub start: Option<&'a [u8]>,
    pub finish: Option<&'a [u8]>,
    pub reversed: bool,
    pub limit: usize,
}

impl SliceQuery<'_> {
    /// Every column, in one unbounded request.
    #[must_use]
    pub fn all() -> Self {
        Self {
            start: None,
            finish: None,
            reversed: false,
            limit: usize::MAX,
        }
    }
}

/// A wide-column store serving one keyspace.
///
/// Slice reads return `Ok(None)` for a row that does not exist. Wrapped in
/// `Arc<dyn ColumnStore>` and shared by every handle of a keyspace.
pub trait ColumnStore: Send + Sync + 'static {
    /// Names of the column families the store knows about.
    ///
    /// # Errors
    ///
    /// Transport or remote failure.
    fn describe_families(&self) -> anyhow::Result<Vec<String>>;

    /// Creates a column family.
    ///
    /// # Errors
    ///
    /// Fails if the family already exists.
    fn create_family(&self, def: &ColumnFamilyDef) -> anyhow::Result<()>;

    /// Writes one column.
    ///
    /// # Errors
    ///
    /// Unknown family or a path that does not fit it.
    fn insert(&self, path: RowPath<'_>, column: &[u8], value: Vec<u8>) -> anyhow::Result<()>;

    /// Adds `delta` to a counter column, creating it at zero if needed.
    ///
    /// # Errors
    ///
    /// Unknown family or a path that does not fit it.
    fn increment(&self, path: RowPath<'_>, column: &[u8], delta: i64) -> anyhow::Result<()>;

    /// Deletes one column. Deleting a missing column is not an error.
    ///
    /// # Errors
    ///
    /// Unknown family or a path that does not fit it.
    fn delete(&self, path: RowPath<'_>, column: &[u8]) -> anyhow::Result<()>;

    /// Reads an ordered slice of columns.
    ///
    /// # Errors
    ///
    /// Unknown family, a path that does not fit it, or a start bound past
    /// the finish bound.
    fn get_slice(
        &self,
        path: RowPath<'_>,
        query: SliceQuery<'_>,
    ) -> anyhow::Result<Option<Vec<RawColumn>>>;

    /// Reads an ordered slice of super columns.
    ///
    /// # Errors
    ///
    /// As [`get_slice`](Self::get_slice); also fails on standard families.
    fn get_super_slice(
        &self,
        family: &str,
        row: &[u8],
        query: SliceQuery<'_>,
    ) -> anyhow::Result<Option<Vec<RawSuperColumn>>>;

    /// Reads up to `limit` row keys in `[start, end]`, ascending.
    ///
    /// # Errors
    ///
    /// Unknown family.
    fn get_row_keys(
        &self,
        family: &str,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        limit: usize,
    ) -> anyhow::Result<Option<Vec<Vec<u8>>>>;

    /// Counts the columns at `path` (super columns for a super-family row).
    ///
    /// # Errors
    ///
    /// Unknown family or a path that does not fit it.
    fn count(&self, path: RowPath<'_>) -> anyhow::Result<usize>;
}
