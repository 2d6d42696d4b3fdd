//! Standard column families and their rows.
//!
//! Every read goes through a cursor: listings return lazy [`BoxCursor`]s,
//! and the materializing calls (`columns`, `columns_between`) drain one.

use std::collections::BTreeMap;
use std::sync::Arc;

use widerow_core::{
    single_entry, BoxCursor, Cursor, EmptyCursor, Finish, KeyRangeCursor, PageSpec, PagedCursor,
    RangeEntry, RangeFetcher, ScanRange,
};

use crate::codec::encode;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::fetchers::{ColumnSliceFetcher, RowKeyFetcher};
use crate::schema::ColumnFamilyDef;
use crate::store::{ColumnStore, RowPath};
use crate::types::{Column, Value, ValueType};

/// Store, definition and page sizes shared by every handle into one family.
#[derive(Clone)]
pub(crate) struct FamilyHandle {
    pub(crate) store: Arc<dyn ColumnStore>,
    pub(crate) def: Arc<ColumnFamilyDef>,
    pub(crate) config: ClientConfig,
}

impl FamilyHandle {
    pub(crate) fn name(&self) -> &str {
        &self.def.name
    }

    pub(crate) fn column_page_size(&self) -> usize {
        self.config.column_page_size.get()
    }

    pub(crate) fn row_keys(
        &self,
        start: Option<Value>,
        end: Option<Value>,
    ) -> Result<BoxCursor<'static, Value>, ClientError> {
        for bound in [&start, &end].into_iter().flatten() {
            encode(bound, self.def.row_key_type)?;
        }
        let fetcher = RowKeyFetcher::new(Arc::clone(&self.store), Arc::clone(&self.def));
        let cursor =
            KeyRangeCursor::new(fetcher, start, end, self.config.row_key_page_size.get())?;
        Ok(cursor.boxed())
    }

    pub(crate) fn with_column_page_size(&self, size: i64) -> Self {
        Self {
            config: self.config.with_column_page_size(size),
            ..self.clone()
        }
    }

    pub(crate) fn with_row_key_page_size(&self, size: i64) -> Self {
        Self {
            config: self.config.with_row_key_page_size(size),
            ..self.clone()
        }
    }
}

/// Checks the fixed bounds of a scan against the key type, so a mistyped
/// bound fails when the scan is opened rather than on its first fetch.
pub(crate) fn check_range(range: &ScanRange<Value>, ty: ValueType) -> Result<(), ClientError> {
    if let Some(start) = &range.start {
        encode(start, ty)?;
    }
    if let Finish::Fixed(Some(finish)) = &range.finish {
        encode(finish, ty)?;
    }
    Ok(())
}

/// Opens a paged scan with the family's column page size. Fixed bounds
/// that cross yield an empty cursor without querying the store.
pub(crate) fn open_scan<F, E>(
    family: &FamilyHandle,
    fetcher: F,
    range: ScanRange<Value>,
) -> Result<BoxCursor<'static, E>, ClientError>
where
    F: RangeFetcher<Entry = E> + Send + 'static,
    E: RangeEntry<Key = Value> + Send + 'static,
{
    if range.is_crossed() {
        tracing::trace!(family = %family.name(), "crossed scan bounds, nothing to fetch");
        return Ok(EmptyCursor::new().boxed());
    }
    let cursor = PagedCursor::new(fetcher, PageSpec::new(range, family.column_page_size()))?;
    Ok(cursor.boxed())
}

/// The columns of one row, or of one super column: everything that reads
/// and writes plain columns.
#[derive(Clone)]
pub(crate) struct ColumnScope {
    family: FamilyHandle,
    row: Vec<u8>,
    super_column: Option<Vec<u8>>,
}

impl ColumnScope {
    pub(crate) fn new(family: FamilyHandle, row: Vec<u8>, super_column: Option<Vec<u8>>) -> Self {
        Self {
            family,
            row,
            super_column,
        }
    }

    fn path(&self) -> RowPath<'_> {
        RowPath {
            family: self.family.name(),
            row: &self.row,
            super_column: self.super_column.as_deref(),
        }
    }

    fn key_type(&self) -> ValueType {
        self.family.def.leaf_key_type()
    }

    fn fetcher(&self) -> ColumnSliceFetcher {
        ColumnSliceFetcher::new(
            Arc::clone(&self.family.store),
            Arc::clone(&self.family.def),
            self.row.clone(),
            self.super_column.clone(),
        )
    }

    pub(crate) fn insert_column(&self, name: Value, value: Value) -> Result<(), ClientError> {
        let def = &self.family.def;
        if def.is_counter() {
            return Err(ClientError::CounterNotAllowed(def.name.clone()));
        }
        let name = encode(&name, self.key_type())?;
        let value = encode(&value, def.value_type)?;
        self.family.store.insert(self.path(), &name, value)?;
        Ok(())
    }

    pub(crate) fn delete_column(&self, name: &Value) -> Result<(), ClientError> {
        let def = &self.family.def;
        if def.is_counter() {
            return Err(ClientError::CounterNotAllowed(def.name.clone()));
        }
        let name = encode(name, self.key_type())?;
        self.family.store.delete(self.path(), &name)?;
        Ok(())
    }

    pub(crate) fn increment_counter(&self, name: &Value, delta: i64) -> Result<(), ClientError> {
        let def = &self.family.def;
        if !def.is_counter() {
            return Err(ClientError::CounterRequired(def.name.clone()));
        }
        let name = encode(name, self.key_type())?;
        self.family.store.increment(self.path(), &name, delta)?;
        Ok(())
    }

    pub(crate) fn column(&self, name: &Value) -> Result<Option<Value>, ClientError> {
        encode(name, self.key_type())?;
        let batch = self.fetcher().fetch(Some(name), Some(name), false, 1)?;
        Ok(single_entry(batch)?.map(|column| column.value))
    }

    pub(crate) fn column_count(&self) -> Result<usize, ClientError> {
        Ok(self.family.store.count(self.path())?)
    }

    pub(crate) fn columns(
        &self,
        start: Option<Value>,
        finish: Option<Value>,
    ) -> Result<BTreeMap<Value, Value>, ClientError> {
        let columns = self
            .scan(ScanRange::between(start, finish))?
            .transform(|column| (column.name, column.value))
            .try_collect_vec()?;
        Ok(columns.into_iter().collect())
    }

    pub(crate) fn column_names(
        &self,
        start: Option<Value>,
        finish: Option<Value>,
    ) -> Result<BoxCursor<'static, Value>, ClientError> {
        Ok(self
            .scan(ScanRange::between(start, finish))?
            .transform(|column| column.name)
            .boxed())
    }

    pub(crate) fn scan(
        &self,
        range: ScanRange<Value>,
    ) -> Result<BoxCursor<'static, Column>, ClientError> {
        check_range(&range, self.key_type())?;
        open_scan(&self.family, self.fetcher(), range)
    }
}

/// Handle to a standard column family.
#[derive(Clone)]
pub struct ColumnFamily {
    family: FamilyHandle,
}

impl std::fmt::Debug for ColumnFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnFamily")
            .field("def", &self.family.def)
            .field("config", &self.family.config)
            .finish_non_exhaustive()
    }
}

impl ColumnFamily {
    pub(crate) fn new(family: FamilyHandle) -> Self {
        Self { family }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.family.name()
    }

    #[must_use]
    pub fn def(&self) -> &ColumnFamilyDef {
        &self.family.def
    }

    #[must_use]
    pub fn config(&self) -> ClientConfig {
        self.family.config
    }

    /// The same family, scanning rows `size` columns at a time
    /// (`<= 0` for a single unbounded fetch).
    #[must_use]
    pub fn with_page_size(&self, size: i64) -> Self {
        Self::new(self.family.with_column_page_size(size))
    }

    /// The same family, listing row keys `size` at a time.
    #[must_use]
    pub fn with_row_key_page_size(&self, size: i64) -> Self {
        Self::new(self.family.with_row_key_page_size(size))
    }

    /// Handle to one row. Does not touch the store.
    ///
    /// # Errors
    ///
    /// [`ClientError::Codec`] if `key` is not of the row-key type.
    pub fn row(&self, key: impl Into<Value>) -> Result<Row, ClientError> {
        let key = key.into();
        let raw = encode(&key, self.family.def.row_key_type)?;
        Ok(Row {
            key,
            scope: ColumnScope::new(self.family.clone(), raw, None),
        })
    }

    /// Lists every row key, paged by the row-key page size.
    ///
    /// # Errors
    ///
    /// Fails if the first page cannot be fetched.
    pub fn row_keys(&self) -> Result<BoxCursor<'static, Value>, ClientError> {
        self.family.row_keys(None, None)
    }

    /// Lists the row keys in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Mistyped bounds, or a failed first fetch.
    pub fn row_keys_between(
        &self,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Result<BoxCursor<'static, Value>, ClientError> {
        self.family.row_keys(Some(start.into()), Some(end.into()))
    }
}

/// One row of a standard column family.
#[derive(Clone)]
pub struct Row {
    key: Value,
    scope: ColumnScope,
}

impl std::fmt::Debug for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row")
            .field("family", &self.scope.family.name())
            .field("key", &self.key)
            .finish()
    }
}

impl Row {
    #[must_use]
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// Writes a column.
    ///
    /// # Errors
    ///
    /// [`ClientError::CounterNotAllowed`] on counter families; codec or
    /// store failures.
    pub fn insert_column(
        &self,
        name: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Result<(), ClientError> {
        self.scope.insert_column(name.into(), value.into())
    }

    /// Deletes a column.
    ///
    /// # Errors
    ///
    /// [`ClientError::CounterNotAllowed`] on counter families; codec or
    /// store failures.
    pub fn delete_column(&self, name: impl Into<Value>) -> Result<(), ClientError> {
        self.scope.delete_column(&name.into())
    }

    /// Adds `delta` to a counter column.
    ///
    /// # Errors
    ///
    /// [`ClientError::CounterRequired`] unless the family holds counters.
    pub fn increment_counter(&self, name: impl Into<Value>, delta: i64) -> Result<(), ClientError> {
        self.scope.increment_counter(&name.into(), delta)
    }

    /// Reads one column's value. Counters read as [`Value::Long`].
    ///
    /// # Errors
    ///
    /// Codec or store failures.
    pub fn column(&self, name: impl Into<Value>) -> Result<Option<Value>, ClientError> {
        self.scope.column(&name.into())
    }

    /// # Errors
    ///
    /// Store failures.
    pub fn column_count(&self) -> Result<usize, ClientError> {
        self.scope.column_count()
    }

    /// Reads every column of the row.
    ///
    /// # Errors
    ///
    /// Any fetch failure while paging through the row.
    pub fn columns(&self) -> Result<BTreeMap<Value, Value>, ClientError> {
        self.scope.columns(None, None)
    }

    /// Reads the columns in `[start, finish]`.
    ///
    /// # Errors
    ///
    /// Mistyped bounds or any fetch failure.
    pub fn columns_between(
        &self,
        start: impl Into<Value>,
        finish: impl Into<Value>,
    ) -> Result<BTreeMap<Value, Value>, ClientError> {
        self.scope.columns(Some(start.into()), Some(finish.into()))
    }

    /// Lazily lists every column name.
    ///
    /// # Errors
    ///
    /// Invalid page configuration.
    pub fn column_names(&self) -> Result<BoxCursor<'static, Value>, ClientError> {
        self.scope.column_names(None, None)
    }

    /// Lazily lists the column names in `[start, finish]`.
    ///
    /// # Errors
    ///
    /// Mistyped bounds or invalid page configuration.
    pub fn column_names_between(
        &self,
        start: impl Into<Value>,
        finish: impl Into<Value>,
    ) -> Result<BoxCursor<'static, Value>, ClientError> {
        self.scope
            .column_names(Some(start.into()), Some(finish.into()))
    }

    /// Opens a paged scan over the row: any bounds, either direction, fixed
    /// or moving finish.
    ///
    /// # Errors
    ///
    /// Mistyped fixed bounds or invalid page configuration.
    pub fn scan(&self, range: ScanRange<Value>) -> Result<BoxCursor<'static, Column>, ClientError> {
        self.scope.scan(range)
    }
}
