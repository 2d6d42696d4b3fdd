//! Super column families: rows of named super columns, each holding its own
//! ordered columns.

use std::collections::BTreeMap;
use std::sync::Arc;

use widerow_core::{BoxCursor, Cursor, ScanRange};

use crate::codec::encode;
use crate::column_family::{check_range, open_scan, ColumnScope, FamilyHandle};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::fetchers::SuperSliceFetcher;
use crate::schema::ColumnFamilyDef;
use crate::store::RowPath;
use crate::types::{Column, SuperColumnSlice, Value};

/// Handle to a super column family.
#[derive(Clone)]
pub struct SuperColumnFamily {
    family: FamilyHandle,
}

impl std::fmt::Debug for SuperColumnFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperColumnFamily")
            .field("def", &self.family.def)
            .field("config", &self.family.config)
            .finish_non_exhaustive()
    }
}

impl SuperColumnFamily {
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

    /// The same family, scanning `size` super columns (or sub-columns) per
    /// fetch.
    #[must_use]
    pub fn with_page_size(&self, size: i64) -> Self {
        Self::new(self.family.with_column_page_size(size))
    }

    #[must_use]
    pub fn with_row_key_page_size(&self, size: i64) -> Self {
        Self::new(self.family.with_row_key_page_size(size))
    }

    /// Handle to one row. Does not touch the store.
    ///
    /// # Errors
    ///
    /// [`ClientError::Codec`] if `key` is not of the row-key type.
    pub fn row(&self, key: impl Into<Value>) -> Result<SuperRow, ClientError> {
        let key = key.into();
        let raw = encode(&key, self.family.def.row_key_type)?;
        Ok(SuperRow {
            family: self.family.clone(),
            key,
            raw,
        })
    }

    /// Lists every row key.
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

/// One row of a super column family.
#[derive(Clone)]
pub struct SuperRow {
    family: FamilyHandle,
    key: Value,
    raw: Vec<u8>,
}

impl std::fmt::Debug for SuperRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperRow")
            .field("family", &self.family.name())
            .field("key", &self.key)
            .finish()
    }
}

impl SuperRow {
    #[must_use]
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// Handle to one super column of this row. Does not touch the store.
    ///
    /// # Errors
    ///
    /// [`ClientError::Codec`] if `name` is not of the column-key type.
    pub fn super_column(&self, name: impl Into<Value>) -> Result<SuperColumn, ClientError> {
        let name = name.into();
        let raw = encode(&name, self.family.def.column_key_type)?;
        Ok(SuperColumn {
            row_key: self.key.clone(),
            name,
            scope: ColumnScope::new(self.family.clone(), self.raw.clone(), Some(raw)),
        })
    }

    /// Lazily lists every super column name.
    ///
    /// # Errors
    ///
    /// Invalid page configuration.
    pub fn super_column_names(&self) -> Result<BoxCursor<'static, Value>, ClientError> {
        self.names(ScanRange::all())
    }

    /// Lazily lists the super column names in `[start, finish]`.
    ///
    /// # Errors
    ///
    /// Mistyped bounds or invalid page configuration.
    pub fn super_column_names_between(
        &self,
        start: impl Into<Value>,
        finish: impl Into<Value>,
    ) -> Result<BoxCursor<'static, Value>, ClientError> {
        self.names(ScanRange::between(Some(start.into()), Some(finish.into())))
    }

    /// # Errors
    ///
    /// Store failures.
    pub fn super_column_count(&self) -> Result<usize, ClientError> {
        Ok(self
            .family
            .store
            .count(RowPath::row(self.family.name(), &self.raw))?)
    }

    /// Opens a paged scan over the row's super columns, each with all its
    /// sub-columns.
    ///
    /// # Errors
    ///
    /// Mistyped fixed bounds or invalid page configuration.
    pub fn scan(
        &self,
        range: ScanRange<Value>,
    ) -> Result<BoxCursor<'static, SuperColumnSlice>, ClientError> {
        check_range(&range, self.family.def.column_key_type)?;
        let fetcher = SuperSliceFetcher::new(
            Arc::clone(&self.family.store),
            Arc::clone(&self.family.def),
            self.raw.clone(),
        );
        open_scan(&self.family, fetcher, range)
    }

    fn names(&self, range: ScanRange<Value>) -> Result<BoxCursor<'static, Value>, ClientError> {
        Ok(self.scan(range)?.transform(|sc| sc.name).boxed())
    }
}

/// One super column: a named, ordered set of sub-columns within a row.
#[derive(Clone)]
pub struct SuperColumn {
    row_key: Value,
    name: Value,
    scope: ColumnScope,
}

impl std::fmt::Debug for SuperColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperColumn")
            .field("row_key", &self.row_key)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl SuperColumn {
    #[must_use]
    pub fn row_key(&self) -> &Value {
        &self.row_key
    }

    #[must_use]
    pub fn name(&self) -> &Value {
        &self.name
    }

    /// Writes a sub-column.
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

    /// Deletes a sub-column of this super column.
    ///
    /// # Errors
    ///
    /// [`ClientError::CounterNotAllowed`] on counter families; codec or
    /// store failures.
    pub fn delete_column(&self, name: impl Into<Value>) -> Result<(), ClientError> {
        self.scope.delete_column(&name.into())
    }

    /// Adds `delta` to a counter sub-column.
    ///
    /// # Errors
    ///
    /// [`ClientError::CounterRequired`] unless the family holds counters.
    pub fn increment_counter(&self, name: impl Into<Value>, delta: i64) -> Result<(), ClientError> {
        self.scope.increment_counter(&name.into(), delta)
    }

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

    /// # Errors
    ///
    /// Any fetch failure while paging.
    pub fn columns(&self) -> Result<BTreeMap<Value, Value>, ClientError> {
        self.scope.columns(None, None)
    }

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

    /// # Errors
    ///
    /// Invalid page configuration.
    pub fn column_names(&self) -> Result<BoxCursor<'static, Value>, ClientError> {
        self.scope.column_names(None, None)
    }

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

    /// Opens a paged scan over the sub-columns.
    ///
    /// # Errors
    ///
    /// Mistyped fixed bounds or invalid page configuration.
    pub fn scan(&self, range: ScanRange<Value>) -> Result<BoxCursor<'static, Column>, ClientError> {
        self.scope.scan(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ColumnStore, MemoryStore};
    use crate::types::ValueType;

    fn family(value_type: ValueType) -> SuperColumnFamily {
        let store = Arc::new(MemoryStore::new());
        let def = ColumnFamilyDef::super_family(
            "scf",
            ValueType::Utf8,
            ValueType::Long,
            ValueType::Utf8,
            value_type,
        )
        .unwrap();
        store.create_family(&def).unwrap();
        SuperColumnFamily::new(FamilyHandle {
            store,
            def: Arc::new(def),
            config: ClientConfig::default(),
        })
    }

    #[test]
    fn sub_columns_are_scoped_to_their_super_column() {
        let scf = family(ValueType::Utf8);
        let row = scf.row("r").unwrap();
        row.super_column(1_i64).unwrap().insert_column("a", "x").unwrap();
        row.super_column(2_i64).unwrap().insert_column("a", "y").unwrap();
        row.super_column(2_i64).unwrap().insert_column("b", "z").unwrap();

        let two = row.super_column(2_i64).unwrap();
        assert_eq!(two.column("a").unwrap(), Some(Value::from("y")));
        assert_eq!(two.column_count().unwrap(), 2);
        assert_eq!(row.super_column_count().unwrap(), 2);

        two.delete_column("a").unwrap();
        assert_eq!(two.column("a").unwrap(), None);
        assert_eq!(
            row.super_column(1_i64).unwrap().column("a").unwrap(),
            Some(Value::from("x"))
        );
    }

    #[test]
    fn delete_column_removes_only_that_sub_column() {
        let scf = family(ValueType::Utf8);
        let row = scf.row("r").unwrap();
        let sc = row.super_column(7_i64).unwrap();
        sc.insert_column("a", "x").unwrap();
        sc.insert_column("b", "y").unwrap();

        sc.delete_column("a").unwrap();

        assert_eq!(sc.column("b").unwrap(), Some(Value::from("y")));
        assert_eq!(sc.column_names().unwrap().try_collect_vec().unwrap(), vec![Value::from("b")]);
        assert_eq!(
            row.super_column_names().unwrap().try_collect_vec().unwrap(),
            vec![Value::Long(7)]
        );
    }

    #[test]
    fn super_column_names_page_through_the_row() {
        let scf = family(ValueType::Counter).with_page_size(3);
        let row = scf.row("r").unwrap();
        for n in 0..10_i64 {
            row.super_column(n).unwrap().increment_counter("hits", n).unwrap();
        }
        let names = row.super_column_names().unwrap().try_collect_vec().unwrap();
        assert_eq!(names, (0..10_i64).map(Value::Long).collect::<Vec<_>>());

        let between = row
            .super_column_names_between(3_i64, 5_i64)
            .unwrap()
            .try_collect_vec()
            .unwrap();
        assert_eq!(between, vec![Value::Long(3), Value::Long(4), Value::Long(5)]);
    }

    #[test]
    fn scan_carries_sub_columns() {
        let scf = family(ValueType::Counter);
        let row = scf.row("r").unwrap();
        let sc = row.super_column(7_i64).unwrap();
        sc.increment_counter("a", 1).unwrap();
        sc.increment_counter("b", 2).unwrap();

        let slices = row.scan(ScanRange::all()).unwrap().try_collect_vec().unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].name, Value::Long(7));
        assert_eq!(slices[0].columns.len(), 2);
        assert_eq!(sc.columns().unwrap()[&Value::from("b")], Value::Long(2));
    }

    #[test]
    fn super_column_names_must_match_the_column_key_type() {
        let scf = family(ValueType::Utf8);
        let row = scf.row("r").unwrap();
        assert!(matches!(row.super_column("x"), Err(ClientError::Codec(_))));
        assert!(matches!(
            row.super_column_names_between("a", "b"),
            Err(ClientError::Codec(_))
        ));
    }

    #[test]
    fn counter_rules_apply_to_sub_columns() {
        let plain = family(ValueType::Utf8);
        let sc = plain.row("r").unwrap().super_column(1_i64).unwrap();
        assert!(matches!(
            sc.increment_counter("a", 1),
            Err(ClientError::CounterRequired(_))
        ));

        let counters = family(ValueType::Counter);
        let sc = counters.row("r").unwrap().super_column(1_i64).unwrap();
        assert!(matches!(
            sc.insert_column("a", 1_i64),
            Err(ClientError::CounterNotAllowed(_))
        ));
    }
}
