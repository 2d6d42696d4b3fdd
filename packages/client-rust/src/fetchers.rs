//! Fetchers binding cursors to a [`ColumnStore`].
//!
//! Each fetcher encodes the cursor's typed bounds, issues exactly one store
//! query and decodes the answer. Decoding failures are reported as fetch
//! failures.

use std::sync::Arc;

use anyhow::Context;
use widerow_core::{Batch, KeyRangeFetcher, RangeFetcher};

use crate::codec::{decode, encode_bound};
use crate::error::CodecError;
use crate::schema::ColumnFamilyDef;
use crate::store::{CellValue, ColumnStore, RawColumn, RowPath, SliceQuery};
use crate::types::{Column, SuperColumnSlice, Value, ValueType};

fn decode_column(
    raw: RawColumn,
    key_type: ValueType,
    value_type: ValueType,
) -> Result<Column, CodecError> {
    let value = match raw.value {
        CellValue::Bytes(bytes) => decode(&bytes, value_type)?,
        CellValue::Counter(n) => Value::Long(n),
    };
    Ok(Column {
        name: decode(&raw.name, key_type)?,
        value,
    })
}

fn decode_columns(
    raw: Vec<RawColumn>,
    key_type: ValueType,
    value_type: ValueType,
) -> Result<Vec<Column>, CodecError> {
    raw.into_iter()
        .map(|c| decode_column(c, key_type, value_type))
        .collect()
}

/// Slices the columns of one row, or the sub-columns of one super column.
pub struct ColumnSliceFetcher {
    store: Arc<dyn ColumnStore>,
    def: Arc<ColumnFamilyDef>,
    row: Vec<u8>,
    super_column: Option<Vec<u8>>,
}

impl ColumnSliceFetcher {
    #[must_use]
    pub fn new(
        store: Arc<dyn ColumnStore>,
        def: Arc<ColumnFamilyDef>,
        row: Vec<u8>,
        super_column: Option<Vec<u8>>,
    ) -> Self {
        Self {
            store,
            def,
            row,
            super_column,
        }
    }
}

impl RangeFetcher for ColumnSliceFetcher {
    type Entry = Column;

    fn fetch(
        &mut self,
        start: Option<&Value>,
        finish: Option<&Value>,
        reversed: bool,
        limit: usize,
    ) -> anyhow::Result<Batch<Column>> {
        let key_type = self.def.leaf_key_type();
        let start = encode_bound(start, key_type)?;
        let finish = encode_bound(finish, key_type)?;
        let path = RowPath {
            family: &self.def.name,
            row: &self.row,
            super_column: self.super_column.as_deref(),
        };
        let query = SliceQuery {
            start: start.as_deref(),
            finish: finish.as_deref(),
            reversed,
            limit,
        };
        let batch = self
            .store
            .get_slice(path, query)
            .with_context(|| format!("column slice on {}", self.def.name))?;
        match batch {
            Some(raw) => Ok(Some(decode_columns(raw, key_type, self.def.value_type)?)),
            None => Ok(None),
        }
    }
}

/// Slices the super columns of one row of a super family.
pub struct SuperSliceFetcher {
    store: Arc<dyn ColumnStore>,
    def: Arc<ColumnFamilyDef>,
    row: Vec<u8>,
}

impl SuperSliceFetcher {
    #[must_use]
    pub fn new(store: Arc<dyn ColumnStore>, def: Arc<ColumnFamilyDef>, row: Vec<u8>) -> Self {
        Self { store, def, row }
    }
}

impl RangeFetcher for SuperSliceFetcher {
    type Entry = SuperColumnSlice;

    fn fetch(
        &mut self,
        start: Option<&Value>,
        finish: Option<&Value>,
        reversed: bool,
        limit: usize,
    ) -> anyhow::Result<Batch<SuperColumnSlice>> {
        let name_type = self.def.column_key_type;
        let start = encode_bound(start, name_type)?;
        let finish = encode_bound(finish, name_type)?;
        let query = SliceQuery {
            start: start.as_deref(),
            finish: finish.as_deref(),
            reversed,
            limit,
        };
        let Some(raw) = self
            .store
            .get_super_slice(&self.def.name, &self.row, query)
            .with_context(|| format!("super column slice on {}", self.def.name))?
        else {
            return Ok(None);
        };

        let sub_type = self.def.leaf_key_type();
        let supers = raw
            .into_iter()
            .map(|sc| -> Result<SuperColumnSlice, CodecError> {
                Ok(SuperColumnSlice {
                    name: decode(&sc.name, name_type)?,
                    columns: decode_columns(sc.columns, sub_type, self.def.value_type)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(supers))
    }
}

/// Lists the row keys of one family.
pub struct RowKeyFetcher {
    store: Arc<dyn ColumnStore>,
    def: Arc<ColumnFamilyDef>,
}

impl RowKeyFetcher {
    #[must_use]
    pub fn new(store: Arc<dyn ColumnStore>, def: Arc<ColumnFamilyDef>) -> Self {
        Self { store, def }
    }
}

impl KeyRangeFetcher for RowKeyFetcher {
    type Key = Value;

    fn fetch_keys(
        &mut self,
        start: Option<&Value>,
        end: Option<&Value>,
        limit: usize,
    ) -> anyhow::Result<Batch<Value>> {
        let key_type = self.def.row_key_type;
        let start = encode_bound(start, key_type)?;
        let end = encode_bound(end, key_type)?;
        let Some(raw) = self
            .store
            .get_row_keys(&self.def.name, start.as_deref(), end.as_deref(), limit)
            .with_context(|| format!("row key range on {}", self.def.name))?
        else {
            return Ok(None);
        };
        let keys = raw
            .iter()
            .map(|key| decode(key, key_type))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, Arc<ColumnFamilyDef>) {
        let store = Arc::new(MemoryStore::new());
        let def = Arc::new(
            ColumnFamilyDef::standard("cf", ValueType::Utf8, ValueType::Integer, ValueType::Long)
                .unwrap(),
        );
        store.create_family(&def).unwrap();
        for n in [-5, 0, 7, 12] {
            store
                .insert(
                    RowPath::row("cf", b"r"),
                    &encode(&Value::Integer(n), ValueType::Integer).unwrap(),
                    encode(&Value::Long(i64::from(n) * 2), ValueType::Long).unwrap(),
                )
                .unwrap();
        }
        (store, def)
    }

    #[test]
    fn column_slices_are_decoded() {
        let (store, def) = setup();
        let mut fetcher = ColumnSliceFetcher::new(store, def, b"r".to_vec(), None);
        let batch = fetcher
            .fetch(Some(&Value::Integer(-5)), Some(&Value::Integer(7)), false, 10)
            .unwrap()
            .unwrap();
        let names: Vec<Value> = batch.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec![Value::Integer(-5), Value::Integer(0), Value::Integer(7)]);
        assert_eq!(batch[2].value, Value::Long(14));
    }

    #[test]
    fn missing_row_is_absent() {
        let (store, def) = setup();
        let mut fetcher = ColumnSliceFetcher::new(store, def, b"other".to_vec(), None);
        assert!(fetcher.fetch(None, None, false, 10).unwrap().is_none());
    }

    #[test]
    fn mistyped_bound_fails_the_fetch() {
        let (store, def) = setup();
        let mut fetcher = ColumnSliceFetcher::new(store, def, b"r".to_vec(), None);
        let err = fetcher.fetch(Some(&Value::from("a")), None, false, 10).unwrap_err();
        assert!(err.downcast_ref::<CodecError>().is_some());
    }

    #[test]
    fn store_failures_carry_context() {
        let (store, def) = setup();
        store.set_offline(true);
        let mut fetcher = ColumnSliceFetcher::new(store, def, b"r".to_vec(), None);
        let err = fetcher.fetch(None, None, false, 10).unwrap_err();
        assert_eq!(format!("{err:#}"), "column slice on cf: store unavailable");
    }

    #[test]
    fn row_keys_are_decoded() {
        let (store, def) = setup();
        let mut fetcher = RowKeyFetcher::new(store, def);
        assert_eq!(
            fetcher.fetch_keys(None, None, 10).unwrap(),
            Some(vec![Value::from("r")])
        );
    }

    #[test]
    fn super_slices_decode_names_and_sub_columns() {
        let store = Arc::new(MemoryStore::new());
        let def = Arc::new(
            ColumnFamilyDef::super_family(
                "scf",
                ValueType::Utf8,
                ValueType::Long,
                ValueType::Utf8,
                ValueType::Counter,
            )
            .unwrap(),
        );
        store.create_family(&def).unwrap();
        let sc = encode(&Value::Long(3), ValueType::Long).unwrap();
        store
            .increment(RowPath::super_column("scf", b"r", &sc), b"hits", 4)
            .unwrap();

        let mut fetcher = SuperSliceFetcher::new(store, def, b"r".to_vec());
        let batch = fetcher.fetch(None, None, false, 10).unwrap().unwrap();
        assert_eq!(
            batch,
            vec![SuperColumnSlice {
                name: Value::Long(3),
                columns: vec![Column {
                    name: "hits".into(),
                    value: Value::Long(4),
                }],
            }]
        );
    }
}
