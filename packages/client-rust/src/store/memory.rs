//! In-memory [`ColumnStore`] implementation backed by [`DashMap`].
//!
//! Families are sharded through `DashMap`; rows, super columns and columns
//! are `BTreeMap`s keyed by raw bytes, so slices come out in byte order.
//! Empty rows and super columns are dropped, as a store would after a
//! compaction.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{anyhow, bail};
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::{Ref, RefMut};
use dashmap::DashMap;

use super::{CellValue, ColumnStore, RawColumn, RawSuperColumn, RowPath, SliceQuery};
use crate::schema::ColumnFamilyDef;

type Columns = BTreeMap<Vec<u8>, CellValue>;

#[derive(Debug, Default)]
struct RowData {
    columns: Columns,
    supers: BTreeMap<Vec<u8>, Columns>,
}

impl RowData {
    fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.supers.is_empty()
    }
}

#[derive(Debug)]
struct Family {
    def: ColumnFamilyDef,
    rows: BTreeMap<Vec<u8>, RowData>,
}

/// In-memory wide-column store for one keyspace.
///
/// Counts every read query it serves, and can be switched offline to make
/// every call fail like a lost connection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    families: DashMap<String, Family>,
    queries: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read queries (slices, key ranges, counts) served so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    /// While offline every call fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Definition the family was created with.
    #[must_use]
    pub fn family_def(&self, name: &str) -> Option<ColumnFamilyDef> {
        self.families.get(name).map(|f| f.def.clone())
    }

    fn check_online(&self) -> anyhow::Result<()> {
        if self.offline.load(Ordering::Relaxed) {
            bail!("store unavailable");
        }
        Ok(())
    }

    fn read(&self, name: &str) -> anyhow::Result<Ref<'_, String, Family>> {
        self.check_online()?;
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.families
            .get(name)
            .ok_or_else(|| anyhow!("unknown column family: {name}"))
    }

    fn write(&self, name: &str) -> anyhow::Result<RefMut<'_, String, Family>> {
        self.check_online()?;
        self.families
            .get_mut(name)
            .ok_or_else(|| anyhow!("unknown column family: {name}"))
    }

    /// Applies `f` to the columns at `path`, dropping whatever it leaves
    /// empty.
    fn mutate<R>(
        &self,
        path: RowPath<'_>,
        f: impl FnOnce(&ColumnFamilyDef, &mut Columns) -> anyhow::Result<R>,
    ) -> anyhow::Result<R> {
        let mut family = self.write(path.family)?;
        check_path(&family.def, path)?;
        let family = &mut *family;
        let row = family.rows.entry(path.row.to_vec()).or_default();
        let result = match path.super_column {
            None => f(&family.def, &mut row.columns),
            Some(name) => {
                let columns = row.supers.entry(name.to_vec()).or_default();
                let result = f(&family.def, columns);
                if columns.is_empty() {
                    row.supers.remove(name);
                }
                result
            }
        };
        if row.is_empty() {
            family.rows.remove(path.row);
        }
        result
    }
}

/// Rejects super-column paths on standard families and the reverse.
fn check_path(def: &ColumnFamilyDef, path: RowPath<'_>) -> anyhow::Result<()> {
    match (def.is_super(), path.super_column) {
        (false, Some(_)) => bail!("column family {} has no super columns", def.name),
        (true, None) => bail!("column family {} requires a super column", def.name),
        _ => Ok(()),
    }
}

/// Selects the entries of `map` a slice query asks for, in query order.
fn slice<'m, V>(
    map: &'m BTreeMap<Vec<u8>, V>,
    query: SliceQuery<'_>,
) -> anyhow::Result<Vec<(&'m Vec<u8>, &'m V)>> {
    let (lo, hi) = if query.reversed {
        (query.finish, query.start)
    } else {
        (query.start, query.finish)
    };
    if let (Some(lo), Some(hi)) = (lo, hi) {
        if lo > hi {
            bail!("range finish must come after start in traversal order");
        }
    }
    let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (
        lo.map_or(Bound::Unbounded, Bound::Included),
        hi.map_or(Bound::Unbounded, Bound::Included),
    );
    let range = map.range::<[u8], _>(bounds);
    Ok(if query.reversed {
        range.rev().take(query.limit).collect()
    } else {
        range.take(query.limit).collect()
    })
}

fn raw_columns<'m>(
    entries: impl IntoIterator<Item = (&'m Vec<u8>, &'m CellValue)>,
) -> Vec<RawColumn> {
    entries
        .into_iter()
        .map(|(name, value)| RawColumn {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

impl ColumnStore for MemoryStore {
    fn describe_families(&self) -> anyhow::Result<Vec<String>> {
        self.check_online()?;
        let mut names: Vec<String> = self.families.iter().map(|f| f.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    fn create_family(&self, def: &ColumnFamilyDef) -> anyhow::Result<()> {
        self.check_online()?;
        match self.families.entry(def.name.clone()) {
            Entry::Occupied(_) => bail!("column family {} already exists", def.name),
            Entry::Vacant(slot) => {
                slot.insert(Family {
                    def: def.clone(),
                    rows: BTreeMap::new(),
                });
                tracing::debug!(family = %def.name, "column family created");
                Ok(())
            }
        }
    }

    fn insert(&self, path: RowPath<'_>, column: &[u8], value: Vec<u8>) -> anyhow::Result<()> {
        self.mutate(path, |def, columns| {
            if def.is_counter() {
                bail!("column family {} holds counters", def.name);
            }
            columns.insert(column.to_vec(), CellValue::Bytes(value));
            Ok(())
        })
    }

    fn increment(&self, path: RowPath<'_>, column: &[u8], delta: i64) -> anyhow::Result<()> {
        self.mutate(path, |def, columns| {
            if !def.is_counter() {
                bail!("column family {} does not hold counters", def.name);
            }
            let cell = columns
                .entry(column.to_vec())
                .or_insert(CellValue::Counter(0));
            match cell {
                CellValue::Counter(n) => {
                    *n = n.wrapping_add(delta);
                    Ok(())
                }
                CellValue::Bytes(_) => bail!("column is not a counter"),
            }
        })
    }

    fn delete(&self, path: RowPath<'_>, column: &[u8]) -> anyhow::Result<()> {
        self.mutate(path, |_, columns| {
            columns.remove(column);
            Ok(())
        })
    }

    fn get_slice(
        &self,
        path: RowPath<'_>,
        query: SliceQuery<'_>,
    ) -> anyhow::Result<Option<Vec<RawColumn>>> {
        let family = self.read(path.family)?;
        check_path(&family.def, path)?;
        let Some(row) = family.rows.get(path.row) else {
            return Ok(None);
        };
        let columns = match path.super_column {
            None => &row.columns,
            Some(name) => match row.supers.get(name) {
                Some(columns) => columns,
                None => return Ok(None),
            },
        };
        Ok(Some(raw_columns(slice(columns, query)?)))
    }

    fn get_super_slice(
        &self,
        family: &str,
        row: &[u8],
        query: SliceQuery<'_>,
    ) -> anyhow::Result<Option<Vec<RawSuperColumn>>> {
        let family = self.read(family)?;
        if !family.def.is_super() {
            bail!("column family {} has no super columns", family.def.name);
        }
        let Some(row) = family.rows.get(row) else {
            return Ok(None);
        };
        let supers = slice(&row.supers, query)?
            .into_iter()
            .map(|(name, columns)| RawSuperColumn {
                name: name.clone(),
                columns: raw_columns(columns),
            })
            .collect();
        Ok(Some(supers))
    }

    fn get_row_keys(
        &self,
        family: &str,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        limit: usize,
    ) -> anyhow::Result<Option<Vec<Vec<u8>>>> {
        let family = self.read(family)?;
        let query = SliceQuery {
            start,
            finish: end,
            reversed: false,
            limit,
        };
        let keys = slice(&family.rows, query)?
            .into_iter()
            .map(|(key, _)| key.clone())
            .collect();
        Ok(Some(keys))
    }

    fn count(&self, path: RowPath<'_>) -> anyhow::Result<usize> {
        let family = self.read(path.family)?;
        let Some(row) = family.rows.get(path.row) else {
            return Ok(0);
        };
        Ok(match (family.def.is_super(), path.super_column) {
            (true, None) => row.supers.len(),
            (true, Some(name)) => row.supers.get(name).map_or(0, BTreeMap::len),
            (false, None) => row.columns.len(),
            (false, Some(_)) => bail!("column family {} has no super columns", family.def.name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_family(
                &ColumnFamilyDef::standard("cf", ValueType::Utf8, ValueType::Utf8, ValueType::Utf8)
                    .unwrap(),
            )
            .unwrap();
        store
            .create_family(
                &ColumnFamilyDef::super_family(
                    "scf",
                    ValueType::Utf8,
                    ValueType::Utf8,
                    ValueType::Utf8,
                    ValueType::Counter,
                )
                .unwrap(),
            )
            .unwrap();
        store
    }

    fn fill(store: &MemoryStore, row: &[u8], names: &[&str]) {
        for name in names {
            store
                .insert(RowPath::row("cf", row), name.as_bytes(), b"v".to_vec())
                .unwrap();
        }
    }

    fn names(columns: Option<Vec<RawColumn>>) -> Vec<String> {
        columns
            .unwrap_or_default()
            .into_iter()
            .map(|c| String::from_utf8(c.name).unwrap())
            .collect()
    }

    fn query<'a>(
        start: Option<&'a str>,
        finish: Option<&'a str>,
        reversed: bool,
        limit: usize,
    ) -> SliceQuery<'a> {
        SliceQuery {
            start: start.map(str::as_bytes),
            finish: finish.map(str::as_bytes),
            reversed,
            limit,
        }
    }

    #[test]
    fn slices_are_inclusive_and_limited() {
        let store = store();
        fill(&store, b"r", &["a", "b", "c", "d", "e"]);
        let path = RowPath::row("cf", b"r");

        let got = store.get_slice(path, query(Some("b"), Some("d"), false, 10)).unwrap();
        assert_eq!(names(got), vec!["b", "c", "d"]);

        let got = store.get_slice(path, query(Some("b"), None, false, 2)).unwrap();
        assert_eq!(names(got), vec!["b", "c"]);
    }

    #[test]
    fn reversed_slices_start_at_the_upper_bound() {
        let store = store();
        fill(&store, b"r", &["a", "b", "c", "d", "e"]);
        let got = store
            .get_slice(RowPath::row("cf", b"r"), query(Some("d"), Some("b"), true, 10))
            .unwrap();
        assert_eq!(names(got), vec!["d", "c", "b"]);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let store = store();
        fill(&store, b"r", &["a"]);
        let err = store
            .get_slice(RowPath::row("cf", b"r"), query(Some("c"), Some("a"), false, 10))
            .unwrap_err();
        assert!(err.to_string().contains("range finish"));
    }

    #[test]
    fn missing_rows_read_as_absent() {
        let store = store();
        assert!(store
            .get_slice(RowPath::row("cf", b"nope"), SliceQuery::all())
            .unwrap()
            .is_none());
        assert_eq!(store.count(RowPath::row("cf", b"nope")).unwrap(), 0);
    }

    #[test]
    fn deleting_the_last_column_drops_the_row() {
        let store = store();
        fill(&store, b"r", &["a"]);
        store.delete(RowPath::row("cf", b"r"), b"a").unwrap();
        let keys = store.get_row_keys("cf", None, None, 10).unwrap().unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn counters_accumulate_in_super_columns() {
        let store = store();
        let path = RowPath::super_column("scf", b"r", b"s1");
        store.increment(path, b"hits", 2).unwrap();
        store.increment(path, b"hits", 3).unwrap();
        let got = store.get_slice(path, SliceQuery::all()).unwrap().unwrap();
        assert_eq!(got[0].value, CellValue::Counter(5));
        assert_eq!(store.count(RowPath::row("scf", b"r")).unwrap(), 1);
        assert_eq!(store.count(path).unwrap(), 1);
    }

    #[test]
    fn super_slices_carry_sub_columns() {
        let store = store();
        for sc in ["s1", "s2", "s3"] {
            store
                .increment(RowPath::super_column("scf", b"r", sc.as_bytes()), b"x", 1)
                .unwrap();
        }
        let got = store
            .get_super_slice("scf", b"r", query(Some("s2"), None, false, 10))
            .unwrap()
            .unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].name, b"s2");
        assert_eq!(got[0].columns.len(), 1);
    }

    #[test]
    fn paths_must_match_family_kind() {
        let store = store();
        assert!(store
            .insert(RowPath::super_column("cf", b"r", b"s"), b"a", vec![])
            .is_err());
        assert!(store.increment(RowPath::row("scf", b"r"), b"a", 1).is_err());
        assert!(store.get_super_slice("cf", b"r", SliceQuery::all()).is_err());
    }

    #[test]
    fn counter_rules_are_enforced() {
        let store = store();
        assert!(store.increment(RowPath::row("cf", b"r"), b"a", 1).is_err());
        assert!(store
            .insert(RowPath::super_column("scf", b"r", b"s"), b"a", vec![1])
            .is_err());
    }

    #[test]
    fn families_are_created_once() {
        let store = store();
        let def = store.family_def("cf").unwrap();
        assert!(store.create_family(&def).is_err());
        assert_eq!(store.describe_families().unwrap(), vec!["cf", "scf"]);
    }

    #[test]
    fn offline_store_fails_every_call() {
        let store = store();
        store.set_offline(true);
        assert!(store.describe_families().is_err());
        assert!(store.get_row_keys("cf", None, None, 1).is_err());
        store.set_offline(false);
        assert!(store.get_row_keys("cf", None, None, 1).is_ok());
    }

    #[test]
    fn reads_are_counted() {
        let store = store();
        fill(&store, b"r", &["a"]);
        let before = store.query_count();
        store.get_slice(RowPath::row("cf", b"r"), SliceQuery::all()).unwrap();
        store.count(RowPath::row("cf", b"r")).unwrap();
        assert_eq!(store.query_count(), before + 2);
    }
}
