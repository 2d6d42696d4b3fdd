//! Column listing against the in-memory store, through the public API.

use std::sync::Arc;

use widerow_client::{
    ClientConfig, ColumnFamily, ColumnStore, Cursor, Keyspace, MemoryStore, Value, ValueType,
};

fn setup() -> (Arc<MemoryStore>, ColumnFamily) {
    let store = Arc::new(MemoryStore::new());
    let keyspace = Keyspace::new(
        "Test",
        Arc::clone(&store) as Arc<dyn ColumnStore>,
        ClientConfig::default(),
    );
    let cf = keyspace
        .add_column_family("cf", ValueType::Utf8, ValueType::Utf8, ValueType::Utf8)
        .unwrap();
    keyspace.sync_schema().unwrap();
    (store, cf)
}

fn names(cursor: widerow_client::BoxCursor<'static, Value>) -> Vec<String> {
    cursor
        .transform(|name| name.as_str().map(str::to_owned).unwrap_or_default())
        .try_collect_vec()
        .unwrap()
}

fn fill(cf: &ColumnFamily, prefix: &str, count: usize) {
    let row = cf.row("A").unwrap();
    for i in 0..count {
        row.insert_column(format!("{prefix}{i:03}"), "").unwrap();
    }
}

#[test]
fn lists_column_names_in_order() {
    let (_, cf) = setup();
    fill(&cf, "a", 10);
    let got = names(cf.row("A").unwrap().column_names().unwrap());
    let expected: Vec<String> = (0..10).map(|i| format!("a{i:03}")).collect();
    assert_eq!(got, expected);
}

#[test]
fn range_covering_everything_lists_everything() {
    let (_, cf) = setup();
    fill(&cf, "b", 10);
    let got = names(cf.row("A").unwrap().column_names_between("a", "c").unwrap());
    let expected: Vec<String> = (0..10).map(|i| format!("b{i:03}")).collect();
    assert_eq!(got, expected);
}

#[test]
fn small_range_is_inclusive_at_both_ends() {
    let (_, cf) = setup();
    fill(&cf, "a", 100);
    let got = names(cf.row("A").unwrap().column_names_between("a010", "a020").unwrap());
    let expected: Vec<String> = (10..=20).map(|i| format!("a{i:03}")).collect();
    assert_eq!(got, expected);
}

#[test]
fn range_between_existing_names_is_empty() {
    let (_, cf) = setup();
    fill(&cf, "a", 10);
    let got = names(cf.row("A").unwrap().column_names_between("a0100", "a0101").unwrap());
    assert!(got.is_empty());
}

#[test]
fn deleting_while_iterating_removes_everything() {
    let (_, cf) = setup();
    let cf = cf.with_page_size(10);
    fill(&cf, "a", 100);
    let row = cf.row("A").unwrap();

    let mut cursor = row.column_names().unwrap();
    let mut seen = 0;
    while cursor.has_more().unwrap() {
        let name = cursor.next_entry().unwrap();
        row.delete_column(name).unwrap();
        seen += 1;
    }

    assert_eq!(seen, 100);
    assert!(names(row.column_names().unwrap()).is_empty());
    assert_eq!(row.column_count().unwrap(), 0);
}

#[test]
fn twenty_three_columns_in_pages_of_ten_take_three_fetches() {
    let (store, cf) = setup();
    let cf = cf.with_page_size(10);
    fill(&cf, "a", 23);

    let before = store.query_count();
    let got = names(cf.row("A").unwrap().column_names().unwrap());
    assert_eq!(got.len(), 23);
    assert_eq!(store.query_count() - before, 3);
}

#[test]
fn columns_between_materializes_values() {
    let (_, cf) = setup();
    let row = cf.row("A").unwrap();
    row.insert_column("x", "1").unwrap();
    row.insert_column("y", "2").unwrap();
    row.insert_column("z", "3").unwrap();

    let columns = row.columns_between("y", "z").unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[&Value::from("y")], Value::from("2"));
    assert_eq!(row.columns().unwrap().len(), 3);
}

#[test]
fn absent_row_reads_as_empty() {
    let (store, cf) = setup();
    let row = cf.row("missing").unwrap();
    let before = store.query_count();
    assert!(row.columns().unwrap().is_empty());
    assert_eq!(store.query_count() - before, 1);
    assert_eq!(row.column("a").unwrap(), None);
}
