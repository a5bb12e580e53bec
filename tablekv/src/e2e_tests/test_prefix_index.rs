//! Test prefix-length indexes on string columns.

use crate::e2e_tests::helpers::{Users, collect, insert, user};
use crate::index::{CreateIdxOptions, Index, SecondaryIndex, StatementContext};
use crate::kv::MemStore;
use crate::model::{Charset, ColumnInfo, IndexColumn, IndexInfo, TableInfo};
use crate::types::Datum;

fn hel() -> Datum {
    Datum::Bytes("hél".as_bytes().to_vec())
}

#[test]
fn test_prefix_truncates_by_character() {
    let users = Users::fixture();
    let index = users.name_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    let row = user(1, None, "active", "héllo");
    let mut values = index.fetch_values(&row, Vec::new()).expect("fetch");
    index
        .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::default())
        .expect("Insert should succeed");

    // Values are truncated in place.
    assert_eq!(values, vec![Datum::from("hél")]);

    let entries = collect(index.seek_first(&txn).expect("seek"));
    assert_eq!(entries, vec![(vec![hel()], 1)]);
}

#[test]
fn test_shared_prefix_keeps_both_rows() {
    let users = Users::fixture();
    let index = users.name_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    insert(&index, &mut ctx, &mut txn, &user(1, None, "active", "héllo"), 1)
        .expect("Insert should succeed");
    insert(&index, &mut ctx, &mut txn, &user(2, None, "active", "hélium"), 2)
        .expect("Insert should succeed");
    insert(&index, &mut ctx, &mut txn, &user(3, None, "active", "hé"), 3)
        .expect("Insert should succeed");

    let entries = collect(index.seek_first(&txn).expect("seek"));
    assert_eq!(
        entries,
        vec![
            (vec![Datum::Bytes("hé".as_bytes().to_vec())], 3),
            (vec![hel()], 1),
            (vec![hel()], 2),
        ]
    );

    // Full values resolve to the truncated entry.
    let mut values = vec![Datum::from("hélium")];
    assert_eq!(
        index.exist(&ctx, &txn, &mut values, 2).expect("exist"),
        (true, 2)
    );
}

#[test]
fn test_unique_prefix_conflicts_on_prefix() {
    let table = TableInfo {
        id: 20,
        name: "tags".to_string(),
        columns: vec![ColumnInfo {
            name: "tag".to_string(),
            offset: 0,
            charset: Charset::Utf8mb4,
        }],
    };
    let info = IndexInfo {
        id: 1,
        name: "uk_tag".to_string(),
        columns: vec![IndexColumn {
            name: "tag".to_string(),
            offset: 0,
            length: Some(4),
        }],
        unique: true,
    };
    let index = SecondaryIndex::new(20, &table, &info);
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    let mut values = vec![Datum::from("rustacean")];
    index
        .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::default())
        .expect("Insert should succeed");

    let mut values = vec![Datum::from("rusty")];
    let err = index
        .create(&mut ctx, &mut txn, &mut values, 2, CreateIdxOptions::default())
        .unwrap_err();
    assert!(err.is_key_exists());
}
