//! Test that iteration never leaves an index's key range.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::e2e_tests::helpers::{Users, handles, insert, user};
use crate::index::{Index, SecondaryIndex, StatementContext};
use crate::kv::{MemStore, Mutator};
use crate::tablecodec::encode_table_index_prefix;
use crate::types::Datum;

#[test]
fn test_adjacent_indexes_are_not_visited() {
    let users = Users::fixture();
    let email = users.email_index();
    let status = users.status_index();
    let name = users.name_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut rng = StdRng::seed_from_u64(7);

    let mut txn = store.begin().expect("Failed to begin");
    let mut expected = Vec::new();
    for handle in 0..50 {
        let status_value = ["active", "banned", "inactive"][rng.random_range(0..3)];
        let row = user(handle, Some(format!("{handle}@x").as_str()), status_value, "n");
        for index in [&email, &status, &name] {
            insert(index, &mut ctx, &mut txn, &row, handle).expect("Insert should succeed");
        }
        expected.push((status_value, handle));
    }
    txn.commit().expect("Failed to commit");

    expected.sort_unstable();
    let expected: Vec<_> = expected.into_iter().map(|(_, handle)| handle).collect();

    let snapshot = store.snapshot().expect("Failed to snapshot");
    assert_eq!(handles(status.seek_first(&snapshot).expect("seek")), expected);
    assert_eq!(handles(name.seek_first(&snapshot).expect("seek")).len(), 50);
}

#[test]
fn test_partitions_are_separate_ranges() {
    let users = Users::fixture();
    let p0 = SecondaryIndex::new(100, &users.table, &users.status);
    let p1 = SecondaryIndex::new(101, &users.table, &users.status);
    let store = MemStore::new();
    let mut ctx = StatementContext::default();

    let mut txn = store.begin().expect("Failed to begin");
    insert(&p0, &mut ctx, &mut txn, &user(1, None, "active", "a"), 1)
        .expect("Insert should succeed");
    insert(&p1, &mut ctx, &mut txn, &user(2, None, "active", "b"), 2)
        .expect("Insert should succeed");

    assert_eq!(handles(p0.seek_first(&txn).expect("seek")), vec![1]);
    assert_eq!(handles(p1.seek_first(&txn).expect("seek")), vec![2]);
}

#[test]
fn test_foreign_keys_after_prefix_end_iteration() {
    let users = Users::fixture();
    let status = users.status_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();

    let mut txn = store.begin().expect("Failed to begin");
    insert(&status, &mut ctx, &mut txn, &user(1, None, "active", "a"), 1)
        .expect("Insert should succeed");

    // A key just past the index range, and a record key of the same table.
    let mut next_index = encode_table_index_prefix(users.table.id, users.status.id + 1);
    next_index.push(0);
    txn.set(&next_index, b"x".to_vec()).expect("set");
    txn.set(b"t\x80\x00\x00\x00\x00\x00\x00\x0a_r", b"row".to_vec())
        .expect("set");

    let mut it = status.seek_first(&txn).expect("seek");
    assert!(!it.next_step().expect("next").is_end());
    assert!(it.next_step().expect("next").is_end());
    assert!(it.next_step().expect("next").is_end());

    let mut values = vec![Datum::from("zzz")];
    let (mut it, hit) = status.seek(&ctx, &txn, &mut values).expect("seek");
    assert!(!hit);
    assert!(it.next_step().expect("next").is_end());
}
