//! Test entries of a non-unique index.

use crate::e2e_tests::helpers::{Users, collect, handles, insert, user};
use crate::index::{Index, IndexStep, StatementContext};
use crate::kv::MemStore;
use crate::types::Datum;

fn active() -> Datum {
    Datum::Bytes(b"active".to_vec())
}

#[test]
fn test_shared_value_sorted_by_handle() {
    let users = Users::fixture();
    let index = users.status_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    insert(&index, &mut ctx, &mut txn, &user(2, Some("b@x"), "active", "bob"), 2)
        .expect("Insert should succeed");
    insert(&index, &mut ctx, &mut txn, &user(1, Some("a@x"), "active", "ann"), 1)
        .expect("Insert should succeed");
    txn.commit().expect("Failed to commit");

    let snapshot = store.snapshot().expect("Failed to snapshot");
    let entries = collect(index.seek_first(&snapshot).expect("Failed to seek"));
    assert_eq!(entries, vec![(vec![active()], 1), (vec![active()], 2)]);
}

#[test]
fn test_values_sorted_before_handles() {
    let users = Users::fixture();
    let index = users.status_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    let rows = [(1, "inactive"), (2, "active"), (3, "banned"), (4, "active")];
    for (handle, status) in rows {
        insert(&index, &mut ctx, &mut txn, &user(handle, None, status, "x"), handle)
            .expect("Insert should succeed");
    }

    assert_eq!(
        handles(index.seek_first(&txn).expect("Failed to seek")),
        vec![2, 4, 3, 1]
    );
}

#[test]
fn test_seek_lands_on_first_entry_for_value() {
    let users = Users::fixture();
    let index = users.status_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    for (handle, status) in [(5, "active"), (6, "inactive"), (7, "inactive")] {
        insert(&index, &mut ctx, &mut txn, &user(handle, None, status, "x"), handle)
            .expect("Insert should succeed");
    }

    // The sought key carries handle 0, so no stored key equals it.
    let mut values = vec![Datum::from("inactive")];
    let (mut it, hit) = index.seek(&ctx, &txn, &mut values).expect("Failed to seek");
    assert!(!hit);
    let IndexStep::Entry { values, handle } = it.next_step().expect("next") else {
        panic!("Expected an entry");
    };
    assert_eq!(values, vec![Datum::Bytes(b"inactive".to_vec())]);
    assert_eq!(handle, 6);
    assert_eq!(handles(it), vec![7]);
}

#[test]
fn test_delete_removes_only_one_row() {
    let users = Users::fixture();
    let index = users.status_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    let first = user(1, None, "active", "ann");
    let second = user(2, None, "active", "bob");
    insert(&index, &mut ctx, &mut txn, &first, 1).expect("Insert should succeed");
    insert(&index, &mut ctx, &mut txn, &second, 2).expect("Insert should succeed");

    let mut values = index.fetch_values(&first, Vec::new()).expect("fetch");
    index
        .delete(&ctx, &mut txn, &mut values, 1)
        .expect("Delete should succeed");

    assert_eq!(handles(index.seek_first(&txn).expect("seek")), vec![2]);
    assert_eq!(
        index.exist(&ctx, &txn, &mut values, 1).expect("exist"),
        (false, 0)
    );
}
