//! Test uniqueness enforcement on a unique index.

use crate::e2e_tests::helpers::{Users, handles, insert, user};
use crate::index::{Index, IndexError, StatementContext};
use crate::kv::{KvError, MemStore};
use crate::types::Datum;

#[test]
fn test_duplicate_email_reports_existing_handle() {
    let users = Users::fixture();
    let index = users.email_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    insert(&index, &mut ctx, &mut txn, &user(1, Some("a@x"), "active", "ann"), 1)
        .expect("First insert should succeed");

    let err = insert(&index, &mut ctx, &mut txn, &user(2, Some("a@x"), "active", "bob"), 2)
        .unwrap_err();
    assert!(matches!(err, IndexError::KeyExists { handle: 1 }));
    assert!(err.is_key_exists());

    // Re-inserting the same row is also a conflict on the checked path.
    let err = insert(&index, &mut ctx, &mut txn, &user(1, Some("a@x"), "active", "ann"), 1)
        .unwrap_err();
    assert!(matches!(err, IndexError::KeyExists { handle: 1 }));

    txn.commit().expect("Failed to commit");
    assert_eq!(store.len().expect("len"), 1);
}

#[test]
fn test_exist_after_commit() {
    let users = Users::fixture();
    let index = users.email_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();

    let mut txn = store.begin().expect("Failed to begin");
    insert(&index, &mut ctx, &mut txn, &user(1, Some("a@x"), "active", "ann"), 1)
        .expect("Insert should succeed");
    txn.commit().expect("Failed to commit");

    let snapshot = store.snapshot().expect("Failed to snapshot");
    let mut values = vec![Datum::from("a@x")];
    assert_eq!(
        index.exist(&ctx, &snapshot, &mut values, 1).expect("exist"),
        (true, 1)
    );

    let err = index.exist(&ctx, &snapshot, &mut values, 2).unwrap_err();
    assert!(matches!(err, IndexError::KeyExists { handle: 1 }));

    let mut values = vec![Datum::from("b@x")];
    assert_eq!(
        index.exist(&ctx, &snapshot, &mut values, 2).expect("exist"),
        (false, 0)
    );
}

#[test]
fn test_null_emails_permit_duplicates() {
    let users = Users::fixture();
    let index = users.email_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    for handle in [3, 1, 2] {
        insert(&index, &mut ctx, &mut txn, &user(handle, None, "active", "x"), handle)
            .expect("NULL insert should succeed");
    }

    let it = index.seek_first(&txn).expect("Failed to seek");
    assert_eq!(handles(it), vec![1, 2, 3]);

    // NULL entries are not distinct, so exist checks by handle.
    let mut values = vec![Datum::Null];
    assert_eq!(
        index.exist(&ctx, &txn, &mut values, 2).expect("exist"),
        (true, 2)
    );
    assert_eq!(
        index.exist(&ctx, &txn, &mut values, 9).expect("exist"),
        (false, 0)
    );
}

#[test]
fn test_committed_entry_blocks_later_transaction() {
    let users = Users::fixture();
    let index = users.email_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();

    let mut txn = store.begin().expect("Failed to begin");
    insert(&index, &mut ctx, &mut txn, &user(1, Some("a@x"), "active", "ann"), 1)
        .expect("Insert should succeed");
    txn.commit().expect("Failed to commit");

    let mut txn = store.begin().expect("Failed to begin");
    let err = insert(&index, &mut ctx, &mut txn, &user(7, Some("a@x"), "active", "eve"), 7)
        .unwrap_err();
    assert!(matches!(err, IndexError::KeyExists { handle: 1 }));
}

#[test]
fn test_concurrent_inserts_conflict_at_commit() {
    let users = Users::fixture();
    let index = users.email_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();

    let mut first = store.begin().expect("Failed to begin");
    let mut second = store.begin().expect("Failed to begin");

    // Neither transaction sees the other's buffered entry.
    insert(&index, &mut ctx, &mut first, &user(1, Some("a@x"), "active", "ann"), 1)
        .expect("Insert should succeed");
    insert(&index, &mut ctx, &mut second, &user(2, Some("a@x"), "active", "bob"), 2)
        .expect("Insert should succeed");

    first.commit().expect("First commit should succeed");
    let err = second.commit().unwrap_err();
    assert!(matches!(err, KvError::WriteConflict { .. }));
}

#[test]
fn test_delete_frees_value() {
    let users = Users::fixture();
    let index = users.email_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    let row = user(1, Some("a@x"), "active", "ann");
    insert(&index, &mut ctx, &mut txn, &row, 1).expect("Insert should succeed");

    let mut values = index.fetch_values(&row, Vec::new()).expect("fetch");
    index
        .delete(&ctx, &mut txn, &mut values, 1)
        .expect("Delete should succeed");

    insert(&index, &mut ctx, &mut txn, &user(2, Some("a@x"), "active", "bob"), 2)
        .expect("Insert after delete should succeed");
    txn.commit().expect("Failed to commit");

    let snapshot = store.snapshot().expect("Failed to snapshot");
    assert_eq!(handles(index.seek_first(&snapshot).expect("seek")), vec![2]);
}
