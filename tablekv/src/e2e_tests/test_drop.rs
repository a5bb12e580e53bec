//! Test dropping every entry of one index.

use crate::e2e_tests::helpers::{Users, handles, insert, user};
use crate::index::{Index, StatementContext};
use crate::kv::MemStore;

#[test]
fn test_drop_removes_only_this_index() {
    let users = Users::fixture();
    let email = users.email_index();
    let status = users.status_index();
    let name = users.name_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();

    let mut txn = store.begin().expect("Failed to begin");
    for handle in 1..=4 {
        let row = user(handle, Some(format!("u{handle}@x").as_str()), "active", "name");
        for index in [&email, &status, &name] {
            insert(index, &mut ctx, &mut txn, &row, handle).expect("Insert should succeed");
        }
    }
    txn.commit().expect("Failed to commit");
    assert_eq!(store.len().expect("len"), 12);

    let mut txn = store.begin().expect("Failed to begin");
    assert_eq!(status.drop_all(&mut txn).expect("Drop should succeed"), 4);

    let mut it = status.seek_first(&txn).expect("Failed to seek");
    assert!(it.next_step().expect("next").is_end());
    assert_eq!(handles(email.seek_first(&txn).expect("seek")), vec![1, 2, 3, 4]);
    assert_eq!(handles(name.seek_first(&txn).expect("seek")), vec![1, 2, 3, 4]);

    txn.commit().expect("Failed to commit");
    assert_eq!(store.len().expect("len"), 8);
}

#[test]
fn test_drop_includes_buffered_entries() {
    let users = Users::fixture();
    let status = users.status_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();

    let mut txn = store.begin().expect("Failed to begin");
    insert(&status, &mut ctx, &mut txn, &user(1, None, "active", "a"), 1)
        .expect("Insert should succeed");
    txn.commit().expect("Failed to commit");

    let mut txn = store.begin().expect("Failed to begin");
    insert(&status, &mut ctx, &mut txn, &user(2, None, "banned", "b"), 2)
        .expect("Insert should succeed");
    assert_eq!(status.drop_all(&mut txn).expect("Drop should succeed"), 2);
    txn.commit().expect("Failed to commit");

    assert!(store.is_empty().expect("is_empty"));
}

#[test]
fn test_drop_empty_index() {
    let users = Users::fixture();
    let status = users.status_index();
    let store = MemStore::new();

    let mut txn = store.begin().expect("Failed to begin");
    assert_eq!(status.drop_all(&mut txn).expect("Drop should succeed"), 0);
    assert!(txn.mem_buffer().is_empty());
}
