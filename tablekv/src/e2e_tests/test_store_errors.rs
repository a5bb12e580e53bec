//! Test that store failures surface unchanged through index operations.

use crate::e2e_tests::helpers::{Users, insert, user};
use crate::index::{Index, IndexError, StatementContext};
use crate::kv::{FaultConfig, KvError, MemStore};
use crate::types::Datum;

fn write_faults() -> FaultConfig {
    FaultConfig {
        read_error_rate: 0.0,
        write_error_rate: 1.0,
    }
}

#[test]
fn test_write_fault_on_create() {
    let users = Users::fixture();
    let status = users.status_index();
    let store = MemStore::with_faults(write_faults(), 1);
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    let err = insert(&status, &mut ctx, &mut txn, &user(1, None, "active", "a"), 1).unwrap_err();
    assert!(matches!(err, IndexError::Store(KvError::Injected { op: "write" })));
    assert!(txn.mem_buffer().is_empty());
}

#[test]
fn test_read_fault_on_unique_check() {
    let users = Users::fixture();
    let email = users.email_index();
    let store = MemStore::with_faults(FaultConfig::always(), 1);
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    let err = insert(&email, &mut ctx, &mut txn, &user(1, Some("a@x"), "active", "a"), 1)
        .unwrap_err();
    assert!(matches!(err, IndexError::Store(KvError::Injected { op: "read" })));
    assert!(!err.is_key_exists());
}

#[test]
fn test_faults_on_reads_and_drop() {
    let users = Users::fixture();
    let email = users.email_index();
    let store = MemStore::with_faults(FaultConfig::always(), 1);
    let ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    let mut values = vec![Datum::from("a@x")];
    assert!(matches!(
        email.exist(&ctx, &txn, &mut values, 1),
        Err(IndexError::Store(KvError::Injected { .. }))
    ));
    assert!(matches!(
        email.seek(&ctx, &txn, &mut values),
        Err(IndexError::Store(KvError::Injected { .. }))
    ));
    assert!(matches!(
        email.drop_all(&mut txn),
        Err(IndexError::Store(KvError::Injected { .. }))
    ));
}

#[test]
fn test_random_faults_are_only_store_errors() {
    let users = Users::fixture();
    let email = users.email_index();
    let config = FaultConfig {
        read_error_rate: 0.3,
        write_error_rate: 0.3,
    };
    let store = MemStore::with_faults(config, 42);
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    let mut failures = 0;
    for handle in 0..100 {
        let row = user(handle, Some(format!("{handle}@x").as_str()), "active", "a");
        match insert(&email, &mut ctx, &mut txn, &row, handle) {
            Ok(()) => {}
            Err(IndexError::Store(KvError::Injected { .. })) => failures += 1,
            Err(e) => panic!("Unexpected error: {e}"),
        }
    }
    assert!(failures > 0);
    assert!(failures < 100);
    assert_eq!(txn.mem_buffer().len(), 100 - failures);
}
