//! Test untouched creates, which re-assert entries a statement did not change.

use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

use crate::e2e_tests::helpers::{Users, handles, insert, user};
use crate::index::{CreateIdxOptions, Index, StatementContext};
use crate::kv::{MemStore, Transaction, UNCOMMIT_INDEX_KV_FLAG};

#[test]
fn test_untouched_entries_are_not_committed() {
    let users = Users::fixture();
    let email = users.email_index();
    let status = users.status_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    let row = user(1, Some("a@x"), "active", "a");
    for index in [&email, &status] {
        let mut values = index.fetch_values(&row, Vec::new()).expect("fetch");
        index
            .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::untouched())
            .expect("Untouched create should succeed");
        let key = ctx.write_bufs.index_key_buf.clone().expect("key buffer kept");
        let value = txn.mem_buffer_get(&key).expect("buffered");
        assert_eq!(value.last(), Some(&UNCOMMIT_INDEX_KV_FLAG));
        assert!(txn.mem_buffer().is_untouched(&key));
    }

    // Visible within the transaction.
    assert_eq!(handles(email.seek_first(&txn).expect("seek")), vec![1]);
    assert_eq!(handles(status.seek_first(&txn).expect("seek")), vec![1]);

    txn.commit().expect("Failed to commit");
    assert!(store.is_empty().expect("is_empty"));
}

#[test]
fn test_untouched_does_not_overwrite_statement_write() {
    let users = Users::fixture();
    let email = users.email_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");

    let row = user(1, Some("a@x"), "active", "a");
    insert(&email, &mut ctx, &mut txn, &row, 1).expect("Insert should succeed");

    let mut values = email.fetch_values(&row, Vec::new()).expect("fetch");
    email
        .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::untouched())
        .expect("Untouched create should succeed");

    txn.commit().expect("Failed to commit");
    assert_eq!(store.len().expect("len"), 1);
}

#[test]
fn test_untouched_skips_uniqueness_check() {
    let users = Users::fixture();
    let email = users.email_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();

    let mut txn = store.begin().expect("Failed to begin");
    insert(&email, &mut ctx, &mut txn, &user(1, Some("a@x"), "active", "a"), 1)
        .expect("Insert should succeed");
    txn.commit().expect("Failed to commit");

    let mut txn = store.begin().expect("Failed to begin");
    let mut values = email
        .fetch_values(&user(1, Some("a@x"), "active", "a"), Vec::new())
        .expect("fetch");
    email
        .create(&mut ctx, &mut txn, &mut values, 1, CreateIdxOptions::untouched())
        .expect("Untouched create should not check uniqueness");
    txn.commit().expect("Failed to commit");

    // The committed entry is left as it was.
    let snapshot = store.snapshot().expect("Failed to snapshot");
    assert_eq!(
        email.exist(&ctx, &snapshot, &mut values, 1).expect("exist"),
        (true, 1)
    );
}

/// Records the name of the span each event was emitted in.
#[derive(Clone, Default)]
struct EventSpans(Arc<Mutex<Vec<Option<String>>>>);

impl<S> Layer<S> for EventSpans
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
        let span = ctx.event_span(event).map(|span| span.name().to_string());
        self.0.lock().expect("lock").push(span);
    }
}

#[test]
fn test_create_runs_inside_span() {
    let users = Users::fixture();
    let status = users.status_index();
    let store = MemStore::new();
    let mut ctx = StatementContext::default();
    let mut txn = store.begin().expect("Failed to begin");
    let mut values = status
        .fetch_values(&user(1, None, "active", "a"), Vec::new())
        .expect("fetch");

    let events = EventSpans::default();
    let subscriber = tracing_subscriber::registry().with(events.clone());
    tracing::subscriber::with_default(subscriber, || {
        let span = tracing::debug_span!("statement", id = 1);
        status
            .create(
                &mut ctx,
                &mut txn,
                &mut values,
                1,
                CreateIdxOptions::default().with_span(span),
            )
            .expect("Create should succeed");

        // Outside the span once create returns.
        tracing::debug!("after create");
    });

    let recorded = events.0.lock().expect("lock").clone();
    let (last, during) = recorded.split_last().expect("events recorded");
    assert!(!during.is_empty());
    assert!(during.iter().all(|span| span.as_deref() == Some("statement")));
    assert_eq!(*last, None);
    assert_eq!(txn.mem_buffer().len(), 1);
}
