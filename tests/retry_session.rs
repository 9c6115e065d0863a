use curator::catalog::Catalog;
use curator::catalog::retry::{ControllerState, RetryController, RetryPolicy, SessionStatus};
use curator::core::memory_store::{MemoryStore, StoreOp};
use curator::core::store::Table;
use std::time::{Duration, Instant};

fn controller(store: &MemoryStore, policy: RetryPolicy) -> RetryController<&MemoryStore> {
    RetryController::with_policy(Catalog::with_builtin(store), policy)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn three_failures_back_off_at_one_two_four_seconds_then_stop() {
    let store = MemoryStore::new();
    store.fail_on(Table::Categories, StoreOp::Insert, Some("grants"));
    let mut c = controller(&store, RetryPolicy::default());

    let t0 = Instant::now();
    assert_eq!(c.activate(t0), SessionStatus::Errored);

    let mut now = t0;
    let mut delays = Vec::new();
    while let Some(due) = c.next_retry_at() {
        delays.push(due - now);
        // Nothing fires before the deadline.
        assert_eq!(c.poll(due - ms(1)), SessionStatus::Errored);
        assert_eq!(c.next_retry_at(), Some(due));
        now = due;
        c.poll(now);
    }

    assert_eq!(delays, vec![ms(1000), ms(2000), ms(4000)]);
    assert_eq!(c.retry_count(), 3);
    assert_eq!(c.state(), ControllerState::Errored);
    assert!(c.next_retry_at().is_none());
    assert!(c.error().unwrap().contains("Failed to process category grants"));

    // Exhausted: polling far in the future does nothing.
    assert_eq!(c.poll(now + Duration::from_secs(3600)), SessionStatus::Errored);
    assert_eq!(c.retry_count(), 3);
}

#[test]
fn scheduled_retry_recovers_once_store_heals() {
    let store = MemoryStore::new();
    store.fail_on(Table::Achievements, StoreOp::Insert, Some("toolkit_master"));
    let mut c = controller(&store, RetryPolicy::default());

    let t0 = Instant::now();
    assert_eq!(c.activate(t0), SessionStatus::Errored);
    let view = c.view();
    assert!(!view.is_loading);
    assert!(!view.is_verified);
    assert!(view.error.is_some());
    assert_eq!(view.result.as_ref().unwrap().created_count, 10);

    store.clear_faults();
    let status = c.poll(t0 + ms(1000));
    assert_eq!(status, SessionStatus::Verified);

    let view = c.view();
    assert!(view.is_verified);
    assert!(view.error.is_none());
    let result = view.result.unwrap();
    assert!(result.success());
    assert_eq!(result.created_count, 1);
}

#[test]
fn manual_retry_resets_budget_and_bypasses_backoff() {
    let store = MemoryStore::new();
    store.fail_on(Table::Categories, StoreOp::Insert, Some("email"));
    let policy = RetryPolicy {
        max_retries: 1,
        base_delay: ms(50),
    };
    let mut c = controller(&store, policy);

    let t0 = Instant::now();
    c.activate(t0);
    c.poll(t0 + ms(50));
    assert_eq!(c.retry_count(), 1);
    assert!(c.next_retry_at().is_none());

    // Still failing: retry() runs immediately and schedules a fresh backoff.
    let t1 = t0 + ms(60);
    assert_eq!(c.retry(t1), SessionStatus::Errored);
    assert_eq!(c.retry_count(), 1);
    assert_eq!(c.next_retry_at(), Some(t1 + ms(50)));

    store.clear_faults();
    assert_eq!(c.retry(t1 + ms(1)), SessionStatus::Verified);
    assert!(c.next_retry_at().is_none());
    assert_eq!(c.retry_count(), 0);
}

#[test]
fn unreadable_store_forces_reconciliation_attempt() {
    let store = MemoryStore::new();
    store.fail_on(Table::Categories, StoreOp::ListKeys, None);
    let mut c = controller(&store, RetryPolicy::default());

    // Verification cannot read keys, so the pass reconciles anyway and succeeds.
    assert_eq!(c.activate(Instant::now()), SessionStatus::Verified);
    assert_eq!(c.result().unwrap().created_count, 11);
    assert_eq!(store.rows(Table::Categories).len(), 8);
}

#[test]
fn malformed_definition_errors_the_session() {
    let store = MemoryStore::new();
    let mut definition = curator::catalog::definition::CatalogDefinition::builtin();
    definition.categories[0].key = "Email".to_string();
    let mut c = RetryController::with_policy(
        Catalog::new(&store, definition),
        RetryPolicy {
            max_retries: 0,
            base_delay: ms(10),
        },
    );

    assert_eq!(c.activate(Instant::now()), SessionStatus::Errored);
    assert!(c.result().is_none());
    assert!(c.error().unwrap().starts_with("Invalid definition"));
    assert!(c.next_retry_at().is_none());
}

#[test]
fn run_blocking_sleeps_through_short_backoff() {
    let store = MemoryStore::new();
    store.fail_on(Table::Items, StoreOp::Insert, None);
    store.fail_on(Table::Categories, StoreOp::Update, None);
    store.fail_on(Table::Categories, StoreOp::Insert, Some("training"));
    let policy = RetryPolicy {
        max_retries: 2,
        base_delay: ms(5),
    };
    let mut c = controller(&store, policy);

    let started = Instant::now();
    assert_eq!(c.run_blocking(), SessionStatus::Errored);
    assert!(started.elapsed() >= ms(15));
    assert_eq!(c.retry_count(), 2);
    // Seeding failures never show up in the error.
    assert!(!c.error().unwrap().contains("item"));
}
