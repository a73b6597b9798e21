mod helpers;

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use cadence::adapters::sqlite::SqliteTaskRepository;
use cadence::domain::errors::{ActionError, ActionErrorKind};
use cadence::domain::models::{BehaviorConfig, BulkConfig, TaskType};
use cadence::domain::ports::TaskRepository;
use cadence::services::{BehaviorSimulator, BulkAbort, BulkRunner, DenialReason};

use helpers::database::{setup_test_db, teardown_test_db};
use helpers::support::{build_scheduler, untimed, Harness};

fn instant_runner(h: &Harness) -> BulkRunner {
    // The harness zeroes the governor's delay bounds, so batches
    // finish instantly under test
    BulkRunner::new(
        BulkConfig { snapshot_every: 2 },
        Arc::clone(&h.scheduler),
        BehaviorSimulator::new(BehaviorConfig {
            profile_visit_probability: 0.0,
            scroll_probability: 0.0,
            pause_probability: 0.0,
            ..BehaviorConfig::default()
        }),
    )
}

async fn queue_tasks(h: &Harness, count: usize) {
    for _ in 0..count {
        h.scheduler
            .schedule(
                Uuid::new_v4(),
                Uuid::new_v4(),
                TaskType::FollowUp,
                0,
                HashMap::new(),
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_batch_drains_queue_and_snapshots() {
    let pool = setup_test_db().await;
    let h = build_scheduler(pool.clone(), untimed).await;
    queue_tasks(&h, 3).await;

    let report = instant_runner(&h).run(10).await.unwrap();
    assert_eq!(report.completed, 3);
    assert!(report.aborted.is_none());

    // The final snapshot persisted quota state
    let summary = h.scheduler.summary().await.unwrap();
    let messages = summary
        .quota
        .iter()
        .find(|s| s.action == cadence::ActionType::Message)
        .unwrap();
    assert_eq!(messages.current, 3);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_batch_respects_action_budget() {
    let pool = setup_test_db().await;
    let h = build_scheduler(pool.clone(), untimed).await;
    queue_tasks(&h, 5).await;

    let report = instant_runner(&h).run(2).await.unwrap();
    assert_eq!(report.completed, 2);
    assert_eq!(h.executor.calls(), 2);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_restriction_page_aborts_batch() {
    let pool = setup_test_db().await;
    let h = build_scheduler(pool.clone(), untimed).await;
    queue_tasks(&h, 3).await;

    // First action succeeds but the page shows a restriction notice
    h.executor
        .push_page("Your account has been restricted", "https://example.com/feed");

    let report = instant_runner(&h).run(10).await.unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.aborted, Some(BulkAbort::PlatformRestricted));
    assert_eq!(h.executor.calls(), 1);

    // Remaining tasks stay queued for after manual review
    let repo = SqliteTaskRepository::new(pool.clone());
    let counts = repo.counts().await.unwrap();
    assert_eq!(counts.pending, 2);

    // And the flags persist into the metrics
    let metrics = h.scheduler.governor().metrics().await;
    assert!(metrics.account_restricted);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_rate_limit_page_does_not_abort() {
    let pool = setup_test_db().await;
    let h = build_scheduler(pool.clone(), untimed).await;
    queue_tasks(&h, 2).await;

    h.executor
        .push_page("Too many requests, try again later", "https://example.com/feed");

    let report = instant_runner(&h).run(10).await.unwrap();
    assert_eq!(report.completed, 2);
    assert!(report.aborted.is_none());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_gate_closure_aborts_batch() {
    let pool = setup_test_db().await;
    let h = build_scheduler(pool.clone(), |config| {
        untimed(config);
        config.quota.hourly_actions = 1;
    })
    .await;
    queue_tasks(&h, 3).await;

    let report = instant_runner(&h).run(10).await.unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(
        report.aborted,
        Some(BulkAbort::GateClosed(DenialReason::HourlyCapReached))
    );

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_failed_action_still_counts_against_budget() {
    let pool = setup_test_db().await;
    let h = build_scheduler(pool.clone(), untimed).await;
    queue_tasks(&h, 2).await;

    h.executor
        .push_err(ActionError::new(ActionErrorKind::Permanent, "bad target"));

    let report = instant_runner(&h).run(10).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.completed, 1);

    let repo = SqliteTaskRepository::new(pool.clone());
    let counts = repo.counts().await.unwrap();
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.pending, 0);

    teardown_test_db(pool).await;
}
