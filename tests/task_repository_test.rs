mod helpers;

use chrono::{Duration, Utc};
use uuid::Uuid;

use cadence::adapters::sqlite::SqliteTaskRepository;
use cadence::domain::models::{OutreachTask, TaskStatus, TaskType};
use cadence::domain::ports::{TaskFilters, TaskRepository};
use cadence::DomainError;

use helpers::database::{setup_test_db, teardown_test_db};

fn task(task_type: TaskType, delay_days: i64) -> OutreachTask {
    OutreachTask::new(Uuid::new_v4(), Uuid::new_v4(), task_type, delay_days)
}

#[tokio::test]
async fn test_insert_and_get_round_trip() {
    let pool = setup_test_db().await;
    let repo = SqliteTaskRepository::new(pool.clone());

    let mut original = task(TaskType::FollowUp, 3);
    original.metadata.insert(
        "template".to_string(),
        serde_json::json!("warm-intro"),
    );
    repo.insert(&original).await.expect("insert failed");

    let fetched = repo
        .get(original.id)
        .await
        .expect("get failed")
        .expect("task missing");
    assert_eq!(fetched.id, original.id);
    assert_eq!(fetched.task_type, TaskType::FollowUp);
    assert_eq!(fetched.status, TaskStatus::Pending);
    assert_eq!(fetched.metadata["template"], serde_json::json!("warm-intro"));

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_get_nonexistent_returns_none() {
    let pool = setup_test_db().await;
    let repo = SqliteTaskRepository::new(pool.clone());

    let result = repo.get(Uuid::new_v4()).await.expect("query failed");
    assert!(result.is_none());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_update_missing_task_errors() {
    let pool = setup_test_db().await;
    let repo = SqliteTaskRepository::new(pool.clone());

    let ghost = task(TaskType::Reminder, 0);
    let err = repo.update(&ghost).await.unwrap_err();
    assert!(matches!(err, DomainError::TaskNotFound(id) if id == ghost.id));

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_due_scan_excludes_future_and_non_pending() {
    let pool = setup_test_db().await;
    let repo = SqliteTaskRepository::new(pool.clone());
    let now = Utc::now();

    let due = task(TaskType::FollowUp, 0);
    let future = task(TaskType::FollowUp, 7);
    let mut cancelled = task(TaskType::Reminder, 0);
    cancelled.transition_to(TaskStatus::Cancelled).unwrap();

    for t in [&due, &future, &cancelled] {
        repo.insert(t).await.unwrap();
    }

    let found = repo.get_due(now + Duration::minutes(1)).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, due.id);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_requeueable_scan_respects_backoff() {
    let pool = setup_test_db().await;
    let repo = SqliteTaskRepository::new(pool.clone());
    let now = Utc::now();

    let mut parked = task(TaskType::FollowUp, 0);
    parked.transition_to(TaskStatus::Running).unwrap();
    parked.mark_retrying(now + Duration::hours(1)).unwrap();
    repo.insert(&parked).await.unwrap();

    // Backoff has not elapsed
    assert!(repo.get_requeueable(now).await.unwrap().is_empty());

    // Backoff elapsed
    let ready = repo
        .get_requeueable(now + Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].id, parked.id);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_list_filters_and_limit() {
    let pool = setup_test_db().await;
    let repo = SqliteTaskRepository::new(pool.clone());

    let contact = Uuid::new_v4();
    for _ in 0..3 {
        let mut t = task(TaskType::FollowUp, 0);
        t.contact_id = contact;
        repo.insert(&t).await.unwrap();
    }
    repo.insert(&task(TaskType::Reminder, 0)).await.unwrap();

    let for_contact = repo
        .list(TaskFilters {
            status: None,
            contact_id: Some(contact),
            campaign_id: None,
            limit: None,
        })
        .await
        .unwrap();
    assert_eq!(for_contact.len(), 3);

    let limited = repo
        .list(TaskFilters {
            status: Some(TaskStatus::Pending),
            contact_id: None,
            campaign_id: None,
            limit: Some(2),
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_retention_delete_only_touches_old_terminal_tasks() {
    let pool = setup_test_db().await;
    let repo = SqliteTaskRepository::new(pool.clone());
    let now = Utc::now();

    let mut old_done = task(TaskType::FollowUp, 0);
    old_done.transition_to(TaskStatus::Running).unwrap();
    old_done.transition_to(TaskStatus::Completed).unwrap();
    old_done.updated_at = now - Duration::days(40);

    let mut fresh_done = task(TaskType::FollowUp, 0);
    fresh_done.transition_to(TaskStatus::Running).unwrap();
    fresh_done.transition_to(TaskStatus::Completed).unwrap();

    let mut old_pending = task(TaskType::Reminder, 0);
    old_pending.updated_at = now - Duration::days(40);

    for t in [&old_done, &fresh_done, &old_pending] {
        repo.insert(t).await.unwrap();
    }

    let deleted = repo
        .delete_terminal_older_than(now - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(repo.get(old_done.id).await.unwrap().is_none());
    assert!(repo.get(fresh_done.id).await.unwrap().is_some());
    assert!(repo.get(old_pending.id).await.unwrap().is_some());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_counts_group_by_status() {
    let pool = setup_test_db().await;
    let repo = SqliteTaskRepository::new(pool.clone());

    repo.insert(&task(TaskType::FollowUp, 0)).await.unwrap();
    repo.insert(&task(TaskType::FollowUp, 0)).await.unwrap();
    let mut done = task(TaskType::Reminder, 0);
    done.transition_to(TaskStatus::Running).unwrap();
    done.transition_to(TaskStatus::Completed).unwrap();
    repo.insert(&done).await.unwrap();

    let counts = repo.counts().await.unwrap();
    assert_eq!(counts.total, 3);
    assert_eq!(counts.pending, 2);
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.failed, 0);

    teardown_test_db(pool).await;
}
