mod helpers;

use chrono::{Duration, Utc};

use cadence::adapters::sqlite::{SqliteQuotaStateRepository, SqliteSafetyStateRepository};
use cadence::domain::models::{ActionType, AlertSeverity, QuotaProfile, SafetyAlert};
use cadence::domain::ports::{QuotaStateRepository, SafetySnapshot, SafetyStateRepository};

use helpers::database::{setup_test_db, teardown_test_db};

#[tokio::test]
async fn test_quota_profile_round_trip() {
    let pool = setup_test_db().await;
    let repo = SqliteQuotaStateRepository::new(pool.clone());

    assert!(repo.load("primary").await.unwrap().is_none());

    let mut profile = QuotaProfile::new("primary");
    profile.record(ActionType::ConnectionRequest, "2026-03-04T09", "2026-03-04");
    profile.record(ActionType::ConnectionRequest, "2026-03-04T09", "2026-03-04");
    profile.record(ActionType::Message, "2026-03-04T10", "2026-03-04");
    repo.save(&profile).await.unwrap();

    let loaded = repo.load("primary").await.unwrap().expect("profile missing");
    assert_eq!(
        loaded.hourly_count(ActionType::ConnectionRequest, "2026-03-04T09"),
        2
    );
    assert_eq!(loaded.daily_count(ActionType::Message, "2026-03-04"), 1);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_quota_save_replaces_prior_counters() {
    let pool = setup_test_db().await;
    let repo = SqliteQuotaStateRepository::new(pool.clone());

    let mut profile = QuotaProfile::new("primary");
    profile.record(ActionType::Message, "2026-03-04T09", "2026-03-04");
    repo.save(&profile).await.unwrap();

    // Prune then save again: the stale row must not survive
    profile.prune("2026-03-05T00", "2026-03-05");
    repo.save(&profile).await.unwrap();

    let loaded = repo.load("primary").await.unwrap().expect("profile missing");
    assert_eq!(loaded.daily_count(ActionType::Message, "2026-03-04"), 0);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_safety_snapshot_round_trip() {
    let pool = setup_test_db().await;
    let repo = SqliteSafetyStateRepository::new(pool.clone());

    assert!(repo.load_state().await.unwrap().is_none());

    let mut snapshot = SafetySnapshot::default();
    snapshot.metrics.total_actions = 12;
    snapshot.metrics.rejected_actions = 4;
    snapshot.metrics.rejection_rate = 33.3;
    snapshot.last_saved = Some(Utc::now());
    repo.save_state(&snapshot).await.unwrap();

    // Singleton row: a second save overwrites
    snapshot.metrics.total_actions = 13;
    repo.save_state(&snapshot).await.unwrap();

    let loaded = repo.load_state().await.unwrap().expect("state missing");
    assert_eq!(loaded.metrics.total_actions, 13);
    assert_eq!(loaded.metrics.rejection_rate, 33.3);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_alert_append_query_prune() {
    let pool = setup_test_db().await;
    let repo = SqliteSafetyStateRepository::new(pool.clone());
    let now = Utc::now();

    let mut old = SafetyAlert::new(AlertSeverity::Info, "old warning");
    old.timestamp = now - Duration::days(10);
    repo.append_alert(&old).await.unwrap();

    let fresh = SafetyAlert::new(AlertSeverity::Critical, "account restricted")
        .with_details(serde_json::json!({ "marker": "restricted" }))
        .requiring_action();
    repo.append_alert(&fresh).await.unwrap();

    let recent = repo
        .load_alerts_since(now - Duration::hours(24))
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].message, "account restricted");
    assert!(recent[0].requires_action);
    assert_eq!(recent[0].details["marker"], serde_json::json!("restricted"));

    let pruned = repo
        .prune_alerts_before(now - Duration::days(7))
        .await
        .unwrap();
    assert_eq!(pruned, 1);
    let all = repo
        .load_alerts_since(now - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(all.len(), 1);

    teardown_test_db(pool).await;
}
