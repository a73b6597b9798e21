//! SQLite implementations of the quota and safety state repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ActionType, AlertSeverity, QuotaProfile, SafetyAlert};
use crate::domain::ports::{
    QuotaStateRepository, SafetySnapshot, SafetyStateRepository,
};

#[derive(Clone)]
pub struct SqliteQuotaStateRepository {
    pool: SqlitePool,
}

impl SqliteQuotaStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotaStateRepository for SqliteQuotaStateRepository {
    async fn load(&self, account_id: &str) -> DomainResult<Option<QuotaProfile>> {
        let rows: Vec<(String, String, String, i64)> = sqlx::query_as(
            "SELECT action_type, window_kind, window_key, count
             FROM quota_counters WHERE account_id = ?",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut profile = QuotaProfile::new(account_id);
        for (action_type, window_kind, window_key, count) in rows {
            let Some(action) = ActionType::from_str(&action_type) else {
                continue;
            };
            let count = u32::try_from(count).unwrap_or(0);
            let counters = profile.counters.entry(action).or_default();
            match window_kind.as_str() {
                "hour" => {
                    counters.hourly.insert(window_key, count);
                }
                "day" => {
                    counters.daily.insert(window_key, count);
                }
                _ => {}
            }
        }
        Ok(Some(profile))
    }

    async fn save(&self, profile: &QuotaProfile) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM quota_counters WHERE account_id = ?")
            .bind(&profile.account_id)
            .execute(&mut *tx)
            .await?;

        for (action, counters) in &profile.counters {
            for (key, count) in &counters.hourly {
                insert_counter(&mut tx, &profile.account_id, action.as_str(), "hour", key, *count)
                    .await?;
            }
            for (key, count) in &counters.daily {
                insert_counter(&mut tx, &profile.account_id, action.as_str(), "day", key, *count)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn insert_counter(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    account_id: &str,
    action_type: &str,
    window_kind: &str,
    window_key: &str,
    count: u32,
) -> DomainResult<()> {
    sqlx::query(
        "INSERT INTO quota_counters (account_id, action_type, window_kind, window_key, count)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(account_id)
    .bind(action_type)
    .bind(window_kind)
    .bind(window_key)
    .bind(i64::from(count))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[derive(Clone)]
pub struct SqliteSafetyStateRepository {
    pool: SqlitePool,
}

impl SqliteSafetyStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SafetyStateRepository for SqliteSafetyStateRepository {
    async fn load_state(&self) -> DomainResult<Option<SafetySnapshot>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT snapshot FROM safety_state WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((json,)) => {
                let snapshot: SafetySnapshot = serde_json::from_str(&json)?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    async fn save_state(&self, snapshot: &SafetySnapshot) -> DomainResult<()> {
        let json = serde_json::to_string(snapshot)?;
        let last_saved = snapshot
            .last_saved
            .unwrap_or_else(Utc::now)
            .to_rfc3339();

        sqlx::query(
            "INSERT INTO safety_state (id, snapshot, last_saved) VALUES (1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET snapshot = excluded.snapshot,
                                           last_saved = excluded.last_saved",
        )
        .bind(&json)
        .bind(&last_saved)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn append_alert(&self, alert: &SafetyAlert) -> DomainResult<()> {
        let details = serde_json::to_string(&alert.details)?;

        sqlx::query(
            "INSERT INTO safety_alerts (severity, message, timestamp, details, requires_action)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(alert.severity.as_str())
        .bind(&alert.message)
        .bind(alert.timestamp.to_rfc3339())
        .bind(&details)
        .bind(alert.requires_action)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_alerts_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<SafetyAlert>> {
        let rows: Vec<AlertRow> = sqlx::query_as(
            "SELECT severity, message, timestamp, details, requires_action
             FROM safety_alerts WHERE timestamp >= ? ORDER BY timestamp DESC",
        )
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SafetyAlert::try_from).collect()
    }

    async fn prune_alerts_before(&self, before: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM safety_alerts WHERE timestamp < ?")
            .bind(before.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct AlertRow {
    severity: String,
    message: String,
    timestamp: String,
    details: String,
    requires_action: bool,
}

impl TryFrom<AlertRow> for SafetyAlert {
    type Error = DomainError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let severity = AlertSeverity::from_str(&row.severity).ok_or_else(|| {
            DomainError::ValidationFailed(format!("unknown severity: {}", row.severity))
        })?;
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DomainError::ValidationFailed(format!("invalid timestamp: {e}")))?;
        let details: serde_json::Value = serde_json::from_str(&row.details)?;

        Ok(Self {
            severity,
            message: row.message,
            timestamp,
            details,
            requires_action: row.requires_action,
        })
    }
}
