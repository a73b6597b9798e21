//! SQLite implementation of the TaskRepository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{OutreachTask, TaskStatus, TaskType};
use crate::domain::ports::{TaskCounts, TaskFilters, TaskRepository};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert(&self, task: &OutreachTask) -> DomainResult<()> {
        let metadata_json = serde_json::to_string(&task.metadata)?;

        sqlx::query(
            r#"INSERT INTO tasks (id, contact_id, campaign_id, task_type, scheduled_at,
               status, retry_count, max_retries, metadata, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(task.id.to_string())
        .bind(task.contact_id.to_string())
        .bind(task.campaign_id.to_string())
        .bind(task.task_type.as_str())
        .bind(task.scheduled_at.to_rfc3339())
        .bind(task.status.as_str())
        .bind(task.retry_count as i64)
        .bind(task.max_retries as i64)
        .bind(&metadata_json)
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<OutreachTask>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(OutreachTask::try_from).transpose()
    }

    async fn update(&self, task: &OutreachTask) -> DomainResult<()> {
        let metadata_json = serde_json::to_string(&task.metadata)?;

        let result = sqlx::query(
            r#"UPDATE tasks SET contact_id = ?, campaign_id = ?, task_type = ?,
               scheduled_at = ?, status = ?, retry_count = ?, max_retries = ?,
               metadata = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(task.contact_id.to_string())
        .bind(task.campaign_id.to_string())
        .bind(task.task_type.as_str())
        .bind(task.scheduled_at.to_rfc3339())
        .bind(task.status.as_str())
        .bind(task.retry_count as i64)
        .bind(task.max_retries as i64)
        .bind(&metadata_json)
        .bind(task.updated_at.to_rfc3339())
        .bind(task.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TaskNotFound(task.id));
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TaskNotFound(id));
        }

        Ok(())
    }

    async fn list(&self, filters: TaskFilters) -> DomainResult<Vec<OutreachTask>> {
        let mut query = String::from("SELECT * FROM tasks WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(status) = &filters.status {
            query.push_str(" AND status = ?");
            bindings.push(status.as_str().to_string());
        }
        if let Some(contact_id) = &filters.contact_id {
            query.push_str(" AND contact_id = ?");
            bindings.push(contact_id.to_string());
        }
        if let Some(campaign_id) = &filters.campaign_id {
            query.push_str(" AND campaign_id = ?");
            bindings.push(campaign_id.to_string());
        }

        query.push_str(" ORDER BY created_at DESC");

        if let Some(limit) = filters.limit {
            query.push_str(&format!(" LIMIT {limit}"));
        }

        let mut q = sqlx::query_as::<_, TaskRow>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<TaskRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(OutreachTask::try_from).collect()
    }

    async fn get_due(&self, now: DateTime<Utc>) -> DomainResult<Vec<OutreachTask>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE status = 'pending' AND scheduled_at <= ?
             ORDER BY scheduled_at",
        )
        .bind(now.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OutreachTask::try_from).collect()
    }

    async fn get_requeueable(&self, now: DateTime<Utc>) -> DomainResult<Vec<OutreachTask>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE status = 'retrying' AND scheduled_at <= ?
             ORDER BY scheduled_at",
        )
        .bind(now.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OutreachTask::try_from).collect()
    }

    async fn delete_terminal_older_than(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query(
            "DELETE FROM tasks
             WHERE status IN ('completed', 'failed', 'cancelled') AND updated_at < ?",
        )
        .bind(cutoff.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn counts(&self) -> DomainResult<TaskCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM tasks GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = TaskCounts::default();
        for (status, count) in rows {
            counts.total += count;
            match TaskStatus::from_str(&status) {
                Some(TaskStatus::Pending) => counts.pending = count,
                Some(TaskStatus::Running) => counts.running = count,
                Some(TaskStatus::Completed) => counts.completed = count,
                Some(TaskStatus::Failed) => counts.failed = count,
                Some(TaskStatus::Retrying) => counts.retrying = count,
                Some(TaskStatus::Cancelled) => counts.cancelled = count,
                None => {}
            }
        }
        Ok(counts)
    }
}

/// Row from the `tasks` table.
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    contact_id: String,
    campaign_id: String,
    task_type: String,
    scheduled_at: String,
    status: String,
    retry_count: i64,
    max_retries: i64,
    metadata: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TaskRow> for OutreachTask {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let metadata: HashMap<String, serde_json::Value> = serde_json::from_str(&row.metadata)?;

        Ok(Self {
            id: parse_uuid(&row.id)?,
            contact_id: parse_uuid(&row.contact_id)?,
            campaign_id: parse_uuid(&row.campaign_id)?,
            task_type: TaskType::from_str(&row.task_type).ok_or_else(|| {
                DomainError::ValidationFailed(format!("unknown task type: {}", row.task_type))
            })?,
            scheduled_at: parse_datetime(&row.scheduled_at)?,
            status: TaskStatus::from_str(&row.status).ok_or_else(|| {
                DomainError::ValidationFailed(format!("unknown status: {}", row.status))
            })?,
            retry_count: u32::try_from(row.retry_count).unwrap_or(0),
            max_retries: u32::try_from(row.max_retries).unwrap_or(0),
            metadata,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

fn parse_uuid(s: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DomainError::ValidationFailed(format!("invalid uuid: {e}")))
}

fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::ValidationFailed(format!("invalid timestamp: {e}")))
}
