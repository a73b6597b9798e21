//! Repository port for task persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{OutreachTask, TaskStatus};

/// Filters for querying tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    pub status: Option<TaskStatus>,
    pub contact_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// Per-status task counts for the status surface.
#[derive(Debug, Clone, Default)]
pub struct TaskCounts {
    pub total: i64,
    pub pending: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
    pub retrying: i64,
    pub cancelled: i64,
}

/// Repository port for task persistence operations.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task.
    async fn insert(&self, task: &OutreachTask) -> DomainResult<()>;

    /// Get a task by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<OutreachTask>>;

    /// Update an existing task.
    async fn update(&self, task: &OutreachTask) -> DomainResult<()>;

    /// Delete a task by ID.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    /// List tasks with optional filters, newest first.
    async fn list(&self, filters: TaskFilters) -> DomainResult<Vec<OutreachTask>>;

    /// Pending tasks with `scheduled_at <= now`, oldest first.
    async fn get_due(&self, now: DateTime<Utc>) -> DomainResult<Vec<OutreachTask>>;

    /// Retrying tasks whose backoff delay has elapsed.
    async fn get_requeueable(&self, now: DateTime<Utc>) -> DomainResult<Vec<OutreachTask>>;

    /// Delete terminal tasks not updated since `cutoff`. Returns the
    /// number deleted.
    async fn delete_terminal_older_than(&self, cutoff: DateTime<Utc>) -> DomainResult<u64>;

    /// Per-status counts.
    async fn counts(&self) -> DomainResult<TaskCounts>;
}
