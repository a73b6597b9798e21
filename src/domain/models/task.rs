//! Outreach task domain model.
//!
//! Tasks are durably queued outbound actions (connection requests,
//! follow-up messages, emails) with retry state. The scheduler consumes
//! them once they come due and all admission gates pass.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a task in the outreach pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is queued, waiting for its scheduled time.
    Pending,
    /// Task is currently being executed.
    Running,
    /// Task completed successfully.
    Completed,
    /// Task failed permanently (retries exhausted or non-retryable).
    Failed,
    /// Task failed transiently and is waiting out its backoff delay.
    Retrying,
    /// Task was cancelled before execution.
    Cancelled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "retrying" => Some(Self::Retrying),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<TaskStatus> {
        match self {
            Self::Pending => vec![Self::Running, Self::Cancelled],
            Self::Running => vec![Self::Completed, Self::Failed, Self::Retrying],
            Self::Retrying => vec![Self::Pending],
            Self::Completed | Self::Failed | Self::Cancelled => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// Kind of outbound action a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Reminder,
    FollowUp,
    ThankYou,
    ValueAdd,
    FinalFollowUp,
    StatusCheck,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::FollowUp => "follow_up",
            Self::ThankYou => "thank_you",
            Self::ValueAdd => "value_add",
            Self::FinalFollowUp => "final_follow_up",
            Self::StatusCheck => "status_check",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reminder" => Some(Self::Reminder),
            "follow_up" | "followup" => Some(Self::FollowUp),
            "thank_you" => Some(Self::ThankYou),
            "value_add" => Some(Self::ValueAdd),
            "final_follow_up" => Some(Self::FinalFollowUp),
            "status_check" => Some(Self::StatusCheck),
            _ => None,
        }
    }

    /// Which quota bucket executing this task consumes.
    pub fn action_type(&self) -> super::quota::ActionType {
        use super::quota::ActionType;
        match self {
            Self::StatusCheck => ActionType::ProfileView,
            Self::Reminder
            | Self::FollowUp
            | Self::ThankYou
            | Self::ValueAdd
            | Self::FinalFollowUp => ActionType::Message,
        }
    }
}

/// A durably queued outbound action with retry state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachTask {
    /// Unique identifier
    pub id: Uuid,
    /// Contact this action targets
    pub contact_id: Uuid,
    /// Campaign the contact belongs to
    pub campaign_id: Uuid,
    /// Kind of outbound action
    pub task_type: TaskType,
    /// When the task becomes due
    pub scheduled_at: DateTime<Utc>,
    /// Current status
    pub status: TaskStatus,
    /// Retry count
    pub retry_count: u32,
    /// Maximum retries
    pub max_retries: u32,
    /// Free-form metadata (message template, channel hints, ...)
    pub metadata: HashMap<String, serde_json::Value>,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl OutreachTask {
    /// Create a new pending task due `delay_days` from now.
    pub fn new(contact_id: Uuid, campaign_id: Uuid, task_type: TaskType, delay_days: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            contact_id,
            campaign_id,
            task_type,
            scheduled_at: now + Duration::days(delay_days),
            status: TaskStatus::default(),
            retry_count: 0,
            max_retries: 3,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set metadata.
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set maximum retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Check if can transition to given status.
    pub fn can_transition_to(&self, new_status: TaskStatus) -> bool {
        self.status.can_transition_to(new_status)
    }

    /// Transition to new status.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> Result<(), String> {
        if !self.can_transition_to(new_status) {
            return Err(format!(
                "Cannot transition from {} to {}",
                self.status.as_str(),
                new_status.as_str()
            ));
        }
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Check if task is terminal.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check if the task is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Pending && self.scheduled_at <= now
    }

    /// Check if another retry attempt is permitted.
    pub fn can_retry(&self) -> bool {
        self.status == TaskStatus::Running && self.retry_count < self.max_retries
    }

    /// Record a transient failure: bump the retry count and park the task
    /// as Retrying until `until`, after which `requeue` moves it back
    /// to Pending.
    pub fn mark_retrying(&mut self, until: DateTime<Utc>) -> Result<(), String> {
        if !self.can_retry() {
            return Err("Cannot retry: not running or max retries reached".to_string());
        }
        self.retry_count += 1;
        self.scheduled_at = until;
        self.transition_to(TaskStatus::Retrying)
    }

    /// Move a Retrying task back to Pending so the next due scan picks it up.
    pub fn requeue(&mut self) -> Result<(), String> {
        self.transition_to(TaskStatus::Pending)
    }

    /// Validate task invariants.
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.status, TaskStatus::Pending | TaskStatus::Retrying)
            && self.retry_count > self.max_retries
        {
            return Err(format!(
                "retry_count {} exceeds max_retries {}",
                self.retry_count, self.max_retries
            ));
        }
        Ok(())
    }
}
