//! Domain errors for the Cadence governor.

use thiserror::Error;
use uuid::Uuid;

use super::models::task::TaskStatus;

/// Classification of an action failure, produced at the executor.
///
/// The governor chooses a recovery path from this kind alone; it never
/// inspects error message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionErrorKind {
    /// Network-level failure. Transient.
    Network,
    /// The action timed out. Transient.
    Timeout,
    /// Expected page element was missing. Transient.
    UiNotFound,
    /// The platform actively rejected the action. Transient, but counted
    /// against the rejection rate.
    Rejected,
    /// The action can never succeed (bad target, invalid payload).
    Permanent,
}

impl ActionErrorKind {
    /// Whether this failure is worth retrying under backoff.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Permanent)
    }
}

/// An action failure reported by the executor.
#[derive(Debug, Clone, Error)]
#[error("action failed ({kind:?}): {message}")]
pub struct ActionError {
    pub kind: ActionErrorKind,
    pub message: String,
}

impl ActionError {
    pub fn new(kind: ActionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Domain-level errors that can occur in the governor.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition { from: TaskStatus, to: TaskStatus },

    #[error("Task cannot be retried: retry count {retry_count} reached max retries {max_retries}")]
    MaxRetriesExceeded { retry_count: u32, max_retries: u32 },

    #[error("Task is in terminal state: {0:?}")]
    TaskInTerminalState(TaskStatus),

    #[error("Action failed: {0}")]
    Action(#[from] ActionError),

    #[error("Quota exhausted for {action_type}")]
    QuotaExhausted { action_type: String },

    #[error("Platform restriction detected: {reason}")]
    PlatformRestricted { reason: String },

    #[error("Invalid schedule expression '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
