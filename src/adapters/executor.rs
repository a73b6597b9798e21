//! Dry-run action executor.

use async_trait::async_trait;
use tracing::info;

use crate::domain::errors::ActionError;
use crate::domain::models::OutreachTask;
use crate::domain::ports::{ActionExecutor, ActionOutcome};

/// Executor that logs what it would do and reports success. Used when
/// no real outbound channel is wired in, so queue mechanics, quotas,
/// and pacing can be exercised end to end without sending anything.
#[derive(Debug, Clone, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl ActionExecutor for DryRunExecutor {
    async fn perform(&self, task: &OutreachTask) -> Result<ActionOutcome, ActionError> {
        info!(
            task_id = %task.id,
            contact_id = %task.contact_id,
            task_type = task.task_type.as_str(),
            "dry run: action not sent"
        );
        Ok(ActionOutcome {
            detail: Some("dry-run".to_string()),
            page: None,
        })
    }
}
