//! Port to the collaborator that actually performs outbound actions.

use async_trait::async_trait;

use crate::domain::errors::ActionError;
use crate::domain::models::OutreachTask;
use crate::domain::ports::page_inspector::PageSnapshot;

/// Outcome of a successfully performed action.
#[derive(Debug, Clone, Default)]
pub struct ActionOutcome {
    /// Optional collaborator-supplied detail (message id, channel).
    pub detail: Option<String>,
    /// Post-action page state, when the executor captured one. The
    /// bulk runner feeds it to the safety governor for restriction
    /// checks.
    pub page: Option<PageSnapshot>,
}

/// Performs the actual network/browser action for a task.
///
/// Failures must be classified at the origin via [`ActionError`]; the
/// governor never infers recovery from message text.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn perform(&self, task: &OutreachTask) -> Result<ActionOutcome, ActionError>;
}
