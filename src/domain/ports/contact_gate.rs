//! Port for the caller-owned "should we still contact this person" check.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;

/// Re-validates a task's target just before execution. Opt-out flags,
/// contact status, and campaign membership are owned by the collaborator;
/// the scheduler only asks yes or no.
#[async_trait]
pub trait ContactGate: Send + Sync {
    async fn should_contact(&self, contact_id: Uuid) -> DomainResult<bool>;
}

/// Gate that approves every contact. Useful for tests and for callers
/// that filter before scheduling.
#[derive(Debug, Clone, Default)]
pub struct AllowAllContacts;

#[async_trait]
impl ContactGate for AllowAllContacts {
    async fn should_contact(&self, _contact_id: Uuid) -> DomainResult<bool> {
        Ok(true)
    }
}
