//! Repository ports for the durable quota and safety snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::{QuotaProfile, SafetyAlert, SafetyMetrics};

/// Durable snapshot of the safety governor's state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetySnapshot {
    pub metrics: SafetyMetrics,
    pub last_saved: Option<DateTime<Utc>>,
}

/// Persistence port for quota counters.
#[async_trait]
pub trait QuotaStateRepository: Send + Sync {
    /// Load the stored profile for an account, if any.
    async fn load(&self, account_id: &str) -> DomainResult<Option<QuotaProfile>>;

    /// Persist the full profile, replacing prior counters.
    async fn save(&self, profile: &QuotaProfile) -> DomainResult<()>;
}

/// Persistence port for safety metrics and alerts.
#[async_trait]
pub trait SafetyStateRepository: Send + Sync {
    async fn load_state(&self) -> DomainResult<Option<SafetySnapshot>>;

    async fn save_state(&self, snapshot: &SafetySnapshot) -> DomainResult<()>;

    async fn append_alert(&self, alert: &SafetyAlert) -> DomainResult<()>;

    /// Alerts at or after `since`, newest first.
    async fn load_alerts_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<SafetyAlert>>;

    /// Delete alerts older than `before`. Returns the number deleted.
    async fn prune_alerts_before(&self, before: DateTime<Utc>) -> DomainResult<u64>;
}
