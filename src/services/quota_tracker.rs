//! Per-action quota tracking over calendar windows.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::models::quota::{day_key, hour_key};
use crate::domain::models::{ActionType, QuotaConfig, QuotaProfile, QuotaSummary};
use crate::domain::ports::QuotaStateRepository;

/// Hour keys older than this are pruned during snapshots.
const HOUR_KEY_RETENTION: Duration = Duration::hours(48);
/// Day keys older than this are pruned during snapshots.
const DAY_KEY_RETENTION: Duration = Duration::days(7);

/// Tracks per-type action counts against daily caps.
///
/// Counters are keyed by local calendar window, so a new hour or day
/// starts at zero without any reset step. The in-memory profile is the
/// authority; the repository only sees it at snapshot time.
pub struct QuotaTracker {
    config: QuotaConfig,
    tz: Tz,
    repository: Arc<dyn QuotaStateRepository>,
    profile: RwLock<QuotaProfile>,
}

impl QuotaTracker {
    /// Load the stored profile for the account, or start fresh.
    pub async fn load(
        config: QuotaConfig,
        tz: Tz,
        account_id: &str,
        repository: Arc<dyn QuotaStateRepository>,
    ) -> DomainResult<Self> {
        let profile = repository
            .load(account_id)
            .await?
            .unwrap_or_else(|| QuotaProfile::new(account_id));

        Ok(Self {
            config,
            tz,
            repository,
            profile: RwLock::new(profile),
        })
    }

    /// Daily cap for one action type.
    pub fn daily_cap(&self, action: ActionType) -> u32 {
        match action {
            ActionType::ConnectionRequest => self.config.daily_connection_requests,
            ActionType::Message => self.config.daily_messages,
            ActionType::ProfileView => self.config.daily_profile_views,
        }
    }

    /// Whether the per-type daily cap still has room at `now`.
    pub async fn can_perform(&self, action: ActionType, now: DateTime<Utc>) -> bool {
        let key = day_key(now, self.tz);
        let profile = self.profile.read().await;
        profile.daily_count(action, &key) < self.daily_cap(action)
    }

    /// Count one performed action in both the hourly and daily window.
    pub async fn record(&self, action: ActionType, now: DateTime<Utc>) {
        let hour = hour_key(now, self.tz);
        let day = day_key(now, self.tz);
        let mut profile = self.profile.write().await;
        profile.record(action, &hour, &day);
        debug!(
            action = action.as_str(),
            daily = profile.daily_count(action, &day),
            "quota recorded"
        );
    }

    /// Total actions of every type recorded in the current hour.
    pub async fn hourly_total(&self, now: DateTime<Utc>) -> u32 {
        let key = hour_key(now, self.tz);
        let profile = self.profile.read().await;
        ActionType::ALL
            .iter()
            .map(|&action| profile.hourly_count(action, &key))
            .sum()
    }

    /// Total actions of every type recorded in the current day.
    pub async fn daily_total(&self, now: DateTime<Utc>) -> u32 {
        let key = day_key(now, self.tz);
        let profile = self.profile.read().await;
        ActionType::ALL
            .iter()
            .map(|&action| profile.daily_count(action, &key))
            .sum()
    }

    /// Remaining daily headroom for one action type.
    pub async fn remaining(&self, action: ActionType, now: DateTime<Utc>) -> u32 {
        let key = day_key(now, self.tz);
        let profile = self.profile.read().await;
        self.daily_cap(action)
            .saturating_sub(profile.daily_count(action, &key))
    }

    /// Read-only usage summary across all action types.
    pub async fn summary(&self, now: DateTime<Utc>) -> Vec<QuotaSummary> {
        let key = day_key(now, self.tz);
        let profile = self.profile.read().await;
        ActionType::ALL
            .iter()
            .map(|&action| {
                let current = profile.daily_count(action, &key);
                let max = self.daily_cap(action);
                QuotaSummary {
                    action,
                    current,
                    max,
                    remaining: max.saturating_sub(current),
                }
            })
            .collect()
    }

    /// Prune stale window keys and persist the profile.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> DomainResult<()> {
        let hour_cutoff = hour_key(now - HOUR_KEY_RETENTION, self.tz);
        let day_cutoff = day_key(now - DAY_KEY_RETENTION, self.tz);
        let mut profile = self.profile.write().await;
        profile.prune(&hour_cutoff, &day_cutoff);
        self.repository.save(&profile).await
    }
}
