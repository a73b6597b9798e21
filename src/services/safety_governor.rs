//! Adaptive safety governor.
//!
//! Tracks rejection metrics, enforces aggregate action caps, gates
//! actions on local time windows, and interprets restriction signals
//! reported by the page inspector. All platform awareness enters
//! through typed `RestrictionSignal`s; this module never parses page
//! text.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AlertSeverity, JailAssessment, QuotaConfig, RestrictionSignal, SafetyAlert, SafetyConfig,
    SafetyMetrics,
};
use crate::domain::ports::{
    PageSignalInspector, PageSnapshot, SafetySnapshot, SafetyStateRepository,
};
use crate::services::quota_tracker::QuotaTracker;
use crate::services::time_window::TimeWindowGate;

/// Recent-alert query window.
const ALERT_RECENCY: Duration = Duration::hours(24);

/// Why the composite gate denied an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    LunchBreak,
    WeekendDamping,
    HourlyCapReached,
    DailyCapReached,
    PlatformRestricted,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LunchBreak => "lunch_break",
            Self::WeekendDamping => "weekend_damping",
            Self::HourlyCapReached => "hourly_cap_reached",
            Self::DailyCapReached => "daily_cap_reached",
            Self::PlatformRestricted => "platform_restricted",
        }
    }
}

/// Outcome of the composite action gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Action may proceed. `slow_down` asks the caller to stretch its
    /// inter-action delay.
    Allowed { slow_down: bool },
    /// Action must not proceed. `retry_after` hints when the gate may
    /// reopen, where one is knowable.
    Denied {
        reason: DenialReason,
        retry_after: Option<Duration>,
    },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Coordinates rejection tracking, aggregate caps, time gating, and
/// restriction handling for one account.
pub struct SafetyGovernor {
    safety: SafetyConfig,
    quota: QuotaConfig,
    time_gate: TimeWindowGate,
    tracker: Arc<QuotaTracker>,
    inspector: Arc<dyn PageSignalInspector>,
    repository: Arc<dyn SafetyStateRepository>,
    metrics: RwLock<SafetyMetrics>,
}

impl SafetyGovernor {
    /// Restore governor state from the repository, or start clean.
    /// Aggregate action counts live in the quota tracker; the governor
    /// only owns the rejection metrics and restriction flags.
    pub async fn load(
        safety: SafetyConfig,
        quota: QuotaConfig,
        time_gate: TimeWindowGate,
        tracker: Arc<QuotaTracker>,
        inspector: Arc<dyn PageSignalInspector>,
        repository: Arc<dyn SafetyStateRepository>,
    ) -> DomainResult<Self> {
        let snapshot = repository.load_state().await?.unwrap_or_default();

        Ok(Self {
            safety,
            quota,
            time_gate,
            tracker,
            inspector,
            repository,
            metrics: RwLock::new(snapshot.metrics),
        })
    }

    /// Record one completed action outcome and update the rejection
    /// rate. Crossing the slowdown threshold raises a critical alert
    /// carrying the rate and the underlying counts.
    pub async fn record_action(&self, success: bool, now: DateTime<Utc>) -> DomainResult<()> {
        let crossing = {
            let mut metrics = self.metrics.write().await;
            let was_below = metrics.rejection_rate <= self.safety.rejection_threshold_pct;
            metrics.record(success, now);
            if was_below && metrics.rejection_rate > self.safety.rejection_threshold_pct {
                Some((
                    metrics.rejection_rate,
                    metrics.total_actions,
                    metrics.rejected_actions,
                ))
            } else {
                None
            }
        };

        if let Some((rate, total, rejected)) = crossing {
            warn!(
                rejection_rate = rate,
                total_actions = total,
                rejected_actions = rejected,
                "rejection rate crossed slowdown threshold"
            );
            let alert = SafetyAlert::new(
                AlertSeverity::Critical,
                "rejection rate crossed slowdown threshold",
            )
            .with_details(serde_json::json!({
                "rejection_rate": rate,
                "total_actions": total,
                "rejected_actions": rejected,
            }));
            self.repository.append_alert(&alert).await?;
        }

        Ok(())
    }

    /// Whether the rejection rate currently exceeds the slowdown
    /// threshold.
    pub async fn should_slow_down(&self) -> bool {
        let metrics = self.metrics.read().await;
        metrics.rejection_rate > self.safety.rejection_threshold_pct
    }

    /// Multiplier for inter-action delays: 1.0 normally, stretched in
    /// proportion to the rejection rate once the governor is slowing.
    pub async fn slowdown_factor(&self) -> f64 {
        let metrics = self.metrics.read().await;
        if metrics.rejection_rate > self.safety.rejection_threshold_pct {
            1.0 + metrics.rejection_rate / 100.0
        } else {
            1.0
        }
    }

    /// Random inter-action delay drawn from the configured bounds and
    /// stretched by the slowdown factor.
    pub async fn recommended_delay(&self) -> Duration {
        let base_secs =
            rand::thread_rng().gen_range(self.safety.min_delay_secs..=self.safety.max_delay_secs);
        let factor = self.slowdown_factor().await;

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let secs = (base_secs as f64 * factor) as u64;
        Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }

    /// The composite action gate. Checks run in a fixed order; the
    /// first failure wins: restriction flags, lunch break, weekend
    /// damping, hourly cap, daily cap.
    pub async fn can_perform_action(&self, now: DateTime<Utc>) -> GateDecision {
        // The roll is drawn before the first await so the returned
        // future stays Send.
        let roll = rand::thread_rng().gen::<f64>();
        self.gate(now, roll).await
    }

    /// Gate body with the weekend roll injected for determinism.
    async fn gate(&self, now: DateTime<Utc>, weekend_roll: f64) -> GateDecision {
        {
            let metrics = self.metrics.read().await;
            if metrics.jail_detected || metrics.account_restricted {
                return GateDecision::Denied {
                    reason: DenialReason::PlatformRestricted,
                    retry_after: None,
                };
            }
        }

        if self.time_gate.is_lunch_break(now) {
            return GateDecision::Denied {
                reason: DenialReason::LunchBreak,
                retry_after: Some(self.time_gate.time_until_lunch_end(now)),
            };
        }

        if self.time_gate.is_weekend(now)
            && weekend_roll > self.time_gate.weekend_activity_multiplier()
        {
            return GateDecision::Denied {
                reason: DenialReason::WeekendDamping,
                retry_after: None,
            };
        }

        if self.tracker.hourly_total(now).await >= self.quota.hourly_actions {
            return GateDecision::Denied {
                reason: DenialReason::HourlyCapReached,
                retry_after: Some(self.time_gate.time_until_next_hour(now)),
            };
        }

        if self.tracker.daily_total(now).await >= self.quota.daily_actions {
            return GateDecision::Denied {
                reason: DenialReason::DailyCapReached,
                retry_after: Some(self.time_gate.time_until_next_day(now)),
            };
        }

        GateDecision::Allowed {
            slow_down: self.should_slow_down().await,
        }
    }

    /// Interpret restriction signals from a page snapshot and update
    /// the jail and challenge flags. Bulk work may continue only when
    /// nothing was detected or every signal is survivable.
    pub async fn assess_page(
        &self,
        page: &PageSnapshot,
        now: DateTime<Utc>,
    ) -> DomainResult<JailAssessment> {
        let signals = self.inspector.inspect(page);
        if signals.is_empty() {
            return Ok(JailAssessment {
                jailed: false,
                can_continue: true,
                signals,
            });
        }

        let can_continue = signals.iter().all(RestrictionSignal::is_survivable);

        {
            let mut metrics = self.metrics.write().await;
            for signal in &signals {
                match signal {
                    RestrictionSignal::Challenge { marker } => {
                        metrics.captcha_detected = true;
                        metrics.captcha_last_seen = Some(now);
                        metrics.jail_detected = true;
                        metrics.jail_reason = Some(marker.clone());
                    }
                    RestrictionSignal::Restricted { marker } => {
                        metrics.account_restricted = true;
                        metrics.restriction_reason = Some(marker.clone());
                        metrics.jail_detected = true;
                        metrics.jail_reason = Some(marker.clone());
                    }
                    // A warning halts outbound work until an operator
                    // clears the restriction flags.
                    RestrictionSignal::Warning { marker } => {
                        metrics.jail_detected = true;
                        metrics.jail_reason = Some(marker.clone());
                    }
                    RestrictionSignal::Redirect { url } => {
                        metrics.jail_detected = true;
                        metrics.jail_reason = Some(url.clone());
                    }
                    RestrictionSignal::RateLimited { .. } => {}
                }
            }
        }

        for signal in &signals {
            let severity = if signal.is_survivable() || matches!(signal, RestrictionSignal::Warning { .. }) {
                AlertSeverity::Warning
            } else {
                AlertSeverity::Critical
            };
            let mut alert = SafetyAlert::new(
                severity,
                format!("restriction signal detected: {}", signal.marker()),
            )
            .with_details(serde_json::to_value(signal)?);
            alert.timestamp = now;
            if severity == AlertSeverity::Critical {
                alert = alert.requiring_action();
            }
            self.repository.append_alert(&alert).await?;
        }

        if !can_continue {
            warn!(signal_count = signals.len(), "platform restriction halts bulk work");
        }

        Ok(JailAssessment {
            jailed: true,
            can_continue,
            signals,
        })
    }

    /// Clear the jail and challenge flags after operator intervention.
    pub async fn clear_restrictions(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.jail_detected = false;
        metrics.jail_reason = None;
        metrics.captcha_detected = false;
        metrics.account_restricted = false;
        metrics.restriction_reason = None;
        info!("restriction flags cleared");
    }

    /// Alerts raised within the last 24 hours, newest first.
    pub async fn recent_alerts(&self, now: DateTime<Utc>) -> DomainResult<Vec<SafetyAlert>> {
        self.repository.load_alerts_since(now - ALERT_RECENCY).await
    }

    /// Delete alerts past the retention horizon. Returns the number
    /// removed.
    pub async fn prune_alerts(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let cutoff = now - Duration::days(self.safety.alert_retention_days);
        self.repository.prune_alerts_before(cutoff).await
    }

    /// Current metrics, cloned.
    pub async fn metrics(&self) -> SafetyMetrics {
        self.metrics.read().await.clone()
    }

    /// Persist the governor state.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> DomainResult<()> {
        let snapshot = SafetySnapshot {
            metrics: self.metrics.read().await.clone(),
            last_saved: Some(now),
        };
        self.repository.save_state(&snapshot).await
    }
}
