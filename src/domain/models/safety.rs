//! Safety domain model: rejection metrics, alerts, and platform
//! restriction signals.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate action metrics driving adaptive slowdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyMetrics {
    /// Total actions recorded.
    pub total_actions: u64,
    /// Actions the platform rejected.
    pub rejected_actions: u64,
    /// Derived rate in percent: `rejected / total * 100`, 0 when total = 0.
    pub rejection_rate: f64,
    /// When the most recent action was recorded.
    pub last_action_at: Option<DateTime<Utc>>,
    /// Platform lockout detected.
    pub jail_detected: bool,
    /// What triggered the lockout flag.
    pub jail_reason: Option<String>,
    /// Challenge page detected.
    pub captcha_detected: bool,
    /// When a challenge was last seen.
    pub captcha_last_seen: Option<DateTime<Utc>>,
    /// Account-level restriction detected.
    pub account_restricted: bool,
    /// What triggered the restriction flag.
    pub restriction_reason: Option<String>,
}

impl SafetyMetrics {
    /// Record one action outcome and recompute the rejection rate.
    pub fn record(&mut self, success: bool, now: DateTime<Utc>) {
        self.total_actions += 1;
        if !success {
            self.rejected_actions += 1;
        }
        self.rejection_rate = if self.total_actions == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.rejected_actions as f64 / self.total_actions as f64 * 100.0
            }
        };
        self.last_action_at = Some(now);
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// An append-only safety alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyAlert {
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Arbitrary structured payload (rates, counts, signal text).
    pub details: serde_json::Value,
    /// Whether an operator must intervene before bulk work resumes.
    pub requires_action: bool,
}

impl SafetyAlert {
    pub fn new(severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            timestamp: Utc::now(),
            details: serde_json::Value::Null,
            requires_action: false,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn requiring_action(mut self) -> Self {
        self.requires_action = true;
        self
    }

    /// Whether this alert falls within the recent-query window.
    pub fn is_recent(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.timestamp) <= window
    }
}

/// Typed restriction signal extracted from collaborator-supplied page
/// state. Produced by a `PageSignalInspector`; the governor never parses
/// page text itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionSignal {
    /// Soft warning banner about unusual activity.
    Warning { marker: String },
    /// Platform is rate limiting requests. Survivable: bulk work may
    /// continue at reduced pace.
    RateLimited { marker: String },
    /// Account restriction or suspension notice.
    Restricted { marker: String },
    /// A challenge (CAPTCHA) page was served.
    Challenge { marker: String },
    /// Redirect to a checkpoint/login URL.
    Redirect { url: String },
}

impl RestrictionSignal {
    /// The text fragment or URL that triggered this signal.
    pub fn marker(&self) -> &str {
        match self {
            Self::Warning { marker }
            | Self::RateLimited { marker }
            | Self::Restricted { marker }
            | Self::Challenge { marker } => marker,
            Self::Redirect { url } => url,
        }
    }

    /// Rate limiting alone does not halt bulk operations.
    pub fn is_survivable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Result of evaluating restriction signals against the current state.
#[derive(Debug, Clone)]
pub struct JailAssessment {
    /// Whether any restriction signal was present.
    pub jailed: bool,
    /// Whether bulk operations may continue.
    pub can_continue: bool,
    /// Signals that contributed to the assessment.
    pub signals: Vec<RestrictionSignal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_rate_recomputes() {
        let mut m = SafetyMetrics::default();
        assert!((m.rejection_rate - 0.0).abs() < f64::EPSILON);

        m.record(true, Utc::now());
        m.record(false, Utc::now());
        assert_eq!(m.total_actions, 2);
        assert_eq!(m.rejected_actions, 1);
        assert!((m.rejection_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_rejections_is_hundred_percent() {
        let mut m = SafetyMetrics::default();
        for _ in 0..10 {
            m.record(false, Utc::now());
        }
        assert!((m.rejection_rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_alert_recency() {
        let mut alert = SafetyAlert::new(AlertSeverity::Warning, "slow down");
        let now = Utc::now();
        assert!(alert.is_recent(now, Duration::hours(24)));
        alert.timestamp = now - Duration::hours(25);
        assert!(!alert.is_recent(now, Duration::hours(24)));
    }

    #[test]
    fn test_only_rate_limiting_is_survivable() {
        assert!(RestrictionSignal::RateLimited { marker: "too many requests".into() }
            .is_survivable());
        assert!(!RestrictionSignal::Restricted { marker: "account restricted".into() }
            .is_survivable());
        assert!(!RestrictionSignal::Challenge { marker: "verify".into() }.is_survivable());
        assert!(!RestrictionSignal::Redirect { url: "/checkpoint".into() }.is_survivable());
    }
}
