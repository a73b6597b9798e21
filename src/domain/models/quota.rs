//! Quota domain model.
//!
//! Action counts are capped per calendar window (hour and day) in the
//! account's configured timezone. Counters are keyed by the window key
//! itself, so rollover is implicit: a new key starts at zero and stale
//! keys are pruned during snapshots. The day boundary is local midnight.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Kind of counted outbound action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ConnectionRequest,
    Message,
    ProfileView,
}

impl ActionType {
    pub const ALL: [ActionType; 3] = [
        Self::ConnectionRequest,
        Self::Message,
        Self::ProfileView,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionRequest => "connection_request",
            Self::Message => "message",
            Self::ProfileView => "profile_view",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "connection_request" => Some(Self::ConnectionRequest),
            "message" => Some(Self::Message),
            "profile_view" => Some(Self::ProfileView),
            _ => None,
        }
    }
}

/// Format the hourly window key (`YYYY-MM-DDTHH`) for `now` in `tz`.
pub fn hour_key(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format("%Y-%m-%dT%H").to_string()
}

/// Format the daily window key (`YYYY-MM-DD`) for `now` in `tz`.
pub fn day_key(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

/// Per-account window counters for one action type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowCounters {
    /// `YYYY-MM-DDTHH` -> count
    pub hourly: HashMap<String, u32>,
    /// `YYYY-MM-DD` -> count
    pub daily: HashMap<String, u32>,
}

/// Per-account quota state across all action types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaProfile {
    pub account_id: String,
    pub counters: HashMap<ActionType, WindowCounters>,
}

impl QuotaProfile {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            counters: HashMap::new(),
        }
    }

    /// Current count for the given window key, zero for an unseen key.
    pub fn daily_count(&self, action: ActionType, key: &str) -> u32 {
        self.counters
            .get(&action)
            .and_then(|c| c.daily.get(key))
            .copied()
            .unwrap_or(0)
    }

    pub fn hourly_count(&self, action: ActionType, key: &str) -> u32 {
        self.counters
            .get(&action)
            .and_then(|c| c.hourly.get(key))
            .copied()
            .unwrap_or(0)
    }

    /// Increment both window counters for an action. Counters only grow;
    /// rollover happens by keying, never by decrement.
    pub fn record(&mut self, action: ActionType, hour_key: &str, day_key: &str) {
        let counters = self.counters.entry(action).or_default();
        *counters.hourly.entry(hour_key.to_string()).or_insert(0) += 1;
        *counters.daily.entry(day_key.to_string()).or_insert(0) += 1;
    }

    /// Drop window keys lexicographically older than the cutoffs. Window
    /// keys sort chronologically, so string comparison is sufficient.
    pub fn prune(&mut self, hour_cutoff: &str, day_cutoff: &str) {
        for counters in self.counters.values_mut() {
            counters.hourly.retain(|k, _| k.as_str() >= hour_cutoff);
            counters.daily.retain(|k, _| k.as_str() >= day_cutoff);
        }
    }
}

/// Read-only quota summary for one action type.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaSummary {
    pub action: ActionType,
    pub current: u32,
    pub max: u32,
    pub remaining: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_keys_are_timezone_local() {
        // 2026-03-01 02:30 UTC is 2026-02-28 18:30 in Los Angeles
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 2, 30, 0).unwrap();
        let tz: Tz = "America/Los_Angeles".parse().unwrap();
        assert_eq!(day_key(now, tz), "2026-02-28");
        assert_eq!(hour_key(now, tz), "2026-02-28T18");
        assert_eq!(day_key(now, chrono_tz::UTC), "2026-03-01");
    }

    #[test]
    fn test_record_increments_both_windows() {
        let mut profile = QuotaProfile::new("primary");
        profile.record(ActionType::Message, "2026-03-01T10", "2026-03-01");
        profile.record(ActionType::Message, "2026-03-01T10", "2026-03-01");
        profile.record(ActionType::Message, "2026-03-01T11", "2026-03-01");

        assert_eq!(profile.hourly_count(ActionType::Message, "2026-03-01T10"), 2);
        assert_eq!(profile.hourly_count(ActionType::Message, "2026-03-01T11"), 1);
        assert_eq!(profile.daily_count(ActionType::Message, "2026-03-01"), 3);
        // Other actions unaffected
        assert_eq!(profile.daily_count(ActionType::ProfileView, "2026-03-01"), 0);
    }

    #[test]
    fn test_new_key_starts_at_zero() {
        let mut profile = QuotaProfile::new("primary");
        profile.record(ActionType::ConnectionRequest, "2026-03-01T23", "2026-03-01");
        // Next day: fresh key, fresh counter
        assert_eq!(
            profile.daily_count(ActionType::ConnectionRequest, "2026-03-02"),
            0
        );
    }

    #[test]
    fn test_prune_drops_stale_keys() {
        let mut profile = QuotaProfile::new("primary");
        profile.record(ActionType::Message, "2026-02-27T09", "2026-02-27");
        profile.record(ActionType::Message, "2026-03-01T09", "2026-03-01");
        profile.prune("2026-02-28T00", "2026-02-28");

        assert_eq!(profile.daily_count(ActionType::Message, "2026-02-27"), 0);
        assert_eq!(profile.daily_count(ActionType::Message, "2026-03-01"), 1);
    }
}
