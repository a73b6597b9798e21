//! Time-of-day and day-of-week gating.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::domain::models::TimeWindowConfig;

/// Pure local-time gate: lunch-break blackout and weekend damping.
///
/// All checks convert the instant into the account's timezone first, so
/// behavior follows the account's local clock across DST shifts.
#[derive(Debug, Clone)]
pub struct TimeWindowGate {
    config: TimeWindowConfig,
    tz: Tz,
}

impl TimeWindowGate {
    pub fn new(config: TimeWindowConfig, tz: Tz) -> Self {
        Self { config, tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// True while the local hour falls inside the lunch blackout
    /// (start inclusive, end exclusive).
    pub fn is_lunch_break(&self, now: DateTime<Utc>) -> bool {
        let hour = now.with_timezone(&self.tz).hour();
        hour >= self.config.lunch_start_hour && hour < self.config.lunch_end_hour
    }

    /// True on local Saturdays and Sundays.
    pub fn is_weekend(&self, now: DateTime<Utc>) -> bool {
        let weekday = now.with_timezone(&self.tz).weekday();
        weekday.number_from_monday() >= 6
    }

    pub fn weekend_activity_multiplier(&self) -> f64 {
        self.config.weekend_activity_multiplier
    }

    /// How long until the lunch blackout ends. Zero outside the window.
    pub fn time_until_lunch_end(&self, now: DateTime<Utc>) -> Duration {
        if !self.is_lunch_break(now) {
            return Duration::zero();
        }
        let local = now.with_timezone(&self.tz);
        let end = local
            .date_naive()
            .and_hms_opt(self.config.lunch_end_hour, 0, 0)
            .and_then(|naive| self.tz.from_local_datetime(&naive).single());
        match end {
            Some(end) => (end.with_timezone(&Utc) - now).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    /// Time until the next local top-of-hour, when the hourly window
    /// rolls over.
    pub fn time_until_next_hour(&self, now: DateTime<Utc>) -> Duration {
        let local = now.with_timezone(&self.tz);
        let seconds_into_hour = i64::from(local.minute()) * 60 + i64::from(local.second());
        Duration::seconds(3600 - seconds_into_hour)
    }

    /// Time until local midnight, when the daily window rolls over.
    pub fn time_until_next_day(&self, now: DateTime<Utc>) -> Duration {
        let local = now.with_timezone(&self.tz);
        let seconds_into_day = i64::from(local.num_seconds_from_midnight());
        Duration::seconds(86_400 - seconds_into_day)
    }
}
