//! Typed configuration for the governor.
//!
//! Every section is a concrete struct with explicit per-field defaults;
//! validation happens once at load time in the config loader.

use serde::{Deserialize, Serialize};

/// Main configuration structure for Cadence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scheduler cadence and shutdown configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Quota caps per action type
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Safety governor thresholds and delays
    #[serde(default)]
    pub safety: SafetyConfig,

    /// Time-of-day / day-of-week gating
    #[serde(default)]
    pub time_window: TimeWindowConfig,

    /// Human-behavior simulation probabilities
    #[serde(default)]
    pub behavior: BehaviorConfig,

    /// Bulk operation loop pacing
    #[serde(default)]
    pub bulk: BulkConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".cadence/cadence.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for daily-rolling JSON log files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Scheduler cadence configuration.
///
/// The due-task scan is deliberately coarse (hourly): outbound actions
/// against a hostile platform are never safe to run sub-minute, and
/// coarse polling reduces detectable regularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Account identifier the quota profile is tracked under
    #[serde(default = "default_account_id")]
    pub account_id: String,

    /// Cron expression for the due-task scan (seconds field included)
    #[serde(default = "default_poll_schedule")]
    pub poll_schedule: String,

    /// Cron expression for the daily cleanup pass
    #[serde(default = "default_cleanup_schedule")]
    pub cleanup_schedule: String,

    /// IANA timezone for window math and cron evaluation
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Days a terminal task is retained before cleanup deletes it
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Seconds between durable state snapshots
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,

    /// Upper bound on the graceful shutdown sequence, in seconds
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_account_id() -> String {
    "primary".to_string()
}

fn default_poll_schedule() -> String {
    // Top of every hour
    "0 0 * * * *".to_string()
}

fn default_cleanup_schedule() -> String {
    // Local midnight
    "0 0 0 * * *".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

const fn default_retention_days() -> i64 {
    30
}

const fn default_snapshot_interval_secs() -> u64 {
    300
}

const fn default_shutdown_timeout_secs() -> u64 {
    10
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            account_id: default_account_id(),
            poll_schedule: default_poll_schedule(),
            cleanup_schedule: default_cleanup_schedule(),
            timezone: default_timezone(),
            retention_days: default_retention_days(),
            snapshot_interval_secs: default_snapshot_interval_secs(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay before the first retry, in seconds
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,

    /// Whether the delay doubles with each retry
    #[serde(default = "default_exponential_backoff")]
    pub exponential_backoff: bool,

    /// Ceiling on any computed backoff delay, in seconds
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_base_delay_secs() -> u64 {
    3600
}

const fn default_exponential_backoff() -> bool {
    true
}

const fn default_max_delay_secs() -> u64 {
    86_400
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
            exponential_backoff: default_exponential_backoff(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

/// Quota caps per action type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QuotaConfig {
    #[serde(default = "default_daily_connection_requests")]
    pub daily_connection_requests: u32,

    #[serde(default = "default_daily_messages")]
    pub daily_messages: u32,

    #[serde(default = "default_daily_profile_views")]
    pub daily_profile_views: u32,

    /// Hourly cap on total actions across all types
    #[serde(default = "default_hourly_actions")]
    pub hourly_actions: u32,

    /// Daily cap on total actions across all types
    #[serde(default = "default_daily_actions")]
    pub daily_actions: u32,
}

const fn default_daily_connection_requests() -> u32 {
    20
}

const fn default_daily_messages() -> u32 {
    50
}

const fn default_daily_profile_views() -> u32 {
    100
}

const fn default_hourly_actions() -> u32 {
    10
}

const fn default_daily_actions() -> u32 {
    100
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_connection_requests: default_daily_connection_requests(),
            daily_messages: default_daily_messages(),
            daily_profile_views: default_daily_profile_views(),
            hourly_actions: default_hourly_actions(),
            daily_actions: default_daily_actions(),
        }
    }
}

/// Safety governor thresholds and delay bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SafetyConfig {
    /// Rejection-rate percentage above which the governor slows down
    #[serde(default = "default_rejection_threshold_pct")]
    pub rejection_threshold_pct: f64,

    /// Lower bound of the base random inter-action delay, in seconds
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,

    /// Upper bound of the base random inter-action delay, in seconds
    #[serde(default = "default_max_delay_bound_secs")]
    pub max_delay_secs: u64,

    /// Days an alert is retained before pruning
    #[serde(default = "default_alert_retention_days")]
    pub alert_retention_days: i64,
}

const fn default_rejection_threshold_pct() -> f64 {
    30.0
}

const fn default_min_delay_secs() -> u64 {
    30
}

const fn default_max_delay_bound_secs() -> u64 {
    120
}

const fn default_alert_retention_days() -> i64 {
    7
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            rejection_threshold_pct: default_rejection_threshold_pct(),
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_bound_secs(),
            alert_retention_days: default_alert_retention_days(),
        }
    }
}

/// Time-of-day / day-of-week gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeWindowConfig {
    /// Lunch-break blackout start, local hour `[0, 24)`
    #[serde(default = "default_lunch_start_hour")]
    pub lunch_start_hour: u32,

    /// Lunch-break blackout end (exclusive), local hour `[0, 24)`
    #[serde(default = "default_lunch_end_hour")]
    pub lunch_end_hour: u32,

    /// Probability multiplier applied on Saturdays and Sundays
    #[serde(default = "default_weekend_multiplier")]
    pub weekend_activity_multiplier: f64,
}

const fn default_lunch_start_hour() -> u32 {
    12
}

const fn default_lunch_end_hour() -> u32 {
    13
}

const fn default_weekend_multiplier() -> f64 {
    0.5
}

impl Default for TimeWindowConfig {
    fn default() -> Self {
        Self {
            lunch_start_hour: default_lunch_start_hour(),
            lunch_end_hour: default_lunch_end_hour(),
            weekend_activity_multiplier: default_weekend_multiplier(),
        }
    }
}

/// Human-behavior simulation probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BehaviorConfig {
    #[serde(default = "default_profile_visit_probability")]
    pub profile_visit_probability: f64,

    #[serde(default = "default_scroll_probability")]
    pub scroll_probability: f64,

    #[serde(default = "default_pause_probability")]
    pub pause_probability: f64,

    /// Scroll sequence length bounds (inclusive)
    #[serde(default = "default_scroll_steps_min")]
    pub scroll_steps_min: u32,

    #[serde(default = "default_scroll_steps_max")]
    pub scroll_steps_max: u32,

    /// Delay between scroll steps, in seconds (inclusive)
    #[serde(default = "default_scroll_step_delay_min_secs")]
    pub scroll_step_delay_min_secs: u64,

    #[serde(default = "default_scroll_step_delay_max_secs")]
    pub scroll_step_delay_max_secs: u64,

    /// Random pause bounds, in seconds (inclusive)
    #[serde(default = "default_pause_secs_min")]
    pub pause_secs_min: u64,

    #[serde(default = "default_pause_secs_max")]
    pub pause_secs_max: u64,
}

const fn default_profile_visit_probability() -> f64 {
    0.3
}

const fn default_scroll_probability() -> f64 {
    0.4
}

const fn default_pause_probability() -> f64 {
    0.2
}

const fn default_scroll_steps_min() -> u32 {
    3
}

const fn default_scroll_steps_max() -> u32 {
    7
}

const fn default_scroll_step_delay_min_secs() -> u64 {
    1
}

const fn default_scroll_step_delay_max_secs() -> u64 {
    3
}

const fn default_pause_secs_min() -> u64 {
    5
}

const fn default_pause_secs_max() -> u64 {
    15
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            profile_visit_probability: default_profile_visit_probability(),
            scroll_probability: default_scroll_probability(),
            pause_probability: default_pause_probability(),
            scroll_steps_min: default_scroll_steps_min(),
            scroll_steps_max: default_scroll_steps_max(),
            scroll_step_delay_min_secs: default_scroll_step_delay_min_secs(),
            scroll_step_delay_max_secs: default_scroll_step_delay_max_secs(),
            pause_secs_min: default_pause_secs_min(),
            pause_secs_max: default_pause_secs_max(),
        }
    }
}

/// Bulk operation loop pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BulkConfig {
    /// Force a durable snapshot every N executed actions
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: u32,
}

const fn default_snapshot_every() -> u32 {
    5
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            snapshot_every: default_snapshot_every(),
        }
    }
}
