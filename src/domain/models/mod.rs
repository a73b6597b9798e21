//! Domain models for the outreach governor.

pub mod config;
pub mod quota;
pub mod safety;
pub mod task;

pub use config::{
    BehaviorConfig, BulkConfig, Config, DatabaseConfig, LoggingConfig, QuotaConfig, RetryConfig,
    SafetyConfig, SchedulerConfig, TimeWindowConfig,
};
pub use quota::{day_key, hour_key, ActionType, QuotaProfile, QuotaSummary, WindowCounters};
pub use safety::{
    AlertSeverity, JailAssessment, RestrictionSignal, SafetyAlert, SafetyMetrics,
};
pub use task::{OutreachTask, TaskStatus, TaskType};
