//! Cadence - Governed Outreach Scheduler
//!
//! Cadence is a durable scheduler and safety governor for automated
//! outbound actions (connection requests, follow-up messages, emails)
//! against rate-limited professional platforms. It paces actions to
//! stay under quota, adapts to rejection signals, and halts on
//! account-restriction markers.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, ports, and errors
//! - **Service Layer** (`services`): Scheduling, quotas, safety, pacing
//! - **Adapters Layer** (`adapters`): SQLite persistence, page inspection
//! - **Infrastructure Layer** (`infrastructure`): Config and logging
//! - **CLI Layer** (`cli`): Command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{ActionError, ActionErrorKind, DomainError, DomainResult};
pub use domain::models::{
    ActionType, Config, OutreachTask, QuotaProfile, RestrictionSignal, SafetyAlert,
    SafetyMetrics, TaskStatus, TaskType,
};
pub use domain::ports::{
    ActionExecutor, ActionOutcome, Clock, ContactGate, PageSignalInspector, PageSnapshot,
    QuotaStateRepository, SafetyStateRepository, TaskFilters, TaskRepository,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    BehaviorSimulator, BulkRunner, QuotaTracker, RetryPolicy, SafetyGovernor, TaskScheduler,
};
