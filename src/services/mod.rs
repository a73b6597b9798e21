//! Service layer: scheduling, quota, safety, pacing.

pub mod behavior_simulator;
pub mod bulk_runner;
pub mod quota_tracker;
pub mod retry;
pub mod safety_governor;
pub mod scheduler;
pub mod time_window;

pub use behavior_simulator::{BehaviorSimulator, FillerAction};
pub use bulk_runner::{BulkAbort, BulkReport, BulkRunner};
pub use quota_tracker::QuotaTracker;
pub use retry::RetryPolicy;
pub use safety_governor::{DenialReason, GateDecision, SafetyGovernor};
pub use scheduler::{
    BulkStep, ProcessReport, SchedulerSummary, StepResult, TaskOutcome, TaskScheduler,
};
pub use time_window::TimeWindowGate;
