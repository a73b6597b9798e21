//! Paced bulk execution over the due queue.
//!
//! Runs due tasks one at a time with human-looking pacing: a filler
//! interlude and a randomized delay between real actions, restriction
//! checks after every action, and a durable snapshot at a fixed
//! action cadence. Aborts the batch the moment continuing stops being
//! safe.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::services::behavior_simulator::{BehaviorSimulator, FillerAction};
use crate::services::safety_governor::DenialReason;
use crate::services::scheduler::{BulkStep, StepResult, TaskOutcome, TaskScheduler};
use crate::domain::models::BulkConfig;

/// Why a batch stopped before reaching its action budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkAbort {
    /// The composite gate closed (time window or aggregate cap).
    GateClosed(DenialReason),
    /// A non-survivable restriction signal was detected.
    PlatformRestricted,
}

/// Tally of one bulk batch.
#[derive(Debug, Clone, Default)]
pub struct BulkReport {
    pub completed: u64,
    pub retried: u64,
    pub failed: u64,
    pub skipped: u64,
    pub aborted: Option<BulkAbort>,
}

impl BulkReport {
    pub fn executed(&self) -> u64 {
        self.completed + self.retried + self.failed
    }
}

pub struct BulkRunner {
    config: BulkConfig,
    scheduler: Arc<TaskScheduler>,
    behavior: BehaviorSimulator,
}

impl BulkRunner {
    pub fn new(
        config: BulkConfig,
        scheduler: Arc<TaskScheduler>,
        behavior: BehaviorSimulator,
    ) -> Self {
        Self {
            config,
            scheduler,
            behavior,
        }
    }

    /// Execute up to `max_actions` due tasks. The batch ends early when
    /// the queue drains, the gate closes, or a restriction halts work.
    /// State is snapshotted every `snapshot_every` actions and once at
    /// the end.
    pub async fn run(&self, max_actions: u64) -> DomainResult<BulkReport> {
        let mut report = BulkReport::default();
        info!(max_actions, "bulk batch starting");

        while report.executed() < max_actions {
            let BulkStep { skipped, result } = self.scheduler.execute_next_due().await?;
            report.skipped += skipped;

            match result {
                StepResult::Drained => break,
                StepResult::GateClosed(reason) => {
                    info!(reason = reason.as_str(), "bulk batch halted by gate");
                    report.aborted = Some(BulkAbort::GateClosed(reason));
                    break;
                }
                StepResult::Executed {
                    task_id,
                    outcome,
                    page,
                } => {
                    match outcome {
                        TaskOutcome::Completed => report.completed += 1,
                        TaskOutcome::Retried => report.retried += 1,
                        TaskOutcome::Failed => report.failed += 1,
                    }

                    if let Some(page) = page {
                        let assessment = self
                            .scheduler
                            .governor()
                            .assess_page(&page, self.scheduler.now())
                            .await?;
                        if !assessment.can_continue {
                            warn!(%task_id, "restriction detected, aborting bulk batch");
                            report.aborted = Some(BulkAbort::PlatformRestricted);
                            break;
                        }
                    }

                    if report.executed() % u64::from(self.config.snapshot_every.max(1)) == 0 {
                        self.scheduler.snapshot().await?;
                    }

                    if report.executed() < max_actions {
                        self.interlude().await;
                    }
                }
            }
        }

        self.scheduler.snapshot().await?;
        info!(
            completed = report.completed,
            retried = report.retried,
            failed = report.failed,
            skipped = report.skipped,
            aborted = ?report.aborted,
            "bulk batch finished"
        );
        Ok(report)
    }

    /// Filler activity plus the governor's randomized inter-action
    /// delay.
    async fn interlude(&self) {
        for action in self.behavior.plan() {
            let secs = action.duration().num_seconds();
            match &action {
                FillerAction::VisitProfile => {
                    info!(secs, "filler: visiting an unrelated profile");
                }
                FillerAction::Scroll { step_delays } => {
                    info!(steps = step_delays.len(), secs, "filler: scrolling the feed");
                    for delay in step_delays {
                        sleep_secs(delay.num_seconds().max(0).unsigned_abs()).await;
                    }
                }
                FillerAction::Pause { .. } => {
                    info!(secs, "filler: pausing");
                    sleep_secs(secs.max(0).unsigned_abs()).await;
                }
            }
        }

        let delay = self.scheduler.governor().recommended_delay().await;
        info!(secs = delay.num_seconds(), "inter-action delay");
        sleep_secs(delay.num_seconds().max(0).unsigned_abs()).await;
    }
}

async fn sleep_secs(secs: u64) {
    tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
}
