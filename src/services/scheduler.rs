//! Durable task scheduler.
//!
//! Owns the outreach queue: scheduling, due-scan execution, retry
//! backoff, cancellation, and retention cleanup. Execution is admitted
//! through the safety governor and quota tracker; the actual outbound
//! action is delegated to the `ActionExecutor` port.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{OutreachTask, SchedulerConfig, TaskStatus, TaskType};
use crate::domain::ports::{
    ActionExecutor, Clock, ContactGate, TaskCounts, TaskFilters, TaskRepository,
};
use crate::services::quota_tracker::QuotaTracker;
use crate::services::retry::RetryPolicy;
use crate::services::safety_governor::{DenialReason, GateDecision, SafetyGovernor};

/// Tick granularity of the cron evaluation loops.
const CRON_TICK: StdDuration = StdDuration::from_secs(30);

/// Outcome of one due-scan pass.
#[derive(Debug, Clone, Default)]
pub struct ProcessReport {
    /// Retrying tasks whose backoff elapsed and were requeued.
    pub requeued: u64,
    pub completed: u64,
    pub retried: u64,
    pub failed: u64,
    /// Due tasks skipped for per-type quota exhaustion or opted-out
    /// contacts.
    pub skipped: u64,
    /// Set when the composite gate closed mid-scan; remaining due
    /// tasks stay queued.
    pub halted: Option<DenialReason>,
}

impl ProcessReport {
    pub fn executed(&self) -> u64 {
        self.completed + self.retried + self.failed
    }
}

/// How a single executed task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Retried,
    Failed,
}

/// Result of one step through the due queue.
#[derive(Debug, Clone)]
pub enum StepResult {
    /// No executable due task remained.
    Drained,
    /// The composite gate closed before anything ran.
    GateClosed(DenialReason),
    /// One task executed.
    Executed {
        task_id: Uuid,
        outcome: TaskOutcome,
        page: Option<crate::domain::ports::PageSnapshot>,
    },
}

/// One step through the due queue plus how many tasks were skipped
/// (opted-out contact, exhausted per-type quota) along the way.
#[derive(Debug, Clone)]
pub struct BulkStep {
    pub skipped: u64,
    pub result: StepResult,
}

/// Point-in-time view for the status surface.
#[derive(Debug, Clone)]
pub struct SchedulerSummary {
    pub counts: TaskCounts,
    pub quota: Vec<crate::domain::models::QuotaSummary>,
    pub metrics: crate::domain::models::SafetyMetrics,
    pub recent_alerts: Vec<crate::domain::models::SafetyAlert>,
}

pub struct TaskScheduler {
    config: SchedulerConfig,
    tz: Tz,
    retry_policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    tasks: Arc<dyn TaskRepository>,
    executor: Arc<dyn ActionExecutor>,
    contact_gate: Arc<dyn ContactGate>,
    quota: Arc<QuotaTracker>,
    governor: Arc<SafetyGovernor>,
    running: Arc<AtomicBool>,
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl TaskScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SchedulerConfig,
        retry_policy: RetryPolicy,
        clock: Arc<dyn Clock>,
        tasks: Arc<dyn TaskRepository>,
        executor: Arc<dyn ActionExecutor>,
        contact_gate: Arc<dyn ContactGate>,
        quota: Arc<QuotaTracker>,
        governor: Arc<SafetyGovernor>,
    ) -> DomainResult<Self> {
        let tz: Tz = config
            .timezone
            .parse()
            .map_err(|_| DomainError::InvalidTimezone(config.timezone.clone()))?;
        validate_cron(&config.poll_schedule)?;
        validate_cron(&config.cleanup_schedule)?;

        Ok(Self {
            config,
            tz,
            retry_policy,
            clock,
            tasks,
            executor,
            contact_gate,
            quota,
            governor,
            running: Arc::new(AtomicBool::new(false)),
            handles: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn quota_tracker(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    pub fn governor(&self) -> &Arc<SafetyGovernor> {
        &self.governor
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    pub async fn list_tasks(&self, filters: TaskFilters) -> DomainResult<Vec<OutreachTask>> {
        self.tasks.list(filters).await
    }

    /// Queue a new outreach task due `delay_days` from now.
    pub async fn schedule(
        &self,
        contact_id: Uuid,
        campaign_id: Uuid,
        task_type: TaskType,
        delay_days: i64,
        metadata: std::collections::HashMap<String, serde_json::Value>,
    ) -> DomainResult<OutreachTask> {
        let now = self.clock.now_utc();
        let mut task = OutreachTask::new(contact_id, campaign_id, task_type, delay_days)
            .with_max_retries(self.retry_policy.max_retries())
            .with_metadata(metadata);
        task.scheduled_at = now + Duration::days(delay_days);
        task.created_at = now;
        task.updated_at = now;
        task.validate().map_err(DomainError::ValidationFailed)?;

        self.tasks.insert(&task).await?;
        info!(
            task_id = %task.id,
            task_type = task.task_type.as_str(),
            scheduled_at = %task.scheduled_at,
            "task scheduled"
        );
        Ok(task)
    }

    /// Cancel a pending task. Running and terminal tasks cannot be
    /// cancelled.
    pub async fn cancel(&self, id: Uuid) -> DomainResult<()> {
        let mut task = self
            .tasks
            .get(id)
            .await?
            .ok_or(DomainError::TaskNotFound(id))?;

        if task.is_terminal() {
            return Err(DomainError::TaskInTerminalState(task.status));
        }
        apply_transition(&mut task, TaskStatus::Cancelled)?;
        self.tasks.update(&task).await?;
        info!(task_id = %id, "task cancelled");
        Ok(())
    }

    /// Cancel every pending task targeting a contact. Returns how many
    /// were cancelled.
    pub async fn cancel_all_for_contact(&self, contact_id: Uuid) -> DomainResult<u64> {
        let pending = self
            .tasks
            .list(TaskFilters {
                status: Some(TaskStatus::Pending),
                contact_id: Some(contact_id),
                campaign_id: None,
                limit: None,
            })
            .await?;

        let mut cancelled = 0u64;
        for mut task in pending {
            apply_transition(&mut task, TaskStatus::Cancelled)?;
            self.tasks.update(&task).await?;
            cancelled += 1;
        }
        if cancelled > 0 {
            info!(%contact_id, cancelled, "pending tasks cancelled for contact");
        }
        Ok(cancelled)
    }

    /// One due-scan pass: requeue elapsed retries, then execute due
    /// tasks until the composite gate closes or the queue drains.
    /// Consecutive executions are separated by the governor's
    /// randomized delay so a scan never fires actions back-to-back.
    pub async fn process_due(&self) -> DomainResult<ProcessReport> {
        let mut report = ProcessReport::default();
        let now = self.clock.now_utc();

        for mut task in self.tasks.get_requeueable(now).await? {
            apply_transition(&mut task, TaskStatus::Pending)?;
            self.tasks.update(&task).await?;
            report.requeued += 1;
        }

        let due = self.tasks.get_due(now).await?;
        if due.is_empty() {
            return Ok(report);
        }
        debug!(due = due.len(), "due scan found tasks");

        for task in due {
            let now = self.clock.now_utc();

            if !self.contact_gate.should_contact(task.contact_id).await? {
                debug!(task_id = %task.id, "contact opted out, skipping");
                report.skipped += 1;
                continue;
            }

            match self.governor.can_perform_action(now).await {
                GateDecision::Allowed { slow_down } => {
                    if slow_down {
                        debug!(task_id = %task.id, "executing under slowdown");
                    }
                }
                GateDecision::Denied { reason, retry_after } => {
                    info!(
                        reason = reason.as_str(),
                        retry_after = ?retry_after,
                        "gate closed, halting due scan"
                    );
                    report.halted = Some(reason);
                    break;
                }
            }

            let action = task.task_type.action_type();
            if !self.quota.can_perform(action, now).await {
                debug!(
                    task_id = %task.id,
                    action = action.as_str(),
                    "per-type quota exhausted, leaving task queued"
                );
                report.skipped += 1;
                continue;
            }

            if report.executed() > 0 {
                let delay = self.governor.recommended_delay().await;
                debug!(secs = delay.num_seconds(), "inter-action delay");
                tokio::time::sleep(delay.to_std().unwrap_or_default()).await;
            }

            match self.execute_task(task).await? {
                (TaskOutcome::Completed, _) => report.completed += 1,
                (TaskOutcome::Retried, _) => report.retried += 1,
                (TaskOutcome::Failed, _) => report.failed += 1,
            }
        }

        Ok(report)
    }

    /// Execute at most one due task, scanning past skippable ones.
    /// This is the pacing-free core the bulk runner drives.
    pub async fn execute_next_due(&self) -> DomainResult<BulkStep> {
        let now = self.clock.now_utc();
        let mut skipped = 0u64;

        for task in self.tasks.get_due(now).await? {
            if !self.contact_gate.should_contact(task.contact_id).await? {
                skipped += 1;
                continue;
            }

            if let GateDecision::Denied { reason, .. } =
                self.governor.can_perform_action(now).await
            {
                return Ok(BulkStep {
                    skipped,
                    result: StepResult::GateClosed(reason),
                });
            }

            if !self.quota.can_perform(task.task_type.action_type(), now).await {
                skipped += 1;
                continue;
            }

            let task_id = task.id;
            let (outcome, page) = self.execute_task(task).await?;
            return Ok(BulkStep {
                skipped,
                result: StepResult::Executed {
                    task_id,
                    outcome,
                    page,
                },
            });
        }

        Ok(BulkStep {
            skipped,
            result: StepResult::Drained,
        })
    }

    async fn execute_task(
        &self,
        mut task: OutreachTask,
    ) -> DomainResult<(TaskOutcome, Option<crate::domain::ports::PageSnapshot>)> {
        apply_transition(&mut task, TaskStatus::Running)?;
        self.tasks.update(&task).await?;

        let outcome = self.executor.perform(&task).await;
        let now = self.clock.now_utc();
        let action = task.task_type.action_type();

        match outcome {
            Ok(result) => {
                self.quota.record(action, now).await;
                self.governor.record_action(true, now).await?;
                apply_transition(&mut task, TaskStatus::Completed)?;
                self.tasks.update(&task).await?;
                info!(
                    task_id = %task.id,
                    detail = result.detail.as_deref().unwrap_or(""),
                    "task completed"
                );
                Ok((TaskOutcome::Completed, result.page))
            }
            Err(err) => {
                // A rejection reached the platform: it consumes quota
                // and feeds the rejection rate.
                if err.kind == crate::domain::errors::ActionErrorKind::Rejected {
                    self.quota.record(action, now).await;
                    self.governor.record_action(false, now).await?;
                }

                if err.kind.is_transient() && task.can_retry() {
                    let attempt = task.retry_count + 1;
                    let delay = self.retry_policy.delay_for_attempt(attempt);
                    task.mark_retrying(now + delay)
                        .map_err(DomainError::ValidationFailed)?;
                    self.tasks.update(&task).await?;
                    warn!(
                        task_id = %task.id,
                        attempt,
                        delay_secs = delay.num_seconds(),
                        error = %err,
                        "task failed transiently, retrying"
                    );
                    Ok((TaskOutcome::Retried, None))
                } else {
                    apply_transition(&mut task, TaskStatus::Failed)?;
                    self.tasks.update(&task).await?;
                    error!(task_id = %task.id, error = %err, "task failed permanently");
                    Ok((TaskOutcome::Failed, None))
                }
            }
        }
    }

    /// Retention pass: drop old terminal tasks and stale alerts.
    pub async fn cleanup(&self) -> DomainResult<u64> {
        let now = self.clock.now_utc();
        let cutoff = now - Duration::days(self.config.retention_days);
        let deleted = self.tasks.delete_terminal_older_than(cutoff).await?;
        let pruned = self.governor.prune_alerts(now).await?;
        if deleted > 0 || pruned > 0 {
            info!(deleted, pruned, "cleanup pass finished");
        }
        Ok(deleted)
    }

    /// Persist quota and governor state.
    pub async fn snapshot(&self) -> DomainResult<()> {
        let now = self.clock.now_utc();
        self.quota.snapshot(now).await?;
        self.governor.snapshot(now).await
    }

    /// Point-in-time summary for the status surface.
    pub async fn summary(&self) -> DomainResult<SchedulerSummary> {
        let now = self.clock.now_utc();
        Ok(SchedulerSummary {
            counts: self.tasks.counts().await?,
            quota: self.quota.summary(now).await,
            metrics: self.governor.metrics().await,
            recent_alerts: self.governor.recent_alerts(now).await?,
        })
    }

    /// Start the background loops: cron-driven due scan, cron-driven
    /// cleanup, and the periodic state snapshot.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(
            poll = %self.config.poll_schedule,
            cleanup = %self.config.cleanup_schedule,
            "scheduler loops starting"
        );

        let poll = self.spawn_cron_loop(self.config.poll_schedule.clone(), |s| async move {
            match s.process_due().await {
                Ok(report) => {
                    if report.completed + report.retried + report.failed > 0 {
                        info!(
                            completed = report.completed,
                            retried = report.retried,
                            failed = report.failed,
                            "due scan finished"
                        );
                    }
                }
                Err(e) => error!(error = %e, "due scan failed"),
            }
        });

        let cleanup = self.spawn_cron_loop(self.config.cleanup_schedule.clone(), |s| async move {
            if let Err(e) = s.cleanup().await {
                error!(error = %e, "cleanup pass failed");
            }
        });

        let scheduler = Arc::clone(self);
        let running = Arc::clone(&self.running);
        let snapshot_interval = StdDuration::from_secs(self.config.snapshot_interval_secs);
        let snapshot = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                tokio::time::sleep(snapshot_interval).await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = scheduler.snapshot().await {
                    error!(error = %e, "state snapshot failed");
                }
            }
        });

        let mut handles = match self.handles.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        handles.extend([poll, cleanup, snapshot]);
    }

    fn spawn_cron_loop<F, Fut>(self: &Arc<Self>, expression: String, body: F) -> JoinHandle<()>
    where
        F: Fn(Arc<Self>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let scheduler = Arc::clone(self);
        let running = Arc::clone(&self.running);
        let tz = self.tz;

        tokio::spawn(async move {
            // Validated at construction; a parse failure here means the
            // config changed underneath us, so just stop the loop.
            let Ok(schedule) = cron::Schedule::from_str(&expression) else {
                error!(%expression, "cron expression no longer parses");
                return;
            };
            let mut last_fired = scheduler.clock.now_utc();

            while running.load(Ordering::SeqCst) {
                tokio::time::sleep(CRON_TICK).await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let now = scheduler.clock.now_utc().with_timezone(&tz);
                let reference = last_fired.with_timezone(&tz);
                let fire = schedule
                    .after(&reference)
                    .next()
                    .is_some_and(|next| now >= next);

                if fire {
                    last_fired = scheduler.clock.now_utc();
                    body(Arc::clone(&scheduler)).await;
                }
            }
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the loops, wait for them (bounded by the configured
    /// timeout), and take a final snapshot so no counted action is
    /// lost.
    pub async fn shutdown(&self) -> DomainResult<()> {
        self.running.store(false, Ordering::SeqCst);

        let mut handles: Vec<JoinHandle<()>> = {
            let mut guard = match self.handles.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.drain(..).collect()
        };

        let timeout = StdDuration::from_secs(self.config.shutdown_timeout_secs);
        let all_stopped = futures::future::join_all(handles.iter_mut());
        if tokio::time::timeout(timeout, all_stopped).await.is_err() {
            warn!("background loops did not stop within the shutdown timeout, aborting");
            for handle in &handles {
                handle.abort();
            }
        }

        self.snapshot().await?;
        info!("scheduler shut down");
        Ok(())
    }
}

fn apply_transition(task: &mut OutreachTask, to: TaskStatus) -> DomainResult<()> {
    let from = task.status;
    task.transition_to(to)
        .map_err(|_| DomainError::InvalidStateTransition { from, to })
}

fn validate_cron(expression: &str) -> DomainResult<()> {
    cron::Schedule::from_str(expression).map_err(|e| DomainError::InvalidSchedule {
        expression: expression.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cron_validation() {
        assert!(validate_cron("0 0 * * * *").is_ok());
        assert!(validate_cron("not a cron").is_err());
    }

    #[test]
    fn test_apply_transition_maps_errors() {
        let mut task =
            OutreachTask::new(Uuid::new_v4(), Uuid::new_v4(), TaskType::FollowUp, 0);
        assert!(apply_transition(&mut task, TaskStatus::Running).is_ok());
        let err = apply_transition(&mut task, TaskStatus::Pending).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidStateTransition {
                from: TaskStatus::Running,
                to: TaskStatus::Pending
            }
        ));
    }
}
