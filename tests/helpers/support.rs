//! Scripted collaborators for driving the scheduler in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::SqlitePool;

use cadence::adapters::inspector::MarkerInspector;
use cadence::adapters::sqlite::{
    SqliteQuotaStateRepository, SqliteSafetyStateRepository, SqliteTaskRepository,
};
use cadence::domain::models::{
    Config, OutreachTask, QuotaConfig, RetryConfig, SafetyConfig, SchedulerConfig,
    TimeWindowConfig,
};
use cadence::domain::ports::{
    ActionExecutor, ActionOutcome, AllowAllContacts, Clock, ManualClock, PageSnapshot,
};
use cadence::domain::errors::ActionError;
use cadence::services::{
    QuotaTracker, RetryPolicy, SafetyGovernor, TaskScheduler, TimeWindowGate,
};

/// Wednesday 2026-03-04 09:00 UTC. Outside lunch, not a weekend.
pub fn weekday_morning() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).unwrap()
}

/// Executor that pops scripted outcomes; once the script drains, every
/// call succeeds.
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<Result<ActionOutcome, ActionError>>>,
    calls: AtomicU64,
}

impl ScriptedExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicU64::new(0),
        })
    }

    pub fn push(&self, outcome: Result<ActionOutcome, ActionError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn push_err(&self, err: ActionError) {
        self.push(Err(err));
    }

    pub fn push_page(&self, body: &str, url: &str) {
        self.push(Ok(ActionOutcome {
            detail: None,
            page: Some(PageSnapshot {
                body_text: body.to_string(),
                url: url.to_string(),
            }),
        }));
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionExecutor for ScriptedExecutor {
    async fn perform(&self, _task: &OutreachTask) -> Result<ActionOutcome, ActionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ActionOutcome::default()))
    }
}

/// Everything a scheduler test needs in one place.
pub struct Harness {
    pub scheduler: Arc<TaskScheduler>,
    pub clock: ManualClock,
    pub executor: Arc<ScriptedExecutor>,
    pub pool: SqlitePool,
}

/// Build a scheduler over the given pool with a manual clock starting
/// at `weekday_morning()`. The config closure can bend any section.
pub async fn build_scheduler(pool: SqlitePool, adjust: impl FnOnce(&mut Config)) -> Harness {
    let mut config = Config::default();
    // Short flat retries keep backoff math easy to follow in tests.
    config.retry = RetryConfig {
        max_retries: 2,
        base_delay_secs: 3600,
        exponential_backoff: true,
        max_delay_secs: 86_400,
    };
    adjust(&mut config);

    let tz: chrono_tz::Tz = config.scheduler.timezone.parse().unwrap();
    let clock = ManualClock::new(weekday_morning());
    let executor = ScriptedExecutor::new();

    let quota = Arc::new(
        QuotaTracker::load(
            config.quota.clone(),
            tz,
            &config.scheduler.account_id,
            Arc::new(SqliteQuotaStateRepository::new(pool.clone())),
        )
        .await
        .unwrap(),
    );
    let governor = Arc::new(
        SafetyGovernor::load(
            config.safety.clone(),
            config.quota.clone(),
            TimeWindowGate::new(config.time_window.clone(), tz),
            quota.clone(),
            Arc::new(MarkerInspector::new()),
            Arc::new(SqliteSafetyStateRepository::new(pool.clone())),
        )
        .await
        .unwrap(),
    );

    let scheduler = Arc::new(
        TaskScheduler::new(
            config.scheduler.clone(),
            RetryPolicy::new(config.retry.clone()),
            Arc::new(clock.clone()) as Arc<dyn Clock>,
            Arc::new(SqliteTaskRepository::new(pool.clone())),
            executor.clone() as Arc<dyn ActionExecutor>,
            Arc::new(AllowAllContacts),
            quota,
            governor,
        )
        .unwrap(),
    );

    Harness {
        scheduler,
        clock,
        executor,
        pool,
    }
}

/// Config tweaks shared by several tests.
pub fn untimed(config: &mut Config) {
    // A lunch window that never matches keeps time gating out of the way.
    config.time_window = TimeWindowConfig {
        lunch_start_hour: 3,
        lunch_end_hour: 4,
        weekend_activity_multiplier: 1.0,
    };
    config.quota = QuotaConfig {
        hourly_actions: 1000,
        daily_actions: 1000,
        ..QuotaConfig::default()
    };
    config.safety = SafetyConfig {
        min_delay_secs: 0,
        max_delay_secs: 0,
        ..SafetyConfig::default()
    };
    config.scheduler = SchedulerConfig::default();
}
