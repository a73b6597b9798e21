//! Wires configuration, persistence, and services into a running
//! application context.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::inspector::MarkerInspector;
use crate::adapters::sqlite::{
    all_embedded_migrations, create_pool, Migrator, PoolConfig, SqliteQuotaStateRepository,
    SqliteSafetyStateRepository, SqliteTaskRepository,
};
use crate::domain::models::Config;
use crate::domain::ports::{ActionExecutor, AllowAllContacts, Clock, SystemClock};
use crate::services::{
    BehaviorSimulator, BulkRunner, QuotaTracker, RetryPolicy, SafetyGovernor, TaskScheduler,
    TimeWindowGate,
};

pub struct AppContext {
    pub config: Config,
    pub scheduler: Arc<TaskScheduler>,
}

impl AppContext {
    /// Open the database, run migrations, and assemble the service
    /// graph around the given executor.
    pub async fn init(config: Config, executor: Arc<dyn ActionExecutor>) -> Result<Self> {
        let pool = create_pool(
            &config.database.path,
            Some(PoolConfig {
                max_connections: config.database.max_connections,
                ..PoolConfig::default()
            }),
        )
        .await
        .context("Failed to open database")?;

        Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .context("Failed to run migrations")?;

        let tz: chrono_tz::Tz = config
            .scheduler
            .timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid timezone: {}", config.scheduler.timezone))?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let quota = Arc::new(
            QuotaTracker::load(
                config.quota.clone(),
                tz,
                &config.scheduler.account_id,
                Arc::new(SqliteQuotaStateRepository::new(pool.clone())),
            )
            .await?,
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
            .await?,
        );

        let scheduler = Arc::new(TaskScheduler::new(
            config.scheduler.clone(),
            RetryPolicy::new(config.retry.clone()),
            clock,
            Arc::new(SqliteTaskRepository::new(pool)),
            executor,
            Arc::new(AllowAllContacts),
            quota,
            governor,
        )?);

        Ok(Self { config, scheduler })
    }

    pub fn bulk_runner(&self) -> BulkRunner {
        BulkRunner::new(
            self.config.bulk.clone(),
            Arc::clone(&self.scheduler),
            BehaviorSimulator::new(self.config.behavior.clone()),
        )
    }
}
