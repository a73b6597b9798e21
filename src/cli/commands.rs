//! Command handlers.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use crate::adapters::executor::DryRunExecutor;
use crate::cli::context::AppContext;
use crate::cli::output::table;
use crate::domain::models::{Config, TaskStatus, TaskType};
use crate::domain::ports::TaskFilters;
use crate::infrastructure::config::ConfigLoader;

/// Load config from the explicit path or the default hierarchy.
pub fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

async fn context(config: Config) -> Result<AppContext> {
    AppContext::init(config, Arc::new(DryRunExecutor)).await
}

/// `run`: start the background loops and block until SIGINT or
/// SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let ctx = context(config).await?;
    ctx.scheduler.start();

    wait_for_shutdown().await?;
    ctx.scheduler.shutdown().await?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
        }
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")
}

/// `schedule`: queue one outreach task.
pub async fn schedule(
    config: Config,
    contact: Uuid,
    campaign: Uuid,
    task_type: &str,
    delay_days: i64,
    metadata: Option<&str>,
    json: bool,
) -> Result<()> {
    let Some(task_type) = TaskType::from_str(task_type) else {
        bail!("unknown task type: {task_type}");
    };
    let metadata: HashMap<String, serde_json::Value> = match metadata {
        Some(raw) => serde_json::from_str(raw).context("metadata is not a JSON object")?,
        None => HashMap::new(),
    };

    let ctx = context(config).await?;
    let task = ctx
        .scheduler
        .schedule(contact, campaign, task_type, delay_days, metadata)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!("Task queued:");
        println!("  ID: {}", task.id);
        println!("  Type: {}", task.task_type.as_str());
        println!("  Due: {}", task.scheduled_at.format("%Y-%m-%d %H:%M %Z"));
    }
    Ok(())
}

/// `cancel`: cancel one task or everything pending for a contact.
pub async fn cancel(
    config: Config,
    task_id: Option<Uuid>,
    contact: Option<Uuid>,
    json: bool,
) -> Result<()> {
    let ctx = context(config).await?;

    if let Some(id) = task_id {
        ctx.scheduler.cancel(id).await?;
        if json {
            println!("{}", serde_json::json!({ "cancelled": [id] }));
        } else {
            println!("Cancelled task {id}");
        }
    } else if let Some(contact) = contact {
        let cancelled = ctx.scheduler.cancel_all_for_contact(contact).await?;
        if json {
            println!(
                "{}",
                serde_json::json!({ "contact": contact, "cancelled": cancelled })
            );
        } else {
            println!("Cancelled {cancelled} pending task(s) for contact {contact}");
        }
    }
    Ok(())
}

/// `tasks`: list tasks, optionally filtered by status.
pub async fn tasks(
    config: Config,
    status: Option<&str>,
    limit: u32,
    json: bool,
) -> Result<()> {
    let status = match status {
        Some(raw) => match TaskStatus::from_str(raw) {
            Some(status) => Some(status),
            None => bail!("unknown status: {raw}"),
        },
        None => None,
    };

    let ctx = context(config).await?;
    let tasks = ctx
        .scheduler
        .list_tasks(TaskFilters {
            status,
            contact_id: None,
            campaign_id: None,
            limit: Some(i64::from(limit)),
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    } else if tasks.is_empty() {
        println!("No tasks.");
    } else {
        println!("{}", table::format_tasks(&tasks));
    }
    Ok(())
}

/// `status`: queue counts, quota usage, safety metrics, recent alerts.
pub async fn status(config: Config, json: bool) -> Result<()> {
    let ctx = context(config).await?;
    let summary = ctx.scheduler.summary().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "tasks": {
                    "total": summary.counts.total,
                    "pending": summary.counts.pending,
                    "running": summary.counts.running,
                    "completed": summary.counts.completed,
                    "failed": summary.counts.failed,
                    "retrying": summary.counts.retrying,
                    "cancelled": summary.counts.cancelled,
                },
                "quota": summary.quota,
                "metrics": summary.metrics,
                "recent_alerts": summary.recent_alerts,
            }))?
        );
        return Ok(());
    }

    println!("{}", console::style("Tasks").bold());
    println!("{}", table::format_counts(&summary.counts));
    println!("\n{}", console::style("Quota (today)").bold());
    println!("{}", table::format_quota(&summary.quota));
    println!("\n{}", console::style("Safety").bold());
    println!("{}", table::format_metrics(&summary.metrics));
    if !summary.recent_alerts.is_empty() {
        println!("\n{}", console::style("Alerts (last 24h)").bold());
        println!("{}", table::format_alerts(&summary.recent_alerts));
    }
    Ok(())
}

/// `bulk`: run a paced batch of due tasks.
pub async fn bulk(config: Config, max_actions: u64, json: bool) -> Result<()> {
    let ctx = context(config).await?;
    let report = ctx.bulk_runner().run(max_actions).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "completed": report.completed,
                "retried": report.retried,
                "failed": report.failed,
                "skipped": report.skipped,
                "aborted": report.aborted.as_ref().map(|a| format!("{a:?}")),
            }))?
        );
        return Ok(());
    }

    println!(
        "Batch finished: {} completed, {} retried, {} failed, {} skipped",
        report.completed, report.retried, report.failed, report.skipped
    );
    if let Some(abort) = report.aborted {
        println!("Aborted early: {abort:?}");
    }
    Ok(())
}

/// `cleanup`: retention pass.
pub async fn cleanup(config: Config, json: bool) -> Result<()> {
    let ctx = context(config).await?;
    let deleted = ctx.scheduler.cleanup().await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else {
        println!("Deleted {deleted} old terminal task(s)");
    }
    Ok(())
}

/// `clear-restrictions`: reset jail/captcha flags after manual review.
pub async fn clear_restrictions(config: Config, json: bool) -> Result<()> {
    let ctx = context(config).await?;
    ctx.scheduler.governor().clear_restrictions().await;
    ctx.scheduler.snapshot().await?;

    if json {
        println!("{}", serde_json::json!({ "cleared": true }));
    } else {
        println!("Restriction flags cleared.");
    }
    Ok(())
}
