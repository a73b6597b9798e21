//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};
use uuid::Uuid;

pub use context::AppContext;

#[derive(Parser)]
#[command(name = "cadence", about = "Governed scheduler for automated outreach", version)]
pub struct Cli {
    /// Emit machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a config file (defaults to .cadence/config.yaml)
    #[arg(long, short, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scheduler loops until interrupted
    Run,

    /// Queue an outreach task
    Schedule {
        /// Contact to reach out to
        #[arg(long)]
        contact: Uuid,
        /// Campaign the contact belongs to
        #[arg(long)]
        campaign: Uuid,
        /// Kind of outreach (reminder, follow_up, thank_you, value_add,
        /// final_follow_up, status_check)
        #[arg(long = "type")]
        task_type: String,
        /// Days from now until the task is due
        #[arg(long, default_value_t = 0)]
        delay_days: i64,
        /// Free-form JSON metadata
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Cancel a pending task, or all pending tasks for a contact
    Cancel {
        /// Task to cancel
        #[arg(required_unless_present = "contact")]
        task_id: Option<Uuid>,
        /// Cancel everything pending for this contact
        #[arg(long, conflicts_with = "task_id")]
        contact: Option<Uuid>,
    },

    /// List queued tasks
    Tasks {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
        /// Maximum rows to show
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Show queue counts, quota usage, safety metrics, and recent alerts
    Status,

    /// Execute due tasks in a paced batch
    Bulk {
        /// Action budget for the batch
        #[arg(long, default_value_t = 10)]
        max_actions: u64,
    },

    /// Delete old terminal tasks and stale alerts
    Cleanup,

    /// Clear jail/captcha/restriction flags after manual review
    ClearRestrictions,
}

/// Print an error the way the rest of the output is shaped and exit
/// non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) {
    if json {
        eprintln!(
            "{}",
            serde_json::json!({ "error": format!("{err:#}") })
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
