//! Table output formatting for CLI commands.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::domain::models::{
    AlertSeverity, OutreachTask, QuotaSummary, SafetyAlert, SafetyMetrics, TaskStatus,
};
use crate::domain::ports::TaskCounts;

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(cells: &[&str]) -> Vec<Cell> {
    cells
        .iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::Yellow,
        TaskStatus::Running => Color::Cyan,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Failed => Color::Red,
        TaskStatus::Retrying => Color::Magenta,
        TaskStatus::Cancelled => Color::DarkGrey,
    }
}

pub fn format_tasks(tasks: &[OutreachTask]) -> String {
    let mut table = base_table();
    table.set_header(header(&[
        "ID", "Contact", "Type", "Status", "Scheduled", "Retries",
    ]));

    for task in tasks {
        table.add_row(vec![
            Cell::new(&task.id.to_string()[..8]),
            Cell::new(&task.contact_id.to_string()[..8]),
            Cell::new(task.task_type.as_str()),
            Cell::new(task.status.as_str()).fg(status_color(task.status)),
            Cell::new(task.scheduled_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(format!("{}/{}", task.retry_count, task.max_retries)),
        ]);
    }
    table.to_string()
}

pub fn format_counts(counts: &TaskCounts) -> String {
    let mut table = base_table();
    table.set_header(header(&[
        "Total", "Pending", "Running", "Completed", "Failed", "Retrying", "Cancelled",
    ]));
    table.add_row(vec![
        Cell::new(counts.total),
        Cell::new(counts.pending).fg(Color::Yellow),
        Cell::new(counts.running).fg(Color::Cyan),
        Cell::new(counts.completed).fg(Color::Green),
        Cell::new(counts.failed).fg(Color::Red),
        Cell::new(counts.retrying).fg(Color::Magenta),
        Cell::new(counts.cancelled).fg(Color::DarkGrey),
    ]);
    table.to_string()
}

pub fn format_quota(summary: &[QuotaSummary]) -> String {
    let mut table = base_table();
    table.set_header(header(&["Action", "Used", "Cap", "Remaining"]));
    for row in summary {
        let remaining_cell = if row.remaining == 0 {
            Cell::new(row.remaining).fg(Color::Red)
        } else {
            Cell::new(row.remaining).fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(row.action.as_str()),
            Cell::new(row.current),
            Cell::new(row.max),
            remaining_cell,
        ]);
    }
    table.to_string()
}

pub fn format_metrics(metrics: &SafetyMetrics) -> String {
    let mut table = base_table();
    table.set_header(header(&["Metric", "Value"]));
    table.add_row(vec![
        Cell::new("total actions"),
        Cell::new(metrics.total_actions),
    ]);
    table.add_row(vec![
        Cell::new("rejected actions"),
        Cell::new(metrics.rejected_actions),
    ]);
    table.add_row(vec![
        Cell::new("rejection rate"),
        Cell::new(format!("{:.1}%", metrics.rejection_rate)),
    ]);
    table.add_row(vec![
        Cell::new("jail detected"),
        flag_cell(metrics.jail_detected),
    ]);
    table.add_row(vec![
        Cell::new("captcha detected"),
        flag_cell(metrics.captcha_detected),
    ]);
    table.add_row(vec![
        Cell::new("account restricted"),
        flag_cell(metrics.account_restricted),
    ]);
    table.to_string()
}

fn flag_cell(flag: bool) -> Cell {
    if flag {
        Cell::new("yes").fg(Color::Red)
    } else {
        Cell::new("no").fg(Color::Green)
    }
}

pub fn format_alerts(alerts: &[SafetyAlert]) -> String {
    let mut table = base_table();
    table.set_header(header(&["When", "Severity", "Message", "Action needed"]));
    for alert in alerts {
        let severity_cell = match alert.severity {
            AlertSeverity::Info => Cell::new("info"),
            AlertSeverity::Warning => Cell::new("warning").fg(Color::Yellow),
            AlertSeverity::Critical => Cell::new("critical").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(alert.timestamp.format("%Y-%m-%d %H:%M").to_string()),
            severity_cell,
            Cell::new(&alert.message),
            Cell::new(if alert.requires_action { "yes" } else { "" }),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TaskType;
    use uuid::Uuid;

    #[test]
    fn test_task_table_contains_rows() {
        let task = OutreachTask::new(Uuid::new_v4(), Uuid::new_v4(), TaskType::FollowUp, 3);
        let rendered = format_tasks(&[task.clone()]);
        assert!(rendered.contains("follow_up"));
        assert!(rendered.contains(&task.id.to_string()[..8]));
    }

    #[test]
    fn test_quota_table_shows_remaining() {
        let rendered = format_quota(&[QuotaSummary {
            action: crate::domain::models::ActionType::Message,
            current: 3,
            max: 50,
            remaining: 47,
        }]);
        assert!(rendered.contains("message"));
        assert!(rendered.contains("47"));
    }
}
