//! taskdesk dashboard

use chrono::Utc;

use super::Context;
use crate::error::Result;
use crate::model::{Priority, TaskStatus};
use crate::output::{emit_success, HumanOutput};
use crate::views::DashboardSummary;

pub fn run(ctx: &Context) -> Result<()> {
    let workspace = ctx.open()?;
    let viewer = workspace.require_user()?;

    let tasks = workspace.visible_tasks();
    let users = workspace.identity().users()?;
    let summary = DashboardSummary::build(
        &tasks,
        &users,
        &viewer,
        Utc::now(),
        workspace.approaching_window(),
    );

    let title = if viewer.is_admin() {
        "Admin dashboard"
    } else {
        "My dashboard"
    };
    let mut human = HumanOutput::new(format!("{title} ({})", viewer.name));
    human.push_summary("total", summary.total_tasks.to_string());
    for status in TaskStatus::ALL {
        human.push_summary(status.as_str(), summary.by_status.get(&status).to_string());
    }
    for priority in Priority::ALL {
        human.push_summary(
            format!("{priority} priority"),
            summary.by_priority.get(&priority).to_string(),
        );
    }
    human.push_summary("completed today", summary.completed_today.to_string());

    if let Some(employees) = &summary.employees {
        for stats in employees {
            human.push_detail(format!(
                "{}: {} task(s), {} completed, {} in progress, {} pending ({}%)",
                stats.name,
                stats.total_tasks,
                stats.completed_tasks,
                stats.in_progress_tasks,
                stats.pending_tasks,
                stats.productivity_rate
            ));
        }
    }

    if !summary.overdue.is_empty() {
        human.push_warning(format!("{} overdue task(s)", summary.overdue.len()));
    }
    if !summary.approaching.is_empty() {
        human.push_warning(format!(
            "{} task(s) due within {} day(s)",
            summary.approaching.len(),
            workspace.config().deadlines.approaching_days
        ));
    }
    if summary.overdue.is_empty() && summary.approaching.is_empty() {
        human.push_next_step("taskdesk task list --sort deadline");
    } else {
        human.push_next_step("taskdesk task list --sort deadline --status pending");
    }

    emit_success(ctx.output(), "dashboard", &summary, Some(&human))
}
