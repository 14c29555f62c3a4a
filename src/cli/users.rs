//! taskdesk users

use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::model::{Role, User};
use crate::output::{emit_success, HumanOutput};
use crate::views::{self, EmployeeStats};

pub struct UsersOptions {
    pub role: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize)]
struct UserRow<'a> {
    #[serde(flatten)]
    user: &'a User,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a EmployeeStats>,
}

pub fn run(ctx: &Context, options: UsersOptions) -> Result<()> {
    let workspace = ctx.open()?;
    let viewer = workspace.require_user()?;

    let role = views::parse_choice::<Role>(options.role.as_deref())?;
    let users = workspace
        .identity()
        .directory(&role, options.search.as_deref())?;

    // Workload numbers are an admin view, as on the dashboard.
    let stats = if viewer.is_admin() {
        views::employee_stats(workspace.tasks().tasks(), &users)
    } else {
        Vec::new()
    };

    let rows: Vec<UserRow<'_>> = users
        .iter()
        .map(|user| UserRow {
            user,
            stats: stats.iter().find(|s| s.user_id == user.id),
        })
        .collect();

    let mut human = HumanOutput::new(format!("{} user(s)", rows.len()));
    for row in &rows {
        let mut line = format!("{} <{}> [{}]", row.user.name, row.user.email, row.user.role);
        if let Some(stats) = row.stats {
            line.push_str(&format!(
                " {}/{} done ({}%)",
                stats.completed_tasks, stats.total_tasks, stats.productivity_rate
            ));
        }
        human.push_detail(line);
    }

    emit_success(ctx.output(), "users", &rows, Some(&human))
}
