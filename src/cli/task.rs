//! taskdesk task command implementation
//!
//! Listing goes through the task store's filter so employees only ever see
//! their own tasks. Edit, status and rm are refused unless the caller may
//! modify the task (admin or assignee).

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Context;
use crate::app::Workspace;
use crate::error::{Error, Result};
use crate::model::{
    parse_deadline, Choice, Task, TaskFilter, TaskFormData, TaskStatus, User,
};
use crate::outcome::Outcome;
use crate::output::{emit_success, HumanOutput};
use crate::views::{self, SortOrder};

pub struct ListOptions {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

pub struct NewOptions {
    pub title: String,
    pub assignee: String,
    pub deadline: String,
    pub description: String,
    pub priority: String,
    pub status: String,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub deadline: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskRow<'a> {
    #[serde(flatten)]
    task: &'a Task,
    overdue: bool,
    approaching: bool,
    can_modify: bool,
}

#[derive(Serialize)]
struct ListReport<'a> {
    total: usize,
    sort: SortOrder,
    tasks: Vec<TaskRow<'a>>,
}

#[derive(Serialize)]
struct MutationReport<'a> {
    #[serde(flatten)]
    outcome: &'a Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<&'a Task>,
}

pub fn run_list(ctx: &Context, options: ListOptions) -> Result<()> {
    let mut workspace = ctx.open()?;
    let viewer = workspace.require_user()?;

    let assignee_id = match options.assignee.as_deref() {
        None | Some("") | Some("all") => Choice::All,
        Some(raw) => Choice::Only(resolve_user(&workspace, raw)?.id),
    };
    let filter = TaskFilter {
        status: views::parse_choice(options.status.as_deref())?,
        priority: views::parse_choice(options.priority.as_deref())?,
        assignee_id,
        search: options.search.filter(|s| !s.is_empty()),
    };
    let sort = match options.sort.as_deref() {
        Some(raw) => raw.parse()?,
        None => workspace.config().tasks.sort_order()?,
    };

    workspace.tasks_mut().set_filter(filter);
    let tasks = views::sorted(workspace.tasks().filtered_tasks(), sort);

    let now = Utc::now();
    let window = workspace.approaching_window();
    let rows: Vec<TaskRow<'_>> = tasks
        .iter()
        .map(|task| row(task, &viewer, now, window))
        .collect();

    let mut human = HumanOutput::new(format!("{} task(s)", rows.len()));
    for row in &rows {
        human.push_detail(task_line(row));
    }
    if rows.is_empty() && !workspace.tasks().filter().is_empty() {
        human.push_next_step("taskdesk task list  (without filters)");
    }

    let report = ListReport {
        total: rows.len(),
        sort,
        tasks: rows,
    };
    emit_success(ctx.output(), "task list", &report, Some(&human))
}

pub fn run_show(ctx: &Context, id: &str) -> Result<()> {
    let workspace = ctx.open()?;
    let viewer = workspace.require_user()?;
    let task = visible_task(&workspace, id)?;

    let now = Utc::now();
    let row = row(&task, &viewer, now, workspace.approaching_window());

    let mut human = HumanOutput::new(task.title.clone());
    human.push_summary("id", task.id.clone());
    human.push_summary("status", task.status.to_string());
    human.push_summary("priority", task.priority.to_string());
    human.push_summary("assignee", task.assignee_name.clone());
    human.push_summary("created by", task.created_by_name.clone());
    human.push_summary("deadline", task.deadline.format("%Y-%m-%d %H:%M UTC").to_string());
    if !task.description.is_empty() {
        human.push_detail(task.description.clone());
    }
    for comment in &task.comments {
        human.push_detail(format!(
            "{} ({}): {}",
            comment.user_name,
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.text
        ));
    }
    if row.overdue {
        human.push_warning("deadline has passed");
    } else if row.approaching {
        human.push_warning("deadline is approaching");
    }

    emit_success(ctx.output(), "task show", &row, Some(&human))
}

pub fn run_new(ctx: &Context, options: NewOptions) -> Result<()> {
    let mut workspace = ctx.open()?;
    workspace.require_user()?;

    let assignee = resolve_user(&workspace, &options.assignee)?;
    let form = TaskFormData {
        title: required_title(options.title)?,
        description: options.description,
        status: options.status.parse()?,
        priority: options.priority.parse()?,
        assignee_id: assignee.id,
        deadline: parse_deadline(&options.deadline)?,
    };

    let outcome = workspace.tasks_mut().create_task(form).into_result()?;
    let task = outcome
        .task_id
        .as_deref()
        .and_then(|id| workspace.tasks().get_task(id));

    let mut human = HumanOutput::new(outcome.message.clone());
    if let Some(task) = task {
        human.push_summary("id", task.id.clone());
        human.push_summary("assignee", task.assignee_name.clone());
        human.push_next_step(format!("taskdesk task show {}", task.id));
    }

    emit_success(
        ctx.output(),
        "task new",
        &MutationReport {
            outcome: &outcome,
            task,
        },
        Some(&human),
    )
}

pub fn run_edit(ctx: &Context, options: EditOptions) -> Result<()> {
    let mut workspace = ctx.open()?;
    let viewer = workspace.require_user()?;
    let existing = modifiable_task(&workspace, &viewer, &options.id)?;

    let mut form = TaskFormData::from(&existing);
    if let Some(title) = options.title {
        form.title = required_title(title)?;
    }
    if let Some(description) = options.description {
        form.description = description;
    }
    if let Some(status) = options.status {
        form.status = status.parse()?;
    }
    if let Some(priority) = options.priority {
        form.priority = priority.parse()?;
    }
    if let Some(assignee) = options.assignee {
        form.assignee_id = resolve_user(&workspace, &assignee)?.id;
    }
    if let Some(deadline) = options.deadline {
        form.deadline = parse_deadline(&deadline)?;
    }

    let outcome = workspace
        .tasks_mut()
        .update_task(&options.id, form)
        .into_result()?;
    report_mutation(ctx, &workspace, "task edit", &outcome, &options.id)
}

pub fn run_status(ctx: &Context, id: &str, status: &str) -> Result<()> {
    let status: TaskStatus = status.parse()?;
    let mut workspace = ctx.open()?;
    let viewer = workspace.require_user()?;
    modifiable_task(&workspace, &viewer, id)?;

    let outcome = workspace
        .tasks_mut()
        .update_task_status(id, status)
        .into_result()?;
    report_mutation(ctx, &workspace, "task status", &outcome, id)
}

pub fn run_comment(ctx: &Context, id: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::InvalidArgument("comment text is empty".to_string()));
    }
    let mut workspace = ctx.open()?;
    workspace.require_user()?;
    visible_task(&workspace, id)?;

    let outcome = workspace.tasks_mut().add_comment(id, text).into_result()?;
    report_mutation(ctx, &workspace, "task comment", &outcome, id)
}

pub fn run_rm(ctx: &Context, id: &str) -> Result<()> {
    let mut workspace = ctx.open()?;
    let viewer = workspace.require_user()?;
    // Unknown ids fall through: deleting a missing task is a no-op.
    if workspace.tasks().get_task(id).is_some() {
        modifiable_task(&workspace, &viewer, id)?;
    }

    let outcome = workspace.tasks_mut().delete_task(id).into_result()?;
    let human = HumanOutput::new(outcome.message.clone());
    emit_success(
        ctx.output(),
        "task rm",
        &MutationReport {
            outcome: &outcome,
            task: None,
        },
        Some(&human),
    )
}

fn report_mutation(
    ctx: &Context,
    workspace: &Workspace,
    command: &str,
    outcome: &Outcome,
    id: &str,
) -> Result<()> {
    let task = workspace.tasks().get_task(id);
    let mut human = HumanOutput::new(outcome.message.clone());
    if let Some(task) = task {
        human.push_summary("id", task.id.clone());
        human.push_summary("status", task.status.to_string());
        human.push_summary("comments", task.comments.len().to_string());
    }
    emit_success(
        ctx.output(),
        command,
        &MutationReport { outcome, task },
        Some(&human),
    )
}

fn row<'a>(
    task: &'a Task,
    viewer: &User,
    now: DateTime<Utc>,
    window: chrono::Duration,
) -> TaskRow<'a> {
    let open = !task.is_completed();
    TaskRow {
        task,
        overdue: open && views::is_deadline_past(task.deadline, now),
        approaching: open && views::is_deadline_approaching_within(task.deadline, now, window),
        can_modify: task.can_be_modified_by(viewer),
    }
}

fn task_line(row: &TaskRow<'_>) -> String {
    let task = row.task;
    let flag = if row.overdue {
        " OVERDUE"
    } else if row.approaching {
        " due soon"
    } else {
        ""
    };
    format!(
        "{} [{}] [{}] {} -> {} (due {}){}",
        task.id,
        task.status,
        task.priority,
        task.title,
        if task.assignee_name.is_empty() {
            "unassigned"
        } else {
            task.assignee_name.as_str()
        },
        task.deadline.format("%Y-%m-%d"),
        flag
    )
}

/// A task the viewer is allowed to see; hidden tasks read as missing.
fn visible_task(workspace: &Workspace, id: &str) -> Result<Task> {
    workspace
        .visible_tasks()
        .into_iter()
        .find(|task| task.id == id)
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))
}

fn modifiable_task(workspace: &Workspace, viewer: &User, id: &str) -> Result<Task> {
    let task = visible_task(workspace, id)?;
    if !task.can_be_modified_by(viewer) {
        return Err(Error::PermissionDenied(format!(
            "only an admin or the assignee may modify task {id}"
        )));
    }
    Ok(task)
}

/// Look a user up by id, then by email (same matching rule as login).
fn resolve_user(workspace: &Workspace, raw: &str) -> Result<User> {
    let identity = workspace.identity();
    if let Some(user) = identity.user(raw)? {
        return Ok(user);
    }
    identity
        .find_by_email(raw)?
        .ok_or_else(|| Error::UserNotFound(raw.to_string()))
}

fn required_title(title: String) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("task title is empty".to_string()));
    }
    Ok(trimmed.to_string())
}
