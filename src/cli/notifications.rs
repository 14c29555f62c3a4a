//! taskdesk notifications list/read/clear

use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::model::Notification;
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct InboxReport {
    unread: usize,
    notifications: Vec<Notification>,
}

#[derive(Serialize)]
struct AckReport<'a> {
    id: Option<&'a str>,
    unread: usize,
}

pub fn run_list(ctx: &Context) -> Result<()> {
    let workspace = ctx.open()?;
    let user = workspace.require_user()?;
    let notifications = workspace.notifications().list(&user.id)?;
    let unread = notifications.iter().filter(|n| !n.read).count();

    let mut human = HumanOutput::new(format!(
        "{} notification(s), {unread} unread",
        notifications.len()
    ));
    for notification in &notifications {
        let marker = if notification.read { " " } else { "*" };
        human.push_detail(format!(
            "{marker} {} {} [{}]",
            notification.id,
            notification.message,
            notification.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    if unread > 0 {
        human.push_next_step("taskdesk notifications read <id>");
    }

    emit_success(
        ctx.output(),
        "notifications list",
        &InboxReport {
            unread,
            notifications,
        },
        Some(&human),
    )
}

pub fn run_read(ctx: &Context, id: &str) -> Result<()> {
    let workspace = ctx.open()?;
    let user = workspace.require_user()?;
    workspace.notifications().mark_read(&user.id, id)?;
    let unread = workspace.notifications().unread_count(&user.id)?;

    let mut human = HumanOutput::new("Notification marked as read.");
    human.push_summary("unread", unread.to_string());
    emit_success(
        ctx.output(),
        "notifications read",
        &AckReport {
            id: Some(id),
            unread,
        },
        Some(&human),
    )
}

pub fn run_clear(ctx: &Context) -> Result<()> {
    let workspace = ctx.open()?;
    let user = workspace.require_user()?;
    workspace.notifications().clear(&user.id)?;

    let human = HumanOutput::new("Notifications cleared.");
    emit_success(
        ctx.output(),
        "notifications clear",
        &AckReport { id: None, unread: 0 },
        Some(&human),
    )
}
