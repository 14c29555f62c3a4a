//! taskdesk login/signup/logout/whoami

use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::model::User;
use crate::outcome::Outcome;
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct SessionReport<'a> {
    #[serde(flatten)]
    outcome: &'a Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a User>,
}

pub fn run_login(ctx: &Context, email: &str, password: &str) -> Result<()> {
    let mut workspace = ctx.open()?;
    let outcome = workspace.login(email, password).into_result()?;
    report_session(ctx, "login", &outcome, workspace.current_user())
}

pub fn run_signup(
    ctx: &Context,
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<()> {
    let mut workspace = ctx.open()?;
    let outcome = workspace
        .signup(name, email, password, confirm_password)
        .into_result()?;
    report_session(ctx, "signup", &outcome, workspace.current_user())
}

pub fn run_logout(ctx: &Context) -> Result<()> {
    let mut workspace = ctx.open()?;
    let outcome = workspace.logout();
    report_session(ctx, "logout", &outcome, None)
}

pub fn run_whoami(ctx: &Context) -> Result<()> {
    let workspace = ctx.open()?;
    let user = workspace.require_user()?;

    let mut human = HumanOutput::new(format!("{} <{}>", user.name, user.email));
    human.push_summary("id", user.id.clone());
    human.push_summary("role", user.role.to_string());
    let unread = workspace.notifications().unread_count(&user.id)?;
    if unread > 0 {
        human.push_summary("unread notifications", unread.to_string());
        human.push_next_step("taskdesk notifications list");
    }

    emit_success(ctx.output(), "whoami", &user, Some(&human))
}

fn report_session(
    ctx: &Context,
    command: &str,
    outcome: &Outcome,
    user: Option<&User>,
) -> Result<()> {
    let mut human = HumanOutput::new(outcome.message.clone());
    if let Some(user) = user {
        human.push_summary("user", format!("{} <{}>", user.name, user.email));
        human.push_summary("role", user.role.to_string());
        human.push_next_step("taskdesk task list");
    }

    emit_success(
        ctx.output(),
        command,
        &SessionReport { outcome, user },
        Some(&human),
    )
}
