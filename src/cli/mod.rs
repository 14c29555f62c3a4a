//! Command-line interface for taskdesk
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::app::Workspace;
use crate::config::{self, Config};
use crate::error::Result;
use crate::output::OutputOptions;

mod auth;
mod dashboard;
mod notifications;
mod task;
mod users;

/// taskdesk - Task tracking for small teams
///
/// Log in as an admin or employee, create and assign tasks, track their
/// status and deadlines, and review workload dashboards.
#[derive(Parser, Debug)]
#[command(name = "taskdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the task store (defaults to the platform data dir)
    #[arg(long, global = true, env = "TASKDESK_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with an email address
    Login {
        email: String,

        /// Password (accepted but not verified by the demo store)
        #[arg(long, default_value = "")]
        password: String,
    },

    /// Create an employee account and log in
    Signup {
        name: String,
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        confirm_password: String,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List users
    Users {
        /// Role filter: all, admin, employee
        #[arg(long)]
        role: Option<String>,

        /// Case-insensitive match on name or email
        #[arg(long)]
        search: Option<String>,
    },

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Summary of tasks visible to the current user
    Dashboard,

    /// Notification inbox of the current user
    #[command(subcommand)]
    Notifications(NotificationCommands),
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks visible to the current user
    List {
        /// pending, in-progress, completed or all
        #[arg(long)]
        status: Option<String>,

        /// high, medium, low or all
        #[arg(long)]
        priority: Option<String>,

        /// Assignee id or email, or all
        #[arg(long)]
        assignee: Option<String>,

        /// Case-insensitive match on title or description
        #[arg(long)]
        search: Option<String>,

        /// newest, oldest, deadline, priority, status
        #[arg(long)]
        sort: Option<String>,
    },

    /// Show one task with its comments
    Show { id: String },

    /// Create a task
    New {
        title: String,

        /// Assignee id or email
        #[arg(long)]
        assignee: String,

        /// Deadline as YYYY-MM-DD or RFC 3339
        #[arg(long)]
        deadline: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "medium")]
        priority: String,

        #[arg(long, default_value = "pending")]
        status: String,
    },

    /// Change fields of a task; omitted fields are kept
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        priority: Option<String>,

        #[arg(long)]
        assignee: Option<String>,

        #[arg(long)]
        deadline: Option<String>,
    },

    /// Set the status of a task
    Status { id: String, status: String },

    /// Add a comment to a task
    Comment { id: String, text: String },

    /// Delete a task
    Rm { id: String },
}

#[derive(Subcommand, Debug)]
pub enum NotificationCommands {
    /// List notifications, oldest first
    List,

    /// Mark a notification as read
    Read { id: String },

    /// Remove every notification
    Clear,
}

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl Context {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Resolve the data directory, load its config and restore the session.
    pub fn open(&self) -> Result<Workspace> {
        let dir = config::resolve_data_dir(self.data_dir.as_deref())?;
        let config = Config::load_from_dir(&dir)?;
        tracing::debug!(data_dir = %dir.display(), "opening workspace");
        Workspace::open(&dir, config)
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let ctx = Context {
            data_dir: self.data_dir,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Login { email, password } => auth::run_login(&ctx, &email, &password),
            Commands::Signup {
                name,
                email,
                password,
                confirm_password,
            } => auth::run_signup(&ctx, &name, &email, &password, &confirm_password),
            Commands::Logout => auth::run_logout(&ctx),
            Commands::Whoami => auth::run_whoami(&ctx),
            Commands::Users { role, search } => users::run(
                &ctx,
                users::UsersOptions {
                    role,
                    search,
                },
            ),
            Commands::Task(cmd) => match cmd {
                TaskCommands::List {
                    status,
                    priority,
                    assignee,
                    search,
                    sort,
                } => task::run_list(
                    &ctx,
                    task::ListOptions {
                        status,
                        priority,
                        assignee,
                        search,
                        sort,
                    },
                ),
                TaskCommands::Show { id } => task::run_show(&ctx, &id),
                TaskCommands::New {
                    title,
                    assignee,
                    deadline,
                    description,
                    priority,
                    status,
                } => task::run_new(
                    &ctx,
                    task::NewOptions {
                        title,
                        assignee,
                        deadline,
                        description,
                        priority,
                        status,
                    },
                ),
                TaskCommands::Edit {
                    id,
                    title,
                    description,
                    status,
                    priority,
                    assignee,
                    deadline,
                } => task::run_edit(
                    &ctx,
                    task::EditOptions {
                        id,
                        title,
                        description,
                        status,
                        priority,
                        assignee,
                        deadline,
                    },
                ),
                TaskCommands::Status { id, status } => task::run_status(&ctx, &id, &status),
                TaskCommands::Comment { id, text } => task::run_comment(&ctx, &id, &text),
                TaskCommands::Rm { id } => task::run_rm(&ctx, &id),
            },
            Commands::Dashboard => dashboard::run(&ctx),
            Commands::Notifications(cmd) => match cmd {
                NotificationCommands::List => notifications::run_list(&ctx),
                NotificationCommands::Read { id } => notifications::run_read(&ctx, &id),
                NotificationCommands::Clear => notifications::run_clear(&ctx),
            },
        }
    }
}
