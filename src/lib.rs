//! taskdesk - Team Task Tracker Library
//!
//! This library provides the state layer behind the taskdesk CLI: who is
//! logged in, the tasks they can see, and the views derived from them.
//!
//! # Core Concepts
//!
//! - **Session**: the logged-in user, restored from a persisted token
//! - **Task Store**: the authoritative task collection plus a filtered view
//! - **Derived Views**: counts, deadline flags, sorting and dashboards
//! - **Outcomes**: `{success, message}` results instead of raised errors
//!
//! # Module Organization
//!
//! - `app`: Workspace wiring storage, identity, tasks and notifications
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `taskdesk.toml`
//! - `error`: Error types and result aliases
//! - `identity`: Login, signup, logout and session restore
//! - `lock`: File locking and atomic writes for the file store
//! - `model`: Users, tasks, comments, filters and notifications
//! - `notify`: Per-user notification inbox
//! - `storage`: Key-value persistence (file-backed or in-memory)
//! - `task`: Task store and its mutations
//! - `views`: Pure derived views over tasks

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod lock;
pub mod model;
pub mod notify;
pub mod outcome;
pub mod output;
pub mod seed;
pub mod storage;
pub mod task;
pub mod views;

pub use error::{Error, Result};
