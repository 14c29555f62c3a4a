//! Error types for taskdesk
//!
//! Business operations (login, task mutations, ...) report failures as an
//! [`Outcome`](crate::outcome::Outcome) message. This enum covers everything
//! underneath them: storage, configuration and argument problems.
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, rejected operation)
//! - 3: Denied (not logged in, not allowed to touch the task)
//! - 4: Operation failed (I/O, corrupt data, lock timeout)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskdesk CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const DENIED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskdesk operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("{0}")]
    Rejected(String),

    // Denied (exit code 3)
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("No data directory could be determined")]
    NoDataDir,
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::TaskNotFound(_)
            | Error::UserNotFound(_)
            | Error::Rejected(_) => exit_codes::USER_ERROR,

            Error::NotAuthenticated | Error::PermissionDenied(_) => exit_codes::DENIED,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::NoDataDir => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured context for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::TaskNotFound(id) => Some(serde_json::json!({ "task_id": id })),
            Error::UserNotFound(id) => Some(serde_json::json!({ "user_id": id })),
            Error::LockFailed(path) => Some(serde_json::json!({
                "lock_path": path.to_string_lossy(),
            })),
            _ => None,
        }
    }
}

/// Result type alias for taskdesk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
