//! Uniform result shape for user-facing operations.

use serde::Serialize;

use crate::error::Error;

/// `{success, message}` returned by every identity and task mutation.
///
/// Failures here are expected (wrong email, unknown task, ...) and never
/// abort the caller; the message is meant to be shown as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            task_id: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            task_id: None,
        }
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Convert a failed outcome into an error so CLI callers can use `?`.
    pub fn into_result(self) -> Result<Self, Error> {
        if self.success {
            Ok(self)
        } else {
            Err(Error::Rejected(self.message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_outcome_becomes_user_error() {
        let err = Outcome::fail("Task not found.")
            .into_result()
            .expect_err("failure");
        assert_eq!(err.to_string(), "Task not found.");
        assert_eq!(err.exit_code(), crate::error::exit_codes::USER_ERROR);
    }

    #[test]
    fn task_id_is_omitted_when_absent() {
        let json = serde_json::to_value(Outcome::ok("done")).expect("json");
        assert_eq!(json["success"], true);
        assert!(json.get("taskId").is_none());

        let json = serde_json::to_value(Outcome::ok("done").with_task_id("t1")).expect("json");
        assert_eq!(json["taskId"], "t1");
    }
}
