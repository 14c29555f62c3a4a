//! Records shared by the identity layer, the task store and the views.
//!
//! Field names serialize in camelCase so the persisted collections keep the
//! shape the web client wrote (`assigneeId`, `createdAt`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};

/// Generate a fresh record identifier.
pub fn new_id() -> String {
    Ulid::new().to_string().to_lowercase()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(Error::InvalidArgument(format!(
                "invalid role '{other}': must be admin or employee"
            ))),
        }
    }
}

/// Task lifecycle. Declaration order is the `status` sort rank.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Completed => 2,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(Error::InvalidArgument(format!(
                "invalid status '{other}': must be pending, in-progress, or completed"
            ))),
        }
    }
}

/// Task priority. Declaration order is the `priority` sort rank.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(Error::InvalidArgument(format!(
                "invalid priority '{other}': must be low, medium, or high"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub user_id: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee_id: String,
    #[serde(default)]
    pub assignee_name: String,
    pub created_by_id: String,
    #[serde(default)]
    pub created_by_name: String,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Task {
    /// Admins and the assignee may edit, re-status or delete a task.
    pub fn can_be_modified_by(&self, user: &User) -> bool {
        user.is_admin() || user.id == self.assignee_id
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Editable fields of a task, as submitted by the create/edit forms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskFormData {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee_id: String,
    pub deadline: DateTime<Utc>,
}

impl From<&Task> for TaskFormData {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            assignee_id: task.assignee_id.clone(),
            deadline: task.deadline,
        }
    }
}

/// A filter slot: either everything (`all`, or left unset) or one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T: PartialEq> Choice<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(expected) => expected == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }
}

impl<T: FromStr> FromStr for Choice<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Choice::All);
        }
        trimmed.parse().map(Choice::Only)
    }
}

impl<T> From<Option<T>> for Choice<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Choice::Only).unwrap_or_default()
    }
}

/// Ephemeral list query held by the task store. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskFilter {
    pub status: Choice<TaskStatus>,
    pub priority: Choice<Priority>,
    pub assignee_id: Choice<String>,
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_all()
            && self.priority.is_all()
            && self.assignee_id.is_all()
            && self.search.as_deref().map_or(true, str::is_empty)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Parse a deadline given as RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_deadline(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "invalid deadline '{trimmed}': expected YYYY-MM-DD or RFC 3339"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).expect("json");
        assert_eq!(json, "\"in-progress\"");
        assert_eq!("in_progress".parse::<TaskStatus>().expect("parse"), TaskStatus::InProgress);
    }

    #[test]
    fn choice_treats_all_and_empty_as_unset() {
        assert_eq!("all".parse::<Choice<Priority>>().expect("parse"), Choice::All);
        assert_eq!("".parse::<Choice<Priority>>().expect("parse"), Choice::All);
        assert_eq!(
            "HIGH".parse::<Choice<Priority>>().expect("parse"),
            Choice::Only(Priority::High)
        );
        assert!("urgent".parse::<Choice<Priority>>().is_err());
    }

    #[test]
    fn task_reads_client_shaped_json() {
        let raw = r#"{
            "id": "t1",
            "title": "Ship",
            "description": "Ship it",
            "status": "in-progress",
            "priority": "high",
            "assigneeId": "u2",
            "assigneeName": "John Employee",
            "createdById": "u1",
            "createdByName": "Admin User",
            "deadline": "2024-05-01T12:00:00.000Z",
            "createdAt": "2024-04-01T12:00:00.000Z",
            "updatedAt": "2024-04-02T12:00:00.000Z",
            "comments": []
        }"#;
        let task: Task = serde_json::from_str(raw).expect("task");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.assignee_name, "John Employee");
        assert_eq!(task.deadline, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn deadline_accepts_dates_and_timestamps() {
        assert_eq!(
            parse_deadline("2024-05-01").expect("date"),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_deadline("2024-05-01T10:30:00+02:00").expect("rfc3339"),
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
        );
        assert!(parse_deadline("tomorrow").is_err());
    }

    #[test]
    fn only_admin_or_assignee_may_modify() {
        let admin = User {
            id: "a".into(),
            name: "Admin".into(),
            email: "a@example.com".into(),
            role: Role::Admin,
            avatar: None,
        };
        let assignee = User {
            id: "e1".into(),
            role: Role::Employee,
            ..admin.clone()
        };
        let other = User {
            id: "e2".into(),
            role: Role::Employee,
            ..admin.clone()
        };
        let now = Utc::now();
        let task = Task {
            id: "t".into(),
            title: "t".into(),
            description: String::new(),
            status: TaskStatus::Pending,
            priority: Priority::Low,
            assignee_id: "e1".into(),
            assignee_name: String::new(),
            created_by_id: "a".into(),
            created_by_name: String::new(),
            deadline: now,
            created_at: now,
            updated_at: now,
            comments: Vec::new(),
        };
        assert!(task.can_be_modified_by(&admin));
        assert!(task.can_be_modified_by(&assignee));
        assert!(!task.can_be_modified_by(&other));
    }
}
