//! Derived views over a task collection.
//!
//! Everything here is pure: counts, deadline buckets, sort orders, the list
//! filter and the dashboard aggregates. Nothing is persisted.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Local, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Choice, Priority, Role, Task, TaskFilter, TaskStatus, User};

/// Window inside which an open deadline counts as approaching
pub const APPROACHING_WINDOW_DAYS: i64 = 2;

/// Number of tasks shown in the "recent" dashboard list
pub const RECENT_TASKS_LIMIT: usize = 5;

// =========================================================================
// Counts
// =========================================================================

/// Count per discrete value. Values with no tasks read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Counts<K: Ord>(BTreeMap<K, usize>);

impl<K: Ord> Counts<K> {
    pub fn get(&self, key: &K) -> usize {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &usize)> {
        self.0.iter()
    }
}

impl<K: Ord> FromIterator<K> for Counts<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counts = BTreeMap::new();
        for key in iter {
            *counts.entry(key).or_insert(0) += 1;
        }
        Counts(counts)
    }
}

pub fn count_by_status(tasks: &[Task]) -> Counts<TaskStatus> {
    tasks.iter().map(|task| task.status).collect()
}

pub fn count_by_priority(tasks: &[Task]) -> Counts<Priority> {
    tasks.iter().map(|task| task.priority).collect()
}

// =========================================================================
// Deadlines
// =========================================================================

/// True iff the deadline is strictly before `now`.
pub fn is_deadline_past(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    deadline < now
}

/// True iff the deadline is not past and at most two days away.
pub fn is_deadline_approaching(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    is_deadline_approaching_within(deadline, now, Duration::days(APPROACHING_WINDOW_DAYS))
}

pub fn is_deadline_approaching_within(
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    deadline <= now + window && !is_deadline_past(deadline, now)
}

/// Open tasks whose deadline has passed.
pub fn overdue_tasks(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| !task.is_completed() && is_deadline_past(task.deadline, now))
        .collect()
}

/// Open tasks due within `window`.
pub fn approaching_tasks(tasks: &[Task], now: DateTime<Utc>, window: Duration) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| {
            !task.is_completed() && is_deadline_approaching_within(task.deadline, now, window)
        })
        .collect()
}

/// Completed tasks last touched on the same local calendar day as `now`.
pub fn completed_today(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
    let today = now.with_timezone(&Local).date_naive();
    tasks
        .iter()
        .filter(|task| {
            task.is_completed() && task.updated_at.with_timezone(&Local).date_naive() == today
        })
        .collect()
}

/// The first `limit` tasks in collection order.
pub fn recent_tasks(tasks: &[Task], limit: usize) -> &[Task] {
    &tasks[..tasks.len().min(limit)]
}

// =========================================================================
// Sorting
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Newest,
    Oldest,
    Deadline,
    Priority,
    Status,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Deadline => "deadline",
            SortOrder::Priority => "priority",
            SortOrder::Status => "status",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "deadline" => Ok(SortOrder::Deadline),
            "priority" => Ok(SortOrder::Priority),
            "status" => Ok(SortOrder::Status),
            other => Err(Error::InvalidArgument(format!(
                "invalid sort '{other}': must be newest, oldest, deadline, priority, or status"
            ))),
        }
    }
}

/// Stable sort; ties keep their input order.
pub fn sort_tasks(tasks: &mut [Task], order: SortOrder) {
    match order {
        SortOrder::Newest => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Oldest => tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::Deadline => tasks.sort_by(|a, b| a.deadline.cmp(&b.deadline)),
        SortOrder::Priority => tasks.sort_by_key(|task| task.priority.rank()),
        SortOrder::Status => tasks.sort_by_key(|task| task.status.rank()),
    }
}

/// Sorted copy of `tasks`.
pub fn sorted(tasks: &[Task], order: SortOrder) -> Vec<Task> {
    let mut out = tasks.to_vec();
    sort_tasks(&mut out, order);
    out
}

// =========================================================================
// Filtering
// =========================================================================

/// The projection a viewer sees for `filter`.
///
/// Status, priority and assignee are exact matches, search is a
/// case-insensitive substring of title or description, all ANDed. Employees
/// are then restricted to their own tasks whatever the assignee filter says.
pub fn apply_filter(tasks: &[Task], filter: &TaskFilter, viewer: Option<&User>) -> Vec<Task> {
    let search = filter
        .search
        .as_deref()
        .filter(|text| !text.is_empty())
        .map(str::to_lowercase);

    tasks
        .iter()
        .filter(|task| filter.status.matches(&task.status))
        .filter(|task| filter.priority.matches(&task.priority))
        .filter(|task| filter.assignee_id.matches(&task.assignee_id))
        .filter(|task| match &search {
            Some(needle) => {
                task.title.to_lowercase().contains(needle)
                    || task.description.to_lowercase().contains(needle)
            }
            None => true,
        })
        .filter(|task| match viewer {
            Some(user) if user.role == Role::Employee => task.assignee_id == user.id,
            _ => true,
        })
        .cloned()
        .collect()
}

// =========================================================================
// Users
// =========================================================================

pub fn filter_users_by_role<'a>(users: &'a [User], role: &Choice<Role>) -> Vec<&'a User> {
    users.iter().filter(|user| role.matches(&user.role)).collect()
}

/// Users whose name or email contains `text`, ignoring case.
pub fn search_users<'a>(users: &[&'a User], text: &str) -> Vec<&'a User> {
    let needle = text.to_lowercase();
    users
        .iter()
        .copied()
        .filter(|user| {
            user.name.to_lowercase().contains(&needle)
                || user.email.to_lowercase().contains(&needle)
        })
        .collect()
}

// =========================================================================
// Dashboards
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStats {
    pub user_id: String,
    pub name: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub in_progress_tasks: usize,
    /// Completed share in whole percent, 0 when the employee has no tasks
    pub productivity_rate: u32,
}

/// Per-employee workload, in user order. Admins are skipped.
pub fn employee_stats(tasks: &[Task], users: &[User]) -> Vec<EmployeeStats> {
    users
        .iter()
        .filter(|user| user.role == Role::Employee)
        .map(|employee| {
            let owned: Vec<&Task> = tasks
                .iter()
                .filter(|task| task.assignee_id == employee.id)
                .collect();
            let count = |status: TaskStatus| owned.iter().filter(|t| t.status == status).count();
            let completed = count(TaskStatus::Completed);
            let rate = if owned.is_empty() {
                0
            } else {
                ((completed as f64 / owned.len() as f64) * 100.0).round() as u32
            };
            EmployeeStats {
                user_id: employee.id.clone(),
                name: employee.name.clone(),
                total_tasks: owned.len(),
                completed_tasks: completed,
                pending_tasks: count(TaskStatus::Pending),
                in_progress_tasks: count(TaskStatus::InProgress),
                productivity_rate: rate,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_tasks: usize,
    pub by_status: Counts<TaskStatus>,
    pub by_priority: Counts<Priority>,
    pub overdue: Vec<String>,
    pub approaching: Vec<String>,
    pub completed_today: usize,
    pub assigned_to_viewer: usize,
    pub recent: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employees: Option<Vec<EmployeeStats>>,
}

impl DashboardSummary {
    /// Aggregate `tasks` for `viewer`. Employee workload is only included
    /// for admins.
    pub fn build(
        tasks: &[Task],
        users: &[User],
        viewer: &User,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Self {
        let ids = |list: Vec<&Task>| -> Vec<String> { list.into_iter().map(|t| t.id.clone()).collect() };
        Self {
            total_tasks: tasks.len(),
            by_status: count_by_status(tasks),
            by_priority: count_by_priority(tasks),
            overdue: ids(overdue_tasks(tasks, now)),
            approaching: ids(approaching_tasks(tasks, now, window)),
            completed_today: completed_today(tasks, now).len(),
            assigned_to_viewer: tasks
                .iter()
                .filter(|task| task.assignee_id == viewer.id)
                .count(),
            recent: recent_tasks(tasks, RECENT_TASKS_LIMIT)
                .iter()
                .map(|t| t.id.clone())
                .collect(),
            employees: viewer.is_admin().then(|| employee_stats(tasks, users)),
        }
    }
}

/// Parse an optional CLI filter value, where `all` or absence means no filter.
pub fn parse_choice<T>(raw: Option<&str>) -> Result<Choice<T>>
where
    T: FromStr<Err = Error>,
{
    match raw {
        Some(value) => value.parse(),
        None => Ok(Choice::All),
    }
}
