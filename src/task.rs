//! Task store.
//!
//! Owns the in-memory task collection for this process plus the filtered
//! projection for the current viewer. Every mutation writes through to
//! [`Persistence`] first and only then replaces the in-memory copy, so a
//! failed write leaves both sides unchanged and a successful call is
//! visible to `get_task` as soon as it returns.
//!
//! Assignee and creator names are copied onto the task when it is written
//! and are not refreshed if the user is renamed later.

use chrono::Utc;

use crate::error::Result;
use crate::model::{
    new_id, Comment, NotificationKind, Task, TaskFilter, TaskFormData, TaskStatus, User,
};
use crate::notify::Notifications;
use crate::outcome::Outcome;
use crate::storage::{Collection, Persistence};
use crate::views;

#[derive(Debug, Clone)]
pub struct TaskStore {
    persistence: Persistence,
    notifications: Notifications,
    tasks: Vec<Task>,
    filter: TaskFilter,
    viewer: Option<User>,
    filtered: Vec<Task>,
}

impl TaskStore {
    pub fn new(persistence: Persistence) -> Self {
        Self {
            notifications: Notifications::new(persistence.clone()),
            persistence,
            tasks: Vec::new(),
            filter: TaskFilter::default(),
            viewer: None,
            filtered: Vec::new(),
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks matching the active filter, restricted for employees.
    pub fn filtered_tasks(&self) -> &[Task] {
        &self.filtered
    }

    /// Everything the viewer may see, ignoring the active filter.
    pub fn visible_tasks(&self) -> Vec<Task> {
        views::apply_filter(&self.tasks, &TaskFilter::default(), self.viewer.as_ref())
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
        self.refilter();
    }

    pub fn viewer(&self) -> Option<&User> {
        self.viewer.as_ref()
    }

    /// Called whenever the authenticated user changes.
    pub fn set_viewer(&mut self, viewer: Option<User>) {
        self.viewer = viewer;
        self.refilter();
    }

    pub fn get_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replace the in-memory collection with what is persisted.
    pub fn fetch_tasks(&mut self) -> Result<()> {
        self.tasks = self.persistence.get(&Collection::Tasks)?;
        tracing::debug!(count = self.tasks.len(), "tasks loaded");
        self.refilter();
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn create_task(&mut self, data: TaskFormData) -> Outcome {
        let Some(creator) = self.viewer.clone() else {
            return Outcome::fail("You must be logged in to create a task.");
        };

        let result = (|| -> Result<Task> {
            let now = Utc::now();
            let task = Task {
                id: new_id(),
                assignee_name: self.assignee_name(&data.assignee_id)?,
                title: data.title,
                description: data.description,
                status: data.status,
                priority: data.priority,
                assignee_id: data.assignee_id,
                created_by_id: creator.id.clone(),
                created_by_name: creator.name.clone(),
                deadline: data.deadline,
                created_at: now,
                updated_at: now,
                comments: Vec::new(),
            };
            self.persistence.put(&Collection::Tasks, &task)?;
            Ok(task)
        })();

        match result {
            Ok(task) => {
                tracing::debug!(task_id = %task.id, assignee = %task.assignee_id, "task created");
                if task.assignee_id != creator.id {
                    self.notify(
                        &task.assignee_id,
                        format!("New task assigned: {}", task.title),
                    );
                }
                let task_id = task.id.clone();
                self.tasks.push(task);
                self.refilter();
                Outcome::ok("Task created successfully!").with_task_id(task_id)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to create task");
                Outcome::fail("Failed to create task.")
            }
        }
    }

    /// Merge `data` over an existing task.
    pub fn update_task(&mut self, task_id: &str, data: TaskFormData) -> Outcome {
        let existing = match self.persisted(task_id) {
            Ok(Some(task)) => task,
            Ok(None) => return Outcome::fail("Task not found."),
            Err(err) => {
                tracing::error!(error = %err, task_id, "failed to load task");
                return Outcome::fail("Failed to update task.");
            }
        };

        let result = (|| -> Result<Task> {
            let updated = Task {
                assignee_name: self.assignee_name(&data.assignee_id)?,
                title: data.title,
                description: data.description,
                status: data.status,
                priority: data.priority,
                assignee_id: data.assignee_id,
                deadline: data.deadline,
                updated_at: Utc::now(),
                ..existing.clone()
            };
            self.persistence.put(&Collection::Tasks, &updated)?;
            Ok(updated)
        })();

        match result {
            Ok(updated) => {
                tracing::debug!(task_id, "task updated");
                let actor = self.viewer.as_ref().map(|user| user.id.as_str());
                if updated.assignee_id != existing.assignee_id
                    && Some(updated.assignee_id.as_str()) != actor
                {
                    self.notify(
                        &updated.assignee_id,
                        format!("Task reassigned to you: {}", updated.title),
                    );
                }
                self.replace_in_memory(updated);
                Outcome::ok("Task updated successfully!")
            }
            Err(err) => {
                tracing::error!(error = %err, task_id, "failed to update task");
                Outcome::fail("Failed to update task.")
            }
        }
    }

    /// Remove a task. Deleting an unknown id still succeeds.
    pub fn delete_task(&mut self, task_id: &str) -> Outcome {
        if let Err(err) = self.persistence.delete(&Collection::Tasks, task_id) {
            tracing::error!(error = %err, task_id, "failed to delete task");
            return Outcome::fail("Failed to delete task.");
        }

        tracing::debug!(task_id, "task deleted");
        self.tasks.retain(|task| task.id != task_id);
        self.refilter();
        Outcome::ok("Task deleted successfully!")
    }

    pub fn update_task_status(&mut self, task_id: &str, status: TaskStatus) -> Outcome {
        let existing = match self.persisted(task_id) {
            Ok(Some(task)) => task,
            Ok(None) => return Outcome::fail("Task not found."),
            Err(err) => {
                tracing::error!(error = %err, task_id, "failed to load task");
                return Outcome::fail("Failed to update task status.");
            }
        };

        let updated = Task {
            status,
            updated_at: Utc::now(),
            ..existing
        };

        if let Err(err) = self.persistence.put(&Collection::Tasks, &updated) {
            tracing::error!(error = %err, task_id, "failed to update task status");
            return Outcome::fail("Failed to update task status.");
        }

        tracing::debug!(task_id, status = %status, "task status changed");
        self.replace_in_memory(updated);
        Outcome::ok("Task status updated successfully!")
    }

    /// Append a comment by the current viewer.
    pub fn add_comment(&mut self, task_id: &str, text: &str) -> Outcome {
        let Some(author) = self.viewer.clone() else {
            return Outcome::fail("You must be logged in to add a comment.");
        };

        let mut task = match self.persisted(task_id) {
            Ok(Some(task)) => task,
            Ok(None) => return Outcome::fail("Task not found."),
            Err(err) => {
                tracing::error!(error = %err, task_id, "failed to load task");
                return Outcome::fail("Failed to add comment.");
            }
        };

        let now = Utc::now();
        task.comments.push(Comment {
            id: new_id(),
            text: text.to_string(),
            user_id: author.id.clone(),
            user_name: author.name.clone(),
            created_at: now,
        });
        task.updated_at = now;

        if let Err(err) = self.persistence.put(&Collection::Tasks, &task) {
            tracing::error!(error = %err, task_id, "failed to add comment");
            return Outcome::fail("Failed to add comment.");
        }

        tracing::debug!(task_id, comments = task.comments.len(), "comment added");
        if task.assignee_id != author.id {
            self.notify(
                &task.assignee_id,
                format!("{} commented on: {}", author.name, task.title),
            );
        }
        self.replace_in_memory(task);
        Outcome::ok("Comment added successfully!")
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn persisted(&self, task_id: &str) -> Result<Option<Task>> {
        self.persistence.find(&Collection::Tasks, task_id)
    }

    /// Current display name of `user_id`, or empty when unknown.
    fn assignee_name(&self, user_id: &str) -> Result<String> {
        Ok(self
            .persistence
            .find::<User>(&Collection::Users, user_id)?
            .map(|user| user.name)
            .unwrap_or_default())
    }

    fn replace_in_memory(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = views::apply_filter(&self.tasks, &self.filter, self.viewer.as_ref());
    }

    fn notify(&self, user_id: &str, message: String) {
        if user_id.is_empty() {
            return;
        }
        if let Err(err) = self.notifications.push(user_id, message, NotificationKind::Info) {
            tracing::warn!(error = %err, user_id, "failed to store notification");
        }
    }
}
