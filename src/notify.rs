//! Per-user notification inbox stored under `notifications_<userId>`.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::{new_id, Notification, NotificationKind};
use crate::storage::{Collection, Persistence};

#[derive(Debug, Clone)]
pub struct Notifications {
    persistence: Persistence,
}

impl Notifications {
    pub fn new(persistence: Persistence) -> Self {
        Self { persistence }
    }

    /// Append a notification to a user's inbox.
    pub fn push(
        &self,
        user_id: &str,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> Result<Notification> {
        let notification = Notification {
            id: new_id(),
            message: message.into(),
            kind,
            read: false,
            created_at: Utc::now(),
        };
        self.persistence
            .put(&inbox(user_id), &notification)?;
        tracing::debug!(user_id, id = %notification.id, "notification stored");
        Ok(notification)
    }

    /// Oldest first.
    pub fn list(&self, user_id: &str) -> Result<Vec<Notification>> {
        self.persistence.get(&inbox(user_id))
    }

    pub fn unread_count(&self, user_id: &str) -> Result<usize> {
        Ok(self.list(user_id)?.iter().filter(|n| !n.read).count())
    }

    pub fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<()> {
        let mut notification = self
            .persistence
            .find::<Notification>(&inbox(user_id), notification_id)?
            .ok_or_else(|| {
                Error::InvalidArgument(format!("notification not found: {notification_id}"))
            })?;
        notification.read = true;
        self.persistence.put(&inbox(user_id), &notification)
    }

    pub fn clear(&self, user_id: &str) -> Result<()> {
        self.persistence.remove_collection(&inbox(user_id))
    }
}

fn inbox(user_id: &str) -> Collection {
    Collection::Notifications(user_id.to_string())
}
