//! Demo data written into an empty store on first open.

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::model::{new_id, Comment, Priority, Role, Task, TaskStatus, User};
use crate::storage::{Collection, Persistence};

/// Seed users and tasks into whichever collections are empty.
///
/// Returns true when anything was written. Existing data is never touched.
pub fn seed_defaults(persistence: &Persistence) -> Result<bool> {
    let mut users: Vec<User> = persistence.get(&Collection::Users)?;
    let mut seeded = false;

    if users.is_empty() {
        users = default_users();
        persistence.replace_all(&Collection::Users, &users)?;
        tracing::info!(count = users.len(), "seeded demo users");
        seeded = true;
    }

    let tasks: Vec<Task> = persistence.get(&Collection::Tasks)?;
    if tasks.is_empty() && users.len() >= 3 {
        let tasks = default_tasks(&users, Utc::now());
        persistence.replace_all(&Collection::Tasks, &tasks)?;
        tracing::info!(count = tasks.len(), "seeded demo tasks");
        seeded = true;
    }

    Ok(seeded)
}

fn default_users() -> Vec<User> {
    [
        ("Admin User", "admin@example.com", Role::Admin),
        ("John Employee", "john@example.com", Role::Employee),
        ("Jane Employee", "jane@example.com", Role::Employee),
    ]
    .into_iter()
    .map(|(name, email, role)| User {
        id: new_id(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        avatar: None,
    })
    .collect()
}

fn default_tasks(users: &[User], now: DateTime<Utc>) -> Vec<Task> {
    let admin = &users[0];
    let john = &users[1];
    let jane = &users[2];

    let task = |title: &str,
                description: &str,
                status: TaskStatus,
                priority: Priority,
                assignee: &User,
                deadline: DateTime<Utc>,
                created_at: DateTime<Utc>,
                updated_at: DateTime<Utc>,
                comments: Vec<Comment>| Task {
        id: new_id(),
        title: title.to_string(),
        description: description.to_string(),
        status,
        priority,
        assignee_id: assignee.id.clone(),
        assignee_name: assignee.name.clone(),
        created_by_id: admin.id.clone(),
        created_by_name: admin.name.clone(),
        deadline,
        created_at,
        updated_at,
        comments,
    };

    let comment = |author: &User, text: &str, at: DateTime<Utc>| Comment {
        id: new_id(),
        text: text.to_string(),
        user_id: author.id.clone(),
        user_name: author.name.clone(),
        created_at: at,
    };

    vec![
        task(
            "Complete project documentation",
            "Write comprehensive documentation for the new feature",
            TaskStatus::Pending,
            Priority::High,
            john,
            now + Duration::days(2),
            now,
            now,
            Vec::new(),
        ),
        task(
            "Review code changes",
            "Review pull request for the authentication module",
            TaskStatus::InProgress,
            Priority::Medium,
            jane,
            now + Duration::days(1),
            now - Duration::days(2),
            now - Duration::days(1),
            vec![comment(
                admin,
                "Please focus on security aspects",
                now - Duration::days(1),
            )],
        ),
        task(
            "Update website content",
            "Update the about page with new team information",
            TaskStatus::Completed,
            Priority::Low,
            john,
            now - Duration::days(3),
            now - Duration::days(5),
            now - Duration::days(2),
            vec![comment(
                john,
                "Content has been updated as requested",
                now - Duration::days(2),
            )],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_empty_store_once() {
        let persistence = Persistence::in_memory();
        assert!(seed_defaults(&persistence).expect("seed"));
        assert!(!seed_defaults(&persistence).expect("reseed"));

        let users: Vec<User> = persistence.get(&Collection::Users).expect("users");
        let tasks: Vec<Task> = persistence.get(&Collection::Tasks).expect("tasks");
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].email, "admin@example.com");
        assert!(users[0].is_admin());
        assert_eq!(tasks.len(), 3);
        assert!(tasks.iter().all(|t| t.created_by_id == users[0].id));
        assert!(tasks.iter().all(|t| t.updated_at >= t.created_at));
    }

    #[test]
    fn existing_tasks_are_left_alone() {
        let persistence = Persistence::in_memory();
        seed_defaults(&persistence).expect("seed");
        persistence
            .remove_collection(&Collection::Users)
            .expect("drop users");

        seed_defaults(&persistence).expect("reseed");
        let tasks: Vec<Task> = persistence.get(&Collection::Tasks).expect("tasks");
        assert_eq!(tasks.len(), 3);
    }
}
