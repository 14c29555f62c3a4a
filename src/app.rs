//! Application context.
//!
//! Wires persistence, identity, tasks and notifications together for one
//! data directory. Every CLI command opens a [`Workspace`], restores the
//! session and works against the same shared store.

use std::path::{Path, PathBuf};

use chrono::Duration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::identity::IdentityProvider;
use crate::model::{Task, User};
use crate::notify::Notifications;
use crate::outcome::Outcome;
use crate::seed;
use crate::storage::{FileStore, Persistence};
use crate::task::TaskStore;

#[derive(Debug)]
pub struct Workspace {
    data_dir: Option<PathBuf>,
    config: Config,
    identity: IdentityProvider,
    tasks: TaskStore,
    notifications: Notifications,
}

impl Workspace {
    /// Open the file-backed store in `data_dir`, seeding it if configured.
    pub fn open(data_dir: &Path, config: Config) -> Result<Self> {
        let store = FileStore::open(data_dir, config.storage.lock_timeout_ms)?;
        let mut workspace = Self::from_persistence(Persistence::new(store), config)?;
        workspace.data_dir = Some(data_dir.to_path_buf());
        Ok(workspace)
    }

    /// Build on an existing store (tests use the in-memory one).
    pub fn from_persistence(persistence: Persistence, config: Config) -> Result<Self> {
        if config.seed.enabled {
            seed::seed_defaults(&persistence)?;
        }

        let mut identity = IdentityProvider::new(persistence.clone());
        identity.check_auth()?;

        let mut tasks = TaskStore::new(persistence.clone());
        tasks.fetch_tasks()?;
        tasks.set_viewer(identity.current_user().cloned());

        Ok(Self {
            data_dir: None,
            config,
            identity,
            tasks,
            notifications: Notifications::new(persistence),
        })
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn identity(&self) -> &IdentityProvider {
        &self.identity
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskStore {
        &mut self.tasks
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn current_user(&self) -> Option<&User> {
        self.identity.current_user()
    }

    /// The logged-in user, or [`Error::NotAuthenticated`].
    pub fn require_user(&self) -> Result<User> {
        self.current_user().cloned().ok_or(Error::NotAuthenticated)
    }

    pub fn approaching_window(&self) -> Duration {
        self.config.deadlines.approaching_window()
    }

    /// Tasks the current viewer is allowed to see.
    pub fn visible_tasks(&self) -> Vec<Task> {
        self.tasks.visible_tasks()
    }

    pub fn login(&mut self, email: &str, password: &str) -> Outcome {
        let outcome = self.identity.login(email, password);
        self.sync_viewer();
        outcome
    }

    pub fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Outcome {
        let outcome = self.identity.signup(name, email, password, confirm_password);
        self.sync_viewer();
        outcome
    }

    pub fn logout(&mut self) -> Outcome {
        let outcome = self.identity.logout();
        self.sync_viewer();
        outcome
    }

    fn sync_viewer(&mut self) {
        self.tasks.set_viewer(self.identity.current_user().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_follows_login_state() {
        let mut workspace =
            Workspace::from_persistence(Persistence::in_memory(), Config::default())
                .expect("workspace");
        assert!(workspace.tasks().viewer().is_none());
        assert!(matches!(workspace.require_user(), Err(Error::NotAuthenticated)));

        assert!(workspace.login("john@example.com", "").success);
        let john = workspace.require_user().expect("john");
        assert_eq!(workspace.tasks().viewer(), Some(&john));
        assert!(workspace
            .visible_tasks()
            .iter()
            .all(|task| task.assignee_id == john.id));

        workspace.logout();
        assert!(workspace.tasks().viewer().is_none());
    }

    #[test]
    fn session_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut first = Workspace::open(dir.path(), Config::default()).expect("open");
        assert!(first.login("admin@example.com", "").success);

        let second = Workspace::open(dir.path(), Config::default()).expect("reopen");
        assert_eq!(
            second.current_user().map(|u| u.email.as_str()),
            Some("admin@example.com")
        );
        assert_eq!(second.tasks().tasks().len(), 3);
        assert_eq!(second.data_dir(), Some(dir.path()));
    }
}
