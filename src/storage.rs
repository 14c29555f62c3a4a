//! Persistence adapter for taskdesk
//!
//! State lives in a flat key-value store. Each key holds one JSON document:
//!
//! ```text
//! users                    # array of User
//! tasks                    # array of Task
//! auth_token               # session token, a JSON string (the logged-in user's id)
//! notifications_<userId>   # array of Notification
//! ```
//!
//! [`FileStore`] maps every key to `<data-dir>/<key>.json`; [`MemoryStore`]
//! keeps them in a map for tests and embedding. Business code only sees the
//! typed [`Persistence`] handle.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::model::{Notification, Task, User};

/// Key of the session token scalar
pub const SESSION_KEY: &str = "auth_token";

/// A named collection of records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection {
    Users,
    Tasks,
    Notifications(String),
}

impl Collection {
    pub fn key(&self) -> String {
        match self {
            Collection::Users => "users".to_string(),
            Collection::Tasks => "tasks".to_string(),
            Collection::Notifications(user_id) => format!("notifications_{user_id}"),
        }
    }
}

/// A persisted record addressable by id
pub trait Record: Serialize + DeserializeOwned + Clone {
    fn id(&self) -> &str;
}

impl Record for User {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Notification {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Closure applied by [`KeyValueStore::update`]. Returning `None` removes the key.
pub type UpdateFn<'a> = dyn FnMut(Option<String>) -> Result<Option<String>> + 'a;

/// Raw string storage. Every write is visible to the next read.
pub trait KeyValueStore: fmt::Debug + Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;

    fn write(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Read-modify-write a key while holding the store's exclusive guard.
    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<()>;
}

// =========================================================================
// In-memory store
// =========================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<()> {
        let mut entries = self.entries();
        match f(entries.get(key).cloned())? {
            Some(value) => {
                entries.insert(key.to_string(), value);
            }
            None => {
                entries.remove(key);
            }
        }
        Ok(())
    }
}

// =========================================================================
// On-disk store
// =========================================================================

/// One JSON file per key in a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>, lock_timeout_ms: u64) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock_timeout_ms,
        })
    }

    pub fn with_default_timeout(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open(dir, DEFAULT_LOCK_TIMEOUT_MS)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn lock(&self, path: &Path) -> Result<FileLock> {
        FileLock::acquire(lock::lock_path_for(path), self.lock_timeout_ms)
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _lock = self.lock(&path)?;
        lock::write_atomic(&path, value.as_bytes())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _lock = self.lock(&path)?;
        remove_if_exists(&path)
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<()> {
        let path = self.path_for(key)?;
        let _lock = self.lock(&path)?;

        let current = match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };

        match f(current)? {
            Some(value) => lock::write_atomic(&path, value.as_bytes()),
            None => remove_if_exists(&path),
        }
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || !key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(Error::InvalidArgument(format!(
            "invalid storage key '{key}'"
        )));
    }
    Ok(())
}

// =========================================================================
// Typed handle
// =========================================================================

/// Typed, collection-scoped access to a shared [`KeyValueStore`].
///
/// Clones share the same underlying store.
#[derive(Debug, Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// All records of a collection; a missing key is an empty collection.
    pub fn get<T: Record>(&self, collection: &Collection) -> Result<Vec<T>> {
        let raw = self.store.read(&collection.key())?;
        decode_collection(raw.as_deref())
    }

    pub fn find<T: Record>(&self, collection: &Collection, id: &str) -> Result<Option<T>> {
        Ok(self
            .get::<T>(collection)?
            .into_iter()
            .find(|record| record.id() == id))
    }

    /// Upsert by id: replace in place, or append.
    pub fn put<T: Record>(&self, collection: &Collection, record: &T) -> Result<()> {
        let key = collection.key();
        tracing::debug!(collection = %key, id = record.id(), "put record");
        self.store.update(&key, &mut |current: Option<String>| {
            let mut records: Vec<T> = decode_collection(current.as_deref())?;
            match records.iter().position(|existing| existing.id() == record.id()) {
                Some(index) => records[index] = record.clone(),
                None => records.push(record.clone()),
            }
            Ok(Some(serde_json::to_string_pretty(&records)?))
        })
    }

    /// Remove a record by id. An absent id is a no-op.
    pub fn delete(&self, collection: &Collection, id: &str) -> Result<()> {
        let key = collection.key();
        tracing::debug!(collection = %key, id, "delete record");
        self.store.update(&key, &mut |current: Option<String>| {
            let Some(current) = current else {
                return Ok(None);
            };
            let mut records: Vec<serde_json::Value> = decode_collection_values(&current)?;
            records.retain(|value| value.get("id").and_then(|v| v.as_str()) != Some(id));
            Ok(Some(serde_json::to_string_pretty(&records)?))
        })
    }

    /// Overwrite a whole collection.
    pub fn replace_all<T: Record>(&self, collection: &Collection, records: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        self.store.write(&collection.key(), &json)
    }

    /// Drop a whole collection.
    pub fn remove_collection(&self, collection: &Collection) -> Result<()> {
        self.store.remove(&collection.key())
    }

    // =========================================================================
    // Session token
    // =========================================================================

    /// The token is stored as a JSON string so `auth_token.json` parses like
    /// every other key. A blank token reads as no session.
    pub fn session_token(&self) -> Result<Option<String>> {
        let Some(raw) = self.store.read(SESSION_KEY)? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let token: String = serde_json::from_str(&raw)?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    pub fn set_session_token(&self, token: &str) -> Result<()> {
        self.store.write(SESSION_KEY, &serde_json::to_string(token)?)
    }

    pub fn clear_session_token(&self) -> Result<()> {
        self.store.remove(SESSION_KEY)
    }
}

fn decode_collection<T: DeserializeOwned>(raw: Option<&str>) -> Result<Vec<T>> {
    match raw {
        Some(content) if !content.trim().is_empty() => Ok(serde_json::from_str(content)?),
        _ => Ok(Vec::new()),
    }
}

fn decode_collection_values(raw: &str) -> Result<Vec<serde_json::Value>> {
    decode_collection(Some(raw))
}
