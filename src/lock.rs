//! Cross-process locking and atomic replacement of store files
//!
//! Two `taskdesk` processes may share a data directory (a shell loop, a
//! second terminal). Each key file is rewritten whole, so a writer holds an
//! exclusive fs2 lock on the sibling `<file>.lock` while it reads, changes
//! and replaces the file through a temp file and rename.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// How long a writer waits for a busy key before giving up.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Exclusive hold on a lock file, released on drop.
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Poll for the lock until `timeout_ms` passes, then fail with
    /// [`Error::LockFailed`].
    pub fn acquire(path: impl AsRef<Path>, timeout_ms: u64) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLock { file }),
                Err(err) if held_elsewhere(&err) => {
                    if Instant::now() >= deadline {
                        tracing::warn!(path = %path.display(), timeout_ms, "gave up waiting for lock");
                        return Err(Error::LockFailed(path.to_path_buf()));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn held_elsewhere(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

/// `tasks.json` is guarded by `tasks.json.lock`.
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Replace `path` with `data` via a temp file in the same directory.
///
/// Takes no lock itself; callers racing other writers hold a [`FileLock`].
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let mut staging = path.as_os_str().to_owned();
    staging.push(format!(".tmp.{}", std::process::id()));
    let staging = PathBuf::from(staging);

    let mut file = File::create(&staging)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&staging, path)?;
    Ok(())
}
