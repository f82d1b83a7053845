use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

/// How long to sleep between `try_lock` attempts.
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Advisory lock errors for the journal lock file.
#[derive(Debug)]
pub enum LockError {
    Timeout { path: PathBuf, waited: Duration },
    IoError(io::Error),
}

impl From<io::Error> for LockError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::IoError(_) => ErrorCode::JournalWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { path, waited } => write!(
                f,
                "{}: journal lock timed out after {:?} at {}",
                self.code().code(),
                waited,
                path.display()
            ),
            Self::IoError(err) => write!(f, "{}: {}", self.code().code(), err),
        }
    }
}

impl std::error::Error for LockError {}

#[derive(Debug)]
struct FileGuard {
    file: File,
    path: PathBuf,
}

impl FileGuard {
    fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            if file.try_lock_exclusive().is_ok() {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }
            thread::sleep(RETRY_INTERVAL);
        }
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Exclusive lock held while opening or appending to the journal.
#[derive(Debug)]
pub struct JournalLock {
    guard: FileGuard,
}

impl JournalLock {
    /// Acquire the exclusive advisory lock, retrying until `timeout`.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] if another holder keeps the lock past `timeout`.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Ok(Self {
            guard: FileGuard::acquire(path, timeout)?,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.guard.path
    }
}

#[cfg(test)]
mod tests {
    use super::{JournalLock, LockError};
    use crate::error::ErrorCode;
    use std::{
        sync::{Arc, Barrier},
        thread,
        time::Duration,
    };

    #[test]
    fn acquire_creates_parent_dirs() -> Result<(), LockError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(".verso").join("lock");
        let lock = JournalLock::acquire(&path, Duration::from_millis(50))?;
        assert_eq!(lock.path(), path.as_path());
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn second_writer_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");
        let _held = JournalLock::acquire(&path, Duration::from_millis(50)).unwrap();
        let err = JournalLock::acquire(&path, Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, LockError::Timeout { path: ref p, .. } if *p == path));
        assert_eq!(err.code(), ErrorCode::LockContention);
        assert!(err.hint().is_some());
    }

    #[test]
    fn lock_is_free_after_holder_thread_exits() -> Result<(), LockError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lock");

        let held = Arc::new(Barrier::new(2));
        let done = Arc::new(Barrier::new(2));
        let (held_t, done_t, path_t) = (Arc::clone(&held), Arc::clone(&done), path.clone());
        let handle = thread::spawn(move || {
            let _w = JournalLock::acquire(&path_t, Duration::from_millis(200)).unwrap();
            held_t.wait();
            done_t.wait();
        });

        held.wait();
        assert!(JournalLock::acquire(&path, Duration::from_millis(20)).is_err());
        done.wait();
        handle.join().unwrap();

        let _again = JournalLock::acquire(&path, Duration::from_millis(50))?;
        Ok(())
    }
}
