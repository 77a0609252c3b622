use crate::error::LockError;
use anyhow::Context;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Clone, Debug)]
pub struct BackupLock {
    path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockSnapshot {
    pub present: bool,
    pub age: Option<Duration>,
    pub stale: bool,
    pub created: Option<String>,
}

impl BackupLock {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn age(&self) -> anyhow::Result<Option<Duration>> {
        let meta = match fs::metadata(&self.path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).context("read lockfile metadata"),
        };
        let modified = meta.modified().context("read lockfile mtime")?;
        Ok(Some(
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default(),
        ))
    }

    pub fn is_stale(&self, max_age: Duration) -> bool {
        matches!(self.age(), Ok(Some(age)) if age > max_age)
    }

    pub fn created(&self) -> Option<String> {
        fs::read_to_string(&self.path)
            .ok()
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
    }

    pub fn snapshot(&self, max_age: Duration) -> LockSnapshot {
        let age = self.age().ok().flatten();
        LockSnapshot {
            present: age.is_some(),
            age,
            stale: age.map(|age| age > max_age).unwrap_or(false),
            created: self.created(),
        }
    }

    pub fn acquire(&self, stale_after: Duration) -> anyhow::Result<LockGuard> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("create lockfile directory")?;
        }
        if self.exists() {
            if !self.is_stale(stale_after) {
                return Err(LockError::Held {
                    path: self.path.clone(),
                }
                .into());
            }
            warn!(path = %self.path.display(), "Taking over stale backup lock");
            self.remove()?;
        }
        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(LockError::Held {
                    path: self.path.clone(),
                }
                .into());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("create lockfile {}", self.path.display()));
            }
        };
        self.claim(file)
    }

    /// Locks and stamps a freshly created marker, deleting it again on failure.
    fn claim(&self, mut file: File) -> anyhow::Result<LockGuard> {
        let stamped: anyhow::Result<()> = if file.try_lock_exclusive().is_err() {
            Err(LockError::Held {
                path: self.path.clone(),
            }
            .into())
        } else {
            OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .context("format lock timestamp")
                .and_then(|stamp| writeln!(file, "{stamp}").context("write lockfile"))
        };
        if let Err(err) = stamped {
            if let Err(cleanup) = fs::remove_file(&self.path) {
                warn!(
                    path = %self.path.display(),
                    error = %cleanup,
                    "Removing partial lockfile failed"
                );
            }
            return Err(err);
        }
        info!(path = %self.path.display(), "Backup lock acquired");
        Ok(LockGuard {
            path: self.path.clone(),
            file,
        })
    }

    pub fn remove(&self) -> anyhow::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).context("remove lockfile"),
        }
    }
}

#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    file: File,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = fs::remove_file(&self.path);
    }
}

pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backdate(path: &Path, by: Duration) {
        let file = OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn missing_lock_is_never_stale() {
        let tmp = TempDir::new().unwrap();
        let lock = BackupLock::new(&tmp.path().join("backup.lock"));
        assert!(!lock.exists());
        assert!(!lock.is_stale(Duration::ZERO));
        assert_eq!(lock.age().unwrap(), None);
    }

    #[test]
    fn staleness_follows_modification_time() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("backup.lock");
        fs::write(&path, "2024-01-01T00:00:00Z\n").unwrap();
        let lock = BackupLock::new(&path);
        assert!(!lock.is_stale(Duration::from_secs(60)));
        backdate(&path, Duration::from_secs(120));
        assert!(lock.is_stale(Duration::from_secs(60)));
        assert!(!lock.is_stale(Duration::from_secs(600)));
    }

    #[test]
    fn lock_prevents_double_acquire_and_clears_on_drop() {
        let tmp = TempDir::new().unwrap();
        let lock = BackupLock::new(&tmp.path().join("run").join("backup.lock"));
        let guard = lock.acquire(DEFAULT_STALE_AFTER).unwrap();
        assert!(lock.exists());
        assert!(lock.created().is_some());
        let err = lock.acquire(DEFAULT_STALE_AFTER).unwrap_err();
        assert!(err.downcast_ref::<LockError>().is_some());
        drop(guard);
        assert!(!lock.exists());
        assert!(lock.acquire(DEFAULT_STALE_AFTER).is_ok());
    }

    #[test]
    fn failed_stamp_removes_the_marker() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("backup.lock");
        fs::write(&path, "").unwrap();
        let read_only = File::open(&path).unwrap();
        let lock = BackupLock::new(&path);
        assert!(lock.claim(read_only).is_err());
        assert!(!lock.exists());
        assert!(lock.acquire(DEFAULT_STALE_AFTER).is_ok());
    }

    #[test]
    fn stale_lock_is_taken_over() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("backup.lock");
        fs::write(&path, "old\n").unwrap();
        backdate(&path, Duration::from_secs(3600));
        let lock = BackupLock::new(&path);
        let guard = lock.acquire(Duration::from_secs(60)).unwrap();
        assert_ne!(lock.created().as_deref(), Some("old"));
        drop(guard);
    }

    #[test]
    fn snapshot_reports_presence() {
        let tmp = TempDir::new().unwrap();
        let lock = BackupLock::new(&tmp.path().join("backup.lock"));
        assert!(!lock.snapshot(DEFAULT_STALE_AFTER).present);
        fs::write(lock.path(), "now\n").unwrap();
        let snapshot = lock.snapshot(DEFAULT_STALE_AFTER);
        assert!(snapshot.present);
        assert!(!snapshot.stale);
        assert_eq!(snapshot.created.as_deref(), Some("now"));
        assert!(lock.remove().unwrap());
        assert!(!lock.remove().unwrap());
    }

    #[test]
    fn age_formatting() {
        assert_eq!(format_age(Duration::from_secs(42)), "42s");
        assert_eq!(format_age(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_age(Duration::from_secs(7_380)), "2h 3m");
    }
}
