//! Advisory lock serializing access to one store file.
//!
//! Every command loads the whole store, changes it in memory, and writes it
//! back. Holding [`StoreLock`] across that whole read-modify-write keeps two
//! processes from loading the same snapshot and dropping each other's edits.
//! The lock lives on a sibling `<store>.lock` file, so the store itself can
//! still be replaced by rename.
//!
//! Advisory locks are cooperative: only callers that take this lock are
//! serialized.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::debug;

/// Exclusive lock on a store. Released when dropped.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Block until the exclusive lock for the store at `store_path` is held.
    ///
    /// Creates the store directory and the lock file as needed.
    pub fn acquire(store_path: &Path) -> Result<Self> {
        let path = lock_path(store_path);
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create store directory {}", dir.display()))?;
        }

        #[allow(clippy::suspicious_open_options)]
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .with_context(|| format!("failed to open lock file {}", path.display()))?;
        FileExt::lock_exclusive(&file)
            .with_context(|| format!("failed to acquire exclusive lock: {}", path.display()))?;

        debug!(path = %path.display(), "store lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // Closing the file releases the lock anyway.
        let _ = FileExt::unlock(&self.file);
        debug!(path = %self.path.display(), "store lock released");
    }
}

/// `<store>.lock` next to the store file.
pub fn lock_path(store_path: &Path) -> PathBuf {
    let mut name = store_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "store.json".into());
    name.push(".lock");
    store_path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn lock_path_is_sibling() {
        assert_eq!(
            lock_path(Path::new("/data/stageplan/plans.json")),
            PathBuf::from("/data/stageplan/plans.json.lock")
        );
    }

    #[test]
    fn acquire_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("nested").join("plans.json");
        let lock = StoreLock::acquire(&store).unwrap();
        assert!(lock.path().exists());
    }

    #[test]
    fn lock_is_exclusive_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("plans.json");

        let held = StoreLock::acquire(&store).unwrap();
        let other = File::open(lock_path(&store)).unwrap();
        assert!(FileExt::try_lock_exclusive(&other).is_err());

        drop(held);
        assert!(FileExt::try_lock_exclusive(&other).is_ok());
    }

    #[test]
    fn second_acquire_waits_for_release() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("plans.json");

        let held = StoreLock::acquire(&store).unwrap();
        let (tx, rx) = mpsc::channel();
        let waiter = {
            let store = store.clone();
            thread::spawn(move || {
                let _lock = StoreLock::acquire(&store).unwrap();
                tx.send(()).unwrap();
            })
        };

        assert!(
            rx.recv_timeout(Duration::from_millis(100)).is_err(),
            "second lock should block while the first is held"
        );
        drop(held);
        rx.recv_timeout(Duration::from_secs(5))
            .expect("second lock should be granted after release");
        waiter.join().unwrap();
    }
}
