use crate::errors::PipelineError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock serializing runs that share one seen-listings
/// store. Released on drop.
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Lock file sitting next to the store: `<store>.lock`.
    pub fn path_for(store_path: &Path) -> PathBuf {
        let mut name = store_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn open(path: &Path) -> Result<File, PipelineError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?)
    }

    /// Blocks until no other run holds the lock.
    pub fn acquire(store_path: &Path) -> Result<Self, PipelineError> {
        let path = Self::path_for(store_path);
        let file = Self::open(&path)?;
        file.lock_exclusive()?;
        tracing::debug!(lock = %path.display(), "run lock acquired");
        Ok(Self { file, path })
    }

    /// Returns `None` instead of blocking when another run holds the lock.
    #[cfg(test)]
    pub fn try_acquire(store_path: &Path) -> Result<Option<Self>, PipelineError> {
        let path = Self::path_for(store_path);
        let file = Self::open(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(lock = %self.path.display(), error = %e, "failed to release run lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::temp_path;

    #[test]
    fn lock_path_is_sibling_of_store() {
        assert_eq!(
            RunLock::path_for(Path::new("data/seen.sqlite3")),
            PathBuf::from("data/seen.sqlite3.lock")
        );
    }

    #[test]
    fn second_run_cannot_take_held_lock() {
        let store = temp_path("lock_held", "sqlite3");

        let first = RunLock::acquire(&store).unwrap();
        assert!(RunLock::try_acquire(&store).unwrap().is_none());

        drop(first);
        assert!(RunLock::try_acquire(&store).unwrap().is_some());
    }
}
