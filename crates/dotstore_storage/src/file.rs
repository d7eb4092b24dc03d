//! File-based snapshot backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Suffix appended to the backing file name to form the temp file name.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Returns the temp file used while replacing `path` (`<path>.tmp`).
#[must_use]
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// A snapshot backend stored in a single file.
///
/// # Durability
///
/// Snapshots are replaced with the write-then-rename pattern:
/// 1. Write the new bytes to `<path>.tmp`
/// 2. Sync the temp file to disk
/// 3. Rename the temp file over `<path>`
/// 4. Fsync the parent directory so the rename itself is durable
///
/// A crash between steps 2 and 3 leaves the old snapshot intact next to a
/// stray temp file, which the next write overwrites.
///
/// # Example
///
/// ```no_run
/// use dotstore_storage::{StorageBackend, FileBackend};
///
/// let mut backend = FileBackend::new("data.json");
/// backend.write_atomic(b"{\"a\":1}").unwrap();
/// assert!(backend.read().unwrap().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
    temp_path: PathBuf,
}

impl FileBackend {
    /// Creates a backend for the file at `path`.
    ///
    /// No I/O happens until the first read or write; the file and its
    /// parent directories are created by the first `write_atomic`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let temp_path = temp_path_for(&path);
        Self { path, temp_path }
    }

    /// Returns the path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the temp file used during replacement.
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Writes `data` to the temp file and syncs it, without publishing it.
    ///
    /// This is the first half of [`write_atomic`](StorageBackend::write_atomic).
    /// Until [`commit_temp`](Self::commit_temp) runs, readers keep seeing the
    /// previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory or temp file cannot be written.
    pub fn write_temp(&self, data: &[u8]) -> StorageResult<()> {
        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&self.temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        Ok(())
    }

    /// Publishes the temp file by renaming it over the backing file.
    ///
    /// # Errors
    ///
    /// Once the rename succeeds the new snapshot is in place, so a failed
    /// directory sync is logged rather than reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    pub fn commit_temp(&self) -> StorageResult<()> {
        fs::rename(&self.temp_path, &self.path)?;
        self.settle_directory_sync(self.sync_directory());
        Ok(())
    }

    fn settle_directory_sync(&self, synced: StorageResult<()>) {
        if let Err(err) = synced {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "snapshot replaced but directory sync failed"
            );
        }
    }

    /// Returns true if `dest` names the backing file itself.
    fn is_backing_file(&self, dest: &Path) -> StorageResult<bool> {
        if !dest.try_exists()? {
            return Ok(false);
        }
        Ok(fs::canonicalize(dest)? == fs::canonicalize(&self.path)?)
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Syncs the parent directory so a completed rename survives a crash.
    #[cfg(unix)]
    fn sync_directory(&self) -> StorageResult<()> {
        let dir = File::open(self.parent_dir().unwrap_or_else(|| Path::new(".")))?;
        dir.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StorageResult<()> {
        // NTFS journals metadata; directories cannot be opened for fsync
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_atomic(&mut self, data: &[u8]) -> StorageResult<()> {
        self.write_temp(data)?;
        self.commit_temp()?;
        tracing::trace!(path = %self.path.display(), bytes = data.len(), "snapshot replaced");
        Ok(())
    }

    fn copy_to(&self, dest: &Path) -> StorageResult<u64> {
        if !self.path.is_file() {
            return Err(StorageError::not_found(&self.path));
        }
        // Copying a file onto itself truncates it before it is read.
        if self.is_backing_file(dest)? {
            return Ok(fs::metadata(&self.path)?.len());
        }
        Ok(fs::copy(&self.path, dest)?)
    }
}
