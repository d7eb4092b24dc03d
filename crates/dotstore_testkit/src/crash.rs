//! Fault injection for snapshot writes.
//!
//! [`CrashableBackend`] wraps a [`FileBackend`] and can be armed to fail
//! at a chosen point of the temp-write-then-rename sequence. The store
//! keeps the backend, so tests steer it through a cloned [`CrashSwitch`].
//!
//! ## Usage
//!
//! ```rust
//! use dotstore_core::{ChangeFeed, Config, Store};
//! use dotstore_testkit::crash::{CrashPoint, CrashableBackend};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let (backend, switch) = CrashableBackend::new(dir.path().join("db.json"));
//! let mut store =
//!     Store::open_with_backend(Config::new(), Box::new(backend), ChangeFeed::new()).unwrap();
//!
//! switch.arm(CrashPoint::AfterTempWrite);
//! store.set("a", 1).unwrap();
//! assert_eq!(switch.crash_count(), 1);
//! ```

use dotstore_storage::{FileBackend, StorageBackend, StorageError, StorageResult};
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Points at which a write can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashPoint {
    /// Fail before anything is written.
    BeforeTempWrite,
    /// Fail after the temp file is durable but before the rename.
    AfterTempWrite,
}

#[derive(Debug, Default)]
struct CrashState {
    armed: Mutex<Option<CrashPoint>>,
    crashes: AtomicUsize,
}

/// Shared control over a [`CrashableBackend`].
#[derive(Debug, Clone, Default)]
pub struct CrashSwitch {
    state: Arc<CrashState>,
}

impl CrashSwitch {
    /// Makes every following write fail at `point` until disarmed.
    pub fn arm(&self, point: CrashPoint) {
        *self.state.armed.lock() = Some(point);
    }

    /// Lets writes succeed again.
    pub fn disarm(&self) {
        *self.state.armed.lock() = None;
    }

    /// Returns the point writes currently fail at, if any.
    pub fn armed(&self) -> Option<CrashPoint> {
        *self.state.armed.lock()
    }

    /// Returns how many writes have failed so far.
    pub fn crash_count(&self) -> usize {
        self.state.crashes.load(Ordering::SeqCst)
    }

    fn crash(&self, point: CrashPoint) -> StorageError {
        self.state.crashes.fetch_add(1, Ordering::SeqCst);
        StorageError::Io(io::Error::other(format!("simulated crash at {point:?}")))
    }
}

/// A file backend that fails on command.
#[derive(Debug)]
pub struct CrashableBackend {
    inner: FileBackend,
    switch: CrashSwitch,
}

impl CrashableBackend {
    /// Creates a disarmed backend for `path` and the switch controlling it.
    pub fn new(path: impl Into<PathBuf>) -> (Self, CrashSwitch) {
        let switch = CrashSwitch::default();
        let backend = Self {
            inner: FileBackend::new(path),
            switch: switch.clone(),
        };
        (backend, switch)
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        self.inner.path()
    }
}

impl StorageBackend for CrashableBackend {
    fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        self.inner.read()
    }

    fn write_atomic(&mut self, data: &[u8]) -> StorageResult<()> {
        match self.switch.armed() {
            None => self.inner.write_atomic(data),
            Some(point @ CrashPoint::BeforeTempWrite) => Err(self.switch.crash(point)),
            Some(point @ CrashPoint::AfterTempWrite) => {
                self.inner.write_temp(data)?;
                Err(self.switch.crash(point))
            }
        }
    }

    fn copy_to(&self, dest: &Path) -> StorageResult<u64> {
        self.inner.copy_to(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn disarmed_backend_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let (mut backend, switch) = CrashableBackend::new(dir.path().join("db.json"));

        backend.write_atomic(b"{}").unwrap();
        assert_eq!(backend.read().unwrap().unwrap(), b"{}");
        assert_eq!(switch.crash_count(), 0);
    }

    #[test]
    fn crash_before_temp_write_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let (mut backend, switch) = CrashableBackend::new(&path);

        switch.arm(CrashPoint::BeforeTempWrite);
        assert!(backend.write_atomic(b"new").is_err());
        assert!(!path.exists());
        assert!(!dotstore_storage::temp_path_for(&path).exists());
    }

    #[test]
    fn crash_after_temp_write_leaves_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let (mut backend, switch) = CrashableBackend::new(&path);
        backend.write_atomic(b"old").unwrap();

        switch.arm(CrashPoint::AfterTempWrite);
        assert!(backend.write_atomic(b"new").is_err());

        assert_eq!(fs::read(&path).unwrap(), b"old");
        assert_eq!(
            fs::read(dotstore_storage::temp_path_for(&path)).unwrap(),
            b"new"
        );
        assert_eq!(switch.crash_count(), 1);
    }

    #[test]
    fn disarm_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let (mut backend, switch) = CrashableBackend::new(dir.path().join("db.json"));

        switch.arm(CrashPoint::BeforeTempWrite);
        assert!(backend.write_atomic(b"x").is_err());
        switch.disarm();
        backend.write_atomic(b"y").unwrap();

        assert_eq!(backend.read().unwrap().unwrap(), b"y");
        assert_eq!(switch.armed(), None);
    }
}
