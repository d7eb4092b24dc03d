//! In-memory snapshot backend for testing.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An in-memory snapshot backend.
///
/// This backend keeps the snapshot in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// It also counts successful writes, which lets tests assert that an
/// operation did or did not persist. `Arc<InMemoryBackend>` is itself a
/// backend, so a test can hand a clone to a store and keep inspecting it.
///
/// # Example
///
/// ```rust
/// use dotstore_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// backend.write_atomic(b"test data").unwrap();
/// assert_eq!(backend.write_count(), 1);
/// assert_eq!(backend.data().unwrap(), b"test data");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<Option<Vec<u8>>>,
    writes: AtomicUsize,
}

impl InMemoryBackend {
    /// Creates a new backend with no snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend holding a pre-existing snapshot.
    ///
    /// Useful for testing load behavior.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(Some(data)),
            writes: AtomicUsize::new(0),
        }
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }

    /// Replaces the snapshot without counting it as a write.
    ///
    /// Simulates another process modifying the stored bytes.
    pub fn overwrite_externally(&self, data: Vec<u8>) {
        *self.data.write() = Some(data);
    }

    /// Returns how many times `write_atomic` has succeeded.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn replace(&self, data: &[u8]) {
        *self.data.write() = Some(data.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn copy_snapshot(&self, dest: &Path) -> StorageResult<u64> {
        let data = self.data.read();
        let bytes = data
            .as_ref()
            .ok_or_else(|| StorageError::not_found("<memory>"))?;
        fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    }
}

impl StorageBackend for InMemoryBackend {
    fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().clone())
    }

    fn write_atomic(&mut self, data: &[u8]) -> StorageResult<()> {
        self.replace(data);
        Ok(())
    }

    fn copy_to(&self, dest: &Path) -> StorageResult<u64> {
        self.copy_snapshot(dest)
    }
}

impl StorageBackend for Arc<InMemoryBackend> {
    fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data())
    }

    fn write_atomic(&mut self, data: &[u8]) -> StorageResult<()> {
        self.replace(data);
        Ok(())
    }

    fn copy_to(&self, dest: &Path) -> StorageResult<u64> {
        self.copy_snapshot(dest)
    }
}
