//! Storage backend trait definition.

use crate::error::StorageResult;
use std::path::Path;

/// A snapshot storage backend for dotstore.
///
/// Backends hold a single **opaque blob**, the most recently written
/// snapshot. dotstore owns all interpretation of the bytes.
///
/// # Invariants
///
/// - `read` returns `None` until the first successful `write_atomic`
/// - after `write_atomic` returns `Ok`, `read` returns exactly those bytes
/// - if `write_atomic` fails, `read` still returns the previous snapshot
/// - backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::FileBackend`] - For persistent storage
/// - [`super::InMemoryBackend`] - For testing
pub trait StorageBackend: Send + Sync {
    /// Reads the current snapshot.
    ///
    /// Returns `Ok(None)` if no snapshot has been written yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read.
    fn read(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the snapshot with `data`.
    ///
    /// The replacement is all-or-nothing: a failure at any point leaves
    /// the previous snapshot in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the new snapshot could not be made durable.
    fn write_atomic(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Copies the current snapshot bytes to a file at `dest`.
    ///
    /// Returns the number of bytes copied. If `dest` is the snapshot's own
    /// file nothing is written and the snapshot is left intact.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no snapshot or the copy fails.
    fn copy_to(&self, dest: &Path) -> StorageResult<u64>;
}
