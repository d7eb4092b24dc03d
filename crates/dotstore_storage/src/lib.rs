//! # dotstore Storage
//!
//! Snapshot storage backends for dotstore.
//!
//! A backend holds exactly one opaque blob: the latest encoded snapshot of a
//! store's document. Backends never interpret the bytes they hold; encoding,
//! encryption and the document model live in `dotstore_codec`.
//!
//! ## Design Principles
//!
//! - A snapshot is replaced as a whole, never patched in place
//! - Replacement is atomic: readers observe the old or the new snapshot, never a mix
//! - A missing snapshot is distinct from an empty one
//! - Backends must be `Send + Sync`
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - A single file replaced through a sibling `.tmp` file and rename
//! - [`InMemoryBackend`] - For testing and ephemeral stores
//!
//! ## Example
//!
//! ```rust
//! use dotstore_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! assert!(backend.read().unwrap().is_none());
//!
//! backend.write_atomic(b"{}").unwrap();
//! assert_eq!(backend.read().unwrap().as_deref(), Some(&b"{}"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::{temp_path_for, FileBackend, TEMP_SUFFIX};
pub use memory::InMemoryBackend;
