//! Loading and saving the document snapshot.
//!
//! The persistence layer pairs a [`StorageBackend`] with a [`Codec`]. It
//! never decides how failures are reported: `load` and `save` hand back
//! explicit outcomes and the store turns them into log lines and events.

use crate::error::{CoreError, CoreResult};
use dotstore_codec::{Codec, Document};
use dotstore_storage::StorageBackend;
use std::fmt;
use std::path::Path;

/// How a load ended.
#[derive(Debug)]
pub enum LoadOutcome {
    /// No snapshot existed; an empty one was written.
    Created,
    /// No snapshot existed and writing the initial empty one failed.
    CreateFailed(CoreError),
    /// The snapshot was empty or whitespace only; nothing was written.
    Blank,
    /// The snapshot decoded successfully.
    Decoded,
    /// The snapshot could not be read or decoded; the document starts empty.
    Reset(CoreError),
}

/// The document produced by [`Persistence::load`] and how it was obtained.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded document (empty unless the outcome is `Decoded`).
    pub document: Document,
    /// What happened.
    pub outcome: LoadOutcome,
}

/// Reads and atomically rewrites a store's snapshot.
pub struct Persistence {
    backend: Box<dyn StorageBackend>,
    codec: Codec,
}

impl Persistence {
    /// Creates a persistence layer over `backend` using `codec`.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>, codec: Codec) -> Self {
        Self { backend, codec }
    }

    /// Returns the codec in use.
    #[must_use]
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Loads the snapshot into a document.
    ///
    /// Never fails: unreadable or undecodable snapshots produce an empty
    /// document and a [`LoadOutcome::Reset`]. A missing snapshot is created
    /// immediately so the backing file exists after the store opens.
    pub fn load(&mut self) -> LoadResult {
        let bytes = match self.backend.read() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                let document = Document::new();
                let outcome = match self.save(&document) {
                    Ok(()) => LoadOutcome::Created,
                    Err(err) => LoadOutcome::CreateFailed(err),
                };
                return LoadResult { document, outcome };
            }
            Err(err) => {
                return LoadResult {
                    document: Document::new(),
                    outcome: LoadOutcome::Reset(err.into()),
                }
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return LoadResult {
                document: Document::new(),
                outcome: LoadOutcome::Blank,
            };
        }

        match self.codec.decode(&bytes) {
            Ok(document) => LoadResult {
                document,
                outcome: LoadOutcome::Decoded,
            },
            Err(err) => LoadResult {
                document: Document::new(),
                outcome: LoadOutcome::Reset(err.into()),
            },
        }
    }

    /// Encodes `document` and atomically replaces the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the write fails. The previous
    /// snapshot is left in place in that case.
    pub fn save(&mut self, document: &Document) -> CoreResult<()> {
        let bytes = self.codec.encode(document)?;
        self.backend.write_atomic(&bytes)?;
        Ok(())
    }

    /// Copies the current snapshot bytes to `dest`, returning the byte count.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no snapshot or the copy fails.
    pub fn backup(&self, dest: &Path) -> CoreResult<u64> {
        Ok(self.backend.copy_to(dest)?)
    }
}

impl fmt::Debug for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persistence")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
