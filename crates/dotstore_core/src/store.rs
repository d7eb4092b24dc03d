//! The store facade.

use crate::change_feed::{ChangeEvent, ChangeFeed};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::math::MathOp;
use crate::path::{self, KeyPath};
use crate::persist::{LoadOutcome, Persistence};
use dotstore_codec::{Document, Value, ValueKind};
use dotstore_storage::{FileBackend, StorageBackend};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A file-backed key-value store.
///
/// `Store` keeps the whole document in memory and rewrites the backing file
/// after every mutation. It provides:
/// - Dot-path access to nested values (`"user.profile.name"`)
/// - Numeric and array helpers (`add`, `math`, `push`, `pull`)
/// - Optional AES-256-CBC encryption of the backing file
/// - A [`ChangeFeed`] publishing every mutation
///
/// # Consistency
///
/// Reads only consult memory. Changes made to the backing file by anyone
/// else are invisible until [`reload`](Self::reload) or the next open.
/// Every mutation runs: change memory, save, publish. A failed save does
/// not fail the mutation; it is published as [`ChangeEvent::Error`] and
/// memory keeps the change.
///
/// # Example
///
/// ```rust,no_run
/// use dotstore_core::Store;
///
/// let mut store = Store::open("app.json")?;
/// store.set("user.name", "Alice")?;
/// store.add("user.visits", 1.0)?;
///
/// assert_eq!(store.get("user.name").and_then(|v| v.as_str()), Some("Alice"));
/// # Ok::<(), dotstore_core::CoreError>(())
/// ```
pub struct Store {
    /// Configuration.
    config: Config,
    /// Absolute location of the backing file.
    path: PathBuf,
    /// Snapshot load/save.
    persistence: Persistence,
    /// The authoritative document.
    document: Document,
    /// Event distribution.
    feed: ChangeFeed,
}

impl Store {
    /// Opens a store backed by a file.
    ///
    /// Accepts a [`Config`] or anything convertible into one, such as a
    /// bare path. The backing file is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the encryption key is not 32
    /// bytes; no file is touched in that case. A missing, blank or
    /// undecodable file is never an error.
    pub fn open(config: impl Into<Config>) -> CoreResult<Self> {
        Self::open_with_feed(config, ChangeFeed::new())
    }

    /// Opens a store whose change feed already has observers, so they
    /// receive the [`ChangeEvent::Ready`] event.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn open_with_feed(config: impl Into<Config>, feed: ChangeFeed) -> CoreResult<Self> {
        let config = config.into();
        let codec = config.codec()?;
        let path = config.resolved_path()?;
        let backend = FileBackend::new(&path);
        Ok(Self::assemble(config, path, Box::new(backend), codec, feed))
    }

    /// Opens a store over an arbitrary storage backend.
    ///
    /// The configured path is only used for display and logging.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn open_with_backend(
        config: impl Into<Config>,
        backend: Box<dyn StorageBackend>,
        feed: ChangeFeed,
    ) -> CoreResult<Self> {
        let config = config.into();
        let codec = config.codec()?;
        let path = config.resolved_path()?;
        Ok(Self::assemble(config, path, backend, codec, feed))
    }

    fn assemble(
        config: Config,
        path: PathBuf,
        backend: Box<dyn StorageBackend>,
        codec: dotstore_codec::Codec,
        feed: ChangeFeed,
    ) -> Self {
        let mut store = Self {
            config,
            path,
            persistence: Persistence::new(backend, codec),
            document: Document::new(),
            feed,
        };
        store.load();
        store
    }

    /// Replaces the in-memory document with the backing file's content and
    /// publishes [`ChangeEvent::Ready`].
    ///
    /// Like opening, an undecodable file yields an empty document.
    pub fn reload(&mut self) {
        tracing::debug!(path = %self.path.display(), "reloading store");
        self.load();
    }

    fn load(&mut self) {
        let loaded = self.persistence.load();
        self.document = loaded.document;

        match loaded.outcome {
            LoadOutcome::Created => {
                tracing::debug!(path = %self.path.display(), "created empty store file");
            }
            LoadOutcome::Blank => {
                tracing::debug!(path = %self.path.display(), "store file is blank");
            }
            LoadOutcome::Decoded => {
                tracing::debug!(
                    path = %self.path.display(),
                    keys = self.document.len(),
                    "loaded store"
                );
            }
            LoadOutcome::Reset(err) => {
                if self.config.debug {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %err,
                        "failed to load store, starting empty"
                    );
                }
            }
            LoadOutcome::CreateFailed(err) => self.report_save_failure(&err),
        }

        self.publish(ChangeEvent::Ready);
    }

    /// Saves the document, publishing a failure instead of returning it.
    fn persist(&mut self) {
        match self.persistence.save(&self.document) {
            Ok(()) => {
                tracing::trace!(path = %self.path.display(), "store saved");
            }
            Err(err) => self.report_save_failure(&err),
        }
    }

    fn report_save_failure(&self, err: &CoreError) {
        if self.config.debug {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to write store");
        }
        self.publish(ChangeEvent::error(err.to_string()));
    }

    fn publish(&self, event: ChangeEvent) {
        self.feed.emit(self, &event);
    }

    /// Sets the value at `key`, creating intermediate objects as needed.
    ///
    /// Returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] if `key` is empty or has an empty
    /// segment. Write failures are not errors; see the type docs.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> CoreResult<Value> {
        let path: KeyPath = key.parse()?;
        let value = value.into();

        path::resolve_set(&mut self.document, &path, value.clone());
        self.persist();
        self.publish(ChangeEvent::set(key, value.clone()));
        Ok(value)
    }

    /// Serializes `value` and stores it at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON or the key
    /// is invalid.
    pub fn set_typed<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> CoreResult<Value> {
        let value = Value::from_serialize(value)?;
        self.set(key, value)
    }

    /// Returns the value at `key`.
    ///
    /// Invalid keys and keys that do not resolve return `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        KeyPath::parse(key).and_then(|path| path::resolve_get(&self.document, &path))
    }

    /// Returns the value at `key`, or `default` if it does not resolve.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.get(key).cloned().unwrap_or_else(|| default.into())
    }

    /// Deserializes the value at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value does not have the shape of `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Option<T>> {
        self.get(key)
            .map(|value| value.deserialize_into::<T>())
            .transpose()
            .map_err(CoreError::from)
    }

    /// Returns whether `key` resolves to a value (including `null`).
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes the value at `key`.
    ///
    /// Saves and publishes only if something was removed. Returns whether a
    /// value was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let Some(path) = KeyPath::parse(key) else {
            return false;
        };
        if !path::resolve_delete(&mut self.document, &path) {
            return false;
        }

        self.persist();
        self.publish(ChangeEvent::delete(key));
        true
    }

    /// Adds `amount` to the number at `key` (missing counts as 0).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the current value is not a number.
    pub fn add(&mut self, key: &str, amount: f64) -> CoreResult<f64> {
        self.apply(key, MathOp::Add, amount)
    }

    /// Subtracts `amount` from the number at `key` (missing counts as 0).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the current value is not a number.
    pub fn subtract(&mut self, key: &str, amount: f64) -> CoreResult<f64> {
        self.apply(key, MathOp::Subtract, amount)
    }

    /// Applies the operator `op` (`+ - * / %`) to the number at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperator`] for an unknown operator and
    /// [`CoreError::TypeMismatch`] if the current value is not a number.
    pub fn math(&mut self, key: &str, op: &str, operand: f64) -> CoreResult<f64> {
        let op: MathOp = op.parse()?;
        self.apply(key, op, operand)
    }

    /// Applies `op` to the number at `key` and stores the result.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the current value is not a number.
    pub fn apply(&mut self, key: &str, op: MathOp, operand: f64) -> CoreResult<f64> {
        let current = match self.get(key) {
            None => 0.0,
            Some(Value::Number(n)) => *n,
            Some(other) => {
                return Err(CoreError::type_mismatch(key, ValueKind::Number, other.kind()))
            }
        };

        let result = op.apply(current, operand);
        self.set(key, result)?;
        Ok(result)
    }

    /// Appends `items` to the array at `key` (missing counts as empty).
    ///
    /// Returns the new array.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the current value is not an array.
    pub fn push<I>(&mut self, key: &str, items: I) -> CoreResult<Vec<Value>>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut array = self.array_at(key)?;
        array.extend(items.into_iter().map(Into::into));
        self.set(key, array.clone())?;
        Ok(array)
    }

    /// Removes every element of the array at `key` equal to `item`.
    ///
    /// Equality is structural: objects match regardless of key order.
    /// Returns the new array.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the current value is not an array.
    pub fn pull(&mut self, key: &str, item: impl Into<Value>) -> CoreResult<Vec<Value>> {
        let target = item.into();
        self.pull_where(key, |value| *value == target)
    }

    /// Removes every element of the array at `key` for which `predicate`
    /// returns true. Returns the new array.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the current value is not an array.
    pub fn pull_where<F>(&mut self, key: &str, predicate: F) -> CoreResult<Vec<Value>>
    where
        F: Fn(&Value) -> bool,
    {
        let mut array = self.array_at(key)?;
        array.retain(|value| !predicate(value));
        self.set(key, array.clone())?;
        Ok(array)
    }

    fn array_at(&self, key: &str) -> CoreResult<Vec<Value>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(other) => Err(CoreError::type_mismatch(key, ValueKind::Array, other.kind())),
        }
    }

    /// Returns a copy of the whole document.
    ///
    /// Changing the copy does not affect the store.
    #[must_use]
    pub fn all(&self) -> Document {
        self.document.clone()
    }

    /// Returns the top-level keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.document.keys().map(String::as_str)
    }

    /// Returns the number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.document.len()
    }

    /// Returns true if the document has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// Removes every key, saves, and publishes [`ChangeEvent::Clear`].
    pub fn clear(&mut self) {
        self.document.clear();
        self.persist();
        self.publish(ChangeEvent::Clear);
    }

    /// Copies the backing file as it currently is on disk to `dest`.
    ///
    /// Returns whether the copy succeeded. Never fails and publishes nothing.
    pub fn backup(&self, dest: impl AsRef<Path>) -> bool {
        let dest = dest.as_ref();
        match self.persistence.backup(dest) {
            Ok(bytes) => {
                tracing::debug!(dest = %dest.display(), bytes, "backup written");
                true
            }
            Err(err) => {
                if self.config.debug {
                    tracing::warn!(dest = %dest.display(), error = %err, "backup failed");
                }
                false
            }
        }
    }

    /// Returns the absolute path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the change feed, for registering observers.
    #[must_use]
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("keys", &self.document.len())
            .field("encrypted", &self.persistence.codec().is_encrypted())
            .field("feed", &self.feed)
            .finish()
    }
}
