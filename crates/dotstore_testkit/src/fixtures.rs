//! Test fixtures and store helpers.
//!
//! Provides convenience functions for opening stores in temporary
//! directories and inspecting their backing files.

use dotstore_core::{ChangeFeed, Config, Store};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A 32-byte key for encrypted test stores.
pub const TEST_KEY: &str = "0123456789abcdef0123456789abcdef";

/// File name of the backing file inside a fixture's directory.
pub const STORE_FILE: &str = "store.json";

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The configuration used to open (and reopen) the store.
    config: Config,
    /// The temporary directory (kept alive to prevent cleanup).
    dir: TempDir,
}

impl TestStore {
    /// Creates a plain-text store in a fresh temporary directory.
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// Creates an encrypted store using [`TEST_KEY`].
    pub fn encrypted() -> Self {
        Self::with_config(|config| config.encryption_key(TEST_KEY))
    }

    /// Creates a store whose configuration is adjusted by `configure`.
    ///
    /// The path is set to a file inside the temporary directory before
    /// `configure` runs.
    pub fn with_config(configure: impl FnOnce(Config) -> Config) -> Self {
        Self::with_feed(configure, ChangeFeed::new())
    }

    /// Creates a store that publishes through `feed` from the start.
    pub fn with_feed(configure: impl FnOnce(Config) -> Config, feed: ChangeFeed) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let config = configure(Config::new().path(dir.path().join(STORE_FILE)));
        let store = Store::open_with_feed(config.clone(), feed).expect("Failed to open store");

        Self { store, config, dir }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Returns the temporary directory holding the backing file.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Returns a path inside the temporary directory.
    pub fn sibling(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Returns the configuration the store was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reads the raw backing file bytes.
    pub fn read_raw(&self) -> Vec<u8> {
        fs::read(self.path()).expect("Failed to read backing file")
    }

    /// Reads the backing file as text.
    pub fn read_text(&self) -> String {
        String::from_utf8(self.read_raw()).expect("Backing file is not UTF-8")
    }

    /// Replaces the backing file behind the store's back.
    pub fn write_raw(&self, bytes: impl AsRef<[u8]>) {
        fs::write(self.path(), bytes).expect("Failed to write backing file");
    }

    /// Opens a second, independent store on the same backing file.
    pub fn open_again(&self) -> Store {
        Store::open(self.config.clone()).expect("Failed to reopen store")
    }

    /// Replaces the store with a freshly opened one.
    pub fn reopen(&mut self) {
        self.store = self.open_again();
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl std::ops::DerefMut for TestStore {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.store
    }
}

/// Runs a test with a temporary plain-text store.
///
/// # Example
///
/// ```rust
/// use dotstore_testkit::with_temp_store;
///
/// let visits = with_temp_store(|store| store.add("visits", 1.0).unwrap());
/// assert_eq!(visits, 1.0);
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&mut Store) -> R,
{
    let mut test_store = TestStore::new();
    f(&mut test_store.store)
}

/// Runs a test with a temporary encrypted store.
pub fn with_encrypted_store<F, R>(f: F) -> R
where
    F: FnOnce(&mut Store) -> R,
{
    let mut test_store = TestStore::encrypted();
    f(&mut test_store.store)
}
