//! Store configuration.

use crate::error::{CoreError, CoreResult};
use dotstore_codec::{Codec, EncryptionKey, KEY_SIZE};
use std::fmt;
use std::path::{Path, PathBuf};

/// Backing file used when no path is configured.
pub const DEFAULT_PATH: &str = "database.json";

/// Configuration for opening a store.
///
/// A bare path converts into a default configuration for that file:
///
/// ```
/// use dotstore_core::Config;
///
/// let config = Config::from("settings.json");
/// assert_eq!(config.path.to_str(), Some("settings.json"));
/// assert!(config.pretty);
/// ```
#[derive(Clone)]
pub struct Config {
    /// Location of the backing file. Relative paths are resolved against
    /// the current directory when the store opens.
    pub path: PathBuf,

    /// Enables encryption at rest. Must be exactly 32 bytes.
    pub encryption_key: Option<String>,

    /// Whether plain-mode output is indented with 2 spaces.
    pub pretty: bool,

    /// Whether load, decrypt and write failures are logged.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            encryption_key: None,
            pretty: true,
            debug: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backing file location.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Enables encryption with the given 32-byte key.
    #[must_use]
    pub fn encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }

    /// Sets whether plain output is pretty-printed.
    #[must_use]
    pub const fn pretty(mut self, value: bool) -> Self {
        self.pretty = value;
        self
    }

    /// Sets whether failures are logged.
    #[must_use]
    pub const fn debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Checks the configuration without touching the file system.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if an encryption key is set
    /// and is not exactly 32 bytes.
    pub fn validate(&self) -> CoreResult<()> {
        self.codec().map(|_| ())
    }

    /// Builds the codec described by this configuration.
    pub(crate) fn codec(&self) -> CoreResult<Codec> {
        match &self.encryption_key {
            None => Ok(Codec::plain().pretty(self.pretty)),
            Some(key) => {
                let key: EncryptionKey = key.parse().map_err(|_| {
                    CoreError::configuration(format!(
                        "encryption key must be exactly {KEY_SIZE} bytes, got {}",
                        key.len()
                    ))
                })?;
                Ok(Codec::encrypted(key).pretty(self.pretty))
            }
        }
    }

    /// Returns the backing file path made absolute.
    pub(crate) fn resolved_path(&self) -> CoreResult<PathBuf> {
        Ok(std::path::absolute(&self.path)?)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("pretty", &self.pretty)
            .field("debug", &self.debug)
            .finish()
    }
}

impl From<&str> for Config {
    fn from(path: &str) -> Self {
        Self::new().path(path)
    }
}

impl From<String> for Config {
    fn from(path: String) -> Self {
        Self::new().path(path)
    }
}

impl From<&Path> for Config {
    fn from(path: &Path) -> Self {
        Self::new().path(path)
    }
}

impl From<PathBuf> for Config {
    fn from(path: PathBuf) -> Self {
        Self::new().path(path)
    }
}
