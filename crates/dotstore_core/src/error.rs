//! Error types for dotstore core.

use dotstore_codec::ValueKind;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in dotstore core operations.
///
/// Only configuration and caller mistakes reach the public mutators.
/// Storage and codec failures are absorbed by the store and reported
/// through the change feed instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] dotstore_storage::StorageError),

    /// Codec or encryption error.
    #[error("codec error: {0}")]
    Codec(#[from] dotstore_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store configuration is invalid.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// The value at a key has the wrong kind for the operation.
    #[error("value at '{key}' is {actual}, expected {expected}")]
    TypeMismatch {
        /// The key that was operated on.
        key: String,
        /// The kind the operation requires.
        expected: ValueKind,
        /// The kind actually stored.
        actual: ValueKind,
    },

    /// Unsupported arithmetic operator.
    #[error("invalid operator '{operator}': expected one of + - * / %")]
    InvalidOperator {
        /// The operator that was given.
        operator: String,
    },

    /// The key is empty or contains an empty segment.
    #[error("invalid key '{key}': keys must be non-empty dot-separated segments")]
    InvalidKey {
        /// The key that was given.
        key: String,
    },
}

impl CoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(key: impl Into<String>, expected: ValueKind, actual: ValueKind) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected,
            actual,
        }
    }

    /// Creates an invalid operator error.
    pub fn invalid_operator(operator: impl Into<String>) -> Self {
        Self::InvalidOperator {
            operator: operator.into(),
        }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey { key: key.into() }
    }
}
