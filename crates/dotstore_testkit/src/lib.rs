//! # dotstore Testkit
//!
//! Test utilities for dotstore.
//!
//! This crate provides:
//! - Test fixtures backed by temporary directories
//! - Property-based test generators using proptest
//! - A fault-injecting storage backend for atomicity and error-path tests
//!
//! ## Usage
//!
//! ```rust
//! use dotstore_testkit::prelude::*;
//!
//! with_temp_store(|store| {
//!     store.set("user.name", "Ada").unwrap();
//!     assert!(store.has("user"));
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
