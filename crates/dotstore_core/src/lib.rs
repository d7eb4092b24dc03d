//! # dotstore Core
//!
//! A small embedded key-value store persisted as a single JSON file.
//!
//! This crate provides:
//! - [`Store`], an in-memory document with dot-path access (`"a.b.c"`)
//! - Atomic whole-file snapshots through `dotstore_storage`
//! - Optional AES-256-CBC encryption at rest through `dotstore_codec`
//! - A [`ChangeFeed`] publishing ready, set, delete, clear and error events
//! - Numeric ([`Store::math`]) and array ([`Store::push`], [`Store::pull`]) helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dotstore_core::{Config, Store};
//!
//! let config = Config::new()
//!     .path("data/app.json")
//!     .encryption_key("0123456789abcdef0123456789abcdef");
//!
//! let mut store = Store::open(config)?;
//! store.set("user.name", "Alice")?;
//! store.push("user.tags", ["admin", "ops"])?;
//! store.math("user.score", "*", 2.0)?;
//!
//! assert!(store.has("user.name"));
//! assert!(store.backup("data/app.backup.json"));
//! # Ok::<(), dotstore_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_feed;
mod config;
mod error;
mod math;
mod path;
mod persist;
mod store;

pub use change_feed::{ChangeEvent, ChangeFeed, EventKind, Observer};
pub use config::{Config, DEFAULT_PATH};
pub use error::{CoreError, CoreResult};
pub use math::MathOp;
pub use path::{resolve_delete, resolve_get, resolve_set, KeyPath, SEPARATOR};
pub use persist::{LoadOutcome, LoadResult, Persistence};
pub use store::Store;

pub use dotstore_codec::{Document, Map, Value, ValueKind};
