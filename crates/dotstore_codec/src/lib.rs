//! # dotstore Codec
//!
//! Document model and byte encoding for dotstore.
//!
//! This crate provides:
//! - [`Value`], a tagged JSON value with an explicit [`ValueKind`]
//! - [`Document`], the top-level object a store persists
//! - [`Codec`], which turns documents into bytes and back
//! - [`Cipher`] and [`EncryptionKey`], the AES-256-CBC envelope used for
//!   encryption at rest
//!
//! ## Stored Formats
//!
//! - Plain: a UTF-8 JSON object, optionally indented with 2 spaces
//! - Encrypted: `hex(iv):hex(ciphertext)`, where the plaintext is compact JSON
//!
//! ## Usage
//!
//! ```
//! use dotstore_codec::{Codec, Document, Value};
//!
//! let key = "0123456789abcdef0123456789abcdef".parse().unwrap();
//! let codec = Codec::encrypted(key);
//!
//! let mut doc = Document::new();
//! doc.insert("token".into(), Value::from("s3cret"));
//!
//! let bytes = codec.encode(&doc).unwrap();
//! assert!(!String::from_utf8_lossy(&bytes).contains("s3cret"));
//! assert_eq!(codec.decode(&bytes).unwrap(), doc);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod crypto;
mod error;
mod value;

pub use codec::Codec;
pub use crypto::{Cipher, EncryptionKey, ENVELOPE_SEPARATOR, IV_SIZE, KEY_SIZE};
pub use error::{CodecError, CodecResult};
pub use value::{Document, Map, Value, ValueKind};
