//! Encryption at rest using AES-256-CBC.
//!
//! ## Envelope Format
//!
//! ```text
//! hex(iv) ":" hex(ciphertext)
//! ```
//!
//! - `iv` is 16 random bytes, generated fresh for every encryption
//! - `ciphertext` is the PKCS#7-padded plaintext encrypted in CBC mode
//! - hex is lowercase
//!
//! ## Security Model
//!
//! - Keys are exactly 32 bytes and are zeroized on drop
//! - There is **no authentication tag**: tampering is not detected. A
//!   modified envelope either fails to decrypt (bad padding) or decrypts to
//!   garbage. Callers that need integrity must add it themselves.

use crate::error::{CodecError, CodecResult};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;
/// Separator between the IV and ciphertext in an envelope.
pub const ENVELOPE_SEPARATOR: char = ':';

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Encryption key for AES-256-CBC.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CodecError::invalid_key_size(bytes.len(), KEY_SIZE));
        }

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Returns the key as a byte slice.
    ///
    /// # Security
    ///
    /// Don't log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

/// Parses a key from its text form: the UTF-8 bytes of the string, which
/// must be exactly 32 bytes long.
impl FromStr for EncryptionKey {
    type Err = CodecError;

    fn from_str(s: &str) -> CodecResult<Self> {
        Self::from_bytes(s.as_bytes())
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Seals and opens encrypted envelopes with a fixed key.
#[derive(Clone, Debug)]
pub struct Cipher {
    key: EncryptionKey,
}

impl Cipher {
    /// Creates a cipher for the given key.
    #[must_use]
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Encrypts `plaintext` under a fresh random IV and returns the envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the cipher cannot be initialized.
    pub fn encrypt(&self, plaintext: &[u8]) -> CodecResult<String> {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);
        self.encrypt_with_iv(&iv, plaintext)
    }

    fn encrypt_with_iv(&self, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> CodecResult<String> {
        let ciphertext = Aes256CbcEnc::new_from_slices(self.key.as_bytes(), iv)
            .map_err(|e| CodecError::encryption_failed(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        Ok(format!(
            "{}{ENVELOPE_SEPARATOR}{}",
            hex::encode(iv),
            hex::encode(ciphertext)
        ))
    }

    /// Decrypts an envelope produced by [`encrypt`](Self::encrypt).
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope is malformed, the IV has the wrong
    /// length, or the padding does not validate (usually a wrong key).
    pub fn decrypt(&self, envelope: &str) -> CodecResult<Vec<u8>> {
        let (iv_hex, ciphertext_hex) = envelope
            .trim()
            .split_once(ENVELOPE_SEPARATOR)
            .ok_or_else(|| CodecError::decryption_failed("missing IV separator"))?;

        let iv = hex::decode(iv_hex)
            .map_err(|e| CodecError::decryption_failed(format!("invalid IV hex: {e}")))?;
        if iv.len() != IV_SIZE {
            return Err(CodecError::decryption_failed(format!(
                "invalid IV length: expected {IV_SIZE}, got {}",
                iv.len()
            )));
        }
        let ciphertext = hex::decode(ciphertext_hex)
            .map_err(|e| CodecError::decryption_failed(format!("invalid ciphertext hex: {e}")))?;

        Aes256CbcDec::new_from_slices(self.key.as_bytes(), &iv)
            .map_err(|e| CodecError::decryption_failed(e.to_string()))?
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CodecError::decryption_failed("bad padding"))
    }
}
