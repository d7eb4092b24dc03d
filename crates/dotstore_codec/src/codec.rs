//! Document codec: JSON text, optionally sealed in an encrypted envelope.

use crate::crypto::{Cipher, EncryptionKey};
use crate::error::{CodecError, CodecResult};
use crate::value::{Document, Value};
use serde::Deserialize;

/// Converts a [`Document`] to and from its stored byte form.
///
/// - Plain mode writes JSON, indented with 2 spaces when `pretty` is set.
/// - Encrypted mode writes compact JSON sealed with [`Cipher`]. Decoding
///   tries the envelope first and falls back to plain JSON, so a store
///   that was written before encryption was enabled still loads.
///
/// # Example
///
/// ```
/// use dotstore_codec::{Codec, Document, Value};
///
/// let codec = Codec::plain().pretty(false);
/// let mut doc = Document::new();
/// doc.insert("a".into(), Value::from(1));
///
/// let bytes = codec.encode(&doc).unwrap();
/// assert_eq!(bytes, br#"{"a":1}"#);
/// assert_eq!(codec.decode(&bytes).unwrap(), doc);
/// ```
#[derive(Debug, Clone)]
pub struct Codec {
    pretty: bool,
    cipher: Option<Cipher>,
}

impl Default for Codec {
    fn default() -> Self {
        Self::plain()
    }
}

impl Codec {
    /// Creates a plain (unencrypted), pretty-printing codec.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            pretty: true,
            cipher: None,
        }
    }

    /// Creates a codec that encrypts with `key`.
    #[must_use]
    pub fn encrypted(key: EncryptionKey) -> Self {
        Self {
            pretty: true,
            cipher: Some(Cipher::new(key)),
        }
    }

    /// Sets whether plain output is indented.
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Returns true if this codec encrypts.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Encodes a document to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or encryption fails.
    pub fn encode(&self, doc: &Document) -> CodecResult<Vec<u8>> {
        match &self.cipher {
            Some(cipher) => {
                let json = serde_json::to_vec(doc)
                    .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
                Ok(cipher.encrypt(&json)?.into_bytes())
            }
            None if self.pretty => serde_json::to_vec_pretty(doc)
                .map_err(|e| CodecError::encoding_failed(e.to_string())),
            None => {
                serde_json::to_vec(doc).map_err(|e| CodecError::encoding_failed(e.to_string()))
            }
        }
    }

    /// Decodes bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are neither a valid envelope (when
    /// encrypting) nor a JSON object.
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<Document> {
        let Some(cipher) = &self.cipher else {
            return parse_document(bytes);
        };

        let sealed = std::str::from_utf8(bytes)
            .map_err(|e| CodecError::decryption_failed(e.to_string()))
            .and_then(|text| cipher.decrypt(text))
            .and_then(|plaintext| parse_document(&plaintext));

        match sealed {
            Ok(doc) => Ok(doc),
            Err(sealed_err) => parse_document(bytes).map_err(|plain_err| {
                CodecError::decoding_failed(format!(
                    "not an encrypted document ({sealed_err}) nor a plain one ({plain_err})"
                ))
            }),
        }
    }
}

/// Parses JSON bytes that must hold a top-level object.
///
/// Nesting depth is unbounded: `set` accepts paths of any depth, so any
/// document the encoder writes must decode again.
fn parse_document(bytes: &[u8]) -> CodecResult<Document> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = Value::deserialize(&mut de)
        .and_then(|value| de.end().map(|()| value))
        .map_err(|e| CodecError::decoding_failed(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(CodecError::invalid_format(format!(
            "expected a JSON object at the top level, found {}",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    fn doc(value: serde_json::Value) -> Document {
        match Value::from(value) {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn encrypted() -> Codec {
        Codec::encrypted(KEY.parse().unwrap())
    }

    #[test]
    fn pretty_output_uses_two_spaces() {
        let bytes = Codec::plain().encode(&doc(json!({"a": {"b": 1}}))).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\n  \"a\": {\n    \"b\": 1\n  }\n}"
        );
    }

    #[test]
    fn compact_output() {
        let bytes = Codec::plain()
            .pretty(false)
            .encode(&doc(json!({"a": [1, 2], "b": null})))
            .unwrap();
        assert_eq!(bytes, br#"{"a":[1,2],"b":null}"#);
    }

    #[test]
    fn empty_document() {
        let codec = Codec::plain();
        let bytes = codec.encode(&Document::new()).unwrap();
        assert_eq!(bytes, b"{}");
        assert!(codec.decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn malformed_json_fails() {
        let result = Codec::plain().decode(b"{not json");
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn non_object_top_level_fails() {
        for input in [&b"[1,2]"[..], b"42", b"\"text\"", b"null"] {
            let result = Codec::plain().decode(input);
            assert!(matches!(result, Err(CodecError::InvalidFormat { .. })));
        }
    }

    #[test]
    fn encrypted_roundtrip() {
        let codec = encrypted();
        let original = doc(json!({"user": {"name": "Alice", "roles": ["admin"]}}));

        let bytes = codec.encode(&original).unwrap();
        assert!(std::str::from_utf8(&bytes).unwrap().contains(':'));
        assert_eq!(codec.decode(&bytes).unwrap(), original);
    }

    #[test]
    fn encrypted_output_hides_plaintext() {
        let bytes = encrypted()
            .encode(&doc(json!({"password": "correct horse battery staple"})))
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(!text.contains("correct horse"));
        assert!(!text.contains("password"));
    }

    #[test]
    fn encrypted_codec_reads_plain_documents() {
        let plain = Codec::plain().encode(&doc(json!({"legacy": true}))).unwrap();
        assert_eq!(
            encrypted().decode(&plain).unwrap(),
            doc(json!({"legacy": true}))
        );
    }

    #[test]
    fn plain_codec_rejects_envelopes() {
        let sealed = encrypted().encode(&doc(json!({"a": 1}))).unwrap();
        assert!(Codec::plain().decode(&sealed).is_err());
    }

    #[test]
    fn wrong_key_fails_to_decode() {
        let sealed = encrypted().encode(&doc(json!({"a": 1}))).unwrap();
        let other = Codec::encrypted("ffffffffffffffffffffffffffffffff".parse().unwrap());

        assert!(matches!(
            other.decode(&sealed),
            Err(CodecError::DecodingFailed { .. })
        ));
    }

    fn nested(depth: usize) -> Document {
        let mut value = Value::from("deep");
        for _ in 0..depth {
            let mut map = Document::new();
            map.insert("k".into(), value);
            value = Value::Object(map);
        }
        let mut doc = Document::new();
        doc.insert("top".into(), Value::from(1));
        doc.insert("k".into(), value);
        doc
    }

    #[test]
    fn deeply_nested_documents_decode() {
        let original = nested(300);

        for codec in [Codec::plain(), Codec::plain().pretty(false), encrypted()] {
            let bytes = codec.encode(&original).unwrap();
            assert_eq!(codec.decode(&bytes).unwrap(), original);
        }
    }

    #[test]
    fn trailing_garbage_fails() {
        let result = Codec::plain().decode(b"{\"a\":1} extra");
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-1_000_000i64..1_000_000).prop_map(|n| Value::Number(n as f64 / 4.0)),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Object),
            ]
        })
    }

    proptest! {
        #[test]
        fn plain_and_encrypted_roundtrip(
            entries in prop::collection::btree_map("[a-z.]{1,8}", value(), 0..6),
            pretty in any::<bool>(),
        ) {
            let plain = Codec::plain().pretty(pretty);
            prop_assert_eq!(plain.decode(&plain.encode(&entries).unwrap()).unwrap(), entries.clone());

            let sealed = encrypted();
            prop_assert_eq!(sealed.decode(&sealed.encode(&entries).unwrap()).unwrap(), entries);
        }
    }
}
