//! Dot-notation key paths and resolution inside a document.
//!
//! A key such as `"user.profile.name"` addresses a value nested inside
//! objects. Literal dots cannot be escaped, so a top-level key can never
//! contain a dot.

use crate::error::CoreError;
use dotstore_codec::{Document, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// A parsed key: one or more non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parses a dot-separated key.
    ///
    /// Returns `None` for an empty key or a key with an empty segment
    /// (`"a..b"`, `".a"`, `"a."`).
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let segments: Vec<String> = key.split(SEPARATOR).map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return None;
        }
        Some(Self { segments })
    }

    /// Returns the segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl FromStr for KeyPath {
    type Err = CoreError;

    fn from_str(key: &str) -> Result<Self, CoreError> {
        Self::parse(key).ok_or_else(|| CoreError::invalid_key(key))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(&SEPARATOR.to_string()))
    }
}

/// Returns the value at `path`, or `None` if any step is missing, null,
/// or not an object.
#[must_use]
pub fn resolve_get<'doc>(doc: &'doc Document, path: &KeyPath) -> Option<&'doc Value> {
    let (first, rest) = path.segments.split_first()?;
    let mut cursor = doc.get(first)?;
    for segment in rest {
        cursor = cursor.as_object()?.get(segment)?;
    }
    Some(cursor)
}

/// Stores `value` at `path`.
///
/// Missing intermediate objects are created. Intermediate values that are
/// not objects are replaced by objects.
pub fn resolve_set(doc: &mut Document, path: &KeyPath, value: Value) {
    set_in(doc, &path.segments, value);
}

fn set_in(map: &mut Map, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let slot = map.entry(head.clone()).or_insert_with(Value::object);
            match slot {
                Value::Object(child) => set_in(child, rest, value),
                other => {
                    let mut child = Map::new();
                    set_in(&mut child, rest, value);
                    *other = Value::Object(child);
                }
            }
        }
    }
}

/// Removes the value at `path` without creating anything.
///
/// Returns whether a value was removed.
pub fn resolve_delete(doc: &mut Document, path: &KeyPath) -> bool {
    delete_in(doc, &path.segments)
}

fn delete_in(map: &mut Map, segments: &[String]) -> bool {
    match segments {
        [] => false,
        [last] => map.remove(last).is_some(),
        [head, rest @ ..] => match map.get_mut(head) {
            Some(Value::Object(child)) => delete_in(child, rest),
            _ => false,
        },
    }
}
