//! Property-based test generators using proptest.
//!
//! Provides strategies for generating keys, values, documents and
//! operation sequences. Generated numbers are integers or quarters so they
//! survive a JSON round trip exactly.

use dotstore_core::{Document, Store, Value};
use proptest::prelude::*;

/// Strategy for generating a single key segment.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,7}").expect("Invalid regex")
}

/// Strategy for generating dotted keys of 1 to `max_depth` segments.
pub fn key_strategy(max_depth: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 1..=max_depth.max(1)).prop_map(|s| s.join("."))
}

/// Strategy for generating exactly representable numbers.
pub fn number_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        3 => any::<i32>().prop_map(f64::from),
        1 => (-4000i32..4000).prop_map(|q| f64::from(q) / 4.0),
    ]
}

/// Strategy for generating scalar values.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        number_strategy().prop_map(Value::Number),
        prop::string::string_regex("[a-zA-Z0-9 _.:-]{0,16}")
            .expect("Invalid regex")
            .prop_map(Value::String),
    ]
}

/// Strategy for generating arbitrary nested values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(segment_strategy(), inner, 0..4).prop_map(Value::Object),
        ]
    })
}

/// Strategy for generating whole documents.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    prop::collection::btree_map(segment_strategy(), value_strategy(), 0..6)
}

/// A mutation applied to a store.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Set a key.
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: Value,
    },
    /// Delete a key.
    Delete {
        /// Dotted key
        key: String,
    },
    /// Add to a number.
    Add {
        /// Dotted key
        key: String,
        /// Amount to add
        amount: f64,
    },
    /// Append to an array.
    Push {
        /// Dotted key
        key: String,
        /// Item to append
        item: Value,
    },
    /// Remove matching items from an array.
    Pull {
        /// Dotted key
        key: String,
        /// Item to remove
        item: Value,
    },
    /// Remove everything.
    Clear,
}

impl StoreOperation {
    /// Applies the operation to `store`.
    ///
    /// Type mismatches (adding to a string, pushing onto a number) are
    /// expected with random sequences and leave the store unchanged, so
    /// they are ignored.
    pub fn apply(&self, store: &mut Store) {
        match self {
            StoreOperation::Set { key, value } => {
                let _ = store.set(key, value.clone());
            }
            StoreOperation::Delete { key } => {
                store.delete(key);
            }
            StoreOperation::Add { key, amount } => {
                let _ = store.add(key, *amount);
            }
            StoreOperation::Push { key, item } => {
                let _ = store.push(key, [item.clone()]);
            }
            StoreOperation::Pull { key, item } => {
                let _ = store.pull(key, item.clone());
            }
            StoreOperation::Clear => store.clear(),
        }
    }
}

/// Strategy for generating store operations.
///
/// Keys are drawn from a small pool so operations collide often.
pub fn operation_strategy() -> impl Strategy<Value = StoreOperation> {
    let key = || {
        prop::sample::select(vec!["a", "b", "a.x", "a.y", "b.c.d", "list", "n"]).prop_map(String::from)
    };
    prop_oneof![
        4 => (key(), value_strategy()).prop_map(|(key, value)| StoreOperation::Set { key, value }),
        2 => key().prop_map(|key| StoreOperation::Delete { key }),
        2 => (key(), number_strategy()).prop_map(|(key, amount)| StoreOperation::Add { key, amount }),
        2 => (key(), scalar_strategy()).prop_map(|(key, item)| StoreOperation::Push { key, item }),
        1 => (key(), scalar_strategy()).prop_map(|(key, item)| StoreOperation::Pull { key, item }),
        1 => Just(StoreOperation::Clear),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    ///
    /// Use this for tests that touch the file system.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotstore_core::KeyPath;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn keys_are_valid_paths(key in key_strategy(4)) {
            let path = KeyPath::parse(&key);
            prop_assert!(path.is_some());
            prop_assert!(path.map_or(0, |p| p.segments().len()) <= 4);
        }

        #[test]
        fn numbers_are_finite(n in number_strategy()) {
            prop_assert!(n.is_finite());
        }

        #[test]
        fn values_nest_at_most_three_levels(value in value_strategy()) {
            fn depth(value: &Value) -> usize {
                match value {
                    Value::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
                    Value::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
                    _ => 0,
                }
            }
            prop_assert!(depth(&value) <= 3);
        }
    }
}
