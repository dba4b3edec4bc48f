//! Associative map with an explicit fallback value for missing keys.

use std::collections::HashMap;
use std::hash::Hash;

/// A `HashMap` that answers lookups of absent keys with a fixed default.
///
/// Lookups never insert; only the mutating accessors materialise entries.
#[derive(Debug, Clone)]
pub struct DefaultMap<K, V> {
    entries: HashMap<K, V>,
    default: V,
}

impl<K: Eq + Hash, V> DefaultMap<K, V> {
    pub fn new(default: V) -> Self {
        Self {
            entries: HashMap::new(),
            default,
        }
    }

    /// The stored value, or the default if `key` is absent.
    #[inline]
    pub fn get_or_default(&self, key: &K) -> &V {
        self.entries.get(key).unwrap_or(&self.default)
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }
}

impl<K: Eq + Hash, V: Clone> DefaultMap<K, V> {
    /// Mutable access, materialising a copy of the default when absent.
    pub fn get_mut_or_insert(&mut self, key: K) -> &mut V {
        let default = &self.default;
        self.entries.entry(key).or_insert_with(|| default.clone())
    }
}
