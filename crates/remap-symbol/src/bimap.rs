//! Injective dual-keyed map
//!
//! Provides [`BiMap`], the structure behind every rename table: each key maps
//! to exactly one value and no two keys may share a value. Both directions are
//! kept in one structure so the invariant is checked atomically on insert.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Bidirectional map with unique values
///
/// Forward iteration is deterministic (insertion order, with removals
/// back-filled from the end).
///
/// # Example
/// ```
/// use remap_symbol::BiMap;
///
/// let mut names = BiMap::new();
/// names.insert("a/A", "x/X").unwrap();
/// assert_eq!(names.get_by_value(&"x/X"), Some(&"a/A"));
///
/// // A second key may not claim the same target.
/// assert!(names.insert("a/B", "x/X").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct BiMap<K, V> {
    forward: IndexMap<K, V>,
    inverse: HashMap<V, K>,
}

/// A rejected insertion
///
/// Carries the attempted mapping and the key currently owning the value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot map {key:?} to {value:?}: already mapped from {existing:?}")]
pub struct DuplicateTarget<K: Debug, V: Debug> {
    /// Key of the attempted insertion
    pub key: K,
    /// Value both keys would map to
    pub value: V,
    /// Key that already maps to `value`
    pub existing: K,
}

impl<K, V> BiMap<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Eq + Hash + Clone + Debug,
{
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            forward: IndexMap::new(),
            inverse: HashMap::new(),
        }
    }

    /// Create empty map with room for `capacity` entries
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            forward: IndexMap::with_capacity(capacity),
            inverse: HashMap::with_capacity(capacity),
        }
    }

    /// Map `key` to `value`, replacing any previous value of `key`
    ///
    /// Returns the previous value of `key`, if any.
    ///
    /// # Errors
    /// Fails without modifying the map if `value` is already the target of a
    /// different key.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, DuplicateTarget<K, V>> {
        if let Some(existing) = self.inverse.get(&value) {
            if *existing != key {
                return Err(DuplicateTarget {
                    key,
                    value,
                    existing: existing.clone(),
                });
            }
            return Ok(Some(value));
        }

        let previous = self.forward.insert(key.clone(), value.clone());
        if let Some(old) = &previous {
            self.inverse.remove(old);
        }
        self.inverse.insert(value, key);
        Ok(previous)
    }

    /// Value for `key`
    #[inline]
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.forward.get(key)
    }

    /// Key currently mapping to `value`
    #[inline]
    #[must_use]
    pub fn get_by_value<Q>(&self, value: &Q) -> Option<&K>
    where
        V: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inverse.get(value)
    }

    /// Whether `key` is mapped
    #[inline]
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.forward.contains_key(key)
    }

    /// Whether any key maps to `value`
    #[inline]
    #[must_use]
    pub fn contains_value<Q>(&self, value: &Q) -> bool
    where
        V: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inverse.contains_key(value)
    }

    /// Remove `key`, returning its value
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let value = self.forward.swap_remove(key)?;
        self.inverse.remove(&value);
        Some(value)
    }

    /// Iterate `(key, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.forward.iter()
    }

    /// Iterate keys
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.forward.keys()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns true if the map is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl<K, V> Default for BiMap<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
