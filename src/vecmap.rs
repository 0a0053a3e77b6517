use std::{iter::FromIterator, slice::Iter, vec::IntoIter};

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug, Default)]
/// A map implemented as a sorted `Vec` of pairs.
///
/// Entries are kept sorted by key, so two maps built from the same pairs in
/// different orders compare equal and iterate identically. Later inserts of
/// an existing key replace the earlier value.
pub struct VecMap<K: Ord, V>(Vec<(K, V)>);

impl<K: Ord, V> VecMap<K, V> {
    /// Creates a new `VecMap`.
    pub fn new() -> VecMap<K, V> { VecMap(Vec::new()) }

    /// Creates a new `VecMap` with preallocated capacity.
    pub fn with_capacity(cap: usize) -> VecMap<K, V> { VecMap(Vec::with_capacity(cap)) }

    /// Creates a `VecMap` from a `Vec` of pairs that is already sorted.
    pub fn from_sorted(v: Vec<(K, V)>) -> Self {
        debug_assert!(v.windows(2).all(|w| w[0].0 < w[1].0));
        VecMap(v)
    }

    /// Returns length
    pub fn len(&self) -> usize { self.0.len() }

    /// Indicates whether or not the `VecMap` is empty.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Returns an `Iter` of key value pairs.
    pub fn iter(&self) -> Iter<(K, V)> { self.0.iter() }

    /// Looks up the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.0
            .binary_search_by(|(k, _)| k.cmp(key))
            .ok()
            .map(|ix| &self.0[ix].1)
    }

    /// Inserts `value` under `key`, returning the value previously stored
    /// there, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.0.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(ix) => Some(std::mem::replace(&mut self.0[ix].1, value)),
            Err(ix) => {
                self.0.insert(ix, (key, value));
                None
            }
        }
    }
}

impl<K: Ord, V> From<Vec<(K, V)>> for VecMap<K, V> {
    fn from(v: Vec<(K, V)>) -> Self {
        let mut out = VecMap::with_capacity(v.len());
        for (k, val) in v {
            out.insert(k, val);
        }
        out
    }
}

impl<K: Ord, V> IntoIterator for VecMap<K, V> {
    type IntoIter = IntoIter<(K, V)>;
    type Item = (K, V);

    fn into_iter(self) -> IntoIter<(K, V)> { self.0.into_iter() }
}

impl<'a, K: Ord, V> IntoIterator for &'a VecMap<K, V> {
    type IntoIter = Iter<'a, (K, V)>;
    type Item = &'a (K, V);

    fn into_iter(self) -> Iter<'a, (K, V)> { self.0.iter() }
}

impl<K: Ord, V> FromIterator<(K, V)> for VecMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> VecMap<K, V> {
        VecMap::from(Vec::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_irrelevant() {
        let a: VecMap<&str, i32> = vec![("a", 1), ("b", 2)].into();
        let b: VecMap<&str, i32> = vec![("b", 2), ("a", 1)].into();
        assert_eq!(a, b);
    }

    #[test]
    fn last_insert_wins() {
        let m: VecMap<&str, i32> = vec![("a", 1), ("a", 2)].into();
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&"a"), Some(&2));
    }
}
