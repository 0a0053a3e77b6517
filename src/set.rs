use crate::Value;
use std::{iter::FromIterator, slice::Iter, vec::IntoIter};

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Debug, Default)]
/// An unordered collection of distinct values.
///
/// Members are kept as a sorted, deduplicated `Vec`, so equality is
/// structural: two sets with the same members compare equal no matter what
/// order those members were added in. The order of members on the wire is
/// unspecified.
pub struct Set(Vec<Value>);

impl Set {
    /// Creates an empty `Set`.
    pub fn new() -> Set { Set(Vec::new()) }

    /// Number of members.
    pub fn len(&self) -> usize { self.0.len() }

    /// Indicates whether the set has no members.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Membership test.
    pub fn contains(&self, v: &Value) -> bool { self.0.binary_search(v).is_ok() }

    /// Adds `v`, returning `false` if it was already a member.
    pub fn insert(&mut self, v: Value) -> bool {
        match self.0.binary_search(&v) {
            Ok(_) => false,
            Err(ix) => {
                self.0.insert(ix, v);
                true
            }
        }
    }

    /// Iterates over the members.
    pub fn iter(&self) -> Iter<Value> { self.0.iter() }
}

impl From<Vec<Value>> for Set {
    fn from(mut v: Vec<Value>) -> Set {
        v.sort_unstable();
        v.dedup();
        Set(v)
    }
}

impl IntoIterator for Set {
    type IntoIter = IntoIter<Value>;
    type Item = Value;

    fn into_iter(self) -> IntoIter<Value> { self.0.into_iter() }
}

impl<'a> IntoIterator for &'a Set {
    type IntoIter = Iter<'a, Value>;
    type Item = &'a Value;

    fn into_iter(self) -> Iter<'a, Value> { self.0.iter() }
}

impl FromIterator<Value> for Set {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Set {
        Set::from(Vec::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality() {
        let a: Set = vec![Value::from(1), Value::from(2)].into();
        let b: Set = vec![Value::from(2), Value::from(1), Value::from(2)].into();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert!(a.contains(&Value::from(1)));
        assert!(!a.contains(&Value::from(3)));
    }
}
