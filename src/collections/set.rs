//! Hash set with set algebra returning new sets.

use std::collections::HashSet;
use std::hash::Hash;

/// An unordered set of distinct values.
///
/// A thin wrapper over [`HashSet`] whose algebra (`union`, `intersection`,
/// `difference`) returns owned sets rather than lazy iterators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set<T: Eq + Hash> {
    data: HashSet<T>,
}

impl<T: Eq + Hash> Default for Set<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> Set<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            data: HashSet::new(),
        }
    }

    /// Insert `item`. Returns whether it was newly added.
    pub fn add(&mut self, item: T) -> bool {
        self.data.insert(item)
    }

    /// Insert every item.
    pub fn add_all(&mut self, items: impl IntoIterator<Item = T>) {
        self.data.extend(items);
    }

    /// Remove `item`. Returns whether it was present.
    pub fn remove(&mut self, item: &T) -> bool {
        self.data.remove(item)
    }

    /// Whether `item` is in the set.
    pub fn contains(&self, item: &T) -> bool {
        self.data.contains(item)
    }

    /// Whether every one of `items` is in the set.
    pub fn contains_all<'a>(&self, items: impl IntoIterator<Item = &'a T>) -> bool
    where
        T: 'a,
    {
        items.into_iter().all(|item| self.data.contains(item))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Iterate in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

impl<T: Eq + Hash + Clone> Set<T> {
    /// The elements, in arbitrary order.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }

    /// Elements in either set.
    pub fn union(&self, other: &Set<T>) -> Set<T> {
        self.data.union(&other.data).cloned().collect()
    }

    /// Elements in both sets.
    pub fn intersection(&self, other: &Set<T>) -> Set<T> {
        self.data.intersection(&other.data).cloned().collect()
    }

    /// Elements in `self` but not in `other`.
    pub fn difference(&self, other: &Set<T>) -> Set<T> {
        self.data.difference(&other.data).cloned().collect()
    }
}

impl<T: Eq + Hash> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

impl<T: Eq + Hash> Extend<T> for Set<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.data.extend(iter);
    }
}

impl<T: Eq + Hash + Clone> From<&[T]> for Set<T> {
    fn from(items: &[T]) -> Self {
        items.iter().cloned().collect()
    }
}

impl<T: Eq + Hash> IntoIterator for Set<T> {
    type Item = T;
    type IntoIter = std::collections::hash_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}
