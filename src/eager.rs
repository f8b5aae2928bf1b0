//! Eager helpers over in-memory slices.
//!
//! Same semantics as the streaming [`flatten`](crate::flatten),
//! [`distinct`](crate::distinct) and [`map`](crate::map) stages, computed
//! immediately on the calling thread. Use these for small data where
//! spawning a pipeline is not worth it.

use std::collections::HashSet;
use std::hash::Hash;

/// Concatenate the inner slices in order.
pub fn flatten<T: Clone, S: AsRef<[T]>>(items: &[S]) -> Vec<T> {
    let len = items.iter().map(|s| s.as_ref().len()).sum();
    let mut out = Vec::with_capacity(len);
    for inner in items {
        out.extend_from_slice(inner.as_ref());
    }
    out
}

/// Keep the first element for each key, in input order.
pub fn distinct_by<T, K, F>(items: &[T], mut key_of: F) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(key_of(item)))
        .cloned()
        .collect()
}

/// Apply `f` to every element.
pub fn map<T, U, F>(items: &[T], f: F) -> Vec<U>
where
    F: FnMut(&T) -> U,
{
    items.iter().map(f).collect()
}
