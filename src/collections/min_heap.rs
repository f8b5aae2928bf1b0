//! Binary min-heap ordered by a caller-supplied `less` function.

use std::fmt;

/// A binary heap whose top is the element no other element is `less` than.
///
/// Unlike [`std::collections::BinaryHeap`] the ordering is a closure, so
/// one element type can be ranked several ways without newtype wrappers.
///
/// # Example
///
/// ```rust
/// use sluice::collections::MinHeap;
///
/// let mut heap = MinHeap::new(|a: &u32, b: &u32| a < b);
/// heap.push(5);
/// heap.push(1);
/// heap.push(3);
/// assert_eq!(heap.pop(), Some(1));
/// assert_eq!(heap.peek(), Some(&3));
/// ```
pub struct MinHeap<T, F> {
    data: Vec<T>,
    less: F,
}

impl<T, F> MinHeap<T, F>
where
    F: Fn(&T, &T) -> bool,
{
    /// Create an empty heap.
    pub fn new(less: F) -> Self {
        Self::with_capacity(0, less)
    }

    /// Create an empty heap with room for `capacity` elements.
    pub fn with_capacity(capacity: usize, less: F) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            less,
        }
    }

    /// Insert `value`.
    pub fn push(&mut self, value: T) {
        self.data.push(value);
        self.sift_up(self.data.len() - 1);
    }

    /// Remove and return the minimum, or `None` if the heap is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.data.is_empty() {
            return None;
        }
        let min = self.data.swap_remove(0);
        self.sift_down(0);
        Some(min)
    }

    /// The minimum, without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the heap is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The elements in heap (not sorted) order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consume the heap, returning its elements smallest first.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut sorted = Vec::with_capacity(self.data.len());
        while let Some(min) = self.pop() {
            sorted.push(min);
        }
        sorted
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !(self.less)(&self.data[idx], &self.data[parent]) {
                return;
            }
            self.data.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let n = self.data.len();
        loop {
            let (left, right) = (2 * idx + 1, 2 * idx + 2);
            let mut smallest = idx;
            if left < n && (self.less)(&self.data[left], &self.data[smallest]) {
                smallest = left;
            }
            if right < n && (self.less)(&self.data[right], &self.data[smallest]) {
                smallest = right;
            }
            if smallest == idx {
                return;
            }
            self.data.swap(idx, smallest);
            idx = smallest;
        }
    }
}

impl<T: fmt::Debug, F> fmt::Debug for MinHeap<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.data).finish()
    }
}
