//! LIFO stack.

/// A last-in first-out stack backed by a `Vec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack<T> {
    data: Vec<T>,
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Stack<T> {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create an empty stack with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Push onto the top.
    pub fn push(&mut self, value: T) {
        self.data.push(value);
    }

    /// Remove and return the top element.
    pub fn pop(&mut self) -> Option<T> {
        self.data.pop()
    }

    /// The top element.
    pub fn peek(&self) -> Option<&T> {
        self.data.last()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remove every element, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
