//! Small in-memory collections.
//!
//! Plain single-threaded value types for code around a pipeline, such as
//! ranking results a sink produced. The pipeline itself never uses them.

mod min_heap;
mod set;
mod stack;

pub use min_heap::MinHeap;
pub use set::Set;
pub use stack::Stack;
