//! Pipeline stages: sources, transforms and sinks.
//!
//! Transforms implement [`Stage`] and sinks implement [`Sink`]. The
//! associated types carry the element type across every boundary, so a
//! chain of stages is checked at compile time even when each stage changes
//! the element type.
//!
//! | LINQ name | function |
//! |-----------|----------|
//! | FromSlice | [`from_iter`], [`from_slice`] |
//! | Where | [`filter`] |
//! | Select | [`map`] |
//! | Distinct | [`distinct`] |
//! | Flatten | [`flatten`] |
//! | GroupBy | [`group_by`] |
//! | SelectPar | [`map_par`] |
//! | ToSlice | [`to_vec`] |
//! | ForEach | [`for_each`] |
//! | Count | [`count`] |
//! | First | [`first`] |
//! | Reverse | [`reverse`] |
//! | All / Any | [`all`], [`any`] |

use std::future::Future;

use crate::stream::Stream;

mod par;
mod sink;
mod source;
mod transform;

pub use par::*;
pub use sink::*;
pub use source::*;
pub use transform::*;

/// A transform stage converting a stream of `In` into a stream of `Output`.
///
/// Attaching a stage spawns its worker task(s); the returned stream is
/// already running.
pub trait Stage<In: Send + 'static> {
    /// The element type this stage produces.
    type Output: Send + 'static;

    /// Start the stage on `upstream`.
    fn attach(self, upstream: Stream<In>) -> Stream<Self::Output>;
}

/// A terminal stage draining a stream into a result.
///
/// Every sink cancels the pipeline when it finishes, on every exit path, so
/// no upstream task is left blocked.
pub trait Sink<In: Send + 'static> {
    /// What draining produces.
    type Output;

    /// Drain `upstream`.
    fn drain(self, upstream: Stream<In>) -> impl Future<Output = Self::Output> + Send;
}

/// A stage built from a closure over the upstream stream.
pub struct StageFn<F> {
    f: F,
}

impl<F, In, Out> Stage<In> for StageFn<F>
where
    F: FnOnce(Stream<In>) -> Stream<Out>,
    In: Send + 'static,
    Out: Send + 'static,
{
    type Output = Out;

    fn attach(self, upstream: Stream<In>) -> Stream<Out> {
        (self.f)(upstream)
    }
}

/// Wrap a closure as a stage.
///
/// Useful to package a sub-chain of stages as one reusable step.
///
/// ```rust,ignore
/// let evens_squared = stage_fn(|s: Stream<i32>| {
///     s.then(filter(|n: &i32| n % 2 == 0)).then(map(|n: i32| n * n))
/// });
/// ```
pub fn stage_fn<F>(f: F) -> StageFn<F> {
    StageFn { f }
}
