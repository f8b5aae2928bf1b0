//! Sink stages.
//!
//! A sink owns the terminal draining loop. Each one holds a
//! [`CancelOnDrop`](crate::CancelOnDrop) guard for the whole drain, so the
//! pipeline is cancelled exactly when the sink stops, however it stops, and
//! every upstream task winds down even if the source was not exhausted.

use std::marker::PhantomData;

use super::Sink;
use crate::error::{Error, Partial, Result, SinkResult};
use crate::stream::{Stream, note_cancelled};

fn interrupted<T>(upstream: &Stream<T>, error: Error) -> Error {
    if error.is_cancellation() {
        note_cancelled(upstream.cancel_handle());
    }
    tracing::debug!(%error, "sink interrupted");
    error
}

// ============================================================================
// ToVec (ToSlice)
// ============================================================================

/// A sink collecting every element into a `Vec`.
pub struct ToVec<T> {
    _t: PhantomData<T>,
}

impl<T: Send + 'static> Sink<T> for ToVec<T> {
    type Output = SinkResult<Vec<T>>;

    async fn drain(self, mut upstream: Stream<T>) -> Self::Output {
        let _release = upstream.release_on_drop();
        let mut items = Vec::with_capacity(upstream.capacity_hint());
        loop {
            match upstream.recv().await {
                Ok(Some(value)) => items.push(value),
                Ok(None) => return Ok(items),
                Err(e) => return Err(Partial::new(items, interrupted(&upstream, e))),
            }
        }
    }
}

/// Create a sink collecting into a `Vec`.
pub fn to_vec<T: Send + 'static>() -> ToVec<T> {
    ToVec { _t: PhantomData }
}

// ============================================================================
// ForEach
// ============================================================================

/// A sink calling a function for each element.
pub struct ForEach<F, T> {
    f: F,
    _t: PhantomData<T>,
}

impl<F, T> Sink<T> for ForEach<F, T>
where
    F: FnMut(T) + Send,
    T: Send + 'static,
{
    type Output = Result<()>;

    async fn drain(self, mut upstream: Stream<T>) -> Self::Output {
        let mut f = self.f;
        let _release = upstream.release_on_drop();
        loop {
            match upstream.recv().await {
                Ok(Some(value)) => upstream.guard("for_each", || f(value))?,
                Ok(None) => return Ok(()),
                Err(e) => return Err(interrupted(&upstream, e)),
            }
        }
    }
}

/// Create a for_each sink.
pub fn for_each<F, T>(f: F) -> ForEach<F, T>
where
    F: FnMut(T) + Send,
    T: Send + 'static,
{
    ForEach { f, _t: PhantomData }
}

// ============================================================================
// Count
// ============================================================================

/// A sink counting elements.
pub struct Count<T> {
    _t: PhantomData<T>,
}

impl<T: Send + 'static> Sink<T> for Count<T> {
    type Output = SinkResult<usize>;

    async fn drain(self, mut upstream: Stream<T>) -> Self::Output {
        let _release = upstream.release_on_drop();
        let mut count = 0;
        loop {
            match upstream.recv().await {
                Ok(Some(_)) => count += 1,
                Ok(None) => return Ok(count),
                Err(e) => return Err(Partial::new(count, interrupted(&upstream, e))),
            }
        }
    }
}

/// Create a counting sink.
pub fn count<T: Send + 'static>() -> Count<T> {
    Count { _t: PhantomData }
}

// ============================================================================
// First
// ============================================================================

/// A sink taking the first element and releasing the pipeline right away.
pub struct First<T> {
    _t: PhantomData<T>,
}

impl<T: Send + 'static> Sink<T> for First<T> {
    type Output = Result<T>;

    async fn drain(self, mut upstream: Stream<T>) -> Self::Output {
        let _release = upstream.release_on_drop();
        match upstream.recv().await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(Error::Empty),
            Err(e) => Err(interrupted(&upstream, e)),
        }
    }
}

/// Create a sink returning the first element.
///
/// Fails with [`Error::Empty`] if the stream closes without elements.
pub fn first<T: Send + 'static>() -> First<T> {
    First { _t: PhantomData }
}

// ============================================================================
// Reverse
// ============================================================================

/// A sink buffering the whole stream and returning it reversed.
pub struct Reverse<T> {
    _t: PhantomData<T>,
}

impl<T: Send + 'static> Sink<T> for Reverse<T> {
    type Output = SinkResult<Vec<T>>;

    async fn drain(self, upstream: Stream<T>) -> Self::Output {
        let collected = to_vec::<T>().drain(upstream).await;
        let reversed = |mut items: Vec<T>| {
            items.reverse();
            items
        };
        collected.map(reversed).map_err(|p| p.map(reversed))
    }
}

/// Create a reversing sink.
pub fn reverse<T: Send + 'static>() -> Reverse<T> {
    Reverse { _t: PhantomData }
}

// ============================================================================
// All / Any
// ============================================================================

/// A sink checking that every element matches a predicate.
pub struct All<F, T> {
    predicate: F,
    _t: PhantomData<T>,
}

impl<F, T> Sink<T> for All<F, T>
where
    F: FnMut(&T) -> bool + Send,
    T: Send + 'static,
{
    type Output = Result<bool>;

    async fn drain(self, mut upstream: Stream<T>) -> Self::Output {
        let mut predicate = self.predicate;
        let _release = upstream.release_on_drop();
        loop {
            match upstream.recv().await {
                Ok(Some(value)) => {
                    if !upstream.guard("all", || predicate(&value))? {
                        return Ok(false);
                    }
                }
                Ok(None) => return Ok(true),
                Err(e) => return Err(interrupted(&upstream, e)),
            }
        }
    }
}

/// Create a sink that is true iff every element matches `predicate`.
///
/// Stops at the first element that does not match.
pub fn all<F, T>(predicate: F) -> All<F, T>
where
    F: FnMut(&T) -> bool + Send,
    T: Send + 'static,
{
    All {
        predicate,
        _t: PhantomData,
    }
}

/// A sink checking that some element matches a predicate.
pub struct Any<F, T> {
    predicate: F,
    _t: PhantomData<T>,
}

impl<F, T> Sink<T> for Any<F, T>
where
    F: FnMut(&T) -> bool + Send,
    T: Send + 'static,
{
    type Output = Result<bool>;

    async fn drain(self, mut upstream: Stream<T>) -> Self::Output {
        let mut predicate = self.predicate;
        let _release = upstream.release_on_drop();
        loop {
            match upstream.recv().await {
                Ok(Some(value)) => {
                    if upstream.guard("any", || predicate(&value))? {
                        return Ok(true);
                    }
                }
                Ok(None) => return Ok(false),
                Err(e) => return Err(interrupted(&upstream, e)),
            }
        }
    }
}

/// Create a sink that is true iff some element matches `predicate`.
///
/// Stops at the first match.
pub fn any<F, T>(predicate: F) -> Any<F, T>
where
    F: FnMut(&T) -> bool + Send,
    T: Send + 'static,
{
    Any {
        predicate,
        _t: PhantomData,
    }
}

// ============================================================================
// Fold
// ============================================================================

/// A sink folding elements into an accumulator.
///
/// If `f` panics, the accumulator it was handed is lost and the partial
/// value reported is `Acc::default()`.
pub struct Fold<F, T, Acc> {
    f: F,
    init: Acc,
    _t: PhantomData<T>,
}

impl<F, T, Acc> Sink<T> for Fold<F, T, Acc>
where
    F: FnMut(Acc, T) -> Acc + Send,
    T: Send + 'static,
    Acc: Default + Send,
{
    type Output = SinkResult<Acc>;

    async fn drain(self, mut upstream: Stream<T>) -> Self::Output {
        let mut f = self.f;
        let mut acc = self.init;
        let _release = upstream.release_on_drop();
        loop {
            match upstream.recv().await {
                Ok(Some(value)) => {
                    let current = std::mem::take(&mut acc);
                    match upstream.guard("fold", || f(current, value)) {
                        Ok(next) => acc = next,
                        Err(e) => return Err(Partial::new(acc, e)),
                    }
                }
                Ok(None) => return Ok(acc),
                Err(e) => return Err(Partial::new(acc, interrupted(&upstream, e))),
            }
        }
    }
}

/// Create a fold sink.
pub fn fold<F, T, Acc>(init: Acc, f: F) -> Fold<F, T, Acc>
where
    F: FnMut(Acc, T) -> Acc + Send,
    T: Send + 'static,
    Acc: Default + Send,
{
    Fold {
        f,
        init,
        _t: PhantomData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::stages::{from_iter, map};

    #[tokio::test]
    async fn test_to_vec() {
        let ctx = Context::background();
        let stream = from_iter(&ctx, vec!['a', 'b']);
        let items = stream.sink(to_vec::<char>()).await;
        assert_eq!(items, Ok(vec!['a', 'b']));
    }

    #[tokio::test]
    async fn test_for_each_visits_in_order() {
        let ctx = Context::background();
        let mut seen = Vec::new();
        let record = for_each(|n: i32| seen.push(n));
        let result = from_iter(&ctx, 1..=3).sink(record).await;
        assert_eq!(result, Ok(()));
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_count() {
        let ctx = Context::background();
        let n = from_iter(&ctx, 0..17).sink(count()).await;
        assert_eq!(n, Ok(17));

        let empty = from_iter(&ctx, Vec::<i32>::new());
        assert_eq!(empty.sink(count()).await, Ok(0));
    }

    #[tokio::test]
    async fn test_first_and_empty() {
        let ctx = Context::background();
        let head = from_iter(&ctx, 5..).sink(first()).await;
        assert_eq!(head, Ok(5));

        let empty = from_iter(&ctx, Vec::<i32>::new());
        assert_eq!(empty.sink(first()).await, Err(Error::Empty));
    }

    #[tokio::test]
    async fn test_first_releases_upstream() {
        let ctx = Context::background();
        let stream = from_iter(&ctx, 0u64..);
        let pipeline = stream.context().clone();

        assert_eq!(stream.sink(first()).await, Ok(0));
        assert!(pipeline.is_cancelled());
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_reverse() {
        let ctx = Context::background();
        let stream = from_iter(&ctx, vec!["a", "b", "c"]);
        let reversed = stream.sink(reverse()).await;
        assert_eq!(reversed, Ok(vec!["c", "b", "a"]));
    }

    #[tokio::test]
    async fn test_all_short_circuits() {
        let ctx = Context::background();
        let small = all(|n: &i32| *n < 5);
        let got = from_iter(&ctx, vec![1, 2, 3, 4]).sink(small).await;
        assert_eq!(got, Ok(true));

        let below_ten = all(|n: &i32| *n < 10);
        assert_eq!(from_iter(&ctx, 0..).sink(below_ten).await, Ok(false));

        let never = all(|_: &i32| false);
        let got = from_iter(&ctx, Vec::new()).sink(never).await;
        assert_eq!(got, Ok(true));
    }

    #[tokio::test]
    async fn test_any_short_circuits() {
        let ctx = Context::background();
        let large = any(|n: &i32| *n > 10);
        let got = from_iter(&ctx, vec![1, 2, 3, 4]).sink(large).await;
        assert_eq!(got, Ok(false));

        let thousand = any(|n: &i32| *n == 1000);
        assert_eq!(from_iter(&ctx, 0..).sink(thousand).await, Ok(true));
    }

    #[tokio::test]
    async fn test_fold() {
        let ctx = Context::background();
        let sum = fold(0u32, |acc, n: u32| acc + n);
        assert_eq!(from_iter(&ctx, 1..=10u32).sink(sum).await, Ok(55));

        let concat = fold(String::new(), |acc, s: String| acc + &s);
        let joined = from_iter(&ctx, vec!["x", "y"])
            .then(map(|s: &'static str| s.to_uppercase()))
            .sink(concat)
            .await;
        assert_eq!(joined, Ok("XY".to_string()));
    }

    #[tokio::test]
    async fn test_sinks_report_cancellation_with_partial_values() {
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        let source = || from_iter(&ctx, 0..5);

        let partial = source().sink(to_vec()).await.unwrap_err();
        assert!(partial.value.is_empty());
        assert_eq!(partial.error, Error::Cancelled);

        let partial = source().sink(count()).await.unwrap_err();
        assert_eq!(partial.value, 0);

        let partial = source().sink(reverse()).await.unwrap_err();
        assert!(partial.value.is_empty());

        let cancelled = Err(Error::Cancelled);
        assert_eq!(source().sink(first()).await, cancelled);

        let cancelled = Err(Error::Cancelled);
        assert_eq!(source().sink(any(|_| true)).await, cancelled);
        assert_eq!(source().sink(all(|_| true)).await, cancelled);

        let ignore = for_each(|_: i32| {});
        assert_eq!(source().sink(ignore).await, Err(Error::Cancelled));
    }

    #[tokio::test]
    async fn test_panicking_sink_callback() {
        let ctx = Context::background();
        let check = any(|n: &i32| {
            assert!(*n < 2, "value too large");
            false
        });
        let result = from_iter(&ctx, vec![1, 2, 3]).sink(check).await;
        assert_eq!(
            result,
            Err(Error::StageFault {
                stage: "any",
                message: "value too large".to_string(),
            })
        );
    }
}
