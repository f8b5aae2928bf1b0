//! Transform stages.
//!
//! Every transform spawns one worker that loops: receive from upstream
//! (stopping on cancellation or exhaustion), apply the operation, send
//! downstream (stopping if that fails). The worker owns its output
//! [`Emitter`](crate::Emitter), so the output closes whenever the loop ends.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;

use super::Stage;
use crate::stream::{Stream, spawn_worker};

/// What a per-element step decided.
enum Step<T> {
    /// Forward this value.
    Emit(T),
    /// Forward this value, then close the output.
    Last(T),
    /// Forward nothing for this input.
    Skip,
    /// Close the output without forwarding.
    Stop,
}

/// Spawn the common one-in, at-most-one-out worker loop.
fn spawn_step<In, Out, F>(
    mut upstream: Stream<In>,
    stage: &'static str,
    capacity: usize,
    mut step: F,
) -> Stream<Out>
where
    In: Send + 'static,
    Out: Send + 'static,
    F: FnMut(In) -> Step<Out> + Send + 'static,
{
    let (mut out, stream) = upstream.downstream(stage, capacity);
    let ctx = upstream.context().clone();

    spawn_worker(&ctx, stage, capacity, async move {
        while let Ok(Some(value)) = upstream.recv().await {
            let Ok(next) = out.guard(stage, || step(value)) else {
                break;
            };
            match next {
                Step::Emit(v) => {
                    if !out.send(v).await {
                        break;
                    }
                }
                Step::Last(v) => {
                    out.send(v).await;
                    break;
                }
                Step::Skip => out.skip(),
                Step::Stop => break,
            }
        }
    });

    stream
}

// ============================================================================
// Filter (Where)
// ============================================================================

/// A transform that forwards the elements matching a predicate.
///
/// # Example
///
/// ```rust,ignore
/// let odds = source.then(filter(|n: &i32| n % 2 == 1));
/// ```
pub struct Filter<F, T> {
    predicate: F,
    _t: PhantomData<T>,
}

impl<F, T> Filter<F, T> {
    /// Create a new filter stage.
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _t: PhantomData,
        }
    }
}

impl<F, T> Stage<T> for Filter<F, T>
where
    F: FnMut(&T) -> bool + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn attach(self, upstream: Stream<T>) -> Stream<T> {
        let mut predicate = self.predicate;
        let capacity = upstream.capacity_hint();
        spawn_step(upstream, "filter", capacity, move |v| {
            if predicate(&v) {
                Step::Emit(v)
            } else {
                Step::Skip
            }
        })
    }
}

/// Create a filter stage.
pub fn filter<F, T>(predicate: F) -> Filter<F, T>
where
    F: FnMut(&T) -> bool + Send + 'static,
    T: Send + 'static,
{
    Filter::new(predicate)
}

// ============================================================================
// Map (Select)
// ============================================================================

/// A transform that applies a function to each element.
pub struct Map<F, In, Out> {
    f: F,
    _in: PhantomData<In>,
    _out: PhantomData<Out>,
}

impl<F, In, Out> Map<F, In, Out> {
    /// Create a new map stage.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _in: PhantomData,
            _out: PhantomData,
        }
    }
}

impl<F, In, Out> Stage<In> for Map<F, In, Out>
where
    F: FnMut(In) -> Out + Send + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    type Output = Out;

    fn attach(self, upstream: Stream<In>) -> Stream<Out> {
        let mut f = self.f;
        let capacity = upstream.capacity_hint();
        spawn_step(upstream, "map", capacity, move |v| Step::Emit(f(v)))
    }
}

/// Create a map stage.
pub fn map<F, In, Out>(f: F) -> Map<F, In, Out>
where
    F: FnMut(In) -> Out + Send + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    Map::new(f)
}

// ============================================================================
// FilterMap
// ============================================================================

/// A transform that combines filter and map in one step.
pub struct FilterMap<F, In, Out> {
    f: F,
    _in: PhantomData<In>,
    _out: PhantomData<Out>,
}

impl<F, In, Out> FilterMap<F, In, Out> {
    /// Create a new filter_map stage.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _in: PhantomData,
            _out: PhantomData,
        }
    }
}

impl<F, In, Out> Stage<In> for FilterMap<F, In, Out>
where
    F: FnMut(In) -> Option<Out> + Send + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    type Output = Out;

    fn attach(self, upstream: Stream<In>) -> Stream<Out> {
        let mut f = self.f;
        let capacity = upstream.capacity_hint();
        spawn_step(upstream, "filter_map", capacity, move |v| match f(v) {
            Some(out) => Step::Emit(out),
            None => Step::Skip,
        })
    }
}

/// Create a filter_map stage.
pub fn filter_map<F, In, Out>(f: F) -> FilterMap<F, In, Out>
where
    F: FnMut(In) -> Option<Out> + Send + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    FilterMap::new(f)
}

// ============================================================================
// Distinct
// ============================================================================

/// A transform that forwards only the first element of each derived key.
///
/// Keeps every key seen so far, so memory grows with the number of
/// distinct keys.
pub struct Distinct<F, T, K> {
    key_of: F,
    _t: PhantomData<T>,
    _k: PhantomData<K>,
}

impl<F, T, K> Distinct<F, T, K> {
    /// Create a new distinct stage.
    pub fn new(key_of: F) -> Self {
        Self {
            key_of,
            _t: PhantomData,
            _k: PhantomData,
        }
    }
}

impl<F, T, K> Stage<T> for Distinct<F, T, K>
where
    F: FnMut(&T) -> K + Send + 'static,
    T: Send + 'static,
    K: Eq + Hash + Send + 'static,
{
    type Output = T;

    fn attach(self, upstream: Stream<T>) -> Stream<T> {
        let mut key_of = self.key_of;
        let mut seen = HashSet::new();
        let capacity = upstream.capacity_hint();
        spawn_step(upstream, "distinct", capacity, move |v| {
            if seen.insert(key_of(&v)) {
                Step::Emit(v)
            } else {
                Step::Skip
            }
        })
    }
}

/// Create a distinct stage keyed by `key_of`.
pub fn distinct<F, T, K>(key_of: F) -> Distinct<F, T, K>
where
    F: FnMut(&T) -> K + Send + 'static,
    T: Send + 'static,
    K: Eq + Hash + Send + 'static,
{
    Distinct::new(key_of)
}

// ============================================================================
// Inspect
// ============================================================================

/// A transform that observes elements without modifying them.
pub struct Inspect<F, T> {
    f: F,
    _t: PhantomData<T>,
}

impl<F, T> Inspect<F, T> {
    /// Create a new inspect stage.
    pub fn new(f: F) -> Self {
        Self { f, _t: PhantomData }
    }
}

impl<F, T> Stage<T> for Inspect<F, T>
where
    F: FnMut(&T) + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn attach(self, upstream: Stream<T>) -> Stream<T> {
        let mut f = self.f;
        let capacity = upstream.capacity_hint();
        spawn_step(upstream, "inspect", capacity, move |v| {
            f(&v);
            Step::Emit(v)
        })
    }
}

/// Create an inspect stage.
pub fn inspect<F, T>(f: F) -> Inspect<F, T>
where
    F: FnMut(&T) + Send + 'static,
    T: Send + 'static,
{
    Inspect::new(f)
}

// ============================================================================
// Take / Skip
// ============================================================================

/// A transform that forwards the first `n` elements, then closes.
pub struct Take<T> {
    n: usize,
    _t: PhantomData<T>,
}

impl<T: Send + 'static> Stage<T> for Take<T> {
    type Output = T;

    fn attach(self, upstream: Stream<T>) -> Stream<T> {
        let mut remaining = self.n;
        let capacity = upstream.capacity_hint().min(self.n.max(1));
        spawn_step(upstream, "take", capacity, move |v| match remaining {
            0 => Step::Stop,
            1 => {
                remaining = 0;
                Step::Last(v)
            }
            _ => {
                remaining -= 1;
                Step::Emit(v)
            }
        })
    }
}

/// Create a take stage.
pub fn take<T: Send + 'static>(n: usize) -> Take<T> {
    Take { n, _t: PhantomData }
}

/// A transform that drops the first `n` elements.
pub struct Skip<T> {
    n: usize,
    _t: PhantomData<T>,
}

impl<T: Send + 'static> Stage<T> for Skip<T> {
    type Output = T;

    fn attach(self, upstream: Stream<T>) -> Stream<T> {
        let mut remaining = self.n;
        let capacity = upstream.capacity_hint();
        spawn_step(upstream, "skip", capacity, move |v| {
            if remaining > 0 {
                remaining -= 1;
                Step::Skip
            } else {
                Step::Emit(v)
            }
        })
    }
}

/// Create a skip stage.
pub fn skip<T: Send + 'static>(n: usize) -> Skip<T> {
    Skip { n, _t: PhantomData }
}

// ============================================================================
// Flatten
// ============================================================================

/// A transform that forwards every inner element of each incoming sequence.
///
/// Inner sequence sizes are unknown up front, so the output buffer is the
/// fixed [`PipelineConfig::flatten_capacity`](crate::PipelineConfig)
/// instead of the upstream hint.
pub struct Flatten<I> {
    _i: PhantomData<I>,
}

impl<I> Stage<I> for Flatten<I>
where
    I: IntoIterator + Send + 'static,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    type Output = I::Item;

    fn attach(self, mut upstream: Stream<I>) -> Stream<I::Item> {
        let ctx = upstream.context().clone();
        let capacity = ctx.config().flatten_capacity;
        let (mut out, stream) = upstream.downstream("flatten", capacity);

        spawn_worker(&ctx, "flatten", capacity, async move {
            while let Ok(Some(inner)) = upstream.recv().await {
                let mut inner = inner.into_iter();
                loop {
                    let Ok(next) = out.guard("flatten", || inner.next()) else {
                        return;
                    };
                    let Some(value) = next else {
                        break;
                    };
                    if !out.send(value).await {
                        return;
                    }
                }
            }
        });

        stream
    }
}

/// Create a flatten stage.
pub fn flatten<I>() -> Flatten<I>
where
    I: IntoIterator + Send + 'static,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    Flatten { _i: PhantomData }
}

// ============================================================================
// GroupBy
// ============================================================================

/// A transform that partitions the stream by a derived key.
///
/// Groups are only complete once the upstream is exhausted, so this stage
/// materializes the whole upstream first and then emits one `Vec<T>` per
/// key, in first-seen key order, each group in arrival order. Nothing is
/// emitted if the pipeline is cancelled before exhaustion.
pub struct GroupBy<F, T, K> {
    key_of: F,
    _t: PhantomData<T>,
    _k: PhantomData<K>,
}

impl<F, T, K> GroupBy<F, T, K> {
    /// Create a new group_by stage.
    pub fn new(key_of: F) -> Self {
        Self {
            key_of,
            _t: PhantomData,
            _k: PhantomData,
        }
    }
}

impl<F, T, K> Stage<T> for GroupBy<F, T, K>
where
    F: FnMut(&T) -> K + Send + 'static,
    T: Send + 'static,
    K: Eq + Hash + Send + 'static,
{
    type Output = Vec<T>;

    fn attach(self, mut upstream: Stream<T>) -> Stream<Vec<T>> {
        let mut key_of = self.key_of;
        let ctx = upstream.context().clone();
        let capacity = upstream.capacity_hint();
        let (mut out, stream) = upstream.downstream("group_by", capacity);

        spawn_worker(&ctx, "group_by", capacity, async move {
            let mut index: HashMap<K, usize> = HashMap::new();
            let mut groups: Vec<Vec<T>> = Vec::new();

            loop {
                match upstream.recv().await {
                    Ok(Some(value)) => {
                        let Ok(key) = out.guard("group_by", || key_of(&value)) else {
                            return;
                        };
                        match index.entry(key) {
                            Entry::Occupied(slot) => groups[*slot.get()].push(value),
                            Entry::Vacant(slot) => {
                                slot.insert(groups.len());
                                groups.push(vec![value]);
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(_) => return,
                }
            }

            tracing::debug!(groups = groups.len(), "group_by materialized upstream");
            for group in groups {
                if !out.send(group).await {
                    return;
                }
            }
        });

        stream
    }
}

/// Create a group_by stage keyed by `key_of`.
pub fn group_by<F, T, K>(key_of: F) -> GroupBy<F, T, K>
where
    F: FnMut(&T) -> K + Send + 'static,
    T: Send + 'static,
    K: Eq + Hash + Send + 'static,
{
    GroupBy::new(key_of)
}
