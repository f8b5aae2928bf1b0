//! Order-preserving parallel map.
//!
//! ```text
//!             ┌─> worker ─┐
//! dispatcher ─┼─> worker ─┼─> collector (reorder by index) ─> output
//!             └─> worker ─┘
//! ```
//!
//! The dispatcher tags each element with its input index. Workers complete
//! in any order; the collector holds early results until every lower index
//! has been emitted. A semaphore bounds the elements in flight, which also
//! bounds the reorder buffer.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::Semaphore;

use super::Stage;
use crate::channel::{self, try_recv, try_send};
use crate::stream::{Stream, spawn_worker};

/// A transform that maps elements on a pool of workers, keeping input order.
///
/// `f` runs concurrently on several elements, so it must not depend on the
/// order in which elements are processed.
pub struct MapPar<F, In, Out> {
    f: F,
    workers: Option<usize>,
    _in: PhantomData<In>,
    _out: PhantomData<Out>,
}

impl<F, In, Out> MapPar<F, In, Out> {
    /// Create a new map_par stage with the configured worker count.
    pub fn new(f: F) -> Self {
        Self {
            f,
            workers: None,
            _in: PhantomData,
            _out: PhantomData,
        }
    }

    /// Override the worker count for this stage (at least one).
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }
}

impl<F, In, Out> Stage<In> for MapPar<F, In, Out>
where
    F: Fn(In) -> Out + Send + Sync + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    type Output = Out;

    fn attach(self, mut upstream: Stream<In>) -> Stream<Out> {
        let ctx = upstream.context().clone();
        let cancel = upstream.cancel_handle().clone();
        let workers = self.workers.unwrap_or(ctx.config().par_workers).max(1);
        let window = ctx.config().par_window(workers);
        let capacity = upstream.capacity_hint();
        let f = Arc::new(self.f);

        let (mut out, stream) = upstream.downstream("map_par", capacity);
        let (work_tx, work_rx) = channel::bounded::<(usize, In)>(workers);
        let (done_tx, done_rx) = channel::bounded::<(usize, Out)>(workers);
        let in_flight = Arc::new(Semaphore::new(window));

        tracing::debug!(workers, window, "map_par starting");

        // Dispatcher: tag and hand out work while the window has room.
        let dispatch_ctx = ctx.clone();
        let window_permits = Arc::clone(&in_flight);
        spawn_worker(&ctx, "map_par.dispatch", workers, async move {
            let mut index = 0usize;
            while let Ok(Some(value)) = upstream.recv().await {
                let permit = tokio::select! {
                    _ = dispatch_ctx.cancelled() => break,
                    permit = window_permits.acquire() => permit,
                };
                let Ok(permit) = permit else {
                    break;
                };
                // Returned by the collector once this index is emitted.
                permit.forget();
                if !try_send(&dispatch_ctx, &work_tx, (index, value)).await {
                    break;
                }
                index += 1;
            }
        });

        for _ in 0..workers {
            let worker_ctx = ctx.clone();
            let cancel = cancel.clone();
            let f = Arc::clone(&f);
            let work_rx = work_rx.clone();
            let done_tx = done_tx.clone();
            spawn_worker(&ctx, "map_par.worker", workers, async move {
                while let Ok(Some((index, value))) = try_recv(&worker_ctx, &work_rx).await {
                    let Ok(result) = cancel.guard("map_par", || f(value)) else {
                        break;
                    };
                    if !try_send(&worker_ctx, &done_tx, (index, result)).await {
                        break;
                    }
                }
            });
        }
        // Only workers hold these now; the collector sees exhaustion once
        // every worker is done.
        drop(work_rx);
        drop(done_tx);

        let collect_ctx = ctx.clone();
        spawn_worker(&ctx, "map_par", capacity, async move {
            let mut pending: BTreeMap<usize, Out> = BTreeMap::new();
            let mut next = 0usize;
            while let Ok(Some((index, result))) = try_recv(&collect_ctx, &done_rx).await {
                pending.insert(index, result);
                while let Some(ready) = pending.remove(&next) {
                    if !out.send(ready).await {
                        return;
                    }
                    next += 1;
                    in_flight.add_permits(1);
                }
            }
            if !pending.is_empty() {
                tracing::debug!(
                    unflushed = pending.len(),
                    "map_par stopped with results out of order"
                );
            }
        });

        stream
    }
}

/// Create a map_par stage.
///
/// # Example
///
/// ```rust,ignore
/// let squares = source.then(map_par(|n: u64| n * n).workers(4));
/// ```
pub fn map_par<F, In, Out>(f: F) -> MapPar<F, In, Out>
where
    F: Fn(In) -> Out + Send + Sync + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    MapPar::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::context::Context;
    use crate::error::Error;
    use crate::stages::{from_iter, to_vec};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_map_par_preserves_order() {
        let ctx = Context::background();
        let squares = from_iter(&ctx, vec![1, 2, 3, 4, 5])
            .then(map_par(|n: i32| n * n))
            .sink(to_vec::<i32>())
            .await;
        assert_eq!(squares, Ok(vec![1, 4, 9, 16, 25]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_map_par_reorders_out_of_order_completion() {
        let ctx = Context::background();
        // Earlier elements take longer, so workers finish in reverse order.
        let slow_first = |n: u64| {
            std::thread::sleep(Duration::from_millis(40 - n * 5));
            n * 10
        };
        let result = from_iter(&ctx, 0..8u64)
            .then(map_par(slow_first).workers(4))
            .sink(to_vec::<u64>())
            .await;
        assert_eq!(result, Ok((0..8).map(|n| n * 10).collect::<Vec<_>>()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_map_par_large_input_with_small_window() {
        let config = PipelineConfig::new()
            .with_par_workers(3)
            .with_par_window_factor(1);
        let ctx = Context::with_config(config);
        let result = from_iter(&ctx, 0..1000u32)
            .then(map_par(|n: u32| n + 1))
            .sink(to_vec::<u32>())
            .await
            .unwrap();
        assert_eq!(result, (1..=1000).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_map_par_fault_cancels_pipeline() {
        let ctx = Context::background();
        let unlucky = |n: u32| {
            assert!(n != 7, "unlucky");
            n
        };
        let partial = from_iter(&ctx, 0..100u32)
            .then(map_par(unlucky).workers(2))
            .sink(to_vec::<u32>())
            .await
            .unwrap_err();

        assert!(partial.value.len() <= 7);
        assert_eq!(
            partial.error,
            Error::StageFault {
                stage: "map_par",
                message: "unlucky".to_string(),
            }
        );
    }
}
