//! The handle one stage hands to the next.
//!
//! A [`Stream`] is the read end of a stage's output channel together with
//! the pipeline's [`Context`] and root [`CancelHandle`]. An [`Emitter`] is
//! the matching write end, owned by the stage's worker task. Neither is
//! `Clone`: each channel has exactly one writer and one reader.

use std::future::Future;

use kanal::{AsyncReceiver, AsyncSender};
use tracing::Instrument;

use crate::channel;
use crate::context::{CancelHandle, CancelOnDrop, Context};
use crate::error::Result;
use crate::observability::{self, StageMetrics};
use crate::stages::{Sink, Stage};

/// A running stage's output, ready to be consumed by one transform or sink.
pub struct Stream<T> {
    ctx: Context,
    cancel: CancelHandle,
    capacity_hint: usize,
    rx: AsyncReceiver<T>,
}

impl<T> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("capacity_hint", &self.capacity_hint)
            .field("cancelled", &self.ctx.is_cancelled())
            .finish()
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Open a custom source.
    ///
    /// Derives a cancellable child of `parent` exactly like
    /// [`from_iter`](crate::from_iter) does, and returns the writer the
    /// caller drives plus the stream for the rest of the pipeline.
    ///
    /// ```rust,ignore
    /// let (mut tx, stream) = Stream::channel(&ctx, 0);
    /// tokio::spawn(async move {
    ///     for v in items {
    ///         if !tx.send(v).await {
    ///             return;
    ///         }
    ///     }
    /// });
    /// ```
    pub fn channel(parent: &Context, capacity: usize) -> (Emitter<T>, Stream<T>) {
        let (ctx, cancel) = parent.with_cancel();
        Self::open(ctx, cancel, "channel", capacity)
    }

    fn open(
        ctx: Context,
        cancel: CancelHandle,
        stage: &'static str,
        capacity: usize,
    ) -> (Emitter<T>, Stream<T>) {
        let (tx, rx) = channel::bounded(capacity);
        let emitter = Emitter {
            metrics: StageMetrics::new(&ctx.config().name, stage),
            ctx: ctx.clone(),
            cancel: cancel.clone(),
            tx,
            stage,
            emitted: 0,
        };
        let stream = Stream {
            ctx,
            cancel,
            capacity_hint: capacity,
            rx,
        };
        (emitter, stream)
    }

    pub(crate) fn open_source(
        parent: &Context,
        stage: &'static str,
        capacity: usize,
    ) -> (Emitter<T>, Stream<T>) {
        let (ctx, cancel) = parent.with_cancel();
        Self::open(ctx, cancel, stage, capacity)
    }

    /// Create the next stage's channel, sharing this pipeline's context.
    pub fn downstream<U: Send + 'static>(
        &self,
        stage: &'static str,
        capacity: usize,
    ) -> (Emitter<U>, Stream<U>) {
        Stream::open(self.ctx.clone(), self.cancel.clone(), stage, capacity)
    }

    /// Receive the next element.
    ///
    /// See [`channel::try_recv`] for the meaning of each outcome.
    pub async fn recv(&mut self) -> Result<Option<T>> {
        channel::try_recv(&self.ctx, &self.rx).await
    }

    /// Attach a transform stage.
    pub fn then<S: Stage<T>>(self, stage: S) -> Stream<S::Output> {
        stage.attach(self)
    }

    /// Drain into a sink.
    pub fn sink<K: Sink<T>>(self, sink: K) -> impl Future<Output = K::Output> + Send {
        sink.drain(self)
    }
}

impl<T> Stream<T> {
    /// The pipeline's context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The pipeline's root cancel operation.
    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }

    /// Cancel the whole pipeline.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A guard cancelling the whole pipeline when dropped.
    pub fn release_on_drop(&self) -> CancelOnDrop {
        self.cancel.drop_guard()
    }

    /// Advisory buffer size for the next stage.
    pub fn capacity_hint(&self) -> usize {
        self.capacity_hint
    }

    /// Run a user callback under this pipeline's fault handling.
    pub fn guard<R>(&self, stage: &'static str, f: impl FnOnce() -> R) -> Result<R> {
        self.cancel.guard(stage, f)
    }
}

/// The write end of a stage's output channel.
///
/// Dropping the emitter closes the channel, so a worker task that owns it
/// closes its output on every exit path.
pub struct Emitter<T> {
    ctx: Context,
    cancel: CancelHandle,
    tx: AsyncSender<T>,
    stage: &'static str,
    metrics: StageMetrics,
    emitted: u64,
}

impl<T> Emitter<T> {
    /// Send `value` downstream.
    ///
    /// Returns `false` once the pipeline is cancelled or the reader is gone;
    /// the worker should stop then.
    pub async fn send(&mut self, value: T) -> bool {
        let sent = channel::try_send(&self.ctx, &self.tx, value).await;
        if sent {
            self.emitted += 1;
            self.metrics.record_emitted();
        }
        sent
    }

    /// Note an element this stage decided not to forward.
    pub fn skip(&self) {
        tracing::trace!(stage = self.stage, "element dropped");
        self.metrics.record_dropped();
    }

    /// Run a user callback under this pipeline's fault handling.
    pub fn guard<R>(&self, stage: &'static str, f: impl FnOnce() -> R) -> Result<R> {
        self.cancel.guard(stage, f)
    }

    /// The pipeline's context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Whether the pipeline has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.ctx.is_cancelled()
    }

    /// Number of elements sent so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl<T> Drop for Emitter<T> {
    fn drop(&mut self) {
        // Unwinding through the writer must not look like a clean end of
        // stream, so the cause is set before the sender closes.
        if std::thread::panicking() {
            self.cancel.fault(self.stage, "producer panicked");
        }
        observability::trace_stage_finished(self.stage, self.emitted, self.ctx.is_cancelled());
    }
}

/// Spawn a stage worker inside its tracing span.
pub(crate) fn spawn_worker<F>(ctx: &Context, stage: &'static str, capacity: usize, worker: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let span = observability::span_stage(&ctx.config().name, stage);
    tokio::spawn(
        async move {
            observability::trace_stage_started(stage, capacity);
            worker.await;
        }
        .instrument(span),
    );
}

/// Record a pipeline ended by cancellation, for sinks reporting an error.
pub(crate) fn note_cancelled(cancel: &CancelHandle) {
    observability::record_pipeline_cancelled(cancel.pipeline());
}
