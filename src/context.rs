//! Cancellation context shared by every stage of a pipeline.
//!
//! A [`Context`] is the read side: stages test it (`is_cancelled`), wait on
//! it (`cancelled`), or ask why it fired (`err`). A [`CancelHandle`] is the
//! write side. Both wrap a [`CancellationToken`], so reads are lock-free and
//! the broadcast reaches any number of tasks.
//!
//! Contexts form a tree: cancelling a context cancels every context derived
//! from it, never its parent.
//!
//! ```rust,ignore
//! let (ctx, cancel) = Context::background().with_cancel();
//! let stream = from_iter(&ctx, 0..10);
//! cancel.cancel();
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::observability;

/// One node of the context tree.
#[derive(Debug)]
struct Node {
    token: CancellationToken,
    /// First recorded reason for the cancellation of this node.
    cause: OnceLock<Error>,
    parent: Option<Arc<Node>>,
}

impl Node {
    fn root() -> Self {
        Self {
            token: CancellationToken::new(),
            cause: OnceLock::new(),
            parent: None,
        }
    }

    fn child(parent: &Arc<Node>) -> Self {
        Self {
            token: parent.token.child_token(),
            cause: OnceLock::new(),
            parent: Some(Arc::clone(parent)),
        }
    }

    fn err(&self) -> Option<Error> {
        if !self.token.is_cancelled() {
            return None;
        }
        if let Some(cause) = self.cause.get() {
            return Some(cause.clone());
        }
        // Inherited from an ancestor.
        let mut node = self.parent.as_deref();
        while let Some(n) = node {
            if let Some(cause) = n.cause.get() {
                return Some(cause.clone());
            }
            node = n.parent.as_deref();
        }
        Some(Error::Cancelled)
    }

    fn cancel_with(&self, cause: Error) {
        let _ = self.cause.set(cause);
        self.token.cancel();
    }
}

/// Cancellation context of a pipeline.
///
/// Cheap to clone; all clones observe the same signal.
#[derive(Debug, Clone)]
pub struct Context {
    node: Arc<Node>,
    config: Arc<PipelineConfig>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// A root context that is never cancelled on its own.
    pub fn background() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// A root context carrying `config` for every pipeline built on it.
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            node: Arc::new(Node::root()),
            config: Arc::new(config),
        }
    }

    /// Derive a cancellable child context.
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        let node = Arc::new(Node::child(&self.node));
        let ctx = Context {
            node: Arc::clone(&node),
            config: Arc::clone(&self.config),
        };
        let handle = CancelHandle {
            node,
            pipeline: self.config.name.clone(),
        };
        (ctx, handle)
    }

    /// Derive a child context that cancels itself after `timeout`.
    ///
    /// The cause recorded on expiry is [`Error::DeadlineExceeded`]. The timer
    /// task exits early when the context is cancelled some other way.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_timeout(&self, timeout: Duration) -> (Context, CancelHandle) {
        let (ctx, handle) = self.with_cancel();
        let node = Arc::clone(&handle.node);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    tracing::debug!(?timeout, "context deadline exceeded");
                    node.cancel_with(Error::DeadlineExceeded);
                }
                _ = node.token.cancelled() => {}
            }
        });
        (ctx, handle)
    }

    /// Non-blocking check of the done signal.
    pub fn is_cancelled(&self) -> bool {
        self.node.token.is_cancelled()
    }

    /// Wait until the context is cancelled.
    pub async fn cancelled(&self) {
        self.node.token.cancelled().await
    }

    /// Why the context was cancelled, or `None` while it is live.
    pub fn err(&self) -> Option<Error> {
        self.node.err()
    }

    /// The cancellation cause, defaulting to [`Error::Cancelled`].
    ///
    /// Only meaningful once [`is_cancelled`](Self::is_cancelled) returned true.
    pub(crate) fn cause(&self) -> Error {
        self.err().unwrap_or(Error::Cancelled)
    }

    /// Configuration inherited from the root context.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// The cancel operation of one context.
///
/// Calling [`cancel`](Self::cancel) more than once has no further effect.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    node: Arc<Node>,
    pipeline: String,
}

impl CancelHandle {
    /// Cancel the context and everything derived from it.
    pub fn cancel(&self) {
        self.node.cancel_with(Error::Cancelled);
    }

    /// Whether the context has been cancelled (by this handle or a parent).
    pub fn is_cancelled(&self) -> bool {
        self.node.token.is_cancelled()
    }

    /// Run a user callback, turning a panic into a pipeline fault.
    ///
    /// On panic the fault is recorded as the cancellation cause, the
    /// pipeline is cancelled, and the fault is returned.
    pub fn guard<R>(&self, stage: &'static str, f: impl FnOnce() -> R) -> Result<R> {
        catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
            let fault = Error::from_panic(stage, &*payload);
            self.fail(stage, fault.clone());
            fault
        })
    }

    /// Record a fault raised outside [`guard`](Self::guard) and cancel.
    pub(crate) fn fault(&self, stage: &'static str, message: impl Into<String>) {
        let fault = Error::StageFault {
            stage,
            message: message.into(),
        };
        self.fail(stage, fault);
    }

    fn fail(&self, stage: &'static str, fault: Error) {
        tracing::warn!(stage, error = %fault, "stage faulted, cancelling pipeline");
        observability::record_stage_fault(&self.pipeline, stage);
        self.node.cancel_with(fault);
    }

    /// A guard that cancels this context when dropped.
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            handle: self.clone(),
        }
    }

    pub(crate) fn pipeline(&self) -> &str {
        &self.pipeline
    }
}

/// Cancels its context when dropped, including during unwinding.
#[derive(Debug)]
#[must_use = "the context is cancelled as soon as the guard is dropped"]
pub struct CancelOnDrop {
    handle: CancelHandle,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
