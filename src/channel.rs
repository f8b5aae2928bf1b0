//! Stage channel contract.
//!
//! Stages hand elements downstream over bounded Kanal channels. The two
//! primitives here are the only way a stage touches a channel, which makes
//! every worker loop *receive-or-stop, process, send-or-stop*.
//!
//! Both primitives check the done signal first (a non-blocking ready check)
//! and otherwise race it against the transfer with an unbiased
//! `tokio::select!`, so an always-ready partner cannot starve cancellation.

use kanal::{AsyncReceiver, AsyncSender, bounded_async};

use crate::context::Context;
use crate::error::Result;

/// Create a bounded channel for one stage boundary.
///
/// A capacity of zero creates a rendezvous channel.
pub fn bounded<T>(capacity: usize) -> (AsyncSender<T>, AsyncReceiver<T>) {
    bounded_async(capacity)
}

/// Try to hand `value` to the channel.
///
/// Returns `false` without blocking if `ctx` is already cancelled, if the
/// cancellation fires while waiting for room, or if the receiving end was
/// dropped.
pub async fn try_send<T>(ctx: &Context, tx: &AsyncSender<T>, value: T) -> bool {
    if ctx.is_cancelled() {
        return false;
    }
    tokio::select! {
        _ = ctx.cancelled() => false,
        sent = tx.send(value) => sent.is_ok(),
    }
}

/// Try to receive the next value.
///
/// - `Err(cause)` when cancellation was observed before a value arrived,
/// - `Ok(None)` when the channel is closed and drained without cancellation,
/// - `Ok(Some(value))` otherwise.
pub async fn try_recv<T>(ctx: &Context, rx: &AsyncReceiver<T>) -> Result<Option<T>> {
    if ctx.is_cancelled() {
        return Err(ctx.cause());
    }
    tokio::select! {
        _ = ctx.cancelled() => Err(ctx.cause()),
        received = rx.recv() => match received {
            Ok(value) => Ok(Some(value)),
            // A writer torn down by cancellation also closes its channel.
            Err(_) if ctx.is_cancelled() => Err(ctx.cause()),
            Err(_) => Ok(None),
        },
    }
}
