//! Source stages.

use crate::context::Context;
use crate::stream::{Stream, spawn_worker};

/// Start a producer over `items`.
///
/// The producer runs under a cancellable child of `parent`, and its cancel
/// operation becomes the root cancellation of the pipeline. Its output
/// buffer holds `max(1, len / 2)` elements (capped by
/// [`PipelineConfig::max_source_capacity`](crate::PipelineConfig)), where
/// `len` is the iterator's lower size bound.
///
/// If `parent` is already cancelled the producer emits nothing.
///
/// # Example
///
/// ```rust,ignore
/// let evens = from_iter(&ctx, 0..10)
///     .then(filter(|n: &u32| n % 2 == 0))
///     .sink(to_vec::<u32>())
///     .await?;
/// ```
pub fn from_iter<I>(parent: &Context, items: I) -> Stream<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    let mut iter = items.into_iter();
    let capacity = parent.config().source_capacity(iter.size_hint().0);
    let (mut out, stream) = Stream::open_source(parent, "source", capacity);

    spawn_worker(parent, "source", capacity, async move {
        loop {
            let next = match out.guard("source", || iter.next()) {
                Ok(Some(value)) => value,
                Ok(None) | Err(_) => break,
            };
            if !out.send(next).await {
                break;
            }
        }
    });

    stream
}

/// Start a producer over a copy of `items`.
pub fn from_slice<T>(parent: &Context, items: &[T]) -> Stream<T>
where
    T: Clone + Send + 'static,
{
    from_iter(parent, items.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_source_emits_in_order() {
        let ctx = Context::background();
        let mut stream = from_iter(&ctx, vec![3, 1, 2]);
        assert_eq!(stream.capacity_hint(), 1);

        assert_eq!(stream.recv().await, Ok(Some(3)));
        assert_eq!(stream.recv().await, Ok(Some(1)));
        assert_eq!(stream.recv().await, Ok(Some(2)));
        assert_eq!(stream.recv().await, Ok(None));
    }

    #[tokio::test]
    async fn test_source_capacity_hint() {
        let ctx = Context::background();
        let stream = from_slice(&ctx, &[0u8; 40]);
        assert_eq!(stream.capacity_hint(), 20);

        let stream = from_iter(&ctx, Vec::<u8>::new());
        assert_eq!(stream.capacity_hint(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_parent_emits_nothing() {
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();

        let mut stream = from_iter(&ctx, 0..100);
        assert_eq!(stream.recv().await, Err(Error::Cancelled));
    }

    #[tokio::test]
    async fn test_infinite_source_stops_on_cancel() {
        let ctx = Context::background();
        let mut stream = from_iter(&ctx, 0u64..);
        assert_eq!(stream.recv().await, Ok(Some(0)));
        stream.cancel();
        assert_eq!(stream.recv().await, Err(Error::Cancelled));
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_panicking_iterator_faults_pipeline() {
        let ctx = Context::background();
        let parse = |n: u32| {
            assert!(n != 2, "corrupt record");
            n
        };
        let items = (0..4).map(parse);
        let mut stream = from_iter(&ctx, items);

        // Buffered elements may or may not be observed before the fault.
        let mut seen = Vec::new();
        let error = loop {
            match stream.recv().await {
                Ok(Some(n)) => seen.push(n),
                Ok(None) => panic!("fault must not look like exhaustion"),
                Err(e) => break e,
            }
        };
        assert!(seen.len() <= 2);
        assert_eq!(
            error,
            Error::StageFault {
                stage: "source",
                message: "corrupt record".to_string(),
            }
        );
    }
}
