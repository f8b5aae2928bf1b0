//! Fixed-arity pipeline composition.
//!
//! `pipeN` wires a source through `N - 1` transforms into a sink:
//!
//! ```rust,ignore
//! let squares = pipe3(
//!     from_slice(&ctx, &[1, 2, 3, 4, 5]),
//!     filter(|n: &i32| n % 2 == 1),
//!     map(|n: i32| n * n),
//!     to_vec::<i32>(),
//! )
//! .await?;
//! ```
//!
//! Stages are attached, and their workers spawned, when `pipeN` is called.
//! The returned future drives the sink. Each function is the same as chaining
//! [`Stream::then`] and [`Stream::sink`] by hand.

use std::future::Future;

use crate::stages::{Sink, Stage};
use crate::stream::Stream;

/// Drain `src` into `sink`.
pub fn pipe1<T, K>(src: Stream<T>, sink: K) -> impl Future<Output = K::Output> + Send
where
    T: Send + 'static,
    K: Sink<T>,
{
    src.sink(sink)
}

/// `sink(s1(src))`.
pub fn pipe2<T, S1, K>(src: Stream<T>, s1: S1, sink: K) -> impl Future<Output = K::Output> + Send
where
    T: Send + 'static,
    S1: Stage<T>,
    K: Sink<S1::Output>,
{
    src.then(s1).sink(sink)
}

/// `sink(s2(s1(src)))`.
pub fn pipe3<T, S1, S2, K>(
    src: Stream<T>,
    s1: S1,
    s2: S2,
    sink: K,
) -> impl Future<Output = K::Output> + Send
where
    T: Send + 'static,
    S1: Stage<T>,
    S2: Stage<S1::Output>,
    K: Sink<S2::Output>,
{
    src.then(s1).then(s2).sink(sink)
}

/// `sink(s3(s2(s1(src))))`.
pub fn pipe4<T, S1, S2, S3, K>(
    src: Stream<T>,
    s1: S1,
    s2: S2,
    s3: S3,
    sink: K,
) -> impl Future<Output = K::Output> + Send
where
    T: Send + 'static,
    S1: Stage<T>,
    S2: Stage<S1::Output>,
    S3: Stage<S2::Output>,
    K: Sink<S3::Output>,
{
    src.then(s1).then(s2).then(s3).sink(sink)
}

/// `sink(s4(s3(s2(s1(src)))))`.
pub fn pipe5<T, S1, S2, S3, S4, K>(
    src: Stream<T>,
    s1: S1,
    s2: S2,
    s3: S3,
    s4: S4,
    sink: K,
) -> impl Future<Output = K::Output> + Send
where
    T: Send + 'static,
    S1: Stage<T>,
    S2: Stage<S1::Output>,
    S3: Stage<S2::Output>,
    S4: Stage<S3::Output>,
    K: Sink<S4::Output>,
{
    src.then(s1).then(s2).then(s3).then(s4).sink(sink)
}

/// Five transforms, then the sink.
#[allow(clippy::too_many_arguments)]
pub fn pipe6<T, S1, S2, S3, S4, S5, K>(
    src: Stream<T>,
    s1: S1,
    s2: S2,
    s3: S3,
    s4: S4,
    s5: S5,
    sink: K,
) -> impl Future<Output = K::Output> + Send
where
    T: Send + 'static,
    S1: Stage<T>,
    S2: Stage<S1::Output>,
    S3: Stage<S2::Output>,
    S4: Stage<S3::Output>,
    S5: Stage<S4::Output>,
    K: Sink<S5::Output>,
{
    src.then(s1).then(s2).then(s3).then(s4).then(s5).sink(sink)
}

/// Six transforms, then the sink.
#[allow(clippy::too_many_arguments)]
pub fn pipe7<T, S1, S2, S3, S4, S5, S6, K>(
    src: Stream<T>,
    s1: S1,
    s2: S2,
    s3: S3,
    s4: S4,
    s5: S5,
    s6: S6,
    sink: K,
) -> impl Future<Output = K::Output> + Send
where
    T: Send + 'static,
    S1: Stage<T>,
    S2: Stage<S1::Output>,
    S3: Stage<S2::Output>,
    S4: Stage<S3::Output>,
    S5: Stage<S4::Output>,
    S6: Stage<S5::Output>,
    K: Sink<S6::Output>,
{
    src.then(s1)
        .then(s2)
        .then(s3)
        .then(s4)
        .then(s5)
        .then(s6)
        .sink(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::error::Error;
    use crate::stages::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Employee {
        id: u32,
        department: &'static str,
        name: &'static str,
    }

    fn staff(rows: &[(u32, &'static str, &'static str)]) -> Vec<Employee> {
        rows.iter()
            .map(|&(id, department, name)| Employee {
                id,
                department,
                name,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_filter_map_to_vec() {
        let ctx = Context::background();
        let got = pipe3(
            from_slice(&ctx, &[1, 2, 3, 4, 5]),
            filter(|n: &i32| n % 2 == 1),
            map(|n: i32| n * n),
            to_vec::<i32>(),
        )
        .await;
        assert_eq!(got, Ok(vec![1, 9, 25]));
    }

    #[tokio::test]
    async fn test_short_circuit_sinks() {
        let ctx = Context::background();
        let q = [1, 2, 3, 4];
        let src = || from_slice(&ctx, &q);
        let even = |n: &i32| n % 2 == 0;

        assert_eq!(pipe1(src(), any(|n: &i32| *n > 3)).await, Ok(true));
        assert_eq!(pipe1(src(), any(|n: &i32| *n > 10)).await, Ok(false));
        assert_eq!(pipe1(src(), all(|n: &i32| *n < 5)).await, Ok(true));
        assert_eq!(pipe1(src(), all(even)).await, Ok(false));

        let evens = pipe2(src(), filter(even), count()).await;
        assert_eq!(evens, Ok(2));

        let first_even = pipe2(src(), filter(even), first()).await;
        assert_eq!(first_even, Ok(2));

        let large = |n: &i32| *n > 10;
        let missing = pipe2(src(), filter(large), first()).await;
        let missing = missing.unwrap_err();
        assert_eq!(missing, Error::Empty);
        assert_eq!(
            missing.to_string(),
            "stream is empty, no first element found"
        );

        assert_eq!(pipe1(src(), count()).await, Ok(4));
    }

    #[tokio::test]
    async fn test_reverse_strings() {
        let ctx = Context::background();
        let src = from_slice(&ctx, &["a", "b", "c"]);
        let got = pipe1(src, reverse()).await;
        assert_eq!(got, Ok(vec!["c", "b", "a"]));
    }

    #[tokio::test]
    async fn test_reverse_twice_is_identity() {
        let ctx = Context::background();
        let once = pipe1(from_iter(&ctx, 0..50), reverse()).await;
        let twice = pipe1(from_iter(&ctx, once.unwrap()), reverse()).await;
        assert_eq!(twice, Ok((0..50).collect()));
    }

    #[tokio::test]
    async fn test_distinct_by_id() {
        let ctx = Context::background();
        let rows = [(1, "HR", "Alice"), (2, "IT", "Bob"), (1, "HR", "Alice")];
        let data = staff(&rows);
        let got = pipe2(
            from_iter(&ctx, data.clone()),
            distinct(|e: &Employee| e.id),
            to_vec::<Employee>(),
        )
        .await;
        assert_eq!(got, Ok(data[..2].to_vec()));
    }

    #[tokio::test]
    async fn test_flatten_nested() {
        let ctx = Context::background();
        let got = pipe2(
            from_iter(&ctx, vec![vec![1, 2], vec![3, 4], vec![5]]),
            flatten::<Vec<i32>>(),
            to_vec::<i32>(),
        )
        .await;
        assert_eq!(got, Ok(vec![1, 2, 3, 4, 5]));
    }

    #[tokio::test]
    async fn test_for_each_sum() {
        let ctx = Context::background();
        let mut sum = 0;
        let add = for_each(|n: i32| sum += n);
        let done = pipe1(from_slice(&ctx, &[1, 2, 3]), add).await;
        assert_eq!(done, Ok(()));
        assert_eq!(sum, 6);
    }

    #[tokio::test]
    async fn test_upstream_cancel() {
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();

        let partial = pipe3(
            from_slice(&ctx, &[1, 2, 3, 4, 5]),
            filter(|n: &i32| n % 2 == 1),
            map(|n: i32| n * n),
            to_vec::<i32>(),
        )
        .await
        .unwrap_err();
        assert_eq!(partial.error, Error::Cancelled);
        assert!(partial.value.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_map_par() {
        let ctx = Context::background();
        let got = pipe2(
            from_slice(&ctx, &[1, 2, 3, 4, 5]),
            map_par(|n: i32| n * n),
            to_vec::<i32>(),
        )
        .await;
        assert_eq!(got, Ok(vec![1, 4, 9, 16, 25]));
    }

    #[tokio::test]
    async fn test_group_by_department() {
        let ctx = Context::background();
        let data = staff(&[
            (1, "HR", "Alice"),
            (2, "IT", "Bob"),
            (3, "HR", "Charlie"),
            (4, "IT", "David"),
            (5, "Finance", "Eve"),
            (6, "IT", "Frank"),
        ]);

        let sizes = pipe3(
            from_iter(&ctx, data.clone()),
            group_by(|e: &Employee| e.department),
            map(|group: Vec<Employee>| group.len()),
            to_vec::<usize>(),
        )
        .await;
        assert_eq!(sizes, Ok(vec![2, 3, 1]));

        let groups = pipe2(
            from_iter(&ctx, data),
            group_by(|e: &Employee| e.department),
            to_vec::<Vec<Employee>>(),
        )
        .await
        .unwrap();
        let it: Vec<_> = groups[1].iter().map(|e| e.name).collect();
        assert_eq!(it, vec!["Bob", "David", "Frank"]);
    }

    #[tokio::test]
    async fn test_group_by_then_any() {
        let ctx = Context::background();
        let data = staff(&[
            (1, "HR", "Alice"),
            (2, "IT", "Bob"),
            (3, "HR", "Charlie"),
            (4, "IT", "David"),
            (5, "HR", "Eve"),
            (6, "IT", "Frank"),
            (16, "Finance", "Paul"),
            (17, "Finance", "Quinn"),
            (18, "Finance", "Rita"),
            (19, "Sales", "Sam"),
        ]);

        let got = pipe2(
            from_iter(&ctx, data),
            group_by(|e: &Employee| e.department),
            any(|group: &Vec<Employee>| group.len() > 2),
        )
        .await;
        assert_eq!(got, Ok(true));
    }

    #[tokio::test]
    async fn test_early_cancel_through_transforms() {
        let ctx = Context::background();
        let (mut tx, src) = Stream::channel(&ctx, 0);
        let producer = tokio::spawn(async move {
            for chunk in [vec![1, 2], vec![3]] {
                if !tx.send(chunk).await {
                    return false;
                }
            }
            true
        });

        let got = pipe6(
            src,
            flatten::<Vec<i32>>(),
            filter(|n: &i32| *n > 0),
            map(|n: i32| n),
            distinct(|n: &i32| *n),
            inspect(|_: &i32| {}),
            first::<i32>(),
        )
        .await;
        assert_eq!(got, Ok(1));

        // The producer either finished or saw the cancellation; it never hangs.
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), producer)
            .await
            .expect("producer must terminate");
    }

    #[tokio::test]
    async fn test_pipe7_with_custom_stage() {
        let ctx = Context::background();
        let doubled = stage_fn(|s: Stream<u32>| s.then(map(|n: u32| n * 2)));
        let got = pipe7(
            from_iter(&ctx, 0..100u32),
            skip(10),
            take(20),
            doubled,
            filter(|n: &u32| n % 3 == 0),
            filter_map(|n: u32| n.checked_sub(30)),
            map(|n: u32| n as u64),
            fold(0u64, |acc, n: u64| acc + n),
        )
        .await;
        // 10..30 doubled: 20..58 step 2; multiples of 3 from 30 up: 30,36,...,54
        let expected: u64 = (30..=54).step_by(6).map(|n| n - 30).sum();
        assert_eq!(got, Ok(expected));
    }
}
