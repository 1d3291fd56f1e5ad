// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fan-out / fan-in.
//!
//! Fan-out starts N stages that compete for values from one upstream; which
//! worker gets which value is up to the scheduler. Fan-in merges N sources
//! into one. Output order across workers is unspecified.
//!
//! Fan-in never lets a worker close the merged output. Each forwarder holds a
//! clone of the merged sender, and one barrier task owns the original: it
//! joins every forwarder and only then drops its sender, which is the moment
//! the merged source closes.

use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::consts::DEFAULT_CHANNEL_CAPACITY;
use crate::observability::messages::stream::{BarrierReleased, ForwarderPanicked};
use crate::observability::messages::StructuredLog;
use crate::streams::{pump, transform, Source};

/// Spread `src` across `workers` parallel stages applying `f`.
///
/// `workers` is raised to 1 if zero. Each returned source belongs to one
/// worker.
pub fn fan_out<T, U, F>(
    token: &CancellationToken,
    src: Source<T>,
    workers: usize,
    f: F,
) -> Vec<Source<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let shared = src.share();
    let f = Arc::new(f);

    (0..workers.max(1))
        .map(|_| {
            let f = Arc::clone(&f);
            transform(token, shared.clone(), move |value| f(value))
        })
        .collect()
}

/// Merge `sources` into one source that closes after all of them have.
pub fn fan_in<T>(token: &CancellationToken, sources: Vec<Source<T>>) -> Source<T>
where
    T: Send + 'static,
{
    let (tx, merged) = Source::channel(DEFAULT_CHANNEL_CAPACITY);

    let mut forwarders = JoinSet::new();
    for source in sources {
        forwarders.spawn(pump("fan_in", token.clone(), source, tx.clone(), |value| value));
    }

    tokio::spawn(async move {
        let count = forwarders.len();
        while let Some(joined) = forwarders.join_next().await {
            if let Err(e) = joined {
                ForwarderPanicked { error: &e }.log();
            }
        }

        BarrierReleased { forwarders: count }.log();
        drop(tx);
    });

    merged
}

/// [`fan_out`] followed by [`fan_in`].
///
/// ```rust
/// use std::collections::BTreeSet;
/// use the_millrace::cancel::CancellationToken;
/// use the_millrace::streams::{fan_out_fan_in, generate};
///
/// # #[tokio::main]
/// # async fn main() {
/// let token = CancellationToken::new();
/// let squares = fan_out_fan_in(&token, generate(&token, 1..=5), 3, |x| x * x);
///
/// let got: BTreeSet<_> = squares.collect().await.into_iter().collect();
/// assert_eq!(got, BTreeSet::from([1, 4, 9, 16, 25]));
/// # }
/// ```
pub fn fan_out_fan_in<T, U, F>(
    token: &CancellationToken,
    src: Source<T>,
    workers: usize,
    f: F,
) -> Source<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let outputs = fan_out(token, src, workers, f);
    fan_in(token, outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::generate;
    use std::collections::HashSet;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fan_out_creates_one_source_per_worker() {
        let token = CancellationToken::new();
        let outputs = fan_out(&token, generate(&token, 0..10), 4, |x| x);
        assert_eq!(outputs.len(), 4);

        let zero = fan_out(&token, generate(&token, 0..10), 0, |x| x);
        assert_eq!(zero.len(), 1);
    }

    #[tokio::test]
    async fn test_fan_out_workers_split_the_input() {
        let token = CancellationToken::new();
        let outputs = fan_out(&token, generate(&token, 0..50), 3, |x: u32| x + 1000);

        let mut all = Vec::new();
        for output in outputs {
            // Drain concurrently so no worker blocks the others
            all.push(tokio::spawn(output.collect()));
        }

        let mut values = Vec::new();
        for handle in all {
            values.extend(handle.await.unwrap());
        }
        values.sort_unstable();
        assert_eq!(values, (1000..1050).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_fan_in_merges_everything() {
        let token = CancellationToken::new();
        let merged = fan_in(
            &token,
            vec![
                generate(&token, vec![1, 2, 3]),
                generate(&token, vec![10, 20]),
                generate(&token, Vec::new()),
            ],
        );

        let mut values = merged.collect().await;
        values.sort_unstable();
        assert_eq!(values, vec![1, 2, 3, 10, 20]);
    }

    #[tokio::test]
    async fn test_fan_in_of_nothing_closes_immediately() {
        let token = CancellationToken::new();
        let mut merged = fan_in::<u8>(&token, Vec::new());
        let next = tokio::time::timeout(Duration::from_secs(1), merged.next())
            .await
            .expect("empty fan-in must close");
        assert_eq!(next, None);
    }

    #[tokio::test]
    async fn test_fan_in_waits_for_slowest_input() {
        let token = CancellationToken::new();
        let (slow_tx, slow) = Source::channel(1);
        let mut merged = fan_in(&token, vec![generate(&token, vec![1]), slow]);

        assert_eq!(merged.next().await, Some(1));

        // The fast input is done but the slow one is still open
        let pending = tokio::time::timeout(Duration::from_millis(50), merged.next()).await;
        assert!(pending.is_err(), "merged output closed before every input finished");

        slow_tx.send(2).await.unwrap();
        drop(slow_tx);
        assert_eq!(merged.collect().await, vec![2]);
    }

    #[tokio::test]
    async fn test_fan_out_fan_in_exact_multiset_for_many_worker_counts() {
        for workers in 1..=6 {
            let token = CancellationToken::new();
            let input: Vec<u64> = (0..40).collect();
            let out = fan_out_fan_in(&token, generate(&token, input.clone()), workers, |x| x * x);

            let mut got = tokio::time::timeout(Duration::from_secs(5), out.collect())
                .await
                .expect("fan-out/fan-in must terminate");
            got.sort_unstable();

            let mut expected: Vec<u64> = input.iter().map(|x| x * x).collect();
            expected.sort_unstable();
            assert_eq!(got, expected, "workers = {}", workers);
        }
    }

    #[tokio::test]
    async fn test_fan_out_fan_in_cancellation_terminates() {
        let token = CancellationToken::new();
        let mut out = fan_out_fan_in(&token, generate(&token, 0..u64::MAX), 4, |x| x);

        assert!(out.next().await.is_some());
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), out.collect())
            .await
            .expect("every worker and forwarder must exit after cancellation");
    }

    #[tokio::test]
    async fn test_fan_out_fan_in_squares_scenario() {
        let token = CancellationToken::new();
        let out = fan_out_fan_in(&token, generate(&token, 1..=5), 3, |x: i32| x * x);
        let got: HashSet<i32> = out.collect().await.into_iter().collect();
        assert_eq!(got, HashSet::from([1, 4, 9, 16, 25]));
    }
}
