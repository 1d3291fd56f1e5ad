// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::consts::DEFAULT_CHANNEL_CAPACITY;
use crate::observability::messages::stream::{TaskStarted, TaskStopped};
use crate::observability::messages::StructuredLog;
use crate::streams::{offer, or_done, pull_for, Offer, Pulled, Source, StopReason};

/// Flatten a source of sources into one source, depth first.
///
/// Each inner source is drained completely (through [`or_done`]) before the
/// next one is taken from `sources`. Cancellation stops both the outer
/// iteration and the inner drain in progress.
///
/// ```rust
/// use the_millrace::cancel::CancellationToken;
/// use the_millrace::streams::{bridge, generate};
///
/// # #[tokio::main]
/// # async fn main() {
/// let token = CancellationToken::new();
/// let inner = vec![generate(&token, vec![1, 2]), generate(&token, vec![3])];
/// let flat = bridge(&token, generate(&token, inner));
/// assert_eq!(flat.collect().await, vec![1, 2, 3]);
/// # }
/// ```
pub fn bridge<T>(token: &CancellationToken, sources: Source<Source<T>>) -> Source<T>
where
    T: Send + 'static,
{
    let (tx, out) = Source::channel(DEFAULT_CHANNEL_CAPACITY);
    tokio::spawn(run_bridge(token.clone(), sources, tx));
    out
}

async fn run_bridge<T>(
    token: CancellationToken,
    mut sources: Source<Source<T>>,
    tx: mpsc::Sender<T>,
) where
    T: Send + 'static,
{
    TaskStarted {
        task: "bridge",
        capacity: tx.max_capacity(),
    }
    .log();

    let mut forwarded = 0usize;
    let reason = 'outer: loop {
        let inner = match pull_for(&token, &mut sources, &tx).await {
            Pulled::Value(inner) => inner,
            Pulled::Ended => break StopReason::Exhausted,
            Pulled::Cancelled => break StopReason::Cancelled,
            Pulled::Dropped => break StopReason::DownstreamDropped,
        };

        let mut inner = or_done(&token, inner);
        loop {
            let value = match pull_for(&token, &mut inner, &tx).await {
                Pulled::Value(value) => value,
                Pulled::Ended => break,
                Pulled::Cancelled => break 'outer StopReason::Cancelled,
                Pulled::Dropped => break 'outer StopReason::DownstreamDropped,
            };

            match offer(&token, &tx, value).await {
                Offer::Accepted => forwarded += 1,
                Offer::Cancelled => break 'outer StopReason::Cancelled,
                Offer::Dropped => break 'outer StopReason::DownstreamDropped,
            }
        }
    };

    TaskStopped {
        task: "bridge",
        forwarded,
        reason,
    }
    .log();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::generate;
    use std::time::Duration;

    #[tokio::test]
    async fn test_bridge_flattens_in_order() {
        let token = CancellationToken::new();
        let inner = vec![
            generate(&token, vec![1, 2, 3]),
            generate(&token, Vec::new()),
            generate(&token, vec![4]),
            generate(&token, vec![5, 6]),
        ];

        let flat = bridge(&token, generate(&token, inner));
        assert_eq!(flat.collect().await, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_bridge_drains_inner_before_advancing() {
        let token = CancellationToken::new();
        let (outer_tx, outer) = Source::channel(4);
        let (first_tx, first) = Source::channel(4);
        let (second_tx, second) = Source::channel(4);

        outer_tx.send(first).await.unwrap();
        outer_tx.send(second).await.unwrap();
        drop(outer_tx);

        // Second inner has data ready, first does not yet
        second_tx.send("second").await.unwrap();
        drop(second_tx);

        let mut flat = bridge(&token, outer);
        let early = tokio::time::timeout(Duration::from_millis(50), flat.next()).await;
        assert!(early.is_err(), "bridge must not skip ahead to the second inner source");

        first_tx.send("first").await.unwrap();
        drop(first_tx);
        assert_eq!(flat.collect().await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_bridge_cancel_aborts_inner_drain() {
        let token = CancellationToken::new();
        let (outer_tx, outer) = Source::channel(1);
        let (_inner_tx, inner) = Source::<u8>::channel(1);
        outer_tx.send(inner).await.unwrap();

        let mut flat = bridge(&token, outer);
        token.cancel();

        let next = tokio::time::timeout(Duration::from_secs(1), flat.next())
            .await
            .expect("bridge must close after cancellation");
        assert_eq!(next, None);
    }
}
