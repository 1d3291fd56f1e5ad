// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::consts::DEFAULT_CHANNEL_CAPACITY;
use crate::observability::messages::stream::{TaskStarted, TaskStopped};
use crate::observability::messages::StructuredLog;
use crate::streams::{offer, Offer, StopReason};
use crate::traits::Pull;

/// Consumer handle for a sequence produced by another task.
///
/// A `Source` does not hold values itself; it is the receiving end of a
/// bounded channel whose sender is owned by exactly one producer task. When
/// that task exits the source yields its remaining buffered values and then
/// `None` forever.
#[derive(Debug)]
pub struct Source<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Source<T> {
    /// Create a bounded channel and wrap its receiver.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn channel(capacity: usize) -> (mpsc::Sender<T>, Source<T>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Source { rx })
    }

    /// Wrap an existing receiver.
    pub fn from_receiver(rx: mpsc::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Wait for the next value, or `None` once the producer has finished.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Drain every remaining value in order.
    pub async fn collect(mut self) -> Vec<T> {
        let mut values = Vec::new();
        while let Some(value) = self.rx.recv().await {
            values.push(value);
        }
        values
    }

    /// Turn this source into a cloneable handle for competing readers.
    pub fn share(self) -> SharedSource<T> {
        SharedSource {
            rx: Arc::new(Mutex::new(self.rx)),
        }
    }

    /// Give back the underlying receiver.
    pub fn into_inner(self) -> mpsc::Receiver<T> {
        self.rx
    }
}

#[async_trait]
impl<T: Send> Pull<T> for Source<T> {
    async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

/// A [`Source`] read by several consumers at once.
///
/// Each value goes to exactly one reader, whichever asks first. The
/// underlying channel closes for everyone once the producer exits.
#[derive(Debug)]
pub struct SharedSource<T> {
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for SharedSource<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> SharedSource<T> {
    /// Wait for the next value not taken by another reader.
    pub async fn next(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }

    /// Number of handles sharing this source.
    pub fn readers(&self) -> usize {
        Arc::strong_count(&self.rx)
    }
}

#[async_trait]
impl<T: Send> Pull<T> for SharedSource<T> {
    async fn next(&mut self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}

/// Emit `values` in order on a new [`Source`].
///
/// The producer checks the token before every emission and closes the source
/// on cancellation, exhaustion, or when the source is dropped.
pub fn generate<T, I>(token: &CancellationToken, values: I) -> Source<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
{
    generate_with_capacity(token, values, DEFAULT_CHANNEL_CAPACITY)
}

/// [`generate`] with an explicit output buffer size.
pub fn generate_with_capacity<T, I>(
    token: &CancellationToken,
    values: I,
    capacity: usize,
) -> Source<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
{
    let (tx, source) = Source::channel(capacity);
    let token = token.clone();
    let values = values.into_iter();

    tokio::spawn(async move {
        TaskStarted {
            task: "generate",
            capacity: tx.max_capacity(),
        }
        .log();

        let mut forwarded = 0usize;
        let mut reason = StopReason::Exhausted;
        for value in values {
            match offer(&token, &tx, value).await {
                Offer::Accepted => forwarded += 1,
                Offer::Cancelled => {
                    reason = StopReason::Cancelled;
                    break;
                }
                Offer::Dropped => {
                    reason = StopReason::DownstreamDropped;
                    break;
                }
            }
        }

        TaskStopped {
            task: "generate",
            forwarded,
            reason,
        }
        .log();
    });

    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_generate_emits_in_order_then_ends() {
        let token = CancellationToken::new();
        let mut source = generate(&token, vec![3, 1, 2]);

        assert_eq!(source.next().await, Some(3));
        assert_eq!(source.next().await, Some(1));
        assert_eq!(source.next().await, Some(2));
        assert_eq!(source.next().await, None);
        // Reading past the end keeps reporting the end
        assert_eq!(source.next().await, None);
    }

    #[tokio::test]
    async fn test_generate_range() {
        let token = CancellationToken::new();
        let source = generate(&token, 1..=5);
        assert_eq!(source.collect().await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_generate_empty() {
        let token = CancellationToken::new();
        let source = generate(&token, Vec::<u8>::new());
        assert!(source.collect().await.is_empty());
    }

    #[tokio::test]
    async fn test_generate_cancelled_before_start_emits_nothing() {
        let token = CancellationToken::new();
        token.cancel();

        let source = generate(&token, 0..1000);
        let values = tokio::time::timeout(Duration::from_secs(1), source.collect())
            .await
            .expect("cancelled generator must close");
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn test_generate_stops_when_cancelled_midway() {
        let token = CancellationToken::new();
        let mut source = generate(&token, 0..u64::MAX);

        assert_eq!(source.next().await, Some(0));
        token.cancel();

        // At most the one value already buffered may still arrive
        let rest = tokio::time::timeout(Duration::from_secs(1), source.collect())
            .await
            .expect("generator must close after cancellation");
        assert!(rest.len() <= DEFAULT_CHANNEL_CAPACITY);
    }

    /// Endless iterator that records when the task owning it lets go.
    struct Endless {
        next: u64,
        released: Arc<std::sync::atomic::AtomicBool>,
    }

    impl Iterator for Endless {
        type Item = u64;

        fn next(&mut self) -> Option<u64> {
            self.next += 1;
            Some(self.next)
        }
    }

    impl Drop for Endless {
        fn drop(&mut self) {
            self.released.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_generator_exits_when_source_dropped() {
        let token = CancellationToken::new();
        let released = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let mut source = generate(
            &token,
            Endless {
                next: 0,
                released: released.clone(),
            },
        );

        assert_eq!(source.next().await, Some(1));
        drop(source);

        tokio::time::timeout(Duration::from_secs(1), async {
            while !released.load(std::sync::atomic::Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("producer should exit once its source is dropped");
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_offer_reports_dropped_receiver() {
        let token = CancellationToken::new();
        let (tx, source) = Source::<u32>::channel(1);
        drop(source);

        assert!(tx.is_closed());
        assert!(matches!(offer(&token, &tx, 1).await, Offer::Dropped));
    }

    #[tokio::test]
    async fn test_shared_source_hands_each_value_to_one_reader() {
        let token = CancellationToken::new();
        let shared = generate(&token, 0..100).share();

        let a = shared.clone();
        let b = shared.clone();
        assert_eq!(shared.readers(), 3);
        drop(shared);

        let left = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(v) = a.next().await {
                seen.push(v);
            }
            seen
        });
        let right = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(v) = b.next().await {
                seen.push(v);
            }
            seen
        });

        let mut all = left.await.unwrap();
        all.extend(right.await.unwrap());
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_source_from_receiver() {
        let (tx, rx) = mpsc::channel(4);
        tx.send("a").await.unwrap();
        tx.send("b").await.unwrap();
        drop(tx);

        let source = Source::from_receiver(rx);
        assert_eq!(source.collect().await, vec!["a", "b"]);
    }
}
