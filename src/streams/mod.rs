// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Channel-backed stream primitives.
//!
//! Each primitive spawns one (or, for fan-in, a few) tokio tasks connected by
//! bounded `mpsc` channels and hands the caller a [`Source`] for the output.
//! The producing task owns the sender side, so the output closes exactly once:
//! when that task exits.
//!
//! A task exits when any of these happens:
//! * its input ended
//! * the shared [`CancellationToken`] fired
//! * the consumer dropped the output [`Source`]
//!
//! The last point settles what happens to an abandoned source: dropping it
//! closes the channel, the producer notices at its next send (or while waiting
//! on its own input, via `Sender::closed`) and exits, dropping its input in
//! turn. Nothing leaks and no explicit close handshake is needed.
//!
//! # Example
//!
//! ```rust
//! use the_millrace::cancel::CancellationToken;
//! use the_millrace::streams::{generate, transform};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let token = CancellationToken::new();
//! let doubled = transform(&token, generate(&token, [1, 2, 3, 4, 5]), |x| x * 2);
//! assert_eq!(doubled.collect().await, vec![2, 4, 6, 8, 10]);
//! # }
//! ```

pub mod bridge;
pub mod fan;
pub mod relay;
pub mod source;
pub mod stage;
pub mod tee;


pub use bridge::bridge;
pub use fan::{fan_in, fan_out, fan_out_fan_in};
pub use relay::or_done;
pub use source::{generate, generate_with_capacity, SharedSource, Source};
pub use stage::{transform, transform_with_capacity};
pub use tee::tee;

use std::fmt::{Display, Formatter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::observability::messages::stream::{TaskStarted, TaskStopped};
use crate::observability::messages::StructuredLog;
use crate::traits::Pull;

/// Why a stream task exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The input ran out of values.
    Exhausted,
    /// The cancellation token fired.
    Cancelled,
    /// Every consumer of the output went away.
    DownstreamDropped,
}

impl StopReason {
    /// Stable string form used in structured log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Exhausted => "exhausted",
            StopReason::Cancelled => "cancelled",
            StopReason::DownstreamDropped => "downstream_dropped",
        }
    }
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of offering one value to a downstream channel.
pub(crate) enum Offer {
    Accepted,
    Cancelled,
    Dropped,
}

/// Send `value`, blocking while the channel is full, unless cancelled first.
///
/// Cancellation is checked before the send is attempted, so a cancelled task
/// never emits.
pub(crate) async fn offer<T>(token: &CancellationToken, tx: &mpsc::Sender<T>, value: T) -> Offer {
    tokio::select! {
        biased;
        _ = token.cancelled() => Offer::Cancelled,
        sent = tx.send(value) => match sent {
            Ok(()) => Offer::Accepted,
            Err(_) => Offer::Dropped,
        },
    }
}

/// Result of waiting for the next upstream value on behalf of a downstream.
pub(crate) enum Pulled<T> {
    Value(T),
    Ended,
    Cancelled,
    Dropped,
}

/// Receive the next value from `src`, giving up if the token fires or the
/// consumer of `tx` goes away while we wait.
pub(crate) async fn pull_for<T, U, S>(
    token: &CancellationToken,
    src: &mut S,
    tx: &mpsc::Sender<U>,
) -> Pulled<T>
where
    T: Send,
    S: Pull<T> + ?Sized,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Pulled::Cancelled,
        _ = tx.closed() => Pulled::Dropped,
        next = src.next() => match next {
            Some(value) => Pulled::Value(value),
            None => Pulled::Ended,
        },
    }
}

/// Move values from `src` to `tx` through `f` until one side ends or the
/// token fires. Shared loop behind relays, stages and fan-in forwarders.
pub(crate) async fn pump<T, U, S, F>(
    task: &'static str,
    token: CancellationToken,
    mut src: S,
    tx: mpsc::Sender<U>,
    mut f: F,
) where
    T: Send,
    S: Pull<T>,
    F: FnMut(T) -> U,
{
    TaskStarted {
        task,
        capacity: tx.max_capacity(),
    }
    .log();

    let mut forwarded = 0usize;
    let reason = loop {
        let value = match pull_for(&token, &mut src, &tx).await {
            Pulled::Value(value) => value,
            Pulled::Ended => break StopReason::Exhausted,
            Pulled::Cancelled => break StopReason::Cancelled,
            Pulled::Dropped => break StopReason::DownstreamDropped,
        };

        match offer(&token, &tx, f(value)).await {
            Offer::Accepted => forwarded += 1,
            Offer::Cancelled => break StopReason::Cancelled,
            Offer::Dropped => break StopReason::DownstreamDropped,
        }
    };

    TaskStopped {
        task,
        forwarded,
        reason,
    }
    .log();
}
