// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cooperative cancellation.
//!
//! Every constructor in this crate takes a [`CancellationToken`] owned by the
//! caller. Spawned tasks hold clones (or child tokens) and race each blocking
//! wait against `token.cancelled()`. Cancelling a child token never touches
//! its parent or siblings.
//!
//! Timeouts are not built into the primitives. They are layered on top by a
//! timer that cancels a token, see [`cancel_after`] and [`with_deadline`].
//!
//! ```rust
//! use std::time::Duration;
//! use the_millrace::cancel::{with_deadline, CancellationToken};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let token = CancellationToken::new();
//! let slow = tokio::time::sleep(Duration::from_secs(5));
//!
//! let outcome = with_deadline(&token, Duration::from_millis(10), slow).await;
//! assert!(outcome.is_none());
//! assert!(!token.is_cancelled());
//! # }
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

pub use tokio_util::sync::CancellationToken;

/// Cancel `token` once `after` has elapsed, unless it is cancelled first.
///
/// The returned handle may be aborted to disarm the timer.
pub fn cancel_after(token: &CancellationToken, after: Duration) -> JoinHandle<()> {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(after) => {
                tracing::debug!(
                    after_ms = after.as_millis() as u64,
                    "Deadline reached, cancelling token"
                );
                token.cancel();
            }
        }
    })
}

/// Run `fut` until it completes, `token` is cancelled, or `after` elapses.
///
/// Returns `None` if the deadline or the token won. The deadline is tracked on
/// a child of `token`, so expiry never cancels the caller's token.
pub async fn with_deadline<F>(
    token: &CancellationToken,
    after: Duration,
    fut: F,
) -> Option<F::Output>
where
    F: Future,
{
    let deadline = token.child_token();
    let timer = cancel_after(&deadline, after);

    let outcome = tokio::select! {
        biased;
        out = fut => Some(out),
        _ = deadline.cancelled() => None,
    };

    timer.abort();
    outcome
}

/// Await `fut` unless `token` is cancelled first.
pub async fn until_cancelled<F>(token: &CancellationToken, fut: F) -> Option<F::Output>
where
    F: Future,
{
    tokio::select! {
        _ = token.cancelled() => None,
        out = fut => Some(out),
    }
}
