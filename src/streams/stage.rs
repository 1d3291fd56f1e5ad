// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio_util::sync::CancellationToken;

use crate::config::consts::DEFAULT_CHANNEL_CAPACITY;
use crate::streams::{pump, Source};
use crate::traits::Pull;

/// One-to-one pipeline stage: apply `f` to every value of `src`, in order.
///
/// The stage owns a single worker task. Its output closes when that task
/// exits, which happens once `src` closes, `token` is cancelled, or the
/// output is dropped. On cancellation the remaining input is abandoned.
///
/// `f` is treated as total. A transform that can fail should return a
/// `Result` (or any other value that carries the failure); the stage forwards
/// it like any other value.
///
/// ```rust
/// use the_millrace::cancel::CancellationToken;
/// use the_millrace::streams::{generate, transform};
///
/// # #[tokio::main]
/// # async fn main() {
/// let token = CancellationToken::new();
/// let parsed = transform(&token, generate(&token, ["1", "x", "3"]), |s: &str| s.parse::<i32>());
///
/// let results = parsed.collect().await;
/// assert_eq!(results.len(), 3);
/// assert!(results[1].is_err());
/// # }
/// ```
pub fn transform<T, U, S, F>(token: &CancellationToken, src: S, f: F) -> Source<U>
where
    T: Send + 'static,
    U: Send + 'static,
    S: Pull<T> + 'static,
    F: FnMut(T) -> U + Send + 'static,
{
    transform_with_capacity(token, src, f, DEFAULT_CHANNEL_CAPACITY)
}

/// [`transform`] with an explicit output buffer size.
pub fn transform_with_capacity<T, U, S, F>(
    token: &CancellationToken,
    src: S,
    f: F,
    capacity: usize,
) -> Source<U>
where
    T: Send + 'static,
    U: Send + 'static,
    S: Pull<T> + 'static,
    F: FnMut(T) -> U + Send + 'static,
{
    let (tx, out) = Source::channel(capacity);
    tokio::spawn(pump("transform", token.clone(), src, tx, f));
    out
}
