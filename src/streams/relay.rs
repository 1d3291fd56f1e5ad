// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio_util::sync::CancellationToken;

use crate::config::consts::DEFAULT_CHANNEL_CAPACITY;
use crate::streams::{pump, Source};
use crate::traits::Pull;

/// Forward `src` until it closes or `token` is cancelled.
///
/// Consuming the returned source can never outlive cancellation: both the
/// receive from `src` and the hand-off downstream are raced against the
/// token, so the output closes in bounded time even if `src` never produces
/// again.
pub fn or_done<T, S>(token: &CancellationToken, src: S) -> Source<T>
where
    T: Send + 'static,
    S: Pull<T> + 'static,
{
    let (tx, out) = Source::channel(DEFAULT_CHANNEL_CAPACITY);
    tokio::spawn(pump("or_done", token.clone(), src, tx, |value| value));
    out
}
